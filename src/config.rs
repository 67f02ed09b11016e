use std::env;

use tracing::{info, warn};

use crate::app::hack_or_snooze::HACK_OR_SNOOZE_ENDPOINT;

/// Server-side settings that are not part of the leptos options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub api_base_url: String,
    pub contact: Option<String>,
}

impl ServerConfig {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = match lookup("HACK_OR_SNOOZE_API").filter(|v| !v.trim().is_empty()) {
            Some(url) => {
                if url::Url::parse(&url).is_err() {
                    warn!("HACK_OR_SNOOZE_API={url} does not look like a url");
                }
                url
            }
            None => {
                info!("HACK_OR_SNOOZE_API not set, using default: {HACK_OR_SNOOZE_ENDPOINT}");
                HACK_OR_SNOOZE_ENDPOINT.to_string()
            }
        };

        Self {
            api_base_url,
            contact: lookup("HACK_OR_SNOOZE_CONTACT").filter(|v| !v.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None);

        assert_eq!(config.api_base_url, HACK_OR_SNOOZE_ENDPOINT);
        assert_eq!(config.contact, None);
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(|key| match key {
            "HACK_OR_SNOOZE_API" => Some("http://localhost:5000".to_string()),
            "HACK_OR_SNOOZE_CONTACT" => Some("ops@example.com".to_string()),
            _ => None,
        });

        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.contact.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = ServerConfig::from_lookup(|_| Some("  ".to_string()));

        assert_eq!(config.api_base_url, HACK_OR_SNOOZE_ENDPOINT);
        assert_eq!(config.contact, None);
    }
}

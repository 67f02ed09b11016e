use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;
use tracing::{debug, warn};

use super::{NewStory, Session, Story, StoryId};
use crate::config::ServerConfig;

pub const HACK_OR_SNOOZE_ENDPOINT: &str = "https://hack-or-snooze-v3.herokuapp.com";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiErr {
    #[error("reqwest error: {0}")]
    Reqwest(reqwest::Error),
    #[error("json parse error: {0}")]
    Json(serde_json::Error),
    #[error("not found")]
    NotFound,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("api returned {code}: {message}")]
    Status { code: u16, message: String },
    #[error("invalid response: {0}")]
    Invalid(&'static str),
    #[error("invalid api url: {0}")]
    Url(String),
}

pub(crate) type ApiResult<T> = Result<T, ApiErr>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InnerUser {
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    favorites: Vec<Story>,
    #[serde(default)]
    stories: Vec<Story>,
}

impl InnerUser {
    fn into_session(self, token: String) -> ApiResult<Session> {
        if self.username.is_empty() {
            return Err(ApiErr::Invalid("user without username"));
        }
        if token.is_empty() {
            return Err(ApiErr::Invalid("user without login token"));
        }

        Ok(Session {
            username: self.username,
            name: self.name,
            created_at: self.created_at,
            login_token: token,
            own_stories: checked_stories(self.stories)?,
            favorites: checked_stories(self.favorites)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: InnerUser,
    token: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: InnerUser,
}

#[derive(Debug, Deserialize)]
struct StoriesResponse {
    stories: Vec<Story>,
}

#[derive(Debug, Deserialize)]
struct StoryResponse {
    story: Story,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct LoginFields<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UserRequest<'a> {
    user: LoginFields<'a>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Serialize)]
struct StoryRequest<'a> {
    token: &'a str,
    story: &'a NewStory,
}

fn checked_stories(stories: Vec<Story>) -> ApiResult<Vec<Story>> {
    if stories.iter().any(|story| story.story_id.as_ref().is_empty()) {
        return Err(ApiErr::Invalid("story without id"));
    }
    Ok(stories)
}

#[derive(Debug)]
pub struct HackOrSnoozeClient {
    base: String,
    http: Client,
}

impl Default for HackOrSnoozeClient {
    fn default() -> Self {
        Self::new(
            HACK_OR_SNOOZE_ENDPOINT,
            env!("CARGO_PKG_NAME"),
            Some(env!("CARGO_PKG_VERSION")),
            None,
        )
    }
}

impl HackOrSnoozeClient {
    pub fn new(base: &str, name: &str, version: Option<&str>, contact: Option<&str>) -> Self {
        let mut user_agent = name.to_string();

        if let Some(version) = version {
            user_agent.push('/');
            user_agent.push_str(version);
        }

        if let Some(contact) = contact {
            user_agent.push_str(" (");
            user_agent.push_str(contact);
            user_agent.push(')');
        }

        let http = ClientBuilder::default()
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|err| {
                warn!("falling back to a default http client: {err}");
                Client::new()
            });

        Self {
            base: base.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            &config.api_base_url,
            env!("CARGO_PKG_NAME"),
            Some(env!("CARGO_PKG_VERSION")),
            config.contact.as_deref(),
        )
    }

    /// Appends `segments` to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = Url::parse(&self.base).map_err(|err| ApiErr::Url(err.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| ApiErr::Url(format!("{} cannot hold a path", self.base)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ApiResult<RequestBuilder> {
        Ok(self.http.request(method, self.endpoint(segments)?))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        let body = response.text().await.map_err(ApiErr::Reqwest)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            return Err(match status {
                StatusCode::NOT_FOUND => ApiErr::NotFound,
                StatusCode::UNAUTHORIZED => ApiErr::Unauthorized(message),
                other => ApiErr::Status {
                    code: other.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&body).map_err(ApiErr::Json)
    }

    pub(crate) async fn get_stories(&self) -> ApiResult<Vec<Story>> {
        debug!("fetching stories");

        let response = self
            .request(Method::GET, &["stories"])?
            .send()
            .await
            .map_err(ApiErr::Reqwest)?;

        let stories: StoriesResponse = Self::parse(response).await?;

        checked_stories(stories.stories)
    }

    pub(crate) async fn login(&self, username: &str, password: &str) -> ApiResult<Session> {
        debug!(username, "logging in");

        let response = self
            .request(Method::POST, &["login"])?
            .json(&UserRequest {
                user: LoginFields {
                    username,
                    password,
                    name: None,
                },
            })
            .send()
            .await
            .map_err(ApiErr::Reqwest)?;

        let auth: AuthResponse = Self::parse(response).await?;

        auth.user.into_session(auth.token)
    }

    pub(crate) async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> ApiResult<Session> {
        debug!(username, "signing up");

        let response = self
            .request(Method::POST, &["signup"])?
            .json(&UserRequest {
                user: LoginFields {
                    username,
                    password,
                    name: Some(name),
                },
            })
            .send()
            .await
            .map_err(ApiErr::Reqwest)?;

        let auth: AuthResponse = Self::parse(response).await?;

        auth.user.into_session(auth.token)
    }

    pub(crate) async fn get_user(&self, token: &str, username: &str) -> ApiResult<Session> {
        debug!(username, "fetching user");

        let response = self
            .request(Method::GET, &["users", username])?
            .query(&[("token", token)])
            .send()
            .await
            .map_err(ApiErr::Reqwest)?;

        let user: UserResponse = Self::parse(response).await?;

        user.user.into_session(token.to_string())
    }

    pub(crate) async fn create_story(&self, token: &str, story: &NewStory) -> ApiResult<Story> {
        debug!(title = %story.title, "creating story");

        let response = self
            .request(Method::POST, &["stories"])?
            .json(&StoryRequest { token, story })
            .send()
            .await
            .map_err(ApiErr::Reqwest)?;

        let created: StoryResponse = Self::parse(response).await?;

        checked_stories(vec![created.story])?
            .pop()
            .ok_or(ApiErr::Invalid("empty story response"))
    }

    pub(crate) async fn delete_story(&self, token: &str, id: &StoryId) -> ApiResult<()> {
        debug!(%id, "deleting story");

        let response = self
            .request(Method::DELETE, &["stories", id.as_ref()])?
            .json(&TokenRequest { token })
            .send()
            .await
            .map_err(ApiErr::Reqwest)?;

        let _: StoryResponse = Self::parse(response).await?;

        Ok(())
    }

    /// Adds (`POST`) or removes (`DELETE`) a favorite and returns the updated user.
    pub(crate) async fn set_favorite(
        &self,
        token: &str,
        username: &str,
        id: &StoryId,
        favorite: bool,
    ) -> ApiResult<Session> {
        debug!(username, %id, favorite, "updating favorite");

        let method = if favorite { Method::POST } else { Method::DELETE };

        let response = self
            .request(method, &["users", username, "favorites", id.as_ref()])?
            .json(&TokenRequest { token })
            .send()
            .await
            .map_err(ApiErr::Reqwest)?;

        let user: UserResponse = Self::parse(response).await?;

        user.user.into_session(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_becomes_session() {
        let json = r#"{
            "token": "tok",
            "user": {
                "username": "ada",
                "name": "Ada",
                "createdAt": "2024-01-02T03:04:05.678Z",
                "favorites": [],
                "stories": [{
                    "storyId": "s1",
                    "title": "A",
                    "author": "Ada",
                    "url": "https://example.com",
                    "username": "ada"
                }]
            }
        }"#;

        let auth: AuthResponse = serde_json::from_str(json).unwrap();
        let session = auth.user.into_session(auth.token).unwrap();

        assert_eq!(session.login_token, "tok");
        assert_eq!(session.own_stories.len(), 1);
        assert!(session.favorites.is_empty());
    }

    #[test]
    fn user_without_token_is_rejected() {
        let user = InnerUser {
            username: "ada".to_string(),
            name: String::new(),
            created_at: String::new(),
            favorites: Vec::new(),
            stories: Vec::new(),
        };

        assert!(matches!(
            user.into_session(String::new()),
            Err(ApiErr::Invalid(_))
        ));
    }

    #[test]
    fn story_without_id_is_rejected() {
        let mut story = crate::app::hack_or_snooze::story("", "A");
        story.title = "no id".to_string();

        assert!(checked_stories(vec![story]).is_err());
    }

    #[test]
    fn error_body_message_is_extracted() {
        let json = r#"{"error":{"status":401,"title":"Unauthorized","message":"Invalid password"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.error.message, "Invalid password");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HackOrSnoozeClient::new("http://localhost:5000/", "test", None, None);
        assert_eq!(client.base, "http://localhost:5000");
        assert_eq!(
            client.endpoint(&["stories"]).unwrap().as_str(),
            "http://localhost:5000/stories"
        );
    }

    #[test]
    fn path_segments_are_escaped() {
        let client = HackOrSnoozeClient::new("http://localhost:5000", "test", None, None);

        let user = client.endpoint(&["users", "bob?x=1"]).unwrap();
        assert_eq!(user.as_str(), "http://localhost:5000/users/bob%3Fx=1");
        assert_eq!(user.query(), None);

        let favorite = client
            .endpoint(&["users", "ada", "favorites", "../stories/abc"])
            .unwrap();
        assert_eq!(
            favorite.as_str(),
            "http://localhost:5000/users/ada/favorites/..%2Fstories%2Fabc"
        );
    }

    #[test]
    fn base_with_prefix_keeps_it() {
        let client = HackOrSnoozeClient::new("http://localhost:5000/v3/", "test", None, None);

        assert_eq!(
            client.endpoint(&["stories", "s1"]).unwrap().as_str(),
            "http://localhost:5000/v3/stories/s1"
        );
    }
}

use std::rc::Rc;

use leptos::{logging, window, Signal, SignalGetUntracked, SignalSet, WriteSignal};
use leptos_use::{storage::use_local_storage, utils::FromToStringCodec};

use super::{
    feed::FeedError,
    hack_or_snooze::{Credentials, Session},
    server::StoryApi,
};

pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";

/// Where the login token and username are kept between page loads.
pub trait CredentialStore {
    /// Missing keys come back as empty strings.
    fn load(&self) -> Credentials;
    fn save(&self, credentials: &Credentials);
    /// Empties the whole store, not only the two credential keys.
    fn clear(&self);
}

/// Browser local storage, one key each for the token and the username.
#[derive(Clone)]
pub struct BrowserCredentials {
    token: Signal<String>,
    set_token: WriteSignal<String>,
    remove_token: Rc<dyn Fn()>,
    username: Signal<String>,
    set_username: WriteSignal<String>,
    remove_username: Rc<dyn Fn()>,
}

impl BrowserCredentials {
    /// Must be called inside a reactive owner, e.g. a component body.
    pub fn new() -> Self {
        let (token, set_token, remove_token) =
            use_local_storage::<String, FromToStringCodec>(TOKEN_KEY);
        let (username, set_username, remove_username) =
            use_local_storage::<String, FromToStringCodec>(USERNAME_KEY);

        Self {
            token,
            set_token,
            remove_token: Rc::new(remove_token),
            username,
            set_username,
            remove_username: Rc::new(remove_username),
        }
    }
}

impl CredentialStore for BrowserCredentials {
    fn load(&self) -> Credentials {
        Credentials {
            token: self.token.get_untracked(),
            username: self.username.get_untracked(),
        }
    }

    fn save(&self, credentials: &Credentials) {
        self.set_token.set(credentials.token.clone());
        self.set_username.set(credentials.username.clone());
    }

    fn clear(&self) {
        (self.remove_token)();
        (self.remove_username)();

        match window().local_storage() {
            Ok(Some(storage)) => {
                if let Err(err) = storage.clear() {
                    logging::warn!("clearing local storage failed: {err:?}");
                }
            }
            Ok(None) => {}
            Err(err) => logging::warn!("local storage unavailable: {err:?}"),
        }
    }
}

/// Key/value map standing in for local storage.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    entries: std::cell::RefCell<std::collections::BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemoryCredentials {
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
impl CredentialStore for MemoryCredentials {
    fn load(&self) -> Credentials {
        Credentials {
            token: self.get(TOKEN_KEY).unwrap_or_default(),
            username: self.get(USERNAME_KEY).unwrap_or_default(),
        }
    }

    fn save(&self, credentials: &Credentials) {
        self.set(TOKEN_KEY, &credentials.token);
        self.set(USERNAME_KEY, &credentials.username);
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Login, signup and restore against `api`, persisting credentials to `store`.
pub struct SessionManager<'a, A, S> {
    api: &'a A,
    store: &'a S,
}

impl<'a, A: StoryApi, S: CredentialStore> SessionManager<'a, A, S> {
    pub fn new(api: &'a A, store: &'a S) -> Self {
        Self { api, store }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, FeedError> {
        logging::log!("login {username}");

        let session = self.api.login(username, password).await?;
        self.store.save(&session.credentials());

        Ok(session)
    }

    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, FeedError> {
        logging::log!("signup {username}");

        let session = self.api.signup(username, password, name).await?;
        self.store.save(&session.credentials());

        Ok(session)
    }

    /// Logs back in with stored credentials. `None` when nothing is stored or
    /// the API no longer accepts them.
    pub async fn restore_from_storage(&self) -> Option<Session> {
        let credentials = self.store.load();
        if !credentials.is_complete() {
            return None;
        }

        match self.api.user(&credentials).await {
            Ok(session) => Some(session),
            Err(err) => {
                logging::warn!("stored credentials for {} rejected: {err}", credentials.username);
                None
            }
        }
    }

    /// Wipes the store, credentials included. The caller reloads the page afterwards.
    pub fn logout(&self) {
        logging::log!("logout");
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{hack_or_snooze::session, server::mock::MockApi};

    #[tokio::test]
    async fn login_persists_only_token_and_username() {
        let api = MockApi::with_user(session("ada"), "hunter2");
        let store = MemoryCredentials::default();

        let user = SessionManager::new(&api, &store)
            .login("ada", "hunter2")
            .await
            .unwrap();

        assert_eq!(store.keys(), vec![TOKEN_KEY, USERNAME_KEY]);
        assert_eq!(store.get(TOKEN_KEY), Some(user.login_token));
        assert_eq!(store.get(USERNAME_KEY), Some("ada".to_string()));
    }

    #[tokio::test]
    async fn failed_login_stores_nothing() {
        let api = MockApi::with_user(session("ada"), "hunter2");
        let store = MemoryCredentials::default();

        let result = SessionManager::new(&api, &store)
            .login("ada", "wrong")
            .await;

        assert!(matches!(result, Err(FeedError::Api(_))));
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn signup_persists_credentials() {
        let api = MockApi::default();
        let store = MemoryCredentials::default();

        let user = SessionManager::new(&api, &store)
            .signup("grace", "pw", "Grace Hopper")
            .await
            .unwrap();

        assert_eq!(user.name, "Grace Hopper");
        assert_eq!(store.load(), user.credentials());
    }

    #[tokio::test]
    async fn logout_clears_storage_wholesale() {
        let api = MockApi::with_user(session("ada"), "hunter2");
        let store = MemoryCredentials::default();
        store.set("theme", "dark");
        let manager = SessionManager::new(&api, &store);

        manager.login("ada", "hunter2").await.unwrap();
        manager.logout();

        assert_eq!(store.get(TOKEN_KEY), None);
        assert_eq!(store.get(USERNAME_KEY), None);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn restore_without_credentials_skips_the_api() {
        let api = MockApi::with_user(session("ada"), "hunter2");
        let store = MemoryCredentials::default();

        assert_eq!(SessionManager::new(&api, &store).restore_from_storage().await, None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn restore_uses_stored_credentials() {
        let user = session("ada");
        let api = MockApi::with_user(user.clone(), "hunter2");
        let store = MemoryCredentials::default();
        store.save(&user.credentials());

        let restored = SessionManager::new(&api, &store).restore_from_storage().await;

        assert_eq!(restored, Some(user));
    }

    #[tokio::test]
    async fn restore_with_rejected_credentials_is_none() {
        let api = MockApi::with_user(session("ada"), "hunter2");
        let store = MemoryCredentials::default();
        store.save(&Credentials {
            token: "stale".to_string(),
            username: "ada".to_string(),
        });

        assert_eq!(SessionManager::new(&api, &store).restore_from_storage().await, None);
    }
}

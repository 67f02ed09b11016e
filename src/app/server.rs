//! Server functions wrapping the Hack or Snooze API, and the [`StoryApi`] seam the
//! browser-side state logic is written against.

use leptos::*;

use super::hack_or_snooze::{Credentials, NewStory, Session, Story, StoryId};

#[cfg(feature = "ssr")]
fn client() -> Result<std::sync::Arc<super::hack_or_snooze::HackOrSnoozeClient>, ServerFnError> {
    use_context().ok_or_else(|| ServerFnError::new("api client missing from context"))
}

#[cfg(feature = "ssr")]
fn reject(action: &'static str) -> impl FnOnce(super::hack_or_snooze::ApiErr) -> ServerFnError {
    move |err| {
        tracing::warn!("{action} failed: {err}");
        ServerFnError::new(err)
    }
}

#[server]
pub async fn fetch_stories() -> Result<Vec<Story>, ServerFnError> {
    client()?.get_stories().await.map_err(reject("fetch stories"))
}

#[server]
pub async fn login_user(username: String, password: String) -> Result<Session, ServerFnError> {
    client()?
        .login(&username, &password)
        .await
        .map_err(reject("login"))
}

#[server]
pub async fn signup_user(
    username: String,
    password: String,
    name: String,
) -> Result<Session, ServerFnError> {
    client()?
        .signup(&username, &password, &name)
        .await
        .map_err(reject("signup"))
}

#[server]
pub async fn fetch_user(token: String, username: String) -> Result<Session, ServerFnError> {
    client()?
        .get_user(&token, &username)
        .await
        .map_err(reject("fetch user"))
}

#[server]
pub async fn create_story(token: String, story: NewStory) -> Result<Story, ServerFnError> {
    client()?
        .create_story(&token, &story)
        .await
        .map_err(reject("create story"))
}

#[server]
pub async fn delete_story(token: String, story_id: StoryId) -> Result<(), ServerFnError> {
    client()?
        .delete_story(&token, &story_id)
        .await
        .map_err(reject("delete story"))
}

#[server]
pub async fn set_favorite(
    token: String,
    username: String,
    story_id: StoryId,
    favorite: bool,
) -> Result<Session, ServerFnError> {
    client()?
        .set_favorite(&token, &username, &story_id, favorite)
        .await
        .map_err(reject("update favorite"))
}

/// The remote calls the session and feed logic depend on.
#[allow(async_fn_in_trait)]
pub trait StoryApi {
    async fn stories(&self) -> Result<Vec<Story>, ServerFnError>;

    async fn login(&self, username: &str, password: &str) -> Result<Session, ServerFnError>;

    async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, ServerFnError>;

    async fn user(&self, credentials: &Credentials) -> Result<Session, ServerFnError>;

    async fn create_story(&self, token: &str, story: &NewStory) -> Result<Story, ServerFnError>;

    async fn delete_story(&self, token: &str, id: &StoryId) -> Result<(), ServerFnError>;

    async fn add_favorite(&self, session: &Session, id: &StoryId)
        -> Result<Session, ServerFnError>;

    async fn remove_favorite(
        &self,
        session: &Session,
        id: &StoryId,
    ) -> Result<Session, ServerFnError>;
}

/// [`StoryApi`] backed by the server functions above.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerApi;

impl StoryApi for ServerApi {
    async fn stories(&self) -> Result<Vec<Story>, ServerFnError> {
        fetch_stories().await
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, ServerFnError> {
        login_user(username.to_string(), password.to_string()).await
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, ServerFnError> {
        signup_user(username.to_string(), password.to_string(), name.to_string()).await
    }

    async fn user(&self, credentials: &Credentials) -> Result<Session, ServerFnError> {
        fetch_user(credentials.token.clone(), credentials.username.clone()).await
    }

    async fn create_story(&self, token: &str, story: &NewStory) -> Result<Story, ServerFnError> {
        create_story(token.to_string(), story.clone()).await
    }

    async fn delete_story(&self, token: &str, id: &StoryId) -> Result<(), ServerFnError> {
        delete_story(token.to_string(), id.clone()).await
    }

    async fn add_favorite(
        &self,
        session: &Session,
        id: &StoryId,
    ) -> Result<Session, ServerFnError> {
        set_favorite(
            session.login_token.clone(),
            session.username.clone(),
            id.clone(),
            true,
        )
        .await
    }

    async fn remove_favorite(
        &self,
        session: &Session,
        id: &StoryId,
    ) -> Result<Session, ServerFnError> {
        set_favorite(
            session.login_token.clone(),
            session.username.clone(),
            id.clone(),
            false,
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Stories,
        Login(String),
        Signup(String),
        User(String),
        CreateStory(String),
        DeleteStory(StoryId),
        AddFavorite(StoryId),
        RemoveFavorite(StoryId),
    }

    /// In-memory API recording each call. Favorites and own stories are kept on
    /// `user` so responses look like the real server's.
    #[derive(Debug, Default)]
    pub(crate) struct MockApi {
        pub(crate) stories: Vec<Story>,
        pub(crate) user: RefCell<Option<Session>>,
        pub(crate) password: String,
        pub(crate) fail: bool,
        pub(crate) calls: RefCell<Vec<Call>>,
    }

    impl MockApi {
        pub(crate) fn with_user(user: Session, password: &str) -> Self {
            Self {
                user: RefCell::new(Some(user)),
                password: password.to_string(),
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: Call) -> Result<(), ServerFnError> {
            self.calls.borrow_mut().push(call);
            if self.fail {
                return Err(ServerFnError::new("network unreachable"));
            }
            Ok(())
        }

        fn current(&self) -> Result<Session, ServerFnError> {
            self.user
                .borrow()
                .clone()
                .ok_or_else(|| ServerFnError::new("unauthorized"))
        }

        fn find(&self, id: &StoryId) -> Result<Story, ServerFnError> {
            self.stories
                .iter()
                .find(|s| &s.story_id == id)
                .cloned()
                .ok_or_else(|| ServerFnError::new("not found"))
        }
    }

    impl StoryApi for MockApi {
        async fn stories(&self) -> Result<Vec<Story>, ServerFnError> {
            self.record(Call::Stories)?;
            Ok(self.stories.clone())
        }

        async fn login(&self, username: &str, password: &str) -> Result<Session, ServerFnError> {
            self.record(Call::Login(username.to_string()))?;
            let user = self.current()?;
            if user.username != username || self.password != password {
                return Err(ServerFnError::new("unauthorized"));
            }
            Ok(user)
        }

        async fn signup(
            &self,
            username: &str,
            _password: &str,
            name: &str,
        ) -> Result<Session, ServerFnError> {
            self.record(Call::Signup(username.to_string()))?;
            let user = Session {
                username: username.to_string(),
                name: name.to_string(),
                created_at: "2024-03-01T00:00:00.000Z".to_string(),
                login_token: format!("token-{username}"),
                own_stories: Vec::new(),
                favorites: Vec::new(),
            };
            *self.user.borrow_mut() = Some(user.clone());
            Ok(user)
        }

        async fn user(&self, credentials: &Credentials) -> Result<Session, ServerFnError> {
            self.record(Call::User(credentials.username.clone()))?;
            let user = self.current()?;
            if user.credentials() != *credentials {
                return Err(ServerFnError::new("unauthorized"));
            }
            Ok(user)
        }

        async fn create_story(
            &self,
            _token: &str,
            story: &NewStory,
        ) -> Result<Story, ServerFnError> {
            self.record(Call::CreateStory(story.title.clone()))?;
            let user = self.current()?;
            Ok(Story {
                story_id: format!("new-{}", story.title).into(),
                title: story.title.clone(),
                author: story.author.clone(),
                url: story.url.clone(),
                username: user.username,
                created_at: "2024-03-02T00:00:00.000Z".to_string(),
            })
        }

        async fn delete_story(&self, _token: &str, id: &StoryId) -> Result<(), ServerFnError> {
            self.record(Call::DeleteStory(id.clone()))
        }

        async fn add_favorite(
            &self,
            _session: &Session,
            id: &StoryId,
        ) -> Result<Session, ServerFnError> {
            self.record(Call::AddFavorite(id.clone()))?;
            let story = self.find(id)?;
            let mut user = self.current()?;
            user.favorites.push(story);
            *self.user.borrow_mut() = Some(user.clone());
            Ok(user)
        }

        async fn remove_favorite(
            &self,
            _session: &Session,
            id: &StoryId,
        ) -> Result<Session, ServerFnError> {
            self.record(Call::RemoveFavorite(id.clone()))?;
            let mut user = self.current()?;
            user.favorites.retain(|s| &s.story_id != id);
            *self.user.borrow_mut() = Some(user.clone());
            Ok(user)
        }
    }
}

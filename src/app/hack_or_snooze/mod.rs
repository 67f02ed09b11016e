#[cfg(feature = "ssr")]
mod api;

#[cfg(feature = "ssr")]
pub use api::*;

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl AsRef<str> for StoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StoryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub story_id: StoryId,
    pub title: String,
    pub author: String,
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub created_at: String,
}

impl Story {
    /// Host part of the story's url, or the raw url when it does not parse.
    pub fn host_name(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_else(|| self.url.clone())
    }
}

/// The logged in user together with the collections the API tracks for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub name: String,
    pub created_at: String,
    pub login_token: String,
    pub own_stories: Vec<Story>,
    pub favorites: Vec<Story>,
}

impl Session {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            token: self.login_token.clone(),
            username: self.username.clone(),
        }
    }

    pub fn is_favorite(&self, id: &StoryId) -> bool {
        self.favorites.iter().any(|story| &story.story_id == id)
    }

    pub fn owns(&self, id: &StoryId) -> bool {
        self.own_stories.iter().any(|story| &story.story_id == id)
    }

    /// `YYYY-MM-DD` part of the account creation timestamp.
    pub fn account_date(&self) -> &str {
        self.created_at.get(..10).unwrap_or(&self.created_at)
    }

    pub(crate) fn forget_story(&mut self, id: &StoryId) {
        self.own_stories.retain(|story| &story.story_id != id);
        self.favorites.retain(|story| &story.story_id != id);
    }
}

/// The part of a session that survives a page reload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub token: String,
    pub username: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.token.is_empty() && !self.username.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidStory {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0:?} is not an http(s) url")]
    BadUrl(String),
}

/// Fields of the create-story form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewStory {
    pub title: String,
    pub author: String,
    pub url: String,
}

impl NewStory {
    pub fn validate(self) -> Result<Self, InvalidStory> {
        let story = Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            url: self.url.trim().to_string(),
        };

        if story.title.is_empty() {
            return Err(InvalidStory::Missing("title"));
        }
        if story.author.is_empty() {
            return Err(InvalidStory::Missing("author"));
        }
        if story.url.is_empty() {
            return Err(InvalidStory::Missing("url"));
        }

        match url::Url::parse(&story.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(story),
            _ => Err(InvalidStory::BadUrl(story.url)),
        }
    }
}

/// The feed as shown on the front page, newest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoryList {
    stories: Vec<Story>,
}

impl StoryList {
    pub fn new(stories: Vec<Story>) -> Self {
        Self {
            stories: stories
                .into_iter()
                .unique_by(|story| story.story_id.clone())
                .collect(),
        }
    }

    pub fn find(&self, id: &StoryId) -> Option<&Story> {
        self.stories.iter().find(|story| &story.story_id == id)
    }

    pub fn prepend(&mut self, story: Story) {
        self.stories.retain(|s| s.story_id != story.story_id);
        self.stories.insert(0, story);
    }

    pub fn remove(&mut self, id: &StoryId) -> Option<Story> {
        let index = self.stories.iter().position(|story| &story.story_id == id)?;
        Some(self.stories.remove(index))
    }

    pub fn first(&self) -> Option<&Story> {
        self.stories.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Story> {
        self.stories.iter()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

impl From<Vec<Story>> for StoryList {
    fn from(stories: Vec<Story>) -> Self {
        Self::new(stories)
    }
}

#[cfg(test)]
pub(crate) fn story(id: &str, title: &str) -> Story {
    Story {
        story_id: id.into(),
        title: title.to_string(),
        author: "Ada".to_string(),
        url: format!("https://example.com/{id}"),
        username: "ada".to_string(),
        created_at: "2024-01-05T10:00:00.000Z".to_string(),
    }
}

#[cfg(test)]
pub(crate) fn session(username: &str) -> Session {
    Session {
        username: username.to_string(),
        name: "Ada Lovelace".to_string(),
        created_at: "2024-01-02T03:04:05.678Z".to_string(),
        login_token: format!("token-{username}"),
        own_stories: Vec::new(),
        favorites: Vec::new(),
    }
}

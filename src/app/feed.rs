use std::collections::HashSet;

use leptos::*;

use super::{
    hack_or_snooze::{InvalidStory, NewStory, Session, Story, StoryId, StoryList},
    server::StoryApi,
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    #[error("log in first")]
    NotLoggedIn,
    #[error("story {0} is not in the feed")]
    UnknownStory(StoryId),
    #[error(transparent)]
    InvalidStory(#[from] InvalidStory),
    #[error("{0}")]
    Api(ServerFnError),
}

impl From<ServerFnError> for FeedError {
    fn from(err: ServerFnError) -> Self {
        Self::Api(err)
    }
}

/// Visual state of a story's favorite control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Star {
    NotFavorited,
    Favorited,
}

impl Star {
    pub fn for_story(session: &Session, id: &StoryId) -> Self {
        if session.is_favorite(id) {
            Self::Favorited
        } else {
            Self::NotFavorited
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::NotFavorited => Self::Favorited,
            Self::Favorited => Self::NotFavorited,
        }
    }

    /// Font Awesome style: solid when favorited, regular (outline) otherwise.
    pub fn class(self) -> &'static str {
        match self {
            Self::Favorited => "fas",
            Self::NotFavorited => "far",
        }
    }
}

/// Stories with a request in flight, and the tickets that order session writes.
///
/// Every request that ends in a session write takes a ticket when it is sent.
/// A response is applied only if its ticket is newer than the last one applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InFlight {
    stories: HashSet<StoryId>,
    issued: u64,
    applied: u64,
}

impl InFlight {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// A ticket for a request on `id`, or `None` while another one is pending.
    pub fn claim(&mut self, id: &StoryId) -> Option<u64> {
        if !self.stories.insert(id.clone()) {
            return None;
        }
        Some(self.issue())
    }

    pub fn release(&mut self, id: &StoryId) {
        self.stories.remove(id);
    }

    pub fn is_pending(&self, id: &StoryId) -> bool {
        self.stories.contains(id)
    }

    pub fn accept(&mut self, ticket: u64) -> bool {
        if ticket <= self.applied {
            return false;
        }
        self.applied = ticket;
        true
    }

    /// Invalidates every ticket issued so far.
    pub fn supersede(&mut self) {
        self.applied = self.issued;
    }
}

/// State shared by every view: the active session, the feed, and the last
/// error to show.
#[derive(Debug, Clone, Copy)]
pub struct AppContext {
    pub current_user: RwSignal<Option<Session>>,
    pub stories: RwSignal<StoryList>,
    pub error: RwSignal<Option<String>>,
    pub in_flight: RwSignal<InFlight>,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            current_user: create_rw_signal(None),
            stories: create_rw_signal(StoryList::default()),
            error: create_rw_signal(None),
            in_flight: create_rw_signal(InFlight::default()),
        }
    }

    pub fn provide() -> Self {
        let ctx = Self::new();
        provide_context(ctx);
        ctx
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user.with(Option::is_some)
    }

    pub fn session_untracked(&self) -> Result<Session, FeedError> {
        self.current_user
            .get_untracked()
            .ok_or(FeedError::NotLoggedIn)
    }

    pub fn start_session(&self, session: Session) {
        self.in_flight.update(InFlight::supersede);
        self.error.set(None);
        self.current_user.set(Some(session));
    }

    pub fn end_session(&self) {
        self.in_flight.update(InFlight::supersede);
        self.current_user.set(None);
    }

    pub fn issue(&self) -> u64 {
        self.in_flight.try_update(InFlight::issue).unwrap_or_default()
    }

    pub fn claim(&self, id: &StoryId) -> Option<u64> {
        self.in_flight.try_update(|f| f.claim(id)).flatten()
    }

    pub fn release(&self, id: &StoryId) {
        self.in_flight.update(|f| f.release(id));
    }

    pub fn is_pending(&self, id: &StoryId) -> bool {
        self.in_flight.with(|f| f.is_pending(id))
    }

    /// Replaces the session unless a response issued later was applied first.
    pub fn apply_session(&self, ticket: u64, session: Session) -> bool {
        let fresh = self
            .in_flight
            .try_update(|f| f.accept(ticket))
            .unwrap_or_default();

        if fresh {
            self.current_user.set(Some(session));
        } else {
            logging::log!("dropping stale session for ticket {ticket}");
        }
        fresh
    }

    pub fn story_created(
        &self,
        ticket: u64,
        story: Story,
        session: Session,
        draft: RwSignal<NewStory>,
    ) {
        self.add_story(story);
        self.apply_session(ticket, session);
        draft.try_set(NewStory::default());
    }

    pub fn story_deleted(&self, ticket: u64, id: &StoryId, session: Session) {
        self.remove_story(id);
        self.apply_session(ticket, session);
    }

    pub fn add_story(&self, story: Story) {
        self.stories.update(|list| list.prepend(story));
    }

    pub fn remove_story(&self, id: &StoryId) {
        self.stories.update(|list| {
            list.remove(id);
        });
    }

    pub fn report(&self, err: &FeedError) {
        logging::warn!("{err}");
        self.error.set(Some(err.to_string()));
    }

    pub fn dismiss_error(&self) {
        self.error.set(None);
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn fetch_initial_stories<A: StoryApi>(api: &A) -> Result<StoryList, FeedError> {
    logging::log!("fetching initial stories");

    let stories = StoryList::new(api.stories().await?);
    if stories.is_empty() {
        logging::warn!("the story feed is empty");
    }

    Ok(stories)
}

/// Outcome of a favorite toggle: the new marker and the session the API returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Toggled {
    pub star: Star,
    pub session: Session,
}

/// Branches on the marker the user clicked, not on `session.favorites`.
pub async fn toggle_favorite<A: StoryApi>(
    api: &A,
    session: &Session,
    stories: &StoryList,
    story_id: &StoryId,
    marker: Star,
) -> Result<Toggled, FeedError> {
    logging::log!("toggle favorite {story_id}");

    let story = stories
        .find(story_id)
        .or_else(|| {
            session
                .favorites
                .iter()
                .chain(&session.own_stories)
                .find(|story| &story.story_id == story_id)
        })
        .ok_or_else(|| FeedError::UnknownStory(story_id.clone()))?;

    let session = match marker {
        Star::Favorited => api.remove_favorite(session, &story.story_id).await?,
        Star::NotFavorited => api.add_favorite(session, &story.story_id).await?,
    };

    Ok(Toggled {
        star: marker.toggled(),
        session,
    })
}

/// Creates the story and returns it with `session` updated to own it.
pub async fn submit_new_story<A: StoryApi>(
    api: &A,
    session: &Session,
    draft: NewStory,
) -> Result<(Story, Session), FeedError> {
    logging::log!("submit new story");

    let draft = draft.validate()?;
    let story = api.create_story(&session.login_token, &draft).await?;

    let mut session = session.clone();
    session.own_stories.retain(|s| s.story_id != story.story_id);
    session.own_stories.insert(0, story.clone());

    Ok((story, session))
}

/// Deletes one of the session's own stories and returns the session without it.
pub async fn delete_story<A: StoryApi>(
    api: &A,
    session: &Session,
    story_id: &StoryId,
) -> Result<Session, FeedError> {
    logging::log!("delete story {story_id}");

    if !session.owns(story_id) {
        return Err(FeedError::UnknownStory(story_id.clone()));
    }

    api.delete_story(&session.login_token, story_id).await?;

    let mut session = session.clone();
    session.forget_story(story_id);

    Ok(session)
}

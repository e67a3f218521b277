//! Test utilities for the client crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`, via
//! the `test-support` feature). [`InMemoryApi`] implements both remote ports
//! against in-process state so domain behaviour can be exercised without a
//! network, including injected failures.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use url::Url;

use crate::domain::ports::{AccountApi, AuthenticatedUser, RemoteApiError, StoryApi, UserProfile};
use crate::domain::{
    LoginCredentials, LoginToken, NewStory, SignupDetails, Story, StoryId, User, Username,
};

/// Fixed instant used for every fixture timestamp.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("fixture timestamp must be unambiguous"))
}

/// Build a fixture story with a derived title and URL.
///
/// # Panics
///
/// Panics when `id` or `username` are not valid identifiers.
pub fn story(id: &str, username: &str) -> Story {
    Story::new(
        StoryId::new(id).unwrap_or_else(|error| panic!("fixture story id {id:?}: {error}")),
        NewStory {
            title: format!("Story {id}"),
            author: format!("Author of {id}"),
            url: format!("https://{id}.example.com/read"),
        },
        Username::new(username)
            .unwrap_or_else(|error| panic!("fixture username {username:?}: {error}")),
        fixed_time(),
    )
}

/// Three stories submitted by `grace`, in server order.
pub fn sample_stories() -> Vec<Story> {
    ["story-a", "story-b", "story-c"]
        .into_iter()
        .map(|id| story(id, "grace"))
        .collect()
}

/// A logged-in `ada` with token `token-ada` and empty lists.
pub fn sample_user() -> User {
    User::from_profile(
        UserProfile {
            username: Username::new("ada").unwrap_or_else(|error| panic!("fixture: {error}")),
            name: "Ada Lovelace".to_owned(),
            created_at: fixed_time(),
            favorites: Vec::new(),
            stories: Vec::new(),
        },
        LoginToken::new("token-ada").unwrap_or_else(|error| panic!("fixture: {error}")),
    )
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    name: String,
    favorites: Vec<StoryId>,
}

#[derive(Debug, Default)]
struct State {
    stories: Vec<Story>,
    accounts: BTreeMap<Username, Account>,
    tokens: BTreeMap<String, Username>,
    issued: u64,
    failures: VecDeque<RemoteApiError>,
    calls: Vec<&'static str>,
}

impl State {
    fn begin(&mut self, operation: &'static str) -> Result<(), RemoteApiError> {
        self.calls.push(operation);
        self.failures.pop_front().map_or(Ok(()), Err)
    }

    fn issue_token(&mut self, username: &Username) -> Result<LoginToken, RemoteApiError> {
        self.issued += 1;
        let raw = format!("token-{username}-{}", self.issued);
        self.tokens.insert(raw.clone(), username.clone());
        LoginToken::new(raw).map_err(|error| RemoteApiError::decode(error.to_string()))
    }

    fn authenticate(&self, token: &LoginToken) -> Result<Username, RemoteApiError> {
        self.tokens
            .get(token.as_str())
            .cloned()
            .ok_or_else(|| RemoteApiError::unauthorized("invalid token"))
    }

    fn authorise_as(&self, token: &LoginToken, username: &Username) -> Result<(), RemoteApiError> {
        if &self.authenticate(token)? == username {
            Ok(())
        } else {
            Err(RemoteApiError::unauthorized("token does not belong to this user"))
        }
    }

    fn story(&self, id: &StoryId) -> Result<Story, RemoteApiError> {
        self.stories
            .iter()
            .find(|story| story.id() == id)
            .cloned()
            .ok_or_else(|| RemoteApiError::not_found(format!("no story with id {id}")))
    }

    fn account(&mut self, username: &Username) -> Result<&mut Account, RemoteApiError> {
        self.accounts
            .get_mut(username)
            .ok_or_else(|| RemoteApiError::not_found(format!("no user {username}")))
    }

    fn profile(&self, username: &Username) -> Result<UserProfile, RemoteApiError> {
        let account = self
            .accounts
            .get(username)
            .ok_or_else(|| RemoteApiError::not_found(format!("no user {username}")))?;
        let favorites = account
            .favorites
            .iter()
            .filter_map(|id| self.stories.iter().find(|story| story.id() == id).cloned())
            .collect();
        let stories = self
            .stories
            .iter()
            .filter(|story| story.username() == username)
            .cloned()
            .collect();
        Ok(UserProfile {
            username: username.clone(),
            name: account.name.clone(),
            created_at: fixed_time(),
            favorites,
            stories,
        })
    }
}

/// In-process implementation of [`StoryApi`] and [`AccountApi`].
///
/// Story ids are `story-<n>`, tokens are `token-<username>-<n>`, and
/// timestamps advance one minute per created story from [`fixed_time`].
#[derive(Debug, Default)]
pub struct InMemoryApi {
    state: Mutex<State>,
}

impl InMemoryApi {
    /// Empty API with no stories or accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// API pre-populated with `stories`.
    pub fn with_stories(stories: Vec<Story>) -> Self {
        let api = Self::default();
        api.lock().stories = stories;
        api
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an account directly and return a valid token for it.
    ///
    /// # Panics
    ///
    /// Panics when `username` is not a valid username.
    pub fn register(&self, username: &str, password: &str, name: &str) -> LoginToken {
        let username = Username::new(username)
            .unwrap_or_else(|error| panic!("fixture username {username:?}: {error}"));
        let mut state = self.lock();
        state.accounts.insert(
            username.clone(),
            Account {
                password: password.to_owned(),
                name: name.to_owned(),
                favorites: Vec::new(),
            },
        );
        state
            .issue_token(&username)
            .unwrap_or_else(|error| panic!("fixture token: {error}"))
    }

    /// Make the next port call fail with `error` before touching any state.
    pub fn fail_next(&self, error: RemoteApiError) {
        self.lock().failures.push_back(error);
    }

    /// Invalidate a token, as if it expired server-side.
    pub fn revoke(&self, token: &LoginToken) {
        self.lock().tokens.remove(token.as_str());
    }

    /// Names of the port methods called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    /// Ids of every story currently held remotely, in order.
    pub fn remote_story_ids(&self) -> Vec<StoryId> {
        self.lock()
            .stories
            .iter()
            .map(|story| story.id().clone())
            .collect()
    }

    /// Remote favorites of `username`, in the order they were added.
    pub fn remote_favorites(&self, username: &str) -> Vec<StoryId> {
        let Ok(username) = Username::new(username) else {
            return Vec::new();
        };
        self.lock()
            .accounts
            .get(&username)
            .map(|account| account.favorites.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StoryApi for InMemoryApi {
    async fn list_stories(&self) -> Result<Vec<Story>, RemoteApiError> {
        let mut state = self.lock();
        state.begin("list_stories")?;
        Ok(state.stories.clone())
    }

    async fn fetch_story(&self, id: &StoryId) -> Result<Story, RemoteApiError> {
        let mut state = self.lock();
        state.begin("fetch_story")?;
        state.story(id)
    }

    async fn create_story(
        &self,
        token: &LoginToken,
        story: &NewStory,
    ) -> Result<Story, RemoteApiError> {
        let mut state = self.lock();
        state.begin("create_story")?;
        let username = state.authenticate(token)?;
        if Url::parse(&story.url).is_err() {
            return Err(RemoteApiError::rejected("story url must be a valid URL"));
        }

        state.issued += 1;
        let id = StoryId::new(format!("story-{}", state.issued))
            .map_err(|error| RemoteApiError::decode(error.to_string()))?;
        let minutes = i64::try_from(state.issued).unwrap_or(i64::MAX);
        let created_at = fixed_time() + TimeDelta::minutes(minutes);
        let created = Story::new(id, story.clone(), username, created_at);
        state.stories.push(created.clone());
        Ok(created)
    }

    async fn delete_story(&self, token: &LoginToken, id: &StoryId) -> Result<(), RemoteApiError> {
        let mut state = self.lock();
        state.begin("delete_story")?;
        let username = state.authenticate(token)?;
        let story = state.story(id)?;
        if story.username() != &username {
            return Err(RemoteApiError::unauthorized(
                "only the submitter may delete a story",
            ));
        }
        state.stories.retain(|story| story.id() != id);
        for account in state.accounts.values_mut() {
            account.favorites.retain(|favorite| favorite != id);
        }
        Ok(())
    }
}

#[async_trait]
impl AccountApi for InMemoryApi {
    async fn signup(&self, details: &SignupDetails) -> Result<AuthenticatedUser, RemoteApiError> {
        let mut state = self.lock();
        state.begin("signup")?;
        let username = details.credentials().username().clone();
        if state.accounts.contains_key(&username) {
            return Err(RemoteApiError::conflict(format!(
                "username {username} is already taken"
            )));
        }
        state.accounts.insert(
            username.clone(),
            Account {
                password: details.credentials().password().to_owned(),
                name: details.name().to_owned(),
                favorites: Vec::new(),
            },
        );
        let token = state.issue_token(&username)?;
        let profile = state.profile(&username)?;
        Ok(AuthenticatedUser { profile, token })
    }

    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedUser, RemoteApiError> {
        let mut state = self.lock();
        state.begin("login")?;
        let username = credentials.username().clone();
        if state.account(&username)?.password != credentials.password() {
            return Err(RemoteApiError::unauthorized("invalid password"));
        }
        let token = state.issue_token(&username)?;
        let profile = state.profile(&username)?;
        Ok(AuthenticatedUser { profile, token })
    }

    async fn fetch_profile(
        &self,
        token: &LoginToken,
        username: &Username,
    ) -> Result<UserProfile, RemoteApiError> {
        let mut state = self.lock();
        state.begin("fetch_profile")?;
        state.authorise_as(token, username)?;
        state.profile(username)
    }

    async fn add_favorite(
        &self,
        token: &LoginToken,
        username: &Username,
        story_id: &StoryId,
    ) -> Result<(), RemoteApiError> {
        let mut state = self.lock();
        state.begin("add_favorite")?;
        state.authorise_as(token, username)?;
        state.story(story_id)?;
        let account = state.account(username)?;
        if !account.favorites.contains(story_id) {
            account.favorites.push(story_id.clone());
        }
        Ok(())
    }

    async fn remove_favorite(
        &self,
        token: &LoginToken,
        username: &Username,
        story_id: &StoryId,
    ) -> Result<(), RemoteApiError> {
        let mut state = self.lock();
        state.begin("remove_favorite")?;
        state.authorise_as(token, username)?;
        let account = state.account(username)?;
        let before = account.favorites.len();
        account.favorites.retain(|favorite| favorite != story_id);
        if account.favorites.len() == before {
            return Err(RemoteApiError::not_found(format!(
                "story {story_id} is not a favorite"
            )));
        }
        Ok(())
    }
}

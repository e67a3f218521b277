//! Authenticated user and the operations that keep its cached story lists in
//! step with the remote API.
//!
//! Every mutation is confirm-then-mutate: the remote call must succeed before
//! the local `favorites` list changes. A failure part-way through a
//! multi-step operation can still leave the cache stale relative to the
//! server; no reconciliation is attempted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::ports::{AccountApi, AuthenticatedUser, RemoteApiError, StoryApi, UserProfile};
use super::story_list::retain_first_by_id;
use super::{
    Error, ErrorCode, LoginCredentials, LoginToken, SignupDetails, Story, StoryId,
    StoredCredentials,
};

/// Validation errors returned by [`Username::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// The username was empty.
    EmptyUsername,
    /// The username had leading or trailing whitespace.
    PaddedUsername,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::PaddedUsername => write!(f, "username must not have surrounding whitespace"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Unique account name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if username.trim() != username {
            return Err(UserValidationError::PaddedUsername);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// The authenticated account.
///
/// ## Invariants
/// - `username` never changes after construction.
/// - `favorites` and `own_stories` never hold two stories with the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    username: Username,
    name: String,
    created_at: DateTime<Utc>,
    favorites: Vec<Story>,
    own_stories: Vec<Story>,
    login_token: LoginToken,
}

/// Whether `story` is a favorite of the authenticated user.
///
/// Returns `false` when nobody is logged in.
pub fn is_favorite(user: Option<&User>, story: &Story) -> bool {
    user.is_some_and(|user| user.has_favorite(story.id()))
}

impl User {
    /// Build a user from a remote profile and the token that fetched it.
    pub fn from_profile(profile: UserProfile, login_token: LoginToken) -> Self {
        let UserProfile {
            username,
            name,
            created_at,
            favorites,
            stories,
        } = profile;
        Self {
            username,
            name,
            created_at,
            favorites: retain_first_by_id(favorites),
            own_stories: retain_first_by_id(stories),
            login_token,
        }
    }

    fn from_authenticated(authenticated: AuthenticatedUser) -> Self {
        Self::from_profile(authenticated.profile, authenticated.token)
    }

    /// Register a new account and return it logged in.
    ///
    /// A duplicate username is reported as [`ErrorCode::Unauthorized`].
    pub async fn signup<A>(api: &A, details: &SignupDetails) -> Result<Self, Error>
    where
        A: AccountApi + ?Sized,
    {
        let authenticated = api.signup(details).await.map_err(map_signup_error)?;
        debug!(username = %authenticated.profile.username, "account registered");
        Ok(Self::from_authenticated(authenticated))
    }

    /// Log in with a username and password.
    ///
    /// An unknown username is reported as [`ErrorCode::Unauthorized`].
    pub async fn login<A>(api: &A, credentials: &LoginCredentials) -> Result<Self, Error>
    where
        A: AccountApi + ?Sized,
    {
        let authenticated = api.login(credentials).await.map_err(map_login_error)?;
        debug!(username = %authenticated.profile.username, "logged in");
        Ok(Self::from_authenticated(authenticated))
    }

    /// Restore a session from a persisted token and username.
    ///
    /// Stored credentials may legitimately be stale, so every failure is
    /// logged and collapsed into `None`.
    pub async fn login_via_stored_credentials<A>(
        api: &A,
        stored: &StoredCredentials,
    ) -> Option<Self>
    where
        A: AccountApi + ?Sized,
    {
        match api.fetch_profile(&stored.token, &stored.username).await {
            Ok(profile) => Some(Self::from_profile(profile, stored.token.clone())),
            Err(error) => {
                warn!(username = %stored.username, %error, "stored credential login failed");
                None
            }
        }
    }

    /// Account name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Account creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Cached favorites, oldest first.
    pub fn favorites(&self) -> &[Story] {
        &self.favorites
    }

    /// Cached stories submitted by this user.
    pub fn own_stories(&self) -> &[Story] {
        &self.own_stories
    }

    /// Session token sent with authenticated calls.
    pub fn login_token(&self) -> &LoginToken {
        &self.login_token
    }

    /// Token and username for the caller to persist.
    pub fn stored_credentials(&self) -> StoredCredentials {
        StoredCredentials {
            token: self.login_token.clone(),
            username: self.username.clone(),
        }
    }

    /// Whether `story_id` is in the cached favorites.
    pub fn has_favorite(&self, story_id: &StoryId) -> bool {
        self.favorites.iter().any(|story| story.id() == story_id)
    }

    /// Whether this user submitted `story`.
    pub fn is_own_story(&self, story: &Story) -> bool {
        story.username() == &self.username
    }

    /// Favorite a story, then cache the canonical record.
    ///
    /// Already-favorited ids are a no-op.
    pub async fn add_favorite<A>(&mut self, api: &A, story_id: &StoryId) -> Result<(), Error>
    where
        A: StoryApi + AccountApi + ?Sized,
    {
        if self.has_favorite(story_id) {
            debug!(%story_id, "story already favorited");
            return Ok(());
        }

        AccountApi::add_favorite(api, &self.login_token, &self.username, story_id).await?;
        let story = api.fetch_story(story_id).await?;
        if !self.has_favorite(story.id()) {
            self.favorites.push(story);
        }
        debug!(%story_id, username = %self.username, "favorite added");
        Ok(())
    }

    /// Unfavorite a story.
    ///
    /// Ids that are not cached are a no-op and make no remote call. A remote
    /// "not found" means the favorite is already gone and is not an error.
    pub async fn remove_favorite<A>(&mut self, api: &A, story_id: &StoryId) -> Result<(), Error>
    where
        A: AccountApi + ?Sized,
    {
        if !self.has_favorite(story_id) {
            debug!(%story_id, "story not in favorites");
            return Ok(());
        }

        match AccountApi::remove_favorite(api, &self.login_token, &self.username, story_id).await
        {
            Ok(()) | Err(RemoteApiError::NotFound { .. }) => {}
            Err(error) => return Err(error.into()),
        }
        self.favorites.retain(|story| story.id() != story_id);
        debug!(%story_id, username = %self.username, "favorite removed");
        Ok(())
    }

    /// Flip the favorite state of a story and return the new state.
    pub async fn toggle_favorite<A>(&mut self, api: &A, story_id: &StoryId) -> Result<bool, Error>
    where
        A: StoryApi + AccountApi + ?Sized,
    {
        if self.has_favorite(story_id) {
            self.remove_favorite(api, story_id).await?;
            Ok(false)
        } else {
            self.add_favorite(api, story_id).await?;
            Ok(true)
        }
    }

    /// Unfavorite every cached favorite, one remote call at a time.
    ///
    /// Stops at the first failure. Removals confirmed before the failure stay
    /// applied; the rest remain cached.
    pub async fn clear_favorites<A>(&mut self, api: &A) -> Result<(), Error>
    where
        A: AccountApi + ?Sized,
    {
        let ids: Vec<StoryId> = self.favorites.iter().map(|story| story.id().clone()).collect();
        for (cleared, story_id) in ids.iter().enumerate() {
            if let Err(error) = self.remove_favorite(api, story_id).await {
                return Err(error.with_details(json!({
                    "storyId": story_id.as_ref(),
                    "cleared": cleared,
                    "remaining": ids.len() - cleared,
                })));
            }
        }
        Ok(())
    }

    /// Fetch the authoritative favorites without touching the cache.
    pub async fn fetch_favorites<A>(&self, api: &A) -> Result<Vec<Story>, Error>
    where
        A: AccountApi + ?Sized,
    {
        Ok(self.fetch_profile(api).await?.favorites)
    }

    /// Fetch the authoritative list of own stories without touching the cache.
    pub async fn fetch_own_stories<A>(&self, api: &A) -> Result<Vec<Story>, Error>
    where
        A: AccountApi + ?Sized,
    {
        Ok(self.fetch_profile(api).await?.stories)
    }

    /// Replace the cached profile fields with the server's current view.
    pub async fn refresh<A>(&mut self, api: &A) -> Result<(), Error>
    where
        A: AccountApi + ?Sized,
    {
        let profile = self.fetch_profile(api).await?;
        self.name = profile.name;
        self.favorites = retain_first_by_id(profile.favorites);
        self.own_stories = retain_first_by_id(profile.stories);
        Ok(())
    }

    /// Drop a deleted story from both cached lists. Local only.
    ///
    /// Returns whether anything was removed.
    pub fn forget_story(&mut self, story_id: &StoryId) -> bool {
        let before = self.favorites.len() + self.own_stories.len();
        self.favorites.retain(|story| story.id() != story_id);
        self.own_stories.retain(|story| story.id() != story_id);
        before != self.favorites.len() + self.own_stories.len()
    }

    async fn fetch_profile<A>(&self, api: &A) -> Result<UserProfile, Error>
    where
        A: AccountApi + ?Sized,
    {
        api.fetch_profile(&self.login_token, &self.username)
            .await
            .map_err(Error::from)
    }
}

fn map_signup_error(error: RemoteApiError) -> Error {
    let duplicate = matches!(error, RemoteApiError::Conflict { .. });
    let mapped = Error::from(error);
    if duplicate {
        mapped.recode(ErrorCode::Unauthorized)
    } else {
        mapped
    }
}

fn map_login_error(error: RemoteApiError) -> Error {
    let unknown_user = matches!(error, RemoteApiError::NotFound { .. });
    let mapped = Error::from(error);
    if unknown_user {
        mapped.recode(ErrorCode::Unauthorized)
    } else {
        mapped
    }
}

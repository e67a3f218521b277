//! Driven port for account and favorite endpoints of the remote API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RemoteApiError;
use crate::domain::{LoginCredentials, LoginToken, SignupDetails, Story, StoryId, Username};

/// Account record as reported by the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Unique account name.
    pub username: Username,
    /// Display name.
    pub name: String,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Stories the account has favorited, in server order.
    pub favorites: Vec<Story>,
    /// Stories the account submitted, in server order.
    pub stories: Vec<Story>,
}

/// Profile plus the fresh token returned by signup or login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Account record.
    pub profile: UserProfile,
    /// Session token to use for authenticated calls.
    pub token: LoginToken,
}

/// Port for account lifecycle and per-user favorites.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Register a new account.
    async fn signup(&self, details: &SignupDetails) -> Result<AuthenticatedUser, RemoteApiError>;

    /// Exchange credentials for a token.
    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedUser, RemoteApiError>;

    /// Fetch the account record, including favorites and own stories.
    async fn fetch_profile(
        &self,
        token: &LoginToken,
        username: &Username,
    ) -> Result<UserProfile, RemoteApiError>;

    /// Mark a story as a favorite of `username`.
    async fn add_favorite(
        &self,
        token: &LoginToken,
        username: &Username,
        story_id: &StoryId,
    ) -> Result<(), RemoteApiError>;

    /// Remove a story from the favorites of `username`.
    async fn remove_favorite(
        &self,
        token: &LoginToken,
        username: &Username,
        story_id: &StoryId,
    ) -> Result<(), RemoteApiError>;
}

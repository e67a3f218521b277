//! Driven port for the story endpoints of the remote API.
//!
//! The domain owns the request and response shapes so collection logic stays
//! adapter-agnostic.

use async_trait::async_trait;

use super::RemoteApiError;
use crate::domain::{LoginToken, NewStory, Story, StoryId};

/// Port for reading and mutating the global story collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryApi: Send + Sync {
    /// Fetch every story in server order. No credential required.
    async fn list_stories(&self) -> Result<Vec<Story>, RemoteApiError>;

    /// Fetch the canonical record for one story.
    async fn fetch_story(&self, id: &StoryId) -> Result<Story, RemoteApiError>;

    /// Submit a story and return the record the server created.
    async fn create_story(
        &self,
        token: &LoginToken,
        story: &NewStory,
    ) -> Result<Story, RemoteApiError>;

    /// Delete a story.
    async fn delete_story(&self, token: &LoginToken, id: &StoryId) -> Result<(), RemoteApiError>;
}

//! The global, ordered collection of stories.

use std::collections::HashSet;

use serde_json::json;
use tracing::debug;

use super::ports::StoryApi;
use super::{Error, NewStory, Story, StoryId, User};

/// Every story visible on the site, in relevance order.
///
/// Fetched entries keep server order; stories added afterwards are appended.
///
/// ## Invariants
/// - No two entries share a story id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryList {
    stories: Vec<Story>,
}

impl StoryList {
    /// Wrap already-fetched stories, keeping the first of any repeated id.
    pub fn new(stories: Vec<Story>) -> Self {
        Self {
            stories: retain_first_by_id(stories),
        }
    }

    /// Fetch every story from the remote API. No credential is needed.
    pub async fn fetch_all<A>(api: &A) -> Result<Self, Error>
    where
        A: StoryApi + ?Sized,
    {
        let stories = api.list_stories().await?;
        debug!(count = stories.len(), "story list fetched");
        Ok(Self::new(stories))
    }

    /// Stories in display order.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Iterate over stories in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Story> {
        self.stories.iter()
    }

    /// Number of stories.
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Look up a story by id.
    pub fn get(&self, id: &StoryId) -> Option<&Story> {
        self.stories.iter().find(|story| story.id() == id)
    }

    /// Submit a story as `user` and append the server's record.
    ///
    /// The returned story carries the id and timestamp the server assigned.
    /// The list is left untouched when the remote call fails.
    pub async fn add_story<A>(
        &mut self,
        api: &A,
        user: &User,
        story: &NewStory,
    ) -> Result<Story, Error>
    where
        A: StoryApi + ?Sized,
    {
        let created = api.create_story(user.login_token(), story).await?;
        match self.stories.iter_mut().find(|entry| entry.id() == created.id()) {
            Some(existing) => *existing = created.clone(),
            None => self.stories.push(created.clone()),
        }
        debug!(story_id = %created.id(), username = %user.username(), "story added");
        Ok(created)
    }

    /// Delete a story as `user` and drop it from the list once the server
    /// confirms.
    ///
    /// Fails with [`ErrorCode::NotFound`](super::ErrorCode::NotFound) without
    /// any remote call when no entry has `id`.
    pub async fn delete_story<A>(
        &mut self,
        api: &A,
        user: &User,
        id: &StoryId,
    ) -> Result<Story, Error>
    where
        A: StoryApi + ?Sized,
    {
        let Some(position) = self.stories.iter().position(|story| story.id() == id) else {
            return Err(Error::not_found(format!("no story with id {id} in the list"))
                .with_details(json!({ "storyId": id.as_ref() })));
        };

        api.delete_story(user.login_token(), id).await?;
        let removed = self.stories.remove(position);
        debug!(story_id = %id, username = %user.username(), "story deleted");
        Ok(removed)
    }
}

impl<'a> IntoIterator for &'a StoryList {
    type Item = &'a Story;
    type IntoIter = std::slice::Iter<'a, Story>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Drop later duplicates of any story id, preserving order.
pub(crate) fn retain_first_by_id(stories: Vec<Story>) -> Vec<Story> {
    let mut seen = HashSet::with_capacity(stories.len());
    stories
        .into_iter()
        .filter(|story| seen.insert(story.id().clone()))
        .collect()
}

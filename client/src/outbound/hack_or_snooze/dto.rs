//! Wire DTOs for the Hack-or-Snooze JSON API.
//!
//! Responses decode into these records first and are then mapped into domain
//! types in one pass, so a missing field or an invalid identifier surfaces as
//! a single decode error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{AuthenticatedUser, UserProfile};
use crate::domain::{LoginToken, NewStory, Story, StoryId, Username};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StoryRecordDto {
    story_id: String,
    title: String,
    author: String,
    url: String,
    username: String,
    created_at: DateTime<Utc>,
}

impl StoryRecordDto {
    pub(super) fn into_domain(self) -> Result<Story, String> {
        let id = StoryId::new(self.story_id)
            .map_err(|error| format!("story record has an invalid storyId: {error}"))?;
        let username = Username::new(self.username)
            .map_err(|error| format!("story {id} has an invalid username: {error}"))?;
        Ok(Story::new(
            id,
            NewStory {
                title: self.title,
                author: self.author,
                url: self.url,
            },
            username,
            self.created_at,
        ))
    }
}

fn stories_into_domain(records: Vec<StoryRecordDto>) -> Result<Vec<Story>, String> {
    records.into_iter().map(StoryRecordDto::into_domain).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserRecordDto {
    username: String,
    name: String,
    created_at: DateTime<Utc>,
    favorites: Option<Vec<StoryRecordDto>>,
    stories: Option<Vec<StoryRecordDto>>,
}

impl UserRecordDto {
    /// Map a signup or login record. Absent lists mean a fresh account.
    pub(super) fn into_domain(self) -> Result<UserProfile, String> {
        let favorites = self.favorites.unwrap_or_default();
        let stories = self.stories.unwrap_or_default();
        into_profile(self.username, self.name, self.created_at, favorites, stories)
    }

    /// Map a `GET /users/{username}` record, which must carry both lists.
    pub(super) fn into_full_domain(self) -> Result<UserProfile, String> {
        let favorites = self
            .favorites
            .ok_or_else(|| "user record is missing `favorites`".to_owned())?;
        let stories = self
            .stories
            .ok_or_else(|| "user record is missing `stories`".to_owned())?;
        into_profile(self.username, self.name, self.created_at, favorites, stories)
    }
}

fn into_profile(
    username: String,
    name: String,
    created_at: DateTime<Utc>,
    favorites: Vec<StoryRecordDto>,
    stories: Vec<StoryRecordDto>,
) -> Result<UserProfile, String> {
    let username = Username::new(username)
        .map_err(|error| format!("user record has an invalid username: {error}"))?;
    Ok(UserProfile {
        username,
        name,
        created_at,
        favorites: stories_into_domain(favorites)?,
        stories: stories_into_domain(stories)?,
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct StoriesEnvelopeDto {
    stories: Vec<StoryRecordDto>,
}

impl StoriesEnvelopeDto {
    pub(super) fn into_domain(self) -> Result<Vec<Story>, String> {
        stories_into_domain(self.stories)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct StoryEnvelopeDto {
    story: StoryRecordDto,
}

impl StoryEnvelopeDto {
    pub(super) fn into_domain(self) -> Result<Story, String> {
        self.story.into_domain()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UserEnvelopeDto {
    user: UserRecordDto,
}

impl UserEnvelopeDto {
    pub(super) fn into_domain(self) -> Result<UserProfile, String> {
        self.user.into_full_domain()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthEnvelopeDto {
    user: UserRecordDto,
    token: String,
}

impl AuthEnvelopeDto {
    pub(super) fn into_domain(self) -> Result<AuthenticatedUser, String> {
        let token = LoginToken::new(self.token)
            .map_err(|error| format!("auth response has an invalid token: {error}"))?;
        Ok(AuthenticatedUser {
            profile: self.user.into_domain()?,
            token,
        })
    }
}

/// `{ "error": { "status", "title", "message" } }`
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyDto {
    #[serde(default)]
    message: Option<String>,
}

impl ErrorEnvelopeDto {
    pub(super) fn message(&self) -> Option<&str> {
        self.error
            .message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TokenBody<'a> {
    pub(super) token: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateStoryBody<'a> {
    pub(super) token: &'a str,
    pub(super) story: &'a NewStory,
}

#[derive(Debug, Serialize)]
pub(super) struct AccountBody<'a> {
    pub(super) user: AccountFields<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct AccountFields<'a> {
    pub(super) username: &'a str,
    pub(super) password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) name: Option<&'a str>,
}

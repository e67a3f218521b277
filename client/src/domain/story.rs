//! Story data model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::user::Username;

/// Validation errors returned by [`StoryId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryValidationError {
    /// The identifier was empty.
    EmptyId,
    /// The identifier had leading or trailing whitespace.
    PaddedId,
}

impl fmt::Display for StoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "story id must not be empty"),
            Self::PaddedId => write!(f, "story id must not have surrounding whitespace"),
        }
    }
}

impl std::error::Error for StoryValidationError {}

/// Opaque story identifier assigned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoryId(String);

impl StoryId {
    /// Validate and construct a [`StoryId`].
    ///
    /// # Examples
    /// ```
    /// use snooze_client::domain::StoryId;
    ///
    /// let id = StoryId::new("5e1c0a7e-39bd-4a12-8f3e-0e5fa0a3b0d1").unwrap();
    /// assert_eq!(id.as_ref(), "5e1c0a7e-39bd-4a12-8f3e-0e5fa0a3b0d1");
    /// assert!(StoryId::new("").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, StoryValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(StoryValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(StoryValidationError::PaddedId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for StoryId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<StoryId> for String {
    fn from(value: StoryId) -> Self {
        value.0
    }
}

impl TryFrom<String> for StoryId {
    type Error = StoryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for StoryId {
    type Err = StoryValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Fields a user supplies when submitting a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStory {
    /// Headline shown in listings.
    pub title: String,
    /// Author credited for the linked piece.
    pub author: String,
    /// Link target.
    pub url: String,
}

/// Read-only snapshot of one remote story.
///
/// ## Invariants
/// - `id` is assigned by the remote API and never changes.
/// - No field can be edited after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    id: StoryId,
    title: String,
    author: String,
    url: String,
    username: Username,
    created_at: DateTime<Utc>,
}

impl Story {
    /// Assemble a story from a server-confirmed record.
    pub fn new(
        id: StoryId,
        content: NewStory,
        username: Username,
        created_at: DateTime<Utc>,
    ) -> Self {
        let NewStory { title, author, url } = content;
        Self {
            id,
            title,
            author,
            url,
            username,
            created_at,
        }
    }

    /// Remote identifier.
    pub fn id(&self) -> &StoryId {
        &self.id
    }

    /// Headline.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Credited author.
    pub fn author(&self) -> &str {
        self.author.as_str()
    }

    /// Link target exactly as submitted.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Account that submitted the story.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Server-side creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Return the authority (`host` or `host:port`) of the story URL.
    ///
    /// Non-default ports are kept; scheme, credentials, path, query and
    /// fragment are dropped. URLs that cannot be parsed, or that carry no
    /// host, are returned unchanged. Internationalised domains come back in
    /// their ASCII (punycode) form, as the URL parser normalises them.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use snooze_client::domain::{NewStory, Story, StoryId, Username};
    ///
    /// let story = Story::new(
    ///     StoryId::new("s1").unwrap(),
    ///     NewStory {
    ///         title: "Ports".to_owned(),
    ///         author: "Ada".to_owned(),
    ///         url: "http://sub.example.co.uk:8080/x".to_owned(),
    ///     },
    ///     Username::new("ada").unwrap(),
    ///     Utc::now(),
    /// );
    /// assert_eq!(story.host_name(), "sub.example.co.uk:8080");
    /// ```
    pub fn host_name(&self) -> String {
        authority_of(&self.url).unwrap_or_else(|| self.url.clone())
    }

    /// Whether the user-supplied fields equal `submission`.
    pub fn matches_submission(&self, submission: &NewStory) -> bool {
        self.title == submission.title
            && self.author == submission.author
            && self.url == submission.url
    }
}

fn authority_of(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

//! Reqwest-backed Hack-or-Snooze adapter.
//!
//! This adapter owns transport details only: endpoint construction, JSON
//! request bodies, timeout and HTTP error mapping, and decoding into domain
//! records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::dto::{
    AccountBody, AccountFields, AuthEnvelopeDto, CreateStoryBody, ErrorEnvelopeDto,
    StoriesEnvelopeDto, StoryEnvelopeDto, TokenBody, UserEnvelopeDto,
};
use crate::domain::ports::{AccountApi, AuthenticatedUser, RemoteApiError, StoryApi, UserProfile};
use crate::domain::{LoginCredentials, LoginToken, NewStory, SignupDetails, Story, StoryId, Username};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("snooze-client/", env!("CARGO_PKG_VERSION"));

/// Story and account API adapter that talks JSON over HTTP to one base URL.
#[derive(Debug, Clone)]
pub struct HackOrSnoozeHttpApi {
    client: Client,
    base_url: Url,
    user_agent: String,
}

impl HackOrSnoozeHttpApi {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }

    /// Replace the user agent sent with every request.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, RemoteApiError> {
        let url = endpoint(&self.base_url, segments)?;
        Ok(self
            .client
            .request(method, url)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, RemoteApiError> {
        let outcome = exchange(request).await;
        if let Err(error) = &outcome {
            debug!(operation, %error, "remote request failed");
        }
        outcome
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, RemoteApiError> {
        let body = self.send(operation, request).await?;
        decode(operation, &body)
    }
}

#[async_trait]
impl StoryApi for HackOrSnoozeHttpApi {
    async fn list_stories(&self) -> Result<Vec<Story>, RemoteApiError> {
        let request = self.request(Method::GET, &["stories"])?;
        let envelope: StoriesEnvelopeDto = self.send_json("list_stories", request).await?;
        envelope.into_domain().map_err(RemoteApiError::decode)
    }

    async fn fetch_story(&self, id: &StoryId) -> Result<Story, RemoteApiError> {
        let request = self.request(Method::GET, &["stories", id.as_ref()])?;
        let envelope: StoryEnvelopeDto = self.send_json("fetch_story", request).await?;
        envelope.into_domain().map_err(RemoteApiError::decode)
    }

    async fn create_story(
        &self,
        token: &LoginToken,
        story: &NewStory,
    ) -> Result<Story, RemoteApiError> {
        let request = self
            .request(Method::POST, &["stories"])?
            .json(&CreateStoryBody {
                token: token.as_str(),
                story,
            });
        let envelope: StoryEnvelopeDto = self.send_json("create_story", request).await?;
        envelope.into_domain().map_err(RemoteApiError::decode)
    }

    async fn delete_story(&self, token: &LoginToken, id: &StoryId) -> Result<(), RemoteApiError> {
        let request = self
            .request(Method::DELETE, &["stories", id.as_ref()])?
            .json(&TokenBody {
                token: token.as_str(),
            });
        self.send("delete_story", request).await.map(drop)
    }
}

#[async_trait]
impl AccountApi for HackOrSnoozeHttpApi {
    async fn signup(&self, details: &SignupDetails) -> Result<AuthenticatedUser, RemoteApiError> {
        let credentials = details.credentials();
        let body = account_body(credentials, Some(details.name()));
        let request = self.request(Method::POST, &["signup"])?.json(&body);
        let envelope: AuthEnvelopeDto = self.send_json("signup", request).await?;
        envelope.into_domain().map_err(RemoteApiError::decode)
    }

    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedUser, RemoteApiError> {
        let body = account_body(credentials, None);
        let request = self.request(Method::POST, &["login"])?.json(&body);
        let envelope: AuthEnvelopeDto = self.send_json("login", request).await?;
        envelope.into_domain().map_err(RemoteApiError::decode)
    }

    async fn fetch_profile(
        &self,
        token: &LoginToken,
        username: &Username,
    ) -> Result<UserProfile, RemoteApiError> {
        let request = self
            .request(Method::GET, &["users", username.as_ref()])?
            .query(&[("token", token.as_str())]);
        let envelope: UserEnvelopeDto = self.send_json("fetch_profile", request).await?;
        envelope.into_domain().map_err(RemoteApiError::decode)
    }

    async fn add_favorite(
        &self,
        token: &LoginToken,
        username: &Username,
        story_id: &StoryId,
    ) -> Result<(), RemoteApiError> {
        let request = self
            .favorite_request(Method::POST, username, story_id)?
            .json(&TokenBody {
                token: token.as_str(),
            });
        self.send("add_favorite", request).await.map(drop)
    }

    async fn remove_favorite(
        &self,
        token: &LoginToken,
        username: &Username,
        story_id: &StoryId,
    ) -> Result<(), RemoteApiError> {
        let request = self
            .favorite_request(Method::DELETE, username, story_id)?
            .json(&TokenBody {
                token: token.as_str(),
            });
        self.send("remove_favorite", request).await.map(drop)
    }
}

impl HackOrSnoozeHttpApi {
    fn favorite_request(
        &self,
        method: Method,
        username: &Username,
        story_id: &StoryId,
    ) -> Result<RequestBuilder, RemoteApiError> {
        self.request(
            method,
            &["users", username.as_ref(), "favorites", story_id.as_ref()],
        )
    }
}

fn account_body<'a>(credentials: &'a LoginCredentials, name: Option<&'a str>) -> impl Serialize + 'a {
    AccountBody {
        user: AccountFields {
            username: credentials.username().as_ref(),
            password: credentials.password(),
            name,
        },
    }
}

async fn exchange(request: RequestBuilder) -> Result<Vec<u8>, RemoteApiError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

/// Append percent-encoded path segments to `base`, keeping any base path.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, RemoteApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| RemoteApiError::rejected(format!("base url {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn decode<T: DeserializeOwned>(operation: &str, body: &[u8]) -> Result<T, RemoteApiError> {
    serde_json::from_slice(body).map_err(|error| {
        RemoteApiError::decode(format!("invalid {operation} response payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> RemoteApiError {
    // The URL may carry a token in its query string.
    let error = error.without_url();
    if error.is_timeout() {
        RemoteApiError::timeout(error.to_string())
    } else if error.is_decode() {
        RemoteApiError::decode(error.to_string())
    } else {
        RemoteApiError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteApiError {
    let detail = error_message(body).unwrap_or_else(|| body_preview(body));
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), detail)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteApiError::unauthorized(message),
        StatusCode::NOT_FOUND => RemoteApiError::not_found(message),
        StatusCode::CONFLICT => RemoteApiError::conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RemoteApiError::timeout(message)
        }
        _ if status.is_client_error() => RemoteApiError::rejected(message),
        _ => RemoteApiError::transport(message),
    }
}

fn error_message(body: &[u8]) -> Option<String> {
    let envelope: ErrorEnvelopeDto = serde_json::from_slice(body).ok()?;
    envelope.message().map(str::to_owned)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut chars = compact.chars();
    let preview: String = chars.by_ref().take(PREVIEW_CHAR_LIMIT).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

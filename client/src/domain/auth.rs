//! Authentication primitives: credentials, login tokens, stored sessions.
//!
//! Raw strings from a caller are validated here before any port is called,
//! so adapters only ever see well-formed values.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::user::{Username, UserValidationError};

/// Domain error returned when credential values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or malformed.
    InvalidUsername(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Login token was blank.
    EmptyToken,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUsername(err) => write!(f, "{err}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::EmptyToken => write!(f, "login token must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

impl From<UserValidationError> for LoginValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUsername(value)
    }
}

/// Opaque session credential issued by the remote API.
///
/// The value is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoginToken(Zeroizing<String>);

impl LoginToken {
    /// Validate and wrap a token string.
    pub fn new(token: impl Into<String>) -> Result<Self, LoginValidationError> {
        let token = Zeroizing::new(token.into());
        if token.trim().is_empty() {
            return Err(LoginValidationError::EmptyToken);
        }
        Ok(Self(token))
    }

    /// Raw token for request bodies and query strings.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for LoginToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoginToken(<redacted>)")
    }
}

impl TryFrom<String> for LoginToken {
    type Error = LoginValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LoginToken> for String {
    fn from(value: LoginToken) -> Self {
        value.as_str().to_owned()
    }
}

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use snooze_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada ", "hunter2").unwrap();
/// assert_eq!(creds.username().as_ref(), "ada");
/// assert_eq!(creds.password(), "hunter2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: Username,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let username = Username::new(username.trim())?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Account name to authenticate.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account details submitted when registering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupDetails {
    credentials: LoginCredentials,
    name: String,
}

impl SignupDetails {
    /// Construct signup details; the display name is passed through verbatim.
    pub fn try_from_parts(
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<Self, LoginValidationError> {
        Ok(Self {
            credentials: LoginCredentials::try_from_parts(username, password)?,
            name: name.to_owned(),
        })
    }

    /// Username and password for the new account.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Display name for the new account.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Token and username a caller may persist to restore a session later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Session token issued at login or signup.
    pub token: LoginToken,
    /// Account the token belongs to.
    pub username: Username,
}

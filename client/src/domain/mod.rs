//! Domain primitives and aggregates.
//!
//! Purpose: define the strongly typed story and user model and the
//! operations that keep local collections in step with the remote API. The
//! remote API itself is reached only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure taxonomy.
//! - Story / StoryId / NewStory: one remote story and its submission fields.
//! - StoryList: the global story collection.
//! - User / Username: the authenticated account and its cached lists.
//! - LoginCredentials / SignupDetails / LoginToken / StoredCredentials:
//!   authentication inputs and outputs.

pub mod auth;
pub mod error;
pub mod ports;
pub mod story;
pub mod story_list;
pub mod user;

pub use self::auth::{
    LoginCredentials, LoginToken, LoginValidationError, SignupDetails, StoredCredentials,
};
pub use self::error::{Error, ErrorCode};
pub use self::story::{NewStory, Story, StoryId, StoryValidationError};
pub use self::story_list::StoryList;
pub use self::user::{User, UserValidationError, Username, is_favorite};

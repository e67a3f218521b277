//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_api;
mod remote_error;
mod story_api;

#[cfg(test)]
pub use account_api::MockAccountApi;
pub use account_api::{AccountApi, AuthenticatedUser, UserProfile};
pub use remote_error::RemoteApiError;
#[cfg(test)]
pub use story_api::MockStoryApi;
pub use story_api::StoryApi;

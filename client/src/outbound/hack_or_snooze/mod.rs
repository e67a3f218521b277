//! Hack-or-Snooze outbound adapter.
//!
//! A thin HTTP implementation of the `StoryApi` and `AccountApi` ports.

mod dto;
mod http_api;

pub use http_api::{DEFAULT_USER_AGENT, HackOrSnoozeHttpApi};

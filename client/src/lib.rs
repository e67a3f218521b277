//! Typed client for the Hack-or-Snooze story sharing API.
//!
//! The [`domain`] owns stories, the story list and the authenticated user;
//! it reaches the remote API only through [`domain::ports`]. The reqwest
//! adapter lives in [`outbound`] and the `snooze` command line in [`inbound`].

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::ClientSettings;
pub use outbound::hack_or_snooze::HackOrSnoozeHttpApi;

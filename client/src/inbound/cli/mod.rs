//! Command-line adapter for the `snooze` binary.
//!
//! Parses arguments with clap, restores the session from configured stored
//! credentials, and drives the domain operations against any implementation
//! of the remote ports. Output goes to the supplied writer so commands can be
//! exercised without a terminal.

pub mod render;

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use crate::config::{ClientSettings, ConfigError};
use crate::domain::ports::{AccountApi, StoryApi};
use crate::domain::{
    Error, LoginCredentials, LoginValidationError, NewStory, SignupDetails, StoryId, StoryList,
    User,
};

use self::render::{write_credentials, write_profile, write_stories};

/// `snooze` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "snooze",
    about = "Browse, submit and favorite stories on Hack-or-Snooze",
    version
)]
pub struct Cli {
    /// Action to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported actions.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List every story, marking favorites when logged in.
    Stories,
    /// Submit a new story.
    Submit {
        /// Story title.
        #[arg(long)]
        title: String,
        /// Story author.
        #[arg(long)]
        author: String,
        /// Link to the story.
        #[arg(long)]
        url: String,
    },
    /// Delete one of your stories.
    Delete {
        /// Story id.
        id: StoryId,
    },
    /// Mark a story as a favorite.
    Favorite {
        /// Story id.
        id: StoryId,
    },
    /// Remove a story from your favorites.
    Unfavorite {
        /// Story id.
        id: StoryId,
    },
    /// List your favorites.
    Favorites,
    /// List the stories you submitted.
    Mine,
    /// Remove every favorite.
    ClearFavorites,
    /// Log in and print credentials to persist.
    Login {
        /// Account name.
        #[arg(long)]
        username: String,
        /// Account password. Prefer `SNOOZE_PASSWORD` over the flag.
        #[arg(long, env = "SNOOZE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and print credentials to persist.
    Signup {
        /// Account name.
        #[arg(long)]
        username: String,
        /// Account password. Prefer `SNOOZE_PASSWORD` over the flag.
        #[arg(long, env = "SNOOZE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name.
        #[arg(long)]
        name: String,
    },
    /// Show the logged-in account.
    Whoami,
}

/// Failures surfaced by [`run`].
#[derive(Debug, Error)]
pub enum CliError {
    /// A domain operation failed.
    #[error(transparent)]
    Domain(#[from] Error),
    /// Settings were invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Credentials passed on the command line were invalid.
    #[error("invalid credentials: {0}")]
    Credentials(#[from] LoginValidationError),
    /// The command needs a session and none is configured.
    #[error("not logged in; set SNOOZE_TOKEN and SNOOZE_USERNAME (see `snooze login`)")]
    NotLoggedIn,
    /// The configured session was rejected by the server.
    #[error("stored session for {username} is no longer valid; log in again")]
    SessionExpired {
        /// Account named by the stored credentials.
        username: String,
    },
    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Execute one command against `api`, writing human-readable output to `out`.
///
/// # Errors
///
/// Returns [`CliError`] when configuration, authentication or a remote call
/// fails.
pub async fn run<A, W>(
    command: Command,
    api: &A,
    settings: &ClientSettings,
    out: &mut W,
) -> Result<(), CliError>
where
    A: StoryApi + AccountApi + ?Sized,
    W: Write + ?Sized,
{
    match command {
        Command::Stories => {
            let stories = StoryList::fetch_all(api).await?;
            let user = try_restore(api, settings).await?;
            write_stories(out, &stories, user.as_ref(), "No stories yet.")?;
        }
        Command::Submit { title, author, url } => {
            let user = restore(api, settings).await?;
            let submission = NewStory { title, author, url };
            let mut stories = StoryList::default();
            let created = stories.add_story(api, &user, &submission).await?;
            writeln!(out, "Submitted {}", render::story_line(&created, Some(&user)))?;
        }
        Command::Delete { id } => {
            let mut user = restore(api, settings).await?;
            let mut stories = StoryList::fetch_all(api).await?;
            let removed = stories.delete_story(api, &user, &id).await?;
            user.forget_story(&id);
            writeln!(out, "Deleted {}", render::story_line(&removed, None))?;
        }
        Command::Favorite { id } => {
            let mut user = restore(api, settings).await?;
            user.add_favorite(api, &id).await?;
            writeln!(out, "Favorited {id}")?;
        }
        Command::Unfavorite { id } => {
            let mut user = restore(api, settings).await?;
            user.remove_favorite(api, &id).await?;
            writeln!(out, "Unfavorited {id}")?;
        }
        Command::Favorites => {
            let user = restore(api, settings).await?;
            write_stories(out, user.favorites(), Some(&user), "No favorites added!")?;
        }
        Command::Mine => {
            let user = restore(api, settings).await?;
            write_stories(out, user.own_stories(), Some(&user), "No stories added by user yet!")?;
        }
        Command::ClearFavorites => {
            let mut user = restore(api, settings).await?;
            let count = user.favorites().len();
            user.clear_favorites(api).await?;
            writeln!(out, "Cleared {count} favorites")?;
        }
        Command::Login { username, password } => {
            let credentials = LoginCredentials::try_from_parts(&username, &password)?;
            let user = User::login(api, &credentials).await?;
            info!(username = %user.username(), "session started");
            write_credentials(out, &user.stored_credentials())?;
        }
        Command::Signup {
            username,
            password,
            name,
        } => {
            let details = SignupDetails::try_from_parts(&username, &password, &name)?;
            let user = User::signup(api, &details).await?;
            info!(username = %user.username(), "account created");
            write_credentials(out, &user.stored_credentials())?;
        }
        Command::Whoami => {
            let user = restore(api, settings).await?;
            write_profile(out, &user)?;
        }
    }
    Ok(())
}

/// Restore the configured session, if any. An invalid session is dropped.
async fn try_restore<A>(api: &A, settings: &ClientSettings) -> Result<Option<User>, CliError>
where
    A: AccountApi + ?Sized,
{
    let Some(stored) = settings.stored_credentials()? else {
        return Ok(None);
    };
    Ok(User::login_via_stored_credentials(api, &stored).await)
}

async fn restore<A>(api: &A, settings: &ClientSettings) -> Result<User, CliError>
where
    A: AccountApi + ?Sized,
{
    let stored = settings
        .stored_credentials()?
        .ok_or(CliError::NotLoggedIn)?;
    let user = User::login_via_stored_credentials(api, &stored)
        .await
        .ok_or_else(|| CliError::SessionExpired {
            username: stored.username.to_string(),
        })?;
    info!(username = %user.username(), "session restored");
    Ok(user)
}

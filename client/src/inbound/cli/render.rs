//! Plain-text rendering of stories and sessions for terminal output.

use std::io::{self, Write};

use crate::domain::{Story, StoredCredentials, User, is_favorite};

/// Marker shown before a favorited story.
pub const FAVORITE_MARKER: char = '*';
/// Marker shown before any other story.
pub const PLAIN_MARKER: char = '-';

/// Format one story as `<star> <title> (<host>) by <author> posted by <username> [<id>]`.
pub fn story_line(story: &Story, user: Option<&User>) -> String {
    let marker = if is_favorite(user, story) {
        FAVORITE_MARKER
    } else {
        PLAIN_MARKER
    };
    format!(
        "{marker} {title} ({host}) by {author} posted by {username} [{id}]",
        title = story.title(),
        host = story.host_name(),
        author = story.author(),
        username = story.username(),
        id = story.id(),
    )
}

/// Write one line per story, or a placeholder when there are none.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_stories<'a, W>(
    out: &mut W,
    stories: impl IntoIterator<Item = &'a Story>,
    user: Option<&User>,
    empty_message: &str,
) -> io::Result<()>
where
    W: Write + ?Sized,
{
    let mut written = 0_usize;
    for story in stories {
        writeln!(out, "{}", story_line(story, user))?;
        written += 1;
    }
    if written == 0 {
        writeln!(out, "{empty_message}")?;
    }
    Ok(())
}

/// Write shell assignments a caller can persist to restore the session.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_credentials<W>(out: &mut W, stored: &StoredCredentials) -> io::Result<()>
where
    W: Write + ?Sized,
{
    writeln!(out, "SNOOZE_USERNAME={}", stored.username)?;
    writeln!(out, "SNOOZE_TOKEN={}", stored.token.as_str())
}

/// Write a short account summary.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_profile<W>(out: &mut W, user: &User) -> io::Result<()>
where
    W: Write + ?Sized,
{
    writeln!(
        out,
        "{username} ({name}), member since {since}",
        username = user.username(),
        name = user.name(),
        since = user.created_at().format("%Y-%m-%d"),
    )?;
    writeln!(
        out,
        "{} favorites, {} submitted stories",
        user.favorites().len(),
        user.own_stories().len()
    )
}

//! Constraint-name lookup for SQLite failures.
//!
//! The schema names every rule it enforces: UNIQUE columns surface as
//! `table.column`, and the referential triggers of migration v002 abort with
//! `RAISE(ABORT, '<name>')`. Both end up as a `ConstraintViolation` whose
//! message carries the name, so classification is a table lookup instead of
//! pattern matching on free-form text.

use rusqlite::ErrorCode;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    UserNickname,
    UserEmail,
    ForumSlug,
    ForumOwner,
    ThreadSlug,
    ThreadAuthor,
    ThreadForum,
    PostAuthor,
    PostParent,
    PostThread,
    VoteUser,
    VoteThread,
}

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

const CONSTRAINTS: &[(&str, Constraint)] = &[
    ("users.nickname", Constraint::UserNickname),
    ("users.email", Constraint::UserEmail),
    ("forums.slug", Constraint::ForumSlug),
    ("forums_owner_fkey", Constraint::ForumOwner),
    ("threads.slug", Constraint::ThreadSlug),
    ("threads_author_fkey", Constraint::ThreadAuthor),
    ("threads_forum_fkey", Constraint::ThreadForum),
    ("posts_author_fkey", Constraint::PostAuthor),
    ("posts_parent_fkey", Constraint::PostParent),
    ("posts_thread_fkey", Constraint::PostThread),
    ("votes_nickname_fkey", Constraint::VoteUser),
    ("votes_thread_fkey", Constraint::VoteThread),
];

/// Name the constraint behind `err`, if it is a known constraint failure.
pub(crate) fn constraint_of(err: &rusqlite::Error) -> Option<Constraint> {
    let rusqlite::Error::SqliteFailure(code, Some(message)) = err else {
        return None;
    };
    if code.code != ErrorCode::ConstraintViolation {
        return None;
    }
    let name = message.strip_prefix(UNIQUE_PREFIX).unwrap_or(message);
    CONSTRAINTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, constraint)| *constraint)
}

/// Translate a SQLite failure using `map` for the constraints the calling
/// operation expects. Anything unmapped stays an internal error.
pub(crate) fn classify<F>(err: rusqlite::Error, map: F) -> StoreError
where
    F: FnOnce(Constraint) -> Option<StoreError>,
{
    match constraint_of(&err).and_then(map) {
        Some(mapped) => {
            tracing::debug!(error = %err, mapped = %mapped, "constraint violation");
            mapped
        }
        None => {
            if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
                tracing::warn!(error = %err, "unexpected constraint violation");
            }
            StoreError::Sqlite(err)
        }
    }
}

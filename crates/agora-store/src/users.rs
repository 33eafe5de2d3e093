//! Identity store: the users every other record refers to by nickname.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{CreateOutcome, User, UserUpdate};
use crate::violation::{classify, Constraint};

pub(crate) const USER_COLUMNS: &str = "nickname, fullname, email, about";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a user. When the nickname or the email is taken, nothing is
    /// written and every user holding either one is returned instead.
    pub fn create_user(&mut self, user: &User) -> Result<CreateOutcome<User, Vec<User>>> {
        self.write("create_user", |tx| {
            let existing = users_colliding(tx, &user.nickname, &user.email)?;
            if !existing.is_empty() {
                tracing::debug!(nickname = %user.nickname, conflicts = existing.len(), "user conflict");
                return Ok(CreateOutcome::Conflict(existing));
            }

            tx.execute(
                "INSERT INTO users (nickname, fullname, email, about) VALUES (?1, ?2, ?3, ?4)",
                params![user.nickname, user.fullname, user.email, user.about],
            )
            .map_err(|e| {
                classify(e, |c| match c {
                    Constraint::UserNickname => {
                        Some(StoreError::UserAlreadyExists(user.nickname.clone()))
                    }
                    Constraint::UserEmail => Some(StoreError::EmailTaken(user.email.clone())),
                    _ => None,
                })
            })?;

            tracing::debug!(nickname = %user.nickname, "user created");
            Ok(CreateOutcome::Created(user.clone()))
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a user; the nickname is matched case-insensitively.
    pub fn get_user(&self, nickname: &str) -> Result<User> {
        fetch_user(self.conn(), nickname)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Change the given profile fields, keeping the rest.
    pub fn update_user(&mut self, nickname: &str, update: &UserUpdate) -> Result<User> {
        self.write("update_user", |tx| {
            tx.query_row(
                &format!(
                    "UPDATE users SET
                         fullname = COALESCE(?2, fullname),
                         email    = COALESCE(?3, email),
                         about    = COALESCE(?4, about)
                     WHERE nickname = ?1
                     RETURNING {USER_COLUMNS}"
                ),
                params![nickname, update.fullname, update.email, update.about],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::UserNotFound(nickname.to_string()),
                other => classify(other, |c| match c {
                    Constraint::UserEmail => Some(StoreError::EmailTaken(
                        update.email.clone().unwrap_or_default(),
                    )),
                    _ => None,
                }),
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn fetch_user(conn: &Connection, nickname: &str) -> Result<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE nickname = ?1"),
        params![nickname],
        row_to_user,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::UserNotFound(nickname.to_string()),
        other => StoreError::Sqlite(other),
    })
}

/// Stored spelling of `nickname`, if such a user exists.
pub(crate) fn canonical_nickname(conn: &Connection, nickname: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT nickname FROM users WHERE nickname = ?1",
            params![nickname],
            |row| row.get(0),
        )
        .optional()?)
}

fn users_colliding(conn: &Connection, nickname: &str, email: &str) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE nickname = ?1 OR email = ?2
         ORDER BY nickname"
    ))?;
    let rows = stmt.query_map(params![nickname, email], row_to_user)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(StoreError::Sqlite)
}

/// Map a `rusqlite::Row` selected with [`USER_COLUMNS`] to a [`User`].
pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        nickname: row.get(0)?,
        fullname: row.get(1)?,
        email: row.get(2)?,
        about: row.get(3)?,
    })
}

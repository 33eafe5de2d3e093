//! Forum registry: creation and lookup by slug, plus the users active in a
//! forum. The `posts`/`threads` counters are maintained by triggers.

use agora_shared::UserQuery;
use rusqlite::{params, Connection};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{CreateOutcome, Forum, NewForum, User};
use crate::users::{row_to_user, USER_COLUMNS};
use crate::violation::{classify, Constraint};

const FORUM_COLUMNS: &str = "slug, title, owner, posts, threads";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a forum. The owner nickname is matched case-insensitively and
    /// stored in its canonical spelling.
    ///
    /// Fails with [`StoreError::OwnerNotFound`] or
    /// [`StoreError::ForumAlreadyExists`].
    pub fn insert_forum(&mut self, forum: &NewForum) -> Result<Forum> {
        self.write("insert_forum", |tx| {
            tx.query_row(
                &format!(
                    "INSERT INTO forums (slug, title, owner)
                     VALUES (?1, ?2, COALESCE((SELECT nickname FROM users WHERE nickname = ?3), ?3))
                     RETURNING {FORUM_COLUMNS}"
                ),
                params![forum.slug, forum.title, forum.user],
                row_to_forum,
            )
            .map_err(|e| {
                classify(e, |c| match c {
                    Constraint::ForumSlug => Some(StoreError::ForumAlreadyExists(forum.slug.clone())),
                    Constraint::ForumOwner => Some(StoreError::OwnerNotFound(forum.user.clone())),
                    _ => None,
                })
            })
        })
    }

    /// Create a forum, or report the forum already holding the slug.
    pub fn create_forum(&mut self, forum: &NewForum) -> Result<CreateOutcome<Forum>> {
        match self.insert_forum(forum) {
            Ok(created) => {
                tracing::debug!(slug = %created.slug, "forum created");
                Ok(CreateOutcome::Created(created))
            }
            Err(StoreError::ForumAlreadyExists(slug)) => {
                let existing = self.get_forum(&slug)?;
                Ok(CreateOutcome::Conflict(existing))
            }
            Err(other) => Err(other),
        }
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_forum(&self, slug: &str) -> Result<Forum> {
        fetch_forum(self.conn(), slug)
    }

    /// Users who authored a thread or a post in the forum, ordered by
    /// nickname. `since` is an exclusive nickname cursor.
    pub fn list_forum_users(&self, slug: &str, query: &UserQuery) -> Result<Vec<User>> {
        let forum = self.get_forum(slug)?;

        let (cmp, dir) = if query.desc { ("<", "DESC") } else { (">", "ASC") };
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE nickname IN (
                 SELECT author FROM threads WHERE forum = ?1
                 UNION
                 SELECT author FROM posts WHERE forum = ?1
             )
             AND (?2 IS NULL OR nickname {cmp} ?2)
             ORDER BY nickname {dir}
             LIMIT ?3"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![forum.slug, query.since, query.effective_limit()],
            row_to_user,
        )?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn fetch_forum(conn: &Connection, slug: &str) -> Result<Forum> {
    conn.query_row(
        &format!("SELECT {FORUM_COLUMNS} FROM forums WHERE slug = ?1"),
        params![slug],
        row_to_forum,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::ForumNotFound(slug.to_string()),
        other => StoreError::Sqlite(other),
    })
}

/// Map a `rusqlite::Row` to a [`Forum`].
fn row_to_forum(row: &rusqlite::Row<'_>) -> rusqlite::Result<Forum> {
    Ok(Forum {
        slug: row.get(0)?,
        title: row.get(1)?,
        user: row.get(2)?,
        posts: row.get(3)?,
        threads: row.get(4)?,
    })
}

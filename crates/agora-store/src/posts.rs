//! Post hierarchy engine.
//!
//! Posts form a reply tree inside their thread. Each post stores its
//! materialized [`PostPath`] and the id of its top-level ancestor (`root`),
//! so all three read orders are single SQL statements:
//!
//! * **flat** orders by `(created, id)`; `since` is an exclusive id cursor.
//! * **tree** orders by path; `since` names a post whose path is the
//!   exclusive bound.
//! * **parent_tree** pages over top-level posts and returns each selected
//!   root with every descendant, ordered by `(root, path)`.

use agora_shared::constants::ROOT_PARENT;
use agora_shared::{PostQuery, Related, SortMode, ThreadRef};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::forums::fetch_forum;
use crate::models::{NewPost, Post, PostDetails};
use crate::path::PostPath;
use crate::threads::{fetch_thread, resolve};
use crate::timestamp;
use crate::users::{canonical_nickname, fetch_user};
use crate::violation::{classify, Constraint};

const POST_COLUMNS: &str = "id, parent, author, message, is_edited, forum, thread, created, path";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create a batch of posts in one thread.
    ///
    /// Every post of the batch shares `created`, ids are assigned by the
    /// store in input order, and the batch is all-or-nothing. Parents are
    /// checked against posts that existed before the batch started, so a
    /// batch cannot reply to one of its own posts.
    ///
    /// Posts are filed under the thread's own forum. A `forum` that does not
    /// name it (case-insensitively) fails with [`StoreError::ForumNotFound`].
    ///
    /// Fails with [`StoreError::ThreadNotFound`],
    /// [`StoreError::ParentNotFound`] or [`StoreError::AuthorNotFound`].
    pub fn create_posts(
        &mut self,
        thread_id: i64,
        forum: &str,
        created: DateTime<Utc>,
        inputs: &[NewPost],
    ) -> Result<Vec<Post>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let created = timestamp::normalize(created);
        let created_sql = timestamp::to_sql(&created);

        let posts = self.write("create_posts", |tx| {
            let (_, thread_forum) = resolve(tx, &ThreadRef::Id(thread_id))?;
            if !thread_forum.eq_ignore_ascii_case(forum) {
                return Err(StoreError::ForumNotFound(forum.to_string()));
            }

            let mut checked = Vec::with_capacity(inputs.len());
            for input in inputs {
                let parent_path = if input.parent == ROOT_PARENT {
                    None
                } else {
                    let path = parent_path(tx, thread_id, input.parent)?
                        .ok_or(StoreError::ParentNotFound(input.parent))?;
                    Some(path)
                };
                let author = canonical_nickname(tx, &input.author)?
                    .ok_or_else(|| StoreError::AuthorNotFound(input.author.clone()))?;
                checked.push((input, author, parent_path));
            }

            let mut insert = tx.prepare(
                "INSERT INTO posts (parent, author, message, forum, thread, created)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut place = tx.prepare("UPDATE posts SET path = ?2, root = ?3 WHERE id = ?1")?;

            let mut posts = Vec::with_capacity(checked.len());
            for (input, author, parent_path) in checked {
                insert
                    .execute(params![input.parent, author, input.message, thread_forum, thread_id, created_sql])
                    .map_err(|e| {
                        classify(e, |c| match c {
                            Constraint::PostParent => Some(StoreError::ParentNotFound(input.parent)),
                            Constraint::PostAuthor => {
                                Some(StoreError::AuthorNotFound(input.author.clone()))
                            }
                            Constraint::PostThread => {
                                Some(StoreError::ThreadNotFound(thread_id.to_string()))
                            }
                            _ => None,
                        })
                    })?;

                let id = tx.last_insert_rowid();
                let path = match parent_path {
                    Some(parent) => parent.child(id),
                    None => PostPath::root(id),
                };
                place.execute(params![id, path, path.root_id()])?;

                posts.push(Post {
                    id,
                    parent: input.parent,
                    author,
                    message: input.message.clone(),
                    is_edited: false,
                    forum: thread_forum.clone(),
                    thread: thread_id,
                    created,
                    path,
                });
            }
            Ok(posts)
        })?;

        tracing::debug!(thread = thread_id, count = posts.len(), "posts created");
        Ok(posts)
    }

    /// Resolve `thread` and create the batch there, stamped with the current
    /// time.
    pub fn add_posts(&mut self, thread: &ThreadRef, inputs: &[NewPost]) -> Result<Vec<Post>> {
        let (thread_id, forum) = self.resolve_thread_and_forum(thread)?;
        self.create_posts(thread_id, &forum, Utc::now(), inputs)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Posts of a thread in the order and page described by `query`. An
    /// empty or unknown thread yields an empty list.
    pub fn get_posts(&self, thread_id: i64, query: &PostQuery) -> Result<Vec<Post>> {
        let (cmp, dir) = if query.desc { ("<", "DESC") } else { (">", "ASC") };

        let sql = match query.sort {
            SortMode::Flat => format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE thread = ?1 AND (?2 IS NULL OR id {cmp} ?2)
                 ORDER BY created {dir}, id {dir}
                 LIMIT ?3"
            ),
            SortMode::Tree => format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE thread = ?1
                   AND (?2 IS NULL OR path {cmp} (SELECT path FROM posts WHERE id = ?2))
                 ORDER BY path {dir}
                 LIMIT ?3"
            ),
            SortMode::ParentTree => format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE thread = ?1 AND root IN (
                     SELECT id FROM posts
                     WHERE thread = ?1 AND parent = 0
                       AND (?2 IS NULL OR id {cmp} (SELECT root FROM posts WHERE id = ?2))
                     ORDER BY id {dir}
                     LIMIT ?3
                 )
                 ORDER BY root {dir}, path ASC"
            ),
        };

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![thread_id, query.since, query.effective_limit()],
            row_to_post,
        )?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    /// Resolve `thread` and list its posts.
    pub fn list_posts(&self, thread: &ThreadRef, query: &PostQuery) -> Result<Vec<Post>> {
        let thread_id = self.resolve_thread(thread)?;
        self.get_posts(thread_id, query)
    }

    pub fn get_post(&self, id: i64) -> Result<Post> {
        fetch_post(self.conn(), id)
    }

    /// A post plus the requested related records.
    pub fn post_details(&self, id: i64, related: &[Related]) -> Result<PostDetails> {
        let post = self.get_post(id)?;
        let mut details = PostDetails {
            author: None,
            thread: None,
            forum: None,
            post,
        };

        for item in related {
            match item {
                Related::User => {
                    details.author = Some(fetch_user(self.conn(), &details.post.author)?);
                }
                Related::Thread => {
                    details.thread =
                        Some(fetch_thread(self.conn(), &ThreadRef::Id(details.post.thread))?);
                }
                Related::Forum => {
                    details.forum = Some(fetch_forum(self.conn(), &details.post.forum)?);
                }
            }
        }
        Ok(details)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace a post's message. An empty message changes nothing, and the
    /// edited flag is only set when the text actually differs.
    pub fn update_post(&mut self, id: i64, message: &str) -> Result<Post> {
        self.write("update_post", |tx| {
            tx.query_row(
                &format!(
                    "UPDATE posts SET
                         is_edited = CASE WHEN ?2 = '' OR message = ?2 THEN is_edited ELSE 1 END,
                         message   = CASE WHEN ?2 = '' THEN message ELSE ?2 END
                     WHERE id = ?1
                     RETURNING {POST_COLUMNS}"
                ),
                params![id, message],
                row_to_post,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::PostNotFound(id),
                other => StoreError::Sqlite(other),
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parent_path(conn: &Connection, thread_id: i64, parent: i64) -> Result<Option<PostPath>> {
    Ok(conn
        .query_row(
            "SELECT path FROM posts WHERE id = ?1 AND thread = ?2",
            params![parent, thread_id],
            |row| row.get(0),
        )
        .optional()?)
}

fn fetch_post(conn: &Connection, id: i64) -> Result<Post> {
    conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
        params![id],
        row_to_post,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::PostNotFound(id),
        other => StoreError::Sqlite(other),
    })
}

/// Map a `rusqlite::Row` selected with [`POST_COLUMNS`] to a [`Post`].
fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let created_str: String = row.get(7)?;

    Ok(Post {
        id: row.get(0)?,
        parent: row.get(1)?,
        author: row.get(2)?,
        message: row.get(3)?,
        is_edited: row.get(4)?,
        forum: row.get(5)?,
        thread: row.get(6)?,
        created: timestamp::from_sql(7, &created_str)?,
        path: row.get(8)?,
    })
}

//! Thread store: creation, dual-key resolution (id or slug), listing by
//! forum and editing of title/message. The vote total is written only by the
//! vote ledger.

use agora_shared::{ThreadQuery, ThreadRef};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, Connection};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::forums::fetch_forum;
use crate::models::{CreateOutcome, NewThread, Thread, ThreadUpdate};
use crate::timestamp;
use crate::violation::{classify, Constraint};

const THREAD_COLUMNS: &str = "id, slug, title, author, forum, message, votes, created";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a thread. Author and forum are stored in their canonical
    /// spelling; an empty slug counts as no slug.
    ///
    /// Fails with [`StoreError::ThreadAlreadyExists`],
    /// [`StoreError::AuthorNotFound`] or [`StoreError::ForumNotFound`].
    pub fn insert_thread(&mut self, thread: &NewThread) -> Result<Thread> {
        let slug = thread.slug.as_deref().filter(|s| !s.is_empty());
        let created = timestamp::normalize(thread.created.unwrap_or_else(Utc::now));

        self.write("insert_thread", |tx| {
            if let Some(slug) = slug {
                let taken: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM threads WHERE slug = ?1)",
                    params![slug],
                    |row| row.get(0),
                )?;
                if taken {
                    return Err(StoreError::ThreadAlreadyExists(slug.to_string()));
                }
            }

            tx.query_row(
                &format!(
                    "INSERT INTO threads (title, message, slug, author, forum, created)
                     VALUES (?1, ?2, ?3,
                         COALESCE((SELECT nickname FROM users WHERE nickname = ?4), ?4),
                         COALESCE((SELECT slug FROM forums WHERE slug = ?5), ?5),
                         ?6)
                     RETURNING {THREAD_COLUMNS}"
                ),
                params![
                    thread.title,
                    thread.message,
                    slug,
                    thread.author,
                    thread.forum,
                    timestamp::to_sql(&created),
                ],
                row_to_thread,
            )
            .map_err(|e| {
                classify(e, |c| match c {
                    Constraint::ThreadSlug => Some(StoreError::ThreadAlreadyExists(
                        slug.unwrap_or_default().to_string(),
                    )),
                    Constraint::ThreadAuthor => {
                        Some(StoreError::AuthorNotFound(thread.author.clone()))
                    }
                    Constraint::ThreadForum => Some(StoreError::ForumNotFound(thread.forum.clone())),
                    _ => None,
                })
            })
        })
    }

    /// Create a thread, or report the thread already holding the slug.
    pub fn create_thread(&mut self, thread: &NewThread) -> Result<CreateOutcome<Thread>> {
        match self.insert_thread(thread) {
            Ok(created) => {
                tracing::debug!(id = created.id, forum = %created.forum, "thread created");
                Ok(CreateOutcome::Created(created))
            }
            Err(StoreError::ThreadAlreadyExists(slug)) => {
                let existing = self.get_thread(&ThreadRef::Slug(slug))?;
                Ok(CreateOutcome::Conflict(existing))
            }
            Err(other) => Err(other),
        }
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Canonical numeric id of the referenced thread.
    pub fn resolve_thread(&self, reference: &ThreadRef) -> Result<i64> {
        self.resolve_thread_and_forum(reference).map(|(id, _)| id)
    }

    /// Canonical numeric id of the referenced thread and its forum slug.
    pub fn resolve_thread_and_forum(&self, reference: &ThreadRef) -> Result<(i64, String)> {
        resolve(self.conn(), reference)
    }

    pub fn get_thread(&self, reference: &ThreadRef) -> Result<Thread> {
        fetch_thread(self.conn(), reference)
    }

    pub fn get_thread_by_id(&self, id: i64) -> Result<Thread> {
        self.get_thread(&ThreadRef::Id(id))
    }

    /// Threads of a forum ordered by creation time. `since` is inclusive:
    /// `>=` ascending, `<=` descending. Stored times have millisecond
    /// precision, so a finer `since` is rounded up when ascending and down
    /// when descending.
    pub fn list_threads_by_forum(&self, forum: &str, query: &ThreadQuery) -> Result<Vec<Thread>> {
        let forum = fetch_forum(self.conn(), forum)?;

        let (cmp, dir) = if query.desc { ("<=", "DESC") } else { (">=", "ASC") };
        let sql = format!(
            "SELECT {THREAD_COLUMNS} FROM threads
             WHERE forum = ?1 AND (?2 IS NULL OR created {cmp} ?2)
             ORDER BY created {dir}, id {dir}
             LIMIT ?3"
        );

        let since = query.since.map(|since| {
            let bound = if query.desc {
                timestamp::normalize(since)
            } else {
                timestamp::round_up(since)
            };
            timestamp::to_sql(&bound)
        });
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![forum.slug, since, query.effective_limit()],
            row_to_thread,
        )?;

        let mut threads = Vec::new();
        for row in rows {
            threads.push(row?);
        }
        Ok(threads)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Change title and/or message; absent or empty fields keep their value.
    pub fn update_thread(&mut self, reference: &ThreadRef, update: &ThreadUpdate) -> Result<Thread> {
        let (clause, key) = key_clause(reference);
        let title = update.title.as_deref().filter(|s| !s.is_empty());
        let message = update.message.as_deref().filter(|s| !s.is_empty());

        self.write("update_thread", |tx| {
            tx.query_row(
                &format!(
                    "UPDATE threads SET
                         title   = COALESCE(?2, title),
                         message = COALESCE(?3, message)
                     WHERE {clause}
                     RETURNING {THREAD_COLUMNS}"
                ),
                params![key, title, message],
                row_to_thread,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::ThreadNotFound(reference.to_string()),
                other => StoreError::Sqlite(other),
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `WHERE` clause selecting the referenced thread, bound to `?1`.
fn key_clause(reference: &ThreadRef) -> (&'static str, Value) {
    match reference {
        ThreadRef::Id(id) => ("id = ?1", Value::Integer(*id)),
        ThreadRef::Slug(slug) => ("slug = ?1", Value::Text(slug.clone())),
    }
}

pub(crate) fn resolve(conn: &Connection, reference: &ThreadRef) -> Result<(i64, String)> {
    let (clause, key) = key_clause(reference);
    conn.query_row(
        &format!("SELECT id, forum FROM threads WHERE {clause}"),
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::ThreadNotFound(reference.to_string()),
        other => StoreError::Sqlite(other),
    })
}

pub(crate) fn fetch_thread(conn: &Connection, reference: &ThreadRef) -> Result<Thread> {
    let (clause, key) = key_clause(reference);
    conn.query_row(
        &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE {clause}"),
        params![key],
        row_to_thread,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::ThreadNotFound(reference.to_string()),
        other => StoreError::Sqlite(other),
    })
}

/// Map a `rusqlite::Row` to a [`Thread`].
fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<Thread> {
    let created_str: String = row.get(7)?;

    Ok(Thread {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        author: row.get(3)?,
        forum: row.get(4)?,
        message: row.get(5)?,
        votes: row.get(6)?,
        created: timestamp::from_sql(7, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::{DateTime, Duration, TimeZone};

    fn new_thread(slug: Option<&str>, created: Option<DateTime<Utc>>) -> NewThread {
        NewThread {
            title: "Whiskers".to_string(),
            author: "alice".to_string(),
            forum: "cats".to_string(),
            message: "Long whiskers?".to_string(),
            slug: slug.map(str::to_string),
            created,
        }
    }

    fn setup() -> (tempfile::TempDir, Database) {
        let (dir, mut db) = testing::temp_db();
        testing::user(&mut db, "alice");
        testing::forum(&mut db, "cats", "alice");
        (dir, db)
    }

    #[test]
    fn create_without_slug_resolves_by_id() {
        let (_dir, mut db) = setup();
        let thread = db.create_thread(&new_thread(None, None)).unwrap().created().unwrap();
        assert!(thread.id > 0);
        assert_eq!(thread.slug, None);
        assert_eq!(thread.votes, 0);
        assert_eq!(db.resolve_thread(&ThreadRef::Id(thread.id)).unwrap(), thread.id);
    }

    #[test]
    fn canonical_author_and_forum_are_stored() {
        let (_dir, mut db) = setup();
        let mut input = new_thread(Some("whiskers"), None);
        input.author = "ALICE".into();
        input.forum = "Cats".into();

        let thread = db.insert_thread(&input).unwrap();
        assert_eq!(thread.author, "alice");
        assert_eq!(thread.forum, "cats");

        let (id, forum) = db
            .resolve_thread_and_forum(&ThreadRef::Slug("WHISKERS".into()))
            .unwrap();
        assert_eq!((id, forum.as_str()), (thread.id, "cats"));
    }

    #[test]
    fn duplicate_slug_returns_existing() {
        let (_dir, mut db) = setup();
        let first = db.insert_thread(&new_thread(Some("whiskers"), None)).unwrap();

        let err = db.insert_thread(&new_thread(Some("whiskers"), None)).unwrap_err();
        assert!(matches!(err, StoreError::ThreadAlreadyExists(_)));

        let outcome = db.create_thread(&new_thread(Some("whiskers"), None)).unwrap();
        assert_eq!(outcome, CreateOutcome::Conflict(first));
        assert_eq!(db.get_forum("cats").unwrap().threads, 1);
    }

    #[test]
    fn missing_author_or_forum() {
        let (_dir, mut db) = setup();

        let mut input = new_thread(None, None);
        input.author = "ghost".into();
        assert!(matches!(
            db.create_thread(&input),
            Err(StoreError::AuthorNotFound(ref n)) if n == "ghost"
        ));

        let mut input = new_thread(None, None);
        input.forum = "dogs".into();
        assert!(matches!(db.create_thread(&input), Err(StoreError::ForumNotFound(_))));
    }

    #[test]
    fn empty_slug_means_none() {
        let (_dir, mut db) = setup();
        let a = db.insert_thread(&new_thread(Some(""), None)).unwrap();
        let b = db.insert_thread(&new_thread(Some(""), None)).unwrap();
        assert_eq!(a.slug, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn unknown_reference_is_not_found() {
        let (_dir, db) = setup();
        assert!(matches!(db.resolve_thread(&ThreadRef::Id(99)), Err(StoreError::ThreadNotFound(_))));
        assert!(matches!(
            db.get_thread(&ThreadRef::Slug("nope".into())),
            Err(StoreError::ThreadNotFound(_))
        ));
    }

    #[test]
    fn list_respects_direction_and_inclusive_since() {
        let (_dir, mut db) = setup();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ids: Vec<i64> = (0..3)
            .map(|i| {
                db.insert_thread(&new_thread(None, Some(base + Duration::hours(i))))
                    .unwrap()
                    .id
            })
            .collect();

        let all = db.list_threads_by_forum("cats", &ThreadQuery::default()).unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), ids);

        let since_middle = ThreadQuery {
            since: Some(base + Duration::hours(1)),
            ..ThreadQuery::default()
        };
        let asc = db.list_threads_by_forum("cats", &since_middle).unwrap();
        assert_eq!(asc.iter().map(|t| t.id).collect::<Vec<_>>(), vec![ids[1], ids[2]]);

        let desc = db
            .list_threads_by_forum(
                "cats",
                &ThreadQuery {
                    desc: true,
                    limit: 1,
                    ..since_middle
                },
            )
            .unwrap();
        assert_eq!(desc.iter().map(|t| t.id).collect::<Vec<_>>(), vec![ids[1]]);

        assert!(matches!(
            db.list_threads_by_forum("dogs", &ThreadQuery::default()),
            Err(StoreError::ForumNotFound(_))
        ));
    }

    #[test]
    fn sub_millisecond_since_stays_inclusive() {
        let (_dir, mut db) = setup();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let early = db.insert_thread(&new_thread(None, Some(base))).unwrap();
        let late = db
            .insert_thread(&new_thread(None, Some(base + Duration::milliseconds(1))))
            .unwrap();

        let since = Some(base + Duration::microseconds(500));
        let asc = db
            .list_threads_by_forum("cats", &ThreadQuery { since, ..ThreadQuery::default() })
            .unwrap();
        assert_eq!(asc.iter().map(|t| t.id).collect::<Vec<_>>(), vec![late.id]);

        let desc = db
            .list_threads_by_forum(
                "cats",
                &ThreadQuery { since, desc: true, ..ThreadQuery::default() },
            )
            .unwrap();
        assert_eq!(desc.iter().map(|t| t.id).collect::<Vec<_>>(), vec![early.id]);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let (_dir, mut db) = setup();
        let thread = db.insert_thread(&new_thread(Some("whiskers"), None)).unwrap();

        let updated = db
            .update_thread(
                &ThreadRef::Slug("whiskers".into()),
                &ThreadUpdate {
                    title: Some("Short whiskers".into()),
                    message: Some(String::new()),
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Short whiskers");
        assert_eq!(updated.message, thread.message);
        assert_eq!(updated.created, thread.created);

        assert!(matches!(
            db.update_thread(&ThreadRef::Id(404), &ThreadUpdate::default()),
            Err(StoreError::ThreadNotFound(_))
        ));
    }
}

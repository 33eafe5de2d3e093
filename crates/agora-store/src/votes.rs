//! Vote ledger.
//!
//! At most one vote per `(user, thread)`. Casting a vote upserts the ledger
//! row and recomputes the thread's denormalized score from the ledger in the
//! same transaction, so the score always equals the sum of current voices.

use agora_shared::{ThreadRef, Voice};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Thread, Vote};
use crate::threads::{fetch_thread, resolve};
use crate::violation::{classify, Constraint};

impl Database {
    /// Record `nickname`'s voice on a thread, replacing any earlier voice,
    /// and return the thread with its updated score.
    pub fn cast_vote(&mut self, thread: &ThreadRef, nickname: &str, voice: Voice) -> Result<Thread> {
        let updated = self.write("cast_vote", |tx| {
            let (thread_id, _) = resolve(tx, thread)?;

            tx.execute(
                "INSERT INTO votes (nickname, thread, voice)
                 VALUES (COALESCE((SELECT nickname FROM users WHERE nickname = ?1), ?1), ?2, ?3)
                 ON CONFLICT (nickname, thread) DO UPDATE SET voice = excluded.voice",
                params![nickname, thread_id, voice.value()],
            )
            .map_err(|e| {
                classify(e, |c| match c {
                    Constraint::VoteUser => Some(StoreError::UserNotFound(nickname.to_string())),
                    Constraint::VoteThread => Some(StoreError::ThreadNotFound(thread.to_string())),
                    _ => None,
                })
            })?;

            tx.execute(
                "UPDATE threads
                 SET votes = (SELECT COALESCE(SUM(voice), 0) FROM votes WHERE thread = ?1)
                 WHERE id = ?1",
                params![thread_id],
            )?;

            fetch_thread(tx, &ThreadRef::Id(thread_id))
        })?;

        tracing::debug!(thread = updated.id, votes = updated.votes, "vote recorded");
        Ok(updated)
    }

    /// The current vote of `nickname` on a thread.
    pub fn get_vote(&self, thread: &ThreadRef, nickname: &str) -> Result<Vote> {
        let (thread_id, _) = resolve(self.conn(), thread)?;

        let row: Option<(String, i64)> = self
            .conn()
            .query_row(
                "SELECT nickname, voice FROM votes WHERE nickname = ?1 AND thread = ?2",
                params![nickname, thread_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (nickname, voice) = row.ok_or_else(|| StoreError::VoteNotFound {
            nickname: nickname.to_string(),
            thread: thread_id,
        })?;

        let voice = Voice::try_from(voice).map_err(|e| {
            StoreError::Sqlite(rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Integer,
                Box::new(e),
            ))
        })?;

        Ok(Vote {
            nickname,
            thread: thread_id,
            voice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn setup() -> (tempfile::TempDir, Database, Thread) {
        let (dir, mut db) = testing::temp_db();
        testing::user(&mut db, "alice");
        testing::user(&mut db, "bob");
        testing::forum(&mut db, "cats", "alice");
        let thread = testing::thread(&mut db, "cats", "alice", Some("naps"));
        (dir, db, thread)
    }

    #[test]
    fn votes_sum_per_user() {
        let (_dir, mut db, thread) = setup();
        let by_slug = ThreadRef::Slug("naps".into());

        assert_eq!(db.cast_vote(&by_slug, "alice", Voice::Up).unwrap().votes, 1);
        assert_eq!(db.cast_vote(&thread.reference(), "bob", Voice::Up).unwrap().votes, 2);
        assert_eq!(db.cast_vote(&by_slug, "alice", Voice::Down).unwrap().votes, 0);
        assert_eq!(db.get_thread(&by_slug).unwrap().votes, 0);
    }

    #[test]
    fn repeated_voice_is_idempotent() {
        let (_dir, mut db, thread) = setup();
        for _ in 0..3 {
            let t = db.cast_vote(&thread.reference(), "bob", Voice::Down).unwrap();
            assert_eq!(t.votes, -1);
        }
    }

    #[test]
    fn nickname_case_folds_to_one_vote() {
        let (_dir, mut db, thread) = setup();
        db.cast_vote(&thread.reference(), "Bob", Voice::Up).unwrap();
        let t = db.cast_vote(&thread.reference(), "BOB", Voice::Up).unwrap();
        assert_eq!(t.votes, 1);

        let vote = db.get_vote(&thread.reference(), "bob").unwrap();
        assert_eq!(vote.nickname, "bob");
        assert_eq!(vote.voice, Voice::Up);
    }

    #[test]
    fn unknown_thread_or_user() {
        let (_dir, mut db, thread) = setup();
        let err = db
            .cast_vote(&ThreadRef::Id(999), "alice", Voice::Up)
            .unwrap_err();
        assert!(matches!(err, StoreError::ThreadNotFound(_)));

        let err = db
            .cast_vote(&thread.reference(), "ghost", Voice::Up)
            .unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(ref n) if n == "ghost"));
        assert_eq!(db.get_thread(&thread.reference()).unwrap().votes, 0);
    }

    #[test]
    fn missing_vote_is_not_found() {
        let (_dir, db, thread) = setup();
        let err = db.get_vote(&thread.reference(), "alice").unwrap_err();
        assert!(matches!(err, StoreError::VoteNotFound { thread: id, .. } if id == thread.id));
        assert!(err.is_not_found());
    }
}

//! v002 -- Referential checks and denormalised counters.
//!
//! The `*_fkey` triggers run before an insert and abort with their own name,
//! which `violation.rs` maps to a typed error. SQLite's native foreign key
//! failures carry no constraint name, so they cannot be classified.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TRIGGER IF NOT EXISTS forums_owner_fkey
BEFORE INSERT ON forums
WHEN NOT EXISTS (SELECT 1 FROM users WHERE nickname = NEW.owner)
BEGIN
    SELECT RAISE(ABORT, 'forums_owner_fkey');
END;

CREATE TRIGGER IF NOT EXISTS threads_author_fkey
BEFORE INSERT ON threads
WHEN NOT EXISTS (SELECT 1 FROM users WHERE nickname = NEW.author)
BEGIN
    SELECT RAISE(ABORT, 'threads_author_fkey');
END;

CREATE TRIGGER IF NOT EXISTS threads_forum_fkey
BEFORE INSERT ON threads
WHEN NOT EXISTS (SELECT 1 FROM forums WHERE slug = NEW.forum)
BEGIN
    SELECT RAISE(ABORT, 'threads_forum_fkey');
END;

CREATE TRIGGER IF NOT EXISTS posts_thread_fkey
BEFORE INSERT ON posts
WHEN NOT EXISTS (SELECT 1 FROM threads WHERE id = NEW.thread)
BEGIN
    SELECT RAISE(ABORT, 'posts_thread_fkey');
END;

CREATE TRIGGER IF NOT EXISTS posts_author_fkey
BEFORE INSERT ON posts
WHEN NOT EXISTS (SELECT 1 FROM users WHERE nickname = NEW.author)
BEGIN
    SELECT RAISE(ABORT, 'posts_author_fkey');
END;

-- the parent must live in the same thread
CREATE TRIGGER IF NOT EXISTS posts_parent_fkey
BEFORE INSERT ON posts
WHEN NEW.parent <> 0
 AND NOT EXISTS (SELECT 1 FROM posts WHERE id = NEW.parent AND thread = NEW.thread)
BEGIN
    SELECT RAISE(ABORT, 'posts_parent_fkey');
END;

CREATE TRIGGER IF NOT EXISTS votes_thread_fkey
BEFORE INSERT ON votes
WHEN NOT EXISTS (SELECT 1 FROM threads WHERE id = NEW.thread)
BEGIN
    SELECT RAISE(ABORT, 'votes_thread_fkey');
END;

CREATE TRIGGER IF NOT EXISTS votes_nickname_fkey
BEFORE INSERT ON votes
WHEN NOT EXISTS (SELECT 1 FROM users WHERE nickname = NEW.nickname)
BEGIN
    SELECT RAISE(ABORT, 'votes_nickname_fkey');
END;

CREATE TRIGGER IF NOT EXISTS forums_count_threads
AFTER INSERT ON threads
BEGIN
    UPDATE forums SET threads = threads + 1 WHERE slug = NEW.forum;
END;

CREATE TRIGGER IF NOT EXISTS forums_count_posts
AFTER INSERT ON posts
BEGIN
    UPDATE forums SET posts = posts + 1 WHERE slug = NEW.forum;
END;
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}

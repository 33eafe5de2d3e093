//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `users`, `forums`, `threads`, `posts` and
//! `votes`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    nickname TEXT NOT NULL COLLATE NOCASE PRIMARY KEY,
    fullname TEXT NOT NULL,
    email    TEXT NOT NULL COLLATE NOCASE UNIQUE,
    about    TEXT NOT NULL DEFAULT ''
);

-- ----------------------------------------------------------------
-- Forums
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS forums (
    slug    TEXT NOT NULL COLLATE NOCASE PRIMARY KEY,
    title   TEXT NOT NULL,
    owner   TEXT NOT NULL COLLATE NOCASE,     -- FK -> users(nickname)
    posts   INTEGER NOT NULL DEFAULT 0,       -- maintained by triggers
    threads INTEGER NOT NULL DEFAULT 0,       -- maintained by triggers

    FOREIGN KEY (owner) REFERENCES users(nickname)
);

-- ----------------------------------------------------------------
-- Threads
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS threads (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    slug    TEXT COLLATE NOCASE UNIQUE,       -- optional alternate key
    title   TEXT NOT NULL,
    author  TEXT NOT NULL COLLATE NOCASE,     -- FK -> users(nickname)
    forum   TEXT NOT NULL COLLATE NOCASE,     -- FK -> forums(slug)
    message TEXT NOT NULL,
    votes   INTEGER NOT NULL DEFAULT 0,       -- sum of votes.voice
    created TEXT NOT NULL,                    -- RFC-3339 UTC, millis

    FOREIGN KEY (author) REFERENCES users(nickname),
    FOREIGN KEY (forum) REFERENCES forums(slug)
);

CREATE INDEX IF NOT EXISTS idx_threads_forum_created ON threads(forum, created);
CREATE INDEX IF NOT EXISTS idx_threads_author ON threads(author);

-- ----------------------------------------------------------------
-- Posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    parent    INTEGER NOT NULL DEFAULT 0,     -- 0 = top-level
    author    TEXT NOT NULL COLLATE NOCASE,   -- FK -> users(nickname)
    message   TEXT NOT NULL,
    is_edited INTEGER NOT NULL DEFAULT 0,     -- boolean 0/1
    forum     TEXT NOT NULL COLLATE NOCASE,   -- copied from the thread
    thread    INTEGER NOT NULL,               -- FK -> threads(id)
    created   TEXT NOT NULL,
    path      BLOB NOT NULL DEFAULT x'',      -- 8-byte big-endian ids
    root      INTEGER NOT NULL DEFAULT 0,     -- path[0]

    FOREIGN KEY (author) REFERENCES users(nickname),
    FOREIGN KEY (thread) REFERENCES threads(id)
);

CREATE INDEX IF NOT EXISTS idx_posts_thread_created ON posts(thread, created, id);
CREATE INDEX IF NOT EXISTS idx_posts_thread_path ON posts(thread, path);
CREATE INDEX IF NOT EXISTS idx_posts_thread_parent ON posts(thread, parent, id);
CREATE INDEX IF NOT EXISTS idx_posts_root_path ON posts(root, path);
CREATE INDEX IF NOT EXISTS idx_posts_forum_author ON posts(forum, author);

-- ----------------------------------------------------------------
-- Votes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS votes (
    nickname TEXT NOT NULL COLLATE NOCASE,    -- FK -> users(nickname)
    thread   INTEGER NOT NULL,                -- FK -> threads(id)
    voice    INTEGER NOT NULL CHECK (voice IN (-1, 1)),

    PRIMARY KEY (nickname, thread),
    FOREIGN KEY (nickname) REFERENCES users(nickname),
    FOREIGN KEY (thread) REFERENCES threads(id)
);

CREATE INDEX IF NOT EXISTS idx_votes_thread ON votes(thread);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}

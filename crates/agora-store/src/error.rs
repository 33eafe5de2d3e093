use thiserror::Error;

/// Errors produced by the store layer.
///
/// Variants fall into three families a delivery layer maps to outcomes:
/// missing resources ([`StoreError::is_not_found`]), conflicts
/// ([`StoreError::is_conflict`]) and internal failures
/// ([`StoreError::is_internal`]).
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error that is not one of the classified constraint failures.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Can't find forum with slug: {0}")]
    ForumNotFound(String),

    #[error("Can't find thread: {0}")]
    ThreadNotFound(String),

    #[error("Can't find post with id: {0}")]
    PostNotFound(i64),

    #[error("Can't find user with nickname: {0}")]
    UserNotFound(String),

    /// The nickname given as forum owner does not exist.
    #[error("Can't find forum owner: {0}")]
    OwnerNotFound(String),

    /// The nickname given as thread or post author does not exist.
    #[error("Can't find author: {0}")]
    AuthorNotFound(String),

    /// A post names a parent that is absent from its thread.
    #[error("Parent post {0} does not exist in this thread")]
    ParentNotFound(i64),

    #[error("No vote from {nickname} on thread {thread}")]
    VoteNotFound { nickname: String, thread: i64 },

    #[error("Forum already exists: {0}")]
    ForumAlreadyExists(String),

    #[error("Thread already exists: {0}")]
    ThreadAlreadyExists(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Email is already taken: {0}")]
    EmailTaken(String),

    /// Rolling back a failed write failed too; the data state is unknown and
    /// the request must be aborted.
    #[error("Rollback failed: {0}")]
    Rollback(#[source] rusqlite::Error),

    #[error("Commit failed: {0}")]
    Commit(#[source] rusqlite::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ForumNotFound(_)
                | Self::ThreadNotFound(_)
                | Self::PostNotFound(_)
                | Self::UserNotFound(_)
                | Self::OwnerNotFound(_)
                | Self::AuthorNotFound(_)
                | Self::VoteNotFound { .. }
        )
    }

    /// Requests that clash with stored state, including a reply to a post
    /// outside its thread.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::ParentNotFound(_)
                | Self::ForumAlreadyExists(_)
                | Self::ThreadAlreadyExists(_)
                | Self::UserAlreadyExists(_)
                | Self::EmailTaken(_)
        )
    }

    pub fn is_internal(&self) -> bool {
        !self.is_not_found() && !self.is_conflict()
    }

    /// Fatal failures leave the store in an unknown state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Rollback(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

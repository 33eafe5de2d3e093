//! Domain model structs persisted in the forum database.
//!
//! Every record struct derives `Serialize` and `Deserialize` so a delivery
//! layer can encode it directly.

use agora_shared::constants::ROOT_PARENT;
use agora_shared::{ThreadRef, Voice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path::PostPath;

// ---------------------------------------------------------------------------
// Create outcome
// ---------------------------------------------------------------------------

/// Result of an idempotent create: either the new record, or what already
/// occupies its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome<T, C = T> {
    Created(T),
    Conflict(C),
}

impl<T, C> CreateOutcome<T, C> {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn created(self) -> Option<T> {
        match self {
            Self::Created(value) => Some(value),
            Self::Conflict(_) => None,
        }
    }

    pub fn conflict(self) -> Option<C> {
        match self {
            Self::Created(_) => None,
            Self::Conflict(existing) => Some(existing),
        }
    }
}

impl<T> CreateOutcome<T, T> {
    /// The record either way.
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Conflict(value) => value,
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user. Nicknames compare case-insensitively; the stored
/// spelling is canonical.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub nickname: String,
    pub fullname: String,
    pub email: String,
    pub about: String,
}

/// Fields to change on an existing user; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserUpdate {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub about: Option<String>,
}

// ---------------------------------------------------------------------------
// Forum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Forum {
    pub slug: String,
    pub title: String,
    /// Nickname of the owner.
    pub user: String,
    pub posts: i64,
    pub threads: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewForum {
    pub slug: String,
    pub title: String,
    pub user: String,
}

// ---------------------------------------------------------------------------
// Thread
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thread {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub title: String,
    pub author: String,
    pub forum: String,
    pub message: String,
    /// Sum of every recorded voice.
    pub votes: i64,
    pub created: DateTime<Utc>,
}

impl Thread {
    /// The slug when present, otherwise the id.
    pub fn reference(&self) -> ThreadRef {
        match &self.slug {
            Some(slug) => ThreadRef::Slug(slug.clone()),
            None => ThreadRef::Id(self.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewThread {
    pub title: String,
    pub author: String,
    pub forum: String,
    pub message: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Defaults to the time of the call.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadUpdate {
    pub title: Option<String>,
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    /// Id of the post replied to, `0` for a top-level post.
    pub parent: i64,
    pub author: String,
    pub message: String,
    pub is_edited: bool,
    pub forum: String,
    pub thread: i64,
    pub created: DateTime<Utc>,
    pub path: PostPath,
}

impl Post {
    pub fn is_top_level(&self) -> bool {
        self.parent == ROOT_PARENT
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPost {
    #[serde(default)]
    pub parent: i64,
    pub author: String,
    pub message: String,
}

impl NewPost {
    pub fn top_level(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            parent: ROOT_PARENT,
            author: author.into(),
            message: message.into(),
        }
    }

    pub fn reply(parent: i64, author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            parent,
            author: author.into(),
            message: message.into(),
        }
    }
}

/// A post together with whichever related records were requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostDetails {
    pub post: Post,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forum: Option<Forum>,
}

// ---------------------------------------------------------------------------
// Vote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub nickname: String,
    pub thread: i64,
    pub voice: Voice,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Row counts across the whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Status {
    pub user: i64,
    pub forum: i64,
    pub thread: i64,
    pub post: i64,
}

//! Typed pagination parameters.
//!
//! The delivery layer parses query strings into these structs; the engine
//! never sees raw text. Every struct defaults to ascending order, no cursor
//! and [`DEFAULT_PAGE_LIMIT`] rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::types::SortMode;

/// Requests above [`MAX_PAGE_LIMIT`] get at most that many rows.
fn clamp_limit(limit: u32) -> u32 {
    limit.min(MAX_PAGE_LIMIT)
}

/// Parameters for listing the posts of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostQuery {
    pub sort: SortMode,
    pub limit: u32,
    /// Id of a post; results start strictly after (or before, when
    /// descending) it in the chosen order.
    pub since: Option<i64>,
    pub desc: bool,
}

impl PostQuery {
    pub fn new(sort: SortMode) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn since(mut self, post_id: i64) -> Self {
        self.since = Some(post_id);
        self
    }

    pub fn desc(mut self, desc: bool) -> Self {
        self.desc = desc;
        self
    }

    pub fn effective_limit(&self) -> u32 {
        clamp_limit(self.limit)
    }
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            sort: SortMode::Flat,
            limit: DEFAULT_PAGE_LIMIT,
            since: None,
            desc: false,
        }
    }
}

/// Parameters for listing the threads of a forum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadQuery {
    pub limit: u32,
    /// Inclusive bound on the creation timestamp.
    pub since: Option<DateTime<Utc>>,
    pub desc: bool,
}

impl ThreadQuery {
    pub fn effective_limit(&self) -> u32 {
        clamp_limit(self.limit)
    }
}

impl Default for ThreadQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            since: None,
            desc: false,
        }
    }
}

/// Parameters for listing the users active in a forum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    pub limit: u32,
    /// Exclusive nickname cursor, compared case-insensitively.
    pub since: Option<String>,
    pub desc: bool,
}

impl UserQuery {
    pub fn effective_limit(&self) -> u32 {
        clamp_limit(self.limit)
    }
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            since: None,
            desc: false,
        }
    }
}

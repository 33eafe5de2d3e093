use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// A thread is addressable by its numeric id or by its slug
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThreadRef {
    Id(i64),
    Slug(String),
}

impl ThreadRef {
    /// Interpret a raw path segment: all-digit input is an id, anything else
    /// is a slug.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ParseError::EmptyThreadRef);
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Self::Slug(raw.to_string()));
        }
        // Digit runs beyond i64 can only be slugs.
        match raw.parse::<i64>() {
            Ok(id) => Ok(Self::Id(id)),
            Err(_) => Ok(Self::Slug(raw.to_string())),
        }
    }
}

impl FromStr for ThreadRef {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i64> for ThreadRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ThreadRef {
    fn from(slug: &str) -> Self {
        Self::Slug(slug.to_string())
    }
}

impl fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Traversal order for the posts of one thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Chronological, ties broken by id.
    #[default]
    Flat,
    /// Depth-first over the whole reply tree.
    Tree,
    /// Paginate over top-level posts, each returned with all its descendants.
    ParentTree,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Tree => "tree",
            Self::ParentTree => "parent_tree",
        }
    }
}

impl FromStr for SortMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "flat" => Ok(Self::Flat),
            "tree" => Ok(Self::Tree),
            "parent_tree" => Ok(Self::ParentTree),
            other => Err(ParseError::SortMode(other.to_string())),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's vote on a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Voice {
    Up,
    Down,
}

impl Voice {
    pub fn value(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl TryFrom<i64> for Voice {
    type Error = ParseError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(ParseError::Voice(other)),
        }
    }
}

impl From<Voice> for i64 {
    fn from(v: Voice) -> Self {
        v.value()
    }
}

/// Records that can be attached to a post details response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Related {
    User,
    Forum,
    Thread,
}

impl Related {
    /// Parse a comma-separated list such as `user,thread`. Empty items are
    /// skipped.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ParseError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for Related {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "forum" => Ok(Self::Forum),
            "thread" => Ok(Self::Thread),
            other => Err(ParseError::Related(other.to_string())),
        }
    }
}

//! Materialized reply paths.
//!
//! A [`PostPath`] lists the ids from a post's top-level ancestor down to the
//! post itself. On disk each id is an 8-byte big-endian segment, so SQLite's
//! BLOB comparison (memcmp, then shorter first) orders paths exactly like
//! the derived `Ord` on the segment list. Range filters and `ORDER BY path`
//! therefore run in SQL without walking the tree.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SEGMENT_LEN: usize = 8;

#[derive(Error, Debug)]
#[error("Path blob of {0} bytes is not a whole number of segments")]
pub struct PathDecodeError(usize);

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostPath(Vec<i64>);

impl PostPath {
    /// Path of a top-level post.
    pub fn root(id: i64) -> Self {
        Self(vec![id])
    }

    /// Path of a reply to the post at `self`.
    pub fn child(&self, id: i64) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(id);
        Self(segments)
    }

    pub fn segments(&self) -> &[i64] {
        &self.0
    }

    /// Id of the top-level ancestor.
    pub fn root_id(&self) -> Option<i64> {
        self.0.first().copied()
    }

    /// Id of the post this path belongs to.
    pub fn leaf_id(&self) -> Option<i64> {
        self.0.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_ancestor_of(&self, other: &PostPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len() * SEGMENT_LEN);
        for id in &self.0 {
            out.extend_from_slice(&id.to_be_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PathDecodeError> {
        if bytes.len() % SEGMENT_LEN != 0 {
            return Err(PathDecodeError(bytes.len()));
        }
        let segments = bytes
            .chunks_exact(SEGMENT_LEN)
            .map(|chunk| {
                let mut buf = [0u8; SEGMENT_LEN];
                buf.copy_from_slice(chunk);
                i64::from_be_bytes(buf)
            })
            .collect();
        Ok(Self(segments))
    }
}

impl From<Vec<i64>> for PostPath {
    fn from(segments: Vec<i64>) -> Self {
        Self(segments)
    }
}

impl ToSql for PostPath {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_bytes()))
    }
}

impl FromSql for PostPath {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let bytes = value.as_blob()?;
        PostPath::from_bytes(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

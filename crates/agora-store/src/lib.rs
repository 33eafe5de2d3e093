//! # agora-store
//!
//! Storage engine for the agora discussion forum, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed operations for every component:
//! users, the forum registry, the thread store, the post hierarchy and the
//! vote ledger. Every mutating operation is one immediate transaction;
//! concurrency control is left to SQLite's locking.

pub mod config;
pub mod database;
pub mod forums;
pub mod migrations;
pub mod models;
pub mod path;
pub mod posts;
pub mod status;
pub mod threads;
pub mod users;
pub mod votes;

mod error;
mod timestamp;
mod violation;

pub use config::StoreConfig;
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use path::PostPath;

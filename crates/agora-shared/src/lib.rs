//! # agora-shared
//!
//! Vocabulary shared between the forum engine and whatever delivery layer
//! sits in front of it: thread references, sort modes, vote values and the
//! typed query parameters the engine accepts.

pub mod constants;
pub mod error;
pub mod query;
pub mod types;

pub use error::ParseError;
pub use query::{PostQuery, ThreadQuery, UserQuery};
pub use types::{Related, SortMode, ThreadRef, Voice};

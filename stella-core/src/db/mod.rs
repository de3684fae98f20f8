//! Database layer for stella
//!
//! Local SQLite store with:
//! - Schema migrations
//! - Scoped key-value entries (cached assessment responses)
//! - The offline guidance question queue
//! - Submissions recorded without a remote endpoint

pub mod repo;
pub mod schema;

pub use repo::{Database, PendingQuestion, StoredSubmission};

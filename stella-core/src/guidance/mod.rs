//! STELLA coaching: the local guidance engine, the remote backend client and
//! the [`Coach`] that chooses between them.

pub mod activity;
pub mod client;
pub mod coach;
mod content;
pub mod engine;

pub use activity::Activity;
pub use client::{GuidanceBackend, GuidanceClient, GuidanceContext};
pub use coach::{Answer, Coach, ReplayReport};
pub use engine::{answer_for, guidance_for, GuidanceEngine, HistoryEntry};

//! # stella-core
//!
//! Core library for stella - an astronaut-readiness trainer.
//!
//! This library provides:
//! - Readiness assessments: definitions, navigation, submission
//! - Training sessions with a lifecycle controller and an async runner
//! - Live training metrics with clamping and guidance triggers
//! - STELLA, the coaching engine, with an optional remote backend
//! - A local SQLite store, configuration and logging
//!
//! ## Ownership
//!
//! Each piece of mutable state has exactly one owner:
//! - [`assessment::AssessmentNavigator`] owns the response record
//! - [`session::SessionController`] owns the session state
//! - [`metrics::MetricsBroadcaster`] owns the metrics record
//!
//! Everything else reads through accessors or event payloads.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stella_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod assessment;
pub mod config;
pub mod db;
pub mod error;
pub mod guidance;
pub mod logging;
pub mod metrics;
pub mod retry;
pub mod session;
pub mod training;
pub mod types;

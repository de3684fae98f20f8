//! Training sessions: the lifecycle controller, credit rewards and the async
//! runner that drives the clock and the metrics feed.

pub mod controller;
pub mod rewards;
pub mod runner;
pub mod state;

pub use controller::SessionController;
pub use rewards::{CreditLedger, NoRewards, RewardSink};
pub use runner::{SessionEvent, SessionHandle, SessionRunner, SessionSnapshot};
pub use state::{ExerciseCompletion, ExerciseDetails, SessionState, SessionSummary};

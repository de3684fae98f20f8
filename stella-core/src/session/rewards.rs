//! Credit rewards for completed exercises.

use std::sync::atomic::{AtomicU64, Ordering};

use super::state::ExerciseCompletion;

/// Fire-and-forget receiver of exercise completions
pub trait RewardSink: Send + Sync {
    fn award(&self, completion: &ExerciseCompletion);
}

/// Discards every award
pub struct NoRewards;

impl RewardSink for NoRewards {
    fn award(&self, _completion: &ExerciseCompletion) {}
}

/// In-process credit balance
#[derive(Debug)]
pub struct CreditLedger {
    per_exercise: u64,
    balance: AtomicU64,
}

impl CreditLedger {
    pub fn new(per_exercise: u64) -> Self {
        Self {
            per_exercise,
            balance: AtomicU64::new(0),
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance.load(Ordering::Relaxed)
    }
}

impl RewardSink for CreditLedger {
    fn award(&self, completion: &ExerciseCompletion) {
        let balance = self.balance.fetch_add(self.per_exercise, Ordering::Relaxed) + self.per_exercise;
        tracing::info!(
            exercise = %completion.exercise,
            credits = self.per_exercise,
            balance,
            "Credits awarded"
        );
    }
}

//! Training-session lifecycle.
//!
//! The controller is the only owner of [`SessionState`]. Every transition
//! takes the current time explicitly and returns whether it happened; calls
//! from the wrong state are no-ops.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::metrics::MetricsRecord;
use crate::training::TrainingModule;
use crate::types::Exercise;

use super::rewards::RewardSink;
use super::state::{ExerciseCompletion, ExerciseDetails, SessionState, SessionSummary};

pub struct SessionController {
    id: String,
    module: TrainingModule,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    /// Final duration, frozen by `end`
    duration_secs: Option<u64>,
    completed: Vec<ExerciseCompletion>,
    progress: f64,
    rewards: Arc<dyn RewardSink>,
}

impl SessionController {
    pub fn new(module: TrainingModule, rewards: Arc<dyn RewardSink>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            module,
            state: SessionState::Idle,
            started_at: None,
            duration_secs: None,
            completed: Vec::new(),
            progress: 0.0,
            rewards,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn module(&self) -> &TrainingModule {
        &self.module
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed(&self) -> &[ExerciseCompletion] {
        &self.completed
    }

    /// Percent of the module completed, 0-100
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Wall-clock seconds since `start`, paused time included.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        if let Some(final_secs) = self.duration_secs {
            return final_secs;
        }
        match self.started_at {
            Some(start) => (now - start).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != SessionState::Idle {
            tracing::debug!(session_id = %self.id, state = %self.state, "Ignoring start");
            return false;
        }
        self.started_at = Some(now);
        self.state = SessionState::Active;
        tracing::info!(session_id = %self.id, module = %self.module.id, "Session started");
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != SessionState::Active {
            tracing::debug!(session_id = %self.id, state = %self.state, "Ignoring pause");
            return false;
        }
        self.state = SessionState::Paused;
        tracing::info!(session_id = %self.id, "Session paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != SessionState::Paused {
            tracing::debug!(session_id = %self.id, state = %self.state, "Ignoring resume");
            return false;
        }
        self.state = SessionState::Active;
        tracing::info!(session_id = %self.id, "Session resumed");
        true
    }

    /// Append a completion record and award credits. Only while active.
    ///
    /// Completing the same exercise twice appends twice.
    pub fn complete_exercise(
        &mut self,
        exercise: Exercise,
        details: ExerciseDetails,
        metrics: &MetricsRecord,
        now: DateTime<Utc>,
    ) -> Option<&ExerciseCompletion> {
        if self.state != SessionState::Active {
            tracing::debug!(
                session_id = %self.id,
                state = %self.state,
                exercise = %exercise,
                "Ignoring exercise completion"
            );
            return None;
        }

        if !self.module.includes(exercise) {
            tracing::warn!(
                session_id = %self.id,
                module = %self.module.id,
                exercise = %exercise,
                "Exercise is not part of this module"
            );
        }

        let completion = ExerciseCompletion {
            exercise,
            timestamp: now,
            metrics: metrics.clone(),
            details,
        };
        self.rewards.award(&completion);

        let step = 100.0 / self.module.total_exercises().max(1) as f64;
        self.progress = (self.progress + step).min(100.0);
        self.completed.push(completion);

        tracing::info!(
            session_id = %self.id,
            exercise = %exercise,
            progress = self.progress,
            "Exercise completed"
        );
        self.completed.last()
    }

    /// Finish the session. Only from `Active` or `Paused`; irreversible.
    pub fn end(&mut self, now: DateTime<Utc>, metrics: &MetricsRecord) -> Option<SessionSummary> {
        if !matches!(self.state, SessionState::Active | SessionState::Paused) {
            tracing::debug!(session_id = %self.id, state = %self.state, "Ignoring end");
            return None;
        }

        let duration_secs = self.elapsed_secs(now);
        self.duration_secs = Some(duration_secs);
        self.state = SessionState::Ended;

        tracing::info!(
            session_id = %self.id,
            duration_secs,
            completed = self.completed.len(),
            "Session ended"
        );

        Some(SessionSummary {
            session_id: self.id.clone(),
            module_id: self.module.id.clone(),
            duration_secs,
            completed: self.completed.clone(),
            metrics: metrics.clone(),
            progress: self.progress,
        })
    }
}

//! The coach puts the local engine and the remote backend behind one API.
//!
//! In mock mode everything is answered by [`GuidanceEngine`]. In remote mode
//! guidance comes from the backend, falling back to the local engine when
//! the backend stays unreachable, and questions asked while offline are
//! queued in the store for [`Coach::replay_pending`].

use std::sync::Arc;

use serde::Serialize;

use crate::config::{GuidanceConfig, GuidanceMode};
use crate::db::Database;
use crate::error::Result;
use crate::metrics::MetricsRecord;
use crate::types::GuidanceRecord;

use super::activity::Activity;
use super::client::{GuidanceBackend, GuidanceClient, GuidanceContext};
use super::engine::GuidanceEngine;

/// Result of asking a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Answer {
    Answered { answer: String },
    /// Backend unreachable; stored for replay under this queue id
    Queued { id: i64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// `(question, answer)` in replay order
    pub answered: Vec<(String, String)>,
    pub remaining: usize,
}

struct Remote<B> {
    backend: B,
    db: Arc<Database>,
}

pub struct Coach<B = GuidanceClient> {
    engine: GuidanceEngine,
    remote: Option<Remote<B>>,
}

impl Coach<GuidanceClient> {
    /// Build a coach for the configured mode
    pub fn from_config(config: &GuidanceConfig, db: Arc<Database>) -> Result<Self> {
        let engine = GuidanceEngine::new(config.history_limit);
        match config.mode {
            GuidanceMode::Mock => Ok(Self::local(engine)),
            GuidanceMode::Remote => {
                let client = GuidanceClient::new(config)?;
                tracing::info!(server = %client.base_url(), "Using remote guidance backend");
                Ok(Self::remote(engine, client, db))
            }
        }
    }
}

impl<B: GuidanceBackend> Coach<B> {
    pub fn local(engine: GuidanceEngine) -> Self {
        Self {
            engine,
            remote: None,
        }
    }

    pub fn remote(engine: GuidanceEngine, backend: B, db: Arc<Database>) -> Self {
        Self {
            engine,
            remote: Some(Remote { backend, db }),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn engine(&self) -> &GuidanceEngine {
        &self.engine
    }

    /// Guidance for `activity`. Never fails: remote errors fall back to the
    /// local engine.
    pub async fn guidance(
        &mut self,
        activity: &Activity,
        metrics: &MetricsRecord,
        context: &GuidanceContext,
    ) -> GuidanceRecord {
        let Some(remote) = &self.remote else {
            return self.engine.get_guidance(activity, metrics);
        };

        match remote.backend.guidance(activity, metrics, context).await {
            Ok(record) => {
                self.engine.record(activity.clone(), record.clone());
                record
            }
            Err(e) => {
                tracing::warn!(activity = %activity, "Remote guidance failed, using local engine: {}", e);
                self.engine.get_guidance(activity, metrics)
            }
        }
    }

    /// Ask STELLA a question.
    ///
    /// In remote mode a network failure queues the question and returns
    /// [`Answer::Queued`]; other backend errors are returned.
    pub async fn ask(&mut self, question: &str, context: &serde_json::Value) -> Result<Answer> {
        let Some(remote) = &self.remote else {
            let answer = self.engine.ask_question(question);
            return Ok(Answer::Answered { answer });
        };

        match remote.backend.ask(question, context).await {
            Ok(answer) => {
                self.engine.record_answer(question, &answer);
                Ok(Answer::Answered { answer })
            }
            Err(e) if e.is_transient() => {
                let id = remote.db.enqueue_question(question, context)?;
                tracing::info!(queue_id = id, "Guidance backend unreachable, question queued: {}", e);
                Ok(Answer::Queued { id })
            }
            Err(e) => Err(e),
        }
    }

    /// Number of questions waiting for the backend
    pub fn pending_count(&self) -> Result<usize> {
        match &self.remote {
            Some(remote) => remote.db.pending_question_count(),
            None => Ok(0),
        }
    }

    /// Send queued questions to the backend, oldest first.
    ///
    /// Each question is removed from the queue only after it was answered;
    /// replay stops at the first failure. Does nothing in mock mode or when
    /// the backend is down.
    pub async fn replay_pending(&mut self) -> Result<ReplayReport> {
        let Some(remote) = &self.remote else {
            return Ok(ReplayReport::default());
        };

        let pending = remote.db.pending_questions()?;
        if pending.is_empty() {
            return Ok(ReplayReport::default());
        }
        if !remote.backend.health().await {
            tracing::info!(pending = pending.len(), "Guidance backend still unreachable, skipping replay");
            return Ok(ReplayReport {
                answered: Vec::new(),
                remaining: pending.len(),
            });
        }

        let mut report = ReplayReport::default();
        for item in &pending {
            match remote.backend.ask(&item.question, &item.context).await {
                Ok(answer) => {
                    remote.db.remove_pending_question(item.id)?;
                    self.engine.record_answer(&item.question, &answer);
                    report.answered.push((item.question.clone(), answer));
                }
                Err(e) => {
                    tracing::warn!(queue_id = item.id, "Replay stopped: {}", e);
                    break;
                }
            }
        }
        report.remaining = pending.len() - report.answered.len();

        tracing::info!(
            answered = report.answered.len(),
            remaining = report.remaining,
            "Replayed queued questions"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::metrics::MetricKind;
    use crate::types::Priority;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that pops scripted answers; an empty script means offline
    #[derive(Default)]
    struct ScriptedBackend {
        up: bool,
        answers: Mutex<VecDeque<Result<String>>>,
        asked: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn offline() -> Self {
            Self::default()
        }

        fn online(answers: Vec<Result<String>>) -> Self {
            Self {
                up: true,
                answers: Mutex::new(answers.into()),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    fn offline_error() -> Error {
        Error::Guidance("request failed: connection refused".to_string())
    }

    impl GuidanceBackend for ScriptedBackend {
        async fn guidance(
            &self,
            _activity: &Activity,
            _metrics: &MetricsRecord,
            _context: &GuidanceContext,
        ) -> Result<GuidanceRecord> {
            if self.up {
                Ok(GuidanceRecord::new("remote says hi", Priority::Low))
            } else {
                Err(offline_error())
            }
        }

        async fn ask(&self, question: &str, _context: &serde_json::Value) -> Result<String> {
            self.asked.lock().unwrap().push(question.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(offline_error()))
        }

        async fn health(&self) -> bool {
            self.up
        }
    }

    fn db() -> Arc<Database> {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        Arc::new(db)
    }

    #[tokio::test]
    async fn test_mock_mode_answers_locally() {
        let mut coach: Coach<ScriptedBackend> = Coach::local(GuidanceEngine::default());
        let answer = coach.ask("how is my heart rate?", &serde_json::Value::Null).await.unwrap();
        assert!(matches!(answer, Answer::Answered { ref answer } if answer.contains("bpm")));
        assert_eq!(coach.engine().history_len(), 1);
        assert_eq!(coach.pending_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remote_guidance_falls_back_to_local() {
        let mut coach = Coach::remote(GuidanceEngine::default(), ScriptedBackend::offline(), db());
        let metrics = MetricsRecord::baseline().with(MetricKind::HeartRate, 170.0);
        let record = coach
            .guidance(&Activity::Balance, &metrics, &GuidanceContext::default())
            .await;
        assert_eq!(record.priority, Priority::High);
        assert_eq!(coach.engine().history_len(), 1);
    }

    #[tokio::test]
    async fn test_remote_guidance_is_recorded() {
        let mut coach = Coach::remote(GuidanceEngine::default(), ScriptedBackend::online(vec![]), db());
        let record = coach
            .guidance(&Activity::Balance, &MetricsRecord::baseline(), &GuidanceContext::default())
            .await;
        assert_eq!(record.message, "remote says hi");
        assert_eq!(coach.engine().history_len(), 1);
    }

    #[tokio::test]
    async fn test_offline_question_is_queued() {
        let store = db();
        let mut coach = Coach::remote(GuidanceEngine::default(), ScriptedBackend::offline(), store.clone());
        let answer = coach
            .ask("what should I eat?", &serde_json::json!({"module": "core-conditioning"}))
            .await
            .unwrap();
        assert!(matches!(answer, Answer::Queued { .. }));
        assert_eq!(store.pending_question_count().unwrap(), 1);

        // Backend still down: nothing replayed, queue intact
        let report = coach.replay_pending().await.unwrap();
        assert!(report.answered.is_empty());
        assert_eq!(report.remaining, 1);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_returned() {
        let backend = ScriptedBackend::online(vec![Err(Error::Guidance(
            "API error (400 Bad Request): nope".to_string(),
        ))]);
        let store = db();
        let mut coach = Coach::remote(GuidanceEngine::default(), backend, store.clone());
        assert!(coach.ask("hello", &serde_json::Value::Null).await.is_err());
        assert_eq!(store.pending_question_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replay_is_fifo_and_stops_at_first_failure() {
        let store = db();
        store.enqueue_question("first", &serde_json::Value::Null).unwrap();
        store.enqueue_question("second", &serde_json::Value::Null).unwrap();
        store.enqueue_question("third", &serde_json::Value::Null).unwrap();

        let backend = ScriptedBackend::online(vec![Ok("one".to_string()), Err(offline_error())]);
        let mut coach = Coach::remote(GuidanceEngine::default(), backend, store.clone());

        let report = coach.replay_pending().await.unwrap();
        assert_eq!(report.answered, vec![("first".to_string(), "one".to_string())]);
        assert_eq!(report.remaining, 2);

        let left: Vec<String> = store
            .pending_questions()
            .unwrap()
            .into_iter()
            .map(|q| q.question)
            .collect();
        assert_eq!(left, vec!["second", "third"]);

        let remote = coach.remote.as_ref().unwrap();
        assert_eq!(*remote.backend.asked.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_replay_drains_questions_with_scalar_context() {
        let store = db();
        store.enqueue_question("first", &serde_json::json!(42)).unwrap();
        store.enqueue_question("second", &serde_json::json!("1")).unwrap();

        let backend = ScriptedBackend::online(vec![Ok("one".to_string()), Ok("two".to_string())]);
        let mut coach = Coach::remote(GuidanceEngine::default(), backend, store.clone());

        let report = coach.replay_pending().await.unwrap();
        assert_eq!(
            report.answered,
            vec![
                ("first".to_string(), "one".to_string()),
                ("second".to_string(), "two".to_string()),
            ]
        );
        assert_eq!(report.remaining, 0);
        assert_eq!(store.pending_question_count().unwrap(), 0);
    }
}

//! Integration tests for the stella-core public API
//!
//! These exercise the built-in assessment bank and training catalog against
//! an in-memory store, the way the CLI wires them together.

use std::sync::Arc;
use std::time::Duration;

use stella_core::assessment::{
    AnswerValue, AssessmentNavigator, AssessmentSubmission, LocalSubmissionEndpoint, QuestionBank,
    QuestionKind, ResponseRecord, SubmissionEndpoint, SubmissionReceipt, View,
};
use stella_core::guidance::{Activity, Answer, Coach, GuidanceEngine};
use stella_core::metrics::{MetricKind, MetricsRecord, MockMetricsGenerator};
use stella_core::session::{
    CreditLedger, ExerciseDetails, SessionController, SessionEvent, SessionRunner, SessionState,
};
use stella_core::training::TrainingCatalog;
use stella_core::types::{AssessmentType, Exercise, Priority};
use stella_core::{Config, Database, Error, Result};

/// A valid answer for any question kind
fn valid_answer(kind: &QuestionKind) -> AnswerValue {
    match kind {
        QuestionKind::Scale { min, .. } => AnswerValue::Integer(*min),
        QuestionKind::Numeric { .. } => AnswerValue::Integer(4),
        QuestionKind::Duration { .. } => AnswerValue::Text("2 minutes".to_string()),
        QuestionKind::Options { options } => AnswerValue::Text(options[0].clone()),
        QuestionKind::Multiselect { options } => AnswerValue::List(vec![options[0].clone()]),
    }
}

fn answer_everything(nav: &mut AssessmentNavigator) {
    while let Some(question) = nav.current_question() {
        let answer = valid_answer(&question.kind);
        nav.answer_current(answer).expect("answer should be valid");
        assert!(nav.next());
    }
}

fn store() -> Arc<Database> {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    Arc::new(db)
}

// ============================================
// Assessments
// ============================================

#[test]
fn test_builtin_bank_has_every_assessment_type() {
    let bank = QuestionBank::builtin().unwrap();
    for t in AssessmentType::ALL {
        let def = bank.get(t).expect("builtin definition");
        assert!(def.total_questions() > 0);
        def.validate().unwrap();
    }
}

#[test]
fn test_navigation_round_trip_law() {
    let bank = QuestionBank::builtin().unwrap();
    for t in AssessmentType::ALL {
        let def = bank.get(t).cloned().unwrap();
        let total = def.total_questions();
        let mut nav = AssessmentNavigator::new(def).unwrap();

        let mut last = nav.progress_fraction();
        for _ in 0..total {
            assert!(nav.next());
            assert!(nav.progress_fraction() >= last);
            last = nav.progress_fraction();
        }
        assert!(nav.is_terminal());
        assert_eq!(nav.progress_fraction(), 1.0);
        assert!(!nav.next());

        for _ in 0..total {
            assert!(nav.previous());
            assert!(nav.progress_fraction() <= last);
            last = nav.progress_fraction();
        }
        assert_eq!(nav.cursor(), Default::default());
        assert_eq!(nav.progress_fraction(), 0.0);
    }
}

#[test]
fn test_answers_survive_navigation() {
    let bank = QuestionBank::builtin().unwrap();
    let mut nav =
        AssessmentNavigator::new(bank.get(AssessmentType::Initial).cloned().unwrap()).unwrap();

    nav.answer_current(AnswerValue::Integer(8)).unwrap();
    nav.next();
    nav.previous();

    match nav.view() {
        View::Question { prefill, .. } => assert_eq!(prefill, Some(&AnswerValue::Integer(8))),
        other => panic!("expected a question view, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_assessment_submitted_locally() {
    let db = store();
    let endpoint = LocalSubmissionEndpoint::new(db.clone());
    let bank = QuestionBank::builtin().unwrap();
    let mut nav =
        AssessmentNavigator::new(bank.get(AssessmentType::Initial).cloned().unwrap()).unwrap();

    assert!(matches!(nav.submit(&endpoint).await, Err(Error::NotComplete)));

    answer_everything(&mut nav);
    let receipt = nav.submit(&endpoint).await.unwrap().clone();
    assert!(!receipt.assessment_id.is_empty());
    assert!(matches!(nav.view(), View::Submitted(_)));

    // Submitting again returns the stored receipt without a second record
    let again = nav.submit(&endpoint).await.unwrap();
    assert_eq!(again.assessment_id, receipt.assessment_id);
    assert_eq!(db.list_submissions().unwrap().len(), 1);
}

/// Endpoint that fails the first `failures` calls, recording every payload
struct Unreliable {
    failures: std::sync::atomic::AtomicUsize,
    seen: std::sync::Mutex<Vec<String>>,
}

impl SubmissionEndpoint for Unreliable {
    async fn submit(&self, submission: &AssessmentSubmission) -> Result<SubmissionReceipt> {
        self.seen
            .lock()
            .unwrap()
            .push(submission.idempotency_key()?);
        let left = self.failures.load(std::sync::atomic::Ordering::SeqCst);
        if left > 0 {
            self.failures
                .store(left - 1, std::sync::atomic::Ordering::SeqCst);
            return Err(Error::Submission("request failed: connection reset".into()));
        }
        Ok(SubmissionReceipt {
            assessment_id: "remote-1".into(),
            summary: "ok".into(),
            scores: None,
        })
    }
}

#[tokio::test]
async fn test_manual_retry_resends_same_payload() {
    let bank = QuestionBank::builtin().unwrap();
    let mut nav =
        AssessmentNavigator::new(bank.get(AssessmentType::Mission).cloned().unwrap()).unwrap();
    answer_everything(&mut nav);

    let endpoint = Unreliable {
        failures: 1.into(),
        seen: Default::default(),
    };
    assert!(nav.submit(&endpoint).await.is_err());
    assert!(nav.last_error().is_some());
    assert!(nav.is_terminal());

    assert_eq!(nav.submit(&endpoint).await.unwrap().assessment_id, "remote-1");

    let keys = endpoint.seen.lock().unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);
}

#[test]
fn test_cached_responses_restore_through_store() {
    let db = store();
    let bank = QuestionBank::builtin().unwrap();
    let def = bank.get(AssessmentType::Initial).cloned().unwrap();

    let mut nav = AssessmentNavigator::new(def.clone()).unwrap();
    nav.answer_current(AnswerValue::Integer(6)).unwrap();
    db.put_json("responses", AssessmentType::Initial.as_str(), nav.responses())
        .unwrap();

    let cached: ResponseRecord = db
        .get_json("responses", AssessmentType::Initial.as_str())
        .unwrap()
        .unwrap();
    let mut resumed = AssessmentNavigator::new(def).unwrap();
    assert_eq!(resumed.restore(&cached), 1);
    assert_eq!(
        resumed.responses().get("cardio-fitness"),
        Some(&AnswerValue::Integer(6))
    );
}

// ============================================
// Sessions
// ============================================

#[test]
fn test_session_credits_flow_to_ledger() {
    let catalog = TrainingCatalog::builtin().unwrap();
    let module = catalog.require("core-conditioning").unwrap().clone();
    let ledger = Arc::new(CreditLedger::new(Config::default().session.credits_per_exercise));
    let mut session = SessionController::new(module, ledger.clone());

    let now = chrono::Utc::now();
    session.start(now);
    for exercise in [Exercise::Plank, Exercise::Squat] {
        session.complete_exercise(exercise, ExerciseDetails::default(), &MetricsRecord::baseline(), now);
    }
    let summary = session.end(now, &MetricsRecord::baseline()).unwrap();

    assert_eq!(summary.completed.len(), 2);
    assert_eq!(summary.progress, 50.0);
    assert_eq!(ledger.balance(), 20);
    assert_eq!(session.state(), SessionState::Ended);
}

#[tokio::test(start_paused = true)]
async fn test_runner_metrics_stay_in_bounds() {
    let module = TrainingCatalog::builtin()
        .unwrap()
        .require("cardio-endurance")
        .unwrap()
        .clone();
    let controller = SessionController::new(module, Arc::new(CreditLedger::new(10)));
    let runner = SessionRunner::new(
        controller,
        MockMetricsGenerator::seeded(42),
        &Config::default().session,
    );
    let (handle, mut events) = runner.spawn();

    tokio::time::sleep(Duration::from_millis(601_500)).await;
    let summary = handle.end().await.unwrap();
    assert_eq!(summary.duration_secs, 601);

    let mut updates = 0;
    while let Some(event) = events.recv().await {
        if let SessionEvent::Metrics { metrics } = event {
            updates += 1;
            for (kind, value) in metrics.iter() {
                let (min, max) = kind.bounds();
                assert!((min..=max).contains(&value), "{kind} = {value}");
            }
        }
    }
    assert_eq!(updates, 200);
}

// ============================================
// Guidance
// ============================================

#[test]
fn test_high_heart_rate_overrides_any_activity() {
    let mut engine = GuidanceEngine::default();
    let metrics = MetricsRecord::baseline().with(MetricKind::HeartRate, 170.0);
    for tag in ["balance", "exercise:plank", "session-end", "made-up"] {
        let record = engine.get_guidance(&Activity::parse(tag), &metrics);
        assert_eq!(record.priority, Priority::High, "{tag}");
    }
}

#[tokio::test]
async fn test_mock_coach_from_default_config() {
    let config = Config::default();
    let mut coach = Coach::from_config(&config.guidance, store()).unwrap();
    assert!(!coach.is_remote());

    let answer = coach
        .ask("How should I manage my oxygen?", &serde_json::Value::Null)
        .await
        .unwrap();
    assert!(matches!(answer, Answer::Answered { .. }));
    assert_eq!(coach.replay_pending().await.unwrap().remaining, 0);
}

//! Async driver for one training session.
//!
//! A [`SessionRunner`] is moved into a single tokio task that owns the
//! controller, the metrics broadcaster and the mock metrics feed. Two
//! intervals drive it: the elapsed-time clock and the metrics feed. Both keep
//! firing while the session is paused and skip their work instead. Callers
//! talk to the task through a [`SessionHandle`] and observe it through
//! [`SessionEvent`]s.
//!
//! Ending the session (or dropping the handle) exits the task, which drops
//! both intervals.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::SessionConfig;
use crate::guidance::Activity;
use crate::metrics::{MetricKind, MetricsBroadcaster, MetricsRecord, MockMetricsGenerator};
use crate::types::Exercise;

use super::controller::SessionController;
use super::state::{ExerciseCompletion, ExerciseDetails, SessionState, SessionSummary};

const COMMAND_BUFFER: usize = 32;

/// Everything observable about a running session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        session_id: String,
        module_id: String,
    },
    Tick {
        elapsed_secs: u64,
    },
    Metrics {
        metrics: MetricsRecord,
    },
    /// A threshold was crossed; the receiver decides how to fetch guidance
    GuidanceDue {
        activity: Activity,
        metrics: MetricsRecord,
    },
    ExerciseCompleted {
        completion: ExerciseCompletion,
        progress: f64,
    },
    Ended {
        summary: SessionSummary,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub elapsed_secs: u64,
    pub progress: f64,
    pub metrics: MetricsRecord,
}

enum Command {
    Pause(oneshot::Sender<bool>),
    Resume(oneshot::Sender<bool>),
    CompleteExercise {
        exercise: Exercise,
        details: ExerciseDetails,
        reply: oneshot::Sender<bool>,
    },
    Snapshot(oneshot::Sender<SessionSnapshot>),
    End(oneshot::Sender<Option<SessionSummary>>),
}

pub struct SessionRunner {
    controller: SessionController,
    broadcaster: MetricsBroadcaster,
    generator: MockMetricsGenerator,
    tick: Duration,
    metrics_interval: Duration,
}

impl SessionRunner {
    pub fn new(
        controller: SessionController,
        generator: MockMetricsGenerator,
        config: &SessionConfig,
    ) -> Self {
        Self {
            controller,
            broadcaster: MetricsBroadcaster::new(MetricsRecord::baseline()),
            generator,
            tick: config.tick(),
            metrics_interval: config.metrics_interval(),
        }
    }

    /// Register metrics listeners before the session starts
    pub fn broadcaster_mut(&mut self) -> &mut MetricsBroadcaster {
        &mut self.broadcaster
    }

    /// Start the session on a new task.
    pub fn spawn(self) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let clock = SessionClock::start();
        let task = tokio::spawn(self.run(clock, command_rx, event_tx));
        (
            SessionHandle {
                commands: command_tx,
                task,
            },
            event_rx,
        )
    }

    async fn run(
        mut self,
        clock: SessionClock,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Option<SessionSummary> {
        let emit = |event: SessionEvent| {
            // Nobody listening is fine
            let _ = events.send(event);
        };

        self.controller.start(clock.now());
        emit(SessionEvent::Started {
            session_id: self.controller.id().to_string(),
            module_id: self.controller.module().id.clone(),
        });
        emit(SessionEvent::GuidanceDue {
            activity: Activity::SessionStart,
            metrics: self.broadcaster.current().clone(),
        });

        let mut ticker = interval_at(clock.started + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut feed = interval_at(clock.started + self.metrics_interval, self.metrics_interval);
        feed.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.controller.state() == SessionState::Active {
                        emit(SessionEvent::Tick {
                            elapsed_secs: self.controller.elapsed_secs(clock.now()),
                        });
                    }
                }
                _ = feed.tick() => {
                    if self.controller.state() == SessionState::Active {
                        self.on_metrics_tick(&emit);
                    }
                }
                command = commands.recv() => match command {
                    Some(Command::Pause(reply)) => {
                        let _ = reply.send(self.controller.pause());
                    }
                    Some(Command::Resume(reply)) => {
                        let _ = reply.send(self.controller.resume());
                    }
                    Some(Command::CompleteExercise { exercise, details, reply }) => {
                        let accepted = self.on_exercise_completed(exercise, details, clock.now(), &emit);
                        let _ = reply.send(accepted);
                    }
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(SessionSnapshot {
                            state: self.controller.state(),
                            elapsed_secs: self.controller.elapsed_secs(clock.now()),
                            progress: self.controller.progress(),
                            metrics: self.broadcaster.current().clone(),
                        });
                    }
                    Some(Command::End(reply)) => {
                        let summary = self.finish(clock.now(), &emit);
                        let _ = reply.send(summary.clone());
                        return summary;
                    }
                    None => {
                        tracing::info!(session_id = %self.controller.id(), "Session handle dropped, ending session");
                        return self.finish(clock.now(), &emit);
                    }
                }
            }
        }
    }

    fn on_metrics_tick(&mut self, emit: &impl Fn(SessionEvent)) {
        let partial = self.generator.next_update(self.broadcaster.current());
        let merged = self.broadcaster.current().merged(&partial);
        let trigger = self.broadcaster.should_trigger_guidance(&merged);
        let current = self.broadcaster.update(&partial).clone();

        tracing::trace!(trigger, "Metrics tick");
        emit(SessionEvent::Metrics {
            metrics: current.clone(),
        });
        if trigger {
            emit(SessionEvent::GuidanceDue {
                activity: Activity::MetricsUpdate,
                metrics: current,
            });
        }
    }

    fn on_exercise_completed(
        &mut self,
        exercise: Exercise,
        details: ExerciseDetails,
        now: DateTime<Utc>,
        emit: &impl Fn(SessionEvent),
    ) -> bool {
        let snapshot = self.broadcaster.current().clone();
        let Some(completion) = self
            .controller
            .complete_exercise(exercise, details, &snapshot, now)
            .cloned()
        else {
            return false;
        };

        let progress = self.controller.progress();
        let partial = MetricsRecord::new().with(MetricKind::MissionProgress, progress);
        let milestone = self.broadcaster.should_trigger_guidance(&partial);
        let current = self.broadcaster.update(&partial).clone();

        emit(SessionEvent::ExerciseCompleted {
            completion,
            progress,
        });
        emit(SessionEvent::Metrics {
            metrics: current.clone(),
        });
        if milestone {
            emit(SessionEvent::GuidanceDue {
                activity: Activity::ProgressMilestone,
                metrics: current,
            });
        }
        true
    }

    fn finish(&mut self, now: DateTime<Utc>, emit: &impl Fn(SessionEvent)) -> Option<SessionSummary> {
        let summary = self.controller.end(now, self.broadcaster.current())?;
        emit(SessionEvent::GuidanceDue {
            activity: Activity::SessionEnd,
            metrics: self.broadcaster.current().clone(),
        });
        emit(SessionEvent::Ended {
            summary: summary.clone(),
        });
        Some(summary)
    }
}

/// Wall-clock time derived from tokio's monotonic clock, so elapsed time
/// follows the runtime clock (and paused test time).
#[derive(Clone, Copy)]
struct SessionClock {
    started: Instant,
    anchor: DateTime<Utc>,
}

impl SessionClock {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            anchor: Utc::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor + elapsed
    }
}

/// Control surface of a running session.
///
/// Commands sent after the session ended are answered with `false`/`None`.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<Option<SessionSummary>>,
}

impl SessionHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(make(tx)).await.ok()?;
        rx.await.ok()
    }

    pub async fn pause(&self) -> bool {
        self.request(Command::Pause).await.unwrap_or(false)
    }

    pub async fn resume(&self) -> bool {
        self.request(Command::Resume).await.unwrap_or(false)
    }

    pub async fn complete_exercise(&self, exercise: Exercise, details: ExerciseDetails) -> bool {
        self.request(|reply| Command::CompleteExercise {
            exercise,
            details,
            reply,
        })
        .await
        .unwrap_or(false)
    }

    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// End the session and wait for the task to stop
    pub async fn end(self) -> Option<SessionSummary> {
        let summary = self.request(Command::End).await.flatten();
        if let Err(e) = self.task.await {
            tracing::error!("Session task failed: {}", e);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::rewards::NoRewards;
    use crate::training::TrainingCatalog;
    use std::sync::{Arc, Mutex};

    fn runner(module: &str) -> SessionRunner {
        let module = TrainingCatalog::builtin().unwrap().get(module).cloned().unwrap();
        let controller = SessionController::new(module, Arc::new(NoRewards));
        SessionRunner::new(controller, MockMetricsGenerator::seeded(7), &SessionConfig::default())
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    fn count(events: &[SessionEvent], pred: impl Fn(&SessionEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    fn is_tick(e: &SessionEvent) -> bool {
        matches!(e, SessionEvent::Tick { .. })
    }

    fn is_metrics(e: &SessionEvent) -> bool {
        matches!(e, SessionEvent::Metrics { .. })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_and_metrics_while_active() {
        let (handle, mut events) = runner("core-conditioning").spawn();

        tokio::time::sleep(Duration::from_millis(6500)).await;
        let seen = drain(&mut events);

        assert!(matches!(seen[0], SessionEvent::Started { .. }));
        assert!(matches!(
            seen[1],
            SessionEvent::GuidanceDue { activity: Activity::SessionStart, .. }
        ));
        assert_eq!(count(&seen, is_tick), 6);
        assert_eq!(count(&seen, is_metrics), 2);

        let last_tick = seen
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Tick { elapsed_secs } => Some(*elapsed_secs),
                _ => None,
            })
            .last();
        assert_eq!(last_tick, Some(6));

        handle.end().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_skips_ticks_but_clock_keeps_running() {
        let (handle, mut events) = runner("core-conditioning").spawn();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(handle.pause().await);
        drain(&mut events);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let while_paused = drain(&mut events);
        assert_eq!(count(&while_paused, is_tick), 0);
        assert_eq!(count(&while_paused, is_metrics), 0);

        assert!(!handle.pause().await);
        assert!(handle.resume().await);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let resumed = drain(&mut events);
        let elapsed: Vec<u64> = resumed
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Tick { elapsed_secs } => Some(*elapsed_secs),
                _ => None,
            })
            .collect();
        assert_eq!(elapsed, vec![12]);

        let summary = handle.end().await.unwrap();
        assert_eq!(summary.duration_secs, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plank_session_end_to_end() {
        let (handle, mut events) = runner("core-conditioning").spawn();

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert!(
            handle
                .complete_exercise(Exercise::Plank, ExerciseDetails::duration(180))
                .await
        );
        tokio::time::sleep(Duration::from_secs(100)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, SessionState::Active);
        assert_eq!(snapshot.progress, 25.0);

        let summary = handle.end().await.unwrap();
        assert_eq!(summary.completed.len(), 1);
        assert_eq!(summary.duration_secs, 300);
        assert_eq!(summary.metrics.get(MetricKind::MissionProgress), Some(25.0));

        let seen = drain(&mut events);
        assert!(seen.iter().any(|e| matches!(
            e,
            SessionEvent::GuidanceDue { activity: Activity::ProgressMilestone, .. }
        )));
        assert!(matches!(seen.last(), Some(SessionEvent::Ended { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_rejected_while_paused() {
        let (handle, _events) = runner("core-conditioning").spawn();
        handle.pause().await;
        assert!(
            !handle
                .complete_exercise(Exercise::Plank, ExerciseDetails::default())
                .await
        );
        let summary = handle.end().await.unwrap();
        assert!(summary.completed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_stops_everything() {
        let (handle, mut events) = runner("balance-vestibular").spawn();
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.end().await.unwrap();
        drain(&mut events);

        tokio::time::sleep(Duration::from_secs(30)).await;
        // Task exited: the sender is gone and nothing new arrives
        assert!(events.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_ends_session() {
        let (handle, mut events) = runner("balance-vestibular").spawn();
        drop(handle);

        let mut last = None;
        while let Some(event) = events.recv().await {
            last = Some(event);
        }
        assert!(matches!(last, Some(SessionEvent::Ended { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_listeners_see_every_update() {
        let updates = Arc::new(Mutex::new(0usize));
        let mut runner = runner("core-conditioning");
        let counter = updates.clone();
        runner.broadcaster_mut().subscribe(move |_: &MetricsRecord| {
            *counter.lock().unwrap() += 1;
        });

        let (handle, _events) = runner.spawn();
        tokio::time::sleep(Duration::from_millis(9500)).await;
        handle.end().await;
        assert_eq!(*updates.lock().unwrap(), 3);
    }
}

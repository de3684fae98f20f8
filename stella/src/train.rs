//! `train` command: run one session with a live status line.
//!
//! Input comes from stdin (`p` pause, `r` resume, `c <exercise>` complete,
//! `s` status, `e` end). Ctrl-C and end of input both end the session, so the
//! summary is always printed.

use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use stella_core::guidance::{Coach, GuidanceContext};
use stella_core::metrics::{MetricKind, MetricsRecord, MockMetricsGenerator};
use stella_core::session::{
    CreditLedger, ExerciseDetails, SessionController, SessionEvent, SessionHandle, SessionRunner,
};
use stella_core::training::TrainingCatalog;
use stella_core::{Config, Database, Exercise};
use tokio::sync::mpsc;

use crate::coach::print_guidance;

enum Input {
    Line(String),
    Interrupt,
    Closed,
}

#[derive(Debug, PartialEq)]
enum Action {
    Pause,
    Resume,
    Complete(Exercise, ExerciseDetails),
    Status,
    End,
}

/// Parse one line of session input.
///
/// `c plank 180` completes a plank held for 180 seconds.
fn parse_action(line: &str) -> std::result::Result<Action, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err(String::new());
    };

    match command {
        "p" | "pause" => Ok(Action::Pause),
        "r" | "resume" => Ok(Action::Resume),
        "s" | "status" => Ok(Action::Status),
        "e" | "end" | "q" => Ok(Action::End),
        "c" | "complete" => {
            let exercise: Exercise = words
                .next()
                .ok_or_else(|| "usage: c <exercise> [seconds]".to_string())?
                .parse()?;
            let details = match words.next() {
                Some(secs) => ExerciseDetails::duration(
                    secs.parse()
                        .map_err(|_| format!("'{secs}' is not a number of seconds"))?,
                ),
                None => ExerciseDetails::default(),
            };
            Ok(Action::Complete(exercise, details))
        }
        other => Err(format!("unknown command '{other}' (p, r, c <exercise>, s, e)")),
    }
}

/// Forward stdin lines and Ctrl-C into one channel
fn spawn_input() -> Result<mpsc::UnboundedReceiver<Input>> {
    let (tx, rx) = mpsc::unbounded_channel();

    let interrupt = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.send(Input::Interrupt);
    })
    .context("failed to set Ctrl+C handler")?;

    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(Input::Closed);
    });

    Ok(rx)
}

fn status_line(metrics: &MetricsRecord, elapsed_secs: u64) -> String {
    let value = |kind: MetricKind| metrics.get(kind).unwrap_or_else(|| kind.baseline());
    format!(
        "{:02}:{:02} | HR {:.0} | O2 {:.0}% | form {:.0} | focus {:.0}",
        elapsed_secs / 60,
        elapsed_secs % 60,
        value(MetricKind::HeartRate),
        value(MetricKind::O2Saturation),
        value(MetricKind::FormQuality),
        value(MetricKind::FocusScore),
    )
}

async fn handle_action(handle: &SessionHandle, action: Action, pb: &ProgressBar) {
    let accepted = match action {
        Action::Pause => handle.pause().await,
        Action::Resume => handle.resume().await,
        Action::Complete(exercise, details) => handle.complete_exercise(exercise, details).await,
        Action::Status => {
            if let Some(snapshot) = handle.snapshot().await {
                pb.println(format!(
                    "{} | {:.0}% | {}",
                    snapshot.state,
                    snapshot.progress,
                    status_line(&snapshot.metrics, snapshot.elapsed_secs)
                ));
            }
            true
        }
        Action::End => true,
    };
    if !accepted {
        pb.println("Not possible right now.");
    }
}

pub async fn run(config: &Config, db: Arc<Database>, module_id: &str, seed: Option<u64>) -> Result<()> {
    let catalog = TrainingCatalog::builtin().context("failed to load training catalog")?;
    let module = catalog.require(module_id)?.clone();
    let mut coach =
        Coach::from_config(&config.guidance, db).context("failed to set up guidance")?;
    let context = GuidanceContext::module(&module.id);

    let ledger = Arc::new(CreditLedger::new(config.session.credits_per_exercise));
    let generator = match seed {
        Some(seed) => MockMetricsGenerator::seeded(seed),
        None => MockMetricsGenerator::from_entropy(),
    };

    println!("{} ({} exercises)", module.title, module.total_exercises());
    for spec in &module.exercises {
        println!("  - {:<20} {}", spec.exercise.as_str(), spec.title);
    }
    println!("Commands: p = pause, r = resume, c <exercise> [seconds] = complete, s = status, e = end");
    println!();

    let total = module.total_exercises() as u64;
    let controller = SessionController::new(module, ledger.clone());
    let runner = SessionRunner::new(controller, generator, &config.session);
    let (handle, mut events) = runner.spawn();
    let mut input = spawn_input()?;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:20.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut metrics = MetricsRecord::baseline();
    let mut completed = 0u64;
    let mut handle = Some(handle);
    let mut summary = None;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::Started { session_id, .. } => {
                        tracing::info!(session_id = %session_id, "Training session started");
                    }
                    SessionEvent::Tick { elapsed_secs } => {
                        pb.set_message(status_line(&metrics, elapsed_secs));
                        pb.tick();
                    }
                    SessionEvent::Metrics { metrics: latest } => {
                        metrics = latest;
                    }
                    SessionEvent::GuidanceDue { activity, metrics: snapshot } => {
                        let record = coach.guidance(&activity, &snapshot, &context).await;
                        pb.suspend(|| print_guidance(&record));
                    }
                    SessionEvent::ExerciseCompleted { completion, progress } => {
                        completed += 1;
                        pb.set_position(completed.min(total));
                        pb.println(format!(
                            "Completed {} ({:.0}% of module)",
                            completion.exercise, progress
                        ));
                    }
                    SessionEvent::Ended { summary: ended } => {
                        summary = Some(ended);
                    }
                }
            }
            line = input.recv(), if handle.is_some() => {
                let action = match line {
                    Some(Input::Line(line)) => match parse_action(&line) {
                        Ok(action) => action,
                        Err(reason) => {
                            if !reason.is_empty() {
                                pb.println(reason);
                            }
                            continue;
                        }
                    },
                    Some(Input::Interrupt) | Some(Input::Closed) | None => Action::End,
                };

                if action == Action::End {
                    if let Some(handle) = handle.take() {
                        // Events keep draining until the runner closes the channel
                        handle.end().await;
                    }
                } else if let Some(handle) = &handle {
                    handle_action(handle, action, &pb).await;
                }
            }
        }
    }

    pb.finish_and_clear();

    let summary = summary.context("session ended without a summary")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to render summary")?
    );
    println!("Credits earned: {}", ledger.balance());
    Ok(())
}

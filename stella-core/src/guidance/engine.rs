//! STELLA, the local coaching engine.
//!
//! Guidance is a total function of the activity and the current metrics.
//! Safety checks come first, in order:
//!
//! 1. heart rate above 160 bpm: high-priority recovery guidance
//! 2. form quality below 70: medium-priority form correction
//!
//! Only then does the activity pick a template. Anything unrecognized gets a
//! generic message. Every call lands in a bounded FIFO history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::{MetricKind, MetricsRecord};
use crate::types::{GuidanceRecord, Priority};

use super::activity::Activity;
use super::content::{exercise_cue, DEFAULT_ANSWER, DEFAULT_GUIDANCE, QUESTION_TOPICS};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

const HEART_RATE_CEILING: f64 = 160.0;
const FORM_QUALITY_FLOOR: f64 = 70.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Guidance {
        activity: Activity,
        record: GuidanceRecord,
        at: DateTime<Utc>,
    },
    Question {
        question: String,
        answer: String,
        at: DateTime<Utc>,
    },
}

fn metric(metrics: &MetricsRecord, kind: MetricKind) -> f64 {
    metrics.get(kind).unwrap_or_else(|| kind.baseline())
}

/// Pick guidance for `activity` given `metrics`. Pure; never fails.
pub fn guidance_for(activity: &Activity, metrics: &MetricsRecord) -> GuidanceRecord {
    if let Some(hr) = metrics.get(MetricKind::HeartRate) {
        if hr > HEART_RATE_CEILING {
            return GuidanceRecord::new(
                format!(
                    "Your heart rate is {hr:.0} bpm, above the safe training ceiling. Slow down and recover before continuing."
                ),
                Priority::High,
            )
            .with_actions([
                "Stop the current set",
                "Take slow, deep breaths",
                "Resume when heart rate drops below 140 bpm",
            ]);
        }
    }

    if let Some(form) = metrics.get(MetricKind::FormQuality) {
        if form < FORM_QUALITY_FLOOR {
            return GuidanceRecord::new(
                format!("Form quality has dropped to {form:.0}%. Slow the movement down and reset your position."),
                Priority::Medium,
            )
            .with_actions([
                "Reduce the pace",
                "Brace your core",
                "Focus on full range of motion",
            ]);
        }
    }

    match activity {
        Activity::Balance => {
            let balance = metric(metrics, MetricKind::Balance);
            let message = if balance < 70.0 {
                format!("Balance score is {balance:.0}. Widen your base slightly and fix your gaze on a single point.")
            } else {
                format!("Balance score is {balance:.0}. Solid. Try closing your eyes for the next 15 seconds.")
            };
            GuidanceRecord::new(message, Priority::Normal).with_actions([
                "Engage your core",
                "Keep a soft bend in your knees",
                "Focus on a fixed point",
            ])
        }
        Activity::Endurance => {
            let endurance = metric(metrics, MetricKind::Endurance);
            let hr = metric(metrics, MetricKind::HeartRate);
            GuidanceRecord::new(
                format!(
                    "Endurance at {endurance:.0}% with heart rate {hr:.0} bpm. Hold a steady pace you could keep for an entire EVA."
                ),
                Priority::Normal,
            )
            .with_actions(["Maintain a steady rhythm", "Breathe deeply", "Stay hydrated"])
        }
        Activity::Exercise(Some(exercise)) => {
            let (message, actions) = exercise_cue(*exercise);
            GuidanceRecord::new(message, Priority::Normal).with_actions(actions.iter().copied())
        }
        Activity::Exercise(None) => GuidanceRecord::new(
            "Focus on controlled movements and steady breathing throughout the exercise.",
            Priority::Normal,
        )
        .with_actions(["Warm up first", "Control every rep", "Rest between sets"]),
        Activity::SessionStart => {
            let hr = metric(metrics, MetricKind::HeartRate);
            GuidanceRecord::new(
                format!(
                    "Welcome back. Starting heart rate is {hr:.0} bpm. Warm up for five minutes before the first drill."
                ),
                Priority::Normal,
            )
            .with_actions(["Hydrate", "Check your equipment", "Start with mobility work"])
        }
        Activity::SessionEnd => {
            let progress = metric(metrics, MetricKind::MissionProgress);
            GuidanceRecord::new(
                format!("Session complete. Mission progress is at {progress:.0}%. Cool down and log how you feel."),
                Priority::Normal,
            )
            .with_actions(["Cool down for five minutes", "Stretch", "Rehydrate"])
        }
        Activity::ProgressMilestone => {
            let progress = metric(metrics, MetricKind::MissionProgress);
            GuidanceRecord::new(
                format!("Milestone reached: {progress:.0}% of this module is done. Keep the momentum going."),
                Priority::Normal,
            )
            .with_actions(["Review what went well", "Set a goal for the next block"])
        }
        Activity::MetricsUpdate => GuidanceRecord::new(
            format!(
                "Heart rate {:.0} bpm, O2 {:.0}%, focus {:.0}. All within range.",
                metric(metrics, MetricKind::HeartRate),
                metric(metrics, MetricKind::O2Saturation),
                metric(metrics, MetricKind::FocusScore),
            ),
            Priority::Low,
        ),
        Activity::Unrecognized(_) => GuidanceRecord::new(DEFAULT_GUIDANCE, Priority::Normal),
    }
}

/// Answer a free-text question by keyword. First matching topic wins.
pub fn answer_for(question: &str) -> &'static str {
    let lower = question.to_lowercase();
    QUESTION_TOPICS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, answer)| *answer)
        .unwrap_or(DEFAULT_ANSWER)
}

/// Local guidance engine with history
#[derive(Debug)]
pub struct GuidanceEngine {
    history: VecDeque<HistoryEntry>,
    limit: usize,
}

impl Default for GuidanceEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl GuidanceEngine {
    pub fn new(limit: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit,
        }
    }

    pub fn get_guidance(&mut self, activity: &Activity, metrics: &MetricsRecord) -> GuidanceRecord {
        let record = guidance_for(activity, metrics);
        tracing::debug!(activity = %activity, priority = %record.priority, "Local guidance");
        self.record(activity.clone(), record.clone());
        record
    }

    pub fn ask_question(&mut self, question: &str) -> String {
        let answer = answer_for(question).to_string();
        self.record_answer(question, &answer);
        answer
    }

    /// Append guidance produced elsewhere (e.g. the remote backend)
    pub fn record(&mut self, activity: Activity, record: GuidanceRecord) {
        self.push(HistoryEntry::Guidance {
            activity,
            record,
            at: Utc::now(),
        });
    }

    pub fn record_answer(&mut self, question: &str, answer: &str) {
        self.push(HistoryEntry::Question {
            question: question.to_string(),
            answer: answer.to_string(),
            at: Utc::now(),
        });
    }

    /// Oldest first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.history.push_back(entry);
        while self.history.len() > self.limit {
            self.history.pop_front();
        }
    }
}

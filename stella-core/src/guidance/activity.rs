//! What the trainee is doing when guidance is requested.

use serde::{Deserialize, Serialize};

use crate::types::Exercise;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Balance,
    Endurance,
    /// A specific drill, or exercise work in general when `None`
    Exercise(Option<Exercise>),
    SessionStart,
    SessionEnd,
    ProgressMilestone,
    MetricsUpdate,
    /// Anything outside the known set; answered with the default message
    Unrecognized(String),
}

impl Activity {
    /// Parse an activity tag. Never fails: unknown tags become
    /// [`Activity::Unrecognized`].
    ///
    /// Exercise tags take an optional id: `exercise`, `exercise:plank`.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        let lower = tag.to_ascii_lowercase().replace('_', "-");

        if let Some(rest) = lower.strip_prefix("exercise") {
            let id = rest.trim_start_matches([':', '/', '-']).trim();
            if id.is_empty() {
                return Activity::Exercise(None);
            }
            if rest.starts_with([':', '/']) {
                return Activity::Exercise(id.parse().ok());
            }
        }

        match lower.as_str() {
            "balance" => Activity::Balance,
            "endurance" => Activity::Endurance,
            "session-start" => Activity::SessionStart,
            "session-end" => Activity::SessionEnd,
            "progress-milestone" => Activity::ProgressMilestone,
            "metrics-update" => Activity::MetricsUpdate,
            _ => Activity::Unrecognized(tag.to_string()),
        }
    }

    /// Wire tag for the guidance backend
    pub fn tag(&self) -> String {
        match self {
            Activity::Balance => "balance".to_string(),
            Activity::Endurance => "endurance".to_string(),
            Activity::Exercise(None) => "exercise".to_string(),
            Activity::Exercise(Some(e)) => format!("exercise:{}", e.as_str()),
            Activity::SessionStart => "session-start".to_string(),
            Activity::SessionEnd => "session-end".to_string(),
            Activity::ProgressMilestone => "progress-milestone".to_string(),
            Activity::MetricsUpdate => "metrics-update".to_string(),
            Activity::Unrecognized(tag) => tag.clone(),
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag())
    }
}

impl From<&str> for Activity {
    fn from(tag: &str) -> Self {
        Activity::parse(tag)
    }
}

impl Serialize for Activity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag())
    }
}

impl<'de> Deserialize<'de> for Activity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Activity::parse(&tag))
    }
}

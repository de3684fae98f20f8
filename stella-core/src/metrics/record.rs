//! Clamped training metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every metric the session tracks, with its allowed range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    HeartRate,
    O2Saturation,
    FocusScore,
    Balance,
    CoreStability,
    Endurance,
    FormQuality,
    MissionProgress,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::HeartRate,
        MetricKind::O2Saturation,
        MetricKind::FocusScore,
        MetricKind::Balance,
        MetricKind::CoreStability,
        MetricKind::Endurance,
        MetricKind::FormQuality,
        MetricKind::MissionProgress,
    ];

    /// Inclusive `(min, max)` for this metric
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            MetricKind::HeartRate => (40.0, 200.0),
            MetricKind::O2Saturation => (94.0, 100.0),
            MetricKind::FocusScore
            | MetricKind::Balance
            | MetricKind::CoreStability
            | MetricKind::Endurance
            | MetricKind::FormQuality
            | MetricKind::MissionProgress => (0.0, 100.0),
        }
    }

    /// Resting value a fresh session starts from
    pub fn baseline(&self) -> f64 {
        match self {
            MetricKind::HeartRate => 72.0,
            MetricKind::O2Saturation => 98.0,
            MetricKind::FocusScore => 85.0,
            MetricKind::Balance => 80.0,
            MetricKind::CoreStability => 80.0,
            MetricKind::Endurance => 90.0,
            MetricKind::FormQuality => 90.0,
            MetricKind::MissionProgress => 0.0,
        }
    }

    /// Clamp `value` into [`bounds`](Self::bounds)
    pub fn clamp_value(&self, value: f64) -> f64 {
        let (min, max) = self.bounds();
        value.clamp(min, max)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "heartRate",
            MetricKind::O2Saturation => "o2Saturation",
            MetricKind::FocusScore => "focusScore",
            MetricKind::Balance => "balance",
            MetricKind::CoreStability => "coreStability",
            MetricKind::Endurance => "endurance",
            MetricKind::FormQuality => "formQuality",
            MetricKind::MissionProgress => "missionProgress",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown metric: {}", s))
    }
}

/// Metric name → value; every write is clamped to the metric's bounds.
///
/// Metrics are independent: nothing relates heart rate to saturation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<MetricKind, f64>",
    into = "BTreeMap<MetricKind, f64>"
)]
pub struct MetricsRecord {
    values: BTreeMap<MetricKind, f64>,
}

impl MetricsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every metric at its baseline
    pub fn baseline() -> Self {
        MetricKind::ALL
            .into_iter()
            .map(|k| (k, k.baseline()))
            .collect()
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, kind: MetricKind, value: f64) -> Self {
        self.set(kind, value);
        self
    }

    /// Store `value` clamped to bounds and return what was stored.
    ///
    /// Non-finite values are skipped.
    pub fn set(&mut self, kind: MetricKind, value: f64) -> Option<f64> {
        if !value.is_finite() {
            tracing::warn!(metric = %kind, value, "Ignoring non-finite metric value");
            return None;
        }
        let clamped = kind.clamp_value(value);
        self.values.insert(kind, clamped);
        Some(clamped)
    }

    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }

    /// Shallow overwrite per key
    pub fn merge(&mut self, partial: &MetricsRecord) {
        for (kind, value) in partial.iter() {
            self.values.insert(kind, value);
        }
    }

    pub fn merged(&self, partial: &MetricsRecord) -> MetricsRecord {
        let mut next = self.clone();
        next.merge(partial);
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(MetricKind, f64)> for MetricsRecord {
    fn from_iter<I: IntoIterator<Item = (MetricKind, f64)>>(iter: I) -> Self {
        let mut record = MetricsRecord::new();
        for (kind, value) in iter {
            record.set(kind, value);
        }
        record
    }
}

impl From<BTreeMap<MetricKind, f64>> for MetricsRecord {
    fn from(values: BTreeMap<MetricKind, f64>) -> Self {
        values.into_iter().collect()
    }
}

impl From<MetricsRecord> for BTreeMap<MetricKind, f64> {
    fn from(record: MetricsRecord) -> Self {
        record.values
    }
}

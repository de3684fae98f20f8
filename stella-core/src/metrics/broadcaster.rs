//! Shared metrics record with synchronous listeners.

use super::record::{MetricKind, MetricsRecord};

/// Heart-rate change (bpm) that warrants fresh guidance
pub const HEART_RATE_DELTA: f64 = 15.0;
/// Form-quality change (points) that warrants fresh guidance
pub const FORM_QUALITY_DELTA: f64 = 10.0;
/// Mission progress milestone width (percent)
pub const PROGRESS_MILESTONE: f64 = 25.0;

/// Receives the full record after every update
pub trait MetricsListener: Send {
    fn on_metrics(&mut self, metrics: &MetricsRecord);
}

impl<F> MetricsListener for F
where
    F: FnMut(&MetricsRecord) + Send,
{
    fn on_metrics(&mut self, metrics: &MetricsRecord) {
        self(metrics)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Owns the current [`MetricsRecord`].
///
/// Updates are applied in call order and every update notifies every
/// listener, in registration order, before returning. No batching.
#[derive(Default)]
pub struct MetricsBroadcaster {
    current: MetricsRecord,
    listeners: Vec<(ListenerId, Box<dyn MetricsListener>)>,
    next_id: u64,
}

impl MetricsBroadcaster {
    pub fn new(initial: MetricsRecord) -> Self {
        Self {
            current: initial,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn current(&self) -> &MetricsRecord {
        &self.current
    }

    pub fn subscribe(&mut self, listener: impl MetricsListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener, returning whether it was registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Merge `partial` into the current record and notify every listener.
    pub fn update(&mut self, partial: &MetricsRecord) -> &MetricsRecord {
        self.current.merge(partial);
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_metrics(&self.current);
        }
        &self.current
    }

    /// Whether moving from the current record to `new` deserves fresh guidance.
    ///
    /// True when heart rate moves by more than 15, form quality by more than
    /// 10, or mission progress crosses a multiple of 25. Metrics missing from
    /// either side never count as a heart-rate or form change; missing
    /// progress counts as 0.
    pub fn should_trigger_guidance(&self, new: &MetricsRecord) -> bool {
        let delta = |kind: MetricKind| match (self.current.get(kind), new.get(kind)) {
            (Some(old), Some(new)) => (new - old).abs(),
            _ => 0.0,
        };

        if delta(MetricKind::HeartRate) > HEART_RATE_DELTA {
            return true;
        }
        if delta(MetricKind::FormQuality) > FORM_QUALITY_DELTA {
            return true;
        }

        let old_progress = self
            .current
            .get(MetricKind::MissionProgress)
            .unwrap_or(0.0);
        let new_progress = new.get(MetricKind::MissionProgress).unwrap_or(old_progress);
        (new_progress / PROGRESS_MILESTONE).floor() > (old_progress / PROGRESS_MILESTONE).floor()
    }
}

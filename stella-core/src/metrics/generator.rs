//! Mock biometric feed: a bounded random walk around the current values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::record::{MetricKind, MetricsRecord};

/// Largest step per update for each simulated metric, as `(down, up)`
fn step_range(kind: MetricKind) -> Option<(f64, f64)> {
    match kind {
        MetricKind::HeartRate => Some((-6.0, 8.0)),
        MetricKind::O2Saturation => Some((-0.8, 0.8)),
        MetricKind::FocusScore => Some((-4.0, 4.0)),
        MetricKind::Balance => Some((-4.0, 4.0)),
        MetricKind::CoreStability => Some((-3.0, 3.0)),
        MetricKind::Endurance => Some((-2.0, 1.0)),
        MetricKind::FormQuality => Some((-5.0, 4.0)),
        // Progress comes from completed exercises, never from the feed
        MetricKind::MissionProgress => None,
    }
}

pub struct MockMetricsGenerator {
    rng: StdRng,
}

impl MockMetricsGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic feed for tests and reproducible demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produce the next partial update from the current record.
    pub fn next_update(&mut self, current: &MetricsRecord) -> MetricsRecord {
        MetricKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let (down, up) = step_range(kind)?;
                let base = current.get(kind).unwrap_or_else(|| kind.baseline());
                let step = self.rng.gen_range(down..=up);
                Some((kind, base + step))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_walk_stays_in_bounds() {
        let mut generator = MockMetricsGenerator::seeded(7);
        let mut record = MetricsRecord::baseline();

        for _ in 0..5_000 {
            let update = generator.next_update(&record);
            record.merge(&update);
            for (kind, value) in record.iter() {
                let (min, max) = kind.bounds();
                assert!(
                    (min..=max).contains(&value),
                    "{kind} = {value} escaped [{min}, {max}]"
                );
            }
            let o2 = record.get(MetricKind::O2Saturation).unwrap();
            assert!((94.0..=100.0).contains(&o2));
        }
    }

    #[test]
    fn test_progress_is_never_generated() {
        let mut generator = MockMetricsGenerator::seeded(1);
        let update = generator.next_update(&MetricsRecord::baseline());
        assert!(update.get(MetricKind::MissionProgress).is_none());
        assert_eq!(update.len(), MetricKind::ALL.len() - 1);
    }

    #[test]
    fn test_seeded_generators_agree() {
        let mut a = MockMetricsGenerator::seeded(42);
        let mut b = MockMetricsGenerator::seeded(42);
        let base = MetricsRecord::baseline();
        assert_eq!(a.next_update(&base), b.next_update(&base));
    }
}

//! Training metrics: the clamped record, the broadcaster that owns it, and
//! the mock feed that drives it during a session.

pub mod broadcaster;
pub mod generator;
pub mod record;

pub use broadcaster::{ListenerId, MetricsBroadcaster, MetricsListener};
pub use generator::MockMetricsGenerator;
pub use record::{MetricKind, MetricsRecord};

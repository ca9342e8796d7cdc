//! Observability: in-memory event counters behind a sink abstraction.
//!
//! Engine logic MUST NOT touch counters directly; it emits [`PlanEvent`]
//! values through [`sink::record`], and a session may scope a custom sink
//! with [`sink::with_metrics_sink`].

pub(crate) mod metrics;
pub(crate) mod sink;

pub use metrics::{EntityCounters, EventOps, EventReport};
pub use sink::{
    Coverage, MetricsSink, PlanEvent, metrics_report, metrics_reset_all, with_metrics_sink,
};

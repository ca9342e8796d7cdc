//! Metrics sink boundary.
//!
//! All instrumentation flows through [`PlanEvent`] and [`MetricsSink`].
//! This module is the only allowed bridge between engine logic and the
//! thread-local metrics state.

use crate::obs::metrics;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<&'static dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// Coverage
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Coverage {
    Full,
    Partial,
}

///
/// PlanEvent
///

#[derive(Clone, Copy, Debug)]
pub enum PlanEvent<'a> {
    PlanBuilt {
        entity: &'a str,
        nodes: u64,
        properties: u64,
    },
    Pruned {
        entity: &'a str,
        removed: u64,
    },
    Hydrated {
        entity: &'a str,
        coverage: Coverage,
    },
    Transition {
        entity: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: PlanEvent<'_>);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into thread-local metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: PlanEvent<'_>) {
        match event {
            PlanEvent::PlanBuilt {
                entity,
                nodes,
                properties,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.plans_built = m.ops.plans_built.saturating_add(1);
                    m.ops.plan_nodes_built = m.ops.plan_nodes_built.saturating_add(nodes);
                    m.ops.plan_properties_built =
                        m.ops.plan_properties_built.saturating_add(properties);

                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.plans_built = entry.plans_built.saturating_add(1);
                });
            }

            PlanEvent::Pruned { entity, removed } => {
                metrics::with_state_mut(|m| {
                    m.ops.prunes = m.ops.prunes.saturating_add(1);
                    m.ops.properties_pruned = m.ops.properties_pruned.saturating_add(removed);

                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.prunes = entry.prunes.saturating_add(1);
                });
            }

            PlanEvent::Hydrated { entity, coverage } => {
                metrics::with_state_mut(|m| {
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    match coverage {
                        Coverage::Full => {
                            m.ops.hydrates_full = m.ops.hydrates_full.saturating_add(1);
                            entry.hydrates_full = entry.hydrates_full.saturating_add(1);
                        }
                        Coverage::Partial => {
                            m.ops.hydrates_partial = m.ops.hydrates_partial.saturating_add(1);
                            entry.hydrates_partial = entry.hydrates_partial.saturating_add(1);
                        }
                    }
                });
            }

            PlanEvent::Transition { entity } => {
                metrics::with_state_mut(|m| {
                    m.ops.transitions = m.ops.transitions.saturating_add(1);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.transitions = entry.transitions.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: PlanEvent<'_>) {
    let sink = SINK_OVERRIDE.with(|cell| *cell.borrow());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state for endpoint/test plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous override is restored on every exit path, including unwind.
pub fn with_metrics_sink<T>(sink: &'static dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard {
        previous: Option<&'static dyn MetricsSink>,
    }

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = self.previous);
        }
    }

    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard { previous };

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingSink {
        seen: AtomicU64,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _event: PlanEvent<'_>) {
            self.seen.fetch_add(1, Ordering::Relaxed);
        }
    }

    static COUNTING_SINK: CountingSink = CountingSink {
        seen: AtomicU64::new(0),
    };

    #[test]
    fn override_sink_captures_events_and_restores() {
        metrics_reset_all();

        with_metrics_sink(&COUNTING_SINK, || {
            record(PlanEvent::Transition { entity: "customer" });
        });
        assert_eq!(COUNTING_SINK.seen.load(Ordering::Relaxed), 1);

        // Outside the scope, events land in the global state again.
        record(PlanEvent::Transition { entity: "customer" });
        assert_eq!(COUNTING_SINK.seen.load(Ordering::Relaxed), 1);
        assert_eq!(metrics_report().ops.transitions, 1);
    }

    #[test]
    fn global_sink_accumulates_per_entity_counters() {
        metrics_reset_all();

        record(PlanEvent::PlanBuilt {
            entity: "order",
            nodes: 2,
            properties: 5,
        });
        record(PlanEvent::Pruned {
            entity: "order",
            removed: 3,
        });

        let report = metrics_report();
        assert_eq!(report.ops.plans_built, 1);
        assert_eq!(report.ops.plan_nodes_built, 2);
        assert_eq!(report.ops.properties_pruned, 3);
        assert_eq!(report.entities["order"].plans_built, 1);
        assert_eq!(report.entities["order"].prunes, 1);
    }
}

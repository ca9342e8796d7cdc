//! LensDB engine core: the entity fetch-plan graph and the per-session
//! load-state tracker.
//!
//! ## Crate layout
//! - `model`: metadata descriptor registry (entities, properties, paths).
//! - `plan`: fetch-plan nodes, builder/merge algorithm, named-plan registry,
//!   and policy pruning.
//! - `state`: per-instance lifecycle machine and loaded-attribute tracking.
//! - `obs`: event counters behind a metrics-sink boundary.
//! - `error`: shared class/origin error taxonomy.
//!
//! Plan construction and merge are pure, synchronous, in-memory operations.
//! Built plans are immutable and shared (`Arc`); the catalog and registry
//! are single-writer at startup and lock-free to read afterwards.

pub mod error;
pub mod key;
pub mod model;
pub mod obs;
pub mod plan;
pub mod state;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::{ErrorClass, ErrorOrigin, InternalError};
pub use key::{InstanceKey, Key};
pub use model::{EntityModel, MetadataCatalog, MetadataError, PropertyKind, PropertyModel};
pub use plan::{
    FetchPlan, FetchPlanBuilder, FetchPlanRegistry, NodeId, PlanError, PlanRef, PropertySpec,
    RegistryError, prune,
};
pub use state::{EntityStates, LifecycleState, LoadRecord, RemoveMode, StateError};

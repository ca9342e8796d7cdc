//! LensDB: entity fetch-plan (view) graph engine with per-session
//! load-state tracking.
//!
//! ## Crate layout
//! - `core`: re-export of `lensdb-core` (metadata model, plan graph,
//!   registry, pruning, tracker).
//! - `db`: session facade with the fluent load API and the loader seam.
//! - `error`: public error taxonomy.
//!
//! Typical flow: build a [`db::Session`] over a startup-time metadata
//! catalog and plan registry, declare a fetch plan fluently
//! (`session.load("customer").id(1).fetch_plan(...)`), and let the injected
//! loader hydrate instances into the session's load-state tracker.

pub use lensdb_core as core;

pub mod db;
pub mod error;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use db::{
    AccessPredicate, FluentLoadRequest, LoadRequest, LoadTarget, Loader, Response, Session,
};
pub use error::{Error, ErrorKind, ErrorOrigin, LoadErrorKind, PlanErrorKind, StateErrorKind};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        core::{
            key::{InstanceKey, Key},
            model::{EntityModel, MetadataCatalog, PropertyKind, PropertyModel},
            plan::{
                FetchPlan, FetchPlanBuilder, FetchPlanRegistry, PLAN_BASE, PLAN_INSTANCE_NAME,
                PLAN_LOCAL, PLAN_MINIMAL, PlanRef, prune,
            },
            state::{EntityStates, LifecycleState, LoadRecord, RemoveMode},
        },
        db::{LoadTarget, Loader, Response, Session},
        error::{Error, ErrorKind},
    };
}

//! Fetch-plan graph engine: immutable plan nodes, the construction/merge
//! builder, the named-plan registry, and policy pruning.

mod builder;
mod node;
mod prune;
mod registry;


pub use builder::{FetchPlanBuilder, PlanError, PlanScope};
pub use node::{FetchPlan, NodeId, PlanNode, PlanRef, PropertySpec};
pub use prune::prune;
pub use registry::{
    FetchPlanRegistry, PLAN_BASE, PLAN_INSTANCE_NAME, PLAN_LOCAL, PLAN_MINIMAL, RegistryError,
};

use crate::{
    db::{Response, Session},
    error::Error,
};
use lensdb_core::{
    error::InternalError,
    key::{InstanceKey, Key},
    plan::{FetchPlan, FetchPlanBuilder, PlanError, prune},
    state::EntityStates,
};
use std::sync::Arc;

///
/// Loader
///
/// External collaborator that executes a finished load request. It hydrates
/// the matching instances and registers every instance it touches with the
/// session's load-state tracker.
///

pub trait Loader {
    fn execute(
        &self,
        request: &LoadRequest,
        states: &mut EntityStates,
    ) -> Result<Vec<InstanceKey>, InternalError>;
}

///
/// LoadTarget
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoadTarget {
    All,
    Id(Key),
    Ids(Vec<Key>),
    Query(String),
}

///
/// LoadRequest
/// Finished load intent handed to the loader: entity, target, fetch plan.
///

#[derive(Clone, Debug)]
pub struct LoadRequest {
    entity: String,
    target: LoadTarget,
    plan: Arc<FetchPlan>,
}

impl LoadRequest {
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub const fn target(&self) -> &LoadTarget {
        &self.target
    }

    #[must_use]
    pub fn fetch_plan(&self) -> &FetchPlan {
        &self.plan
    }
}

///
/// FluentLoadRequest
///
/// Session-bound load intent: target selection plus fetch-plan construction.
/// Owns intent construction and execution routing only.
///

pub struct FluentLoadRequest<'a> {
    session: &'a Session,
    entity: String,
    target: LoadTarget,
    builder: Option<FetchPlanBuilder<'a>>,
}

impl std::fmt::Debug for FluentLoadRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluentLoadRequest")
            .field("entity", &self.entity)
            .field("target", &self.target)
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

impl<'a> FluentLoadRequest<'a> {
    pub(crate) const fn new(session: &'a Session, entity: String) -> Self {
        Self {
            session,
            entity,
            target: LoadTarget::All,
            builder: None,
        }
    }

    // ------------------------------------------------------------------
    // Target selection
    // ------------------------------------------------------------------

    /// Target a single primary-key value.
    #[must_use]
    pub fn id(mut self, key: impl Into<Key>) -> Self {
        self.target = LoadTarget::Id(key.into());
        self
    }

    /// Target multiple primary-key values.
    #[must_use]
    pub fn ids<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.target = LoadTarget::Ids(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Target by an opaque query string, interpreted by the loader.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.target = LoadTarget::Query(query.into());
        self
    }

    // ------------------------------------------------------------------
    // Fetch-plan construction
    // ------------------------------------------------------------------

    /// Refine the fetch plan through a builder closure.
    ///
    /// Repeated calls keep refining the same builder, so plans accumulate
    /// with the engine's union semantics.
    pub fn fetch_plan<F>(mut self, configure: F) -> Result<Self, Error>
    where
        F: FnOnce(FetchPlanBuilder<'a>) -> Result<FetchPlanBuilder<'a>, PlanError>,
    {
        let builder = self.take_builder()?;
        self.builder = Some(configure(builder)?);
        Ok(self)
    }

    /// Merge a named plan from the session's registry.
    pub fn named_plan(mut self, name: impl AsRef<str>) -> Result<Self, Error> {
        let builder = self.take_builder()?;
        self.builder = Some(builder.add_named_plan(self.session.plans(), name)?);
        Ok(self)
    }

    /// Shorthand: select a batch of dotted paths.
    pub fn fetch_properties<I, S>(mut self, paths: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = self.take_builder()?;
        for path in paths {
            builder = builder.add_dotted_path(path)?;
        }
        self.builder = Some(builder);
        Ok(self)
    }

    fn take_builder(&mut self) -> Result<FetchPlanBuilder<'a>, Error> {
        match self.builder.take() {
            Some(builder) => Ok(builder),
            None => Ok(FetchPlanBuilder::new(self.session.catalog(), &self.entity)?),
        }
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Build the plan, apply the session's access policy, and hand the
    /// request to the loader.
    pub fn execute(mut self) -> Result<Response, Error> {
        let plan = self.take_builder()?.build()?;
        let plan = match self.session.access_predicate() {
            Some(is_allowed) => prune(&plan, is_allowed),
            None => plan,
        };

        let request = LoadRequest {
            entity: self.entity,
            target: self.target,
            plan: Arc::new(plan),
        };

        self.session.run_load(&request)
    }
}

use crate::{
    db::{FluentLoadRequest, LoadRequest, Loader, Response},
    error::Error,
};
use lensdb_core::{
    key::InstanceKey,
    model::MetadataCatalog,
    obs::{MetricsSink, with_metrics_sink},
    plan::FetchPlanRegistry,
    state::{EntityStates, LoadRecord, RemoveMode, StateError},
};
use std::{cell::RefCell, sync::Arc};

///
/// AccessPredicate
/// Session-scoped pruning policy over (entity, property) pairs.
///

pub type AccessPredicate = Box<dyn Fn(&str, &str) -> bool>;

///
/// Session
///
/// Request-scoped handle bundling the shared metadata catalog and plan
/// registry with this session's own load-state tracker, loader, and policy
/// (debug, metrics, access). Catalog and registry are shared immutably; the
/// tracker is private to this session.
///

pub struct Session {
    catalog: Arc<MetadataCatalog>,
    plans: Arc<FetchPlanRegistry>,
    loader: Arc<dyn Loader>,
    states: RefCell<EntityStates>,
    debug: bool,
    metrics: Option<&'static dyn MetricsSink>,
    access: Option<AccessPredicate>,
}

impl Session {
    #[must_use]
    pub fn new(
        catalog: Arc<MetadataCatalog>,
        plans: Arc<FetchPlanRegistry>,
        loader: Arc<dyn Loader>,
    ) -> Self {
        let states = RefCell::new(EntityStates::new(catalog.clone()));

        Self {
            catalog,
            plans,
            loader,
            states,
            debug: false,
            metrics: None,
            access: None,
        }
    }

    // ------------------------------------------------------------------
    // Policy (fluent)
    // ------------------------------------------------------------------

    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Install the pruning policy applied to every built plan before it
    /// reaches the loader.
    #[must_use]
    pub fn access_policy(mut self, is_allowed: impl Fn(&str, &str) -> bool + 'static) -> Self {
        self.access = Some(Box::new(is_allowed));
        self
    }

    // ------------------------------------------------------------------
    // Shared-state accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn catalog(&self) -> &MetadataCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn plans(&self) -> &FetchPlanRegistry {
        &self.plans
    }

    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    pub(crate) fn access_predicate(&self) -> Option<&(dyn Fn(&str, &str) -> bool)> {
        self.access.as_deref()
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        if let Some(sink) = self.metrics {
            with_metrics_sink(sink, f)
        } else {
            f()
        }
    }

    /// Borrow this session's load-state tracker.
    pub fn with_states<R>(&self, f: impl FnOnce(&mut EntityStates) -> R) -> R {
        f(&mut self.states.borrow_mut())
    }

    // ------------------------------------------------------------------
    // Load entry points (fluent)
    // ------------------------------------------------------------------

    #[must_use]
    pub fn load(&self, entity: impl Into<String>) -> FluentLoadRequest<'_> {
        FluentLoadRequest::new(self, entity.into())
    }

    #[must_use]
    pub fn load_by_query(&self, entity: impl Into<String>) -> FluentLoadRequest<'_> {
        FluentLoadRequest::new(self, entity.into())
    }

    pub(crate) fn run_load(&self, request: &LoadRequest) -> Result<Response, Error> {
        let keys = self.with_metrics(|| {
            let mut states = self.states.borrow_mut();
            self.loader.execute(request, &mut states)
        })?;

        Ok(Response::new(request.entity().to_string(), keys))
    }

    // ------------------------------------------------------------------
    // Lifecycle pass-throughs
    // ------------------------------------------------------------------

    /// Track a freshly constructed instance.
    pub fn register_new(&self, key: InstanceKey) {
        self.with_states(|states| states.register_new(key));
    }

    /// Persist a `New` instance.
    pub fn persist(&self, key: &InstanceKey) -> Result<(), Error> {
        self.with_metrics(|| self.with_states(|states| states.persist(key)))?;
        Ok(())
    }

    /// Remove an instance (soft keeps the record, hard evicts it).
    pub fn remove(&self, key: &InstanceKey, mode: RemoveMode) -> Result<(), Error> {
        self.with_metrics(|| self.with_states(|states| states.remove(key, mode)))?;
        Ok(())
    }

    /// Re-attach a detached record.
    pub fn merge_detached(&self, key: InstanceKey, record: &LoadRecord) -> Result<(), Error> {
        self.with_metrics(|| self.with_states(|states| states.merge_detached(key, record)))?;
        Ok(())
    }

    /// End of owning scope: detach every surviving managed record.
    pub fn detach_all(&self) {
        self.with_metrics(|| self.with_states(EntityStates::detach_all));
    }

    /// Drop one record from tracking, returning it.
    pub fn evict(&self, key: &InstanceKey) -> Option<LoadRecord> {
        self.with_states(|states| states.evict(key))
    }

    /// True iff the attribute is safe to read on the tracked instance.
    #[must_use]
    pub fn is_loaded(&self, key: &InstanceKey, attribute: &str) -> bool {
        self.with_states(|states| states.is_loaded(key, attribute))
    }

    /// Guarded attribute access: fails with a not-loaded error when the
    /// attribute sits outside the instance's loaded set and no fallback
    /// fetch is configured.
    pub fn require_loaded(&self, key: &InstanceKey, attribute: &str) -> Result<(), Error> {
        if self.is_loaded(key, attribute) {
            return Ok(());
        }

        Err(StateError::NotLoaded {
            key: key.clone(),
            attribute: attribute.to_string(),
        }
        .into())
    }
}

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::InstanceKey,
    model::{EntityModel, MetadataCatalog, MetadataError},
    obs::{Coverage, PlanEvent, sink},
    plan::PlanRef,
    state::{LifecycleState, LoadRecord, RemoveMode},
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// StateError
///

#[derive(Debug, ThisError)]
pub enum StateError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("instance '{0}' is not tracked")]
    NotTracked(InstanceKey),

    #[error("attribute '{attribute}' on instance '{key}' is not loaded")]
    NotLoaded { key: InstanceKey, attribute: String },

    #[error("instance '{key}' in state {state} cannot {action}")]
    InvalidTransition {
        key: InstanceKey,
        state: LifecycleState,
        action: &'static str,
    },

    #[error("plan for entity '{found}' cannot hydrate an instance of entity '{expected}'")]
    EntityMismatch { expected: String, found: String },
}

impl StateError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Metadata(err) => err.class(),
            Self::NotTracked(_) => ErrorClass::NotFound,
            Self::NotLoaded { .. } | Self::InvalidTransition { .. } => ErrorClass::Conflict,
            Self::EntityMismatch { .. } => ErrorClass::Unsupported,
        }
    }
}

impl From<StateError> for InternalError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Metadata(err) => err.into(),
            other => Self::new(other.class(), ErrorOrigin::State, other.to_string()),
        }
    }
}

///
/// EntityStates
///
/// Session-scoped load-state tracker: one record per touched instance.
/// Owned by a single request/session; concurrent mutation is the caller's
/// bug, so the tracker is a plain value with no interior locking.
///

#[derive(Debug)]
pub struct EntityStates {
    catalog: Arc<MetadataCatalog>,
    records: HashMap<InstanceKey, LoadRecord>,
}

impl EntityStates {
    #[must_use]
    pub fn new(catalog: Arc<MetadataCatalog>) -> Self {
        Self {
            catalog,
            records: HashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &InstanceKey) -> Option<&LoadRecord> {
        self.records.get(key)
    }

    /// Track a freshly constructed, never-persisted instance.
    pub fn register_new(&mut self, key: InstanceKey) {
        self.records.insert(key, LoadRecord::new(LifecycleState::New));
    }

    /// Record a successful hydration of `key` under the given plan node.
    ///
    /// Loaded attributes are the plan's property names plus the system
    /// properties. Full coverage of the declared attributes, or a plan with
    /// the partial flag off, yields `ManagedFull`; anything else is
    /// `ManagedPartial`. Re-hydrating a managed instance unions into its
    /// existing record.
    pub fn register_hydrated(
        &mut self,
        key: InstanceKey,
        plan: PlanRef<'_>,
    ) -> Result<(), StateError> {
        if plan.entity() != key.entity {
            return Err(StateError::EntityMismatch {
                expected: key.entity,
                found: plan.entity().to_string(),
            });
        }

        let model = self.catalog.entity(&key.entity)?;

        let mut loaded: BTreeSet<String> = plan
            .property_names()
            .map(ToString::to_string)
            .collect();
        for prop in model.system_properties() {
            loaded.insert(prop.name.clone());
        }

        if let Some(existing) = self.records.get(&key) {
            if existing.state.is_managed() {
                loaded.extend(existing.loaded.iter().cloned());
            }
        }

        let full = !plan.load_partial() || covers_all(model, &loaded);
        let state = if full {
            LifecycleState::ManagedFull
        } else {
            LifecycleState::ManagedPartial
        };

        sink::record(PlanEvent::Hydrated {
            entity: &key.entity,
            coverage: if full {
                Coverage::Full
            } else {
                Coverage::Partial
            },
        });

        self.records.insert(key, LoadRecord { state, loaded });
        Ok(())
    }

    /// Record an explicit re-fetch of one attribute.
    ///
    /// Promotes `ManagedPartial` to `ManagedFull` once every declared
    /// attribute is loaded.
    pub fn mark_loaded(&mut self, key: &InstanceKey, attribute: &str) -> Result<(), StateError> {
        let model = self.catalog.entity(&key.entity)?;
        if !model.contains(attribute) {
            return Err(MetadataError::UnknownProperty {
                entity: key.entity.clone(),
                property: attribute.to_string(),
            }
            .into());
        }

        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StateError::NotTracked(key.clone()))?;

        match record.state {
            LifecycleState::Detached | LifecycleState::Removed => {
                return Err(StateError::InvalidTransition {
                    key: key.clone(),
                    state: record.state,
                    action: "load attributes",
                });
            }
            LifecycleState::New
            | LifecycleState::ManagedFull
            | LifecycleState::ManagedPartial => {}
        }

        record.loaded.insert(attribute.to_string());

        if record.state == LifecycleState::ManagedPartial && covers_all(model, &record.loaded) {
            record.state = LifecycleState::ManagedFull;
            sink::record(PlanEvent::Transition { entity: &key.entity });
        }

        Ok(())
    }

    /// Persist a `New` instance: attributes set at construction time are all
    /// considered loaded.
    pub fn persist(&mut self, key: &InstanceKey) -> Result<(), StateError> {
        let model = self.catalog.entity(&key.entity)?;

        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StateError::NotTracked(key.clone()))?;
        if record.state != LifecycleState::New {
            return Err(StateError::InvalidTransition {
                key: key.clone(),
                state: record.state,
                action: "persist",
            });
        }

        record.state = LifecycleState::ManagedFull;
        record.loaded = model.property_names().map(ToString::to_string).collect();
        sink::record(PlanEvent::Transition { entity: &key.entity });

        Ok(())
    }

    /// Re-attach a detached record as a fresh managed one, copying its
    /// loaded attributes.
    pub fn merge_detached(
        &mut self,
        key: InstanceKey,
        detached: &LoadRecord,
    ) -> Result<(), StateError> {
        if detached.state != LifecycleState::Detached {
            return Err(StateError::InvalidTransition {
                key,
                state: detached.state,
                action: "merge",
            });
        }

        let model = self.catalog.entity(&key.entity)?;
        let loaded = detached.loaded.clone();
        let state = if covers_all(model, &loaded) {
            LifecycleState::ManagedFull
        } else {
            LifecycleState::ManagedPartial
        };

        sink::record(PlanEvent::Transition { entity: &key.entity });
        self.records.insert(key, LoadRecord { state, loaded });

        Ok(())
    }

    /// Remove an instance. Soft removal keeps the record; hard removal
    /// evicts it from tracking.
    pub fn remove(&mut self, key: &InstanceKey, mode: RemoveMode) -> Result<(), StateError> {
        match mode {
            RemoveMode::Soft => {
                let record = self
                    .records
                    .get_mut(key)
                    .ok_or_else(|| StateError::NotTracked(key.clone()))?;
                record.state = LifecycleState::Removed;
            }
            RemoveMode::Hard => {
                self.records
                    .remove(key)
                    .ok_or_else(|| StateError::NotTracked(key.clone()))?;
            }
        }

        sink::record(PlanEvent::Transition { entity: &key.entity });
        Ok(())
    }

    /// End of owning scope: every surviving managed record becomes detached.
    pub fn detach_all(&mut self) {
        for (key, record) in &mut self.records {
            if record.state.is_managed() {
                record.state = LifecycleState::Detached;
                sink::record(PlanEvent::Transition { entity: &key.entity });
            }
        }
    }

    /// Drop one record from tracking, returning it.
    pub fn evict(&mut self, key: &InstanceKey) -> Option<LoadRecord> {
        self.records.remove(key)
    }

    /// True iff the attribute is safe to read on the tracked instance.
    /// Untracked instances are never considered loaded.
    #[must_use]
    pub fn is_loaded(&self, key: &InstanceKey, attribute: &str) -> bool {
        self.records
            .get(key)
            .is_some_and(|record| record.is_loaded(attribute))
    }
}

fn covers_all(model: &EntityModel, loaded: &BTreeSet<String>) -> bool {
    model.property_names().all(|name| loaded.contains(name))
}

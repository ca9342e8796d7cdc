use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::MetadataCatalog,
    plan::{FetchPlan, FetchPlanBuilder},
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error as ThisError;

///
/// Well-known preset names
///

pub const PLAN_MINIMAL: &str = "minimal";
pub const PLAN_LOCAL: &str = "local";
pub const PLAN_BASE: &str = "base";
pub const PLAN_INSTANCE_NAME: &str = "instance-name";

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("plan '{name}' for entity '{entity}' not found")]
    PlanNotFound { entity: String, name: String },

    #[error("plan '{name}' for entity '{entity}' already registered")]
    PlanAlreadyRegistered { entity: String, name: String },
}

impl RegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::PlanNotFound { .. } => ErrorClass::NotFound,
            Self::PlanAlreadyRegistered { .. } => ErrorClass::InvariantViolation,
        }
    }
}

impl From<RegistryError> for InternalError {
    fn from(err: RegistryError) -> Self {
        Self::new(err.class(), ErrorOrigin::Registry, err.to_string())
    }
}

///
/// FetchPlanRegistry
///
/// Process-wide store of named, pre-declared plans keyed by entity and plan
/// name. Single-writer during startup; afterwards shared immutably, so
/// concurrent lookup needs no locking.
///

#[derive(Debug, Default)]
pub struct FetchPlanRegistry {
    plans: HashMap<(String, String), Arc<FetchPlan>>,
}

impl FetchPlanRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one named plan. Duplicate (entity, name) pairs are rejected.
    pub fn register(
        &mut self,
        entity: impl Into<String>,
        name: impl Into<String>,
        plan: FetchPlan,
    ) -> Result<(), RegistryError> {
        let key = (entity.into(), name.into());
        if self.plans.contains_key(&key) {
            return Err(RegistryError::PlanAlreadyRegistered {
                entity: key.0,
                name: key.1,
            });
        }

        self.plans.insert(key, Arc::new(plan));
        Ok(())
    }

    /// Look up a named plan.
    pub fn resolve(&self, entity: &str, name: &str) -> Result<Arc<FetchPlan>, RegistryError> {
        self.plans
            .get(&(entity.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| RegistryError::PlanNotFound {
                entity: entity.to_string(),
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, entity: &str, name: &str) -> bool {
        self.plans
            .contains_key(&(entity.to_string(), name.to_string()))
    }

    /// Iterate registered plans as ((entity, name), plan) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&(String, String), &Arc<FetchPlan>)> {
        self.plans.iter()
    }

    /// Derive and register the standard presets for every cataloged entity.
    ///
    /// - `minimal`: system properties only.
    /// - `instance-name`: display properties (plus system).
    /// - `local`: every non-system scalar property.
    /// - `base`: union of `local` and `instance-name`.
    pub fn register_presets(&mut self, catalog: &MetadataCatalog) -> Result<(), InternalError> {
        for model in catalog.iter() {
            let entity = model.name.as_str();

            let minimal = FetchPlanBuilder::new(catalog, entity)?.build()?;
            self.register(entity, PLAN_MINIMAL, minimal)?;

            let mut instance_name = FetchPlanBuilder::new(catalog, entity)?;
            for display in &model.display_properties {
                instance_name = instance_name.add_property(display)?;
            }
            self.register(entity, PLAN_INSTANCE_NAME, instance_name.build()?)?;

            let mut local = FetchPlanBuilder::new(catalog, entity)?;
            for prop in model.local_properties() {
                local = local.add_property(&prop.name)?;
            }
            self.register(entity, PLAN_LOCAL, local.build()?)?;

            let mut base = FetchPlanBuilder::new(catalog, entity)?;
            for prop in model.local_properties() {
                base = base.add_property(&prop.name)?;
            }
            for display in &model.display_properties {
                base = base.add_property(display)?;
            }
            self.register(entity, PLAN_BASE, base.build()?)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::test_catalog;

    fn minimal_plan(catalog: &MetadataCatalog) -> FetchPlan {
        FetchPlanBuilder::new(catalog, "customer")
            .expect("customer should be declared")
            .build()
            .expect("empty plan should build")
    }

    #[test]
    fn duplicate_plan_registration_is_rejected() {
        let catalog = test_catalog();
        let mut registry = FetchPlanRegistry::new();

        registry
            .register("customer", "summary", minimal_plan(&catalog))
            .expect("first registration should succeed");
        let err = registry
            .register("customer", "summary", minimal_plan(&catalog))
            .expect_err("duplicate registration should fail");

        assert!(
            matches!(err, RegistryError::PlanAlreadyRegistered { entity, name }
                if entity == "customer" && name == "summary")
        );
    }

    #[test]
    fn missing_plan_lookup_fails_with_entity_and_name() {
        let registry = FetchPlanRegistry::new();
        let err = registry
            .resolve("customer", "summary")
            .expect_err("missing plan should fail lookup");

        assert!(
            matches!(err, RegistryError::PlanNotFound { entity, name }
                if entity == "customer" && name == "summary")
        );
    }

    #[test]
    fn presets_cover_minimal_local_base_and_instance_name() {
        let catalog = test_catalog();
        let mut registry = FetchPlanRegistry::new();
        registry
            .register_presets(&catalog)
            .expect("preset derivation should succeed");

        let minimal = registry
            .resolve("customer", PLAN_MINIMAL)
            .expect("minimal preset should exist");
        let names: Vec<&str> = minimal.root().property_names().collect();
        assert_eq!(
            names,
            vec!["id", "version", "deleted_at"],
            "minimal preset should carry system properties only"
        );

        let local = registry
            .resolve("customer", PLAN_LOCAL)
            .expect("local preset should exist");
        assert!(local.contains_property("name"));
        assert!(local.contains_property("email"));
        assert!(local.contains_property("status"));
        assert!(
            !local.contains_property("owner"),
            "local preset should not select references"
        );

        let instance_name = registry
            .resolve("customer", PLAN_INSTANCE_NAME)
            .expect("instance-name preset should exist");
        assert!(instance_name.contains_property("name"));
        assert!(!instance_name.contains_property("email"));

        let base = registry
            .resolve("customer", PLAN_BASE)
            .expect("base preset should exist");
        assert!(base.contains_property("name"));
        assert!(base.contains_property("email"));
    }
}

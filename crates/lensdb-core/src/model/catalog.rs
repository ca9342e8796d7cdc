use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{EntityModel, PropertyModel},
};
use std::collections::HashMap;
use thiserror::Error as ThisError;

///
/// MetadataError
///

#[derive(Debug, ThisError)]
pub enum MetadataError {
    #[error("entity '{0}' not found")]
    EntityNotFound(String),

    #[error("entity '{0}' already registered")]
    EntityAlreadyRegistered(String),

    #[error("unknown property '{property}' on entity '{entity}'")]
    UnknownProperty { entity: String, property: String },

    #[error("property '{property}' on entity '{entity}' is not a reference")]
    NotReference { entity: String, property: String },

    #[error("property '{property}' on entity '{entity}' is not a scalar")]
    NotScalar { entity: String, property: String },

    #[error("reference '{property}' on entity '{entity}' declares no target entity")]
    MissingTarget { entity: String, property: String },

    #[error("empty property path on entity '{0}'")]
    EmptyPath(String),
}

impl MetadataError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::EntityNotFound(_) | Self::UnknownProperty { .. } => ErrorClass::NotFound,
            Self::EntityAlreadyRegistered(_) => ErrorClass::InvariantViolation,
            Self::NotReference { .. } | Self::NotScalar { .. } | Self::EmptyPath(_) => {
                ErrorClass::Unsupported
            }
            Self::MissingTarget { .. } => ErrorClass::Internal,
        }
    }
}

impl From<MetadataError> for InternalError {
    fn from(err: MetadataError) -> Self {
        Self::new(err.class(), ErrorOrigin::Metadata, err.to_string())
    }
}

///
/// PathStep
///
/// One resolved segment of a dotted path: the entity the segment is declared
/// on and the declared property it names.
///

#[derive(Clone, Copy, Debug)]
pub struct PathStep<'a> {
    pub entity: &'a str,
    pub property: &'a PropertyModel,
}

///
/// MetadataCatalog
///
/// In-memory descriptor registry. Single-writer during startup, immutable
/// and shared by reference afterwards.
///

#[derive(Debug, Default)]
pub struct MetadataCatalog {
    entities: HashMap<String, EntityModel>,
}

impl MetadataCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entity model. Duplicate names are rejected.
    pub fn register(&mut self, entity: EntityModel) -> Result<(), MetadataError> {
        if self.entities.contains_key(&entity.name) {
            return Err(MetadataError::EntityAlreadyRegistered(entity.name));
        }

        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Look up an entity model by name.
    pub fn entity(&self, name: &str) -> Result<&EntityModel, MetadataError> {
        self.entities
            .get(name)
            .ok_or_else(|| MetadataError::EntityNotFound(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Ordered declared properties for an entity.
    pub fn list_properties(&self, entity: &str) -> Result<&[PropertyModel], MetadataError> {
        Ok(&self.entity(entity)?.properties)
    }

    /// Iterate registered entity models.
    pub fn iter(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities.values()
    }

    /// Resolve a dotted path against declared metadata.
    ///
    /// Every non-terminal segment must be a declared reference with a
    /// registered target; any miss is a hard error, never a silent skip.
    pub fn resolve_path(&self, entity: &str, path: &str) -> Result<Vec<PathStep<'_>>, MetadataError> {
        if path.is_empty() {
            return Err(MetadataError::EmptyPath(entity.to_string()));
        }

        let segments: Vec<&str> = path.split('.').collect();
        let mut steps = Vec::with_capacity(segments.len());
        let mut current = self.entity(entity)?;

        for (pos, segment) in segments.iter().enumerate() {
            let property = current.property(segment).ok_or_else(|| {
                MetadataError::UnknownProperty {
                    entity: current.name.clone(),
                    property: (*segment).to_string(),
                }
            })?;

            steps.push(PathStep {
                entity: current.name.as_str(),
                property,
            });

            if pos + 1 == segments.len() {
                break;
            }

            if !property.kind.is_reference() {
                return Err(MetadataError::NotReference {
                    entity: current.name.clone(),
                    property: property.name.clone(),
                });
            }
            let target = property
                .target
                .as_deref()
                .ok_or_else(|| MetadataError::MissingTarget {
                    entity: current.name.clone(),
                    property: property.name.clone(),
                })?;

            current = self.entity(target)?;
        }

        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::test_catalog;

    #[test]
    fn duplicate_entity_registration_is_rejected() {
        let mut catalog = MetadataCatalog::new();
        catalog
            .register(EntityModel::new("customer"))
            .expect("first registration should succeed");

        let err = catalog
            .register(EntityModel::new("customer"))
            .expect_err("duplicate registration should fail");
        assert!(matches!(err, MetadataError::EntityAlreadyRegistered(_)));
    }

    #[test]
    fn resolve_path_walks_references_to_terminal_scalar() {
        let catalog = test_catalog();
        let steps = catalog
            .resolve_path("customer", "owner.address.city")
            .expect("declared path should resolve");

        let names: Vec<&str> = steps.iter().map(|s| s.property.name.as_str()).collect();
        assert_eq!(names, vec!["owner", "address", "city"]);
        assert_eq!(steps[0].entity, "customer");
        assert_eq!(steps[1].entity, "employee");
        assert_eq!(steps[2].entity, "address");
    }

    #[test]
    fn resolve_path_fails_on_unknown_segment() {
        let catalog = test_catalog();
        let err = catalog
            .resolve_path("customer", "owner.nickname")
            .expect_err("undeclared segment should fail resolution");

        assert!(
            matches!(err, MetadataError::UnknownProperty { entity, property }
                if entity == "employee" && property == "nickname"),
            "failure should name the entity and missing segment"
        );
    }

    #[test]
    fn resolve_path_rejects_traversal_through_scalar() {
        let catalog = test_catalog();
        let err = catalog
            .resolve_path("customer", "email.domain")
            .expect_err("scalar mid-segment should fail resolution");

        assert!(matches!(err, MetadataError::NotReference { .. }));
    }

    #[test]
    fn resolve_path_rejects_empty_path() {
        let catalog = test_catalog();
        let err = catalog
            .resolve_path("customer", "")
            .expect_err("empty path should fail resolution");

        assert!(matches!(err, MetadataError::EmptyPath(_)));
    }

    #[test]
    fn list_properties_preserves_declaration_order() {
        let catalog = test_catalog();
        let names: Vec<&str> = catalog
            .list_properties("address")
            .expect("address should be registered")
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        assert_eq!(names, vec!["id", "city", "street", "zip"]);
    }
}

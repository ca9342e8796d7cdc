use crate::model::{PropertyKind, PropertyModel};
use serde::{Deserialize, Serialize};

///
/// EntityModel
/// Runtime model for one entity: ordered property list plus the display
/// attributes that make up its instance name.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EntityModel {
    /// Stable entity name used in plans, keys and registry lookups.
    pub name: String,

    /// Ordered property list (authoritative for plan construction).
    pub properties: Vec<PropertyModel>,

    /// Attributes composing the instance name (presentation identity).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_properties: Vec<String>,
}

impl EntityModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            display_properties: Vec::new(),
        }
    }

    /// Append one declared property.
    #[must_use]
    pub fn with_property(mut self, property: PropertyModel) -> Self {
        self.properties.push(property);
        self
    }

    /// Mark one property as part of the instance name.
    #[must_use]
    pub fn with_display(mut self, name: impl Into<String>) -> Self {
        self.display_properties.push(name.into());
        self
    }

    /// Look up a declared property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyModel> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Iterate the system properties in declaration order.
    pub fn system_properties(&self) -> impl Iterator<Item = &PropertyModel> {
        self.properties.iter().filter(|p| p.system)
    }

    /// Iterate the non-system scalar properties in declaration order.
    pub fn local_properties(&self) -> impl Iterator<Item = &PropertyModel> {
        self.properties
            .iter()
            .filter(|p| !p.system && p.kind == PropertyKind::Scalar)
    }

    /// Iterate every declared property name.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }
}

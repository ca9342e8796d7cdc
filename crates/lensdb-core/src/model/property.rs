use serde::{Deserialize, Serialize};

///
/// PropertyKind
///
/// Declared shape of one entity property.
/// References carry a target entity; scalars never do.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum PropertyKind {
    CollectionReference,
    Reference,
    Scalar,
}

impl PropertyKind {
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::Scalar)
    }

    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Reference | Self::CollectionReference)
    }
}

///
/// PropertyModel
/// Runtime property metadata used by plan construction and coverage checks.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PropertyModel {
    /// Property name as used in plans and dotted paths.
    pub name: String,

    /// Declared shape.
    pub kind: PropertyKind,

    /// Target entity for reference kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// System attribute: identifier, lock version, soft-delete marker, audit field.
    pub system: bool,
}

impl PropertyModel {
    /// Declare a plain scalar property.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar,
            target: None,
            system: false,
        }
    }

    /// Declare a system scalar (identifier, version, soft-delete marker).
    pub fn system(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar,
            target: None,
            system: true,
        }
    }

    /// Declare a single-valued reference to another entity.
    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Reference,
            target: Some(target.into()),
            system: false,
        }
    }

    /// Declare a collection reference to another entity.
    pub fn collection(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::CollectionReference,
            target: Some(target.into()),
            system: false,
        }
    }
}

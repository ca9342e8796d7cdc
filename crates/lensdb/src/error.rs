use derive_more::Display;
use lensdb_core::{
    error::{ErrorOrigin as CoreErrorOrigin, InternalError},
    model::MetadataError,
    plan::{PlanError, RegistryError},
    state::StateError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(ErrorKind::Internal, err.origin.into(), err.message)
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        let kind = match &err {
            MetadataError::EntityNotFound(_) => ErrorKind::Plan(PlanErrorKind::UnknownEntity),
            MetadataError::UnknownProperty { .. } => {
                ErrorKind::Plan(PlanErrorKind::UnknownProperty)
            }
            MetadataError::NotReference { .. } => ErrorKind::Plan(PlanErrorKind::NotReference),
            MetadataError::NotScalar { .. } => ErrorKind::Plan(PlanErrorKind::NotScalar),
            MetadataError::EmptyPath(_) => ErrorKind::Plan(PlanErrorKind::InvalidPath),
            MetadataError::EntityAlreadyRegistered(_) | MetadataError::MissingTarget { .. } => {
                ErrorKind::Internal
            }
        };

        Self::new(kind, ErrorOrigin::Metadata, err.to_string())
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        let kind = match &err {
            RegistryError::PlanNotFound { .. } => {
                ErrorKind::Plan(PlanErrorKind::UnknownNamedPlan)
            }
            RegistryError::PlanAlreadyRegistered { .. } => ErrorKind::Internal,
        };

        Self::new(kind, ErrorOrigin::Registry, err.to_string())
    }
}

impl From<PlanError> for Error {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Metadata(err) => err.into(),
            PlanError::Registry(err) => err.into(),
            other => Self::new(
                ErrorKind::Plan(PlanErrorKind::Conflict),
                ErrorOrigin::Plan,
                other.to_string(),
            ),
        }
    }
}

impl From<StateError> for Error {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Metadata(inner) => inner.into(),
            other => {
                let kind = match &other {
                    StateError::NotTracked(_) => StateErrorKind::NotTracked,
                    StateError::NotLoaded { .. } => StateErrorKind::NotLoaded,
                    _ => StateErrorKind::InvalidTransition,
                };

                Self::new(ErrorKind::State(kind), ErrorOrigin::State, other.to_string())
            }
        }
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Plan(PlanErrorKind),
    State(StateErrorKind),
    Load(LoadErrorKind),

    /// The caller cannot remediate this.
    Internal,
}

///
/// PlanErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PlanErrorKind {
    /// Entity name not declared in the metadata catalog.
    UnknownEntity,

    /// Property name not declared on the entity.
    UnknownProperty,

    /// A reference was selected where a scalar is required.
    NotScalar,

    /// A scalar was selected where a reference is required.
    NotReference,

    /// Dotted path is malformed.
    InvalidPath,

    /// Named plan missing from the registry.
    UnknownNamedPlan,

    /// Merge sources disagree on entity or property shape.
    Conflict,
}

///
/// StateErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StateErrorKind {
    /// Instance is not tracked by this session.
    NotTracked,

    /// Attribute access outside the loaded set of a partial instance.
    NotLoaded,

    /// Operation is not legal in the instance's lifecycle state.
    InvalidTransition,
}

///
/// LoadErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum LoadErrorKind {
    /// Valid request, but no instance matched.
    NotFound,

    /// Request expected one instance but matched many.
    NotUnique,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Loader,
    Metadata,
    Plan,
    Prune,
    Registry,
    State,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Loader => Self::Loader,
            CoreErrorOrigin::Metadata => Self::Metadata,
            CoreErrorOrigin::Plan => Self::Plan,
            CoreErrorOrigin::Prune => Self::Prune,
            CoreErrorOrigin::Registry => Self::Registry,
            CoreErrorOrigin::State => Self::State,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lensdb_core::error::{ErrorClass, ErrorOrigin as CoreOrigin};

    #[test]
    fn metadata_errors_map_to_plan_kinds() {
        let err: Error = MetadataError::EntityNotFound("ghost".to_string()).into();
        assert_eq!(err.kind, ErrorKind::Plan(PlanErrorKind::UnknownEntity));
        assert_eq!(err.origin, ErrorOrigin::Metadata);
        assert!(err.message.contains("ghost"));

        let err: Error = MetadataError::NotScalar {
            entity: "customer".to_string(),
            property: "owner".to_string(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Plan(PlanErrorKind::NotScalar));
    }

    #[test]
    fn registry_misses_map_to_unknown_named_plan() {
        let err: Error = RegistryError::PlanNotFound {
            entity: "customer".to_string(),
            name: "summary".to_string(),
        }
        .into();

        assert_eq!(err.kind, ErrorKind::Plan(PlanErrorKind::UnknownNamedPlan));
        assert_eq!(err.origin, ErrorOrigin::Registry);
    }

    #[test]
    fn state_errors_keep_their_metadata_causes() {
        let err: Error = StateError::Metadata(MetadataError::UnknownProperty {
            entity: "customer".to_string(),
            property: "nickname".to_string(),
        })
        .into();
        assert_eq!(err.kind, ErrorKind::Plan(PlanErrorKind::UnknownProperty));
        assert_eq!(err.origin, ErrorOrigin::Metadata);
    }

    #[test]
    fn internal_errors_preserve_their_origin() {
        let err: Error =
            InternalError::new(ErrorClass::Internal, CoreOrigin::Loader, "backend down").into();

        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.origin, ErrorOrigin::Loader);
        assert_eq!(err.to_string(), "backend down");
    }
}

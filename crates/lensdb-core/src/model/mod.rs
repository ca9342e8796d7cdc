//! Metadata descriptor registry: declared entities, their properties, and
//! dotted-path resolution. The plan builder consumes this module strictly
//! through [`MetadataCatalog::list_properties`], [`MetadataCatalog::entity`],
//! and [`MetadataCatalog::resolve_path`].

mod catalog;
mod entity;
mod property;

pub use catalog::{MetadataCatalog, MetadataError, PathStep};
pub use entity::EntityModel;
pub use property::{PropertyKind, PropertyModel};

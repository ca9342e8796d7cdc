use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{MetadataCatalog, MetadataError, PropertyKind},
    obs::{PlanEvent, sink},
    plan::{
        FetchPlan, NodeId, PlanNode, PropertySpec,
        registry::{FetchPlanRegistry, RegistryError},
    },
};
use std::collections::{HashMap, HashSet};
use thiserror::Error as ThisError;

///
/// PlanError
///

#[derive(Debug, ThisError)]
pub enum PlanError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("plan for entity '{found}' cannot merge into a plan for entity '{expected}'")]
    EntityMismatch { expected: String, found: String },

    #[error("property '{property}' on entity '{entity}' is selected with conflicting kinds")]
    KindConflict { entity: String, property: String },
}

impl PlanError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Metadata(err) => err.class(),
            Self::Registry(err) => err.class(),
            Self::EntityMismatch { .. } => ErrorClass::Unsupported,
            Self::KindConflict { .. } => ErrorClass::InvariantViolation,
        }
    }
}

impl From<PlanError> for InternalError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Metadata(err) => err.into(),
            PlanError::Registry(err) => err.into(),
            other => Self::new(other.class(), ErrorOrigin::Plan, other.to_string()),
        }
    }
}

///
/// BuilderSpec
/// Mutable counterpart of `PropertySpec`; reference specs always carry a
/// nested arena slot.
///

#[derive(Clone, Debug)]
enum BuilderSpec {
    Scalar {
        name: String,
    },
    Reference {
        name: String,
        kind: PropertyKind,
        nested: usize,
    },
}

impl BuilderSpec {
    fn name(&self) -> &str {
        match self {
            Self::Scalar { name } | Self::Reference { name, .. } => name,
        }
    }
}

///
/// BuilderNode
///

#[derive(Clone, Debug)]
struct BuilderNode {
    entity: String,
    specs: Vec<BuilderSpec>,
    load_partial: bool,
}

impl BuilderNode {
    fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            specs: Vec::new(),
            load_partial: true,
        }
    }

    fn find(&self, name: &str) -> Option<&BuilderSpec> {
        self.specs.iter().find(|s| s.name() == name)
    }
}

///
/// FetchPlanBuilder
///
/// Mutable construction and merge surface for fetch-plan graphs. All
/// validation happens at add time against the metadata catalog; the builder
/// is private until `build()` returns, so a failed construction publishes
/// nothing.
///

#[derive(Debug)]
pub struct FetchPlanBuilder<'a> {
    catalog: &'a MetadataCatalog,
    nodes: Vec<BuilderNode>,
    root: usize,
    include_system: bool,
}

impl<'a> FetchPlanBuilder<'a> {
    /// Start a plan for one entity; fails if the entity is not declared.
    pub fn new(catalog: &'a MetadataCatalog, entity: impl AsRef<str>) -> Result<Self, PlanError> {
        let entity = entity.as_ref();
        catalog.entity(entity)?;

        Ok(Self {
            catalog,
            nodes: vec![BuilderNode::new(entity)],
            root: 0,
            include_system: true,
        })
    }

    /// Exclude the implicit system properties from the built plan.
    ///
    /// Downstream optimistic-locking and soft-delete logic assumes their
    /// presence; callers opting out own that trade.
    #[must_use]
    pub const fn without_system_properties(mut self) -> Self {
        self.include_system = false;
        self
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.nodes[self.root].entity
    }

    // ------------------------------------------------------------------
    // Fluent surface (consume self, validate on entry)
    // ------------------------------------------------------------------

    /// Select a scalar property on the root node. Idempotent.
    pub fn add_property(mut self, name: impl AsRef<str>) -> Result<Self, PlanError> {
        let root = self.root;
        self.scalar_on(root, name.as_ref())?;
        Ok(self)
    }

    /// Select (or extend) a reference property on the root node.
    ///
    /// When the reference was already selected, the scope operates on the
    /// existing nested node, so repeated calls union their sub-properties.
    pub fn add_reference<F>(mut self, name: impl AsRef<str>, configure: F) -> Result<Self, PlanError>
    where
        F: FnOnce(&mut PlanScope<'_, 'a>) -> Result<(), PlanError>,
    {
        let root = self.root;
        let nested = self.reference_on(root, name.as_ref(), &[])?;

        let mut scope = PlanScope {
            node: nested,
            stack: vec![root, nested],
            builder: &mut self,
        };
        configure(&mut scope)?;

        Ok(self)
    }

    /// Select a dotted path, auto-creating intermediate reference nodes.
    pub fn add_dotted_path(mut self, path: impl AsRef<str>) -> Result<Self, PlanError> {
        let root = self.root;
        self.dotted_on(root, path.as_ref(), &[root])?;
        Ok(self)
    }

    /// Merge a registry-resolved named plan for the root entity.
    pub fn add_named_plan(
        self,
        registry: &FetchPlanRegistry,
        name: impl AsRef<str>,
    ) -> Result<Self, PlanError> {
        let plan = registry.resolve(self.entity(), name.as_ref())?;
        self.add_plan(&plan)
    }

    /// Structurally merge an already-built plan graph into this builder.
    ///
    /// Union semantics throughout: same scalar twice is a no-op, same
    /// reference twice unions the nested plans recursively. Symmetric in
    /// call order up to property insertion order.
    pub fn add_plan(mut self, plan: &FetchPlan) -> Result<Self, PlanError> {
        if plan.entity() != self.entity() {
            return Err(PlanError::EntityMismatch {
                expected: self.entity().to_string(),
                found: plan.entity().to_string(),
            });
        }

        let root = self.root;
        let mut mapping = HashMap::from([(plan.root_id().index(), root)]);
        let mut merged = HashSet::new();
        self.merge_from(root, plan, plan.root_id(), &mut mapping, &mut merged)?;

        Ok(self)
    }

    /// Set the partial-load flag on the root node.
    ///
    /// Merges resolve disagreement restrictively (partial wins); this setter
    /// is a direct override for the caller that knows better.
    #[must_use]
    pub fn load_partial(mut self, partial: bool) -> Self {
        self.nodes[self.root].load_partial = partial;
        self
    }

    /// Freeze the graph into an immutable plan.
    ///
    /// System properties are appended to every node unless the builder was
    /// constructed in exclusion mode. Arena nodes are emitted once each, so
    /// cyclic graphs freeze without recursion.
    pub fn build(self) -> Result<FetchPlan, PlanError> {
        let Self {
            catalog,
            nodes,
            root,
            include_system,
        } = self;

        let mut out = Vec::with_capacity(nodes.len());
        let mut total_properties: u64 = 0;

        for node in nodes {
            let mut properties: Vec<PropertySpec> = node
                .specs
                .iter()
                .map(|spec| match spec {
                    BuilderSpec::Scalar { name } => PropertySpec::scalar(name.clone()),
                    BuilderSpec::Reference { name, kind, nested } => PropertySpec {
                        name: name.clone(),
                        kind: *kind,
                        nested: Some(NodeId(*nested)),
                    },
                })
                .collect();

            if include_system {
                let model = catalog.entity(&node.entity)?;
                for prop in model.system_properties() {
                    // Reference-kind system attributes are never implicit.
                    if prop.kind.is_scalar() && !properties.iter().any(|p| p.name == prop.name) {
                        properties.push(PropertySpec::scalar(prop.name.clone()));
                    }
                }
            }

            total_properties += properties.len() as u64;
            out.push(PlanNode {
                entity: node.entity,
                properties,
                load_partial: node.load_partial,
            });
        }

        let plan = FetchPlan::new(out, NodeId(root));
        sink::record(PlanEvent::PlanBuilt {
            entity: plan.entity(),
            nodes: plan.node_count() as u64,
            properties: total_properties,
        });

        Ok(plan)
    }

    // ------------------------------------------------------------------
    // Arena operations
    // ------------------------------------------------------------------

    fn push_node(&mut self, entity: &str) -> usize {
        self.nodes.push(BuilderNode::new(entity));
        self.nodes.len() - 1
    }

    fn scalar_on(&mut self, node: usize, name: &str) -> Result<(), PlanError> {
        let catalog = self.catalog;
        let entity = self.nodes[node].entity.clone();

        let model = catalog.entity(&entity)?;
        let Some(prop) = model.property(name) else {
            return Err(MetadataError::UnknownProperty {
                entity,
                property: name.to_string(),
            }
            .into());
        };
        if prop.kind.is_reference() {
            return Err(MetadataError::NotScalar {
                entity,
                property: name.to_string(),
            }
            .into());
        }

        match self.nodes[node].find(name) {
            Some(BuilderSpec::Scalar { .. }) => Ok(()),
            Some(BuilderSpec::Reference { .. }) => Err(PlanError::KindConflict {
                entity,
                property: name.to_string(),
            }),
            None => {
                self.nodes[node].specs.push(BuilderSpec::Scalar {
                    name: name.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Add or reuse a reference spec on `node`, returning its nested slot.
    ///
    /// `stack` is the chain of nodes under construction in the current walk;
    /// a target entity recurring on it is reused by handle instead of grown,
    /// which is what turns self-referential paths into cycles.
    fn reference_on(
        &mut self,
        node: usize,
        name: &str,
        stack: &[usize],
    ) -> Result<usize, PlanError> {
        let catalog = self.catalog;
        let entity = self.nodes[node].entity.clone();

        let model = catalog.entity(&entity)?;
        let Some(prop) = model.property(name) else {
            return Err(MetadataError::UnknownProperty {
                entity,
                property: name.to_string(),
            }
            .into());
        };
        if !prop.kind.is_reference() {
            return Err(MetadataError::NotReference {
                entity,
                property: name.to_string(),
            }
            .into());
        }
        let target = prop
            .target
            .clone()
            .ok_or_else(|| MetadataError::MissingTarget {
                entity: entity.clone(),
                property: name.to_string(),
            })?;
        catalog.entity(&target)?;
        let kind = prop.kind;

        match self.nodes[node].find(name) {
            Some(BuilderSpec::Reference { nested, .. }) => Ok(*nested),
            Some(BuilderSpec::Scalar { .. }) => Err(PlanError::KindConflict {
                entity,
                property: name.to_string(),
            }),
            None => {
                let nested = match stack
                    .iter()
                    .rev()
                    .copied()
                    .find(|&n| self.nodes[n].entity == target)
                {
                    Some(in_progress) => in_progress,
                    None => self.push_node(&target),
                };

                self.nodes[node].specs.push(BuilderSpec::Reference {
                    name: name.to_string(),
                    kind,
                    nested,
                });
                Ok(nested)
            }
        }
    }

    fn dotted_on(&mut self, node: usize, path: &str, base_stack: &[usize]) -> Result<(), PlanError> {
        let catalog = self.catalog;
        let entity = self.nodes[node].entity.clone();

        // Resolve the whole path up front; a bad segment fails before any
        // arena mutation.
        let steps = catalog.resolve_path(&entity, path)?;
        let Some((terminal, inner)) = steps.split_last() else {
            return Ok(());
        };

        let mut stack = base_stack.to_vec();
        let mut current = node;
        for step in inner {
            current = self.reference_on(current, &step.property.name, &stack)?;
            stack.push(current);
        }

        self.scalar_on(current, &terminal.property.name)
    }

    /// Merge plan node `from` into builder node `into`.
    ///
    /// `mapping` keeps plan nodes materialized fresh in this merge aligned,
    /// so shared substructure and cycles survive; `merged` terminates
    /// revisits of a (plan node, builder node) pair.
    fn merge_from(
        &mut self,
        into: usize,
        plan: &FetchPlan,
        from: NodeId,
        mapping: &mut HashMap<usize, usize>,
        merged: &mut HashSet<(usize, usize)>,
    ) -> Result<(), PlanError> {
        if !merged.insert((from.index(), into)) {
            return Ok(());
        }

        let source = plan.node_at(from);
        if source.entity != self.nodes[into].entity {
            return Err(PlanError::EntityMismatch {
                expected: self.nodes[into].entity.clone(),
                found: source.entity.clone(),
            });
        }

        if source.load_partial {
            self.nodes[into].load_partial = true;
        }

        for spec in &source.properties {
            match spec.nested {
                None => match self.nodes[into].find(&spec.name) {
                    Some(BuilderSpec::Scalar { .. }) => {}
                    Some(BuilderSpec::Reference { .. }) => {
                        return Err(PlanError::KindConflict {
                            entity: self.nodes[into].entity.clone(),
                            property: spec.name.clone(),
                        });
                    }
                    None => {
                        self.nodes[into].specs.push(BuilderSpec::Scalar {
                            name: spec.name.clone(),
                        });
                    }
                },

                Some(nested_from) => {
                    let nested_into = match self.nodes[into].find(&spec.name) {
                        Some(BuilderSpec::Reference { nested, .. }) => *nested,
                        Some(BuilderSpec::Scalar { .. }) => {
                            return Err(PlanError::KindConflict {
                                entity: self.nodes[into].entity.clone(),
                                property: spec.name.clone(),
                            });
                        }
                        None => {
                            let target = match mapping.get(&nested_from.index()) {
                                Some(&existing) => existing,
                                None => {
                                    let fresh = self.push_node(&plan.node_at(nested_from).entity);
                                    mapping.insert(nested_from.index(), fresh);
                                    fresh
                                }
                            };
                            self.nodes[into].specs.push(BuilderSpec::Reference {
                                name: spec.name.clone(),
                                kind: spec.kind,
                                nested: target,
                            });
                            target
                        }
                    };

                    self.merge_from(nested_into, plan, nested_from, mapping, merged)?;
                }
            }
        }

        Ok(())
    }
}

///
/// PlanScope
///
/// Mutable view over one nested node during `add_reference` configuration.
/// Carries the ancestor chain so dotted paths inside the scope can close
/// cycles against nodes still under construction.
///

#[derive(Debug)]
pub struct PlanScope<'b, 'a> {
    builder: &'b mut FetchPlanBuilder<'a>,
    node: usize,
    stack: Vec<usize>,
}

impl<'a> PlanScope<'_, 'a> {
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.builder.nodes[self.node].entity
    }

    /// Select a scalar property on this node. Idempotent.
    pub fn add_property(&mut self, name: impl AsRef<str>) -> Result<&mut Self, PlanError> {
        self.builder.scalar_on(self.node, name.as_ref())?;
        Ok(self)
    }

    /// Select (or extend) a reference property on this node.
    pub fn add_reference<F>(
        &mut self,
        name: impl AsRef<str>,
        configure: F,
    ) -> Result<&mut Self, PlanError>
    where
        F: FnOnce(&mut PlanScope<'_, 'a>) -> Result<(), PlanError>,
    {
        let nested = self.builder.reference_on(self.node, name.as_ref(), &[])?;

        let mut stack = self.stack.clone();
        stack.push(nested);
        let mut scope = PlanScope {
            builder: &mut *self.builder,
            node: nested,
            stack,
        };
        configure(&mut scope)?;

        Ok(self)
    }

    /// Select a dotted path starting from this node.
    pub fn add_dotted_path(&mut self, path: impl AsRef<str>) -> Result<&mut Self, PlanError> {
        let stack = self.stack.clone();
        self.builder.dotted_on(self.node, path.as_ref(), &stack)?;
        Ok(self)
    }

    /// Set the partial-load flag on this node.
    pub fn load_partial(&mut self, partial: bool) -> &mut Self {
        self.builder.nodes[self.node].load_partial = partial;
        self
    }
}

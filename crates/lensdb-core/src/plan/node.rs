use crate::model::PropertyKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

///
/// NodeId
/// Handle into a plan arena. Stable within one plan, meaningless across plans.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// PropertySpec
///
/// One selected property on a plan node: a scalar leaf, or a reference
/// carrying the arena handle of its nested plan. The nested handle may point
/// back at the owning node or an ancestor, producing a genuine cycle.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PropertySpec {
    pub name: String,
    pub kind: PropertyKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<NodeId>,
}

impl PropertySpec {
    pub(crate) fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar,
            nested: None,
        }
    }
}

///
/// PlanNode
///
/// One entity's slice of a fetch plan. Property names are unique per node;
/// insertion order is kept for presentation and serialization but carries no
/// weight in equality.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlanNode {
    pub entity: String,
    pub properties: Vec<PropertySpec>,
    pub load_partial: bool,
}

impl PlanNode {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }
}

///
/// FetchPlan
///
/// Immutable fetch-plan graph: an arena of nodes plus the root handle.
/// Published plans are shared read-only (`Arc`) across requests; cycles are
/// index edges into the arena, so the encoding stays acyclic and serializes
/// cleanly.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FetchPlan {
    nodes: Vec<PlanNode>,
    root: NodeId,
}

impl FetchPlan {
    pub(crate) const fn new(nodes: Vec<PlanNode>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    #[must_use]
    pub fn root(&self) -> PlanRef<'_> {
        PlanRef {
            plan: self,
            node: self.root,
        }
    }

    #[must_use]
    pub const fn root_id(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node_at(&self, id: NodeId) -> &PlanNode {
        &self.nodes[id.0]
    }

    /// Root entity name.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.node_at(self.root).entity
    }

    /// True if the root node selects the named property.
    #[must_use]
    pub fn contains_property(&self, name: &str) -> bool {
        self.root().contains_property(name)
    }

    /// Nested plan cursor for a root reference property, if selected.
    #[must_use]
    pub fn nested(&self, name: &str) -> Option<PlanRef<'_>> {
        self.root().nested(name)
    }

    /// Root property specs in insertion order.
    #[must_use]
    pub fn properties(&self) -> &[PropertySpec] {
        &self.node_at(self.root).properties
    }
}

impl PartialEq for FetchPlan {
    fn eq(&self, other: &Self) -> bool {
        let mut seen = HashSet::new();
        nodes_equal(self, self.root, other, other.root, &mut seen)
    }
}

impl Eq for FetchPlan {}

/// Cycle-safe structural bisimulation over (left, right) node pairs.
///
/// A pair already under comparison is taken as equal; any real mismatch
/// reachable from it is found on another path through the graph.
fn nodes_equal(
    left: &FetchPlan,
    ln: NodeId,
    right: &FetchPlan,
    rn: NodeId,
    seen: &mut HashSet<(usize, usize)>,
) -> bool {
    if !seen.insert((ln.0, rn.0)) {
        return true;
    }

    let (a, b) = (left.node_at(ln), right.node_at(rn));
    if a.entity != b.entity
        || a.load_partial != b.load_partial
        || a.properties.len() != b.properties.len()
    {
        return false;
    }

    a.properties.iter().all(|pa| match b.property(&pa.name) {
        Some(pb) if pa.kind == pb.kind => match (pa.nested, pb.nested) {
            (None, None) => true,
            (Some(x), Some(y)) => nodes_equal(left, x, right, y, seen),
            _ => false,
        },
        _ => false,
    })
}

///
/// PlanRef
/// Borrowed cursor over one node of a plan graph.
///

#[derive(Clone, Copy, Debug)]
pub struct PlanRef<'a> {
    plan: &'a FetchPlan,
    node: NodeId,
}

impl<'a> PlanRef<'a> {
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn entity(&self) -> &'a str {
        &self.plan.node_at(self.node).entity
    }

    #[must_use]
    pub fn load_partial(&self) -> bool {
        self.plan.node_at(self.node).load_partial
    }

    #[must_use]
    pub fn properties(&self) -> &'a [PropertySpec] {
        &self.plan.node_at(self.node).properties
    }

    #[must_use]
    pub fn contains_property(&self, name: &str) -> bool {
        self.plan.node_at(self.node).property(name).is_some()
    }

    /// Cursor over the nested plan of a selected reference property.
    #[must_use]
    pub fn nested(&self, name: &str) -> Option<PlanRef<'a>> {
        self.plan
            .node_at(self.node)
            .property(name)
            .and_then(|spec| spec.nested)
            .map(|node| PlanRef {
                plan: self.plan,
                node,
            })
    }

    /// Property names in insertion order.
    pub fn property_names(&self) -> impl Iterator<Item = &'a str> {
        self.properties().iter().map(|p| p.name.as_str())
    }

    /// Structural equality against another cursor, cycle-safe.
    #[must_use]
    pub fn structurally_equal(&self, other: &PlanRef<'_>) -> bool {
        let mut seen = HashSet::new();
        nodes_equal(self.plan, self.node, other.plan, other.node, &mut seen)
    }
}

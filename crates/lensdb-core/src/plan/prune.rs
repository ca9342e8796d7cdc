use crate::{
    obs::{PlanEvent, sink},
    plan::{FetchPlan, NodeId, PlanNode},
};
use std::collections::HashMap;

///
/// Pruner
/// Single-walk copy of a plan graph minus the properties a policy denies.
///

struct Pruner<'a, F> {
    source: &'a FetchPlan,
    is_allowed: F,
    nodes: Vec<PlanNode>,
    mapping: HashMap<usize, usize>,
    removed: u64,
}

impl<F> Pruner<'_, F>
where
    F: Fn(&str, &str) -> bool,
{
    fn copy(&mut self, from: NodeId) -> NodeId {
        if let Some(&mapped) = self.mapping.get(&from.index()) {
            return NodeId(mapped);
        }

        // Insert the shell before descending so cycles map onto themselves.
        let source = self.source.node_at(from);
        let target = self.nodes.len();
        self.mapping.insert(from.index(), target);
        self.nodes.push(PlanNode {
            entity: source.entity.clone(),
            properties: Vec::new(),
            load_partial: source.load_partial,
        });

        let mut properties = Vec::with_capacity(source.properties.len());
        for spec in &source.properties {
            if !(self.is_allowed)(&source.entity, &spec.name) {
                // A denied reference drops its whole subtree; the predicate
                // never sees the children.
                self.removed += 1;
                continue;
            }

            let mut kept = spec.clone();
            kept.nested = spec.nested.map(|nested| self.copy(nested));
            properties.push(kept);
        }

        self.nodes[target].properties = properties;
        NodeId(target)
    }
}

/// Remove every property the predicate denies, returning a new plan.
///
/// The predicate sees (entity, property) pairs only and is treated as
/// authoritative; results are not cached beyond this single walk. Nodes
/// reachable only through denied references are not emitted.
pub fn prune(plan: &FetchPlan, is_allowed: impl Fn(&str, &str) -> bool) -> FetchPlan {
    let mut pruner = Pruner {
        source: plan,
        is_allowed,
        nodes: Vec::with_capacity(plan.node_count()),
        mapping: HashMap::new(),
        removed: 0,
    };

    let root = pruner.copy(plan.root_id());
    sink::record(PlanEvent::Pruned {
        entity: plan.entity(),
        removed: pruner.removed,
    });

    FetchPlan::new(pruner.nodes, root)
}

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::expression::ast::Program;
use crate::foundation::core::{ArrayModifierId, GraphId, NodeId, PropertyId};
use crate::graph::model::{GraphOwner, Node};

/// A value a compiled program needs from outside itself.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(tag = "external", content = "id", rename_all = "snake_case")]
pub enum External {
    /// The current frame.
    FrameIndex,
    /// Container width and height.
    ContainerSize,
    /// The array-modifier instance index.
    ArrayModifierIndex,
    /// The instance count of one array modifier.
    ArrayModifierCount(ArrayModifierId),
    /// The value of one property.
    PropertyValue(PropertyId),
}

/// Externals feeding a node, directly or through its inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct AffectedExternals {
    /// Reads the frame index.
    pub frame_index: bool,
    /// Reads the container size.
    pub container_size: bool,
    /// Reads the array-modifier index.
    pub array_modifier_index: bool,
    /// Properties read.
    pub property_ids: BTreeSet<PropertyId>,
    /// Properties this node may write.
    pub potential_property_ids: BTreeSet<PropertyId>,
}

impl AffectedExternals {
    /// Fold everything `other` is affected by into `self`. Writes are not inherited.
    pub(crate) fn inherit(&mut self, other: &AffectedExternals) {
        self.frame_index |= other.frame_index;
        self.container_size |= other.container_size;
        self.array_modifier_index |= other.array_modifier_index;
        self.property_ids.extend(other.property_ids.iter().cloned());
    }
}

/// For each external, the nodes that must be re-seeded when it changes.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Externals {
    /// Nodes affected by the frame index.
    pub frame_index: Vec<NodeId>,
    /// Nodes affected by the container size.
    pub container_size: Vec<NodeId>,
    /// Nodes affected by the array-modifier index.
    pub array_modifier_index: Vec<NodeId>,
    /// Per modifier, every node of its graph.
    pub array_modifier_count: BTreeMap<ArrayModifierId, Vec<NodeId>>,
    /// Per property, the nodes reading it.
    pub property_value: BTreeMap<PropertyId, Vec<NodeId>>,
}

impl Externals {
    /// Nodes seeded by `external`.
    pub fn seeded_by(&self, external: &External) -> &[NodeId] {
        match external {
            External::FrameIndex => &self.frame_index,
            External::ContainerSize => &self.container_size,
            External::ArrayModifierIndex => &self.array_modifier_index,
            External::ArrayModifierCount(id) => self
                .array_modifier_count
                .get(id)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            External::PropertyValue(id) => self
                .property_value
                .get(id)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        }
    }

    pub(crate) fn extend(&mut self, other: Externals) {
        self.frame_index.extend(other.frame_index);
        self.container_size.extend(other.container_size);
        self.array_modifier_index.extend(other.array_modifier_index);
        for (k, v) in other.array_modifier_count {
            self.array_modifier_count.entry(k).or_default().extend(v);
        }
        for (k, v) in other.property_value {
            self.property_value.entry(k).or_default().extend(v);
        }
    }
}

/// One node of a compiled program.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledNode {
    /// Node id.
    pub id: NodeId,
    /// Graph the node came from.
    pub graph: GraphId,
    /// Owner of that graph.
    pub owner: GraphOwner,
    /// Position in [`CompiledProgram::to_compute`].
    pub compute_index: usize,
    /// Successors: nodes reading this node's outputs, in this or a merged graph.
    pub next: Vec<NodeId>,
    /// Externals feeding this node.
    pub affected_externals: AffectedExternals,
    /// Snapshot of the node as compiled.
    pub node: Node,
}

/// Flattened, dependency-ordered result of compiling one or more graphs.
///
/// A program is never patched; edits produce a new one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledProgram {
    /// Compiled nodes by id.
    pub nodes: BTreeMap<NodeId, CompiledNode>,
    /// Parsed text of every `expr` node.
    pub expressions: BTreeMap<NodeId, Program>,
    /// Nodes to re-seed per external.
    pub externals: Externals,
    /// Evaluation order; `nodes[to_compute[i]].compute_index == i`.
    pub to_compute: Vec<NodeId>,
}

impl CompiledProgram {
    /// `true` when there is nothing to evaluate.
    pub fn is_empty(&self) -> bool {
        self.to_compute.is_empty()
    }

    /// Compiled nodes in evaluation order.
    pub fn ordered(&self) -> impl Iterator<Item = &CompiledNode> {
        self.to_compute.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Every node reachable through `next` from the nodes seeded by `external`, in compute order.
    pub fn nodes_affected_by(&self, external: &External) -> Vec<NodeId> {
        self.reach(self.externals.seeded_by(external).iter())
    }

    /// `node` and every node reachable from it through `next`, in compute order.
    pub fn downstream_of(&self, node: &NodeId) -> Vec<NodeId> {
        self.reach(std::iter::once(node))
    }

    fn reach<'a>(&'a self, seeds: impl Iterator<Item = &'a NodeId>) -> Vec<NodeId> {
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        let mut queue: VecDeque<&NodeId> = seeds.collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(n) = self.nodes.get(id) {
                queue.extend(n.next.iter());
            }
        }

        let mut out: Vec<&CompiledNode> = seen.iter().filter_map(|id| self.nodes.get(*id)).collect();
        out.sort_by_key(|n| n.compute_index);
        out.into_iter().map(|n| n.id.clone()).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/program.rs"]
mod tests;

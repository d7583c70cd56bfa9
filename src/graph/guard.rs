use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::NodeId;
use crate::foundation::error::FlowError;
use crate::graph::model::Graph;
use crate::value::types::{ValueType, can_convert};

/// Why a proposed connection was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// One side of the connection is not in the graph.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// The slot index does not exist on the node.
    #[error("node {node} has no {side} slot {index}")]
    SlotOutOfRange {
        /// Node the slot was looked up on.
        node: NodeId,
        /// `"input"` or `"output"`.
        side: &'static str,
        /// Requested index.
        index: usize,
    },
    /// The output type cannot feed the input type.
    #[error("cannot connect {from:?} output to {to:?} input")]
    TypeMismatch {
        /// Output type.
        from: ValueType,
        /// Input type.
        to: ValueType,
    },
    /// The source already depends on the target.
    #[error("connecting {source_node} into {target} would create a cycle")]
    WouldCreateCycle {
        /// Node providing the output.
        source_node: NodeId,
        /// Node receiving the input.
        target: NodeId,
    },
}

impl From<ConnectionError> for FlowError {
    fn from(e: ConnectionError) -> Self {
        Self::validation(e.to_string())
    }
}

/// A slot on a node: an input or output index depending on context.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotRef {
    /// Node owning the slot.
    pub node: NodeId,
    /// Slot index.
    pub slot: usize,
}

/// `node` and every node it transitively reads from.
pub fn dependencies_of<'g>(graph: &'g Graph, node: &'g NodeId) -> BTreeSet<&'g NodeId> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(n) = graph.node(id) {
            stack.extend(n.sources());
        }
    }
    seen
}

/// `node` and every node that transitively reads from it.
pub fn dependents_of<'g>(graph: &'g Graph, node: &'g NodeId) -> BTreeSet<&'g NodeId> {
    let mut consumers: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
    for n in graph.nodes.values() {
        for src in n.sources() {
            consumers.entry(src).or_default().push(&n.id);
        }
    }

    let mut seen = BTreeSet::new();
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(next) = consumers.get(id) {
            stack.extend(next.iter().copied());
        }
    }
    seen
}

/// Input slots output `output` of `node` may connect to without a type mismatch or a cycle.
pub fn available_inputs_for(graph: &Graph, node: &NodeId, output: usize) -> Vec<SlotRef> {
    let Some(ty) = graph
        .node(node)
        .and_then(|n| n.outputs.get(output))
        .map(|o| o.value_type)
    else {
        return Vec::new();
    };
    let blocked = dependencies_of(graph, node);

    graph
        .nodes
        .values()
        .filter(|n| !blocked.contains(&n.id))
        .flat_map(|n| {
            n.inputs
                .iter()
                .enumerate()
                .filter(move |(_, i)| can_convert(ty, i.value_type))
                .map(move |(slot, _)| SlotRef {
                    node: n.id.clone(),
                    slot,
                })
        })
        .collect()
}

/// Output slots that may feed input `input` of `node` without a type mismatch or a cycle.
pub fn available_outputs_for(graph: &Graph, node: &NodeId, input: usize) -> Vec<SlotRef> {
    let Some(ty) = graph
        .node(node)
        .and_then(|n| n.inputs.get(input))
        .map(|i| i.value_type)
    else {
        return Vec::new();
    };
    let blocked = dependents_of(graph, node);

    graph
        .nodes
        .values()
        .filter(|n| !blocked.contains(&n.id))
        .flat_map(|n| {
            n.outputs
                .iter()
                .enumerate()
                .filter(move |(_, o)| can_convert(o.value_type, ty))
                .map(move |(slot, _)| SlotRef {
                    node: n.id.clone(),
                    slot,
                })
        })
        .collect()
}

/// Check that output `output` of `source` may feed input `input` of `target`.
pub fn check_connection(
    graph: &Graph,
    source: &NodeId,
    output: usize,
    target: &NodeId,
    input: usize,
) -> Result<(), ConnectionError> {
    let src = graph
        .node(source)
        .ok_or_else(|| ConnectionError::UnknownNode(source.clone()))?;
    let dst = graph
        .node(target)
        .ok_or_else(|| ConnectionError::UnknownNode(target.clone()))?;
    let from = src
        .outputs
        .get(output)
        .ok_or_else(|| ConnectionError::SlotOutOfRange {
            node: source.clone(),
            side: "output",
            index: output,
        })?
        .value_type;
    let to = dst
        .inputs
        .get(input)
        .ok_or_else(|| ConnectionError::SlotOutOfRange {
            node: target.clone(),
            side: "input",
            index: input,
        })?
        .value_type;

    if !can_convert(from, to) {
        return Err(ConnectionError::TypeMismatch { from, to });
    }
    if dependencies_of(graph, source).contains(target) {
        return Err(ConnectionError::WouldCreateCycle {
            source_node: source.clone(),
            target: target.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/graph/guard.rs"]
mod tests;

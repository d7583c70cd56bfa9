use std::collections::{BTreeMap, BTreeSet};

use crate::expression::infer::infer_io;
use crate::expression::parser::parse_program;
use crate::foundation::core::{ArrayModifierId, GraphId, LayerId, NodeId, Vec2};
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::kind::NodeKind;
use crate::value::runtime::Value;
use crate::value::types::ValueType;

/// Connection from an input to output `output` of node `node` in the same graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Pointer {
    /// Source node.
    pub node: NodeId,
    /// Output slot index on the source node.
    pub output: usize,
}

impl Pointer {
    /// Pointer to output `output` of `node`.
    pub fn new(node: NodeId, output: usize) -> Self {
        Self { node, output }
    }
}

/// Typed input slot. With a pointer the literal `value` is ignored.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Input {
    /// Slot name.
    pub name: String,
    /// Declared type.
    pub value_type: ValueType,
    /// Connected source, if any.
    #[serde(default)]
    pub pointer: Option<Pointer>,
    /// Literal fallback.
    pub value: Value,
}

impl Input {
    /// Unconnected input with a literal value.
    pub fn literal(name: impl Into<String>, value_type: ValueType, value: Value) -> Self {
        Self {
            name: name.into(),
            value_type,
            pointer: None,
            value,
        }
    }
}

/// Typed output slot.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Output {
    /// Slot name.
    pub name: String,
    /// Declared type.
    pub value_type: ValueType,
}

impl Output {
    /// Output named `name` of type `value_type`.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// One node of a [`Graph`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    /// Node id, unique across the process.
    pub id: NodeId,
    /// Kind and kind-specific state.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Input slots, in order.
    #[serde(default)]
    pub inputs: Vec<Input>,
    /// Output slots, in order.
    #[serde(default)]
    pub outputs: Vec<Output>,
    /// Editor position. Not used by compilation.
    #[serde(default)]
    pub position: Vec2,
    /// Editor width. Not used by compilation.
    #[serde(default)]
    pub width: f64,
}

impl Node {
    /// Fresh node of `kind` with a generated id and the kind's default IO.
    ///
    /// `expr` nodes whose text parses get their inferred IO; otherwise they start without slots.
    pub fn new(kind: NodeKind) -> Self {
        let (inputs, outputs) = match &kind {
            NodeKind::Expr { expression } => expr_io(expression).unwrap_or_default(),
            other => other.default_io(),
        };
        Self {
            id: NodeId::generate(),
            kind,
            inputs,
            outputs,
            position: Vec2::ZERO,
            width: 0.0,
        }
    }

    /// Same node with a caller-chosen id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = NodeId::new(id);
        self
    }

    /// Ids of the nodes this node reads from, deduplicated.
    pub fn sources(&self) -> BTreeSet<&NodeId> {
        self.inputs
            .iter()
            .filter_map(|i| i.pointer.as_ref().map(|p| &p.node))
            .collect()
    }
}

/// Slots an expression's inferred IO maps to: `Any` inputs defaulting to `0` and `Any` outputs.
pub(crate) fn expr_io(expression: &str) -> Option<(Vec<Input>, Vec<Output>)> {
    let program = parse_program(expression).ok()?;
    let io = infer_io(&program);
    let inputs = io
        .inputs
        .into_iter()
        .map(|n| Input::literal(n, ValueType::Any, Value::Number(0.0)))
        .collect();
    let outputs = io
        .outputs
        .into_iter()
        .map(|n| Output::new(n, ValueType::Any))
        .collect();
    Some((inputs, outputs))
}

/// The entity a graph belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphOwner {
    /// Drives a layer's properties once per pass.
    Layer {
        /// Owning layer.
        layer: LayerId,
    },
    /// Evaluated once per instance of an array modifier.
    ArrayModifier {
        /// Layer the modifier belongs to.
        layer: LayerId,
        /// The modifier.
        modifier: ArrayModifierId,
    },
}

impl GraphOwner {
    /// Layer owning the graph, directly or through its array modifier.
    pub fn layer(&self) -> &LayerId {
        match self {
            Self::Layer { layer } | Self::ArrayModifier { layer, .. } => layer,
        }
    }

    /// Array modifier owning the graph, if any.
    pub fn array_modifier(&self) -> Option<&ArrayModifierId> {
        match self {
            Self::Layer { .. } => None,
            Self::ArrayModifier { modifier, .. } => Some(modifier),
        }
    }
}

/// A node graph: an immutable snapshot edited by producing new graphs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Graph {
    /// Graph id.
    pub id: GraphId,
    /// Owning layer or array modifier.
    pub owner: GraphOwner,
    /// Nodes by id.
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, Node>,
}

impl Graph {
    /// Empty graph with a generated id.
    pub fn new(owner: GraphOwner) -> Self {
        Self {
            id: GraphId::generate(),
            owner,
            nodes: BTreeMap::new(),
        }
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node, reporting absence as a validation error.
    pub fn require_node(&self, id: &NodeId) -> FlowResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| FlowError::validation(format!("graph {}: unknown node {id}", self.id)))
    }

    /// Declared type of the output `pointer` refers to.
    pub fn output_type(&self, pointer: &Pointer) -> Option<ValueType> {
        self.nodes
            .get(&pointer.node)?
            .outputs
            .get(pointer.output)
            .map(|o| o.value_type)
    }

    /// `property_output` nodes, in id order.
    pub fn property_outputs(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::PropertyOutput { .. }))
    }

    /// Check structural invariants: keys match ids, every pointer resolves, and no cycles.
    #[tracing::instrument(skip(self), fields(graph = %self.id))]
    pub fn validate(&self) -> FlowResult<()> {
        for (key, node) in &self.nodes {
            if key != &node.id {
                return Err(FlowError::validation(format!(
                    "graph {}: node stored under {key} has id {}",
                    self.id, node.id
                )));
            }
            for input in &node.inputs {
                let Some(p) = &input.pointer else { continue };
                let source = self.nodes.get(&p.node).ok_or_else(|| {
                    FlowError::validation(format!(
                        "graph {}: node {} input {} points at unknown node {}",
                        self.id, node.id, input.name, p.node
                    ))
                })?;
                if p.output >= source.outputs.len() {
                    return Err(FlowError::validation(format!(
                        "graph {}: node {} input {} points at output {} of {} (has {})",
                        self.id,
                        node.id,
                        input.name,
                        p.output,
                        p.node,
                        source.outputs.len()
                    )));
                }
            }
        }
        if let Some(id) = self.find_cycle() {
            return Err(FlowError::validation(format!(
                "graph {}: node {id} depends on itself",
                self.id
            )));
        }
        Ok(())
    }

    /// A node on a dependency cycle, if the graph has one.
    fn find_cycle(&self) -> Option<&NodeId> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        let mut marks: BTreeMap<&NodeId, Mark> = BTreeMap::new();
        for start in self.nodes.keys() {
            if marks.contains_key(start) {
                continue;
            }
            // Iterative DFS; the bool flags the post-visit of a node.
            let mut stack = vec![(start, false)];
            while let Some((id, exiting)) = stack.pop() {
                if exiting {
                    marks.insert(id, Mark::Done);
                    continue;
                }
                match marks.get(id) {
                    Some(Mark::Done) => continue,
                    Some(Mark::Active) => return Some(id),
                    None => {}
                }
                marks.insert(id, Mark::Active);
                stack.push((id, true));
                if let Some(node) = self.nodes.get(id) {
                    for src in node.sources() {
                        match marks.get(src) {
                            Some(Mark::Active) => return Some(src),
                            Some(Mark::Done) => {}
                            None => stack.push((src, false)),
                        }
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/model.rs"]
mod tests;

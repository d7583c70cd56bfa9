use crate::foundation::core::{GraphId, NodeId, PropertyId};
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::kind::NodeKind;
use crate::graph::model::{Graph, GraphOwner, Node};
use crate::scene::model::Composition;
use crate::value::runtime::Value;

/// Builder for [`Graph`](crate::Graph) with caller-chosen node ids.
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    /// Start an empty graph `id` owned by `owner`.
    pub fn new(id: impl Into<String>, owner: GraphOwner) -> Self {
        let mut graph = Graph::new(owner);
        graph.id = GraphId::new(id);
        Self { graph }
    }

    /// Add a node of `kind` under `id`.
    pub fn node(mut self, id: &str, kind: NodeKind) -> FlowResult<Self> {
        self.graph = self.graph.with_node(Node::new(kind).with_id(id))?;
        Ok(self)
    }

    /// Add a `property_input` node reading `property`.
    pub fn property_input(
        self,
        id: &str,
        property: &str,
        composition: &Composition,
    ) -> FlowResult<Self> {
        self.property_node(id, NodeKind::PropertyInput { property: None }, property, composition)
    }

    /// Add a `property_output` node writing `property`.
    pub fn property_output(
        self,
        id: &str,
        property: &str,
        composition: &Composition,
    ) -> FlowResult<Self> {
        self.property_node(id, NodeKind::PropertyOutput { property: None }, property, composition)
    }

    fn property_node(
        mut self,
        id: &str,
        kind: NodeKind,
        property: &str,
        composition: &Composition,
    ) -> FlowResult<Self> {
        let node_id = NodeId::new(id);
        self.graph = self
            .graph
            .with_node(Node::new(kind).with_id(id))?
            .with_selected_property(&node_id, Some(PropertyId::new(property)), composition)?;
        Ok(self)
    }

    /// Connect output `output` of `source` to input `input` of `target`.
    pub fn connect(
        mut self,
        source: &str,
        output: usize,
        target: &str,
        input: usize,
    ) -> FlowResult<Self> {
        self.graph = self.graph.with_connection(
            &NodeId::new(source),
            output,
            &NodeId::new(target),
            input,
        )?;
        Ok(self)
    }

    /// Connect slots by name instead of index.
    pub fn connect_named(
        self,
        source: &str,
        output: &str,
        target: &str,
        input: &str,
    ) -> FlowResult<Self> {
        let out_idx = self.slot_index(source, output, |n| {
            n.outputs.iter().position(|o| o.name == output)
        })?;
        let in_idx = self.slot_index(target, input, |n| {
            n.inputs.iter().position(|i| i.name == input)
        })?;
        self.connect(source, out_idx, target, in_idx)
    }

    fn slot_index(
        &self,
        node: &str,
        slot: &str,
        find: impl FnOnce(&Node) -> Option<usize>,
    ) -> FlowResult<usize> {
        let n = self.graph.require_node(&NodeId::new(node))?;
        find(n).ok_or_else(|| FlowError::validation(format!("node {node} has no slot {slot}")))
    }

    /// Set the literal of input `input` of `target`.
    pub fn literal(mut self, target: &str, input: usize, value: Value) -> FlowResult<Self> {
        self.graph = self
            .graph
            .with_input_value(&NodeId::new(target), input, value)?;
        Ok(self)
    }

    /// Validate and return the graph.
    pub fn build(self) -> FlowResult<Graph> {
        self.graph.validate()?;
        Ok(self.graph)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/dsl.rs"]
mod tests;

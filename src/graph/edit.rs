//! Immutable graph edits. Every edit returns a new [`Graph`] and leaves `self` untouched.

use std::mem::discriminant;

use crate::expression::parser::parse_program;
use crate::foundation::core::{NodeId, PropertyId, Vec2};
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::guard::{ConnectionError, check_connection};
use crate::graph::kind::{NodeKind, property_io};
use crate::graph::model::{Graph, Input, Node, Output, Pointer, expr_io};
use crate::scene::model::Composition;
use crate::value::runtime::Value;
use crate::value::types::can_convert;

impl Graph {
    fn node_mut(&mut self, id: &NodeId) -> FlowResult<&mut Node> {
        let graph = self.id.clone();
        self.nodes
            .get_mut(id)
            .ok_or_else(|| FlowError::validation(format!("graph {graph}: unknown node {id}")))
    }

    /// Add `node`.
    pub fn with_node(&self, node: Node) -> FlowResult<Graph> {
        if self.nodes.contains_key(&node.id) {
            return Err(FlowError::validation(format!(
                "graph {}: node {} already exists",
                self.id, node.id
            )));
        }
        let mut next = self.clone();
        next.nodes.insert(node.id.clone(), node);
        Ok(next)
    }

    /// Remove `id`, severing every pointer that reads from it.
    pub fn without_node(&self, id: &NodeId) -> FlowResult<Graph> {
        let mut next = self.clone();
        if next.nodes.remove(id).is_none() {
            return Err(FlowError::validation(format!(
                "graph {}: unknown node {id}",
                self.id
            )));
        }
        for node in next.nodes.values_mut() {
            for input in &mut node.inputs {
                if input.pointer.as_ref().is_some_and(|p| &p.node == id) {
                    input.pointer = None;
                }
            }
        }
        Ok(next)
    }

    /// Connect output `output` of `source` to input `input` of `target`, replacing any existing
    /// connection of that input.
    pub fn with_connection(
        &self,
        source: &NodeId,
        output: usize,
        target: &NodeId,
        input: usize,
    ) -> Result<Graph, ConnectionError> {
        check_connection(self, source, output, target, input)?;
        let mut next = self.clone();
        let slot = next
            .nodes
            .get_mut(target)
            .and_then(|n| n.inputs.get_mut(input))
            .ok_or_else(|| ConnectionError::UnknownNode(target.clone()))?;
        slot.pointer = Some(Pointer::new(source.clone(), output));
        Ok(next)
    }

    /// Disconnect input `input` of `target`. Its literal value is used again.
    pub fn without_connection(&self, target: &NodeId, input: usize) -> FlowResult<Graph> {
        let mut next = self.clone();
        input_mut(next.node_mut(target)?, input)?.pointer = None;
        Ok(next)
    }

    /// Set the literal value of input `input` of `target`.
    pub fn with_input_value(&self, target: &NodeId, input: usize, value: Value) -> FlowResult<Graph> {
        let mut next = self.clone();
        let slot = input_mut(next.node_mut(target)?, input)?;
        let conformed = value.conform(slot.value_type).ok_or_else(|| {
            FlowError::validation(format!(
                "input {} expects {:?}, got {}",
                slot.name,
                slot.value_type,
                value.type_name()
            ))
        })?;
        slot.value = conformed;
        Ok(next)
    }

    /// Replace the literal state of a `num_input`, `vec2_input` or `color_input` node.
    pub fn with_literal(&self, target: &NodeId, kind: NodeKind) -> FlowResult<Graph> {
        let mut next = self.clone();
        let node = next.node_mut(target)?;
        let is_literal = matches!(
            kind,
            NodeKind::NumInput { .. } | NodeKind::Vec2Input { .. } | NodeKind::ColorInput { .. }
        );
        if !is_literal || discriminant(&node.kind) != discriminant(&kind) {
            return Err(FlowError::validation(format!(
                "node {target} is {}, cannot take {} state",
                node.kind.name(),
                kind.name()
            )));
        }
        node.kind = kind;
        Ok(next)
    }

    /// Move a node in the editor. Layout never affects compilation.
    pub fn with_position(&self, target: &NodeId, position: Vec2) -> FlowResult<Graph> {
        let mut next = self.clone();
        next.node_mut(target)?.position = position;
        Ok(next)
    }

    /// Replace the text of an `expr` node and re-infer its IO.
    ///
    /// Slots that survive by name keep their connections and literals; removed slots are dropped
    /// with their connections; new slots are appended with default literals. Text that does not
    /// parse is stored as-is and keeps the previous IO so the compiler can report it.
    pub fn with_expression(&self, target: &NodeId, expression: &str) -> FlowResult<Graph> {
        let node = self.require_node(target)?;
        if !matches!(node.kind, NodeKind::Expr { .. }) {
            return Err(FlowError::validation(format!(
                "node {target} is {}, not expr",
                node.kind.name()
            )));
        }

        let kind = NodeKind::Expr {
            expression: expression.to_owned(),
        };
        if parse_program(expression).is_err() {
            let mut next = self.clone();
            next.node_mut(target)?.kind = kind;
            return Ok(next);
        }
        let (inputs, outputs) = expr_io(expression).unwrap_or_default();
        Ok(self.with_io(target, kind, inputs, outputs))
    }

    /// Select the property a `property_input`/`property_output` node reads or writes.
    ///
    /// IO is regenerated from the property's leaves; connections survive on slots whose name
    /// and type are unchanged.
    pub fn with_selected_property(
        &self,
        target: &NodeId,
        property: Option<PropertyId>,
        composition: &Composition,
    ) -> FlowResult<Graph> {
        let node = self.require_node(target)?;
        let kind = match node.kind {
            NodeKind::PropertyInput { .. } => NodeKind::PropertyInput {
                property: property.clone(),
            },
            NodeKind::PropertyOutput { .. } => NodeKind::PropertyOutput {
                property: property.clone(),
            },
            ref other => {
                return Err(FlowError::validation(format!(
                    "node {target} is {}, not a property node",
                    other.name()
                )));
            }
        };
        let (inputs, outputs) = match &property {
            Some(p) => property_io(&kind, p, composition)?,
            None => (Vec::new(), Vec::new()),
        };
        Ok(self.with_io(target, kind, inputs, outputs))
    }

    /// Swap a node's kind and IO, carrying connections over by slot name.
    fn with_io(
        &self,
        target: &NodeId,
        kind: NodeKind,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
    ) -> Graph {
        let mut next = self.clone();
        let Some(node) = next.nodes.get_mut(target) else {
            return next;
        };

        let old_inputs = std::mem::take(&mut node.inputs);
        node.inputs = inputs
            .into_iter()
            .map(|fresh| {
                match old_inputs
                    .iter()
                    .find(|o| o.name == fresh.name && o.value_type == fresh.value_type)
                {
                    Some(old) => old.clone(),
                    None => fresh,
                }
            })
            .collect();

        // old output index -> new output index
        let remap: Vec<Option<usize>> = node
            .outputs
            .iter()
            .map(|old| outputs.iter().position(|o| o.name == old.name))
            .collect();
        node.outputs = outputs;
        node.kind = kind;
        let new_types: Vec<_> = node.outputs.iter().map(|o| o.value_type).collect();

        for consumer in next.nodes.values_mut() {
            for input in &mut consumer.inputs {
                let Some(p) = &mut input.pointer else { continue };
                if &p.node != target {
                    continue;
                }
                match remap.get(p.output).copied().flatten() {
                    Some(idx) if can_convert(new_types[idx], input.value_type) => p.output = idx,
                    _ => input.pointer = None,
                }
            }
        }
        next
    }
}

fn input_mut(node: &mut Node, input: usize) -> FlowResult<&mut Input> {
    let id = node.id.clone();
    node.inputs
        .get_mut(input)
        .ok_or_else(|| FlowError::validation(format!("node {id} has no input {input}")))
}

#[cfg(test)]
#[path = "../../tests/unit/graph/edit.rs"]
mod tests;

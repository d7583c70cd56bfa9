use std::collections::{BTreeMap, BTreeSet};

use crate::compile::program::{AffectedExternals, CompiledNode, CompiledProgram, Externals};
use crate::expression::ast::Program;
use crate::expression::infer::infer_io;
use crate::expression::parser::parse_program;
use crate::foundation::core::NodeId;
use crate::foundation::error::CompositionError;
use crate::graph::kind::NodeKind;
use crate::graph::model::{Graph, GraphOwner, Node};
use crate::scene::model::Composition;

// Outputs of a `composition` node at or past this index carry the frame index.
const COMPOSITION_FRAME_OUTPUT: usize = 2;

/// Compile one graph into a program fragment.
///
/// Nodes are ordered by a post-order walk from every `property_output` node, so each node comes
/// after everything it reads. Nodes that feed no `property_output` are not compiled.
#[tracing::instrument(skip_all, fields(graph = %graph.id))]
pub fn compile_flow_graph(
    graph: &Graph,
    composition: &Composition,
) -> Result<CompiledProgram, Vec<CompositionError>> {
    if let Err(e) = graph.validate() {
        tracing::error!(error = %e, "graph failed validation");
        return Err(vec![CompositionError::at_graph(&graph.id, e.to_string())]);
    }

    let order = topological_order(graph);
    let mut errors = Vec::new();
    let mut program = CompiledProgram::default();
    let mut affected: BTreeMap<&NodeId, AffectedExternals> = BTreeMap::new();

    for (compute_index, id) in order.iter().enumerate() {
        let Some(node) = graph.node(id) else { continue };

        let mut own = classify(graph, node, composition, &mut errors);
        for input in &node.inputs {
            let Some(p) = &input.pointer else { continue };
            let is_composition = graph
                .node(&p.node)
                .is_some_and(|n| matches!(n.kind, NodeKind::Composition));
            if is_composition {
                if p.output >= COMPOSITION_FRAME_OUTPUT {
                    own.frame_index = true;
                } else {
                    own.container_size = true;
                }
            } else if let Some(src) = affected.get(&p.node) {
                own.inherit(src);
            }
        }

        if let NodeKind::Expr { expression } = &node.kind {
            match parse_program(expression) {
                Ok(ast) => {
                    check_expr_slots(graph, node, &ast, &mut errors);
                    program.expressions.insert(id.clone(), ast);
                }
                Err(e) => errors.push(CompositionError::at_node(&graph.id, id, e.to_string())),
            }
        }

        program.nodes.insert(
            id.clone(),
            CompiledNode {
                id: id.clone(),
                graph: graph.id.clone(),
                owner: graph.owner.clone(),
                compute_index,
                next: Vec::new(),
                affected_externals: own.clone(),
                node: node.clone(),
            },
        );
        affected.insert(id, own);
    }

    // Intra-graph successor edges, in compute order of the consumer.
    for id in &order {
        let Some(node) = graph.node(id) else { continue };
        for src in node.sources() {
            if let Some(c) = program.nodes.get_mut(src) {
                c.next.push(id.clone());
            }
        }
    }

    program.externals = collect_externals(&graph.owner, &order, &affected);
    program.to_compute = order.clone();

    if !errors.is_empty() {
        tracing::error!(count = errors.len(), "graph compilation failed");
        return Err(errors);
    }
    tracing::debug!(
        nodes = program.to_compute.len(),
        expressions = program.expressions.len(),
        "compiled graph"
    );
    Ok(program)
}

/// Post-order from each `property_output` node, sharing one visited set.
fn topological_order(graph: &Graph) -> Vec<NodeId> {
    let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
    let mut order = Vec::new();

    for root in graph.property_outputs() {
        let mut stack: Vec<(&NodeId, bool)> = vec![(&root.id, false)];
        while let Some((id, exiting)) = stack.pop() {
            if exiting {
                order.push(id.clone());
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            stack.push((id, true));
            let Some(node) = graph.node(id) else { continue };
            // Reversed so the first input is visited first.
            for input in node.inputs.iter().rev() {
                if let Some(p) = &input.pointer
                    && !visited.contains(&p.node)
                {
                    stack.push((&p.node, false));
                }
            }
        }
    }
    order
}

/// Externals a node is affected by on its own, before inheriting from its inputs.
fn classify(
    graph: &Graph,
    node: &Node,
    composition: &Composition,
    errors: &mut Vec<CompositionError>,
) -> AffectedExternals {
    let mut own = AffectedExternals::default();
    match &node.kind {
        NodeKind::Composition => {
            own.frame_index = true;
            own.container_size = true;
        }
        NodeKind::ArrayModifierIndex => own.array_modifier_index = true,
        NodeKind::PropertyInput { property: Some(p) } => match composition.descendants(p) {
            Ok(ids) => own.property_ids.extend(ids),
            Err(e) => errors.push(CompositionError::at_node(&graph.id, &node.id, e.to_string())),
        },
        NodeKind::PropertyOutput { property: Some(p) } => match composition.descendants(p) {
            Ok(ids) => own.potential_property_ids.extend(ids),
            Err(e) => errors.push(CompositionError::at_node(&graph.id, &node.id, e.to_string())),
        },
        _ => {}
    }
    own
}

/// Declared slots of an `expr` node must match what its text reads and assigns.
fn check_expr_slots(
    graph: &Graph,
    node: &Node,
    ast: &Program,
    errors: &mut Vec<CompositionError>,
) {
    let io = infer_io(ast);
    let inputs: Vec<&str> = node.inputs.iter().map(|i| i.name.as_str()).collect();
    let outputs: Vec<&str> = node.outputs.iter().map(|o| o.name.as_str()).collect();
    if inputs != io.inputs || outputs != io.outputs {
        errors.push(CompositionError::at_node(
            &graph.id,
            &node.id,
            format!(
                "slots {inputs:?} -> {outputs:?} do not match expression IO {:?} -> {:?}",
                io.inputs, io.outputs
            ),
        ));
    }
}

fn collect_externals(
    owner: &GraphOwner,
    order: &[NodeId],
    affected: &BTreeMap<&NodeId, AffectedExternals>,
) -> Externals {
    let mut ext = Externals::default();
    for id in order {
        let Some(a) = affected.get(id) else { continue };
        if a.frame_index {
            ext.frame_index.push(id.clone());
        }
        if a.container_size {
            ext.container_size.push(id.clone());
        }
        if a.array_modifier_index {
            ext.array_modifier_index.push(id.clone());
        }
        for p in &a.property_ids {
            ext.property_value
                .entry(p.clone())
                .or_default()
                .push(id.clone());
        }
        if let Some(m) = owner.array_modifier() {
            ext.array_modifier_count
                .entry(m.clone())
                .or_default()
                .push(id.clone());
        }
    }
    ext
}

#[cfg(test)]
#[path = "../../tests/unit/compile/graph.rs"]
mod tests;

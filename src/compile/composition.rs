use std::collections::BTreeMap;

use crate::compile::graph::compile_flow_graph;
use crate::compile::program::CompiledProgram;
use crate::foundation::core::{GraphId, NodeId};
use crate::foundation::error::CompositionError;
use crate::graph::model::Graph;
use crate::scene::model::Composition;
use crate::scene::order::{layer_graph_ids, layer_order};

/// Compile every layer graph and array-modifier graph of `composition` into one program.
///
/// Layers are visited in dependency order; within a layer its own graph comes first, then its
/// modifier graphs. All problems found are returned together.
#[tracing::instrument(skip_all, fields(composition = %composition.id))]
pub fn compile_composition_flow(
    composition: &Composition,
    graphs: &BTreeMap<GraphId, Graph>,
) -> Result<CompiledProgram, Vec<CompositionError>> {
    let order = layer_order(composition, graphs)?;

    let mut program = CompiledProgram::default();
    let mut errors = Vec::new();
    for layer_id in &order {
        let Some(layer) = composition.layer(layer_id) else {
            errors.push(CompositionError::composition(format!(
                "ordered layer {layer_id} is missing"
            )));
            continue;
        };
        for graph_id in layer_graph_ids(layer) {
            let Some(graph) = graphs.get(graph_id) else {
                errors.push(CompositionError::at_graph(
                    graph_id,
                    format!("layer {layer_id} references a missing graph"),
                ));
                continue;
            };
            match compile_flow_graph(graph, composition) {
                Ok(fragment) => merge(&mut program, fragment, &mut errors),
                Err(e) => errors.extend(e),
            }
        }
    }

    if !errors.is_empty() {
        tracing::error!(count = errors.len(), "composition compilation failed");
        return Err(errors);
    }

    resolve_property_edges(&mut program);
    tracing::debug!(
        nodes = program.to_compute.len(),
        layers = order.len(),
        "compiled composition"
    );
    Ok(program)
}

/// Append `fragment` to `acc`, offsetting compute indices past what `acc` already holds.
pub(crate) fn merge(
    acc: &mut CompiledProgram,
    fragment: CompiledProgram,
    errors: &mut Vec<CompositionError>,
) {
    let offset = acc.to_compute.len();
    let CompiledProgram {
        nodes,
        expressions,
        externals,
        to_compute,
    } = fragment;

    for (id, mut node) in nodes {
        if acc.nodes.contains_key(&id) {
            errors.push(CompositionError::at_node(
                &node.graph,
                &id,
                "node id is used by more than one graph",
            ));
            continue;
        }
        node.compute_index += offset;
        acc.nodes.insert(id, node);
    }
    acc.expressions.extend(expressions);
    acc.externals.extend(externals);
    acc.to_compute.extend(to_compute);
}

/// Turn cross-graph property reads into successor edges of the node writing the property.
///
/// Only forward edges (writer computed before reader) are added.
fn resolve_property_edges(program: &mut CompiledProgram) {
    let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
    for producer in program.ordered() {
        for p in &producer.affected_externals.potential_property_ids {
            let Some(consumers) = program.externals.property_value.get(p) else {
                continue;
            };
            for c in consumers {
                let Some(consumer) = program.nodes.get(c) else {
                    continue;
                };
                if consumer.compute_index <= producer.compute_index {
                    if consumer.id != producer.id {
                        tracing::debug!(
                            producer = %producer.id,
                            consumer = %consumer.id,
                            property = %p,
                            "skipping backward property edge"
                        );
                    }
                    continue;
                }
                edges.push((producer.id.clone(), consumer.id.clone()));
            }
        }
    }

    for (from, to) in edges {
        if let Some(n) = program.nodes.get_mut(&from)
            && !n.next.contains(&to)
        {
            n.next.push(to);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/composition.rs"]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::{GraphId, LayerId};
use crate::foundation::error::CompositionError;
use crate::graph::kind::NodeKind;
use crate::graph::model::Graph;
use crate::scene::model::{Composition, Layer};

/// Graph ids attached to a layer: its own graph, then each array modifier's graph.
pub fn layer_graph_ids(layer: &Layer) -> impl Iterator<Item = &GraphId> {
    layer
        .graph
        .iter()
        .chain(layer.array_modifiers.iter().filter_map(|m| m.graph.as_ref()))
}

/// Order layers so that a layer reading another layer's property comes after it.
///
/// Independent layers keep their stacking order. Layers on a reference cycle are reported.
#[tracing::instrument(skip_all, fields(composition = %composition.id))]
pub fn layer_order(
    composition: &Composition,
    graphs: &BTreeMap<GraphId, Graph>,
) -> Result<Vec<LayerId>, Vec<CompositionError>> {
    let owners = composition.property_layers();
    let position: BTreeMap<&LayerId, usize> = composition
        .layers
        .iter()
        .enumerate()
        .map(|(i, l)| (&l.id, i))
        .collect();

    // upstream[i] = positions of layers layer i reads from
    let mut upstream: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); composition.layers.len()];
    for (i, layer) in composition.layers.iter().enumerate() {
        for graph in layer_graph_ids(layer).filter_map(|id| graphs.get(id)) {
            for node in graph.nodes.values() {
                let NodeKind::PropertyInput {
                    property: Some(p),
                } = &node.kind
                else {
                    continue;
                };
                let Some(j) = owners.get(p).and_then(|l| position.get(l)) else {
                    continue;
                };
                if *j != i {
                    upstream[i].insert(*j);
                }
            }
        }
    }

    let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); upstream.len()];
    let mut pending: Vec<usize> = upstream.iter().map(BTreeSet::len).collect();
    for (i, ups) in upstream.iter().enumerate() {
        for &j in ups {
            downstream[j].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..pending.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(pending.len());
    while let Some(i) = ready.pop_first() {
        order.push(composition.layers[i].id.clone());
        for &d in &downstream[i] {
            pending[d] -= 1;
            if pending[d] == 0 {
                ready.insert(d);
            }
        }
    }

    if order.len() == composition.layers.len() {
        return Ok(order);
    }
    let errors: Vec<CompositionError> = composition
        .layers
        .iter()
        .enumerate()
        .filter(|(i, _)| pending[*i] > 0)
        .map(|(_, l)| {
            CompositionError::composition(format!(
                "layer {} is on or behind a property reference cycle",
                l.id
            ))
        })
        .collect();
    tracing::error!(count = errors.len(), "layer dependency cycle");
    Err(errors)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/order.rs"]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::{GraphId, NodeId, PropertyId};
use crate::foundation::error::FlowResult;
use crate::graph::kind::NodeKind;
use crate::graph::model::Graph;
use crate::scene::model::{Composition, Property, PropertySource};
use crate::scene::order::layer_graph_ids;

/// Something a property's value may change with.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(tag = "affected_by", content = "property", rename_all = "snake_case")]
pub enum Dependency {
    /// The current frame (keyframes or a `composition` frame output).
    Frame,
    /// Container width or height.
    ContainerSize,
    /// The array-modifier instance index.
    ArrayModifierIndex,
    /// Another property read by a `property_input` node.
    OtherProperty(PropertyId),
}

/// Every external factor that transitively affects `property`, sorted and deduplicated.
///
/// Follows `property_input` reads into the properties they read, so a property driven by a
/// keyframed property also depends on [`Dependency::Frame`].
#[tracing::instrument(skip(composition, graphs))]
pub fn property_dependencies(
    composition: &Composition,
    graphs: &BTreeMap<GraphId, Graph>,
    property: &PropertyId,
) -> FlowResult<Vec<Dependency>> {
    composition.require_property(property)?;
    let attached: Vec<&Graph> = composition
        .layers
        .iter()
        .flat_map(layer_graph_ids)
        .filter_map(|id| graphs.get(id))
        .collect();

    let mut out = BTreeSet::new();
    let mut seen: BTreeSet<PropertyId> = BTreeSet::new();
    let mut pending = vec![property.clone()];
    while let Some(next) = pending.pop() {
        if !seen.insert(next.clone()) {
            continue;
        }
        for dep in direct_dependencies(composition, &attached, &next)? {
            if let Dependency::OtherProperty(p) = &dep {
                pending.push(p.clone());
            }
            out.insert(dep);
        }
    }
    out.remove(&Dependency::OtherProperty(property.clone()));
    Ok(out.into_iter().collect())
}

fn direct_dependencies(
    composition: &Composition,
    graphs: &[&Graph],
    property: &PropertyId,
) -> FlowResult<BTreeSet<Dependency>> {
    let mut out = BTreeSet::new();
    let targets = composition.descendants(property)?;

    for id in &targets {
        if let Some(Property::Single {
            value: PropertySource::Timeline(_),
            ..
        }) = composition.property(id)
        {
            out.insert(Dependency::Frame);
        }
    }

    for graph in graphs {
        for node in graph.property_outputs() {
            let Some(written) = node.kind.selected_property() else {
                continue;
            };
            let writes = composition.descendants(written)?;
            if writes.iter().any(|w| targets.contains(w)) {
                walk_back(graph, &node.id, &mut out);
            }
        }
    }
    Ok(out)
}

/// Classify every node `start` transitively reads from.
fn walk_back(graph: &Graph, start: &NodeId, out: &mut BTreeSet<Dependency>) {
    let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(node) = graph.node(id) else { continue };
        match &node.kind {
            NodeKind::ArrayModifierIndex => {
                out.insert(Dependency::ArrayModifierIndex);
            }
            NodeKind::PropertyInput { property: Some(p) } => {
                out.insert(Dependency::OtherProperty(p.clone()));
            }
            _ => {}
        }
        for input in &node.inputs {
            let Some(p) = &input.pointer else { continue };
            let from_composition = graph
                .node(&p.node)
                .is_some_and(|n| matches!(n.kind, NodeKind::Composition));
            if from_composition {
                out.insert(if p.output >= 2 {
                    Dependency::Frame
                } else {
                    Dependency::ContainerSize
                });
            } else {
                stack.push(&p.node);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/deps.rs"]
mod tests;

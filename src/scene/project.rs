use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::core::{CompositionId, GraphId, LayerId, PropertyId};
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::kind::{NodeKind, property_io};
use crate::graph::model::{Graph, GraphOwner};
use crate::scene::model::{Composition, Property, PropertySource};
use crate::value::types::ValueType;

/// JSON document holding compositions and the graphs driving their layers.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    /// Compositions, in order.
    pub compositions: Vec<Composition>,
    /// Every graph of every composition, by id.
    #[serde(default)]
    pub graphs: BTreeMap<GraphId, Graph>,
}

impl Project {
    /// Parse a project from a JSON reader. Call [`Project::validate`] before use.
    pub fn from_reader<R: std::io::Read>(r: R) -> FlowResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| FlowError::serde(format!("parse project JSON: {e}")))
    }

    /// Parse a project from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FlowError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Look up a composition.
    pub fn composition(&self, id: &CompositionId) -> Option<&Composition> {
        self.compositions.iter().find(|c| &c.id == id)
    }

    /// Check every structural invariant, reporting all violations at once.
    #[tracing::instrument(skip(self))]
    pub fn validate(&self) -> FlowResult<()> {
        let mut errors = Vec::new();

        let mut comp_ids = BTreeSet::new();
        for comp in &self.compositions {
            if !comp_ids.insert(&comp.id) {
                errors.push(format!("duplicate composition id {}", comp.id));
            }
            if let Err(e) = comp.validate() {
                errors.push(e.to_string());
            }
        }

        // graph id -> (composition, expected owner)
        let mut expected: BTreeMap<&GraphId, (&Composition, GraphOwner)> = BTreeMap::new();
        for comp in &self.compositions {
            for layer in &comp.layers {
                let layer_owner = layer.graph.iter().map(|g| {
                    (
                        g,
                        GraphOwner::Layer {
                            layer: layer.id.clone(),
                        },
                    )
                });
                let modifier_owners = layer.array_modifiers.iter().filter_map(|m| {
                    m.graph.as_ref().map(|g| {
                        (
                            g,
                            GraphOwner::ArrayModifier {
                                layer: layer.id.clone(),
                                modifier: m.id.clone(),
                            },
                        )
                    })
                });
                for (g, owner) in layer_owner.chain(modifier_owners) {
                    if expected.insert(g, (comp, owner)).is_some() {
                        errors.push(format!("graph {g} is attached more than once"));
                    }
                    if !self.graphs.contains_key(g) {
                        errors.push(format!("layer {} references unknown graph {g}", layer.id));
                    }
                }
            }
        }

        for (key, graph) in &self.graphs {
            if key != &graph.id {
                errors.push(format!("graph stored under {key} has id {}", graph.id));
            }
            if let Err(e) = graph.validate() {
                errors.push(e.to_string());
            }
            match expected.get(key) {
                None => errors.push(format!("graph {key} is not attached to any layer")),
                Some((comp, owner)) => {
                    if owner != &graph.owner {
                        errors.push(format!(
                            "graph {key} declares owner {:?}, attached as {owner:?}",
                            graph.owner
                        ));
                    }
                    validate_property_nodes(comp, graph, &mut errors);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FlowError::validation(errors.join("; ")))
        }
    }
}

fn validate_property_nodes(comp: &Composition, graph: &Graph, errors: &mut Vec<String>) {
    for node in graph.nodes.values() {
        let Some(p) = node.kind.selected_property() else {
            if matches!(
                node.kind,
                NodeKind::PropertyInput { .. } | NodeKind::PropertyOutput { .. }
            ) && !(node.inputs.is_empty() && node.outputs.is_empty())
            {
                errors.push(format!(
                    "graph {}: node {} selects no property but has slots",
                    graph.id, node.id
                ));
            }
            continue;
        };
        match property_io(&node.kind, p, comp) {
            Err(_) => errors.push(format!(
                "graph {}: node {} selects unknown property {p}",
                graph.id, node.id
            )),
            Ok((inputs, outputs)) => {
                let same_inputs = inputs.len() == node.inputs.len()
                    && inputs
                        .iter()
                        .zip(&node.inputs)
                        .all(|(a, b)| a.value_type == b.value_type);
                let same_outputs = outputs.len() == node.outputs.len()
                    && outputs
                        .iter()
                        .zip(&node.outputs)
                        .all(|(a, b)| a.value_type == b.value_type);
                if !same_inputs || !same_outputs {
                    errors.push(format!(
                        "graph {}: node {} slots do not match property {p}",
                        graph.id, node.id
                    ));
                }
            }
        }
    }
}

impl Composition {
    /// Check the property tree and layer structure of this composition.
    pub fn validate(&self) -> FlowResult<()> {
        let mut errors = Vec::new();
        let comp = &self.id;

        if !(self.width.is_finite() && self.width >= 0.0)
            || !(self.height.is_finite() && self.height >= 0.0)
        {
            errors.push(format!("composition {comp}: size must be finite and >= 0"));
        }

        for (key, p) in &self.properties {
            if key != p.id() {
                errors.push(format!("property stored under {key} has id {}", p.id()));
            }
            match p {
                Property::Single {
                    value_type, value, ..
                } => match value {
                    PropertySource::Static(v) => {
                        if v.conform(*value_type).is_none() {
                            errors.push(format!(
                                "property {key}: static {} does not fit {value_type:?}",
                                v.type_name()
                            ));
                        }
                    }
                    PropertySource::Timeline(t) => {
                        if *value_type != ValueType::Number {
                            errors.push(format!(
                                "property {key}: timelines are only allowed on numbers"
                            ));
                        }
                        if let Err(e) = t.validate() {
                            errors.push(format!("property {key}: {e}"));
                        }
                    }
                },
                Property::Compound { components, .. } => {
                    for c in components {
                        if !matches!(
                            self.properties.get(c),
                            Some(Property::Single {
                                value_type: ValueType::Number,
                                ..
                            })
                        ) {
                            errors.push(format!(
                                "property {key}: component {c} must be a number property"
                            ));
                        }
                    }
                }
                Property::Group { properties, .. } => {
                    for c in properties {
                        if !self.properties.contains_key(c) {
                            errors.push(format!("property {key}: unknown member {c}"));
                        }
                    }
                }
            }
        }

        // Each property hangs under exactly one parent.
        let mut claims: Vec<(&PropertyId, String)> = Vec::new();
        let mut layer_ids: BTreeSet<&LayerId> = BTreeSet::new();
        for layer in &self.layers {
            if !layer_ids.insert(&layer.id) {
                errors.push(format!("duplicate layer id {}", layer.id));
            }
            for top in &layer.properties {
                if !self.properties.contains_key(top) {
                    errors.push(format!("layer {}: unknown property {top}", layer.id));
                    continue;
                }
                claims.push((top, format!("layer {}", layer.id)));
            }
            for m in &layer.array_modifiers {
                let count_ok = matches!(
                    self.properties.get(&m.count),
                    Some(Property::Single {
                        value_type: ValueType::Number,
                        ..
                    })
                );
                if !count_ok {
                    errors.push(format!(
                        "array modifier {}: count {} must be a number property",
                        m.id, m.count
                    ));
                }
            }
        }
        for p in self.properties.values() {
            for c in p.children() {
                claims.push((c, format!("property {}", p.id())));
            }
        }
        let mut owned: BTreeSet<&PropertyId> = BTreeSet::new();
        for (id, by) in claims {
            if !owned.insert(id) {
                errors.push(format!("property {id} is owned twice (again by {by})"));
            }
        }

        let reachable = self.property_layers();
        for id in self.properties.keys() {
            if !reachable.contains_key(id) {
                errors.push(format!("property {id} is not reachable from any layer"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FlowError::validation(errors.join("; ")))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/project.rs"]
mod tests;

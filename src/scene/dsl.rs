use std::collections::BTreeMap;

use crate::foundation::core::{ArrayModifierId, CompositionId, GraphId, LayerId, PropertyId, Vec2};
use crate::foundation::error::{FlowError, FlowResult};
use crate::scene::model::{
    ArrayModifier, Composition, Layer, LayerKind, Property, PropertySource,
};
use crate::scene::timeline::Timeline;
use crate::value::runtime::Value;
use crate::value::types::ValueType;

/// Builder for [`Composition`](crate::Composition).
pub struct CompositionBuilder {
    id: CompositionId,
    name: String,
    width: f64,
    height: f64,
    length: u64,
    layers: Vec<Layer>,
    properties: BTreeMap<PropertyId, Property>,
}

impl CompositionBuilder {
    /// Start a composition of the given size and length in frames.
    pub fn new(id: impl Into<String>, width: f64, height: f64, length: u64) -> Self {
        let id = CompositionId::new(id);
        Self {
            name: id.to_string(),
            id,
            width,
            height,
            length,
            layers: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a layer and take ownership of its properties.
    pub fn layer(mut self, layer: LayerBuilder) -> FlowResult<Self> {
        for (id, p) in layer.properties {
            if self.properties.contains_key(&id) {
                return Err(FlowError::validation(format!("duplicate property id {id}")));
            }
            self.properties.insert(id, p);
        }
        self.layers.push(layer.layer);
        Ok(self)
    }

    /// Build and validate the composition.
    pub fn build(self) -> FlowResult<Composition> {
        let comp = Composition {
            id: self.id,
            name: self.name,
            width: self.width,
            height: self.height,
            length: self.length,
            layers: self.layers,
            properties: self.properties,
        };
        comp.validate()?;
        Ok(comp)
    }
}

/// Builder for one [`Layer`](crate::Layer) and its property tree.
pub struct LayerBuilder {
    layer: Layer,
    properties: BTreeMap<PropertyId, Property>,
}

impl LayerBuilder {
    /// Start a layer of `kind`.
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        let id = LayerId::new(id);
        Self {
            layer: Layer {
                name: id.to_string(),
                id,
                kind,
                properties: Vec::new(),
                graph: None,
                array_modifiers: Vec::new(),
            },
            properties: BTreeMap::new(),
        }
    }

    fn push(mut self, p: Property) -> Self {
        self.layer.properties.push(p.id().clone());
        self.properties.insert(p.id().clone(), p);
        self
    }

    /// Top-level single property with a static value.
    pub fn single(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        value_type: ValueType,
        value: Value,
    ) -> Self {
        self.push(Property::Single {
            id: PropertyId::new(id),
            name: name.into(),
            value_type,
            value: PropertySource::Static(value),
        })
    }

    /// Top-level static number property named after its id.
    pub fn number(self, id: impl Into<String>, value: f64) -> Self {
        let id = id.into();
        self.single(id.clone(), id, ValueType::Number, Value::Number(value))
    }

    /// Top-level keyframed number property named after its id.
    pub fn keyframed(self, id: impl Into<String>, timeline: Timeline) -> Self {
        let id = id.into();
        self.push(Property::Single {
            id: PropertyId::new(id.clone()),
            name: id,
            value_type: ValueType::Number,
            value: PropertySource::Timeline(timeline),
        })
    }

    /// Top-level compound vector property; components are `{id}.x` and `{id}.y`.
    pub fn vec2(mut self, id: impl Into<String>, value: Vec2) -> Self {
        let id = id.into();
        let components = [
            PropertyId::new(format!("{id}.x")),
            PropertyId::new(format!("{id}.y")),
        ];
        for (c, (name, v)) in components.iter().zip([("x", value.x), ("y", value.y)]) {
            self.properties.insert(
                c.clone(),
                Property::Single {
                    id: c.clone(),
                    name: name.to_owned(),
                    value_type: ValueType::Number,
                    value: PropertySource::Static(Value::Number(v)),
                },
            );
        }
        self.push(Property::Compound {
            id: PropertyId::new(id.clone()),
            name: id,
            components,
        })
    }

    /// Move the listed top-level properties into a new top-level group.
    pub fn group(mut self, id: impl Into<String>, members: &[&str]) -> FlowResult<Self> {
        let id = id.into();
        let mut properties = Vec::with_capacity(members.len());
        for m in members {
            let m = PropertyId::new(*m);
            let Some(pos) = self.layer.properties.iter().position(|p| p == &m) else {
                return Err(FlowError::validation(format!(
                    "layer {}: {m} is not a top-level property",
                    self.layer.id
                )));
            };
            self.layer.properties.remove(pos);
            properties.push(m);
        }
        Ok(self.push(Property::Group {
            id: PropertyId::new(id.clone()),
            name: id,
            properties,
        }))
    }

    /// Attach the graph driving this layer.
    pub fn graph(mut self, graph: impl Into<String>) -> Self {
        self.layer.graph = Some(GraphId::new(graph));
        self
    }

    /// Add an array modifier counted by the number property `count`.
    pub fn array_modifier(
        mut self,
        id: impl Into<String>,
        count: impl Into<String>,
        graph: Option<&str>,
    ) -> Self {
        self.layer.array_modifiers.push(ArrayModifier {
            id: ArrayModifierId::new(id),
            count: PropertyId::new(count),
            graph: graph.map(GraphId::new),
        });
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/dsl.rs"]
mod tests;

use std::collections::BTreeMap;

use crate::foundation::core::{
    ArrayModifierId, CompositionId, FrameIndex, GraphId, LayerId, PropertyId, Vec2,
};
use crate::foundation::error::{FlowError, FlowResult};
use crate::scene::timeline::Timeline;
use crate::value::runtime::Value;
use crate::value::types::ValueType;

/// Where a single property's raw value comes from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySource {
    /// Fixed value.
    Static(Value),
    /// Numeric keyframe timeline.
    Timeline(Timeline),
}

/// A node in a layer's property tree.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    /// A typed leaf holding a value.
    Single {
        /// Property id.
        id: PropertyId,
        /// Display name; also the slot name used by graph nodes.
        name: String,
        /// Declared type.
        value_type: ValueType,
        /// Raw value source.
        value: PropertySource,
    },
    /// A 2D vector made of two `Number` singles (`x`, `y`).
    Compound {
        /// Property id.
        id: PropertyId,
        /// Display name.
        name: String,
        /// The `x` and `y` component properties.
        components: [PropertyId; 2],
    },
    /// A named collection of properties.
    Group {
        /// Property id.
        id: PropertyId,
        /// Display name.
        name: String,
        /// Child properties, in order.
        properties: Vec<PropertyId>,
    },
}

impl Property {
    /// Id of this property.
    pub fn id(&self) -> &PropertyId {
        match self {
            Self::Single { id, .. } | Self::Compound { id, .. } | Self::Group { id, .. } => id,
        }
    }

    /// Display name of this property.
    pub fn name(&self) -> &str {
        match self {
            Self::Single { name, .. } | Self::Compound { name, .. } | Self::Group { name, .. } => {
                name
            }
        }
    }

    /// Value type a graph slot bound to this leaf carries.
    pub fn slot_type(&self) -> Option<ValueType> {
        match self {
            Self::Single { value_type, .. } => Some(*value_type),
            Self::Compound { .. } => Some(ValueType::Vec2),
            Self::Group { .. } => None,
        }
    }

    /// Direct children (group members or compound components).
    pub fn children(&self) -> &[PropertyId] {
        match self {
            Self::Single { .. } => &[],
            Self::Compound { components, .. } => components,
            Self::Group { properties, .. } => properties,
        }
    }
}

/// Layer type. Only used for diagnostics by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Rectangle shape.
    Rect,
    /// Ellipse shape.
    Ellipse,
    /// Free-form path.
    Shape,
    /// Line segment.
    Line,
    /// Nested composition.
    Composition,
}

/// Repeats its layer `count` times; each instance is evaluated with its own index.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrayModifier {
    /// Modifier id.
    pub id: ArrayModifierId,
    /// `Number` property holding the instance count.
    pub count: PropertyId,
    /// Graph evaluated once per instance index.
    #[serde(default)]
    pub graph: Option<GraphId>,
}

/// One layer of a composition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    /// Layer id.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Layer type.
    pub kind: LayerKind,
    /// Top-level properties of the layer.
    pub properties: Vec<PropertyId>,
    /// Graph driving this layer's properties.
    #[serde(default)]
    pub graph: Option<GraphId>,
    /// Array modifiers, in order.
    #[serde(default)]
    pub array_modifiers: Vec<ArrayModifier>,
}

/// A composition: its layers and every property they own.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Composition {
    /// Composition id.
    pub id: CompositionId,
    /// Display name.
    pub name: String,
    /// Container width.
    pub width: f64,
    /// Container height.
    pub height: f64,
    /// Length in frames.
    pub length: u64,
    /// Layers, in stacking order.
    pub layers: Vec<Layer>,
    /// Every property of every layer, by id.
    pub properties: BTreeMap<PropertyId, Property>,
}

impl Composition {
    /// Look up a property.
    pub fn property(&self, id: &PropertyId) -> Option<&Property> {
        self.properties.get(id)
    }

    /// Look up a property, treating absence as a broken invariant.
    pub fn require_property(&self, id: &PropertyId) -> FlowResult<&Property> {
        self.properties
            .get(id)
            .ok_or_else(|| FlowError::invariant(format!("unknown property {id}")))
    }

    /// Look up a layer.
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Flatten `id` into its leaves: singles and compounds, in declaration order.
    pub fn leaves(&self, id: &PropertyId) -> FlowResult<Vec<&Property>> {
        let mut out = Vec::new();
        self.push_leaves(id, &mut out, 0)?;
        Ok(out)
    }

    fn push_leaves<'a>(
        &'a self,
        id: &PropertyId,
        out: &mut Vec<&'a Property>,
        depth: usize,
    ) -> FlowResult<()> {
        if depth > self.properties.len() {
            return Err(FlowError::invariant(format!(
                "property tree under {id} is cyclic"
            )));
        }
        let p = self.require_property(id)?;
        match p {
            Property::Single { .. } | Property::Compound { .. } => out.push(p),
            Property::Group { properties, .. } => {
                for child in properties {
                    self.push_leaves(child, out, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    /// `id` followed by every property beneath it (group members, compound components).
    pub fn descendants(&self, id: &PropertyId) -> FlowResult<Vec<PropertyId>> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(next) = stack.pop() {
            if out.contains(&next) {
                continue;
            }
            let p = self.require_property(&next)?;
            stack.extend(p.children().iter().rev().cloned());
            out.push(next);
        }
        Ok(out)
    }

    /// Owning layer of every property reachable from a layer's top-level list.
    pub fn property_layers(&self) -> BTreeMap<PropertyId, LayerId> {
        let mut out = BTreeMap::new();
        for layer in &self.layers {
            for top in &layer.properties {
                // Unknown ids are reported by validation.
                if let Ok(all) = self.descendants(top) {
                    for id in all {
                        out.entry(id).or_insert_with(|| layer.id.clone());
                    }
                }
            }
        }
        out
    }

    /// Raw value of a single property at `frame`.
    pub fn raw_value(&self, id: &PropertyId, frame: FrameIndex) -> FlowResult<Value> {
        match self.require_property(id)? {
            Property::Single { value, .. } => match value {
                PropertySource::Static(v) => Ok(v.clone()),
                PropertySource::Timeline(t) => t.sample(frame).map(Value::Number),
            },
            other => Err(FlowError::invariant(format!(
                "raw value requested for non-single property {}",
                other.id()
            ))),
        }
    }

    /// Ids of every single property, in id order.
    pub fn single_ids(&self) -> impl Iterator<Item = &PropertyId> {
        self.properties
            .values()
            .filter(|p| matches!(p, Property::Single { .. }))
            .map(Property::id)
    }

    /// Vec2 of a compound's two components using `read` for component values.
    pub(crate) fn compound_value(
        &self,
        components: &[PropertyId; 2],
        mut read: impl FnMut(&PropertyId) -> FlowResult<Value>,
    ) -> FlowResult<Vec2> {
        let mut xy = [0.0; 2];
        for (slot, id) in xy.iter_mut().zip(components) {
            let v = read(id)?;
            *slot = v.as_number().ok_or_else(|| {
                FlowError::evaluation(format!(
                    "compound component {id} holds {}, expected number",
                    v.type_name()
                ))
            })?;
        }
        Ok(Vec2::new(xy[0], xy[1]))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;

use crate::eval::store::PropertySink;
use crate::foundation::core::PropertyId;
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::kind::NodeKind;
use crate::graph::model::Node;
use crate::scene::model::{Composition, Property};
use crate::value::runtime::Value;

/// Write the connected inputs of a `property_output` node into its target property.
///
/// Inputs are zipped with the target's leaves in declaration order. Inputs without a pointer are
/// skipped, so several nodes can each own part of one compound or group. A compound leaf accepts
/// a vector, a number (used for both components) or a two-element matrix.
///
/// Returns the single properties written.
pub fn apply_outputs(
    node: &Node,
    resolved: &[Value],
    composition: &Composition,
    sink: &mut dyn PropertySink,
) -> FlowResult<Vec<PropertyId>> {
    let NodeKind::PropertyOutput { property } = &node.kind else {
        return Err(FlowError::invariant(format!(
            "node {} is {}, not property_output",
            node.id,
            node.kind.name()
        )));
    };
    let Some(target) = property else {
        return Ok(Vec::new());
    };

    let leaves = composition.leaves(target)?;
    let mut written = Vec::new();
    for ((input, value), leaf) in node.inputs.iter().zip(resolved).zip(leaves) {
        if input.pointer.is_none() {
            continue;
        }
        match leaf {
            Property::Single { id, value_type, .. } => {
                let v = value.conform(*value_type).ok_or_else(|| {
                    FlowError::evaluation(format!(
                        "cannot write {} into property {id} ({value_type:?})",
                        value.type_name()
                    ))
                })?;
                sink.write(id, v)?;
                written.push(id.clone());
            }
            Property::Compound { id, components, .. } => {
                let v = value.as_vec2().ok_or_else(|| {
                    FlowError::evaluation(format!(
                        "malformed compound value for {id}: {}",
                        value.type_name()
                    ))
                })?;
                let [x, y] = components;
                sink.write(x, Value::Number(v.x))?;
                sink.write(y, Value::Number(v.y))?;
                written.push(x.clone());
                written.push(y.clone());
            }
            Property::Group { id, .. } => {
                return Err(FlowError::invariant(format!(
                    "group {id} flattened as a leaf"
                )));
            }
        }
    }
    Ok(written)
}

/// Outputs of a `property_input` node selecting `property`: one per leaf, with a compound leaf
/// expanded into its vector followed by its `x` and `y` numbers.
pub fn read_property(
    property: &PropertyId,
    composition: &Composition,
    sink: &dyn PropertySink,
) -> FlowResult<Vec<Value>> {
    let mut out = Vec::new();
    for leaf in composition.leaves(property)? {
        match leaf {
            Property::Single { id, .. } => out.push(sink.read(id)?),
            Property::Compound { components, .. } => {
                let v = composition.compound_value(components, |c| sink.read(c))?;
                out.push(Value::Vec2(v));
                out.push(Value::Number(v.x));
                out.push(Value::Number(v.y));
            }
            Property::Group { id, .. } => {
                return Err(FlowError::invariant(format!(
                    "group {id} flattened as a leaf"
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/eval/sink.rs"]
mod tests;

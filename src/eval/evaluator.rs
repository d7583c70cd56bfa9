use std::collections::BTreeMap;

use smallvec::{SmallVec, smallvec};

use crate::compile::program::{CompiledNode, CompiledProgram};
use crate::eval::context::EvalContext;
use crate::eval::ops;
use crate::eval::sink::{apply_outputs, read_property};
use crate::eval::store::PropertySink;
use crate::expression::bind::run_bound;
use crate::foundation::core::{ArrayModifierId, NodeId, PropertyId};
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::kind::NodeKind;
use crate::graph::model::{GraphOwner, Node};
use crate::scene::model::Composition;
use crate::value::runtime::Value;

/// Output values of one node, indexed like its output slots.
pub type NodeOutputs = SmallVec<[Value; 4]>;

/// Which compiled nodes a pass evaluates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassScope<'a> {
    /// Nodes of layer graphs.
    Main,
    /// Nodes of one array modifier's graph.
    Instance {
        /// The modifier being fanned out.
        modifier: &'a ArrayModifierId,
    },
}

impl PassScope<'_> {
    fn includes(&self, owner: &GraphOwner) -> bool {
        match self {
            Self::Main => owner.array_modifier().is_none(),
            Self::Instance { modifier } => owner.array_modifier() == Some(*modifier),
        }
    }
}

/// Result of one evaluation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluatedPass {
    /// Outputs of every evaluated node.
    pub outputs: BTreeMap<NodeId, NodeOutputs>,
    /// Single properties written through `property_output` nodes, in write order.
    pub written: Vec<PropertyId>,
}

impl EvaluatedPass {
    /// Output `slot` of `node`, if it was evaluated.
    pub fn output(&self, node: &NodeId, slot: usize) -> Option<&Value> {
        self.outputs.get(node)?.get(slot)
    }

    /// Number of nodes evaluated.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// `true` when no node was evaluated.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Evaluate the nodes of `program` selected by `scope`, in compute order.
///
/// `property_input` nodes read through `sink` and `property_output` nodes write into it, so a
/// property written earlier in the pass is visible to later readers.
#[tracing::instrument(skip_all, fields(nodes = program.to_compute.len()))]
pub fn evaluate(
    program: &CompiledProgram,
    composition: &Composition,
    ctx: &EvalContext,
    scope: PassScope<'_>,
    sink: &mut dyn PropertySink,
) -> FlowResult<EvaluatedPass> {
    let mut pass = EvaluatedPass::default();
    for compiled in program.ordered() {
        if !scope.includes(&compiled.owner) {
            continue;
        }
        let outputs = eval_node(program, compiled, composition, ctx, sink, &mut pass)?;
        pass.outputs.insert(compiled.id.clone(), outputs);
    }
    Ok(pass)
}

fn eval_node(
    program: &CompiledProgram,
    compiled: &CompiledNode,
    composition: &Composition,
    ctx: &EvalContext,
    sink: &mut dyn PropertySink,
    pass: &mut EvaluatedPass,
) -> FlowResult<NodeOutputs> {
    let node = &compiled.node;
    let inputs = resolve_inputs(node, &pass.outputs)?;

    match &node.kind {
        NodeKind::Empty => Ok(NodeOutputs::new()),
        NodeKind::NumInput { value } => Ok(smallvec![Value::Number(*value)]),
        NodeKind::Vec2Input { value } => Ok(smallvec![Value::Vec2(*value)]),
        NodeKind::ColorInput { color } => Ok(smallvec![Value::Color(*color)]),
        NodeKind::NumCap => ops::num_cap(&inputs),
        NodeKind::NumLerp => ops::num_lerp(&inputs),
        NodeKind::DegToRad => ops::deg_to_rad(&inputs),
        NodeKind::RadToDeg => ops::rad_to_deg(&inputs),
        NodeKind::Vec2Add => ops::vec2_add(&inputs),
        NodeKind::Vec2Lerp => ops::vec2_lerp(&inputs),
        NodeKind::Vec2Factors => ops::vec2_factors(&inputs),
        NodeKind::Vec2Interpolate => ops::vec2_interpolate(&inputs),
        NodeKind::RectTranslate => ops::rect_translate(&inputs),
        NodeKind::ColorFromRgbaFactors => ops::color_from_rgba_factors(&inputs),
        NodeKind::ColorToRgbaFactors => ops::color_to_rgba_factors(&inputs),
        NodeKind::ColorFromHslFactors => ops::color_from_hsl_factors(&inputs),
        NodeKind::Expr { .. } => eval_expr(program, node, &inputs),
        NodeKind::Composition => Ok(smallvec![
            Value::Number(ctx.width),
            Value::Number(ctx.height),
            Value::Number(ctx.frame.0 as f64),
        ]),
        NodeKind::ArrayModifierIndex => Ok(smallvec![Value::Number(ctx.index_value())]),
        NodeKind::PropertyInput { property } => match property {
            Some(id) => Ok(read_property(id, composition, &*sink)?.into_iter().collect()),
            None => Ok(NodeOutputs::new()),
        },
        NodeKind::PropertyOutput { .. } => {
            let written = apply_outputs(node, &inputs, composition, sink)?;
            pass.written.extend(written);
            Ok(NodeOutputs::new())
        }
    }
}

fn resolve_inputs(node: &Node, outputs: &BTreeMap<NodeId, NodeOutputs>) -> FlowResult<Vec<Value>> {
    node.inputs
        .iter()
        .map(|input| {
            let Some(pointer) = &input.pointer else {
                return Ok(input.value.clone());
            };
            let v = outputs
                .get(&pointer.node)
                .and_then(|o| o.get(pointer.output))
                .ok_or_else(|| {
                    FlowError::invariant(format!(
                        "node {} input {} reads {}[{}] before it was computed",
                        node.id, input.name, pointer.node, pointer.output
                    ))
                })?;
            v.conform(input.value_type).ok_or_else(|| {
                FlowError::evaluation(format!(
                    "node {} input {}: cannot use {} as {:?}",
                    node.id,
                    input.name,
                    v.type_name(),
                    input.value_type
                ))
            })
        })
        .collect()
}

fn eval_expr(program: &CompiledProgram, node: &Node, inputs: &[Value]) -> FlowResult<NodeOutputs> {
    let parsed = program.expressions.get(&node.id).ok_or_else(|| {
        FlowError::invariant(format!("expr node {} was compiled without its program", node.id))
    })?;

    let bound: Vec<(&str, &Value)> = node
        .inputs
        .iter()
        .zip(inputs)
        .map(|(slot, v)| (slot.name.as_str(), v))
        .collect();
    let names: Vec<&str> = node.outputs.iter().map(|o| o.name.as_str()).collect();
    let values = run_bound(parsed, &bound, &names)?;

    node.outputs
        .iter()
        .zip(values)
        .map(|(slot, v)| {
            v.conform(slot.value_type).ok_or_else(|| {
                FlowError::expression(format!(
                    "node {} output {}: {} is not {:?}",
                    node.id,
                    slot.name,
                    v.type_name(),
                    slot.value_type
                ))
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/eval/evaluator.rs"]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use crate::compile::program::CompiledProgram;
use crate::eval::context::EvalContext;
use crate::eval::evaluator::{PassScope, evaluate};
use crate::eval::store::{
    ArrayModifierPropertyValueMap, InstanceSink, PropertySink, PropertyStore, PropertyValue,
    PropertyValueMap,
};
use crate::foundation::core::{ArrayModifierId, FrameIndex, NodeId, PropertyId};
use crate::foundation::error::{CompositionError, FlowError, FlowResult};
use crate::graph::kind::NodeKind;
use crate::scene::model::{ArrayModifier, Composition, Property};
use crate::value::runtime::Value;

/// Upper bound on the instances of one array modifier in a single pass.
pub const MAX_ARRAY_INSTANCES: usize = 100_000;

/// What happened to one recomputation pass.
#[derive(Debug)]
pub enum PassOutcome {
    /// The pass completed and the store now holds its values.
    Committed {
        /// Node evaluations across the main and every instance pass.
        nodes_evaluated: usize,
        /// Array-modifier instances evaluated.
        instances: usize,
    },
    /// An expression or evaluation error stopped the pass; the store is unchanged.
    Abandoned {
        /// The error that stopped the pass.
        error: FlowError,
    },
    /// The composition does not compile; nothing was evaluated.
    Blocked {
        /// Compilation errors.
        errors: Vec<CompositionError>,
    },
}

impl PassOutcome {
    /// `true` when the store was updated.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

#[derive(Default)]
struct Staged {
    values: PropertyValueMap,
    array_values: BTreeMap<ArrayModifierId, ArrayModifierPropertyValueMap>,
    nodes_evaluated: usize,
    instances: usize,
}

/// Recompute every property of `composition` at `frame` and commit the result into `store`.
///
/// Each single property starts from its raw value. Without a program the raw values are
/// committed as computed values. Otherwise the main pass runs over the layer graphs, then every
/// array modifier with a graph runs once per instance index.
///
/// Expression and evaluation errors abandon the pass and leave `store` untouched; invariant
/// errors are returned.
#[tracing::instrument(skip_all, fields(composition = %composition.id, frame = frame.0))]
pub fn compute_composition(
    program: Option<&CompiledProgram>,
    composition: &Composition,
    frame: FrameIndex,
    store: &mut PropertyStore,
) -> FlowResult<PassOutcome> {
    match stage(program, composition, frame) {
        Ok(staged) => {
            tracing::debug!(
                nodes = staged.nodes_evaluated,
                instances = staged.instances,
                "recomputation committed"
            );
            let outcome = PassOutcome::Committed {
                nodes_evaluated: staged.nodes_evaluated,
                instances: staged.instances,
            };
            store.commit(staged.values, staged.array_values);
            Ok(outcome)
        }
        Err(error) if error.is_recoverable() => {
            tracing::warn!(%error, "recomputation abandoned, keeping previous values");
            Ok(PassOutcome::Abandoned { error })
        }
        Err(error) => Err(error),
    }
}

/// Re-run the main pass and commit only the properties written by `property_output` nodes
/// downstream of `node`. Every other entry of `store` keeps its value.
#[tracing::instrument(skip(program, composition, store), fields(composition = %composition.id))]
pub fn recompute_affected_by_node(
    program: &CompiledProgram,
    composition: &Composition,
    frame: FrameIndex,
    node: &NodeId,
    store: &mut PropertyStore,
) -> FlowResult<PassOutcome> {
    if !program.nodes.contains_key(node) {
        return Err(FlowError::invariant(format!("node {node} is not in the program")));
    }

    let mut targets: BTreeSet<PropertyId> = BTreeSet::new();
    for id in program.downstream_of(node) {
        let Some(compiled) = program.nodes.get(&id) else {
            continue;
        };
        if compiled.owner.array_modifier().is_some() {
            continue;
        }
        if let NodeKind::PropertyOutput {
            property: Some(target),
        } = &compiled.node.kind
        {
            targets.extend(single_descendants(composition, target)?);
        }
    }

    let pass = seed(composition, frame).and_then(|mut values| {
        let ctx = EvalContext::for_composition(composition, frame);
        let pass = evaluate(program, composition, &ctx, PassScope::Main, &mut values)?;
        Ok((values, pass.len()))
    });
    match pass {
        Ok((mut values, nodes_evaluated)) => {
            store.commit_values(targets.iter().filter_map(|id| values.remove_entry(id)));
            Ok(PassOutcome::Committed {
                nodes_evaluated,
                instances: 0,
            })
        }
        Err(error) if error.is_recoverable() => {
            tracing::warn!(%error, "partial recomputation abandoned");
            Ok(PassOutcome::Abandoned { error })
        }
        Err(error) => Err(error),
    }
}

fn seed(composition: &Composition, frame: FrameIndex) -> FlowResult<PropertyValueMap> {
    composition
        .single_ids()
        .map(|id| -> FlowResult<(PropertyId, PropertyValue)> {
            let raw = composition.raw_value(id, frame)?;
            Ok((id.clone(), PropertyValue::passthrough(raw)))
        })
        .collect()
}

fn stage(
    program: Option<&CompiledProgram>,
    composition: &Composition,
    frame: FrameIndex,
) -> FlowResult<Staged> {
    let mut staged = Staged {
        values: seed(composition, frame)?,
        ..Staged::default()
    };
    let Some(program) = program else {
        return Ok(staged);
    };

    let ctx = EvalContext::for_composition(composition, frame);
    let main = evaluate(program, composition, &ctx, PassScope::Main, &mut staged.values)?;
    staged.nodes_evaluated = main.len();

    for layer in &composition.layers {
        for modifier in &layer.array_modifiers {
            if modifier.graph.is_none() {
                continue;
            }
            let count = instance_count(&staged.values, modifier)?;
            let mut per_index: Vec<BTreeMap<PropertyId, Value>> = Vec::with_capacity(count);
            for index in 0..count {
                let mut sink = InstanceSink::new(&staged.values);
                let pass = evaluate(
                    program,
                    composition,
                    &ctx.with_index(index),
                    PassScope::Instance {
                        modifier: &modifier.id,
                    },
                    &mut sink,
                )?;
                staged.nodes_evaluated += pass.len();
                per_index.push(sink.into_written());
            }
            staged.instances += count;

            let targets = instance_targets(program, composition, &modifier.id, &per_index)?;
            let fanned = fan_out(&staged.values, targets, &per_index)?;
            staged.array_values.insert(modifier.id.clone(), fanned);
        }
    }
    Ok(staged)
}

/// Instance count of `modifier`: its computed count, floored, with negatives treated as zero.
fn instance_count(values: &PropertyValueMap, modifier: &ArrayModifier) -> FlowResult<usize> {
    let v = values.read(&modifier.count)?;
    let n = v.as_number().ok_or_else(|| {
        FlowError::evaluation(format!(
            "array modifier {} count {} holds {}",
            modifier.id,
            modifier.count,
            v.type_name()
        ))
    })?;
    if !n.is_finite() || n <= 0.0 {
        return Ok(0);
    }
    let n = n.floor();
    if n > MAX_ARRAY_INSTANCES as f64 {
        return Err(FlowError::evaluation(format!(
            "array modifier {} count {n} exceeds {MAX_ARRAY_INSTANCES}",
            modifier.id
        )));
    }
    Ok(n as usize)
}

/// Single properties a modifier's graph may write, plus anything an instance actually wrote.
fn instance_targets(
    program: &CompiledProgram,
    composition: &Composition,
    modifier: &ArrayModifierId,
    per_index: &[BTreeMap<PropertyId, Value>],
) -> FlowResult<BTreeSet<PropertyId>> {
    let mut targets = BTreeSet::new();
    for compiled in program.nodes.values() {
        if compiled.owner.array_modifier() != Some(modifier) {
            continue;
        }
        if let Some(target) = compiled.node.kind.selected_property()
            && matches!(compiled.node.kind, NodeKind::PropertyOutput { .. })
        {
            targets.extend(single_descendants(composition, target)?);
        }
    }
    for written in per_index {
        targets.extend(written.keys().cloned());
    }
    Ok(targets)
}

/// One entry per instance for every target; instances that left a target alone see the main
/// pass value.
fn fan_out(
    base: &PropertyValueMap,
    targets: BTreeSet<PropertyId>,
    per_index: &[BTreeMap<PropertyId, Value>],
) -> FlowResult<ArrayModifierPropertyValueMap> {
    targets
        .into_iter()
        .map(|id| -> FlowResult<(PropertyId, Vec<Value>)> {
            let fallback = base.read(&id)?;
            let column = per_index
                .iter()
                .map(|written| written.get(&id).cloned().unwrap_or_else(|| fallback.clone()))
                .collect();
            Ok((id, column))
        })
        .collect()
}

fn single_descendants(composition: &Composition, id: &PropertyId) -> FlowResult<Vec<PropertyId>> {
    Ok(composition
        .descendants(id)?
        .into_iter()
        .filter(|d| matches!(composition.property(d), Some(Property::Single { .. })))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/eval/recompute.rs"]
mod tests;

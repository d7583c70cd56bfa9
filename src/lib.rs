//! flowgraph compiles node graphs that drive animatable layer properties and evaluates them.
//!
//! A [`Composition`] owns layers and their property trees. Each layer (and each of its array
//! modifiers) may carry a [`Graph`] of typed nodes; `property_input` nodes read properties and
//! `property_output` nodes write them. The pipeline is:
//!
//! - Edit graphs immutably (every edit returns a new [`Graph`]), guarded by [`check_connection`]
//! - Compile one graph with [`compile_flow_graph`] or a whole composition with
//!   [`compile_composition_flow`] into a [`CompiledProgram`]
//! - Run recomputation passes with [`compute_composition`] (or through a [`FlowSession`]) into
//!   a [`PropertyStore`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod compile;
pub(crate) mod eval;
pub(crate) mod expression;
pub(crate) mod graph;
pub(crate) mod scene;
pub(crate) mod value;

pub use crate::foundation::core::{
    ArrayModifierId, BezPath, CompositionId, FrameIndex, GraphId, LayerId, NodeId, Point,
    PropertyId, Rect, Rgba, Vec2,
};
pub use crate::foundation::error::{CompositionError, FlowError, FlowResult};

pub use crate::value::runtime::{FillRule, LineCap, LineJoin, TransformBehavior, Value};
pub use crate::value::types::{
    ValueType, can_convert, types_that_can_convert_from, types_that_can_convert_to,
};

pub use crate::expression::ast::Program;
pub use crate::expression::bind::{from_expr_value, run_bound, to_expr_value};
pub use crate::expression::error::ExprError;
pub use crate::expression::infer::{ExprIo, infer_io};
pub use crate::expression::interp::{ExprValue, Scope, evaluate as evaluate_expression};
pub use crate::expression::parser::parse_program;

pub use crate::scene::dsl::{CompositionBuilder, LayerBuilder};
pub use crate::scene::model::{
    ArrayModifier, Composition, Layer, LayerKind, Property, PropertySource,
};
pub use crate::scene::order::{layer_graph_ids, layer_order};
pub use crate::scene::project::Project;
pub use crate::scene::timeline::{Ease, InterpMode, Keyframe, Timeline};

pub use crate::graph::dsl::GraphBuilder;
pub use crate::graph::guard::{
    ConnectionError, SlotRef, available_inputs_for, available_outputs_for, check_connection,
    dependencies_of, dependents_of,
};
pub use crate::graph::kind::{NodeKind, property_io};
pub use crate::graph::model::{Graph, GraphOwner, Input, Node, Output, Pointer};

pub use crate::compile::composition::compile_composition_flow;
pub use crate::compile::deps::{Dependency, property_dependencies};
pub use crate::compile::fingerprint::{TopologyFingerprint, fingerprint_topology};
pub use crate::compile::graph::compile_flow_graph;
pub use crate::compile::program::{
    AffectedExternals, CompiledNode, CompiledProgram, External, Externals,
};

pub use crate::eval::context::EvalContext;
pub use crate::eval::evaluator::{EvaluatedPass, NodeOutputs, PassScope, evaluate};
pub use crate::eval::recompute::{
    MAX_ARRAY_INSTANCES, PassOutcome, compute_composition, recompute_affected_by_node,
};
pub use crate::eval::session::FlowSession;
pub use crate::eval::sink::{apply_outputs, read_property};
pub use crate::eval::store::{
    ArrayModifierPropertyValueMap, InstanceSink, PropertySink, PropertyStore, PropertyValue,
    PropertyValueMap,
};

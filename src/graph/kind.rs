use crate::foundation::core::{PropertyId, Rgba, Vec2};
use crate::foundation::error::FlowResult;
use crate::graph::model::{Input, Output};
use crate::scene::model::{Composition, Property};
use crate::value::runtime::Value;
use crate::value::types::ValueType;

/// The closed set of node kinds, each carrying its own state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Placeholder without inputs or outputs.
    Empty,
    /// Number literal.
    NumInput {
        /// Literal value.
        value: f64,
    },
    /// Clamp a number into `[min, max]`.
    NumCap,
    /// Linear interpolation between two numbers.
    NumLerp,
    /// Degrees to radians.
    DegToRad,
    /// Radians to degrees.
    RadToDeg,
    /// Vector literal.
    Vec2Input {
        /// Literal value.
        value: Vec2,
    },
    /// Component-wise vector sum.
    Vec2Add,
    /// Linear interpolation between two vectors.
    Vec2Lerp,
    /// Split a vector into `x` and `y`.
    Vec2Factors,
    /// Map a number from an input range onto a vector range (clamped).
    Vec2Interpolate,
    /// Offset a rectangle by a vector.
    RectTranslate,
    /// Color literal.
    ColorInput {
        /// Literal color.
        color: Rgba,
    },
    /// Build a color from `[0, 1]` channel factors.
    ColorFromRgbaFactors,
    /// Split a color into `[0, 1]` channel factors.
    ColorToRgbaFactors,
    /// Build a color from `[0, 1]` hue/saturation/lightness factors.
    ColorFromHslFactors,
    /// Embedded expression; IO is inferred from its text.
    Expr {
        /// Expression source text.
        expression: String,
    },
    /// Container width/height and the current frame.
    Composition,
    /// Index of the array-modifier instance being evaluated, or `-1`.
    ArrayModifierIndex,
    /// Reads a property's current value.
    PropertyInput {
        /// Selected property.
        #[serde(default)]
        property: Option<PropertyId>,
    },
    /// Writes its connected inputs into a property's leaves.
    PropertyOutput {
        /// Selected property.
        #[serde(default)]
        property: Option<PropertyId>,
    },
}

fn num_in(name: &str, value: f64) -> Input {
    Input::literal(name, ValueType::Number, Value::Number(value))
}

fn vec_in(name: &str, value: Vec2) -> Input {
    Input::literal(name, ValueType::Vec2, Value::Vec2(value))
}

fn out(name: &str, ty: ValueType) -> Output {
    Output::new(name, ty)
}

impl NodeKind {
    /// Stable snake_case tag of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NumInput { .. } => "num_input",
            Self::NumCap => "num_cap",
            Self::NumLerp => "num_lerp",
            Self::DegToRad => "deg_to_rad",
            Self::RadToDeg => "rad_to_deg",
            Self::Vec2Input { .. } => "vec2_input",
            Self::Vec2Add => "vec2_add",
            Self::Vec2Lerp => "vec2_lerp",
            Self::Vec2Factors => "vec2_factors",
            Self::Vec2Interpolate => "vec2_interpolate",
            Self::RectTranslate => "rect_translate",
            Self::ColorInput { .. } => "color_input",
            Self::ColorFromRgbaFactors => "color_from_rgba_factors",
            Self::ColorToRgbaFactors => "color_to_rgba_factors",
            Self::ColorFromHslFactors => "color_from_hsl_factors",
            Self::Expr { .. } => "expr",
            Self::Composition => "composition",
            Self::ArrayModifierIndex => "array_modifier_index",
            Self::PropertyInput { .. } => "property_input",
            Self::PropertyOutput { .. } => "property_output",
        }
    }

    /// Inputs and outputs a fresh node of this kind starts with.
    ///
    /// `expr` nodes get their IO from [`infer_io`](crate::infer_io) and property nodes from
    /// [`property_io`]; both start empty here.
    pub fn default_io(&self) -> (Vec<Input>, Vec<Output>) {
        use ValueType::{Number, Rect, RgbaColor};

        match self {
            Self::Empty
            | Self::Expr { .. }
            | Self::PropertyInput { .. }
            | Self::PropertyOutput { .. } => (Vec::new(), Vec::new()),
            Self::NumInput { .. } => (Vec::new(), vec![out("value", Number)]),
            Self::NumCap => (
                vec![num_in("value", 0.0), num_in("min", 0.0), num_in("max", 1.0)],
                vec![out("value", Number)],
            ),
            Self::NumLerp => (
                vec![num_in("a", 0.0), num_in("b", 1.0), num_in("t", 0.0)],
                vec![out("value", Number)],
            ),
            Self::DegToRad => (vec![num_in("degrees", 0.0)], vec![out("radians", Number)]),
            Self::RadToDeg => (vec![num_in("radians", 0.0)], vec![out("degrees", Number)]),
            Self::Vec2Input { .. } => (Vec::new(), vec![out("vec2", ValueType::Vec2)]),
            Self::Vec2Add => (
                vec![vec_in("a", Vec2::ZERO), vec_in("b", Vec2::ZERO)],
                vec![out("vec2", ValueType::Vec2)],
            ),
            Self::Vec2Lerp => (
                vec![
                    vec_in("a", Vec2::ZERO),
                    vec_in("b", Vec2::new(1.0, 1.0)),
                    num_in("t", 0.0),
                ],
                vec![out("vec2", ValueType::Vec2)],
            ),
            Self::Vec2Factors => (
                vec![vec_in("vec2", Vec2::ZERO)],
                vec![out("x", Number), out("y", Number)],
            ),
            Self::Vec2Interpolate => (
                vec![
                    num_in("value", 0.0),
                    num_in("input_min", 0.0),
                    num_in("input_max", 1.0),
                    vec_in("from", Vec2::ZERO),
                    vec_in("to", Vec2::new(1.0, 1.0)),
                ],
                vec![out("vec2", ValueType::Vec2)],
            ),
            Self::RectTranslate => (
                vec![
                    Input::literal("rect", Rect, Value::default_for(Rect)),
                    vec_in("translate", Vec2::ZERO),
                ],
                vec![out("rect", Rect)],
            ),
            Self::ColorInput { .. } => (Vec::new(), vec![out("color", RgbaColor)]),
            Self::ColorFromRgbaFactors => (
                vec![
                    num_in("r", 0.0),
                    num_in("g", 0.0),
                    num_in("b", 0.0),
                    num_in("a", 1.0),
                ],
                vec![out("color", RgbaColor)],
            ),
            Self::ColorToRgbaFactors => (
                vec![Input::literal(
                    "color",
                    RgbaColor,
                    Value::default_for(RgbaColor),
                )],
                vec![
                    out("r", Number),
                    out("g", Number),
                    out("b", Number),
                    out("a", Number),
                ],
            ),
            Self::ColorFromHslFactors => (
                vec![
                    num_in("h", 0.0),
                    num_in("s", 0.0),
                    num_in("l", 0.0),
                    num_in("a", 1.0),
                ],
                vec![out("color", RgbaColor)],
            ),
            Self::Composition => (
                Vec::new(),
                vec![
                    out("width", Number),
                    out("height", Number),
                    out("frame_index", Number),
                ],
            ),
            Self::ArrayModifierIndex => (Vec::new(), vec![out("index", Number)]),
        }
    }

    /// Property selected by a `property_input`/`property_output` node.
    pub fn selected_property(&self) -> Option<&PropertyId> {
        match self {
            Self::PropertyInput { property } | Self::PropertyOutput { property } => {
                property.as_ref()
            }
            _ => None,
        }
    }
}

/// IO of a property node selecting `property`.
///
/// `property_input` exposes one output per leaf, and a compound leaf additionally exposes its
/// `x` and `y` components. `property_output` takes one input per leaf.
pub fn property_io(
    kind: &NodeKind,
    property: &PropertyId,
    composition: &Composition,
) -> FlowResult<(Vec<Input>, Vec<Output>)> {
    let root = composition.require_property(property)?;
    let leaves = composition.leaves(property)?;

    match kind {
        NodeKind::PropertyInput { .. } => {
            let mut outputs = Vec::new();
            for leaf in &leaves {
                match leaf {
                    Property::Compound { components, .. } => {
                        outputs.push(out(leaf.name(), ValueType::Vec2));
                        for c in components {
                            let c = composition.require_property(c)?;
                            outputs.push(out(c.name(), ValueType::Number));
                        }
                    }
                    _ => outputs.push(out(leaf.name(), slot_type_of(leaf))),
                }
            }
            if leaves.is_empty() {
                tracing::debug!(property = %root.id(), "selected property has no leaves");
            }
            Ok((Vec::new(), outputs))
        }
        NodeKind::PropertyOutput { .. } => {
            let inputs = leaves
                .iter()
                .map(|leaf| {
                    let ty = slot_type_of(leaf);
                    Input::literal(leaf.name(), ty, Value::default_for(ty))
                })
                .collect();
            Ok((inputs, Vec::new()))
        }
        _ => Ok(kind.default_io()),
    }
}

fn slot_type_of(p: &Property) -> ValueType {
    p.slot_type().unwrap_or(ValueType::Any)
}

#[cfg(test)]
#[path = "../../tests/unit/graph/kind.rs"]
mod tests;

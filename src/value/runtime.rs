use std::collections::BTreeMap;

use crate::foundation::core::{BezPath, Rect, Rgba, Vec2};
use crate::value::types::ValueType;

/// How a layer's transform is applied relative to its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformBehavior {
    /// Transforms compose with the parent chain.
    #[default]
    Recursive,
    /// Transform is absolute for computed (array) instances.
    AbsoluteForComputed,
}

/// Path fill rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    /// Non-zero winding.
    #[default]
    Nonzero,
    /// Even-odd.
    Evenodd,
}

/// Stroke line cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    /// Flat cap at the end point.
    #[default]
    Butt,
    /// Rounded cap.
    Round,
    /// Square cap extending past the end point.
    Square,
}

/// Stroke line join.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineJoin {
    /// Sharp corner.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Beveled corner.
    Bevel,
}

/// A runtime value flowing between nodes and into the property store.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Scalar.
    Number(f64),
    /// Boolean (expression results only).
    Bool(bool),
    /// String (expression results only).
    Text(String),
    /// 2D vector.
    Vec2(Vec2),
    /// Rectangle.
    Rect(Rect),
    /// Color (RGB colors carry `a == 1`).
    Color(Rgba),
    /// Bezier path.
    Path(BezPath),
    /// Transform behavior enum.
    TransformBehavior(TransformBehavior),
    /// Fill rule enum.
    FillRule(FillRule),
    /// Line cap enum.
    LineCap(LineCap),
    /// Line join enum.
    LineJoin(LineJoin),
    /// Numeric matrix produced by an expression; every leaf is a `Number`.
    Matrix(Vec<Value>),
    /// Plain object produced by an expression.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Default literal for an unconnected input of type `ty`.
    pub fn default_for(ty: ValueType) -> Self {
        match ty {
            ValueType::Any | ValueType::Number => Self::Number(0.0),
            ValueType::Vec2 => Self::Vec2(Vec2::ZERO),
            ValueType::Rect => Self::Rect(Rect::ZERO),
            ValueType::RgbaColor | ValueType::RgbColor => Self::Color(Rgba::default()),
            ValueType::TransformBehavior => Self::TransformBehavior(TransformBehavior::default()),
            ValueType::Path => Self::Path(BezPath::new()),
            ValueType::FillRule => Self::FillRule(FillRule::default()),
            ValueType::LineCap => Self::LineCap(LineCap::default()),
            ValueType::LineJoin => Self::LineJoin(LineJoin::default()),
        }
    }

    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Vec2(_) => "vec2",
            Self::Rect(_) => "rect",
            Self::Color(_) => "color",
            Self::Path(_) => "path",
            Self::TransformBehavior(_) => "transform_behavior",
            Self::FillRule(_) => "fill_rule",
            Self::LineCap(_) => "line_cap",
            Self::LineJoin(_) => "line_join",
            Self::Matrix(_) => "matrix",
            Self::Object(_) => "object",
        }
    }

    /// Scalar view. Booleans map to `0`/`1`.
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Self::Number(v) => Some(v),
            Self::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Vector view: a vector, a number broadcast to both components, a 2-element matrix or
    /// an `{x, y}` object.
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            Self::Number(n) => Some(Vec2::new(*n, *n)),
            Self::Matrix(items) => match items.as_slice() {
                [x, y] => Some(Vec2::new(x.as_number()?, y.as_number()?)),
                _ => None,
            },
            Self::Object(fields) => Some(Vec2::new(
                fields.get("x")?.as_number()?,
                fields.get("y")?.as_number()?,
            )),
            _ => None,
        }
    }

    /// Color view: a color or a 3/4-element numeric matrix `[r, g, b, a?]`.
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            Self::Matrix(items) => {
                let n = items
                    .iter()
                    .map(Value::as_number)
                    .collect::<Option<Vec<f64>>>()?;
                match n.as_slice() {
                    [r, g, b] => Some(Rgba::rgba(*r, *g, *b, 1.0)),
                    [r, g, b, a] => Some(Rgba::rgba(*r, *g, *b, *a)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Rectangle view: a rectangle or a `{left, top, width, height}` object.
    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(*r),
            Self::Object(fields) => {
                let field = |k: &str| fields.get(k).and_then(Value::as_number);
                let (x0, y0) = (field("left")?, field("top")?);
                Some(Rect::new(x0, y0, x0 + field("width")?, y0 + field("height")?))
            }
            _ => None,
        }
    }

    /// Coerce this value into the shape required by a slot or property of type `ty`.
    ///
    /// Returns `None` when the value cannot represent `ty`.
    pub fn conform(&self, ty: ValueType) -> Option<Value> {
        match ty {
            ValueType::Any => Some(self.clone()),
            ValueType::Number => self.as_number().map(Value::Number),
            ValueType::Vec2 => self.as_vec2().map(Value::Vec2),
            ValueType::Rect => self.as_rect().map(Value::Rect),
            ValueType::RgbaColor => self.as_color().map(Value::Color),
            ValueType::RgbColor => self.as_color().map(|c| Value::Color(c.opaque())),
            ValueType::Path => match self {
                Self::Path(p) => Some(Self::Path(p.clone())),
                _ => None,
            },
            ValueType::TransformBehavior => match self {
                Self::TransformBehavior(v) => Some(Self::TransformBehavior(*v)),
                Self::Text(s) => parse_enum(s).map(Self::TransformBehavior),
                _ => None,
            },
            ValueType::FillRule => match self {
                Self::FillRule(v) => Some(Self::FillRule(*v)),
                Self::Text(s) => parse_enum(s).map(Self::FillRule),
                _ => None,
            },
            ValueType::LineCap => match self {
                Self::LineCap(v) => Some(Self::LineCap(*v)),
                Self::Text(s) => parse_enum(s).map(Self::LineCap),
                _ => None,
            },
            ValueType::LineJoin => match self {
                Self::LineJoin(v) => Some(Self::LineJoin(*v)),
                Self::Text(s) => parse_enum(s).map(Self::LineJoin),
                _ => None,
            },
        }
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(s.to_owned())).ok()
}

#[cfg(test)]
#[path = "../../tests/unit/value/runtime.rs"]
mod tests;

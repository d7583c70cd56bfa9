use std::collections::BTreeSet;

/// Declared type of a node input or output slot.
///
/// `Any` is compatible with everything in both directions. Other pairs connect only when equal
/// or when listed in the directed conversion table (see [`can_convert`]).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Wildcard type.
    Any,
    /// Scalar `f64`.
    Number,
    /// 2D vector.
    Vec2,
    /// Axis-aligned rectangle.
    Rect,
    /// Color with alpha.
    #[serde(rename = "rgba_color")]
    RgbaColor,
    /// Color without alpha.
    #[serde(rename = "rgb_color")]
    RgbColor,
    /// How a transform is inherited by children.
    TransformBehavior,
    /// Bezier path.
    Path,
    /// Path fill rule.
    FillRule,
    /// Stroke line cap.
    LineCap,
    /// Stroke line join.
    LineJoin,
}

impl ValueType {
    /// Every value type, in declaration order.
    pub const ALL: [ValueType; 11] = [
        ValueType::Any,
        ValueType::Number,
        ValueType::Vec2,
        ValueType::Rect,
        ValueType::RgbaColor,
        ValueType::RgbColor,
        ValueType::TransformBehavior,
        ValueType::Path,
        ValueType::FillRule,
        ValueType::LineCap,
        ValueType::LineJoin,
    ];
}

// Directed `(from, to)` pairs beyond equality and `Any`.
const CONVERSIONS: &[(ValueType, ValueType)] = &[(ValueType::RgbColor, ValueType::RgbaColor)];

/// Return `true` when an output of type `from` may feed an input of type `to`.
pub fn can_convert(from: ValueType, to: ValueType) -> bool {
    if from == to || from == ValueType::Any || to == ValueType::Any {
        return true;
    }
    CONVERSIONS.iter().any(|&(f, t)| f == from && t == to)
}

/// All types whose outputs may feed an input of type `to`.
pub fn types_that_can_convert_to(to: ValueType) -> BTreeSet<ValueType> {
    ValueType::ALL
        .into_iter()
        .filter(|&from| can_convert(from, to))
        .collect()
}

/// All input types an output of type `from` may feed.
pub fn types_that_can_convert_from(from: ValueType) -> BTreeSet<ValueType> {
    ValueType::ALL
        .into_iter()
        .filter(|&to| can_convert(from, to))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/value/types.rs"]
mod tests;

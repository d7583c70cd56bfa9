use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use kurbo::{BezPath, Point, Rect, Vec2};

/// Absolute 0-based frame index in composition timeline space.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Draw a fresh, process-wide unique id suffix.
fn next_id_suffix() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identifier of a node inside a [`Graph`](crate::Graph).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Identifier of a [`Graph`](crate::Graph).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct GraphId(pub String);

/// Identifier of a [`Layer`](crate::Layer).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub String);

/// Identifier of a [`Property`](crate::Property) (single, compound or group).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct PropertyId(pub String);

/// Identifier of an [`ArrayModifier`](crate::ArrayModifier).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ArrayModifierId(pub String);

/// Identifier of a [`Composition`](crate::Composition).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct CompositionId(pub String);

impl NodeId {
    /// Create a node id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a node id that is unique for the lifetime of the process.
    pub fn generate() -> Self {
        Self(format!("node_{}", next_id_suffix()))
    }
}

impl GraphId {
    /// Create a graph id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a graph id that is unique for the lifetime of the process.
    pub fn generate() -> Self {
        Self(format!("graph_{}", next_id_suffix()))
    }
}

impl LayerId {
    /// Create a layer id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl PropertyId {
    /// Create a property id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl ArrayModifierId {
    /// Create an array modifier id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl CompositionId {
    /// Create a composition id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

macro_rules! display_as_inner {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

display_as_inner!(
    NodeId,
    GraphId,
    LayerId,
    PropertyId,
    ArrayModifierId,
    CompositionId
);

/// Straight-alpha color: `r`, `g`, `b` in `[0, 255]`, `a` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
    /// Alpha channel.
    pub a: f64,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::rgba(0.0, 0.0, 0.0, 1.0)
    }
}

impl Rgba {
    /// Build a color from raw channels.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Build a color from normalized `[0, 1]` factors, clamping every channel.
    pub fn from_factors(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: (r.clamp(0.0, 1.0) * 255.0).round(),
            g: (g.clamp(0.0, 1.0) * 255.0).round(),
            b: (b.clamp(0.0, 1.0) * 255.0).round(),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Normalized `[r, g, b, a]` factors in `[0, 1]`.
    pub fn to_factors(self) -> [f64; 4] {
        [
            (self.r / 255.0).clamp(0.0, 1.0),
            (self.g / 255.0).clamp(0.0, 1.0),
            (self.b / 255.0).clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        ]
    }

    /// Build a color from hue/saturation/lightness factors in `[0, 1]`.
    pub fn from_hsl_factors(h: f64, s: f64, l: f64, a: f64) -> Self {
        let h = h.rem_euclid(1.0) * 360.0;
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = h / 60.0;
        let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Self::from_factors(r1 + m, g1 + m, b1 + m, a)
    }

    /// Same color with alpha forced to `1.0` (RGB view of an RGBA color).
    pub fn opaque(self) -> Self {
        Self { a: 1.0, ..self }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

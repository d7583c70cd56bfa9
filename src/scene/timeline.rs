use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FlowError, FlowResult};

/// Easing curve applied between two keyframes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Constant speed.
    #[default]
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
}

impl Ease {
    /// Map normalized progress `t` (clamped to `[0, 1]`).
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

/// Interpolation between adjacent keyframes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpMode {
    /// Keep the previous key's value until the next key.
    Hold,
    /// Interpolate with the previous key's [`Ease`].
    #[default]
    Linear,
}

/// One numeric keyframe.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Frame the key sits on.
    pub frame: FrameIndex,
    /// Value at `frame`.
    pub value: f64,
    /// Ease toward the next key.
    #[serde(default)]
    pub ease: Ease,
}

/// Numeric keyframe timeline of a single property.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    /// Keys sorted by frame.
    pub keys: Vec<Keyframe>,
    /// Interpolation between keys.
    #[serde(default)]
    pub mode: InterpMode,
}

impl Timeline {
    /// Timeline from `(frame, value)` pairs with linear easing.
    pub fn linear(keys: impl IntoIterator<Item = (u64, f64)>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|(frame, value)| Keyframe {
                    frame: FrameIndex(frame),
                    value,
                    ease: Ease::Linear,
                })
                .collect(),
            mode: InterpMode::Linear,
        }
    }

    /// Keys must exist and be sorted by frame.
    pub fn validate(&self) -> FlowResult<()> {
        if self.keys.is_empty() {
            return Err(FlowError::validation("timeline must have at least one key"));
        }
        if !self.keys.windows(2).all(|w| w[0].frame <= w[1].frame) {
            return Err(FlowError::validation("timeline keys must be sorted by frame"));
        }
        Ok(())
    }

    /// Sample the timeline. Frames outside the keyed range hold the nearest key.
    pub fn sample(&self, frame: FrameIndex) -> FlowResult<f64> {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return Err(FlowError::invariant("sampled a timeline without keys"));
        };

        let f = frame.0;
        let idx = self.keys.partition_point(|k| k.frame.0 <= f);
        if idx == 0 {
            return Ok(first.value);
        }
        if idx >= self.keys.len() {
            return Ok(last.value);
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.frame.0.saturating_sub(a.frame.0);
        if denom == 0 || self.mode == InterpMode::Hold {
            return Ok(a.value);
        }

        let t = a.ease.apply(((f - a.frame.0) as f64) / (denom as f64));
        Ok(a.value + (b.value - a.value) * t)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/timeline.rs"]
mod tests;

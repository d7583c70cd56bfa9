use crate::foundation::core::FrameIndex;
use crate::scene::model::Composition;

/// Values every node may observe during one pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvalContext {
    /// Container width.
    pub width: f64,
    /// Container height.
    pub height: f64,
    /// Current frame.
    pub frame: FrameIndex,
    /// Instance index during an array-modifier pass.
    pub array_modifier_index: Option<usize>,
}

impl EvalContext {
    /// Main-pass context for `composition` at `frame`.
    pub fn for_composition(composition: &Composition, frame: FrameIndex) -> Self {
        Self {
            width: composition.width,
            height: composition.height,
            frame,
            array_modifier_index: None,
        }
    }

    /// Same context bound to instance `index`.
    pub fn with_index(self, index: usize) -> Self {
        Self {
            array_modifier_index: Some(index),
            ..self
        }
    }

    /// Value an `array_modifier_index` node produces: the index, or `-1` outside instance passes.
    pub fn index_value(&self) -> f64 {
        self.array_modifier_index.map_or(-1.0, |i| i as f64)
    }
}

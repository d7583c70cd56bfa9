//! Pure operators behind the arithmetic, vector and color node kinds.

use smallvec::smallvec;

use crate::eval::evaluator::NodeOutputs;
use crate::foundation::core::{Rect, Rgba, Vec2};
use crate::foundation::error::{FlowError, FlowResult};
use crate::value::runtime::Value;

fn arg<'a>(inputs: &'a [Value], i: usize) -> FlowResult<&'a Value> {
    inputs
        .get(i)
        .ok_or_else(|| FlowError::evaluation(format!("missing input {i}")))
}

fn num(inputs: &[Value], i: usize) -> FlowResult<f64> {
    let v = arg(inputs, i)?;
    v.as_number().ok_or_else(|| mismatch(i, "number", v))
}

fn vec2(inputs: &[Value], i: usize) -> FlowResult<Vec2> {
    let v = arg(inputs, i)?;
    v.as_vec2().ok_or_else(|| mismatch(i, "vec2", v))
}

fn rect(inputs: &[Value], i: usize) -> FlowResult<Rect> {
    let v = arg(inputs, i)?;
    v.as_rect().ok_or_else(|| mismatch(i, "rect", v))
}

fn color(inputs: &[Value], i: usize) -> FlowResult<Rgba> {
    let v = arg(inputs, i)?;
    v.as_color().ok_or_else(|| mismatch(i, "color", v))
}

fn mismatch(i: usize, expected: &str, got: &Value) -> FlowError {
    FlowError::evaluation(format!("input {i}: expected {expected}, got {}", got.type_name()))
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// `[value, min, max] -> [value clamped into [min, max]]`
pub(crate) fn num_cap(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    let (v, lo, hi) = (num(inputs, 0)?, num(inputs, 1)?, num(inputs, 2)?);
    Ok(smallvec![Value::Number(v.max(lo).min(hi))])
}

pub(crate) fn num_lerp(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    let (a, b, t) = (num(inputs, 0)?, num(inputs, 1)?, num(inputs, 2)?);
    Ok(smallvec![Value::Number(lerp(a, b, t))])
}

pub(crate) fn deg_to_rad(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    Ok(smallvec![Value::Number(num(inputs, 0)?.to_radians())])
}

pub(crate) fn rad_to_deg(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    Ok(smallvec![Value::Number(num(inputs, 0)?.to_degrees())])
}

pub(crate) fn vec2_add(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    Ok(smallvec![Value::Vec2(vec2(inputs, 0)? + vec2(inputs, 1)?)])
}

pub(crate) fn vec2_lerp(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    let (a, b, t) = (vec2(inputs, 0)?, vec2(inputs, 1)?, num(inputs, 2)?);
    Ok(smallvec![Value::Vec2(a.lerp(b, t))])
}

pub(crate) fn vec2_factors(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    let v = vec2(inputs, 0)?;
    Ok(smallvec![Value::Number(v.x), Value::Number(v.y)])
}

/// `[value, input_min, input_max, from, to]`: maps `value` from the input range onto
/// `from..to`, clamped to the ends. An empty input range yields `from`.
pub(crate) fn vec2_interpolate(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    let (v, lo, hi) = (num(inputs, 0)?, num(inputs, 1)?, num(inputs, 2)?);
    let (from, to) = (vec2(inputs, 3)?, vec2(inputs, 4)?);
    let span = hi - lo;
    let t = if span == 0.0 {
        0.0
    } else {
        ((v - lo) / span).clamp(0.0, 1.0)
    };
    Ok(smallvec![Value::Vec2(from.lerp(to, t))])
}

pub(crate) fn rect_translate(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    Ok(smallvec![Value::Rect(rect(inputs, 0)? + vec2(inputs, 1)?)])
}

pub(crate) fn color_from_rgba_factors(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    let c = Rgba::from_factors(
        num(inputs, 0)?,
        num(inputs, 1)?,
        num(inputs, 2)?,
        num(inputs, 3)?,
    );
    Ok(smallvec![Value::Color(c)])
}

pub(crate) fn color_to_rgba_factors(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    Ok(color(inputs, 0)?
        .to_factors()
        .into_iter()
        .map(Value::Number)
        .collect())
}

pub(crate) fn color_from_hsl_factors(inputs: &[Value]) -> FlowResult<NodeOutputs> {
    let c = Rgba::from_hsl_factors(
        num(inputs, 0)?,
        num(inputs, 1)?,
        num(inputs, 2)?,
        num(inputs, 3)?,
    );
    Ok(smallvec![Value::Color(c)])
}

#[cfg(test)]
#[path = "../../tests/unit/eval/ops.rs"]
mod tests;

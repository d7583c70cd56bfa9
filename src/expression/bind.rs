use std::collections::BTreeMap;

use crate::expression::ast::Program;
use crate::expression::error::ExprError;
use crate::expression::interp::{ExprValue, Scope, evaluate};
use crate::value::runtime::Value;

/// Convert a host value into its expression-language representation.
///
/// Vectors become `{x, y}`, rectangles `{left, top, width, height}`, colors `[r, g, b, a]` and
/// enums their snake_case names. Paths have no expression representation.
pub fn to_expr_value(v: &Value) -> Result<ExprValue, ExprError> {
    Ok(match v {
        Value::Number(n) => ExprValue::Number(*n),
        Value::Bool(b) => ExprValue::Bool(*b),
        Value::Text(s) => ExprValue::Str(s.clone()),
        Value::Vec2(p) => object([("x", p.x), ("y", p.y)]),
        Value::Rect(r) => object([
            ("left", r.x0),
            ("top", r.y0),
            ("width", r.width()),
            ("height", r.height()),
        ]),
        Value::Color(c) => ExprValue::Array(
            [c.r, c.g, c.b, c.a]
                .into_iter()
                .map(ExprValue::Number)
                .collect(),
        ),
        Value::TransformBehavior(e) => ExprValue::Str(enum_name(e)?),
        Value::FillRule(e) => ExprValue::Str(enum_name(e)?),
        Value::LineCap(e) => ExprValue::Str(enum_name(e)?),
        Value::LineJoin(e) => ExprValue::Str(enum_name(e)?),
        Value::Matrix(items) => ExprValue::Array(
            items
                .iter()
                .map(to_expr_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(fields) => {
            let mut out = BTreeMap::new();
            for (k, v) in fields {
                out.insert(k.clone(), to_expr_value(v)?);
            }
            ExprValue::Object(out)
        }
        Value::Path(_) => {
            return Err(ExprError::runtime(
                "path values cannot be bound into an expression",
            ));
        }
    })
}

/// Convert an expression result back into a host value.
///
/// Arrays must be numeric matrices (every leaf a number). Booleans, strings and plain objects
/// are passed through.
pub fn from_expr_value(name: &str, v: &ExprValue) -> Result<Value, ExprError> {
    match v {
        ExprValue::Number(n) => Ok(Value::Number(*n)),
        ExprValue::Bool(b) => Ok(Value::Bool(*b)),
        ExprValue::Str(s) => Ok(Value::Text(s.clone())),
        ExprValue::Array(items) => numeric_matrix(name, items).map(Value::Matrix),
        ExprValue::Object(fields) => {
            let mut out = BTreeMap::new();
            for (k, v) in fields {
                out.insert(k.clone(), from_expr_value(name, v)?);
            }
            Ok(Value::Object(out))
        }
    }
}

fn numeric_matrix(name: &str, items: &[ExprValue]) -> Result<Vec<Value>, ExprError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            ExprValue::Number(n) => Ok(Value::Number(*n)),
            ExprValue::Array(inner) => numeric_matrix(name, inner).map(Value::Matrix),
            other => Err(ExprError::runtime(format!(
                "output {name}: matrix element {} is not a number ({other:?})",
                i + 1
            ))),
        })
        .collect()
}

/// Run `program` with `inputs` bound by name and read back `outputs` in order.
pub fn run_bound(
    program: &Program,
    inputs: &[(&str, &Value)],
    outputs: &[&str],
) -> Result<Vec<Value>, ExprError> {
    let mut scope = Scope::new();
    for (name, v) in inputs {
        scope.insert((*name).to_owned(), to_expr_value(v)?);
    }
    evaluate(program, &mut scope)?;

    outputs
        .iter()
        .map(|name| {
            let v = scope
                .get(*name)
                .ok_or_else(|| ExprError::runtime(format!("output {name} was never assigned")))?;
            from_expr_value(name, v)
        })
        .collect()
}

fn object<const N: usize>(fields: [(&str, f64); N]) -> ExprValue {
    ExprValue::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_owned(), ExprValue::Number(v)))
            .collect(),
    )
}

fn enum_name<T: serde::Serialize>(v: &T) -> Result<String, ExprError> {
    match serde_json::to_value(v) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        _ => Err(ExprError::runtime("enum value has no string form")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/bind.rs"]
mod tests;

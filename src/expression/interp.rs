use std::collections::BTreeMap;

use crate::expression::ast::{BinaryOp, Expr, Lit, Program, UnaryOp, reserved_constant};
use crate::expression::error::ExprError;

const MAX_RANGE_LEN: usize = 1_000_000;

/// A value inside the expression language.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    /// Scalar.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// String.
    Str(String),
    /// Array (matrix) of values.
    Array(Vec<ExprValue>),
    /// Plain object.
    Object(BTreeMap<String, ExprValue>),
}

impl ExprValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Str(_) => "string",
            Self::Array(_) => "matrix",
            Self::Object(_) => "object",
        }
    }

    fn as_f64(&self) -> Result<f64, ExprError> {
        match *self {
            Self::Number(v) => Ok(v),
            Self::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
            ref other => Err(ExprError::runtime(format!(
                "expected number, got {}",
                other.type_name()
            ))),
        }
    }

    fn truthy(&self) -> Result<bool, ExprError> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Number(n) => Ok(*n != 0.0 && !n.is_nan()),
            Self::Str(s) => Ok(!s.is_empty()),
            other => Err(ExprError::runtime(format!(
                "cannot use {} as a condition",
                other.type_name()
            ))),
        }
    }
}

/// Variable bindings an expression is evaluated against; updated in place by assignments.
pub type Scope = BTreeMap<String, ExprValue>;

/// Evaluate every statement of `program` against `scope`.
///
/// Returns the value of the last statement, if any.
pub fn evaluate(program: &Program, scope: &mut Scope) -> Result<Option<ExprValue>, ExprError> {
    let mut last = None;
    for stmt in &program.statements {
        last = Some(eval(stmt, scope)?);
    }
    Ok(last)
}

fn eval(e: &Expr, scope: &mut Scope) -> Result<ExprValue, ExprError> {
    match e {
        Expr::Lit(Lit::Number(v)) => Ok(ExprValue::Number(*v)),
        Expr::Lit(Lit::Bool(b)) => Ok(ExprValue::Bool(*b)),
        Expr::Lit(Lit::Str(s)) => Ok(ExprValue::Str(s.clone())),
        Expr::Symbol(name) => {
            if let Some(v) = scope.get(name) {
                return Ok(v.clone());
            }
            reserved_constant(name)
                .map(ExprValue::Number)
                .ok_or_else(|| ExprError::runtime(format!("undefined symbol {name}")))
        }
        Expr::Unary { op, expr } => {
            let v = eval(expr, scope)?;
            match op {
                UnaryOp::Neg => map_numeric(&v, |x| -x),
                UnaryOp::Plus => map_numeric(&v, |x| x),
                UnaryOp::Not => Ok(ExprValue::Bool(!v.truthy()?)),
            }
        }
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            let l = eval(left, scope)?.truthy()?;
            Ok(ExprValue::Bool(l && eval(right, scope)?.truthy()?))
        }
        Expr::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => {
            let l = eval(left, scope)?.truthy()?;
            Ok(ExprValue::Bool(l || eval(right, scope)?.truthy()?))
        }
        Expr::Binary { op, left, right } => {
            let l = eval(left, scope)?;
            let r = eval(right, scope)?;
            binary(*op, &l, &r)
        }
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, scope)?.truthy()? {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
        Expr::Range { start, step, end } => {
            let start = eval(start, scope)?.as_f64()?;
            let step = match step {
                Some(s) => eval(s, scope)?.as_f64()?,
                None => 1.0,
            };
            let end = eval(end, scope)?.as_f64()?;
            range(start, step, end)
        }
        Expr::Array(items) => items
            .iter()
            .map(|i| eval(i, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(ExprValue::Array),
        Expr::Object(fields) => {
            let mut out = BTreeMap::new();
            for (k, v) in fields {
                let v = eval(v, scope)?;
                out.insert(k.clone(), v);
            }
            Ok(ExprValue::Object(out))
        }
        Expr::Call { func, args } => {
            let args = args
                .iter()
                .map(|a| eval(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(func, &args)
        }
        Expr::Index { target, index } => {
            let target = eval(target, scope)?;
            let index = eval(index, scope)?;
            index_value(&target, &index)
        }
        Expr::Member { target, name } => match eval(target, scope)? {
            ExprValue::Object(fields) => fields
                .get(name)
                .cloned()
                .ok_or_else(|| ExprError::runtime(format!("object has no property {name}"))),
            other => Err(ExprError::runtime(format!(
                "cannot read property {name} of {}",
                other.type_name()
            ))),
        },
        Expr::Assign { name, value } => {
            let v = eval(value, scope)?;
            scope.insert(name.clone(), v.clone());
            Ok(v)
        }
    }
}

fn map_numeric(v: &ExprValue, f: impl Fn(f64) -> f64 + Copy) -> Result<ExprValue, ExprError> {
    match v {
        ExprValue::Array(items) => items
            .iter()
            .map(|i| map_numeric(i, f))
            .collect::<Result<Vec<_>, _>>()
            .map(ExprValue::Array),
        other => Ok(ExprValue::Number(f(other.as_f64()?))),
    }
}

fn zip_numeric(
    a: &ExprValue,
    b: &ExprValue,
    f: impl Fn(f64, f64) -> f64 + Copy,
) -> Result<ExprValue, ExprError> {
    match (a, b) {
        (ExprValue::Array(xs), ExprValue::Array(ys)) => {
            if xs.len() != ys.len() {
                return Err(ExprError::runtime(format!(
                    "dimension mismatch ({} != {})",
                    xs.len(),
                    ys.len()
                )));
            }
            xs.iter()
                .zip(ys)
                .map(|(x, y)| zip_numeric(x, y, f))
                .collect::<Result<Vec<_>, _>>()
                .map(ExprValue::Array)
        }
        (ExprValue::Array(xs), y) => xs
            .iter()
            .map(|x| zip_numeric(x, y, f))
            .collect::<Result<Vec<_>, _>>()
            .map(ExprValue::Array),
        (x, ExprValue::Array(ys)) => ys
            .iter()
            .map(|y| zip_numeric(x, y, f))
            .collect::<Result<Vec<_>, _>>()
            .map(ExprValue::Array),
        (x, y) => Ok(ExprValue::Number(f(x.as_f64()?, y.as_f64()?))),
    }
}

fn binary(op: BinaryOp, l: &ExprValue, r: &ExprValue) -> Result<ExprValue, ExprError> {
    match op {
        BinaryOp::Add => match (l, r) {
            (ExprValue::Str(a), b) => Ok(ExprValue::Str(format!("{a}{}", display(b)))),
            (a, ExprValue::Str(b)) => Ok(ExprValue::Str(format!("{}{b}", display(a)))),
            _ => zip_numeric(l, r, |a, b| a + b),
        },
        BinaryOp::Sub => zip_numeric(l, r, |a, b| a - b),
        BinaryOp::Mul => zip_numeric(l, r, |a, b| a * b),
        BinaryOp::Div => zip_numeric(l, r, |a, b| a / b),
        BinaryOp::Mod => zip_numeric(l, r, modulo),
        BinaryOp::Pow => zip_numeric(l, r, f64::powf),
        BinaryOp::Eq => Ok(ExprValue::Bool(loose_eq(l, r))),
        BinaryOp::Ne => Ok(ExprValue::Bool(!loose_eq(l, r))),
        BinaryOp::Lt => Ok(ExprValue::Bool(l.as_f64()? < r.as_f64()?)),
        BinaryOp::Le => Ok(ExprValue::Bool(l.as_f64()? <= r.as_f64()?)),
        BinaryOp::Gt => Ok(ExprValue::Bool(l.as_f64()? > r.as_f64()?)),
        BinaryOp::Ge => Ok(ExprValue::Bool(l.as_f64()? >= r.as_f64()?)),
        BinaryOp::And | BinaryOp::Or => Err(ExprError::runtime(
            "logical operators are evaluated with short-circuiting",
        )),
    }
}

/// Floored modulo: the result has the sign of the divisor.
fn modulo(x: f64, y: f64) -> f64 {
    if y == 0.0 {
        return x;
    }
    x - y * (x / y).floor()
}

fn loose_eq(l: &ExprValue, r: &ExprValue) -> bool {
    match (l, r) {
        (ExprValue::Number(_) | ExprValue::Bool(_), ExprValue::Number(_) | ExprValue::Bool(_)) => {
            matches!((l.as_f64(), r.as_f64()), (Ok(a), Ok(b)) if a == b)
        }
        _ => l == r,
    }
}

fn display(v: &ExprValue) -> String {
    match v {
        ExprValue::Number(n) => n.to_string(),
        ExprValue::Bool(b) => b.to_string(),
        ExprValue::Str(s) => s.clone(),
        ExprValue::Array(items) => {
            let parts: Vec<String> = items.iter().map(display).collect();
            format!("[{}]", parts.join(", "))
        }
        ExprValue::Object(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{k}: {}", display(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn range(start: f64, step: f64, end: f64) -> Result<ExprValue, ExprError> {
    if step == 0.0 || !step.is_finite() || !start.is_finite() || !end.is_finite() {
        return Err(ExprError::runtime("invalid range bounds or step"));
    }
    let span = (end - start) / step;
    if span < 0.0 {
        return Ok(ExprValue::Array(Vec::new()));
    }
    let len = span.floor() + 1.0;
    if len > MAX_RANGE_LEN as f64 {
        return Err(ExprError::runtime(format!(
            "range has {len} elements (max {MAX_RANGE_LEN})"
        )));
    }
    let count = len as usize;
    Ok(ExprValue::Array(
        (0..count)
            .map(|i| ExprValue::Number(start + step * i as f64))
            .collect(),
    ))
}

fn index_value(target: &ExprValue, index: &ExprValue) -> Result<ExprValue, ExprError> {
    match (target, index) {
        (ExprValue::Object(fields), ExprValue::Str(key)) => fields
            .get(key)
            .cloned()
            .ok_or_else(|| ExprError::runtime(format!("object has no property {key}"))),
        (ExprValue::Array(items), idx) => {
            let i = one_based(idx.as_f64()?, items.len())?;
            Ok(items[i].clone())
        }
        (ExprValue::Str(s), idx) => {
            let chars: Vec<char> = s.chars().collect();
            let i = one_based(idx.as_f64()?, chars.len())?;
            Ok(ExprValue::Str(chars[i].to_string()))
        }
        (other, _) => Err(ExprError::runtime(format!(
            "cannot index {}",
            other.type_name()
        ))),
    }
}

fn one_based(i: f64, len: usize) -> Result<usize, ExprError> {
    if i.fract() != 0.0 || i < 1.0 || i > len as f64 {
        return Err(ExprError::runtime(format!(
            "index {i} out of range [1, {len}]"
        )));
    }
    Ok(i as usize - 1)
}

/// Flatten numeric arguments: either variadic numbers or a single array.
fn numbers(args: &[ExprValue]) -> Result<Vec<f64>, ExprError> {
    fn push_all(v: &ExprValue, out: &mut Vec<f64>) -> Result<(), ExprError> {
        match v {
            ExprValue::Array(items) => items.iter().try_for_each(|i| push_all(i, out)),
            other => {
                out.push(other.as_f64()?);
                Ok(())
            }
        }
    }

    let mut out = Vec::with_capacity(args.len());
    for a in args {
        push_all(a, &mut out)?;
    }
    Ok(out)
}

fn expect_argc(name: &str, args: &[ExprValue], n: usize) -> Result<(), ExprError> {
    if args.len() != n {
        return Err(ExprError::runtime(format!(
            "{name} expects {n} arg(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn call_builtin(name: &str, args: &[ExprValue]) -> Result<ExprValue, ExprError> {
    let unary: Option<fn(f64) -> f64> = match name {
        "abs" => Some(f64::abs),
        "sqrt" => Some(f64::sqrt),
        "cbrt" => Some(f64::cbrt),
        "exp" => Some(f64::exp),
        "log2" => Some(f64::log2),
        "log10" => Some(f64::log10),
        "floor" => Some(f64::floor),
        "ceil" => Some(f64::ceil),
        "round" => Some(f64::round),
        "sign" => Some(|x: f64| if x == 0.0 { 0.0 } else { x.signum() }),
        "sin" => Some(f64::sin),
        "cos" => Some(f64::cos),
        "tan" => Some(f64::tan),
        "asin" => Some(f64::asin),
        "acos" => Some(f64::acos),
        "atan" => Some(f64::atan),
        _ => None,
    };
    if let Some(f) = unary {
        expect_argc(name, args, 1)?;
        return map_numeric(&args[0], f);
    }

    match name {
        "log" => match args {
            [x] => map_numeric(x, f64::ln),
            [x, base] => {
                let base = base.as_f64()?;
                map_numeric(x, |v| v.log(base))
            }
            _ => Err(ExprError::runtime("log expects 1 or 2 args")),
        },
        "pow" => {
            expect_argc(name, args, 2)?;
            zip_numeric(&args[0], &args[1], f64::powf)
        }
        "mod" => {
            expect_argc(name, args, 2)?;
            zip_numeric(&args[0], &args[1], modulo)
        }
        "atan2" => {
            expect_argc(name, args, 2)?;
            zip_numeric(&args[0], &args[1], f64::atan2)
        }
        "hypot" => {
            let n = numbers(args)?;
            Ok(ExprValue::Number(n.iter().map(|v| v * v).sum::<f64>().sqrt()))
        }
        "min" | "max" => {
            let n = numbers(args)?;
            if n.is_empty() {
                return Err(ExprError::runtime(format!("{name} expects at least 1 arg")));
            }
            let init = n[0];
            let v = if name == "min" {
                n.iter().copied().fold(init, f64::min)
            } else {
                n.iter().copied().fold(init, f64::max)
            };
            Ok(ExprValue::Number(v))
        }
        "clamp" => {
            expect_argc(name, args, 3)?;
            let lo = args[1].as_f64()?;
            let hi = args[2].as_f64()?;
            map_numeric(&args[0], |x| x.max(lo).min(hi))
        }
        "lerp" => {
            expect_argc(name, args, 3)?;
            let t = args[2].as_f64()?;
            zip_numeric(&args[0], &args[1], |a, b| a + (b - a) * t)
        }
        "sum" => Ok(ExprValue::Number(numbers(args)?.iter().sum())),
        "mean" => {
            let n = numbers(args)?;
            if n.is_empty() {
                return Err(ExprError::runtime("mean of an empty set"));
            }
            Ok(ExprValue::Number(n.iter().sum::<f64>() / n.len() as f64))
        }
        "size" => {
            expect_argc(name, args, 1)?;
            Ok(match &args[0] {
                ExprValue::Array(items) => {
                    ExprValue::Array(vec![ExprValue::Number(items.len() as f64)])
                }
                ExprValue::Str(s) => {
                    ExprValue::Array(vec![ExprValue::Number(s.chars().count() as f64)])
                }
                _ => ExprValue::Array(Vec::new()),
            })
        }
        _ => Err(ExprError::runtime(format!("undefined function {name}"))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/interp.rs"]
mod tests;

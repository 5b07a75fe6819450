//! Expression evaluation against a single annotation
//!
//! Values are `serde_json::Value`s. Paths into the annotation's payload are
//! borrowed rather than cloned; computed values are owned.
//!
//! The input variable exposes:
//! - `annotation.coordinate`: the coordinate as `Coordinate::to_json` renders it
//! - `annotation.group`: the group key
//! - `annotation.timestamp`: the write timestamp
//! - `annotation.payload`: the payload document
//!
//! Missing fields and out-of-range indexes evaluate to `null`.
//!
//! Integers stay exact: comparisons between integers never pass through
//! `f64`, and `+ - * % /` on integers produce integers while the result
//! fits in `u64`/`i64` (and, for `/`, divides evenly).

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use super::parser::{BinaryOp, Expr, Function, UnaryOp};
use crate::error::ScriptError;
use annostore_core::{Annotation, Coordinate};

type Eval<'a> = Result<Cow<'a, Value>, ScriptError>;

static NULL: Value = Value::Null;

pub(crate) fn evaluate<'a, T: Coordinate>(expr: &'a Expr, annotation: &'a Annotation<T>) -> Eval<'a> {
    match expr {
        Expr::Literal(value) => Ok(Cow::Borrowed(value)),
        Expr::Input => Ok(Cow::Owned(annotation_object(annotation))),
        Expr::Field(base, name) => {
            if let Expr::Input = **base {
                return Ok(annotation_field(annotation, name));
            }
            let base = evaluate(base, annotation)?;
            Ok(child(base, |v| v.get(name.as_str())))
        }
        Expr::Index(base, index) => {
            let base = evaluate(base, annotation)?;
            let index = evaluate(index, annotation)?;
            match index.as_ref() {
                Value::String(key) => Ok(child(base, |v| v.as_object().and_then(|o| o.get(key)))),
                Value::Number(n) => match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 => {
                        let i = f as usize;
                        Ok(child(base, |v| v.as_array().and_then(|a| a.get(i))))
                    }
                    _ => Err(ScriptError::eval(format!("invalid index {}", n))),
                },
                other => Err(ScriptError::eval(format!(
                    "cannot index with {}",
                    type_name(other)
                ))),
            }
        }
        Expr::Unary(op, operand) => {
            let value = evaluate(operand, annotation)?;
            match (op, value.as_ref()) {
                (UnaryOp::Not, Value::Bool(b)) => Ok(Cow::Owned(Value::Bool(!b))),
                (UnaryOp::Neg, Value::Number(n)) => match integer(n).and_then(|i| exact(-i)) {
                    Some(value) => Ok(Cow::Owned(value)),
                    None => number(-to_f64(n)),
                },
                (UnaryOp::Not, other) => Err(ScriptError::eval(format!(
                    "'!' expects boolean, got {}",
                    type_name(other)
                ))),
                (UnaryOp::Neg, other) => Err(ScriptError::eval(format!(
                    "'-' expects number, got {}",
                    type_name(other)
                ))),
            }
        }
        Expr::And(left, right) => {
            if !boolean(&*evaluate(left, annotation)?, "&&")? {
                return Ok(Cow::Owned(Value::Bool(false)));
            }
            Ok(Cow::Owned(Value::Bool(boolean(&*evaluate(right, annotation)?, "&&")?)))
        }
        Expr::Or(left, right) => {
            if boolean(&*evaluate(left, annotation)?, "||")? {
                return Ok(Cow::Owned(Value::Bool(true)));
            }
            Ok(Cow::Owned(Value::Bool(boolean(&*evaluate(right, annotation)?, "||")?)))
        }
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, annotation)?;
            let right = evaluate(right, annotation)?;
            binary(*op, &left, &right)
        }
        Expr::Call(function, args) => {
            let args = args
                .iter()
                .map(|a| evaluate(a, annotation))
                .collect::<Result<Vec<_>, _>>()?;
            call(*function, &args)
        }
    }
}

fn annotation_field<'a, T: Coordinate>(annotation: &'a Annotation<T>, name: &str) -> Cow<'a, Value> {
    match name {
        "coordinate" => Cow::Owned(annotation.coordinate().to_json()),
        "group" => Cow::Owned(Value::String(annotation.group().to_string())),
        "timestamp" => Cow::Owned(Value::from(annotation.timestamp())),
        "payload" => Cow::Borrowed(annotation.payload()),
        _ => Cow::Owned(Value::Null),
    }
}

fn annotation_object<T: Coordinate>(annotation: &Annotation<T>) -> Value {
    let mut object = Map::new();
    object.insert("coordinate".into(), annotation.coordinate().to_json());
    object.insert("group".into(), Value::String(annotation.group().to_string()));
    object.insert("timestamp".into(), Value::from(annotation.timestamp()));
    object.insert("payload".into(), annotation.payload().clone());
    Value::Object(object)
}

/// Select a child of `base`, borrowing when `base` is borrowed
fn child<'a>(base: Cow<'a, Value>, select: impl Fn(&Value) -> Option<&Value>) -> Cow<'a, Value> {
    match base {
        Cow::Borrowed(v) => select(v).map_or(Cow::Owned(Value::Null), Cow::Borrowed),
        Cow::Owned(v) => Cow::Owned(select(&v).cloned().unwrap_or(Value::Null)),
    }
}

fn binary<'a>(op: BinaryOp, left: &Value, right: &Value) -> Eval<'a> {
    match op {
        BinaryOp::Eq => Ok(Cow::Owned(Value::Bool(loose_eq(left, right)))),
        BinaryOp::Ne => Ok(Cow::Owned(Value::Bool(!loose_eq(left, right)))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right)?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Cow::Owned(Value::Bool(result)))
        }
        BinaryOp::Add if left.is_string() || right.is_string() => {
            Ok(Cow::Owned(Value::String(format!("{}{}", display(left), display(right)))))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (a, b) = match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    if let Some(value) = integer_arithmetic(op, a, b) {
                        return Ok(Cow::Owned(value));
                    }
                    (to_f64(a), to_f64(b))
                }
                _ => {
                    return Err(ScriptError::eval(format!(
                        "arithmetic on {} and {}",
                        type_name(left),
                        type_name(right)
                    )))
                }
            };
            number(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            })
        }
    }
}

fn call<'a>(function: Function, args: &[Cow<'_, Value>]) -> Eval<'a> {
    let first = args[0].as_ref();
    let second = args.get(1).map(|a| a.as_ref()).unwrap_or(&NULL);
    let result = match function {
        Function::Len => match first {
            Value::String(s) => Value::from(s.chars().count()),
            Value::Array(a) => Value::from(a.len()),
            Value::Object(o) => Value::from(o.len()),
            other => {
                return Err(ScriptError::eval(format!(
                    "len() expects string, array or object, got {}",
                    type_name(other)
                )))
            }
        },
        Function::Contains => match first {
            Value::Array(items) => Value::Bool(items.iter().any(|item| loose_eq(item, second))),
            _ => Value::Bool(text(function, first)?.contains(text(function, second)?)),
        },
        Function::StartsWith => Value::Bool(text(function, first)?.starts_with(text(function, second)?)),
        Function::EndsWith => Value::Bool(text(function, first)?.ends_with(text(function, second)?)),
        Function::Lower => Value::String(text(function, first)?.to_lowercase()),
        Function::Upper => Value::String(text(function, first)?.to_uppercase()),
        Function::Exists => Value::Bool(!first.is_null()),
    };
    Ok(Cow::Owned(result))
}

fn text(function: Function, value: &Value) -> Result<&str, ScriptError> {
    value.as_str().ok_or_else(|| {
        ScriptError::eval(format!(
            "{}() expects string, got {}",
            function.name(),
            type_name(value)
        ))
    })
}

/// Equality with numbers compared by value (`2 == 2.0`)
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, ScriptError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            compare_numbers(a, b).ok_or_else(|| ScriptError::eval("incomparable numbers"))
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(ScriptError::eval(format!(
            "cannot compare {} with {}",
            type_name(left),
            type_name(right)
        ))),
    }
}

fn boolean(value: &Value, operator: &str) -> Result<bool, ScriptError> {
    value.as_bool().ok_or_else(|| {
        ScriptError::eval(format!(
            "'{}' expects boolean operands, got {}",
            operator,
            type_name(value)
        ))
    })
}

fn number<'a>(value: f64) -> Eval<'a> {
    Number::from_f64(value)
        .map(|n| Cow::Owned(Value::Number(n)))
        .ok_or_else(|| ScriptError::eval(format!("arithmetic produced {}", value)))
}

fn to_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

/// Integer value of `n`, or `None` for floats
fn integer(n: &Number) -> Option<i128> {
    n.as_u64()
        .map(i128::from)
        .or_else(|| n.as_i64().map(i128::from))
}

/// `value` as a JSON integer, if it fits `u64` or `i64`
fn exact(value: i128) -> Option<Value> {
    u64::try_from(value)
        .map(Value::from)
        .or_else(|_| i64::try_from(value).map(Value::from))
        .ok()
}

fn integer_arithmetic(op: BinaryOp, a: &Number, b: &Number) -> Option<Value> {
    let (a, b) = (integer(a)?, integer(b)?);
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Rem => a.checked_rem(b),
        BinaryOp::Div if b != 0 && a % b == 0 => a.checked_div(b),
        _ => None,
    }?;
    exact(result)
}

/// Order two numbers without rounding integers through `f64`
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (integer(a), integer(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        (Some(x), None) => compare_integer_float(x, to_f64(b)),
        (None, Some(y)) => compare_integer_float(y, to_f64(a)).map(Ordering::reverse),
        (None, None) => to_f64(a).partial_cmp(&to_f64(b)),
    }
}

fn compare_integer_float(i: i128, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    // Past every u64/i64; also keeps the cast below inside i128
    if f >= 1.0e38 {
        return Some(Ordering::Less);
    }
    if f <= -1.0e38 {
        return Some(Ordering::Greater);
    }
    let floor = f.floor();
    Some(match i.cmp(&(floor as i128)) {
        Ordering::Equal if floor != f => Ordering::Less,
        other => other,
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // Whole numbers print without a trailing ".0"
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Aggregate expression operators

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use crate::document::Value;
use crate::query::AggregateOp;

/// A numeric operand, keeping integers exact for as long as possible
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int32(i) => Some(Number::Int(*i as i64)),
            Value::Int64(i) => Some(Number::Int(*i)),
            Value::Float64(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn combine(
        self,
        other: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => match int_op(a, b) {
                Some(n) => Number::Int(n),
                None => Number::Float(float_op(a as f64, b as f64)),
            },
            (a, b) => Number::Float(float_op(a.as_f64(), b.as_f64())),
        }
    }

    pub(crate) fn add(self, other: Number) -> Number {
        self.combine(other, i64::checked_add, |a, b| a + b)
    }

    fn sub(self, other: Number) -> Number {
        self.combine(other, i64::checked_sub, |a, b| a - b)
    }

    pub(crate) fn mul(self, other: Number) -> Number {
        self.combine(other, i64::checked_mul, |a, b| a * b)
    }

    pub(crate) fn div(self, other: Number) -> Option<Number> {
        let divisor = other.as_f64();
        if divisor == 0.0 {
            return None;
        }
        Some(Number::Float(self.as_f64() / divisor))
    }

    fn rem(self, other: Number) -> Option<Number> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.checked_rem(b).map(Number::Int),
            (a, b) if b.as_f64() != 0.0 => Some(Number::Float(a.as_f64() % b.as_f64())),
            _ => None,
        }
    }

    pub(crate) fn into_value(self) -> Value {
        match self {
            Number::Int(i) => match i32::try_from(i) {
                Ok(small) => Value::Int32(small),
                Err(_) => Value::Int64(i),
            },
            Number::Float(f) => Value::Float64(f),
        }
    }
}

fn is_nullish(arg: &Option<Value>) -> bool {
    matches!(arg, None | Some(Value::Null))
}

impl AggregateOp {
    /// Apply the operator to resolved arguments
    pub fn evaluate(self, args: &[Option<Value>]) -> Option<Value> {
        match self {
            AggregateOp::Add => add(args),
            AggregateOp::Multiply => fold_numbers(args, Number::Int(1), Number::mul),
            AggregateOp::Subtract => subtract(args),
            AggregateOp::Divide => binary_numeric(args, Number::div),
            AggregateOp::Mod => binary_numeric(args, Number::rem),
            AggregateOp::Cmp => {
                let ordering = Value::compare_optional(args.first()?.as_ref(), args.get(1)?.as_ref());
                Some(ordering_value(ordering))
            }
            AggregateOp::Concat => concat(args),
            AggregateOp::Strcasecmp => {
                let a = string_arg(args.first()?)?.to_uppercase();
                let b = string_arg(args.get(1)?)?.to_uppercase();
                Some(ordering_value(a.cmp(&b)))
            }
            AggregateOp::Substr => substr(args),
            AggregateOp::ToLower => Some(Value::String(string_arg(args.first()?)?.to_lowercase())),
            AggregateOp::ToUpper => Some(Value::String(string_arg(args.first()?)?.to_uppercase())),
            AggregateOp::Eq
            | AggregateOp::Ne
            | AggregateOp::Gt
            | AggregateOp::Gte
            | AggregateOp::Lt
            | AggregateOp::Lte => {
                let op = self.comparison()?;
                let rhs = args.get(1)?.clone().unwrap_or(Value::Null);
                Some(Value::Bool(op.matches(args.first()?.as_ref(), &rhs)))
            }
        }
    }
}

fn ordering_value(ordering: Ordering) -> Value {
    Value::Int32(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

fn add(args: &[Option<Value>]) -> Option<Value> {
    if args.iter().any(is_nullish) {
        return Some(Value::Null);
    }

    let mut date: Option<DateTime<Utc>> = None;
    let mut total = Number::Int(0);
    for arg in args.iter().flatten() {
        match arg {
            Value::DateTime(dt) if date.is_none() => date = Some(*dt),
            other => total = total.add(Number::from_value(other)?),
        }
    }

    match date {
        Some(dt) => shift_date(dt, total.as_f64()).map(Value::DateTime),
        None => Some(total.into_value()),
    }
}

/// Offset a date by milliseconds; out-of-range results are absent
fn shift_date(dt: DateTime<Utc>, millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    dt.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}

fn fold_numbers(args: &[Option<Value>], init: Number, op: fn(Number, Number) -> Number) -> Option<Value> {
    if args.iter().any(is_nullish) {
        return Some(Value::Null);
    }

    let mut acc = init;
    for arg in args.iter().flatten() {
        acc = op(acc, Number::from_value(arg)?);
    }
    Some(acc.into_value())
}

fn subtract(args: &[Option<Value>]) -> Option<Value> {
    let (a, b) = (args.first()?, args.get(1)?);
    if is_nullish(a) || is_nullish(b) {
        return Some(Value::Null);
    }

    match (a.as_ref()?, b.as_ref()?) {
        (Value::DateTime(x), Value::DateTime(y)) => {
            Some(Number::Int((*x - *y).num_milliseconds()).into_value())
        }
        (Value::DateTime(x), other) => {
            let millis = Number::from_value(other)?.as_f64();
            shift_date(*x, -millis).map(Value::DateTime)
        }
        (x, y) => Some(Number::from_value(x)?.sub(Number::from_value(y)?).into_value()),
    }
}

fn binary_numeric(args: &[Option<Value>], op: fn(Number, Number) -> Option<Number>) -> Option<Value> {
    let (a, b) = (args.first()?, args.get(1)?);
    if is_nullish(a) || is_nullish(b) {
        return Some(Value::Null);
    }

    let x = Number::from_value(a.as_ref()?)?;
    let y = Number::from_value(b.as_ref()?)?;
    op(x, y).map(Number::into_value)
}

fn concat(args: &[Option<Value>]) -> Option<Value> {
    if args.iter().any(is_nullish) {
        return Some(Value::Null);
    }

    let mut out = String::new();
    for arg in args.iter().flatten() {
        out.push_str(arg.as_str()?);
    }
    Some(Value::String(out))
}

/// String view of an argument; null and absent read as the empty string
fn string_arg(arg: &Option<Value>) -> Option<String> {
    match arg {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(value) if value.is_number() || value.is_bool() => Some(value.to_string()),
        Some(_) => None,
    }
}

fn substr(args: &[Option<Value>]) -> Option<Value> {
    let text = string_arg(args.first()?)?;
    let start = args.get(1)?.as_ref()?.as_f64()?;
    let length = args.get(2)?.as_ref()?.as_f64()?;

    if start < 0.0 {
        return Some(Value::String(String::new()));
    }

    let chars = text.chars().skip(start as usize);
    let out: String = if length < 0.0 {
        chars.collect()
    } else {
        chars.take(length as usize).collect()
    };
    Some(Value::String(out))
}

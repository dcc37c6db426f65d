//! Leaf query operators
//!
//! Array-valued fields match when any element satisfies the test. Type
//! mismatches and missing fields never raise; they simply do not match.

use std::cmp::Ordering;

use super::operators::SimpleOp;
use crate::document::Value;

impl SimpleOp {
    /// Evaluate the operator against a resolved field value.
    ///
    /// `actual` is `None` when the field is absent from the document.
    pub fn matches(self, actual: Option<&Value>, operand: &Value) -> bool {
        match self {
            SimpleOp::Eq => eq(actual, operand),
            SimpleOp::Ne => !eq(actual, operand),
            SimpleOp::In => within(actual, operand),
            SimpleOp::Nin => actual.is_none() || !within(actual, operand),
            SimpleOp::Lt => compare_any(actual, operand, Ordering::is_lt),
            SimpleOp::Lte => compare_any(actual, operand, Ordering::is_le),
            SimpleOp::Gt => compare_any(actual, operand, Ordering::is_gt),
            SimpleOp::Gte => compare_any(actual, operand, Ordering::is_ge),
            SimpleOp::Mod => modulo(actual, operand),
            SimpleOp::Regex => match operand.as_regex() {
                Some(re) => candidates(actual)
                    .iter()
                    .any(|v| v.as_str().is_some_and(|s| re.is_match(s))),
                None => false,
            },
            SimpleOp::Exists => match operand.as_bool() {
                Some(expected) => actual.is_some() == expected,
                None => false,
            },
            SimpleOp::All => match (actual.and_then(Value::as_array), operand.as_array()) {
                (Some(values), Some(required)) => required.iter().all(|r| values.contains(r)),
                _ => false,
            },
            SimpleOp::Size => match (actual.and_then(Value::as_array), operand.as_f64()) {
                (Some(values), Some(size)) => values.len() as f64 == size,
                _ => false,
            },
        }
    }
}

/// The values a scalar test is applied to: the elements of an array, the
/// value itself otherwise, nothing when absent.
fn candidates(actual: Option<&Value>) -> &[Value] {
    match actual {
        Some(Value::Array(items)) => items,
        Some(value) => std::slice::from_ref(value),
        None => &[],
    }
}

fn eq(actual: Option<&Value>, operand: &Value) -> bool {
    match actual {
        Some(value) if value == operand => true,
        _ => candidates(actual).iter().any(|v| v == operand),
    }
}

fn within(actual: Option<&Value>, operand: &Value) -> bool {
    let Some(options) = operand.as_array() else {
        return false;
    };
    let Some(value) = actual else {
        return false;
    };

    options.iter().any(|option| match option {
        Value::Regex(re) => candidates(actual)
            .iter()
            .any(|v| v.as_str().is_some_and(|s| re.is_match(s))),
        _ => value == option || candidates(actual).iter().any(|v| v == option),
    })
}

fn compare_any(actual: Option<&Value>, operand: &Value, accept: fn(Ordering) -> bool) -> bool {
    candidates(actual)
        .iter()
        .any(|v| v.partial_compare(operand).is_some_and(accept))
}

fn modulo(actual: Option<&Value>, operand: &Value) -> bool {
    let Some([divisor, remainder]) = operand.as_array().map(Vec::as_slice) else {
        return false;
    };

    candidates(actual).iter().any(|v| {
        if let (Some(x), Some(d), Some(r)) = (v.as_i64(), divisor.as_i64(), remainder.as_i64()) {
            return x.checked_rem(d) == Some(r);
        }
        match (v.as_f64(), divisor.as_f64(), remainder.as_f64()) {
            (Some(x), Some(d), Some(r)) if d != 0.0 => x % d == r,
            _ => false,
        }
    })
}

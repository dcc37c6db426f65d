//! Group accumulators
//!
//! Accumulators fold an expression across every document of a `$group`
//! bucket.

use super::operators::Number;
use super::{compute_value, Expression};
use crate::document::{Document, Value};
use crate::error::{QueryError, Result};
use crate::query::GroupOp;

/// An accumulated field of a `$group` specification
#[derive(Debug, Clone, PartialEq)]
pub enum AccumulatorExpr {
    /// `{"$op": expr}`
    Accumulate(GroupOp, Expression),
    /// A document of nested accumulators
    Object(Vec<(String, AccumulatorExpr)>),
}

impl AccumulatorExpr {
    /// Parse an accumulator specification
    pub fn parse(spec: &Value) -> Result<Self> {
        let doc = spec.as_object().ok_or_else(|| {
            QueryError::InvalidFormat(format!(
                "group field must be an accumulator document, found {}",
                spec.type_name()
            ))
        })?;

        let mut call = None;
        for (key, value) in doc.iter() {
            if !key.starts_with('$') {
                continue;
            }
            let op = GroupOp::from_name(key)
                .ok_or_else(|| QueryError::InvalidOperator(key.to_string()))?;
            if call.is_none() {
                call = Some((op, value));
            }
        }

        if let Some((op, value)) = call {
            return Ok(AccumulatorExpr::Accumulate(op, Expression::parse(value)?));
        }

        doc.iter()
            .map(|(key, value)| Ok((key.to_string(), AccumulatorExpr::parse(value)?)))
            .collect::<Result<Vec<_>>>()
            .map(AccumulatorExpr::Object)
    }
}

/// Accumulate an expression across a bucket of documents
pub fn accumulate(group: &[Document], expr: &AccumulatorExpr) -> Option<Value> {
    match expr {
        AccumulatorExpr::Accumulate(op, inner) => op.apply(group, inner),
        AccumulatorExpr::Object(fields) => {
            let mut out = Document::new();
            for (key, field) in fields {
                if let Some(value) = accumulate(group, field) {
                    out.insert(key.as_str(), value);
                }
            }
            Some(Value::Object(out))
        }
    }
}

impl GroupOp {
    /// Apply the accumulator to a bucket
    pub fn apply(self, group: &[Document], expr: &Expression) -> Option<Value> {
        match self {
            GroupOp::Sum => Some(sum(group, expr).into_value()),
            GroupOp::Avg => {
                if group.is_empty() {
                    return None;
                }
                let count = Number::Int(group.len() as i64);
                sum(group, expr).div(count).map(Number::into_value)
            }
            GroupOp::Max => present_values(group, expr).max_by(|a, b| a.compare(b)),
            GroupOp::Min => present_values(group, expr).min_by(|a, b| a.compare(b)),
            GroupOp::Push => Some(Value::Array(
                group.iter().filter_map(|doc| compute_value(doc, expr)).collect(),
            )),
            GroupOp::AddToSet => {
                let mut set: Vec<Value> = Vec::new();
                for value in group.iter().filter_map(|doc| compute_value(doc, expr)) {
                    if !set.contains(&value) {
                        set.push(value);
                    }
                }
                Some(Value::Array(set))
            }
            GroupOp::First => group.first().and_then(|doc| compute_value(doc, expr)),
            GroupOp::Last => group.last().and_then(|doc| compute_value(doc, expr)),
        }
    }
}

fn sum(group: &[Document], expr: &Expression) -> Number {
    if let Some(n) = expr.as_number().and_then(Number::from_value) {
        return Number::Int(group.len() as i64).mul(n);
    }

    group
        .iter()
        .filter_map(|doc| compute_value(doc, expr))
        .filter_map(|value| Number::from_value(&value))
        .fold(Number::Int(0), Number::add)
}

/// Computed values of a bucket, skipping absent values and nulls
fn present_values<'a>(
    group: &'a [Document],
    expr: &'a Expression,
) -> impl Iterator<Item = Value> + 'a {
    group
        .iter()
        .filter_map(move |doc| compute_value(doc, expr))
        .filter(|value| !value.is_null())
}

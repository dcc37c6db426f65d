//! Expression evaluation for `$project` and `$group`
//!
//! Expressions are parsed once into a tagged tree and evaluated against a
//! document (or accumulated across a bucket of documents) without
//! re-inspecting the raw specification.

pub mod accumulators;
mod operators;

pub use accumulators::{accumulate, AccumulatorExpr};

use crate::document::{Document, Value};
use crate::error::{QueryError, Result};
use crate::query::AggregateOp;

/// A value-producing construct
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A value returned as is
    Literal(Value),
    /// `"$path"`: the value at a dot path of the current document
    FieldRef(String),
    /// A document whose fields are expressions
    Object(Vec<(String, Expression)>),
    /// An array whose elements are expressions
    Array(Vec<Expression>),
    /// An aggregate operator applied to its arguments
    Operator(AggregateOp, Vec<Expression>),
}

impl Expression {
    /// Parse an expression specification.
    ///
    /// In a document, the first aggregate operator key makes the whole
    /// document that operator call. Other `$`-prefixed keys are rejected.
    pub fn parse(spec: &Value) -> Result<Self> {
        match spec {
            Value::String(s) => match s.strip_prefix('$') {
                Some(path) => Ok(Expression::FieldRef(path.to_string())),
                None => Ok(Expression::Literal(spec.clone())),
            },
            Value::Array(items) => items
                .iter()
                .map(Expression::parse)
                .collect::<Result<Vec<_>>>()
                .map(Expression::Array),
            Value::Object(doc) => Self::parse_object(doc),
            _ => Ok(Expression::Literal(spec.clone())),
        }
    }

    fn parse_object(doc: &Document) -> Result<Self> {
        let mut call = None;
        for (key, value) in doc.iter() {
            if !key.starts_with('$') {
                continue;
            }
            let op = AggregateOp::from_name(key)
                .ok_or_else(|| QueryError::InvalidOperator(key.to_string()))?;
            if call.is_none() {
                call = Some((op, value));
            }
        }

        if let Some((op, args)) = call {
            return Self::parse_call(op, args);
        }

        doc.iter()
            .map(|(key, value)| Ok((key.to_string(), Expression::parse(value)?)))
            .collect::<Result<Vec<_>>>()
            .map(Expression::Object)
    }

    fn parse_call(op: AggregateOp, args: &Value) -> Result<Self> {
        let args = match args {
            Value::Array(items) => items.iter().map(Expression::parse).collect::<Result<Vec<_>>>()?,
            single => vec![Expression::parse(single)?],
        };

        if let Some(expected) = op.arity() {
            if args.len() != expected {
                return Err(QueryError::InvalidFormat(format!(
                    "{} expects {} argument(s), got {}",
                    op,
                    expected,
                    args.len()
                )));
            }
        }

        Ok(Expression::Operator(op, args))
    }

    /// The literal value, if the expression is a number literal
    pub fn as_number(&self) -> Option<&Value> {
        match self {
            Expression::Literal(v) if v.is_number() => Some(v),
            _ => None,
        }
    }
}

/// Evaluate an expression against one document.
///
/// Returns `None` for an absent value: a missing field, or an operator
/// applied to arguments of the wrong type.
pub fn compute_value(doc: &Document, expr: &Expression) -> Option<Value> {
    match expr {
        Expression::Literal(value) => Some(value.clone()),
        Expression::FieldRef(path) => doc.get_by_path(path).cloned(),
        Expression::Object(fields) => {
            let mut out = Document::new();
            for (key, field) in fields {
                if let Some(value) = compute_value(doc, field) {
                    out.insert(key.as_str(), value);
                }
            }
            Some(Value::Object(out))
        }
        Expression::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| compute_value(doc, item).unwrap_or(Value::Null))
                .collect(),
        )),
        Expression::Operator(op, args) => op.evaluate(&flatten(doc, args)),
    }
}

/// Resolve operator arguments against a document
pub fn flatten(doc: &Document, args: &[Expression]) -> Vec<Option<Value>> {
    args.iter().map(|arg| compute_value(doc, arg)).collect()
}

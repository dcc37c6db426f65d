//! Criteria compiler
//!
//! Turns a criteria document into an ordered list of selectors. Every error a
//! query can raise is raised here; evaluation never fails.

use tracing::trace;

use super::normalize::normalize;
use super::operators::{CompoundOp, SimpleOp};
use super::selector::{CompoundSelector, Query, Selector, SimpleSelector};
use crate::document::{Document, RegexValue, Value};
use crate::error::{QueryError, Result};

const OPTIONS_KEY: &str = "$options";

/// Compiles criteria documents into selectors
pub struct QueryCompiler;

impl QueryCompiler {
    /// Compile criteria, in key order, into selectors
    pub fn compile(criteria: &Document) -> Result<Vec<Selector>> {
        let mut selectors = Vec::with_capacity(criteria.len());

        for (key, value) in criteria.iter() {
            if key.starts_with('$') {
                let op = CompoundOp::from_name(key)
                    .ok_or_else(|| QueryError::InvalidOperator(key.to_string()))?;
                if op.requires_field() {
                    return Err(QueryError::InvalidOperator(format!(
                        "{} must be applied to a field",
                        op
                    )));
                }
                selectors.push(Self::compile_compound(op, None, value)?);
            } else {
                Self::compile_field(key, value, &mut selectors)?;
            }
        }

        Ok(selectors)
    }

    /// Compile the criteria for a single field
    fn compile_field(field: &str, value: &Value, selectors: &mut Vec<Selector>) -> Result<()> {
        let expr = normalize(value);
        let options = expr.get(OPTIONS_KEY);

        if options.is_some() && !expr.contains_key(SimpleOp::Regex.name()) {
            return Err(QueryError::InvalidFormat(format!(
                "{} without $regex on field '{}'",
                OPTIONS_KEY, field
            )));
        }

        for (name, operand) in expr.iter() {
            if name == OPTIONS_KEY {
                continue;
            }

            if let Some(op) = SimpleOp::from_name(name) {
                let operand = match op {
                    SimpleOp::Regex => Value::Regex(Self::compile_regex(operand, options)?),
                    _ => operand.clone(),
                };
                trace!(field, op = op.name(), "simple selector");
                selectors.push(Selector::Simple(SimpleSelector::new(field, op, operand)));
            } else if let Some(op) = CompoundOp::from_name(name) {
                selectors.push(Self::compile_compound(op, Some(field), operand)?);
            } else {
                return Err(QueryError::InvalidOperator(name.to_string()));
            }
        }

        Ok(())
    }

    fn compile_compound(op: CompoundOp, field: Option<&str>, operand: &Value) -> Result<Selector> {
        trace!(field, op = op.name(), "compound selector");

        let compound = match op {
            CompoundOp::And => CompoundSelector::And(Self::compile_all(op, operand)?),
            CompoundOp::Or => CompoundSelector::Or(Self::compile_all(op, operand)?),
            CompoundOp::Nor => CompoundSelector::Nor(Self::compile_all(op, operand)?),
            CompoundOp::Not => {
                let field = field.ok_or_else(|| {
                    QueryError::InvalidOperator("$not must be applied to a field".to_string())
                })?;
                let mut nested = Vec::new();
                Self::compile_field(field, operand, &mut nested)?;
                CompoundSelector::Not(Box::new(Query::from_selectors(nested)))
            }
            CompoundOp::ElemMatch => {
                return Err(QueryError::UnsupportedOperator(
                    "$elemMatch is not implemented".to_string(),
                ))
            }
            CompoundOp::Where => {
                return Err(QueryError::UnsupportedOperator(
                    "$where is not supported".to_string(),
                ))
            }
        };

        Ok(Selector::Compound(compound))
    }

    fn compile_all(op: CompoundOp, operand: &Value) -> Result<Vec<Query>> {
        let items = operand
            .as_array()
            .ok_or_else(|| QueryError::InvalidFormat(format!("{} expects an array", op)))?;

        items
            .iter()
            .map(|item| match item {
                Value::Object(criteria) => Query::new(criteria),
                other => Err(QueryError::InvalidFormat(format!(
                    "{} expects an array of documents, found {}",
                    op,
                    other.type_name()
                ))),
            })
            .collect()
    }

    fn compile_regex(operand: &Value, options: Option<&Value>) -> Result<RegexValue> {
        let options = match options {
            None => "",
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(QueryError::InvalidFormat(format!(
                    "$options must be a string, found {}",
                    other.type_name()
                )))
            }
        };

        match operand {
            Value::String(pattern) => RegexValue::with_options(pattern, options),
            Value::Regex(re) if options.is_empty() => Ok(re.clone()),
            Value::Regex(re) => RegexValue::with_options(re.as_str(), options),
            other => Err(QueryError::InvalidFormat(format!(
                "$regex expects a pattern, found {}",
                other.type_name()
            ))),
        }
    }
}

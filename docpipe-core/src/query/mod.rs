//! Query engine
//!
//! This module compiles MongoDB-style criteria into reusable predicates:
//! - `operators`: the closed operator registry
//! - `normalize`: shorthand expansion of criteria values
//! - `compiler`: criteria to selectors
//! - `selector`: compiled selectors and `Query`

pub mod compiler;
pub mod normalize;
pub mod operators;
pub mod selector;
mod simple;

pub use compiler::QueryCompiler;
pub use normalize::normalize;
pub use operators::{is_query_operator, AggregateOp, CompoundOp, GroupOp, SimpleOp, StageOp};
pub use selector::{CompoundSelector, Query, Selector, SimpleSelector};

use crate::document::Document;
use crate::error::Result;

/// Compile criteria into a `Query`
pub fn compile(criteria: &Document) -> Result<Query> {
    Query::new(criteria)
}

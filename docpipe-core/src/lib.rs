//! docpipe core - in-memory query and aggregation engine
//!
//! This crate evaluates MongoDB-style criteria and aggregation pipelines
//! against collections of documents held in memory:
//! - Document model and field path resolution
//! - Criteria compilation into reusable queries
//! - Expression evaluation and group accumulators
//! - Aggregation pipeline stages
//! - Lazy, memoized cursors

pub mod aggregation;
pub mod cursor;
pub mod document;
pub mod error;
pub mod expression;
pub mod query;

pub use aggregation::*;
pub use cursor::*;
pub use document::*;
pub use error::*;
pub use expression::*;
pub use query::*;

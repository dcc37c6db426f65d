//! Compiled selectors and the `Query` they make up

use tracing::debug;

use super::compiler::QueryCompiler;
use super::operators::SimpleOp;
use crate::cursor::Cursor;
use crate::document::{Document, Value};
use crate::error::Result;

/// A leaf predicate: one operator applied to one field path
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleSelector {
    pub field: String,
    pub op: SimpleOp,
    pub operand: Value,
}

impl SimpleSelector {
    pub fn new(field: impl Into<String>, op: SimpleOp, operand: Value) -> Self {
        Self {
            field: field.into(),
            op,
            operand,
        }
    }

    pub fn test(&self, doc: &Document) -> bool {
        self.op.matches(doc.get_by_path(&self.field), &self.operand)
    }
}

/// A logical combinator over nested queries
#[derive(Debug, Clone, PartialEq)]
pub enum CompoundSelector {
    And(Vec<Query>),
    Or(Vec<Query>),
    Nor(Vec<Query>),
    Not(Box<Query>),
}

impl CompoundSelector {
    pub fn test(&self, doc: &Document) -> bool {
        match self {
            CompoundSelector::And(queries) => queries.iter().all(|q| q.test(doc)),
            CompoundSelector::Or(queries) => queries.iter().any(|q| q.test(doc)),
            CompoundSelector::Nor(queries) => !queries.iter().any(|q| q.test(doc)),
            CompoundSelector::Not(query) => !query.test(doc),
        }
    }
}

/// A compiled predicate unit produced from one criteria entry
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Simple(SimpleSelector),
    Compound(CompoundSelector),
}

impl Selector {
    pub fn test(&self, doc: &Document) -> bool {
        match self {
            Selector::Simple(s) => s.test(doc),
            Selector::Compound(c) => c.test(doc),
        }
    }
}

/// Compiled criteria: an ordered list of selectors combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    selectors: Vec<Selector>,
}

impl Query {
    /// Compile criteria into a query
    pub fn new(criteria: &Document) -> Result<Self> {
        let selectors = QueryCompiler::compile(criteria)?;
        debug!(selectors = selectors.len(), "compiled query");
        Ok(Self { selectors })
    }

    /// Compile criteria given as JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(&Document::from_json(json)?)
    }

    /// A query that matches every document
    pub fn match_all() -> Self {
        Self::default()
    }

    pub(crate) fn from_selectors(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Test a document, stopping at the first selector that fails
    pub fn test(&self, doc: &Document) -> bool {
        self.selectors.iter().all(|s| s.test(doc))
    }

    /// Open a cursor over the documents of `collection` this query matches
    pub fn find<'a>(self, collection: &'a [Document], projection: Option<&Document>) -> Result<Cursor<'a>> {
        Cursor::new(collection, self, projection)
    }
}

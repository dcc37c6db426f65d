//! Cursor over the result of a query
//!
//! Results are computed on first access and cached for the life of the
//! cursor. Configuration (`sort`, `skip`, `limit`) must happen before any
//! fetch method is called.

use std::cell::OnceCell;

use tracing::debug;

use crate::aggregation::{Aggregator, PipelineStage, Projection, Sort};
use crate::document::{Document, Value};
use crate::error::Result;
use crate::expression::Expression;
use crate::query::{GroupOp, Query};

/// Deferred, memoized view of the documents a query matches
#[derive(Debug)]
pub struct Cursor<'a> {
    collection: &'a [Document],
    query: Query,
    sort: Option<Sort>,
    skip: Option<usize>,
    limit: Option<usize>,
    projection: Option<Projection>,
    results: OnceCell<Vec<Document>>,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(collection: &'a [Document], query: Query, projection: Option<&Document>) -> Result<Self> {
        let projection = match projection {
            Some(spec) if !spec.is_empty() => Some(Projection::parse(spec)?),
            _ => None,
        };

        Ok(Self {
            collection,
            query,
            sort: None,
            skip: None,
            limit: None,
            projection,
            results: OnceCell::new(),
            position: 0,
        })
    }

    /// Order results by a sort specification
    pub fn sort(mut self, spec: &Document) -> Result<Self> {
        self.sort = Some(Sort::parse(spec)?);
        Ok(self)
    }

    /// Skip the first `n` results
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = Some(n);
        self
    }

    /// Return at most `n` results
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    fn evaluate(&self) -> Vec<Document> {
        let matched: Vec<Document> = self
            .collection
            .iter()
            .filter(|doc| self.query.test(doc))
            .cloned()
            .collect();

        let mut stages = Vec::new();
        if let Some(sort) = &self.sort {
            stages.push(PipelineStage::Sort(sort.clone()));
        }
        if let Some(n) = self.skip {
            stages.push(PipelineStage::Skip(n));
        }
        if let Some(n) = self.limit {
            stages.push(PipelineStage::Limit(n));
        }
        if let Some(projection) = &self.projection {
            stages.push(PipelineStage::Project(projection.clone()));
        }

        debug!(
            scanned = self.collection.len(),
            matched = matched.len(),
            stages = stages.len(),
            "materializing cursor"
        );
        Aggregator::from_stages(stages).run_owned(matched)
    }

    /// All results
    pub fn all(&self) -> &[Document] {
        self.results.get_or_init(|| self.evaluate())
    }

    /// First result
    pub fn one(&self) -> Option<&Document> {
        self.all().first()
    }

    /// Number of results
    pub fn count(&self) -> usize {
        self.all().len()
    }

    /// True while `next` has results left to return
    pub fn has_next(&self) -> bool {
        self.position < self.all().len()
    }

    /// Return the next result and advance
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&Document> {
        self.all();
        let doc = self.results.get()?.get(self.position)?;
        self.position += 1;
        Some(doc)
    }

    /// Largest value of an expression across the results
    pub fn max(&self, expr: &Value) -> Result<Option<Value>> {
        let expr = Expression::parse(expr)?;
        Ok(GroupOp::Max.apply(self.all(), &expr))
    }

    /// Smallest value of an expression across the results
    pub fn min(&self, expr: &Value) -> Result<Option<Value>> {
        let expr = Expression::parse(expr)?;
        Ok(GroupOp::Min.apply(self.all(), &expr))
    }

    /// Consume the cursor, returning all results
    pub fn into_vec(self) -> Vec<Document> {
        self.all();
        self.results.into_inner().unwrap_or_default()
    }
}

/// Open a cursor over the documents of `collection` matching `criteria`
pub fn find<'a>(
    collection: &'a [Document],
    criteria: &Document,
    projection: Option<&Document>,
) -> Result<Cursor<'a>> {
    Query::new(criteria)?.find(collection, projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::try_from(value).unwrap()
    }

    fn people() -> Vec<Document> {
        crate::document::documents_from_value(Value::from(json!([
            {"_id": 1, "name": "ann", "age": 31},
            {"_id": 2, "name": "bob", "age": 17},
            {"_id": 3, "name": "cid", "age": 45},
            {"_id": 4, "name": "dee", "age": 22}
        ])))
        .unwrap()
    }

    #[test]
    fn test_cursor_filters_and_counts() {
        let people = people();
        let cursor = find(&people, &doc(json!({"age": {"$gte": 18}})), None).unwrap();
        assert_eq!(cursor.count(), 3);
        assert_eq!(cursor.one().unwrap().get("name"), Some(&Value::from("ann")));
    }

    #[test]
    fn test_cursor_applies_sort_skip_limit_project() {
        let people = people();
        let cursor = find(&people, &Document::new(), Some(&doc(json!({"name": 1, "_id": 0}))))
            .unwrap()
            .sort(&doc(json!({"age": -1})))
            .unwrap()
            .skip(1)
            .limit(2);
        assert_eq!(cursor.all(), &[doc(json!({"name": "ann"})), doc(json!({"name": "dee"}))]);
    }

    #[test]
    fn test_cursor_memoizes_results() {
        let people = people();
        let cursor = find(&people, &doc(json!({"age": {"$lt": 40}})), None).unwrap();
        let first = cursor.all().as_ptr();
        let second = cursor.all().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cursor_iteration() {
        let people = people();
        let mut cursor = find(&people, &doc(json!({"age": {"$gt": 30}})), None).unwrap();
        assert!(cursor.has_next());
        assert_eq!(cursor.next().unwrap().get("_id"), Some(&Value::Int32(1)));
        assert!(cursor.has_next());
        assert_eq!(cursor.next().unwrap().get("_id"), Some(&Value::Int32(3)));
        assert!(!cursor.has_next());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_cursor_max_min() {
        let people = people();
        let cursor = find(&people, &Document::new(), None).unwrap();
        assert_eq!(cursor.max(&Value::from("$age")).unwrap(), Some(Value::Int32(45)));
        assert_eq!(cursor.min(&Value::from("$age")).unwrap(), Some(Value::Int32(17)));
        assert_eq!(cursor.max(&Value::from("$missing")).unwrap(), None);
    }

    #[test]
    fn test_into_vec() {
        let people = people();
        let results = find(&people, &doc(json!({"name": {"$in": ["bob", "dee"]}})), None)
            .unwrap()
            .into_vec();
        assert_eq!(results.len(), 2);
    }
}

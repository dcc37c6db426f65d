//! Stage specifications: projection, grouping, sorting and unwinding

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::document::{Document, Value, ID_FIELD};
use crate::error::{QueryError, Result};
use crate::expression::{accumulate, compute_value, AccumulatorExpr, Expression};

/// How a `$project` key treats its field
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionField {
    Include,
    Exclude,
    Computed(Expression),
}

/// `$project` specification
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    fields: Vec<(String, ProjectionField)>,
}

impl Projection {
    /// Parse a projection document.
    ///
    /// `true` and non-zero numbers include a field, `false` and `0` exclude it,
    /// strings, documents and arrays are computed expressions.
    pub fn parse(spec: &Document) -> Result<Self> {
        let mut fields = Vec::with_capacity(spec.len());
        for (key, value) in spec.iter() {
            let field = match value {
                Value::Bool(true) => ProjectionField::Include,
                Value::Bool(false) => ProjectionField::Exclude,
                v if v.is_number() => {
                    if v.as_f64() == Some(0.0) {
                        ProjectionField::Exclude
                    } else {
                        ProjectionField::Include
                    }
                }
                Value::String(_) | Value::Object(_) | Value::Array(_) => {
                    ProjectionField::Computed(Expression::parse(value)?)
                }
                other => {
                    return Err(QueryError::InvalidFormat(format!(
                        "invalid projection value for '{}': {}",
                        key,
                        other.type_name()
                    )))
                }
            };
            fields.push((key.to_string(), field));
        }
        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn is_inclusion(&self) -> bool {
        self.fields
            .iter()
            .any(|(_, f)| matches!(f, ProjectionField::Include))
    }

    fn excludes(&self, path: &str) -> bool {
        self.fields
            .iter()
            .any(|(k, f)| k == path && matches!(f, ProjectionField::Exclude))
    }

    /// Project one document.
    ///
    /// Computed fields are evaluated against the input before any of them is
    /// written; an absent result removes the field.
    pub fn apply(&self, mut doc: Document) -> Document {
        let computed: Vec<(&str, Option<Value>)> = self
            .fields
            .iter()
            .filter_map(|(key, field)| match field {
                ProjectionField::Computed(expr) => Some((key.as_str(), compute_value(&doc, expr))),
                _ => None,
            })
            .collect();

        for (path, value) in computed {
            match value {
                Some(value) => doc.set_by_path(path, value),
                None => {
                    doc.remove_by_path(path);
                }
            }
        }

        if self.is_inclusion() {
            let mut out = Document::new();
            if !self.excludes(ID_FIELD) {
                if let Some(id) = doc.get(ID_FIELD) {
                    out.insert(ID_FIELD, id.clone());
                }
            }
            for (path, field) in &self.fields {
                if matches!(field, ProjectionField::Exclude) {
                    continue;
                }
                if let Some(value) = doc.get_by_path(path) {
                    out.set_by_path(path, value.clone());
                }
            }
            out
        } else {
            for (path, field) in &self.fields {
                if matches!(field, ProjectionField::Exclude) {
                    doc.remove_by_path(path);
                }
            }
            doc
        }
    }
}

/// `$group` specification
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    id: Expression,
    fields: Vec<(String, AccumulatorExpr)>,
}

impl GroupSpec {
    pub fn parse(spec: &Document) -> Result<Self> {
        let id = spec
            .get(ID_FIELD)
            .ok_or_else(|| QueryError::InvalidFormat("$group requires an _id field".to_string()))?;
        let id = Expression::parse(id)?;

        let fields = spec
            .iter()
            .filter(|(key, _)| *key != ID_FIELD)
            .map(|(key, value)| Ok((key.to_string(), AccumulatorExpr::parse(value)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { id, fields })
    }

    /// Bucket documents by `_id` and accumulate each field.
    ///
    /// Buckets are emitted in the order their key is first seen. Callers
    /// must not rely on this order.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut buckets: Vec<(Value, Vec<Document>)> = Vec::new();

        for doc in docs {
            let id = compute_value(&doc, &self.id).unwrap_or(Value::Null);
            let key = id.canonical_key();
            match index.get(&key) {
                Some(&i) => buckets[i].1.push(doc),
                None => {
                    index.insert(key, buckets.len());
                    buckets.push((id, vec![doc]));
                }
            }
        }

        buckets
            .into_iter()
            .map(|(id, group)| {
                let mut out = Document::new();
                out.insert(ID_FIELD, id);
                for (key, expr) in &self.fields {
                    let value = accumulate(&group, expr).unwrap_or(Value::Null);
                    out.insert(key.as_str(), value);
                }
                out
            })
            .collect()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn parse(field: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => match s.as_str() {
                "asc" | "ascending" => Ok(SortOrder::Ascending),
                "desc" | "descending" => Ok(SortOrder::Descending),
                _ => Err(QueryError::InvalidFormat(format!(
                    "sort value for '{}' must be 'asc' or 'desc'",
                    field
                ))),
            },
            v => match v.as_f64() {
                Some(n) if n == 1.0 => Ok(SortOrder::Ascending),
                Some(n) if n == -1.0 => Ok(SortOrder::Descending),
                _ => Err(QueryError::InvalidFormat(format!(
                    "sort value for '{}' must be 1 or -1",
                    field
                ))),
            },
        }
    }
}

/// `$sort` specification: keys in priority order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sort {
    keys: Vec<(String, SortOrder)>,
}

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(spec: &Document) -> Result<Self> {
        spec.iter()
            .map(|(field, value)| Ok((field.to_string(), SortOrder::parse(field, value)?)))
            .collect::<Result<Vec<_>>>()
            .map(|keys| Self { keys })
    }

    /// Add a sort key
    pub fn add(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.keys.push((field.into(), order));
        self
    }

    pub fn keys(&self) -> &[(String, SortOrder)] {
        &self.keys
    }

    /// Compare two documents by every key, left to right
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, order) in &self.keys {
            let cmp = Value::compare_optional(a.get_by_path(field), b.get_by_path(field));
            let cmp = match order {
                SortOrder::Ascending => cmp,
                SortOrder::Descending => cmp.reverse(),
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }

    /// Stable sort; documents equal on every key keep their input order
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if !self.keys.is_empty() {
            docs.sort_by(|a, b| self.compare(a, b));
        }
        docs
    }
}

/// Emit one document per element of the array at `path`.
///
/// Documents whose field is absent, not an array or an empty array are
/// dropped.
pub fn unwind(docs: Vec<Document>, path: &str) -> Vec<Document> {
    let mut out = Vec::with_capacity(docs.len());
    for mut doc in docs {
        let items = match doc.get_by_path_mut(path) {
            Some(Value::Array(items)) => std::mem::take(items),
            _ => continue,
        };
        for item in items {
            let mut copy = doc.clone();
            copy.set_by_path(path, item);
            out.push(copy);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::try_from(value).unwrap()
    }

    fn docs(value: serde_json::Value) -> Vec<Document> {
        crate::document::documents_from_value(Value::from(value)).unwrap()
    }

    #[test]
    fn test_projection_inclusion_keeps_id() {
        let projection = Projection::parse(&doc(json!({"name": 1}))).unwrap();
        let out = projection.apply(doc(json!({"_id": 7, "name": "a", "age": 3})));
        assert_eq!(out, doc(json!({"_id": 7, "name": "a"})));

        let projection = Projection::parse(&doc(json!({"name": true, "_id": 0}))).unwrap();
        let out = projection.apply(doc(json!({"_id": 7, "name": "a", "age": 3})));
        assert_eq!(out, doc(json!({"name": "a"})));
    }

    #[test]
    fn test_projection_exclusion() {
        let projection = Projection::parse(&doc(json!({"age": 0, "meta.secret": false}))).unwrap();
        let out = projection.apply(doc(json!({"name": "a", "age": 3, "meta": {"secret": 1, "k": 2}})));
        assert_eq!(out, doc(json!({"name": "a", "meta": {"k": 2}})));
    }

    #[test]
    fn test_projection_computed_fields() {
        let projection = Projection::parse(&doc(json!({
            "name": 1,
            "full": {"$concat": ["$first", " ", "$last"]},
            "upper": {"$toUpper": "$first"}
        })))
        .unwrap();
        let out = projection.apply(doc(json!({"name": "n", "first": "ada", "last": "l"})));
        assert_eq!(out, doc(json!({"name": "n", "full": "ada l", "upper": "ADA"})));
    }

    #[test]
    fn test_projection_computed_only_keeps_fields() {
        let projection = Projection::parse(&doc(json!({"total": {"$add": ["$a", "$b"]}}))).unwrap();
        let out = projection.apply(doc(json!({"a": 1, "b": 2})));
        assert_eq!(out, doc(json!({"a": 1, "b": 2, "total": 3})));
    }

    #[test]
    fn test_projection_rejects_null() {
        assert!(matches!(
            Projection::parse(&doc(json!({"a": null}))),
            Err(QueryError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_group_buckets_deep_equal_ids() {
        let spec = GroupSpec::parse(&doc(json!({
            "_id": {"d": "$dept"},
            "count": {"$sum": 1},
            "names": {"$push": "$name"}
        })))
        .unwrap();
        let out = spec.apply(docs(json!([
            {"dept": "a", "name": "x"},
            {"dept": "b", "name": "y"},
            {"dept": "a", "name": "z"}
        ])));

        assert_eq!(out.len(), 2);
        let a = out
            .iter()
            .find(|d| d.get("_id") == Some(&Value::from(json!({"d": "a"}))))
            .unwrap();
        assert_eq!(a.get("count"), Some(&Value::Int32(2)));
        assert_eq!(a.get("names"), Some(&Value::from(json!(["x", "z"]))));
    }

    #[test]
    fn test_group_requires_id() {
        assert!(matches!(
            GroupSpec::parse(&doc(json!({"count": {"$sum": 1}}))),
            Err(QueryError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_group_missing_id_collapses_to_null() {
        let spec = GroupSpec::parse(&doc(json!({"_id": "$missing", "n": {"$sum": 1}}))).unwrap();
        let out = spec.apply(docs(json!([{"a": 1}, {"a": 2}])));
        assert_eq!(out, vec![doc(json!({"_id": null, "n": 2}))]);
    }

    #[test]
    fn test_sort_multi_key() {
        let sort = Sort::parse(&doc(json!({"a": 1, "b": -1}))).unwrap();
        let out = sort.apply(docs(json!([
            {"a": 2, "b": 1},
            {"a": 1, "b": 1},
            {"a": 1, "b": 3},
            {"a": 2, "b": 5}
        ])));
        assert_eq!(
            out,
            docs(json!([
                {"a": 1, "b": 3},
                {"a": 1, "b": 1},
                {"a": 2, "b": 5},
                {"a": 2, "b": 1}
            ]))
        );
    }

    #[test]
    fn test_sort_is_stable_and_puts_missing_first() {
        let sort = Sort::new().add("k", SortOrder::Ascending);
        let out = sort.apply(docs(json!([
            {"k": 1, "id": 1},
            {"id": 2},
            {"k": 1, "id": 3}
        ])));
        let ids: Vec<_> = out.iter().map(|d| d.get("id").cloned().unwrap()).collect();
        assert_eq!(ids, vec![Value::Int32(2), Value::Int32(1), Value::Int32(3)]);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert!(Sort::parse(&doc(json!({"a": "desc"}))).is_ok());
        assert!(matches!(
            Sort::parse(&doc(json!({"a": 0}))),
            Err(QueryError::InvalidFormat(_))
        ));
        assert!(matches!(
            Sort::parse(&doc(json!({"a": "up"}))),
            Err(QueryError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unwind() {
        let out = unwind(
            docs(json!([
                {"id": 1, "tags": ["x", "y"]},
                {"id": 2, "tags": "not-an-array"},
                {"id": 3},
                {"id": 4, "tags": []}
            ])),
            "tags",
        );
        assert_eq!(
            out,
            docs(json!([{"id": 1, "tags": "x"}, {"id": 1, "tags": "y"}]))
        );
    }

    #[test]
    fn test_unwind_nested_path() {
        let out = unwind(docs(json!([{"a": {"b": [1, 2]}}])), "a.b");
        assert_eq!(out, docs(json!([{"a": {"b": 1}}, {"a": {"b": 2}}])));
    }
}

//! Criteria value normalization
//!
//! Expands the shorthand forms a field may be matched with into the canonical
//! operator-keyed form the compiler consumes.

use std::borrow::Cow;

use super::operators::{is_query_operator, SimpleOp};
use crate::document::{Document, Value};

/// Normalize a raw criteria value for a single field.
///
/// - a regular expression becomes `{"$regex": re}`
/// - a document with at least one query operator key is returned unchanged
/// - anything else (scalars, arrays, plain documents) becomes `{"$eq": value}`
pub fn normalize(value: &Value) -> Cow<'_, Document> {
    match value {
        Value::Regex(_) => Cow::Owned(wrap(SimpleOp::Regex, value)),
        Value::Object(doc) if doc.keys().any(is_query_operator) => Cow::Borrowed(doc),
        _ => Cow::Owned(wrap(SimpleOp::Eq, value)),
    }
}

fn wrap(op: SimpleOp, value: &Value) -> Document {
    let mut doc = Document::new();
    doc.insert(op.name(), value.clone());
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RegexValue;
    use serde_json::json;

    #[test]
    fn test_scalar_wraps_to_eq() {
        let normalized = normalize(&Value::Int32(5));
        assert_eq!(normalized.get("$eq"), Some(&Value::Int32(5)));
        assert_eq!(normalized.len(), 1);
    }

    #[test]
    fn test_regex_wraps_to_regex() {
        let re = Value::Regex(RegexValue::new("^a").unwrap());
        let normalized = normalize(&re);
        assert!(normalized.get("$regex").unwrap().as_regex().is_some());
    }

    #[test]
    fn test_operator_document_passes_through() {
        let value = Value::from(json!({"$gt": 1, "$lt": 5}));
        let normalized = normalize(&value);
        assert!(matches!(normalized, Cow::Borrowed(_)));
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn test_plain_document_and_array_wrap_to_eq() {
        let value = Value::from(json!({"city": "Paris"}));
        assert_eq!(normalize(&value).get("$eq"), Some(&value));

        let value = Value::from(json!([1, 2]));
        assert_eq!(normalize(&value).get("$eq"), Some(&value));
    }
}

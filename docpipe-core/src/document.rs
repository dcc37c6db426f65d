//! Document and Value types for docpipe
//!
//! This module provides the data model the engine evaluates against:
//! - Document: an insertion-ordered map of named fields
//! - Value: an enum covering the JSON types plus DateTime and regular expressions
//! - Field path navigation for nested document access

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;

use crate::error::{QueryError, Result};

/// Identifier field kept by inclusion projections and produced by `$group`
pub const ID_FIELD: &str = "_id";

static NULL: Value = Value::Null;

/// A compiled regular expression stored as a value
#[derive(Debug, Clone)]
pub struct RegexValue(Regex);

impl RegexValue {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| QueryError::InvalidRegex(e.to_string()))
    }

    /// Compile a pattern with MongoDB-style option flags (`i`, `m`, `s`, `x`)
    pub fn with_options(pattern: &str, options: &str) -> Result<Self> {
        if options.is_empty() {
            return Self::new(pattern);
        }

        let mut full = String::with_capacity(pattern.len() + options.len() + 3);
        full.push_str("(?");
        for ch in options.chars() {
            match ch {
                'i' | 'm' | 's' | 'x' => full.push(ch),
                c => {
                    return Err(QueryError::InvalidRegex(format!(
                        "unknown regex option: {}",
                        c
                    )))
                }
            }
        }
        full.push(')');
        full.push_str(pattern);
        Self::new(&full)
    }

    /// Get the source pattern
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Test a string against the pattern
    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }
}

impl PartialEq for RegexValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Value type supporting all JSON types plus DateTime and Regex
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Nested document
    Object(Document),
    /// DateTime with UTC timezone
    DateTime(DateTime<Utc>),
    /// Regular expression
    Regex(RegexValue),
}

impl Value {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is a boolean
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Check if value is a number (int or float)
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int32(_) | Value::Int64(_) | Value::Float64(_))
    }

    /// Check if value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if value is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Check if value is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 (integers only)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(i) => Some(*i as i64),
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(i) => Some(*i as f64),
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get as array reference
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get as document reference
    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Value::Object(doc) => Some(doc),
            _ => None,
        }
    }

    /// Get as mutable document reference
    pub fn as_object_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Object(doc) => Some(doc),
            _ => None,
        }
    }

    /// Get as regular expression
    pub fn as_regex(&self) -> Option<&RegexValue> {
        match self {
            Value::Regex(re) => Some(re),
            _ => None,
        }
    }

    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) | Value::Int64(_) | Value::Float64(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::DateTime(_) => "date",
            Value::Regex(_) => "regex",
        }
    }

    /// Get a direct child by key (objects) or index (arrays)
    pub fn get_field(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(doc) => doc.get(key),
            Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        }
    }

    /// Get a mutable direct child by key (objects) or index (arrays)
    pub fn get_field_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Object(doc) => doc.get_mut(key),
            Value::Array(arr) => key.parse::<usize>().ok().and_then(move |i| arr.get_mut(i)),
            _ => None,
        }
    }

    /// Get a nested value by dot-separated path
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }
        path.split('.')
            .try_fold(self, |current, part| current.get_field(part))
    }

    /// Compare two values of the same type class.
    ///
    /// Numbers compare across widths; strings, booleans and dates compare
    /// natively; null equals null. Any other pairing has no ordering.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => compare_numbers(a, b),
            _ => None,
        }
    }

    /// Total ordering used by sorting, `$cmp`, `$max` and `$min`.
    ///
    /// Values of different types order by type:
    /// null < numbers < strings < objects < arrays < booleans < dates < regex.
    pub fn compare(&self, other: &Value) -> Ordering {
        let by_type = self.type_rank().cmp(&other.type_rank());
        if by_type != Ordering::Equal {
            return by_type;
        }

        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.compare(b),
            (Value::Array(a), Value::Array(b)) => compare_slices(a, b),
            (Value::Regex(a), Value::Regex(b)) => a.as_str().cmp(b.as_str()),
            _ => self.partial_compare(other).unwrap_or(Ordering::Equal),
        }
    }

    /// Compare optional values, treating a missing value as null
    pub fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        a.unwrap_or(&NULL).compare(b.unwrap_or(&NULL))
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int32(_) | Value::Int64(_) | Value::Float64(_) => 1,
            Value::String(_) => 2,
            Value::Object(_) => 3,
            Value::Array(_) => 4,
            Value::Bool(_) => 5,
            Value::DateTime(_) => 6,
            Value::Regex(_) => 7,
        }
    }

    /// Canonical string key: deep-equal values produce identical keys.
    ///
    /// Object keys are sorted and numbers are normalised across widths.
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        use std::fmt::Write as _;

        match self {
            Value::Null => out.push('n'),
            Value::Bool(b) => {
                let _ = write!(out, "b:{}", b);
            }
            Value::Int32(i) => {
                let _ = write!(out, "d:{}", i);
            }
            Value::Int64(i) if i.unsigned_abs() <= MAX_SAFE_INTEGER => {
                let _ = write!(out, "d:{}", i);
            }
            // wide integers key by the float they compare equal to
            Value::Int64(i) => write_float_key(*i as f64, out),
            Value::Float64(f) => write_float_key(*f, out),
            Value::String(s) => {
                let _ = write!(out, "s:{:?}", s);
            }
            Value::Array(items) => {
                out.push_str("a[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(out);
                }
                out.push(']');
            }
            Value::Object(doc) => {
                let mut entries: Vec<(&str, &Value)> = doc.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                out.push_str("o{");
                for (i, (key, value)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{:?}=", key);
                    value.write_canonical(out);
                }
                out.push('}');
            }
            Value::DateTime(dt) => {
                let _ = write!(out, "t:{}", dt.to_rfc3339_opts(SecondsFormat::Nanos, true));
            }
            Value::Regex(re) => {
                let _ = write!(out, "r:{:?}", re.as_str());
            }
        }
    }

    /// Convert to a JSON value (Extended JSON for dates and regexes)
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int32(i) => JsonValue::from(*i),
            Value::Int64(i) => JsonValue::from(*i),
            Value::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(doc) => doc.to_json(),
            Value::DateTime(dt) => serde_json::json!({
                "$date": dt.to_rfc3339_opts(SecondsFormat::Millis, true)
            }),
            Value::Regex(re) => serde_json::json!({ "$regex": re.as_str() }),
        }
    }
}

const MAX_SAFE_INTEGER: u64 = 1 << 53;

fn write_float_key(f: f64, out: &mut String) {
    use std::fmt::Write as _;

    if f.fract() == 0.0 && f.abs() < 9.2e18 {
        let _ = write!(out, "d:{}", f as i64);
    } else {
        let _ = write!(out, "d:{:?}", f);
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn compare_slices(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let cmp = x.compare(y);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => {
                compare_numbers(a, b) == Some(Ordering::Equal)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<RegexValue> for Value {
    fn from(re: RegexValue) -> Self {
        Value::Regex(re)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        Value::Int32(i as i32)
                    } else {
                        Value::Int64(i)
                    }
                } else {
                    n.as_f64().map_or(Value::Null, Value::Float64)
                }
            }
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                if map.len() == 1 {
                    if let Some(JsonValue::String(s)) = map.get("$date") {
                        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                            return Value::DateTime(dt.with_timezone(&Utc));
                        }
                    }
                    if let Some(JsonValue::String(s)) = map.get("$regex") {
                        if let Ok(re) = RegexValue::new(s) {
                            return Value::Regex(re);
                        }
                    }
                }
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int32(i) => serializer.serialize_i32(*i),
            Value::Int64(i) => serializer.serialize_i64(*i),
            Value::Float64(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Object(doc) => doc.serialize(serializer),
            Value::DateTime(dt) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$date", &dt.to_rfc3339_opts(SecondsFormat::Millis, true))?;
                map.end()
            }
            Value::Regex(re) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$regex", re.as_str())?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Value::from)
    }
}

/// Document: an insertion-ordered map from field names to values.
///
/// Field order is preserved because it is meaningful to the engine: criteria
/// compile in key order and `$sort` keys are prioritised left to right.
/// Equality ignores field order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|(k, _)| k == key)
    }

    /// Insert a field, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.fields[i].1, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    /// Get a field by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a mutable field by key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Remove a field, keeping the order of the remaining ones
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.position(key)?;
        Some(self.fields.remove(index).1)
    }

    /// Check if a field exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Iterate over field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only the fields for which the predicate holds
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.fields.retain(|(k, v)| keep(k, v));
    }

    /// Get field by path (e.g., "user.address.city").
    ///
    /// Numeric segments index into arrays. Any missing intermediate value
    /// short-circuits to `None`.
    pub fn get_by_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = self.get(parts.next()?)?;
        parts.try_fold(first, |current, part| current.get_field(part))
    }

    /// Get a mutable field by path
    pub fn get_by_path_mut(&mut self, path: &str) -> Option<&mut Value> {
        let mut parts = path.split('.');
        let mut current = self.get_mut(parts.next()?)?;
        for part in parts {
            current = current.get_field_mut(part)?;
        }
        Some(current)
    }

    /// Set field by path, creating intermediate documents as needed.
    ///
    /// A non-document intermediate value is replaced by a new document.
    pub fn set_by_path(&mut self, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                self.insert(path, value);
            }
            Some((head, rest)) => {
                let index = match self.position(head) {
                    Some(i) => i,
                    None => {
                        self.fields.push((head.to_string(), Value::Object(Document::new())));
                        self.fields.len() - 1
                    }
                };
                let slot = &mut self.fields[index].1;
                if !slot.is_object() {
                    *slot = Value::Object(Document::new());
                }
                if let Value::Object(child) = slot {
                    child.set_by_path(rest, value);
                }
            }
        }
    }

    /// Remove field by path
    pub fn remove_by_path(&mut self, path: &str) -> Option<Value> {
        match path.rsplit_once('.') {
            None => self.remove(path),
            Some((parent, last)) => self.get_by_path_mut(parent)?.as_object_mut()?.remove(last),
        }
    }

    /// Field-by-field ordering over sorted keys, used when documents are
    /// compared as values. Key order does not matter, as with equality.
    pub fn compare(&self, other: &Document) -> Ordering {
        let (lhs, rhs) = (self.sorted_fields(), other.sorted_fields());
        for ((ka, va), (kb, vb)) in lhs.iter().zip(rhs.iter()) {
            let cmp = ka.cmp(kb).then_with(|| va.compare(vb));
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        lhs.len().cmp(&rhs.len())
    }

    fn sorted_fields(&self) -> Vec<(&String, &Value)> {
        let mut fields: Vec<_> = self.fields.iter().map(|(k, v)| (k, v)).collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }

    /// Convert to a JSON object
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Convert to JSON string
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| QueryError::InvalidJson(e.to_string()))
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue =
            serde_json::from_str(json).map_err(|e| QueryError::InvalidJson(e.to_string()))?;
        Self::try_from(value)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .fields
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl TryFrom<Value> for Document {
    type Error = QueryError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(doc) => Ok(doc),
            other => Err(QueryError::InvalidInput(format!(
                "expected a document, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<JsonValue> for Document {
    type Error = QueryError;

    fn try_from(json: JsonValue) -> Result<Self> {
        Document::try_from(Value::from(json))
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        Document::try_from(json).map_err(serde::de::Error::custom)
    }
}

/// Validate that a raw value is a sequence of documents
pub fn documents_from_value(value: Value) -> Result<Vec<Document>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                Document::try_from(item).map_err(|_| {
                    QueryError::InvalidInput(format!("collection element {} is not a document", i))
                })
            })
            .collect(),
        other => Err(QueryError::InvalidInput(format!(
            "input collection is not of a valid type: expected array, found {}",
            other.type_name()
        ))),
    }
}

/// Parse a JSON array of documents
pub fn documents_from_json(json: &str) -> Result<Vec<Document>> {
    let value: JsonValue =
        serde_json::from_str(json).map_err(|e| QueryError::InvalidJson(e.to_string()))?;
    documents_from_value(Value::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: JsonValue) -> Document {
        Document::try_from(value).unwrap()
    }

    #[test]
    fn test_value_types() {
        assert!(Value::Null.is_null());
        assert!(Value::Bool(true).is_bool());
        assert!(Value::Int32(42).is_number());
        assert!(Value::String("test".to_string()).is_string());
        assert!(Value::Array(vec![]).is_array());
        assert!(Value::Object(Document::new()).is_object());
    }

    #[test]
    fn test_value_conversions() {
        let v: Value = true.into();
        assert_eq!(v.as_bool(), Some(true));

        let v: Value = 42i32.into();
        assert_eq!(v.as_i64(), Some(42));

        let v: Value = "test".into();
        assert_eq!(v.as_str(), Some("test"));
    }

    #[test]
    fn test_numeric_equality_across_widths() {
        assert_eq!(Value::Int32(1), Value::Int64(1));
        assert_eq!(Value::Int64(2), Value::Float64(2.0));
        assert_ne!(Value::Int32(1), Value::Float64(1.5));
        assert_ne!(Value::Int32(1), Value::String("1".into()));
    }

    #[test]
    fn test_document_equality_ignores_order() {
        let a = doc(json!({"x": 1, "y": {"z": [1, 2]}}));
        let b = doc(json!({"y": {"z": [1, 2]}, "x": 1}));
        assert_eq!(a, b);

        let c = doc(json!({"x": 1}));
        assert_ne!(a, c);
    }

    #[test]
    fn test_document_preserves_insertion_order() {
        let d = doc(json!({"b": 1, "a": 2, "c": 3}));
        let keys: Vec<&str> = d.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_document_basic_operations() {
        let mut d = Document::new();
        d.insert("name", "John");
        d.insert("age", 30i32);

        assert_eq!(d.get("name").unwrap().as_str(), Some("John"));
        assert_eq!(d.get("age").unwrap().as_i64(), Some(30));
        assert!(d.contains_key("name"));
        assert!(!d.contains_key("email"));

        assert_eq!(d.insert("name", "Jane"), Some(Value::from("John")));
        assert_eq!(d.keys().next(), Some("name"));

        d.remove("age");
        assert!(!d.contains_key("age"));
    }

    #[test]
    fn test_document_path_navigation() {
        let d = doc(json!({
            "user": {"name": "John", "address": {"city": "New York"}},
            "tags": ["a", "b"]
        }));

        assert_eq!(d.get_by_path("user.name").unwrap().as_str(), Some("John"));
        assert_eq!(
            d.get_by_path("user.address.city").unwrap().as_str(),
            Some("New York")
        );
        assert_eq!(d.get_by_path("tags.1").unwrap().as_str(), Some("b"));
        assert!(d.get_by_path("user.email").is_none());
        assert!(d.get_by_path("user.name.first").is_none());
        assert!(d.get_by_path("").is_none());
    }

    #[test]
    fn test_document_set_by_path() {
        let mut d = Document::new();
        d.set_by_path("user.name", "John".into());
        d.set_by_path("user.address.city", "New York".into());

        assert_eq!(d.get_by_path("user.name").unwrap().as_str(), Some("John"));
        assert_eq!(
            d.get_by_path("user.address.city").unwrap().as_str(),
            Some("New York")
        );

        d.set_by_path("user.name.first", "J".into());
        assert_eq!(d.get_by_path("user.name.first").unwrap().as_str(), Some("J"));
    }

    #[test]
    fn test_document_remove_by_path() {
        let mut d = doc(json!({"a": {"b": 1, "c": 2}}));
        assert_eq!(d.remove_by_path("a.b"), Some(Value::Int32(1)));
        assert_eq!(d, doc(json!({"a": {"c": 2}})));
        assert_eq!(d.remove_by_path("a.missing"), None);
    }

    #[test]
    fn test_canonical_key_collapses_equal_values() {
        let a = Value::from(json!({"x": 1, "y": 2}));
        let b = Value::from(json!({"y": 2.0, "x": 1}));
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_ne!(
            Value::from("1").canonical_key(),
            Value::Int32(1).canonical_key()
        );

        let wide = Value::Int64(10_000_000_000_000_000);
        let float = Value::Float64(1e16);
        assert_eq!(wide, float);
        assert_eq!(wide.canonical_key(), float.canonical_key());
        assert_eq!(Value::Float64(1.5).canonical_key(), "d:1.5");
    }

    #[test]
    fn test_total_ordering_by_type() {
        let values = [
            Value::Null,
            Value::Int32(5),
            Value::from("a"),
            Value::Object(Document::new()),
            Value::Array(vec![]),
            Value::Bool(false),
        ];
        for pair in values.windows(2) {
            assert_eq!(pair[0].compare(&pair[1]), Ordering::Less);
        }
        assert_eq!(
            Value::Int32(2).compare(&Value::Float64(10.5)),
            Ordering::Less
        );
        assert_eq!(Value::Int32(1).partial_compare(&Value::from("1")), None);
    }

    #[test]
    fn test_document_ordering_ignores_key_order() {
        let a = Value::from(json!({"x": 1, "y": 2}));
        let b = Value::from(json!({"y": 2, "x": 1}));
        assert_eq!(a, b);
        assert_eq!(a.compare(&b), Ordering::Equal);

        let c = Value::from(json!({"y": 3, "x": 1}));
        assert_eq!(a.compare(&c), Ordering::Less);
        assert_eq!(c.compare(&a), Ordering::Greater);
    }

    #[test]
    fn test_extended_json_date() {
        let v = Value::from(json!({"$date": "2024-01-02T03:04:05.000Z"}));
        assert!(matches!(v, Value::DateTime(_)));
        assert_eq!(v.to_json(), json!({"$date": "2024-01-02T03:04:05.000Z"}));
    }

    #[test]
    fn test_extended_json_regex() {
        let v = Value::from(json!({"$regex": "^a.c$"}));
        assert!(v.as_regex().is_some_and(|re| re.is_match("abc")));
        assert_eq!(Value::from(v.to_json()), v);

        // an invalid pattern stays a plain document
        let v = Value::from(json!({"$regex": "("}));
        assert!(v.is_object());
    }

    #[test]
    fn test_regex_with_options() {
        let re = RegexValue::with_options("^john", "i").unwrap();
        assert_eq!(re.as_str(), "(?i)^john");
        assert!(re.is_match("JOHNNY"));
        assert!(RegexValue::with_options("x", "q").is_err());
        assert!(matches!(
            RegexValue::new("[invalid"),
            Err(QueryError::InvalidRegex(_))
        ));
    }

    #[test]
    fn test_document_json_serialization() {
        let d = doc(json!({"name": "John", "age": 30, "score": 1.5}));
        let json = d.to_json_string().unwrap();
        assert_eq!(json, r#"{"name":"John","age":30,"score":1.5}"#);

        let d2 = Document::from_json(&json).unwrap();
        assert_eq!(d, d2);
    }

    #[test]
    fn test_documents_from_value_rejects_non_sequences() {
        let err = documents_from_value(Value::from("nope")).unwrap_err();
        assert!(err.is_input_error());

        let err = documents_from_value(Value::from(json!([{"a": 1}, 2]))).unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput(_)));

        let docs = documents_from_json(r#"[{"a": 1}, {"a": 2}]"#).unwrap();
        assert_eq!(docs.len(), 2);
    }
}

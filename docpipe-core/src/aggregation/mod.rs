//! Aggregation pipeline
//!
//! Provides MongoDB-style aggregation with pipeline stages:
//! - $match: Filter documents
//! - $project: Select/transform fields
//! - $group: Group and accumulate
//! - $sort: Order results
//! - $skip: Skip documents
//! - $limit: Limit results
//! - $unwind: Expand array fields
//!
//! Stages run in array order. Each stage takes its input by value, so the
//! documents a caller passes in are never modified.

pub mod stages;

pub use stages::{unwind, GroupSpec, Projection, ProjectionField, Sort, SortOrder};

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::document::{Document, Value};
use crate::error::{QueryError, Result};
use crate::query::{Query, StageOp};

/// A parsed pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    Match(Query),
    Project(Projection),
    Group(GroupSpec),
    Sort(Sort),
    Skip(usize),
    Limit(usize),
    Unwind(String),
}

impl PipelineStage {
    /// Parse a single-key stage document such as `{"$limit": 5}`
    pub fn parse(spec: &Document) -> Result<Self> {
        let mut entries = spec.iter();
        let (name, arg) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(QueryError::InvalidStage(format!(
                    "a stage must have exactly one key, found {}",
                    spec.len()
                )))
            }
        };

        let op = StageOp::from_name(name)
            .ok_or_else(|| QueryError::InvalidStage(name.to_string()))?;

        Ok(match op {
            StageOp::Match => PipelineStage::Match(Query::new(stage_document(op, arg)?)?),
            StageOp::Project => PipelineStage::Project(Projection::parse(stage_document(op, arg)?)?),
            StageOp::Group => PipelineStage::Group(GroupSpec::parse(stage_document(op, arg)?)?),
            StageOp::Sort => PipelineStage::Sort(Sort::parse(stage_document(op, arg)?)?),
            StageOp::Skip => PipelineStage::Skip(stage_count(op, arg)?),
            StageOp::Limit => PipelineStage::Limit(stage_count(op, arg)?),
            StageOp::Unwind => {
                let path = arg
                    .as_str()
                    .and_then(|s| s.strip_prefix('$'))
                    .filter(|path| !path.is_empty())
                    .ok_or_else(|| {
                        QueryError::InvalidFormat(
                            "$unwind expects a field path prefixed with '$'".to_string(),
                        )
                    })?;
                PipelineStage::Unwind(path.to_string())
            }
        })
    }

    pub fn op(&self) -> StageOp {
        match self {
            PipelineStage::Match(_) => StageOp::Match,
            PipelineStage::Project(_) => StageOp::Project,
            PipelineStage::Group(_) => StageOp::Group,
            PipelineStage::Sort(_) => StageOp::Sort,
            PipelineStage::Skip(_) => StageOp::Skip,
            PipelineStage::Limit(_) => StageOp::Limit,
            PipelineStage::Unwind(_) => StageOp::Unwind,
        }
    }

    /// Run the stage over a working collection
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        match self {
            PipelineStage::Match(query) => docs.into_iter().filter(|d| query.test(d)).collect(),
            PipelineStage::Project(projection) => {
                docs.into_iter().map(|d| projection.apply(d)).collect()
            }
            PipelineStage::Group(spec) => spec.apply(docs),
            PipelineStage::Sort(sort) => sort.apply(docs),
            PipelineStage::Skip(n) => docs.into_iter().skip(*n).collect(),
            PipelineStage::Limit(n) => docs.into_iter().take(*n).collect(),
            PipelineStage::Unwind(path) => unwind(docs, path),
        }
    }
}

fn stage_document(op: StageOp, arg: &Value) -> Result<&Document> {
    arg.as_object().ok_or_else(|| {
        QueryError::InvalidFormat(format!("{} expects a document, found {}", op, arg.type_name()))
    })
}

fn stage_count(op: StageOp, arg: &Value) -> Result<usize> {
    let invalid = || QueryError::InvalidFormat(format!("{} expects a non-negative integer", op));
    match arg {
        Value::Float64(f) if f.fract() == 0.0 && *f >= 0.0 => Ok(*f as usize),
        other => other
            .as_i64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(invalid),
    }
}

/// An ordered pipeline of stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregator {
    stages: Vec<PipelineStage>,
}

impl Aggregator {
    /// Parse a pipeline from stage documents
    pub fn new(pipeline: &[Document]) -> Result<Self> {
        let stages = pipeline
            .iter()
            .map(PipelineStage::parse)
            .collect::<Result<Vec<_>>>()?;
        debug!(stages = stages.len(), "built aggregation pipeline");
        Ok(Self { stages })
    }

    /// Build from already parsed stages
    pub fn from_stages(stages: Vec<PipelineStage>) -> Self {
        Self { stages }
    }

    /// Parse a pipeline given as an array value
    pub fn from_value(pipeline: &Value) -> Result<Self> {
        let items = pipeline.as_array().ok_or_else(|| {
            QueryError::InvalidFormat(format!(
                "pipeline must be an array, found {}",
                pipeline.type_name()
            ))
        })?;

        let stages = items
            .iter()
            .map(|item| {
                let spec = item.as_object().ok_or_else(|| {
                    QueryError::InvalidStage(format!(
                        "a stage must be a document, found {}",
                        item.type_name()
                    ))
                })?;
                PipelineStage::parse(spec)
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(stages = stages.len(), "built aggregation pipeline");
        Ok(Self { stages })
    }

    /// Parse a pipeline given as JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue =
            serde_json::from_str(json).map_err(|e| QueryError::InvalidJson(e.to_string()))?;
        Self::from_value(&Value::from(value))
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Run the pipeline over a copy of `collection`
    pub fn run(&self, collection: &[Document]) -> Vec<Document> {
        self.run_owned(collection.to_vec())
    }

    /// Run the pipeline, consuming the working collection
    pub fn run_owned(&self, collection: Vec<Document>) -> Vec<Document> {
        self.stages.iter().fold(collection, |docs, stage| {
            let input = docs.len();
            let output = stage.apply(docs);
            debug!(
                stage = stage.op().name(),
                input,
                output = output.len(),
                "ran pipeline stage"
            );
            output
        })
    }
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
    fn test_stage_parsing() {
        assert_eq!(
            PipelineStage::parse(&doc(json!({"$limit": 5}))).unwrap(),
            PipelineStage::Limit(5)
        );
        assert_eq!(
            PipelineStage::parse(&doc(json!({"$unwind": "$tags"}))).unwrap(),
            PipelineStage::Unwind("tags".into())
        );
    }

    #[test]
    fn test_stage_parsing_errors() {
        assert!(matches!(
            PipelineStage::parse(&doc(json!({"$lookup": {}}))),
            Err(QueryError::InvalidStage(_))
        ));
        assert!(matches!(
            PipelineStage::parse(&doc(json!({"$skip": 1, "$limit": 1}))),
            Err(QueryError::InvalidStage(_))
        ));
        assert!(matches!(
            PipelineStage::parse(&Document::new()),
            Err(QueryError::InvalidStage(_))
        ));
        assert!(matches!(
            PipelineStage::parse(&doc(json!({"$skip": -1}))),
            Err(QueryError::InvalidFormat(_))
        ));
        assert!(matches!(
            PipelineStage::parse(&doc(json!({"$unwind": "tags"}))),
            Err(QueryError::InvalidFormat(_))
        ));
        assert!(matches!(
            PipelineStage::parse(&doc(json!({"$match": [1]}))),
            Err(QueryError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_pipeline_runs_in_order() {
        let aggregator = Aggregator::from_json(
            r#"[{"$match": {"age": {"$gte": 18}}}, {"$sort": {"age": -1}}, {"$limit": 2}]"#,
        )
        .unwrap();
        let out = aggregator.run(&docs(json!([{"age": 15}, {"age": 30}, {"age": 20}, {"age": 18}])));
        assert_eq!(out, docs(json!([{"age": 30}, {"age": 20}])));
    }

    #[test]
    fn test_skip_then_limit() {
        let aggregator = Aggregator::from_json(r#"[{"$skip": 1}, {"$limit": 2}]"#).unwrap();
        let out = aggregator.run(&docs(json!([{"n": 1}, {"n": 2}, {"n": 3}, {"n": 4}])));
        assert_eq!(out, docs(json!([{"n": 2}, {"n": 3}])));
    }

    #[test]
    fn test_run_does_not_modify_input() {
        let input = docs(json!([{"tags": ["a", "b"], "n": 1}]));
        let snapshot = input.clone();
        let aggregator = Aggregator::from_json(
            r#"[{"$unwind": "$tags"}, {"$project": {"n": {"$add": ["$n", 1]}}}]"#,
        )
        .unwrap();

        let out = aggregator.run(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("n"), Some(&Value::Int32(2)));
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_from_value_rejects_non_arrays() {
        assert!(matches!(
            Aggregator::from_value(&Value::from(json!({"$limit": 1}))),
            Err(QueryError::InvalidFormat(_))
        ));
        assert!(matches!(
            Aggregator::from_value(&Value::from(json!([1]))),
            Err(QueryError::InvalidStage(_))
        ));
        assert!(matches!(
            Aggregator::from_json("[{"),
            Err(QueryError::InvalidJson(_))
        ));
    }
}

use anyhow::{Context, Result};
use clap::Args;
use docpipe_core::find;
use std::path::PathBuf;
use tracing::info;

use super::{load_collection, parse_document_arg, render_documents};

#[derive(Debug, Args)]
pub struct FindArgs {
    /// JSON file holding an array of documents
    pub collection: PathBuf,

    /// Criteria document (JSON or @file)
    #[arg(short, long, default_value = "{}")]
    pub criteria: String,

    /// Projection document (JSON or @file)
    #[arg(short, long)]
    pub projection: Option<String>,

    /// Sort specification, e.g. '{"age": -1}'
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Number of results to skip
    #[arg(long)]
    pub skip: Option<usize>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Print only the number of results
    #[arg(long)]
    pub count: bool,
}

pub fn execute_find_command(args: FindArgs, pretty: bool) -> Result<String> {
    let collection = load_collection(&args.collection)?;
    let criteria = parse_document_arg("criteria", &args.criteria)?;
    let projection = args
        .projection
        .as_deref()
        .map(|p| parse_document_arg("projection", p))
        .transpose()?;

    let mut cursor = find(&collection, &criteria, projection.as_ref()).context("invalid query")?;
    if let Some(sort) = args.sort.as_deref() {
        let spec = parse_document_arg("sort", sort)?;
        cursor = cursor.sort(&spec).context("invalid sort")?;
    }
    if let Some(n) = args.skip {
        cursor = cursor.skip(n);
    }
    if let Some(n) = args.limit {
        cursor = cursor.limit(n);
    }

    info!(
        collection = %args.collection.display(),
        documents = collection.len(),
        matched = cursor.count(),
        "find completed"
    );

    if args.count {
        return Ok(cursor.count().to_string());
    }
    render_documents(cursor.all(), pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn collection_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "ann", "age": 31}}, {{"name": "bob", "age": 17}}, {{"name": "cid", "age": 45}}]"#
        )
        .unwrap();
        file
    }

    fn args(path: PathBuf) -> FindArgs {
        FindArgs {
            collection: path,
            criteria: "{}".to_string(),
            projection: None,
            sort: None,
            skip: None,
            limit: None,
            count: false,
        }
    }

    #[test]
    fn test_find_with_options() {
        let file = collection_file();
        let mut find_args = args(file.path().to_path_buf());
        find_args.criteria = r#"{"age": {"$gte": 18}}"#.to_string();
        find_args.projection = Some(r#"{"name": 1}"#.to_string());
        find_args.sort = Some(r#"{"age": -1}"#.to_string());
        find_args.limit = Some(1);

        let output = execute_find_command(find_args, false).unwrap();
        assert_eq!(output, r#"[{"name":"cid"}]"#);
    }

    #[test]
    fn test_find_count() {
        let file = collection_file();
        let mut find_args = args(file.path().to_path_buf());
        find_args.count = true;
        assert_eq!(execute_find_command(find_args, true).unwrap(), "3");
    }

    #[test]
    fn test_find_reports_invalid_operator() {
        let file = collection_file();
        let mut find_args = args(file.path().to_path_buf());
        find_args.criteria = r#"{"age": {"$gt": 1, "$bogus": 1}}"#.to_string();

        let err = execute_find_command(find_args, true).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid operator: $bogus"));
    }
}

//! Delta Sharing REST wire types
//!
//! Listing endpoints return paged JSON documents; the table query endpoint
//! returns newline-delimited JSON where each line carries exactly one action:
//!
//! ```text
//! {"protocol":{"minReaderVersion":1}}
//! {"metaData":{"id":"...","format":{"provider":"parquet"},"schemaString":"...","partitionColumns":[]}}
//! {"file":{"url":"https://...","id":"...","partitionValues":{},"size":573}}
//! ```

use serde::Deserialize;
use serde_json::Value;
use sharefetch_core::{Error, Result, Share, TableRef};
use std::collections::HashMap;

/// Highest `minReaderVersion` this client can read
pub const SUPPORTED_READER_VERSION: u32 = 1;

/// One page of a listing response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl<T> ListPage<T> {
    /// Token for the following page; an empty token ends paging like a missing one
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct ShareItem {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl From<ShareItem> for Share {
    fn from(item: ShareItem) -> Self {
        Share {
            name: item.name,
            id: item.id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableItem {
    pub name: String,
    pub schema: String,
    pub share: String,
}

impl From<TableItem> for TableRef {
    fn from(item: TableItem) -> Self {
        TableRef::new(item.schema, item.name).with_share(item.share)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    pub min_reader_version: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub id: Option<String>,

    /// Spark-style JSON struct type describing the columns
    pub schema_string: String,

    #[serde(default)]
    pub partition_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAction {
    /// Pre-signed URL of a parquet file
    pub url: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub partition_values: HashMap<String, Option<String>>,

    #[serde(default)]
    pub size: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ActionLine {
    #[serde(default)]
    protocol: Option<Protocol>,

    #[serde(default, rename = "metaData")]
    metadata: Option<Metadata>,

    #[serde(default)]
    file: Option<FileAction>,
}

/// Parsed body of a table query
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub protocol: Protocol,
    pub metadata: Metadata,
    pub files: Vec<FileAction>,
}

impl QueryResponse {
    /// Parses a newline-delimited query response
    ///
    /// Unknown action kinds are skipped. A missing `protocol` or `metaData`
    /// line, or an unsupported reader version, is a `Fetch` error.
    pub fn parse(body: &str) -> Result<Self> {
        let mut protocol = None;
        let mut metadata = None;
        let mut files = Vec::new();

        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let action: ActionLine = serde_json::from_str(line)
                .map_err(|e| Error::fetch(format!("Malformed query response line: {e}")))?;
            if let Some(p) = action.protocol {
                protocol = Some(p);
            }
            if let Some(m) = action.metadata {
                metadata = Some(m);
            }
            if let Some(f) = action.file {
                files.push(f);
            }
        }

        let protocol =
            protocol.ok_or_else(|| Error::fetch("Query response has no protocol action"))?;
        if protocol.min_reader_version > SUPPORTED_READER_VERSION {
            return Err(Error::fetch(format!(
                "Table requires reader version {}, only {} is supported",
                protocol.min_reader_version, SUPPORTED_READER_VERSION
            )));
        }
        let metadata =
            metadata.ok_or_else(|| Error::fetch("Query response has no metaData action"))?;

        Ok(Self {
            protocol,
            metadata,
            files,
        })
    }
}

/// One top-level column of a table schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    /// Delta type: a name such as `"long"` or `"decimal(10,2)"`, or a nested type object
    pub data_type: Value,
}

/// Extracts the top-level fields of a `schemaString`
pub fn parse_schema_string(schema_string: &str) -> Result<Vec<SchemaField>> {
    #[derive(Deserialize)]
    struct StructType {
        #[serde(default)]
        fields: Vec<StructField>,
    }

    #[derive(Deserialize)]
    struct StructField {
        name: String,
        #[serde(rename = "type")]
        data_type: Value,
    }

    let parsed: StructType = serde_json::from_str(schema_string)
        .map_err(|e| Error::fetch(format!("Invalid table schema: {e}")))?;

    Ok(parsed
        .fields
        .into_iter()
        .map(|f| SchemaField {
            name: f.name,
            data_type: f.data_type,
        })
        .collect())
}

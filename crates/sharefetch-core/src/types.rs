//! Core data types for sharefetch
//!
//! These types describe what a sharing endpoint exposes (shares and tables),
//! how a single table is addressed (the composite locator) and what a loaded
//! table looks like in memory.

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A named collection of tables exposed by the sharing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Share {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }
}

/// Identifies one remotely shared table
///
/// Sourced from the catalog listing and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,

    /// Share the table was listed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<String>,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            share: None,
        }
    }

    /// Builder-style setter for the owning share
    pub fn with_share(mut self, share: impl Into<String>) -> Self {
        self.share = Some(share.into());
        self
    }

    /// `<schema>.<name>`, the form used in console output and file names
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Composite address of a table: `<profile>#<share>.<schema>.<table>`
///
/// The profile part is the same connection descriptor the client was built
/// from, so a locator is self-contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocator {
    pub profile: String,
    pub share: String,
    pub schema: String,
    pub table: String,
}

impl TableLocator {
    pub fn new(profile: impl Into<String>, share: impl Into<String>, table: &TableRef) -> Self {
        Self {
            profile: profile.into(),
            share: share.into(),
            schema: table.schema.clone(),
            table: table.name.clone(),
        }
    }
}

impl fmt::Display for TableLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}.{}.{}",
            self.profile, self.share, self.schema, self.table
        )
    }
}

impl FromStr for TableLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidLocator(s.to_string());

        // The profile may itself contain '#', the coordinates never do
        let (profile, coordinates) = s.rsplit_once('#').ok_or_else(invalid)?;
        if profile.is_empty() {
            return Err(invalid());
        }

        let parts: Vec<&str> = coordinates.split('.').collect();
        match parts.as_slice() {
            [share, schema, table]
                if !share.is_empty() && !schema.is_empty() && !table.is_empty() =>
            {
                Ok(Self {
                    profile: profile.to_string(),
                    share: share.to_string(),
                    schema: schema.to_string(),
                    table: table.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// The realized content of one table, fully in memory
///
/// `columns` is the declared column order; it is known even when the table
/// has no rows (and therefore no batches).
#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub columns: Vec<String>,
    pub batches: Vec<RecordBatch>,
}

impl TableData {
    pub fn new(columns: Vec<String>, batches: Vec<RecordBatch>) -> Self {
        Self { columns, batches }
    }

    /// Builds table data from batches, taking the column names from the first batch
    pub fn from_batches(batches: Vec<RecordBatch>) -> Self {
        let columns = batches
            .first()
            .map(|b| {
                b.schema()
                    .fields()
                    .iter()
                    .map(|f| f.name().clone())
                    .collect()
            })
            .unwrap_or_default();
        Self { columns, batches }
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }
}

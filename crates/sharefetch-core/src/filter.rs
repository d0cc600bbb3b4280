//! Table name filtering
//!
//! Patterns are regular expressions tested with search semantics: a match
//! anywhere in the table name is enough, anchor with `^`/`$` to restrict it.

use regex::Regex;

use crate::{Result, TableRef};

/// Default pattern: tables whose name starts with `companies` or `projects`
pub const DEFAULT_TABLE_PATTERN: &str = "^companies|^projects";

/// A compiled table name pattern
#[derive(Debug, Clone)]
pub struct TableFilter {
    regex: Regex,
}

impl TableFilter {
    /// Compiles `pattern`, failing with `InvalidPattern` on bad syntax
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn matches(&self, table: &TableRef) -> bool {
        self.regex.is_match(&table.name)
    }

    /// Returns the matching tables in catalog order
    pub fn apply(&self, tables: &[TableRef]) -> Vec<TableRef> {
        tables.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

/// Filters `tables` by `pattern`, preserving catalog order
///
/// Returns an empty Vec when nothing matches.
pub fn filter_tables(tables: &[TableRef], pattern: &str) -> Result<Vec<TableRef>> {
    Ok(TableFilter::new(pattern)?.apply(tables))
}

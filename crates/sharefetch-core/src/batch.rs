//! Batch orchestration
//!
//! An [`ExtractionJob`] drives one run through four stages:
//!
//! 1. **Init**: list shares and bind to the first one
//! 2. **Cataloging**: list every table and keep the ones matching the pattern
//! 3. **Processing**: fetch each match and write the non-empty ones to CSV
//! 4. **Done**: return a [`BatchReport`] with one entry per matched table
//!
//! Processing is either sequential or a concurrent fan-out with one tokio task
//! per table, selected by [`Strategy`]. Tables share nothing but the read-only
//! client, so no locking is involved. Per-table failures (fetch or write) are
//! recorded in the report and never stop the remaining tables.
//!
//! ## Example
//!
//! ```rust,ignore
//! let job = ExtractionJob::init(client, JobConfig::new("config.share")).await?;
//! let report = job.run(Arc::new(NoopReporter)).await?;
//! println!("{} saved, {} failed", report.saved(), report.failed());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::csv_writer::{write_csv, DEFAULT_OUTPUT_DIR};
use crate::fetch::{fetch_table, FetchOutcome};
use crate::filter::{TableFilter, DEFAULT_TABLE_PATTERN};
use crate::{Error, Result, Share, SharingClient, TableRef};

/// How matched tables are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One fetch/write cycle completes before the next starts
    Sequential,

    /// Every table is started at once and the run waits for all of them
    #[default]
    Concurrent,
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(Error::config(format!(
                "Unknown strategy '{other}' (expected 'sequential' or 'concurrent')"
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Concurrent => f.write_str("concurrent"),
        }
    }
}

/// Everything a run needs besides the client
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Connection descriptor; also the profile part of every table locator
    pub config_path: String,

    /// Table name pattern (regex, search semantics)
    pub pattern: String,

    /// Directory receiving the CSV files; must exist
    pub output_dir: PathBuf,

    pub strategy: Strategy,
}

impl JobConfig {
    pub fn new(config_path: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            pattern: DEFAULT_TABLE_PATTERN.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            strategy: Strategy::default(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// What happened to one matched table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    /// Written to `path` with `rows` data rows
    Saved { path: PathBuf, rows: usize },

    /// Loaded fine but had no rows; nothing written
    Empty,

    /// Loading failed
    FetchFailed { error: String },

    /// Loaded, but the CSV could not be written
    WriteFailed { error: String },
}

impl TableStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::WriteFailed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: TableRef,
    #[serde(flatten)]
    pub status: TableStatus,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub pattern: String,
    pub share: String,
    pub matched: Vec<TableRef>,
    /// One entry per matched table, in catalog order
    pub tables: Vec<TableReport>,
}

impl BatchReport {
    pub fn saved(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Saved { .. }))
    }

    pub fn empty(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Empty))
    }

    pub fn failed(&self) -> usize {
        self.count(TableStatus::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&TableStatus) -> bool) -> usize {
        self.tables.iter().filter(|r| pred(&r.status)).count()
    }
}

/// Receives progress events while a run is in flight
///
/// All methods default to doing nothing. `on_table` is called as soon as a
/// table finishes, so with the concurrent strategy the calls arrive in
/// completion order, not catalog order.
pub trait BatchReporter: Send + Sync {
    fn on_catalog(&self, _matched: &[TableRef]) {}

    fn on_no_matches(&self, _pattern: &str) {}

    fn on_processing(&self, _count: usize) {}

    fn on_table(&self, _report: &TableReport) {}
}

/// Reporter that ignores every event
pub struct NoopReporter;

impl BatchReporter for NoopReporter {}

/// One extraction run bound to a client and a share
pub struct ExtractionJob {
    client: Arc<dyn SharingClient>,
    config: JobConfig,
    filter: TableFilter,
    share: Share,
}

impl ExtractionJob {
    /// Init stage: validates the pattern, lists shares and selects the first
    ///
    /// When several shares are visible the first one listed is used; there
    /// is no other selection rule.
    ///
    /// # Errors
    ///
    /// - `InvalidPattern` if the pattern does not compile
    /// - `Connection` if the shares cannot be listed
    /// - `NoShares` if the credential sees no share
    pub async fn init(client: Arc<dyn SharingClient>, config: JobConfig) -> Result<Self> {
        let filter = TableFilter::new(&config.pattern)?;

        let shares = client.list_shares().await?;
        let share = shares.first().cloned().ok_or(Error::NoShares)?;
        if shares.len() > 1 {
            info!(
                share = %share.name,
                visible = shares.len(),
                "Multiple shares visible, using the first one"
            );
        } else {
            info!(share = %share.name, "Using share");
        }

        Ok(Self {
            client,
            config,
            filter,
            share,
        })
    }

    pub fn share(&self) -> &Share {
        &self.share
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Cataloging stage: all tables matching the pattern, in catalog order
    pub async fn catalog(&self) -> Result<Vec<TableRef>> {
        let all_tables = self.client.list_all_tables().await?;
        let matched = self.filter.apply(&all_tables);
        info!(
            total = all_tables.len(),
            matched = matched.len(),
            pattern = %self.filter.pattern(),
            "Catalog filtered"
        );
        Ok(matched)
    }

    /// Processing stage: fetches and writes every table in `tables`
    ///
    /// Returns one report per table, in the order of `tables`.
    pub async fn process(
        &self,
        tables: &[TableRef],
        reporter: Arc<dyn BatchReporter>,
    ) -> Vec<TableReport> {
        let ctx = Arc::new(TableContext {
            client: Arc::clone(&self.client),
            config_path: self.config.config_path.clone(),
            share_name: self.share.name.clone(),
            output_dir: self.config.output_dir.clone(),
        });

        match self.config.strategy {
            Strategy::Sequential => {
                let mut reports = Vec::with_capacity(tables.len());
                for table in tables {
                    let report = ctx.process_table(table.clone()).await;
                    reporter.on_table(&report);
                    reports.push(report);
                }
                reports
            }
            Strategy::Concurrent => {
                let mut handles = Vec::with_capacity(tables.len());
                for table in tables {
                    let ctx = Arc::clone(&ctx);
                    let reporter = Arc::clone(&reporter);
                    let table = table.clone();
                    handles.push(tokio::spawn(async move {
                        let report = ctx.process_table(table).await;
                        reporter.on_table(&report);
                        report
                    }));
                }

                let mut reports = Vec::with_capacity(handles.len());
                for (table, handle) in tables.iter().zip(handles) {
                    let report = match handle.await {
                        Ok(report) => report,
                        Err(e) => {
                            let report = TableReport {
                                table: table.clone(),
                                status: TableStatus::FetchFailed {
                                    error: format!("table task aborted: {e}"),
                                },
                            };
                            reporter.on_table(&report);
                            report
                        }
                    };
                    reports.push(report);
                }
                reports
            }
        }
    }

    /// Runs Cataloging, Processing and Done
    ///
    /// No matches is a successful run with an empty report.
    pub async fn run(&self, reporter: Arc<dyn BatchReporter>) -> Result<BatchReport> {
        let matched = self.catalog().await?;

        let tables = if matched.is_empty() {
            reporter.on_no_matches(self.filter.pattern());
            Vec::new()
        } else {
            reporter.on_catalog(&matched);
            reporter.on_processing(matched.len());
            self.process(&matched, Arc::clone(&reporter)).await
        };

        let report = BatchReport {
            pattern: self.filter.pattern().to_string(),
            share: self.share.name.clone(),
            matched,
            tables,
        };
        info!(
            saved = report.saved(),
            empty = report.empty(),
            failed = report.failed(),
            "Extraction finished"
        );
        Ok(report)
    }
}

/// Per-run values every table task needs
struct TableContext {
    client: Arc<dyn SharingClient>,
    config_path: String,
    share_name: String,
    output_dir: PathBuf,
}

impl TableContext {
    async fn process_table(&self, table: TableRef) -> TableReport {
        let outcome = fetch_table(
            self.client.as_ref(),
            &table,
            &self.config_path,
            &self.share_name,
        )
        .await;

        let status = match outcome {
            FetchOutcome::Empty => TableStatus::Empty,
            FetchOutcome::Failed(e) => TableStatus::FetchFailed {
                error: e.to_string(),
            },
            FetchOutcome::Loaded(data) => {
                let rows = data.num_rows();
                match write_blocking(&self.output_dir, &table, data).await {
                    Ok(path) => TableStatus::Saved { path, rows },
                    Err(e) => {
                        warn!(table = %table, error = %e, "Failed to write CSV");
                        TableStatus::WriteFailed {
                            error: e.to_string(),
                        }
                    }
                }
            }
        };

        debug!(table = %table, ?status, "Table processed");
        TableReport { table, status }
    }
}

async fn write_blocking(
    output_dir: &Path,
    table: &TableRef,
    data: crate::TableData,
) -> Result<PathBuf> {
    let output_dir = output_dir.to_path_buf();
    let schema = table.schema.clone();
    let name = table.name.clone();

    tokio::task::spawn_blocking(move || write_csv(&output_dir, &schema, &name, &data))
        .await
        .map_err(|e| Error::io(PathBuf::new(), std::io::Error::other(e.to_string())))?
}

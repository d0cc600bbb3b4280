//! Output formatting utilities

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use serde::Serialize;
use sharefetch_core::{BatchReport, BatchReporter, TableRef, TableReport, TableStatus};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Parse output format from string
    /// Unlike FromStr trait, this never fails - unknown values default to Table
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            _ => Self::Table,
        }
    }
}

/// Print data in the specified format
pub fn print_output<T: Serialize>(data: &T, format: &str) -> Result<()> {
    match OutputFormat::parse(format) {
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        // Table format handled by specific functions
        OutputFormat::Json | OutputFormat::Table => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }
    Ok(())
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print success message
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print info message
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Severity of a per-table notice, picks the color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Warning,
    Error,
}

/// Console line for a finished table
pub fn table_notice(report: &TableReport) -> (Tone, String) {
    let table = &report.table;
    match &report.status {
        TableStatus::Saved { .. } => (
            Tone::Plain,
            format!("- {} saved as csv", table.qualified_name()),
        ),
        TableStatus::Empty => (
            Tone::Warning,
            format!("- {} is empty.", table.qualified_name()),
        ),
        TableStatus::FetchFailed { error } => (
            Tone::Error,
            format!("Error loading table {}: {}", table.name, error),
        ),
        TableStatus::WriteFailed { error } => (
            Tone::Error,
            format!("Error writing table {}: {}", table.qualified_name(), error),
        ),
    }
}

/// Closing line of an extraction run
pub fn summary_line(report: &BatchReport) -> String {
    format!(
        "{} matched, {} saved, {} empty, {} failed",
        report.matched.len(),
        report.saved(),
        report.empty(),
        report.failed()
    )
}

/// Prints the matched catalog as a bullet list
pub fn print_catalog(matched: &[TableRef]) {
    println!(
        "\n{}",
        style(format!("Found {} matching tables:", matched.len())).cyan()
    );
    for table in matched {
        println!("- {}", table.qualified_name());
    }
}

pub fn print_no_matches(pattern: &str) {
    println!(
        "{}",
        style(format!("No tables found for pattern: {pattern}")).red()
    );
}

/// Prints run progress to the terminal as the job reports it
pub struct ConsoleReporter;

impl BatchReporter for ConsoleReporter {
    fn on_catalog(&self, matched: &[TableRef]) {
        print_catalog(matched);
    }

    fn on_no_matches(&self, pattern: &str) {
        print_no_matches(pattern);
    }

    fn on_processing(&self, _count: usize) {
        println!("\n{}", style("Processing tables...").cyan());
    }

    fn on_table(&self, report: &TableReport) {
        match table_notice(report) {
            (Tone::Plain, line) => println!("{line}"),
            (Tone::Warning, line) => println!("{}", style(line).yellow()),
            (Tone::Error, line) => println!("{}", style(line).red()),
        }
    }
}

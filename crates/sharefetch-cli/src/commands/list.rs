//! List tables visible through the sharing profile

use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use serde::Serialize;
use sharefetch_core::{filter_tables, SharingClient, TableRef};

use crate::config::CliConfig;
use crate::output::{create_table, print_info, print_output, OutputFormat};

use super::connect;

#[derive(Debug, Serialize)]
struct CatalogSummary {
    /// Share an `extract` run would use
    selected_share: Option<String>,
    shares: Vec<String>,
    pattern: Option<String>,
    tables: Vec<TableRef>,
}

pub async fn run(config: &CliConfig, pattern: Option<&str>, output_format: &str) -> Result<()> {
    let client = connect(config).await?;

    let shares = client.list_shares().await.context("Failed to list shares")?;
    let catalog = client
        .list_all_tables()
        .await
        .context("Failed to list tables")?;

    let tables = match pattern {
        Some(p) => filter_tables(&catalog, p)?,
        None => catalog,
    };

    let summary = CatalogSummary {
        selected_share: shares.first().map(|s| s.name.clone()),
        shares: shares.into_iter().map(|s| s.name).collect(),
        pattern: pattern.map(str::to_string),
        tables,
    };

    match OutputFormat::parse(output_format) {
        OutputFormat::Table => print_catalog_table(&summary),
        _ => print_output(&summary, output_format)?,
    }

    Ok(())
}

fn print_catalog_table(summary: &CatalogSummary) {
    match &summary.selected_share {
        Some(share) => print_info(&format!("Selected share: {}", share)),
        None => print_info("No shares visible"),
    }

    if summary.tables.is_empty() {
        match &summary.pattern {
            Some(p) => print_info(&format!("No tables found for pattern: {}", p)),
            None => print_info("No tables found"),
        }
        return;
    }

    let mut table = create_table();
    table.set_header(vec!["Share", "Schema", "Name"]);

    for t in &summary.tables {
        let share = t.share.as_deref().unwrap_or("-");
        let share_cell = if summary.selected_share.as_deref() == Some(share) {
            Cell::new(share).fg(Color::Green)
        } else {
            Cell::new(share)
        };
        table.add_row(vec![share_cell, Cell::new(&t.schema), Cell::new(&t.name)]);
    }

    println!("{table}");
    println!("\n{} table(s)", summary.tables.len());
}

//! Markdown run report
//!
//! Written next to the data files when `output.summary-path` is set.

use super::summary::RunSummary;
use super::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report of a run
///
/// # Arguments
///
/// * `summary` - The finished run's summary
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# Listing-Sift Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Started**: {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.elapsed_seconds()
    ));
    md.push_str(&format!("- **Termination**: {}\n", summary.termination));
    md.push_str(&format!(
        "- **Status**: {}\n",
        summary.exit_status().as_str()
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    md.push_str("## Counters\n\n");
    md.push_str("| Counter | Value |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Pages visited | {} |\n", summary.pages_visited));
    md.push_str(&format!(
        "| Records emitted | {} / {} |\n",
        summary.records_emitted, summary.max_items
    ));
    md.push_str(&format!(
        "| Duplicates suppressed | {} |\n",
        summary.duplicates_suppressed
    ));
    md.push_str(&format!("| Parse anomalies | {} |\n", summary.parse_anomalies));
    md.push_str(&format!(
        "| Transient failures | {} |\n",
        summary.transient_failures
    ));
    md.push_str(&format!("| Fatal failures | {} |\n", summary.fatal_failures));
    md.push_str(&format!(
        "| Item page failures | {} |\n",
        summary.item_page_failures
    ));
    md.push_str(&format!(
        "| Incomplete inputs | {} |\n\n",
        summary.incomplete_inputs
    ));

    if !summary.writers.is_empty() {
        md.push_str("## Writers\n\n");
        md.push_str("| Writer | Records | Error |\n");
        md.push_str("|--------|---------|-------|\n");
        for writer in &summary.writers {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                writer.name,
                writer.records_written,
                writer.error.as_deref().unwrap_or("-")
            ));
        }
        md.push('\n');
    }

    md
}

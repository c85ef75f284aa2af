//! Diff command - compare two schema JSON files.

use std::path::PathBuf;

use colored::Colorize;
use strata::{SchemaDiff, diff};

pub fn run(
    old: PathBuf,
    new: PathBuf,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let read = |path: &PathBuf| {
        std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
    };
    let report = diff(&read(&old)?, &read(&new)?);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_diff(&report);
    }
    Ok(())
}

/// Human-readable drift report, shared with the compare command.
pub fn print_diff(report: &SchemaDiff) {
    if report.is_empty() {
        println!("{}", "No schema changes.".green());
        return;
    }

    for field in &report.added_fields {
        println!("  {} {}", "+".green().bold(), field.green());
    }
    for field in &report.removed_fields {
        println!("  {} {}", "-".red().bold(), field.red());
    }
    for (field, change) in &report.changed_fields {
        println!(
            "  {} {}: [{}] -> [{}]",
            "~".yellow().bold(),
            field.yellow(),
            change.old_types.join(", ").dimmed(),
            change.new_types.join(", ").white()
        );
    }

    println!();
    println!(
        "{} added, {} removed, {} changed",
        report.added_fields.len().to_string().green(),
        report.removed_fields.len().to_string().red(),
        report.changed_fields.len().to_string().yellow()
    );
}

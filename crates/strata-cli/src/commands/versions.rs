//! Latest and versions commands - inspect stored schema history.

use colored::Colorize;
use strata::{SchemaVersion, Strata};

pub async fn latest(
    strata: &Strata,
    source: &str,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(version) = strata.latest_schema(source).await? else {
        return Err(format!(
            "No schema versions for source '{}'\nRun 'strata infer {}' first.",
            source, source
        )
        .into());
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&version)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Latest schema for".cyan().bold(),
        source.white(),
        format!("v{}", version.version).cyan().bold()
    );
    println!("Created: {}", version.created_at.to_rfc3339().dimmed());
    println!();
    print_schema(&version);
    Ok(())
}

pub async fn list(
    strata: &Strata,
    source: &str,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let versions = strata.list_versions(source).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    if versions.is_empty() {
        println!("{}", format!("No schema versions for '{}'.", source).yellow());
        return Ok(());
    }

    println!("{} {}", "Schema versions for".cyan().bold(), source.white());
    println!();
    for version in &versions {
        println!(
            "  {}  {}  {} field(s)",
            format!("v{:<4}", version.version).cyan(),
            version.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            version.schema.len().to_string().white()
        );
    }
    Ok(())
}

/// One line per field with its observed types.
pub fn print_schema(version: &SchemaVersion) {
    if version.schema.is_empty() {
        println!("{}", "  (no fields)".dimmed());
        return;
    }

    let width = version
        .schema
        .field_names()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, field) in version.schema.iter() {
        println!(
            "  {:<width$}  {}",
            name.white().bold(),
            field.type_names().join(", ").green(),
            width = width
        );
    }
}

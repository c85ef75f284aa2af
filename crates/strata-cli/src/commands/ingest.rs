//! Ingest command - store a file and its fragments.

use std::path::PathBuf;

use colored::Colorize;
use strata::Strata;

pub async fn run(
    strata: &Strata,
    file: PathBuf,
    source: Option<String>,
    content_type: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(&file)
        .await
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let filename = file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let content_type = content_type.or_else(|| {
        mime_guess::from_path(&file)
            .first()
            .map(|mime| mime.essence_str().to_string())
    });

    let report = strata
        .ingest(source.as_deref(), &filename, content_type.as_deref(), &bytes)
        .await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Ingested".green().bold(), filename.white());
    println!("  File id: {}", report.file_id.cyan());
    println!("  Hash:    {}", report.content_hash.dimmed());
    println!("  Text:    {} characters", report.raw_text_length);
    println!();
    println!("{}", "Fragments:".yellow().bold());
    println!("  JSON blocks: {}", report.fragments.json_blocks);
    println!("  CSV blocks:  {}", report.fragments.csv_blocks);
    println!("  KV blocks:   {}", report.fragments.kv_blocks);
    println!("  HTML tables: {}", report.fragments.html_tables);
    println!(
        "  Text block:  {}",
        if report.fragments.text_block { "yes" } else { "no" }
    );

    if let Some(source) = source {
        println!();
        println!(
            "Run {} to update the schema.",
            format!("strata infer {}", source).cyan().bold()
        );
    }
    Ok(())
}

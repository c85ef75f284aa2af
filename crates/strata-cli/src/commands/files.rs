//! Files, fragments and sources commands - browse stored uploads.

use colored::Colorize;
use strata::{FragmentKind, Strata};

pub async fn files(
    strata: &Strata,
    limit: usize,
    offset: usize,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = strata.list_files(limit, offset).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("{}", "No files stored.".yellow());
        return Ok(());
    }

    for file in &files {
        println!(
            "{}  {}  {}  {} bytes  {}",
            file.id.cyan(),
            file.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            file.filename.white().bold(),
            file.size_bytes,
            file.source_id.as_deref().unwrap_or("-").yellow()
        );
    }
    Ok(())
}

pub async fn fragments(
    strata: &Strata,
    file_id: &str,
    kind: Option<FragmentKind>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let fragments = strata.fragments_for_file(file_id, kind).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&fragments)?);
        return Ok(());
    }

    println!(
        "{} {} fragment(s) for {}",
        "Found".cyan().bold(),
        fragments.len().to_string().white().bold(),
        file_id.white()
    );
    println!();

    for fragment in &fragments {
        let span = match (fragment.start_offset, fragment.end_offset) {
            (Some(start), Some(end)) => format!("{}..{}", start, end),
            _ => "-".to_string(),
        };
        println!(
            "  {:<5} {}  [{}] {} record(s)",
            fragment.kind.to_string().yellow(),
            fragment.id.dimmed(),
            span,
            fragment.record_count.to_string().green()
        );
        println!("        {}", serde_json::to_string(&fragment.preview)?);
    }
    Ok(())
}

pub async fn sources(strata: &Strata, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let sources = strata.list_sources().await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    if sources.is_empty() {
        println!("{}", "No sources yet.".yellow());
        return Ok(());
    }

    for source in &sources {
        println!(
            "  {}  {} file(s)",
            source.source_id.white().bold(),
            source.file_count.to_string().cyan()
        );
    }
    Ok(())
}

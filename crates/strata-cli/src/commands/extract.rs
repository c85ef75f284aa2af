//! Extract command - show the fragments found in a file.

use std::path::PathBuf;

use colored::Colorize;
use strata::ingest::decode_text;
use strata::{Fragment, extract};

pub fn run(
    file: PathBuf,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(&file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let text = decode_text(&bytes);
    let extraction = extract(&text);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Fragments in".cyan().bold(),
        file.display().to_string().white()
    );
    println!();

    let sections = [
        ("JSON blocks", &extraction.json_blocks),
        ("CSV blocks", &extraction.csv_blocks),
        ("Key-value blocks", &extraction.kv_blocks),
        ("HTML tables", &extraction.html_blocks),
    ];
    for (title, fragments) in sections {
        println!(
            "{} {}",
            format!("{}:", title).yellow().bold(),
            fragments.len().to_string().white()
        );
        for fragment in fragments {
            print_fragment(fragment, verbose)?;
        }
    }

    let text_chars = extraction
        .text_block
        .as_text()
        .map(|t| t.chars().count())
        .unwrap_or(0);
    println!();
    println!("Residual text: {} characters", text_chars.to_string().white());

    Ok(())
}

fn print_fragment(fragment: &Fragment, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let span = match (fragment.start_offset(), fragment.end_offset()) {
        (Some(start), Some(end)) => format!("{}..{}", start, end),
        _ => "-".to_string(),
    };
    println!(
        "  [{}] {} record(s)",
        span.dimmed(),
        fragment.record_count().to_string().green()
    );

    if verbose {
        println!("    {}", serde_json::to_string(&fragment.preview(3, 200))?);
    }
    Ok(())
}

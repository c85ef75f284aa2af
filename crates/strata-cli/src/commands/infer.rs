//! Infer command - store the next schema version for a source.

use colored::Colorize;
use strata::Strata;

use super::versions::print_schema;

pub async fn run(
    strata: &Strata,
    source: &str,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let previous = strata.latest_schema(source).await?;
    let version = strata.infer_schema(source).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&version)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Stored".green().bold(),
        source.white(),
        format!("v{}", version.version).cyan().bold()
    );
    println!();
    print_schema(&version);

    if let Some(previous) = previous {
        let report = strata::diff_fields(&previous.schema, &version.schema);
        println!();
        println!(
            "{} v{}:",
            "Changes since".yellow().bold(),
            previous.version
        );
        super::diff::print_diff(&report);
    }
    Ok(())
}

//! Compare command - diff two stored schema versions.

use colored::Colorize;
use strata::Strata;

use super::diff::print_diff;

pub async fn run(
    strata: &Strata,
    source: &str,
    v1: u32,
    v2: u32,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = strata.compare_versions(source, v1, v2).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} v{} -> v{}",
        "Schema drift for".cyan().bold(),
        source.white(),
        v1,
        v2
    );
    println!();
    print_diff(&report);
    Ok(())
}

//! Command-line interface for the harvester.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::HarvestConfig;
use crate::error::{HarvesterError, Result};
use crate::harvester::gather;
use crate::schema::SchemaCatalog;
use crate::store::MemoryStore;

/// OpenSearch Harvester - gather catalogue records from OpenSearch-style providers.
#[derive(Parser)]
#[command(name = "opensearch-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one gather pass for a harvest source.
    Gather {
        /// Harvest source configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Collection descriptions file (JSON)
        #[arg(short, long)]
        schemas: PathBuf,

        /// Source identifier used for cursor recovery
        #[arg(long, default_value = "cli")]
        source_id: String,

        /// Directory to write records to (default: print a summary only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Gather {
            config,
            schemas,
            source_id,
            output,
        } => gather_command(&config, &schemas, &source_id, output.as_deref()),
    }
}

/// Execute the gather command.
fn gather_command(
    config_path: &Path,
    schemas_path: &Path,
    source_id: &str,
    output: Option<&Path>,
) -> Result<()> {
    let config = HarvestConfig::from_json(&fs::read_to_string(config_path)?)?;
    let catalog = SchemaCatalog::from_json(&fs::read_to_string(schemas_path)?)?;

    // Validate output directory before touching the network.
    if let Some(output_dir) = output {
        if !output_dir.is_dir() {
            return Err(HarvesterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Output directory does not exist: {}", output_dir.display()),
            )));
        }
    }

    println!(
        "{} {} from {}",
        style("Gathering").bold(),
        style(&config.collection).cyan(),
        style(&config.base_query_url).green()
    );
    println!();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Fetching pages...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let store = MemoryStore::new();
    let outcome = match gather(source_id, &config, &catalog, &store) {
        Ok(outcome) => outcome,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.finish_and_clear();

    println!("  Records: {}", style(outcome.records.len()).green());
    println!("  Cursor: {}", outcome.cursor.page_start);
    if !outcome.errors.is_empty() {
        println!(
            "  Gather errors: {}",
            style(outcome.errors.len()).yellow().bold()
        );
        for error in &outcome.errors {
            println!("    {error}");
        }
    }

    if let Some(output_dir) = output {
        for record in &outcome.records {
            let path = output_dir.join(format!("{}.json", record.name));
            fs::write(&path, serde_json::to_string_pretty(record)?)?;
        }
        println!();
        println!(
            "{} {} records to {}",
            style("Wrote").green().bold(),
            outcome.records.len(),
            output_dir.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_gather() {
        let cli = Cli::parse_from([
            "opensearch-harvester",
            "gather",
            "--config",
            "source.json",
            "--schemas",
            "collections.json",
        ]);

        let Commands::Gather {
            config,
            schemas,
            source_id,
            output,
        } = cli.command;
        assert_eq!(config, PathBuf::from("source.json"));
        assert_eq!(schemas, PathBuf::from("collections.json"));
        assert_eq!(source_id, "cli");
        assert!(output.is_none());
    }

    #[test]
    fn test_cli_parse_gather_with_output() {
        let cli = Cli::parse_from([
            "opensearch-harvester",
            "gather",
            "--config",
            "source.json",
            "--schemas",
            "collections.json",
            "--source-id",
            "scihub-s2",
            "--output",
            "out",
        ]);

        let Commands::Gather {
            source_id, output, ..
        } = cli.command;
        assert_eq!(source_id, "scihub-s2");
        assert_eq!(output, Some(PathBuf::from("out")));
    }
}

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::{fs, path::PathBuf};

use pollution_near_me::snapshot::schema::{validate_against, DatasetSchema};

/// Validate a published dataset file against its JSON Schema.
#[derive(Parser, Debug)]
#[command(name = "validate-dataset", version, about = "Validate a dataset JSON file against its schema")]
struct Cli {
    /// Dataset name: tri, violations or superfund
    dataset: String,

    /// Path to the dataset JSON file
    path: PathBuf,

    /// Optional schema file; defaults to the schema built into the binary
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn load_json(path: &PathBuf) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let json: Value = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    Ok(json)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let dataset = DatasetSchema::from_name(&args.dataset)
        .ok_or_else(|| anyhow!("Unknown dataset '{}' (expected tri, violations or superfund)", args.dataset))?;

    let schema: &'static Value = match &args.schema {
        // jsonschema 0.17 borrows the schema for 'static; the CLI lives that long anyway
        Some(path) => Box::leak(Box::new(load_json(path)?)),
        None => dataset.schema(),
    };
    let instance = load_json(&args.path)?;

    match validate_against(dataset.name(), schema, &instance) {
        Ok(()) => {
            println!("valid");
            Ok(())
        }
        Err(e) => {
            eprintln!("invalid:");
            eprintln!("- {}", e);
            std::process::exit(1)
        }
    }
}

//! Schema Validator CLI
//!
//! Compiles JSON Schemas and validates instance documents against them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use json_schema_engine::{Builder, OutputFormat, Schema, ValidatorConfig};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "schema-validator")]
#[command(about = "Compile JSON Schemas and validate instances")]
struct Cli {
    /// Configuration file (defaults to schema-validator.toml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate instance documents against a schema
    Validate {
        /// Schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Instance files
        #[arg(required = true)]
        instances: Vec<PathBuf>,

        /// Output format: flag, basic, detailed or verbose
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// Compile a schema and report build errors
    Compile {
        /// Schema file
        schema: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Write it to this file instead
        #[arg(long)]
        save: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn file_url(path: &Path) -> Result<Url> {
    let absolute = path
        .canonicalize()
        .with_context(|| format!("resolving {}", path.display()))?;
    Url::from_file_path(&absolute).map_err(|_| anyhow::anyhow!("not a file path: {}", absolute.display()))
}

/// Returns whether everything checked out
fn run(cli: Cli) -> Result<bool> {
    let config = ValidatorConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Validate { schema, instances, output } => {
            let options = config.options().context("loading configured schemas")?;
            let format = output.unwrap_or(config.validation.output);

            let value = read_json(&schema)?;
            let compiled = match Builder::build(&value, &file_url(&schema)?, &options) {
                Ok(compiled) => compiled,
                Err(e) => {
                    println!("❌ {} - {}", schema.display(), e);
                    return Ok(false);
                }
            };
            debug!(schema = %compiled.id(), %format, "validating instances");

            println!("🔍 Validating {} instance(s) against {}", instances.len(), schema.display());
            let mut all_valid = true;
            for path in &instances {
                let instance = read_json(path)?;
                let result = compiled.validate(&instance, format, &options);
                if result.is_valid() {
                    println!("  ✅ {} - valid", path.display());
                } else {
                    println!("  ❌ {} - INVALID", path.display());
                    all_valid = false;
                }
                if format != OutputFormat::Flag {
                    println!("{}", serde_json::to_string_pretty(&result.to_json())?);
                }
            }
            Ok(all_valid)
        }

        Commands::Compile { schema } => {
            let options = config.options().context("loading configured schemas")?;
            let value = read_json(&schema)?;
            match Builder::build(&value, &file_url(&schema)?, &options) {
                Ok(compiled) => {
                    println!("✅ {} compiled", schema.display());
                    println!("   id: {}", compiled.id());
                    println!("   meta-schema: {}", compiled.meta_schema().id());
                    println!("   embedded resources: {}", count_resources(&compiled));
                    Ok(true)
                }
                Err(e) => {
                    println!("❌ {} - {}", schema.display(), e);
                    println!("   └─ at '{}'", e.location());
                    Ok(false)
                }
            }
        }

        Commands::Config { save } => {
            match save {
                Some(path) => {
                    config.save(&path).with_context(|| format!("writing {}", path))?;
                    println!("✅ Configuration written to {}", path);
                }
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(true)
        }
    }
}

fn count_resources(schema: &Schema) -> usize {
    schema
        .resources()
        .iter()
        .map(|nested| 1 + count_resources(nested))
        .sum()
}

//! infofacts CLI - Command-line interface
//!
//! Usage:
//!   infofacts extract --config infofacts.toml
//!   infofacts inspect --schema schema.toml --subject Ada_Lovelace infobox.txt

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use infofacts_cli::{extract_pages, inspect_text, PageScanner};
use infofacts_core::{AppConfig, LoggingConfig, Schema};
use infofacts_extractor::{FactEmitter, InfoboxExtractor, RuleBasedTermExtractor, TsvSink};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "infofacts")]
#[command(about = "Infobox fact extraction")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract facts from every infobox of an article dump
    Extract {
        /// Run configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Article dump, overrides `input.dump_path`
        #[arg(long)]
        input: Option<PathBuf>,
        /// Extraction schema, overrides `schema.path`
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Output directory, overrides `output.directory`
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Extract facts from one infobox text and print them as JSON
    Inspect {
        /// Extraction schema (TOML)
        #[arg(long)]
        schema: PathBuf,
        /// Subject the infobox belongs to
        #[arg(long)]
        subject: String,
        /// Infobox text, `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            config,
            input,
            schema,
            output_dir,
        } => {
            let mut config = match config {
                Some(path) => AppConfig::from_file(path)?,
                None => AppConfig::default(),
            }
            .with_env_override()?;
            if input.is_some() {
                config.input.dump_path = input;
            }
            if let Some(schema) = schema {
                config.schema.path = schema;
            }
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }

            init_tracing(&config.logging);
            extract(&config)
        }
        Commands::Inspect {
            schema,
            subject,
            input,
        } => {
            init_tracing(&LoggingConfig::default());
            inspect(&schema, &subject, &input)
        }
    }
}

/// `RUST_LOG` wins over the configured level; logs go to stderr
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn extract(config: &AppConfig) -> Result<()> {
    let dump_path = config
        .dump_path()
        .context("Pass --input or set INFOFACTS_INPUT")?;
    let schema = Schema::from_file(&config.schema.path)
        .with_context(|| format!("Failed to load schema {}", config.schema.path.display()))?;

    let sink = TsvSink::create(&config.output.directory, &config.output.extension)?;
    let mut emitter = FactEmitter::new(sink);

    let dump = File::open(dump_path)
        .with_context(|| format!("Failed to open dump {}", dump_path.display()))?;

    let terms = RuleBasedTermExtractor::new(&schema);
    let extractor =
        InfoboxExtractor::new(&schema, &terms).with_max_value_len(config.extraction.max_value_len);

    tracing::info!("Extracting infobox facts from {}", dump_path.display());
    let stats = extract_pages(
        &extractor,
        PageScanner::new(BufReader::new(dump)),
        &mut emitter,
        config.extraction.progress_every,
    )?;
    tracing::info!(
        "Done: {} pages, {} facts, acceptance rate {:.3}",
        stats.pages,
        stats.total_facts(),
        stats.acceptance_rate()
    );

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn inspect(schema_path: &Path, subject: &str, input: &str) -> Result<()> {
    let schema = Schema::from_file(schema_path)
        .with_context(|| format!("Failed to load schema {}", schema_path.display()))?;

    let mut text = String::new();
    if input == "-" {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
    } else {
        text = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input))?;
    }

    let terms = RuleBasedTermExtractor::new(&schema);
    let extractor = InfoboxExtractor::new(&schema, &terms);
    let report = inspect_text(&extractor, subject, &text)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

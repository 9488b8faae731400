//! TREX CLI - Command-line interface
//!
//! Usage:
//!   trex extract <input> [--method linear|dependency|both] [--sample N]
//!   trex validate <input> [--text FILE] [--config FILE] [--no-recall]

mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use trex_core::{AppConfig, ExtractionMethod, LoggingConfig, Triplet};
use trex_extractor::extract_all;
use trex_validate::{
    create_llm_client, sample_triplets, LlmValidator, LlmValidatorConfig, ValidationReport,
    ValidationRunner,
};

use crate::input::InputFormat;

#[derive(Parser)]
#[command(name = "trex")]
#[command(about = "Triplet extraction over annotated text")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Annotated document (JSON or CoNLL-U)
    input: PathBuf,

    /// Input format (inferred from the extension by default)
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// Extractor(s) to run: linear, dependency or both
    #[arg(long)]
    method: Option<ExtractionMethod>,

    /// Keep only a random sample of N triplets
    #[arg(long)]
    sample: Option<usize>,

    /// Seed for sampling
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract triplets from an annotated document
    Extract {
        #[command(flatten)]
        args: ExtractArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Extract triplets and check them with the configured LLM
    Validate {
        #[command(flatten)]
        args: ExtractArgs,

        /// Plain source text (defaults to the document's text)
        #[arg(long)]
        text: Option<PathBuf>,

        /// Skip the recall check
        #[arg(long)]
        no_recall: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    Ok(config.with_env_override()?)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Run extraction with CLI flags taking precedence over config
fn run_extraction(args: &ExtractArgs, config: &AppConfig) -> anyhow::Result<(Vec<Triplet>, String)> {
    let loaded = input::load(&args.input, args.format)?;
    let method = args.method.unwrap_or(config.extraction.method);

    let triplets = extract_all(&loaded.document, method)?;
    tracing::info!(
        input = %args.input.display(),
        %method,
        tokens = loaded.document.len(),
        triplets = triplets.len(),
        "extraction finished"
    );

    let sample_size = args.sample.or(config.extraction.sample_size);
    let triplets = match sample_size {
        Some(n) => {
            let seed = args.seed.unwrap_or(config.extraction.sample_seed);
            sample_triplets(&triplets, n, seed)
        }
        None => triplets,
    };

    Ok((triplets, loaded.source_text))
}

fn print_triplets(triplets: &[Triplet], output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Text => {
            for triplet in triplets {
                println!("{}", triplet);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(triplets)?),
    }
    Ok(())
}

fn print_report(report: &ValidationReport, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Text => {
            println!("Run {} ({})", report.run_id, report.started_at.to_rfc3339());
            for result in &report.results {
                println!("[{}] {}", result.verdict, result.triplet);
            }
            if !report.missed.is_empty() {
                println!("\nMissed:");
                for triplet in &report.missed {
                    println!("{}", triplet);
                }
            }
            println!(
                "\nAccepted: {} | Rejected: {} | Unvalidated: {} | Precision: {:.1}%",
                report.accepted(),
                report.rejected(),
                report.unvalidated(),
                report.precision() * 100.0
            );
            if report.quota_exhausted {
                println!("Stopped early: LLM quota exhausted");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract { args, output } => {
            let (triplets, _) = run_extraction(&args, &config)?;
            print_triplets(&triplets, output)?;
        }
        Commands::Validate {
            args,
            text,
            no_recall,
            output,
        } => {
            let (triplets, document_text) = run_extraction(&args, &config)?;
            let source_text = match text {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => document_text,
            };

            if no_recall {
                config.validation.check_recall = false;
            }

            let client = Arc::from(create_llm_client(&config.llm)?);
            let validator = LlmValidator::with_config(
                client,
                LlmValidatorConfig {
                    max_source_chars: config.validation.max_source_chars,
                    ..Default::default()
                },
            );
            let runner = ValidationRunner::new(Arc::new(validator), config.validation.clone());

            let report = runner.run(&source_text, &triplets).await;
            print_report(&report, output)?;
        }
    }

    Ok(())
}

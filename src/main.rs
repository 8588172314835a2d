// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! AINamify: bulk image renamer
//!
//! Renames images after captions from a local vision model and writes a
//! CSV log of what happened to each file.

use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use ainamify::audit::default_log_filename;
use ainamify::config::AppConfig;
use ainamify::input::collect_selection;
use ainamify::job::{BatchJob, JobSummary, ProcessingOptions, ProgressEvent, TerminalStatus};
use ainamify::ollama::model_matches;
use ainamify::oracle::{CaptionOracle, OllamaCaptioner, SkipAvailabilityCheck};
use ainamify::{NamifyError, Result};

/// AINamify CLI - AI-powered image renamer
#[derive(Parser, Debug)]
#[command(name = "ainamify")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Rename images after AI-generated captions", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Caption and rename images
    Rename {
        /// A directory, or one or more image files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Append today's date to new filenames
        #[arg(short = 'd', long)]
        append_date: bool,

        /// Directory for the CSV log (overrides config)
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Do not write a CSV log
        #[arg(long)]
        no_log: bool,

        /// Start without checking that the backend and model are available
        #[arg(long)]
        skip_health_check: bool,
    },

    /// Show caption backend status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if !cli.quiet {
        info!("AINamify v1.0.0");
    }

    // Load configuration
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Rename { paths, append_date, log_dir, no_log, skip_health_check } => {
            let flags = RenameFlags { append_date, log_dir, no_log, skip_health_check };
            run_rename(config, paths, flags, &cli.format).await
        }
        Commands::Status => run_status(config).await,
        Commands::Config { action } => run_config_command(config, action, &cli.config),
    }
}

/// Per-run switches from the `rename` command line
struct RenameFlags {
    append_date: bool,
    log_dir: Option<PathBuf>,
    no_log: bool,
    skip_health_check: bool,
}

/// What a Ctrl+C press does
#[derive(Debug, PartialEq)]
enum Interrupt {
    /// Finish the current file, then stop
    Stop,
    /// Exit without waiting
    Quit,
}

fn interrupt_action(presses: usize) -> Interrupt {
    if presses <= 1 {
        Interrupt::Stop
    } else {
        Interrupt::Quit
    }
}

/// Run one batch rename job to completion
async fn run_rename(
    config: AppConfig,
    paths: Vec<PathBuf>,
    flags: RenameFlags,
    format: &str,
) -> Result<()> {
    let selection = collect_selection(&paths)?;
    info!("Selected directory: {}", selection.directory);

    // One oracle per process, reused for the whole run
    let mut oracle: Arc<dyn CaptionOracle> = Arc::new(OllamaCaptioner::new(&config.ai_engine)?);
    if flags.skip_health_check {
        warn!("Skipping backend health check");
        oracle = Arc::new(SkipAvailabilityCheck::new(oracle));
    }

    let options = ProcessingOptions {
        append_date: flags.append_date || config.naming.append_date,
        base_directory: selection.directory.clone(),
        naming: config.naming.rules(),
    };

    let job = BatchJob::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    job.start(selection.files, options, oracle, tx).await?;

    // First Ctrl+C stops after the current file, the second quits
    let stopper = job.clone();
    let signal_task = tokio::spawn(async move {
        let mut presses = 0;
        while signal::ctrl_c().await.is_ok() {
            presses += 1;
            match interrupt_action(presses) {
                Interrupt::Stop => {
                    warn!("Stop requested by user (press Ctrl+C again to quit now)");
                    stopper.request_stop();
                }
                Interrupt::Quit => {
                    warn!("Quitting before the current file finishes");
                    std::process::exit(130);
                }
            }
        }
    });

    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Started { total } => {
                if format == "text" {
                    println!("Found {} image(s) to process.", total);
                }
            }
            ProgressEvent::File { index, total, outcome } => match format {
                "text" => println!("[{}/{}] {}", index, total, outcome),
                "jsonl" => println!("{}", serde_json::to_string(&outcome)?),
                _ => {}
            },
            ProgressEvent::Finished(status) => {
                if format == "text" {
                    println!("{}", status_line(status));
                }
                break;
            }
        }
    }
    signal_task.abort();

    let summary = job.wait().await?;
    if format == "json" {
        let output = serde_json::json!({
            "summary": summary,
            "outcomes": job.outcomes(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if format == "text" {
        print_summary(&summary);
    }

    if flags.no_log || !config.log.auto_save {
        return Ok(());
    }
    if summary.processed() == 0 {
        info!("No log content to save");
        return Ok(());
    }

    let dir = flags.log_dir.unwrap_or_else(|| config.log.directory());
    let path = dir.join(default_log_filename(&config.log.file_prefix, Local::now()));
    job.audit_log().save(&path)?;
    if format == "text" {
        println!("Log saved as {}", path.display());
    }

    Ok(())
}

fn status_line(status: TerminalStatus) -> &'static str {
    match status {
        TerminalStatus::Completed => "Processing complete.",
        TerminalStatus::Stopped => "Processing was stopped.",
        TerminalStatus::NoWork => "No image files found to process.",
    }
}

fn print_summary(summary: &JobSummary) {
    println!(
        "\nProcessed {} of {} image(s): {} renamed, {} skipped, {} failed",
        summary.processed(),
        summary.total,
        summary.renamed,
        summary.skipped,
        summary.errors
    );
}

/// Run status check
async fn run_status(config: AppConfig) -> Result<()> {
    let captioner = OllamaCaptioner::new(&config.ai_engine)?;
    let client = captioner.client();

    println!("AINamify v1.0.0 Status");
    println!("======================");

    match client.health_check().await {
        Ok(()) => println!("Ollama: Running at {}", client.base_url()),
        Err(e) => println!("Ollama: Error - {}", e),
    }

    match client.list_models().await {
        Ok(models) => {
            println!("\nAvailable models:");
            for m in &models {
                println!("  {} {}", model_marker(m, &config.ai_engine.model), m);
            }
        }
        Err(e) => println!("  Error listing models: {}", e),
    }

    match client.model_available(&config.ai_engine.model).await {
        Ok(true) => println!("\nVision model '{}': available", config.ai_engine.model),
        Ok(false) => println!("\nVision model '{}': missing (try: ollama pull {})",
            config.ai_engine.model, config.ai_engine.model),
        Err(e) => println!("\nVision model '{}': unknown - {}", config.ai_engine.model, e),
    }

    Ok(())
}

/// Marks the configured vision model in the model list
fn model_marker(installed: &str, wanted: &str) -> &'static str {
    if model_matches(installed, wanted) {
        "→"
    } else {
        " "
    }
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            if output.exists() {
                return Err(NamifyError::Config(format!(
                    "{:?} already exists",
                    output
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Backend: {}", config.ai_engine.url);
            println!("  Vision model: {}", config.ai_engine.model);
            println!("  Token length: {}", config.naming.token_length);
            println!("  Log directory: {}", config.log.directory);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["ainamify"]).is_err());
    }

    #[test]
    fn test_cli_rename_command() {
        let cli = Cli::try_parse_from([
            "ainamify", "rename", "/tmp/a.jpg", "/tmp/b.png", "--append-date", "--no-log",
        ])
        .unwrap();

        match cli.command {
            Commands::Rename { paths, append_date, no_log, log_dir, skip_health_check } => {
                assert_eq!(paths, vec![PathBuf::from("/tmp/a.jpg"), PathBuf::from("/tmp/b.png")]);
                assert!(append_date);
                assert!(no_log);
                assert!(log_dir.is_none());
                assert!(!skip_health_check);
            }
            _ => panic!("Expected Rename command"),
        }
    }

    #[test]
    fn test_cli_skip_health_check() {
        let cli = Cli::try_parse_from([
            "ainamify", "rename", "/tmp/photos", "--skip-health-check", "--log-dir", "/tmp/logs",
        ])
        .unwrap();

        match cli.command {
            Commands::Rename { skip_health_check, log_dir, .. } => {
                assert!(skip_health_check);
                assert_eq!(log_dir, Some(PathBuf::from("/tmp/logs")));
            }
            _ => panic!("Expected Rename command"),
        }
    }

    #[test]
    fn test_second_interrupt_quits() {
        assert_eq!(interrupt_action(1), Interrupt::Stop);
        assert_eq!(interrupt_action(2), Interrupt::Quit);
        assert_eq!(interrupt_action(3), Interrupt::Quit);
    }

    #[test]
    fn test_model_marker_follows_tag_matching() {
        assert_eq!(model_marker("moondream:latest", "moondream"), "→");
        assert_eq!(model_marker("llava:13b", "llava"), "→");
        assert_eq!(model_marker("llama3.2:3b", "moondream"), " ");
    }

    #[test]
    fn test_cli_rename_needs_paths() {
        assert!(Cli::try_parse_from(["ainamify", "rename"]).is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(["ainamify", "status", "--verbose", "--format", "jsonl"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, "jsonl");
        assert!(Cli::try_parse_from(["ainamify", "status", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_status_lines_are_distinct() {
        assert_ne!(
            status_line(TerminalStatus::Completed),
            status_line(TerminalStatus::Stopped)
        );
        assert_eq!(status_line(TerminalStatus::NoWork), "No image files found to process.");
    }
}

//! `trueno-jitter` command-line entry point
//!
//! Logs go to stderr; stdout carries only command payloads (the JSON report).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trueno_jitter::capture::Capture;
use trueno_jitter::config::JitterConfig;
use trueno_jitter::extract::StatusMessageExtractor;
use trueno_jitter::matrix::{CellSeries, MatrixLoader};
use trueno_jitter::render::{self, ComparativeRenderer};
use trueno_jitter::report::JitterReport;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "TRUENO_JITTER_LOG";

/// Compare status message jitter across network paths and robot modes
#[derive(Debug, Parser)]
#[command(name = "trueno-jitter", version, about)]
struct Cli {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true, env = "TRUENO_JITTER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the observation window (seconds)
    #[arg(long, global = true)]
    capture_time: Option<f64>,

    /// Override the capture root directory
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load every cell and render the comparative grid
    Matrix {
        /// Override the output image path (.svg for vector output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load every cell and print jitter statistics as JSON
    Summary {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Plot a single capture export
    Plot {
        /// Capture export (CSV)
        capture: PathBuf,
        /// Output image (defaults to the capture path with a .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Plot title (defaults to the capture file stem)
        #[arg(long)]
        title: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("trueno_jitter={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<JitterConfig> {
    let mut config = match &cli.config {
        Some(path) => JitterConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => JitterConfig::default(),
    };
    if let Some(capture_time) = cli.capture_time {
        config.capture_time = capture_time;
    }
    if let Some(root) = &cli.root {
        config.root.clone_from(root);
    }
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = load_config(&cli)?;

    match &cli.command {
        Command::Matrix { output } => {
            if let Some(output) = output {
                config.output.clone_from(output);
            }
            let matrix = MatrixLoader::from_config(&config)
                .load()
                .context("building experiment matrix")?;
            ComparativeRenderer::from_config(&config)
                .render(&matrix)
                .context("rendering experiment matrix")?;
            eprintln!("saved {}", config.output.display());
        }
        Command::Summary { pretty } => {
            let matrix = MatrixLoader::from_config(&config)
                .load()
                .context("building experiment matrix")?;
            println!("{}", JitterReport::from_matrix(&matrix).to_json(*pretty)?);
        }
        Command::Plot {
            capture,
            output,
            title,
        } => {
            let output = output
                .clone()
                .unwrap_or_else(|| capture.with_extension("png"));
            let title = title.clone().unwrap_or_else(|| {
                capture
                    .file_stem()
                    .map_or_else(|| capture.display().to_string(), |s| s.to_string_lossy().into_owned())
            });

            let records = Capture::load_csv(capture)?;
            let timestamps = StatusMessageExtractor::new(config.capture_time)
                .with_strategy(config.classifier)
                .extract(&records)?;
            let series = CellSeries::from_timestamps(timestamps);
            render::render_single(&output, &title, &series, config.capture_time)?;
            eprintln!("saved {}", output.display());
        }
    }
    Ok(())
}

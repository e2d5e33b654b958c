//! CLI for probing and decoding SSD-style detection models.

mod commands;

use clap::{Parser, Subcommand};
use console::style;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ssdec_core::{SchemaError, SsdecError};

use commands::{detect, dummy, inspect};

/// Probe an object-detection model's output layout and decode detections
#[derive(Parser)]
#[command(name = "ssdec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run detection on a single image
    Detect(detect::DetectArgs),

    /// Print model input/output metadata and dry-run the model
    Inspect(inspect::InspectArgs),

    /// Write a flat gray test image
    Dummy(dummy::DummyArgs),
}

fn main() {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: logging already initialized");
    }

    let result = match cli.command {
        Commands::Detect(args) => detect::run(args, cli.config.as_deref()),
        Commands::Inspect(args) => inspect::run(args),
        Commands::Dummy(args) => dummy::run(args),
    };

    if let Err(err) = result {
        eprintln!("{} {}", style("error:").red().bold(), err);
        std::process::exit(exit_code(&err));
    }
}

/// Exit codes: 1 missing file or engine failure, 2 ambiguous schema,
/// 3 unsupported output layout.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SsdecError>() {
        Some(SsdecError::Schema(schema)) => schema_exit_code(schema),
        _ => 1,
    }
}

fn schema_exit_code(err: &SchemaError) -> i32 {
    if err.is_ambiguous() { 2 } else { 3 }
}

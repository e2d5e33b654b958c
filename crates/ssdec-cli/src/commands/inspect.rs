//! Inspect command - print model metadata and dry-run the model.

use std::path::PathBuf;

use clap::Args;
use console::style;

use ssdec_core::{Detector, OrtSession, SsdecError};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Path to the model file
    #[arg(long)]
    model: PathBuf,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    if !args.model.exists() {
        return Err(SsdecError::NotFound(args.model.clone()).into());
    }

    println!(
        "{} {}",
        style("Loading model:").bold(),
        args.model.display()
    );

    let session = OrtSession::from_file(&args.model).map_err(SsdecError::from)?;
    let mut detector = Detector::new(session);
    let report = detector.inspect()?;

    print!("{report}");
    Ok(())
}

//! Detect command - run one image through a model and print detections.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{debug, info};

use ssdec_core::{
    Detection, Detector, LabelMap, OrtSession, SsdecConfig, SsdecError,
};

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Path to the model file
    #[arg(long)]
    model: PathBuf,

    /// Path to the input image
    #[arg(long)]
    image: PathBuf,

    /// Path to a newline-delimited label file
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Score threshold
    #[arg(long)]
    score: Option<f32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON array of detections
    Json,
}

pub fn run(args: DetectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => SsdecConfig::from_file(std::path::Path::new(path))?,
        None => SsdecConfig::default(),
    };

    if !args.model.exists() {
        return Err(SsdecError::NotFound(args.model.clone()).into());
    }
    if !args.image.exists() {
        return Err(SsdecError::NotFound(args.image.clone()).into());
    }

    let labels = load_labels(args.labels.as_ref(), config.detect.labels.as_ref())?;
    let threshold = args.score.unwrap_or(config.detect.score_threshold);
    debug!(threshold, labels = labels.len(), "detect configuration");

    let session = OrtSession::from_file(&args.model).map_err(SsdecError::from)?;
    let mut detector = Detector::new(session);

    let image = image::open(&args.image).map_err(SsdecError::from)?;
    let detections = detector.detect(&image, threshold, &labels)?;
    info!(count = detections.len(), "decoded detections");

    let rendered = match args.format {
        OutputFormat::Text => render_text(&detections, threshold),
        OutputFormat::Json => serde_json::to_string_pretty(&detections)? + "\n",
    };

    match args.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => print!("{rendered}"),
    }

    Ok(())
}

// An explicitly requested label file must exist; a config-supplied default
// that is absent just means numeric labels.
fn load_labels(
    flag: Option<&PathBuf>,
    default: Option<&PathBuf>,
) -> Result<LabelMap, SsdecError> {
    match (flag, default) {
        (Some(path), _) if !path.exists() => Err(SsdecError::NotFound(path.clone())),
        (Some(path), _) => Ok(LabelMap::from_file(path)?),
        (None, Some(path)) if path.exists() => Ok(LabelMap::from_file(path)?),
        _ => Ok(LabelMap::empty()),
    }
}

fn render_text(detections: &[Detection], threshold: f32) -> String {
    let mut out = format!("Detections (score >= {threshold:.2}):\n");
    for (i, det) in detections.iter().enumerate() {
        out.push_str(&format!(
            "  {:02}: {:>12}  score={:.2}  box=[ymin={:.2}, xmin={:.2}, ymax={:.2}, xmax={:.2}]\n",
            i,
            style(&det.label).green(),
            det.score,
            det.bbox.ymin,
            det.bbox.xmin,
            det.bbox.ymax,
            det.bbox.xmax,
        ));
    }
    if detections.is_empty() {
        out.push_str("  (none)\n");
    }
    out
}

//! Dummy command - write a flat gray test image.

use std::path::PathBuf;

use clap::Args;
use image::{Rgb, RgbImage};

/// Arguments for the dummy command.
#[derive(Args)]
pub struct DummyArgs {
    /// Output path
    #[arg(short, long, default_value = "sample.jpg")]
    output: PathBuf,

    /// Image width
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Image height
    #[arg(long, default_value_t = 480)]
    height: u32,
}

pub fn run(args: DummyArgs) -> anyhow::Result<()> {
    let image = RgbImage::from_pixel(args.width, args.height, Rgb([128, 128, 128]));
    image.save(&args.output)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

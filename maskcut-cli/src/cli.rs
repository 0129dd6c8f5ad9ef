//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Maskcut: splits videos into visualization, mask-only and foreground-removed streams",
    long_about = "Scans a folder for videos, runs per-frame instance segmentation on each one \
                  and writes three time-aligned outputs per video: an annotated visualization, \
                  a binary mask stream for the selected classes, and a stream with those \
                  classes' pixels zeroed out."
)]
pub struct Cli {
    /// Folder containing the source video files
    #[arg(long, value_name = "DIR")]
    pub input_folder: PathBuf,

    /// Top-level folder all processing results are written into
    #[arg(long, value_name = "DIR")]
    pub output_folder: PathBuf,

    /// Path to the instance-segmentation ONNX model
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,

    /// Optional JSON configuration file; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Minimum confidence for an instance to be masked (0.0-1.0)
    #[arg(long, value_name = "SCORE")]
    pub confidence_threshold: Option<f32>,

    /// Comma-separated class ids to mask (e.g. 0,38)
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub classes_to_mask: Option<Vec<i32>>,

    /// Overlay opacity in the visualization stream (0.0-1.0)
    #[arg(long, value_name = "ALPHA")]
    pub visualization_alpha: Option<f64>,

    /// Drop failed frames from all outputs instead of writing pass-through
    /// frames (breaks frame alignment across the three streams)
    #[arg(long)]
    pub skip_failed_frames: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

// maskcut-cli/src/main.rs
//
// Command-line entry point: parses arguments, sets up logging, assembles
// the core configuration (JSON file first, flags on top), discovers the
// input videos and hands them to maskcut-core for batch processing. A
// single video's failure never aborts the run; the exit code is non-zero
// only when setup fails or no video succeeded.

mod cli;

use std::fs;
use std::path::Path;
use std::process;

use clap::Parser;
use log::{error, info};

use maskcut_core::{
    find_processable_files, process_videos, CoreConfig, CoreError, FrameFailurePolicy,
    OnnxSegmenter,
};

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        error!("{err}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&cli)?;
    config.validate()?;

    if !cli.input_folder.is_dir() {
        return Err(format!(
            "input folder does not exist: {}",
            cli.input_folder.display()
        )
        .into());
    }
    fs::create_dir_all(&cli.output_folder)?;
    info!("Input folder: {}", cli.input_folder.display());
    info!("Outputs will be saved to: {}", cli.output_folder.display());

    let files = match find_processable_files(&cli.input_folder, &config.video_extensions) {
        Ok(files) => files,
        Err(CoreError::NoFilesFound) => {
            return Err(format!(
                "no supported video files found in the input folder (supported: {})",
                config.video_extensions.join(", ")
            )
            .into());
        }
        Err(err) => return Err(err.into()),
    };
    info!("Found {} video file(s) to process", files.len());

    let segmenter = OnnxSegmenter::new(&cli.model)?;
    info!("Segmentation model loaded: {}", cli.model.display());

    let summary = process_videos(&segmenter, &config, &files, &cli.output_folder)?;
    if summary.succeeded == 0 && summary.total > 0 {
        return Err("all videos failed to process".into());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<CoreConfig, Box<dyn std::error::Error>> {
    let mut config = load_config_file(cli.config.as_deref())?;

    if let Some(threshold) = cli.confidence_threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(classes) = &cli.classes_to_mask {
        config.classes_to_mask = classes.iter().copied().collect();
    }
    if let Some(alpha) = cli.visualization_alpha {
        config.visualization_alpha = alpha;
    }
    if cli.skip_failed_frames {
        config.frame_failure_policy = FrameFailurePolicy::Skip;
    }

    Ok(config)
}

fn load_config_file(path: Option<&Path>) -> Result<CoreConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|err| format!("cannot read config file {}: {err}", path.display()))?;
            let config = serde_json::from_str(&text)
                .map_err(|err| format!("cannot parse config file {}: {err}", path.display()))?;
            Ok(config)
        }
        None => Ok(CoreConfig::default()),
    }
}

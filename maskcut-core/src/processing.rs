//! Batch processing of multiple videos.
//!
//! Runs the per-video pipeline over a list of input files, strictly
//! sequentially. Each video gets its own output subdirectory named after
//! the file stem. One job's failure is recorded and the batch continues
//! with the next file; the final summary carries per-job outcomes and the
//! success/failure counts.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::output::ProcessingJob;
use crate::pipeline::{JobStats, VideoPipeline};
use crate::segmentation::Segmenter;

/// Outcome of one job within a batch.
#[derive(Debug)]
pub struct JobReport {
    pub filename: String,
    pub outcome: Result<JobStats, String>,
}

/// Result of one batch run.
#[derive(Debug)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub reports: Vec<JobReport>,
}

/// Processes every file in `files`, writing each video's outputs under
/// `output_root/<stem>/`.
pub fn process_videos<S: Segmenter>(
    segmenter: &S,
    config: &CoreConfig,
    files: &[PathBuf],
    output_root: &Path,
) -> CoreResult<BatchSummary> {
    config.validate()?;
    let pipeline = VideoPipeline::new(segmenter, config);
    let mut reports = Vec::with_capacity(files.len());

    for (index, input_path) in files.iter().enumerate() {
        let filename = input_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| input_path.display().to_string());
        info!(
            "==> Processing video {}/{}: {}",
            index + 1,
            files.len(),
            filename
        );

        let outcome = prepare_job(input_path, output_root).and_then(|job| pipeline.run(&job));
        match &outcome {
            Ok(stats) => {
                info!(
                    "Completed {}: {} frames written, {} recovered",
                    filename, stats.frames_processed, stats.frames_recovered
                );
            }
            Err(err) => {
                error!("Failed {}: {}", filename, err);
            }
        }
        reports.push(JobReport {
            filename,
            outcome: outcome.map_err(|err| err.to_string()),
        });
        info!("----------------------------------------");
    }

    let succeeded = reports
        .iter()
        .filter(|report| report.outcome.is_ok())
        .count();
    let summary = BatchSummary {
        total: files.len(),
        succeeded,
        failed: files.len() - succeeded,
        reports,
    };
    info!(
        "Batch finished: {} total, {} succeeded, {} failed",
        summary.total, summary.succeeded, summary.failed
    );
    Ok(summary)
}

fn prepare_job(input_path: &Path, output_root: &Path) -> CoreResult<ProcessingJob> {
    let stem = input_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            CoreError::PathError(format!(
                "cannot derive file stem for {}",
                input_path.display()
            ))
        })?;
    let output_dir = output_root.join(stem);
    fs::create_dir_all(&output_dir)?;
    Ok(ProcessingJob::new(input_path.to_path_buf(), output_dir))
}

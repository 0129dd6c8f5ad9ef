//! Per-video processing pipeline.
//!
//! Drives one job end-to-end: open the source, derive stream parameters,
//! open the three output writers, then decode / infer / aggregate /
//! composite / write frame by frame until the source is exhausted.
//!
//! Lifecycle and failure behavior:
//! - an unopenable source fails the job before any writer is created;
//! - writer construction failure releases the source and already-opened
//!   writers (Drop) before the error propagates;
//! - a frame whose inference, aggregation or compositing fails is logged
//!   with its index and recovered per the configured
//!   [`FrameFailurePolicy`]; the job continues with the next frame;
//! - decode and write failures stay fatal for the job;
//! - the source reader and all three writers are released on every exit
//!   path, normal or not (Drop), with an explicit release on the normal
//!   path so close errors surface.

use std::path::Path;

use log::{debug, info, warn};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use crate::compositing::{compose, ComposedFrames};
use crate::config::{CoreConfig, FrameFailurePolicy};
use crate::error::{CoreError, CoreResult};
use crate::masking::aggregate_masks;
use crate::output::{OutputStreamSet, ProcessingJob, StreamParameters};
use crate::progress::ProgressTracker;
use crate::segmentation::Segmenter;

/// Statistics for one completed job.
#[derive(Debug, Clone, Copy)]
pub struct JobStats {
    /// Frames decoded from the source.
    pub frames_processed: u64,
    /// Frames recovered via the frame-failure policy.
    pub frames_recovered: u64,
    /// Total frame count reported by the container (0 if unknown).
    pub total_frames: u64,
}

/// Processes one video into its three derived streams.
pub struct VideoPipeline<'a, S: Segmenter> {
    segmenter: &'a S,
    config: &'a CoreConfig,
}

impl<'a, S: Segmenter> VideoPipeline<'a, S> {
    pub fn new(segmenter: &'a S, config: &'a CoreConfig) -> Self {
        Self { segmenter, config }
    }

    /// Runs the pipeline for one job.
    pub fn run(&self, job: &ProcessingJob) -> CoreResult<JobStats> {
        let file_name = job.file_name();

        let mut capture = open_source(&job.input_path)?;
        let params = StreamParameters::from_capture(&capture, &job.input_path)?;
        let total_frames = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;
        debug!(
            "'{}': {}x{} @ {:.2} fps, {} frames",
            file_name, params.width, params.height, params.fps, total_frames
        );

        // Capture is dropped (released) if writer construction fails here.
        let mut streams = OutputStreamSet::open(job, &params, &self.config.output_suffixes)?;
        info!(
            "Writing outputs for '{}' to {}",
            file_name,
            job.output_dir.display()
        );

        let mut progress = ProgressTracker::new(total_frames);
        let mut frame = Mat::default();
        let mut frames_processed: u64 = 0;
        let mut frames_recovered: u64 = 0;

        loop {
            // Read exhaustion ends the loop normally; read errors are fatal.
            if !capture.read(&mut frame)? || frame.empty() {
                break;
            }
            frames_processed += 1;

            match self.process_frame(&frame, frames_processed) {
                Ok(composed) => streams.write(&composed)?,
                Err(err) => {
                    frames_recovered += 1;
                    match self.config.frame_failure_policy {
                        FrameFailurePolicy::PassThrough => {
                            warn!(
                                "'{}': {}; writing pass-through frame",
                                file_name, err
                            );
                            streams.write_pass_through(&frame)?;
                        }
                        FrameFailurePolicy::Skip => {
                            warn!("'{}': {}; frame skipped in all outputs", file_name, err);
                        }
                    }
                }
            }

            for milestone in progress.update(frames_processed) {
                info!(
                    "'{}': processed {}/{} frames ({}%)",
                    file_name,
                    frames_processed,
                    progress.total_frames(),
                    milestone
                );
            }
        }

        capture.release()?;
        streams.release()?;

        Ok(JobStats {
            frames_processed,
            frames_recovered,
            total_frames,
        })
    }

    /// Infer, aggregate and composite one frame. Any failure here is
    /// recoverable at the loop level.
    fn process_frame(&self, frame: &Mat, index: u64) -> CoreResult<ComposedFrames> {
        let run = || -> CoreResult<ComposedFrames> {
            let instances = self.segmenter.predict(frame)?;
            let mask = aggregate_masks(
                &instances,
                frame.rows(),
                frame.cols(),
                &self.config.classes_to_mask,
                self.config.confidence_threshold,
            )?;
            compose(
                frame,
                &mask,
                &instances,
                self.config.visualization_alpha,
                &self.config.class_labels,
            )
        };

        run().map_err(|err| CoreError::FrameProcessing {
            index,
            message: err.to_string(),
        })
    }
}

fn open_source(path: &Path) -> CoreResult<VideoCapture> {
    let path_str = path
        .to_str()
        .ok_or_else(|| CoreError::PathError(format!("non-UTF-8 input path {}", path.display())))?;

    let capture =
        VideoCapture::from_file(path_str, videoio::CAP_ANY).map_err(|err| CoreError::SourceOpen {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let opened = capture.is_opened().map_err(|err| CoreError::SourceOpen {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    if !opened {
        return Err(CoreError::SourceOpen {
            path: path.to_path_buf(),
            message: "file is missing, corrupt or in an unsupported format".to_string(),
        });
    }
    Ok(capture)
}

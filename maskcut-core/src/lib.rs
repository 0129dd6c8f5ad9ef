//! Core library for the maskcut video instance-masking pipeline.
//!
//! For every input video, maskcut produces three time-aligned derivative
//! streams driven by per-frame instance segmentation: an annotated
//! visualization, a binary mask-only stream for the selected classes, and
//! a foreground-removed stream where selected-class pixels are zeroed.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use maskcut_core::{find_processable_files, process_videos, CoreConfig};
//! use maskcut_core::segmentation::onnx::OnnxSegmenter;
//!
//! let config = CoreConfig::default();
//! config.validate().unwrap();
//!
//! let input_dir = PathBuf::from("/path/to/videos");
//! let output_dir = PathBuf::from("/path/to/output");
//! let files = find_processable_files(&input_dir, &config.video_extensions).unwrap();
//! let segmenter = OnnxSegmenter::new(std::path::Path::new("model.onnx")).unwrap();
//!
//! let summary = process_videos(&segmenter, &config, &files, &output_dir).unwrap();
//! println!("{}/{} videos succeeded", summary.succeeded, summary.total);
//! ```

pub mod compositing;
pub mod config;
pub mod discovery;
pub mod error;
pub mod masking;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod progress;
pub mod segmentation;

// Re-exports for public API
pub use compositing::{compose, ComposedFrames};
pub use config::{CoreConfig, FrameFailurePolicy, OutputSuffixes};
pub use discovery::find_processable_files;
pub use error::{CoreError, CoreResult};
pub use masking::aggregate_masks;
pub use output::{OutputStreamSet, ProcessingJob, StreamParameters};
pub use pipeline::{JobStats, VideoPipeline};
pub use processing::{process_videos, BatchSummary, JobReport};
pub use progress::ProgressTracker;
pub use segmentation::{Instance, Segmenter};

#[cfg(feature = "backend-onnx")]
pub use segmentation::onnx::OnnxSegmenter;

//! Error taxonomy for the maskcut core library.

use std::path::PathBuf;

use thiserror::Error;

/// Custom error types for maskcut.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid path: {0}")]
    PathError(String),

    #[error("No processable video files found")]
    NoFilesFound,

    /// The source video could not be opened or decoded. Fatal for the job;
    /// raised before any output writer is created.
    #[error("Cannot open source video '{}': {message}", path.display())]
    SourceOpen { path: PathBuf, message: String },

    /// One of the three output writers could not be created. Fatal for the
    /// job; any writer opened earlier is released before this surfaces.
    #[error("Cannot create output stream '{}': {message}", path.display())]
    StreamInit { path: PathBuf, message: String },

    /// A single frame failed in inference, aggregation or compositing.
    /// Recovered inside the pipeline; never aborts the job.
    #[error("Frame {index}: {message}")]
    FrameProcessing { index: u64, message: String },

    #[error("Segmentation error: {0}")]
    Segmentation(String),
}

/// Result type for maskcut core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

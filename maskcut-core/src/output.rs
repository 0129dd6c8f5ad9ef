//! Output stream set and job plumbing.
//!
//! One job owns three synchronized video writers sharing the source
//! video's frame rate and dimensions. They are created together, receive
//! exactly one write per processed frame each, and are released together.
//! Release is Drop-backed, so an early error return can never leak a
//! writer.

use std::path::{Path, PathBuf};

use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoWriter};

use crate::compositing::ComposedFrames;
use crate::config::OutputSuffixes;
use crate::error::{CoreError, CoreResult};

/// Frame rate reported by containers that do not carry one.
const FALLBACK_FPS: f64 = 30.0;

/// Stream parameters derived once from the opened source video and shared
/// by all three writers. Immutable for the lifetime of one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamParameters {
    pub fps: f64,
    pub width: i32,
    pub height: i32,
}

impl StreamParameters {
    /// Reads fps and dimensions from an opened capture.
    pub fn from_capture(capture: &VideoCapture, source: &Path) -> CoreResult<Self> {
        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        if width <= 0 || height <= 0 {
            return Err(CoreError::SourceOpen {
                path: source.to_path_buf(),
                message: format!("invalid frame dimensions {width}x{height}"),
            });
        }

        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            FALLBACK_FPS
        };

        Ok(Self { fps, width, height })
    }

    pub fn frame_size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// One video's unit of work: the source path plus the directory the three
/// derived outputs are written into.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
}

impl ProcessingJob {
    pub fn new(input_path: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_path,
            output_dir,
        }
    }

    /// The source file name, for log messages.
    pub fn file_name(&self) -> String {
        self.input_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.input_path.display().to_string())
    }

    /// Derives an output path as `<output_dir>/<stem><suffix>`.
    pub fn output_path(&self, suffix: &str) -> CoreResult<PathBuf> {
        let stem = self
            .input_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                CoreError::PathError(format!(
                    "cannot derive file stem for {}",
                    self.input_path.display()
                ))
            })?;
        Ok(self.output_dir.join(format!("{stem}{suffix}")))
    }
}

/// The three synchronized writers for one job.
pub struct OutputStreamSet {
    visualization: VideoWriter,
    mask_only: VideoWriter,
    masked_final: VideoWriter,
}

impl OutputStreamSet {
    /// Opens all three writers. If any of them cannot be created the
    /// already-opened ones are dropped before the error propagates.
    pub fn open(
        job: &ProcessingJob,
        params: &StreamParameters,
        suffixes: &OutputSuffixes,
    ) -> CoreResult<Self> {
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let size = params.frame_size();

        let visualization =
            open_writer(&job.output_path(&suffixes.visualization)?, fourcc, params.fps, size)?;
        let mask_only =
            open_writer(&job.output_path(&suffixes.mask_only)?, fourcc, params.fps, size)?;
        let masked_final =
            open_writer(&job.output_path(&suffixes.masked_final)?, fourcc, params.fps, size)?;

        Ok(Self {
            visualization,
            mask_only,
            masked_final,
        })
    }

    /// Writes one composed frame batch, one frame to each writer.
    pub fn write(&mut self, frames: &ComposedFrames) -> CoreResult<()> {
        self.visualization.write(&frames.visualization)?;
        self.mask_only.write(&frames.mask_only)?;
        self.masked_final.write(&frames.masked_final)?;
        Ok(())
    }

    /// Writes the unmodified source frame to all three writers, keeping
    /// the streams frame-aligned when a frame's processing failed.
    pub fn write_pass_through(&mut self, frame: &Mat) -> CoreResult<()> {
        self.visualization.write(frame)?;
        self.mask_only.write(frame)?;
        self.masked_final.write(frame)?;
        Ok(())
    }

    /// Flushes and releases all three writers. Dropping the set releases
    /// them as well; this exists so the normal path can surface errors.
    pub fn release(&mut self) -> CoreResult<()> {
        self.visualization.release()?;
        self.mask_only.release()?;
        self.masked_final.release()?;
        Ok(())
    }
}

fn open_writer(path: &Path, fourcc: i32, fps: f64, size: Size) -> CoreResult<VideoWriter> {
    let path_str = path
        .to_str()
        .ok_or_else(|| CoreError::PathError(format!("non-UTF-8 output path {}", path.display())))?;

    let writer = VideoWriter::new(path_str, fourcc, fps, size, true).map_err(|err| {
        CoreError::StreamInit {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    })?;
    if !writer.is_opened().map_err(|err| CoreError::StreamInit {
        path: path.to_path_buf(),
        message: err.to_string(),
    })? {
        return Err(CoreError::StreamInit {
            path: path.to_path_buf(),
            message: "video writer backend refused to open".to_string(),
        });
    }
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_combine_stem_and_suffix() {
        let job = ProcessingJob::new(
            PathBuf::from("/videos/match_01.mp4"),
            PathBuf::from("/out/match_01"),
        );
        let suffixes = OutputSuffixes::default();

        assert_eq!(
            job.output_path(&suffixes.visualization).unwrap(),
            PathBuf::from("/out/match_01/match_01_visualization.mp4")
        );
        assert_eq!(
            job.output_path(&suffixes.mask_only).unwrap(),
            PathBuf::from("/out/match_01/match_01_mask_only.mp4")
        );
        assert_eq!(
            job.output_path(&suffixes.masked_final).unwrap(),
            PathBuf::from("/out/match_01/match_01_masked_final.mp4")
        );
    }

    #[test]
    fn custom_suffixes_are_not_hard_coded() {
        let job = ProcessingJob::new(PathBuf::from("clip.mov"), PathBuf::from("out"));
        assert_eq!(
            job.output_path("_fg_removed.avi").unwrap(),
            PathBuf::from("out/clip_fg_removed.avi")
        );
    }
}

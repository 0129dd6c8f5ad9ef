//! Segmentation oracle boundary.
//!
//! The pipeline consumes instance segmentation through the [`Segmenter`]
//! trait so that tests can substitute a deterministic stub and real
//! deployments can plug in an inference backend. One `predict` call per
//! frame; the call is blocking and the pipeline does not time it out.

use opencv::core::Mat;

use crate::error::CoreResult;

#[cfg(feature = "backend-onnx")]
pub mod onnx;

/// One detected object instance on a single frame.
///
/// The mask is a single-channel 8-bit Mat at frame resolution where 255
/// marks instance pixels and 0 marks background. Instances are produced
/// fresh per frame and discarded after aggregation.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Class id exactly as the model reports it.
    pub class_id: i32,
    /// Confidence score in [0.0, 1.0].
    pub score: f32,
    /// Per-pixel instance mask (CV_8UC1, frame height x width).
    pub mask: Mat,
}

/// Capability of turning one decoded frame into a list of detected
/// instances.
pub trait Segmenter {
    /// Runs instance segmentation on one BGR frame.
    ///
    /// Implementations must be side-effect-free on the frame. An empty
    /// result is valid and means nothing was detected.
    fn predict(&self, frame: &Mat) -> CoreResult<Vec<Instance>>;
}

//! ONNX-backed segmentation oracle.
//!
//! Runs a torchvision-style instance segmentation export (Mask R-CNN and
//! friends): input is a `float32[3,h,w]` RGB image in [0,1], outputs are
//! `boxes [n,4]`, `labels int64[n]`, `scores float32[n]` and
//! `masks float32[n,1,mh,mw]`. Mask maps are resized to frame resolution
//! and binarized at 0.5. Class ids are reported exactly as the model emits
//! them; the caller's class filter must use the same label space.

use std::path::Path;
use std::sync::Arc;

use ndarray::{Array3, Axis, CowArray, IxDyn};
use once_cell::sync::OnceCell;
use opencv::core::{self, Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use ort::environment::Environment;
use ort::session::{Session, SessionBuilder};
use ort::value::Value;

use crate::error::{CoreError, CoreResult};
use crate::segmentation::{Instance, Segmenter};

/// Detections below this score are dropped before they ever reach the
/// aggregator. The aggregator applies the configured threshold on top.
const DEFAULT_SCORE_FLOOR: f32 = 0.05;

/// Probability above which a mask pixel counts as foreground.
const MASK_BINARIZATION_THRESHOLD: f64 = 0.5;

static ENVIRONMENT: OnceCell<Arc<Environment>> = OnceCell::new();

fn environment() -> CoreResult<Arc<Environment>> {
    ENVIRONMENT
        .get_or_try_init(|| {
            Environment::builder()
                .with_name("maskcut")
                .build()
                .map(Arc::new)
                .map_err(|err| CoreError::Segmentation(err.to_string()))
        })
        .cloned()
}

/// Instance segmentation backed by an ONNX Runtime session.
///
/// One session per segmenter; the ort environment is shared process-wide.
pub struct OnnxSegmenter {
    _environment: Arc<Environment>,
    session: Session,
    score_floor: f32,
}

impl OnnxSegmenter {
    /// Loads the model at `model_path` and prepares a session.
    pub fn new(model_path: &Path) -> CoreResult<Self> {
        if !model_path.exists() {
            return Err(CoreError::PathError(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let environment = environment()?;
        let session = SessionBuilder::new(&environment)
            .map_err(|err| CoreError::Segmentation(err.to_string()))?
            .with_model_from_file(model_path)
            .map_err(|err| CoreError::Segmentation(err.to_string()))?;

        Ok(Self {
            _environment: environment,
            session,
            score_floor: DEFAULT_SCORE_FLOOR,
        })
    }

    /// Overrides the internal score floor applied before any detection is
    /// returned.
    pub fn with_score_floor(mut self, score_floor: f32) -> Self {
        self.score_floor = score_floor;
        self
    }

    fn prepare_input(&self, frame: &Mat) -> CoreResult<Array3<f32>> {
        let rows = frame.rows();
        let cols = frame.cols();
        if rows <= 0 || cols <= 0 {
            return Err(CoreError::Segmentation("empty input frame".to_string()));
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(
            frame,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
        )?;
        let data = rgb.data_bytes()?;

        let height = rows as usize;
        let width = cols as usize;
        let mut input = Array3::<f32>::zeros((3, height, width));
        for y in 0..height {
            for x in 0..width {
                let base = (y * width + x) * 3;
                for channel in 0..3 {
                    input[[channel, y, x]] = f32::from(data[base + channel]) / 255.0;
                }
            }
        }
        Ok(input)
    }

    fn mask_to_frame_size(
        &self,
        map: &[f32],
        map_height: usize,
        map_width: usize,
        frame_size: Size,
    ) -> CoreResult<Mat> {
        let flat = Mat::from_slice(map)?;
        let shaped = flat.reshape(1, map_height as i32)?;

        let mut resized = Mat::default();
        if map_height as i32 == frame_size.height && map_width as i32 == frame_size.width {
            shaped.copy_to(&mut resized)?;
        } else {
            imgproc::resize(
                &shaped,
                &mut resized,
                frame_size,
                0.0,
                0.0,
                imgproc::INTER_LINEAR,
            )?;
        }

        let mut binary = Mat::default();
        imgproc::threshold(
            &resized,
            &mut binary,
            MASK_BINARIZATION_THRESHOLD,
            255.0,
            imgproc::THRESH_BINARY,
        )?;

        let mut mask = Mat::default();
        binary.convert_to(&mut mask, core::CV_8U, 1.0, 0.0)?;
        Ok(mask)
    }
}

impl Segmenter for OnnxSegmenter {
    fn predict(&self, frame: &Mat) -> CoreResult<Vec<Instance>> {
        let input = self.prepare_input(frame)?;
        let frame_size = Size::new(frame.cols(), frame.rows());

        let allocator = self.session.allocator();
        let input_dyn: CowArray<'_, f32, IxDyn> = CowArray::from(input.view().into_dyn());
        let value = Value::from_array(allocator, &input_dyn)
            .map_err(|err| CoreError::Segmentation(err.to_string()))?;

        let outputs = self
            .session
            .run(vec![value])
            .map_err(|err| CoreError::Segmentation(err.to_string()))?;
        if outputs.len() < 4 {
            return Err(CoreError::Segmentation(format!(
                "model produced {} outputs, expected boxes/labels/scores/masks",
                outputs.len()
            )));
        }

        let missing = || CoreError::Segmentation("missing model output".to_string());
        let mut outputs = outputs.into_iter();
        let _boxes = outputs.next();
        let labels = outputs
            .next()
            .ok_or_else(missing)?
            .try_extract::<i64>()
            .map_err(|err| CoreError::Segmentation(err.to_string()))?;
        let scores = outputs
            .next()
            .ok_or_else(missing)?
            .try_extract::<f32>()
            .map_err(|err| CoreError::Segmentation(err.to_string()))?;
        let masks = outputs
            .next()
            .ok_or_else(missing)?
            .try_extract::<f32>()
            .map_err(|err| CoreError::Segmentation(err.to_string()))?;

        let labels = labels.view().iter().copied().collect::<Vec<i64>>();
        let scores = scores.view().iter().copied().collect::<Vec<f32>>();
        let masks_view = masks.view();
        let shape = masks_view.shape().to_vec();

        // masks arrive as [n,1,mh,mw] or [n,mh,mw]
        let (count, map_height, map_width) = match shape.as_slice() {
            [n, 1, h, w] => (*n, *h, *w),
            [n, h, w] => (*n, *h, *w),
            other => {
                return Err(CoreError::Segmentation(format!(
                    "unexpected mask output shape {other:?}"
                )));
            }
        };
        if count != labels.len() || count != scores.len() {
            return Err(CoreError::Segmentation(format!(
                "mismatched output lengths: {} masks, {} labels, {} scores",
                count,
                labels.len(),
                scores.len()
            )));
        }

        let mut instances = Vec::new();
        for index in 0..count {
            let score = scores[index];
            if score < self.score_floor {
                continue;
            }
            let map = masks_view
                .index_axis(Axis(0), index)
                .iter()
                .copied()
                .collect::<Vec<f32>>();
            let mask = self.mask_to_frame_size(&map, map_height, map_width, frame_size)?;
            instances.push(Instance {
                class_id: labels[index] as i32,
                score,
                mask,
            });
        }

        Ok(instances)
    }
}

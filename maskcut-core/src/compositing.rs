//! Frame compositing.
//!
//! Builds the three derived frames for one source frame: the mask-only
//! stream (aggregated mask expanded to BGR), the masked-final stream
//! (source with mask pixels zeroed) and the visualization stream (source
//! with every detected instance tinted, outlined and captioned). The
//! visualization is diagnostic: it renders all instances the oracle
//! returned, ignoring the class filter used for the other two outputs.

use std::collections::HashMap;

use opencv::core::{self, Mat, Point, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::{CoreError, CoreResult};
use crate::segmentation::Instance;

/// BGR palette cycled through by class id.
const PALETTE: [(f64, f64, f64); 8] = [
    (64.0, 64.0, 230.0),
    (64.0, 200.0, 64.0),
    (230.0, 96.0, 64.0),
    (48.0, 180.0, 230.0),
    (200.0, 64.0, 200.0),
    (64.0, 230.0, 230.0),
    (160.0, 160.0, 64.0),
    (200.0, 140.0, 230.0),
];

/// The three output frames derived from one source frame. All share the
/// source frame's dimensions.
#[derive(Debug)]
pub struct ComposedFrames {
    pub visualization: Mat,
    pub mask_only: Mat,
    pub masked_final: Mat,
}

/// Composes the three output frames from a source frame, its aggregated
/// mask and the full instance list.
pub fn compose(
    frame: &Mat,
    mask: &Mat,
    instances: &[Instance],
    alpha: f64,
    class_labels: &HashMap<i32, String>,
) -> CoreResult<ComposedFrames> {
    if mask.rows() != frame.rows() || mask.cols() != frame.cols() {
        return Err(CoreError::Segmentation(format!(
            "aggregated mask is {}x{}, expected {}x{}",
            mask.rows(),
            mask.cols(),
            frame.rows(),
            frame.cols()
        )));
    }

    let mut mask_only = Mat::default();
    imgproc::cvt_color(
        mask,
        &mut mask_only,
        imgproc::COLOR_GRAY2BGR,
        0,
    )?;

    // Copy only the background pixels; mask pixels stay zero.
    let mut inverted = Mat::default();
    core::bitwise_not(mask, &mut inverted, &core::no_array())?;
    let mut masked_final = Mat::default();
    core::bitwise_and(frame, frame, &mut masked_final, &inverted)?;

    let visualization = draw_instances(frame, instances, alpha, class_labels)?;

    Ok(ComposedFrames {
        visualization,
        mask_only,
        masked_final,
    })
}

fn class_color(class_id: i32) -> Scalar {
    let index = class_id.rem_euclid(PALETTE.len() as i32) as usize;
    let (b, g, r) = PALETTE[index];
    Scalar::new(b, g, r, 0.0)
}

fn draw_instances(
    frame: &Mat,
    instances: &[Instance],
    alpha: f64,
    class_labels: &HashMap<i32, String>,
) -> CoreResult<Mat> {
    let mut canvas = frame.clone();

    for instance in instances {
        if instance.mask.rows() != canvas.rows() || instance.mask.cols() != canvas.cols() {
            return Err(CoreError::Segmentation(format!(
                "instance mask is {}x{}, expected {}x{}",
                instance.mask.rows(),
                instance.mask.cols(),
                canvas.rows(),
                canvas.cols()
            )));
        }

        let color = class_color(instance.class_id);

        // Tint the instance region: alpha * color + (1 - alpha) * source.
        let mut tinted = canvas.clone();
        tinted.set_to(&color, &instance.mask)?;
        let mut blended = Mat::default();
        core::add_weighted(&tinted, alpha, &canvas, 1.0 - alpha, 0.0, &mut blended, -1)?;
        canvas = blended;

        let rect = imgproc::bounding_rect(&instance.mask)?;
        if rect.width == 0 || rect.height == 0 {
            continue;
        }
        imgproc::rectangle(&mut canvas, rect, color, 2, imgproc::LINE_8, 0)?;

        let name = class_labels
            .get(&instance.class_id)
            .cloned()
            .unwrap_or_else(|| format!("class {}", instance.class_id));
        let caption = format!("{} {:.0}%", name, f64::from(instance.score) * 100.0);
        let origin = Point::new(rect.x, (rect.y - 6).max(14));
        imgproc::put_text(
            &mut canvas,
            &caption,
            origin,
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.5,
            color,
            1,
            imgproc::LINE_8,
            false,
        )?;
    }

    Ok(canvas)
}

//! Mask aggregation.
//!
//! Reduces the oracle's per-frame instance list to a single binary mask:
//! instances whose class is in the filter and whose score meets the
//! threshold are combined with a pixel-wise OR. The result is always a
//! frame-sized CV_8UC1 Mat, all-zero when nothing qualifies.

use std::collections::HashSet;

use opencv::core::{self, Mat};
use opencv::prelude::*;

use crate::error::{CoreError, CoreResult};
use crate::segmentation::Instance;

/// Aggregates qualifying instance masks into one binary mask.
///
/// An instance qualifies iff its class id is in `classes` and its score is
/// at least `score_threshold`. The threshold is applied here and nowhere
/// else; 0.0 degenerates to class-only filtering. Instance order does not
/// affect the result.
pub fn aggregate_masks(
    instances: &[Instance],
    rows: i32,
    cols: i32,
    classes: &HashSet<i32>,
    score_threshold: f32,
) -> CoreResult<Mat> {
    let mut combined = Mat::zeros(rows, cols, core::CV_8UC1)?.to_mat()?;

    for instance in instances {
        if !classes.contains(&instance.class_id) || instance.score < score_threshold {
            continue;
        }
        if instance.mask.rows() != rows || instance.mask.cols() != cols {
            return Err(CoreError::Segmentation(format!(
                "instance mask is {}x{}, expected {}x{}",
                instance.mask.rows(),
                instance.mask.cols(),
                rows,
                cols
            )));
        }

        let mut merged = Mat::default();
        core::bitwise_or(&combined, &instance.mask, &mut merged, &core::no_array())?;
        combined = merged;
    }

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Rect, Scalar};

    fn rect_mask(rows: i32, cols: i32, rect: Rect) -> Mat {
        let mut mask =
            Mat::new_rows_cols_with_default(rows, cols, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        let mut roi = Mat::roi_mut(&mut mask, rect).unwrap();
        roi.set_to(&Scalar::all(255.0), &core::no_array()).unwrap();
        mask
    }

    fn instance(class_id: i32, score: f32, mask: Mat) -> Instance {
        Instance {
            class_id,
            score,
            mask,
        }
    }

    fn masks_equal(a: &Mat, b: &Mat) -> bool {
        let mut diff = Mat::default();
        core::absdiff(a, b, &mut diff).unwrap();
        core::count_non_zero(&diff).unwrap() == 0
    }

    #[test]
    fn no_instances_yields_all_background() {
        let classes = HashSet::from([0]);
        let mask = aggregate_masks(&[], 24, 32, &classes, 0.5).unwrap();
        assert_eq!(mask.rows(), 24);
        assert_eq!(mask.cols(), 32);
        assert_eq!(core::count_non_zero(&mask).unwrap(), 0);
    }

    #[test]
    fn class_filter_excludes_other_classes() {
        let classes = HashSet::from([0]);
        let wanted = rect_mask(24, 32, Rect::new(2, 2, 6, 6));
        let unwanted = rect_mask(24, 32, Rect::new(12, 12, 8, 8));
        let instances = vec![
            instance(0, 0.9, wanted.clone()),
            instance(5, 0.9, unwanted),
        ];

        let mask = aggregate_masks(&instances, 24, 32, &classes, 0.5).unwrap();
        assert!(masks_equal(&mask, &wanted));
    }

    #[test]
    fn score_threshold_is_inclusive() {
        let classes = HashSet::from([0]);
        let mask_a = rect_mask(24, 32, Rect::new(0, 0, 4, 4));
        let instances = vec![instance(0, 0.5, mask_a.clone())];

        let at_threshold = aggregate_masks(&instances, 24, 32, &classes, 0.5).unwrap();
        assert!(masks_equal(&at_threshold, &mask_a));

        let above_threshold = aggregate_masks(&instances, 24, 32, &classes, 0.51).unwrap();
        assert_eq!(core::count_non_zero(&above_threshold).unwrap(), 0);
    }

    #[test]
    fn zero_threshold_degenerates_to_class_only() {
        let classes = HashSet::from([3]);
        let mask_a = rect_mask(24, 32, Rect::new(1, 1, 3, 3));
        let instances = vec![instance(3, 0.0, mask_a.clone())];

        let mask = aggregate_masks(&instances, 24, 32, &classes, 0.0).unwrap();
        assert!(masks_equal(&mask, &mask_a));
    }

    #[test]
    fn union_is_order_independent() {
        let classes = HashSet::from([0, 1]);
        let mask_a = rect_mask(24, 32, Rect::new(0, 0, 8, 8));
        let mask_b = rect_mask(24, 32, Rect::new(6, 6, 8, 8));
        let forward = vec![
            instance(0, 0.9, mask_a.clone()),
            instance(1, 0.8, mask_b.clone()),
        ];
        let reversed = vec![instance(1, 0.8, mask_b), instance(0, 0.9, mask_a)];

        let first = aggregate_masks(&forward, 24, 32, &classes, 0.5).unwrap();
        let second = aggregate_masks(&reversed, 24, 32, &classes, 0.5).unwrap();
        assert!(masks_equal(&first, &second));
    }

    #[test]
    fn empty_class_filter_masks_nothing() {
        let classes = HashSet::new();
        let instances = vec![instance(0, 0.99, rect_mask(24, 32, Rect::new(0, 0, 8, 8)))];
        let mask = aggregate_masks(&instances, 24, 32, &classes, 0.0).unwrap();
        assert_eq!(core::count_non_zero(&mask).unwrap(), 0);
    }

    #[test]
    fn mismatched_mask_dimensions_are_rejected() {
        let classes = HashSet::from([0]);
        let instances = vec![instance(0, 0.9, rect_mask(10, 10, Rect::new(0, 0, 4, 4)))];
        let result = aggregate_masks(&instances, 24, 32, &classes, 0.5);
        assert!(matches!(result, Err(CoreError::Segmentation(_))));
    }
}

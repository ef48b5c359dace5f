use ndarray::{ArrayView1, ArrayView2};

use crate::error::{BoxError, Result};
use crate::traits::BoxFloat;

/// Reject anything that is not shaped [N, 4]
pub fn check_box_shape<F: BoxFloat>(boxes: &ArrayView2<'_, F>) -> Result<()> {
    if boxes.ncols() != 4 {
        return Err(BoxError::InvalidShape {
            shape: boxes.shape().to_vec(),
        });
    }
    Ok(())
}

/// Read one [N, 4] row as (y_min, x_min, y_max, x_max).
/// Callers must have checked the shape with `check_box_shape`.
pub fn row_corners<F: BoxFloat>(row: ArrayView1<'_, F>) -> (F, F, F, F) {
    (row[0], row[1], row[2], row[3])
}

/// Index of the first box with y_min > y_max or x_min > x_max
pub fn first_invalid_box<F: BoxFloat>(boxes: &ArrayView2<'_, F>) -> Option<usize> {
    boxes.outer_iter().position(|row| {
        let (y_min, x_min, y_max, x_max) = row_corners(row);
        // Equal corners are allowed (zero-area boxes)
        y_min > y_max || x_min > x_max
    })
}

/// Overlap area of two boxes, zero when they do not touch
pub fn pair_intersection<F: BoxFloat>(a: (F, F, F, F), b: (F, F, F, F)) -> F {
    let (ay1, ax1, ay2, ax2) = a;
    let (by1, bx1, by2, bx2) = b;

    // Negative extents mean no overlap on that axis, clamp to zero
    let height = (ay2.min(by2) - ay1.max(by1)).max(F::zero());
    let width = (ax2.min(bx2) - ax1.max(bx1)).max(F::zero());
    height * width
}

/// IoU of two boxes, zero when the union is empty
pub fn pair_iou<F: BoxFloat>(a: (F, F, F, F), b: (F, F, F, F)) -> F {
    let inter = pair_intersection(a, b);
    let area_a = (a.2 - a.0) * (a.3 - a.1);
    let area_b = (b.2 - b.0) * (b.3 - b.1);
    let union = area_a + area_b - inter;
    if union > F::zero() {
        inter / union
    } else {
        // Two zero-area boxes never count as overlapping
        F::zero()
    }
}

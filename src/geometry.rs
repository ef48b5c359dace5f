//! Pairwise geometry over [N, 4] box arrays.
//!
//! Boxes are rows of (y_min, x_min, y_max, x_max). Every function accepts
//! anything viewable as a 2-D array (`&Array2<F>`, `ArrayView2<F>`) and
//! returns `BoxError::InvalidShape` for inputs that are not [N, 4].

use ndarray::{Array1, Array2, ArrayView2, AsArray, Ix2, Zip};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::traits::BoxFloat;
use crate::utils::{check_box_shape, pair_intersection, row_corners};

/// What IoU reports when two zero-area boxes give a zero union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateUnion {
    /// Leave the 0 / 0 division as NaN
    #[default]
    Nan,
    /// Report 0.0 for the pair
    Zero,
}

/// Configuration for overlap metrics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    pub degenerate_union: DegenerateUnion,
}

/// Overlap metrics (IoU, IoA) bound to a configuration
#[derive(Debug, Clone, Default)]
pub struct Overlap {
    config: OverlapConfig,
}

impl Overlap {
    pub fn new(config: OverlapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverlapConfig {
        &self.config
    }

    /// Pairwise intersection-over-union, shape [N, M]
    pub fn iou<'a, 'b, F, A, B>(&self, boxes1: A, boxes2: B) -> Result<Array2<F>>
    where
        F: BoxFloat + 'a + 'b,
        A: AsArray<'a, F, Ix2>,
        B: AsArray<'b, F, Ix2>,
    {
        let boxes1: ArrayView2<'a, F> = boxes1.into();
        let boxes2: ArrayView2<'b, F> = boxes2.into();

        let intersect = intersection(boxes1, boxes2)?;
        let area1 = area(boxes1)?;
        let area2 = area(boxes2)?;

        let mut degenerate = 0usize;
        let mut result = Array2::<F>::zeros(intersect.raw_dim());
        Zip::indexed(&mut result)
            .and(&intersect)
            .for_each(|(i, j), out, &inter| {
                let union = area1[i] + area2[j] - inter;
                // Only two zero-area boxes can give an empty union
                if union == F::zero() {
                    degenerate += 1;
                    *out = match self.config.degenerate_union {
                        DegenerateUnion::Nan => inter / union,
                        DegenerateUnion::Zero => F::zero(),
                    };
                } else {
                    *out = inter / union;
                }
            });

        if degenerate > 0 && self.config.degenerate_union == DegenerateUnion::Nan {
            warn!(
                pairs = degenerate,
                "IoU computed over zero-area unions, results contain NaN"
            );
        }

        Ok(result)
    }

    /// Pairwise intersection over the area of the second set's box, shape [N, M].
    /// A zero-area box in `boxes2` gives NaN (or 0.0 under `DegenerateUnion::Zero`).
    pub fn ioa<'a, 'b, F, A, B>(&self, boxes1: A, boxes2: B) -> Result<Array2<F>>
    where
        F: BoxFloat + 'a + 'b,
        A: AsArray<'a, F, Ix2>,
        B: AsArray<'b, F, Ix2>,
    {
        let boxes1: ArrayView2<'a, F> = boxes1.into();
        let boxes2: ArrayView2<'b, F> = boxes2.into();

        let mut result = intersection(boxes1, boxes2)?;
        let area2 = area(boxes2)?;

        let mut degenerate = 0usize;
        for (j, mut column) in result.columns_mut().into_iter().enumerate() {
            let denominator = area2[j];
            if denominator == F::zero() {
                // Zero-area box in the second set: the whole column divides by zero
                degenerate += 1;
                if self.config.degenerate_union == DegenerateUnion::Zero {
                    column.fill(F::zero());
                    continue;
                }
            }
            column.mapv_inplace(|inter| inter / denominator);
        }

        if degenerate > 0 && self.config.degenerate_union == DegenerateUnion::Nan {
            warn!(
                columns = degenerate,
                "IoA computed over zero-area boxes, results contain NaN"
            );
        }

        Ok(result)
    }
}

/// Area of each box, shape [N]. Inverted boxes give negative areas.
pub fn area<'a, F, A>(boxes: A) -> Result<Array1<F>>
where
    F: BoxFloat + 'a,
    A: AsArray<'a, F, Ix2>,
{
    let boxes: ArrayView2<'a, F> = boxes.into();
    check_box_shape(&boxes)?;

    // Columns are y_min, x_min, y_max, x_max
    let heights = &boxes.column(2) - &boxes.column(0);
    let widths = &boxes.column(3) - &boxes.column(1);
    Ok(heights * widths)
}

/// Pairwise intersection areas, shape [N, M]
pub fn intersection<'a, 'b, F, A, B>(boxes1: A, boxes2: B) -> Result<Array2<F>>
where
    F: BoxFloat + 'a + 'b,
    A: AsArray<'a, F, Ix2>,
    B: AsArray<'b, F, Ix2>,
{
    let boxes1: ArrayView2<'a, F> = boxes1.into();
    let boxes2: ArrayView2<'b, F> = boxes2.into();
    check_box_shape(&boxes1)?;
    check_box_shape(&boxes2)?;

    let mut result = Array2::zeros((boxes1.nrows(), boxes2.nrows()));
    Zip::indexed(&mut result).for_each(|(i, j), out| {
        *out = pair_intersection(row_corners(boxes1.row(i)), row_corners(boxes2.row(j)));
    });

    Ok(result)
}

/// Pairwise intersection-over-union with the default configuration
pub fn iou<'a, 'b, F, A, B>(boxes1: A, boxes2: B) -> Result<Array2<F>>
where
    F: BoxFloat + 'a + 'b,
    A: AsArray<'a, F, Ix2>,
    B: AsArray<'b, F, Ix2>,
{
    Overlap::default().iou(boxes1, boxes2)
}

/// Pairwise intersection-over-area with the default configuration
pub fn ioa<'a, 'b, F, A, B>(boxes1: A, boxes2: B) -> Result<Array2<F>>
where
    F: BoxFloat + 'a + 'b,
    A: AsArray<'a, F, Ix2>,
    B: AsArray<'b, F, Ix2>,
{
    Overlap::default().ioa(boxes1, boxes2)
}

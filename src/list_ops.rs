//! Operations over whole box lists: selection, ordering, score filtering,
//! non-maximum suppression and coordinate transforms.
//!
//! Every operation returns a new `BoxList` and carries the extra fields of
//! the input along, row for row.

use std::cmp::Ordering;

use ndarray::{Array2, Axis};
use num_traits::NumCast;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::box_list::{BoxList, BOXES_FIELD, SCORES_FIELD};
use crate::error::{BoxError, Result};
use crate::geometry::area;
use crate::traits::BoxFloat;
use crate::utils::{pair_iou, row_corners};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Configuration for non-maximum suppression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NmsConfig {
    /// Maximum number of boxes kept
    pub max_output_size: usize,

    /// Boxes overlapping a kept box by more than this IoU are suppressed
    pub iou_threshold: f64,

    /// Boxes scoring at or below this are dropped before suppression
    pub score_threshold: Option<f64>,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            max_output_size: usize::MAX,
            iou_threshold: 0.5,
            score_threshold: None,
        }
    }
}

/// Select rows by index, in the given order (repeats allowed).
///
/// `fields` restricts which extra fields are carried over; `None` keeps all.
pub fn gather<F: BoxFloat>(
    list: &BoxList<F>,
    indices: &[usize],
    fields: Option<&[&str]>,
) -> Result<BoxList<F>> {
    let len = list.num_boxes();
    if let Some(&index) = indices.iter().find(|&&i| i >= len) {
        return Err(BoxError::IndexOutOfRange { index, len });
    }

    let mut subset = BoxList::new(list.get().select(Axis(0), indices))?;

    match fields {
        Some(names) => {
            for &name in names {
                // Boxes are always carried; repeated names are taken once
                if name == BOXES_FIELD || subset.has_field(name) {
                    continue;
                }
                let data = list.extra_field(name)?;
                subset.add_field(name, data.select_rows(indices))?;
            }
        }
        None => {
            for (name, data) in list.extra_fields() {
                subset.add_field(name, data.select_rows(indices))?;
            }
        }
    }

    Ok(subset)
}

/// Stable sort of all rows by a 1-D numeric field
pub fn sort_by_field<F: BoxFloat>(
    list: &BoxList<F>,
    field: &str,
    order: SortOrder,
) -> Result<BoxList<F>> {
    let values = list.get_scalar_field(field)?;
    gather(list, &sorted_indices(&values, order), None)
}

/// Keep rows whose "scores" value is strictly greater than `threshold`
pub fn filter_scores_greater_than<F: BoxFloat>(
    list: &BoxList<F>,
    threshold: f64,
) -> Result<BoxList<F>> {
    let scores = list.get_scalar_field(SCORES_FIELD)?;
    let keep: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score > threshold)
        .map(|(i, _)| i)
        .collect();
    gather(list, &keep, None)
}

/// Greedy non-maximum suppression over the "scores" field.
///
/// The result is ordered by descending score.
pub fn non_max_suppression<F: BoxFloat>(list: &BoxList<F>, config: &NmsConfig) -> Result<BoxList<F>> {
    if !(0.0..=1.0).contains(&config.iou_threshold) {
        return Err(BoxError::InvalidConfig(format!(
            "iou_threshold must be in [0, 1], got {}",
            config.iou_threshold
        )));
    }
    let iou_threshold = cast::<F>(config.iou_threshold)?;

    let scores = list.get_scalar_field(SCORES_FIELD)?;
    let candidates: Vec<usize> = sorted_indices(&scores, SortOrder::Descending)
        .into_iter()
        .filter(|&i| config.score_threshold.map_or(true, |t| scores[i] > t))
        .collect();

    let boxes = list.get();
    let mut kept: Vec<usize> = Vec::new();
    for &candidate in &candidates {
        if kept.len() >= config.max_output_size {
            break;
        }
        let corners = row_corners(boxes.row(candidate));
        // Compare only against boxes already kept (higher scores)
        let suppressed = kept
            .iter()
            .any(|&k| pair_iou(corners, row_corners(boxes.row(k))) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }

    debug!(
        boxes = list.num_boxes(),
        candidates = candidates.len(),
        kept = kept.len(),
        "non-max suppression"
    );

    gather(list, &kept, None)
}

/// Clip boxes to `window` (y_min, x_min, y_max, x_max) and drop boxes whose
/// clipped area is zero
pub fn clip_to_window<F: BoxFloat>(list: &BoxList<F>, window: [F; 4]) -> Result<BoxList<F>> {
    let [win_y_min, win_x_min, win_y_max, win_x_max] = window;
    if !(win_y_min <= win_y_max && win_x_min <= win_x_max) {
        return Err(BoxError::InvalidConfig(format!(
            "clip window must satisfy y_min <= y_max and x_min <= x_max, got {:?}",
            window
        )));
    }

    // Clamp each corner into the window; boxes fully outside collapse to an edge
    let mut clipped = list.get().to_owned();
    for mut row in clipped.outer_iter_mut() {
        row[0] = row[0].max(win_y_min).min(win_y_max);
        row[1] = row[1].max(win_x_min).min(win_x_max);
        row[2] = row[2].max(win_y_min).min(win_y_max);
        row[3] = row[3].max(win_x_min).min(win_x_max);
    }

    let keep: Vec<usize> = area(&clipped)?
        .iter()
        .enumerate()
        .filter(|(_, &a)| a > F::zero())
        .map(|(i, _)| i)
        .collect();

    if keep.len() < list.num_boxes() {
        debug!(
            dropped = list.num_boxes() - keep.len(),
            "clip to window removed boxes outside the window"
        );
    }

    gather(&with_boxes(list, clipped)?, &keep, None)
}

/// Scale y coordinates by `y_scale` and x coordinates by `x_scale`
pub fn scale<F: BoxFloat>(list: &BoxList<F>, y_scale: F, x_scale: F) -> Result<BoxList<F>> {
    if !(y_scale >= F::zero() && x_scale >= F::zero()) {
        return Err(BoxError::InvalidConfig(format!(
            "scale factors must be non-negative, got y={} x={}",
            y_scale, x_scale
        )));
    }

    let mut scaled = list.get().to_owned();
    for mut row in scaled.outer_iter_mut() {
        row[0] = row[0] * y_scale;
        row[1] = row[1] * x_scale;
        row[2] = row[2] * y_scale;
        row[3] = row[3] * x_scale;
    }

    with_boxes(list, scaled)
}

/// Same fields as `list`, new coordinates
fn with_boxes<F: BoxFloat>(list: &BoxList<F>, boxes: Array2<F>) -> Result<BoxList<F>> {
    let mut result = BoxList::new(boxes)?;
    for (name, data) in list.extra_fields() {
        result.add_field(name, data.clone())?;
    }
    Ok(result)
}

/// Stable argsort. NaN values go last in either order.
fn sorted_indices(values: &[f64], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| {
        let (x, y) = (values[a], values[b]);
        match (x.is_nan(), y.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match order {
                SortOrder::Ascending => x.total_cmp(&y),
                SortOrder::Descending => y.total_cmp(&x),
            },
        }
    });
    indices
}

fn cast<F: BoxFloat>(value: f64) -> Result<F> {
    <F as NumCast>::from(value)
        .ok_or_else(|| BoxError::InvalidConfig(format!("{} is not representable as {}", value, F::DTYPE)))
}

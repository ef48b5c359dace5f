//! # boxlist
//!
//! Bounding box geometry for detection and evaluation pipelines.
//! Boxes are [N, 4] arrays of (y_min, x_min, y_max, x_max) rows.
//!
//! - `geometry`: pairwise area, intersection, IoU and IoA
//! - `box_list`: a validated box collection with per-box fields
//! - `list_ops`: gather, sort, score filtering, NMS, clipping and scaling

pub mod box_list;
pub mod error;
pub mod geometry;
pub mod list_ops;
pub mod traits;
pub mod utils;

pub use box_list::{BoxList, FieldData, FieldRef, BOXES_FIELD, SCORES_FIELD};
pub use error::{BoxError, Result};
pub use geometry::{area, intersection, ioa, iou, DegenerateUnion, Overlap, OverlapConfig};
pub use list_ops::{
    clip_to_window, filter_scores_greater_than, gather, non_max_suppression, scale, sort_by_field,
    NmsConfig, SortOrder,
};
pub use traits::{BoundingBox, BoxFloat};

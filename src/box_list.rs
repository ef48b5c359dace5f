//! Box collections with per-box attribute fields.

use ndarray::{Array, Array2, ArrayD, ArrayView1, ArrayView2, Axis, Dimension, Ix2};

use crate::error::{BoxError, Result};
use crate::traits::{BoundingBox, BoxFloat};
use crate::utils::{check_box_shape, first_invalid_box};

/// Name of the mandatory coordinate field
pub const BOXES_FIELD: &str = "boxes";

/// Name of the field read by score filtering and NMS
pub const SCORES_FIELD: &str = "scores";

/// Per-box attribute data. The leading dimension indexes boxes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    Bool(ArrayD<bool>),
}

macro_rules! field_data_from {
    ($elem:ty, $variant:ident) => {
        impl<D: Dimension> From<Array<$elem, D>> for FieldData {
            fn from(array: Array<$elem, D>) -> Self {
                FieldData::$variant(array.into_dyn())
            }
        }

        impl From<Vec<$elem>> for FieldData {
            fn from(values: Vec<$elem>) -> Self {
                FieldData::$variant(Array::from_vec(values).into_dyn())
            }
        }
    };
}

field_data_from!(f32, Float32);
field_data_from!(f64, Float64);
field_data_from!(i32, Int32);
field_data_from!(i64, Int64);
field_data_from!(bool, Bool);

impl FieldData {
    pub fn shape(&self) -> &[usize] {
        match self {
            FieldData::Float32(a) => a.shape(),
            FieldData::Float64(a) => a.shape(),
            FieldData::Int32(a) => a.shape(),
            FieldData::Int64(a) => a.shape(),
            FieldData::Bool(a) => a.shape(),
        }
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            FieldData::Float32(_) => "float32",
            FieldData::Float64(_) => "float64",
            FieldData::Int32(_) => "int32",
            FieldData::Int64(_) => "int64",
            FieldData::Bool(_) => "bool",
        }
    }

    /// Number of rows, `None` for 0-dimensional data
    pub fn len(&self) -> Option<usize> {
        self.shape().first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.len().map_or(true, |n| n == 0)
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            FieldData::Float32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            FieldData::Float64(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&ArrayD<i32>> {
        match self {
            FieldData::Int32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&ArrayD<i64>> {
        match self {
            FieldData::Int64(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&ArrayD<bool>> {
        match self {
            FieldData::Bool(a) => Some(a),
            _ => None,
        }
    }

    /// Rows at `indices` along the leading axis, in the given order.
    /// Indices must be in range and the data at least 1-D.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> FieldData {
        match self {
            FieldData::Float32(a) => FieldData::Float32(a.select(Axis(0), indices)),
            FieldData::Float64(a) => FieldData::Float64(a.select(Axis(0), indices)),
            FieldData::Int32(a) => FieldData::Int32(a.select(Axis(0), indices)),
            FieldData::Int64(a) => FieldData::Int64(a.select(Axis(0), indices)),
            FieldData::Bool(a) => FieldData::Bool(a.select(Axis(0), indices)),
        }
    }

    /// Flatten 1-D numeric data to f64 values
    pub(crate) fn scalar_values(&self, field: &str) -> Result<Vec<f64>> {
        if self.shape().len() != 1 {
            return Err(BoxError::FieldType {
                field: field.to_string(),
                expected: "1-D numeric array",
                actual: format!("{} array of shape {:?}", self.dtype(), self.shape()),
            });
        }
        match self {
            FieldData::Float32(a) => Ok(a.iter().map(|&v| f64::from(v)).collect()),
            FieldData::Float64(a) => Ok(a.iter().copied().collect()),
            FieldData::Int32(a) => Ok(a.iter().map(|&v| f64::from(v)).collect()),
            FieldData::Int64(a) => Ok(a.iter().map(|&v| v as f64).collect()),
            FieldData::Bool(_) => Err(BoxError::FieldType {
                field: field.to_string(),
                expected: "1-D numeric array",
                actual: "bool array".to_string(),
            }),
        }
    }
}

/// Borrowed view of one field of a `BoxList`
#[derive(Debug, Clone)]
pub enum FieldRef<'a, F: BoxFloat> {
    Boxes(ArrayView2<'a, F>),
    Extra(&'a FieldData),
}

impl<'a, F: BoxFloat> FieldRef<'a, F> {
    pub fn shape(&self) -> &[usize] {
        match self {
            FieldRef::Boxes(view) => view.shape(),
            FieldRef::Extra(data) => data.shape(),
        }
    }

    pub fn as_boxes(&self) -> Option<ArrayView2<'a, F>> {
        match self {
            FieldRef::Boxes(view) => Some(*view),
            FieldRef::Extra(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&'a FieldData> {
        match self {
            FieldRef::Boxes(_) => None,
            FieldRef::Extra(data) => Some(*data),
        }
    }
}

/// Collection of boxes held as an [N, 4] array of (y_min, x_min, y_max, x_max)
/// rows, all belonging to one image, plus optional per-box fields such as
/// scores or labels.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxList<F: BoxFloat = f64> {
    boxes: Array2<F>,
    fields: Vec<(String, FieldData)>,
}

impl<F: BoxFloat> BoxList<F> {
    /// Build a box list from an [N, 4] array.
    ///
    /// Fails when the array is not [N, 4] or when any box has
    /// y_min > y_max or x_min > x_max.
    pub fn new(boxes: Array2<F>) -> Result<Self> {
        let view = boxes.view();
        check_box_shape(&view)?;
        if let Some(index) = first_invalid_box(&view) {
            return Err(BoxError::InvalidBox { index });
        }

        Ok(Self {
            boxes,
            fields: Vec::new(),
        })
    }

    /// Build from an array of unknown dimensionality
    pub fn from_dyn(boxes: ArrayD<F>) -> Result<Self> {
        let shape = boxes.shape().to_vec();
        let boxes = boxes
            .into_dimensionality::<Ix2>()
            .map_err(|_| BoxError::InvalidShape { shape })?;
        Self::new(boxes)
    }

    /// Build from a slice of individual boxes
    pub fn from_boxes<B: BoundingBox<F>>(boxes: &[B]) -> Result<Self> {
        let mut array = Array2::zeros((boxes.len(), 4));
        for (mut row, bbox) in array.outer_iter_mut().zip(boxes) {
            let (y_min, x_min, y_max, x_max) = bbox.corners();
            row[0] = y_min;
            row[1] = x_min;
            row[2] = y_max;
            row[3] = x_max;
        }
        Self::new(array)
    }

    /// Number of boxes held in the collection
    pub fn num_boxes(&self) -> usize {
        self.boxes.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_boxes() == 0
    }

    /// Names of all non-box fields, in insertion order
    pub fn get_extra_fields(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        field == BOXES_FIELD || self.fields.iter().any(|(name, _)| name == field)
    }

    /// Attach per-box data under a new name.
    ///
    /// Fails when the name is already taken or when the data's leading
    /// dimension differs from the number of boxes.
    pub fn add_field(&mut self, field: &str, data: impl Into<FieldData>) -> Result<()> {
        if self.has_field(field) {
            return Err(BoxError::FieldExists(field.to_string()));
        }

        let data = data.into();
        if data.len() != Some(self.num_boxes()) {
            return Err(BoxError::FieldLength {
                field: field.to_string(),
                expected: self.num_boxes(),
                shape: data.shape().to_vec(),
            });
        }

        self.fields.push((field.to_string(), data));
        Ok(())
    }

    /// Box coordinates as an [N, 4] view
    pub fn get(&self) -> ArrayView2<'_, F> {
        self.boxes.view()
    }

    pub fn get_field(&self, field: &str) -> Result<FieldRef<'_, F>> {
        if field == BOXES_FIELD {
            return Ok(FieldRef::Boxes(self.get()));
        }
        self.extra_field(field).map(FieldRef::Extra)
    }

    /// A 1-D numeric field (scores, labels, ...) as f64 values
    pub fn get_scalar_field(&self, field: &str) -> Result<Vec<f64>> {
        if field == BOXES_FIELD {
            return Err(BoxError::FieldType {
                field: field.to_string(),
                expected: "1-D numeric array",
                actual: format!("{} array of shape {:?}", F::DTYPE, self.boxes.shape()),
            });
        }
        self.extra_field(field)?.scalar_values(field)
    }

    /// Corner coordinates as four parallel views [y_min, x_min, y_max, x_max]
    pub fn get_coordinates(&self) -> [ArrayView1<'_, F>; 4] {
        [
            self.boxes.column(0),
            self.boxes.column(1),
            self.boxes.column(2),
            self.boxes.column(3),
        ]
    }

    pub fn into_boxes(self) -> Array2<F> {
        self.boxes
    }

    pub(crate) fn extra_field(&self, field: &str) -> Result<&FieldData> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, data)| data)
            .ok_or_else(|| BoxError::MissingField(field.to_string()))
    }

    /// Iterate extra fields in insertion order
    pub(crate) fn extra_fields(&self) -> impl Iterator<Item = (&str, &FieldData)> {
        self.fields.iter().map(|(name, data)| (name.as_str(), data))
    }
}

impl<F: BoxFloat> TryFrom<FieldData> for BoxList<F> {
    type Error = BoxError;

    /// Build from dynamically typed data, rejecting non-float element types
    fn try_from(data: FieldData) -> Result<Self> {
        let array = F::from_field(&data).ok_or(BoxError::InvalidDtype {
            dtype: data.dtype(),
        })?;
        Self::from_dyn(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn sample() -> BoxList<f32> {
        BoxList::new(array![
            [0.0f32, 0.0, 10.0, 10.0],
            [5.0, 5.0, 15.0, 15.0],
            [2.0, 1.0, 3.0, 8.0]
        ])
        .unwrap()
    }

    #[test]
    fn rejects_three_column_data() {
        let result = BoxList::new(Array2::<f64>::zeros((3, 3)));
        assert_eq!(result, Err(BoxError::InvalidShape { shape: vec![3, 3] }));
    }

    #[test]
    fn rejects_non_matrix_data() {
        let result = BoxList::from_dyn(Array3::<f64>::zeros((2, 4, 1)).into_dyn());
        assert_eq!(
            result,
            Err(BoxError::InvalidShape {
                shape: vec![2, 4, 1]
            })
        );
    }

    #[test]
    fn rejects_inverted_box() {
        let result = BoxList::new(array![[0.0f64, 0.0, 1.0, 1.0], [0.0, 0.0, -1.0, 1.0]]);
        assert_eq!(result, Err(BoxError::InvalidBox { index: 1 }));

        let result = BoxList::new(array![[0.0f64, 2.0, 1.0, 1.0]]);
        assert_eq!(result, Err(BoxError::InvalidBox { index: 0 }));
    }

    #[test]
    fn rejects_integer_data() {
        let data = FieldData::from(array![[0i32, 0, 1, 1]]);
        let result = BoxList::<f64>::try_from(data);
        assert_eq!(result, Err(BoxError::InvalidDtype { dtype: "int32" }));
    }

    #[test]
    fn accepts_either_float_precision() {
        let list = BoxList::<f64>::try_from(FieldData::from(array![[0.0f32, 0.0, 1.0, 2.0]])).unwrap();
        assert_eq!(list.get(), array![[0.0f64, 0.0, 1.0, 2.0]]);
    }

    #[test]
    fn empty_list_is_valid() {
        let mut list = BoxList::new(Array2::<f64>::zeros((0, 4))).unwrap();
        assert_eq!(list.num_boxes(), 0);
        assert!(list.is_empty());
        list.add_field("scores", Vec::<f32>::new()).unwrap();
        assert!(list.has_field("scores"));
    }

    #[test]
    fn add_and_get_fields() {
        let mut list = sample();
        list.add_field("scores", vec![0.9f32, 0.5, 0.1]).unwrap();
        list.add_field("labels", vec![1i64, 2, 3]).unwrap();
        list.add_field("keypoints", Array3::<f32>::zeros((3, 17, 2))).unwrap();

        assert_eq!(list.get_extra_fields(), vec!["scores", "labels", "keypoints"]);
        assert!(list.has_field("boxes"));
        assert!(list.has_field("labels"));
        assert!(!list.has_field("masks"));

        let scores = list.get_field("scores").unwrap();
        assert_eq!(scores.shape(), &[3]);
        assert_eq!(
            scores.as_data().and_then(FieldData::as_f32).map(|a| a.len()),
            Some(3)
        );
        assert_eq!(list.get_scalar_field("labels").unwrap(), vec![1.0, 2.0, 3.0]);

        let boxes = list.get_field("boxes").unwrap();
        assert_eq!(boxes.as_boxes(), Some(list.get()));
    }

    #[test]
    fn duplicate_field_fails() {
        let mut list = sample();
        list.add_field("scores", vec![0.9f32, 0.5, 0.1]).unwrap();
        assert_eq!(
            list.add_field("scores", vec![0.1f32, 0.2, 0.3]),
            Err(BoxError::FieldExists("scores".to_string()))
        );
        assert_eq!(
            list.add_field("boxes", Array2::<f32>::zeros((3, 4))),
            Err(BoxError::FieldExists("boxes".to_string()))
        );
    }

    #[test]
    fn mismatched_field_length_fails() {
        let mut list = sample();
        let result = list.add_field("scores", vec![0.9f32, 0.5]);
        assert_eq!(
            result,
            Err(BoxError::FieldLength {
                field: "scores".to_string(),
                expected: 3,
                shape: vec![2],
            })
        );

        let scalar = FieldData::Float32(ndarray::arr0(1.0f32).into_dyn());
        assert!(matches!(
            list.add_field("weight", scalar),
            Err(BoxError::FieldLength { .. })
        ));
        assert!(!list.has_field("weight"));
    }

    #[test]
    fn missing_field_fails() {
        let list = sample();
        assert!(matches!(
            list.get_field("scores"),
            Err(BoxError::MissingField(name)) if name == "scores"
        ));
    }

    #[test]
    fn scalar_field_rejects_bool_and_matrix() {
        let mut list = sample();
        list.add_field("difficult", vec![true, false, false]).unwrap();
        list.add_field("embedding", Array2::<f32>::zeros((3, 8))).unwrap();

        assert!(matches!(
            list.get_scalar_field("difficult"),
            Err(BoxError::FieldType { .. })
        ));
        assert!(matches!(
            list.get_scalar_field("embedding"),
            Err(BoxError::FieldType { .. })
        ));
    }

    #[test]
    fn coordinates_are_columns() {
        let list = sample();
        let [y_min, x_min, y_max, x_max] = list.get_coordinates();
        assert_eq!(y_min, array![0.0f32, 5.0, 2.0]);
        assert_eq!(x_min, array![0.0f32, 5.0, 1.0]);
        assert_eq!(y_max, array![10.0f32, 15.0, 3.0]);
        assert_eq!(x_max, array![10.0f32, 15.0, 8.0]);
    }

    #[test]
    fn from_boxes_collects_rows() {
        let list = BoxList::<f64>::from_boxes(&[[0.0, 0.0, 1.0, 1.0], [1.0, 1.0, 4.0, 2.0]]).unwrap();
        assert_eq!(list.num_boxes(), 2);
        assert_eq!(list.get().row(1), array![1.0, 1.0, 4.0, 2.0]);

        let inverted = BoxList::<f64>::from_boxes(&[(2.0, 0.0, 1.0, 1.0)]);
        assert_eq!(inverted, Err(BoxError::InvalidBox { index: 0 }));
    }
}

use ndarray::{ArrayD, NdFloat};

use crate::box_list::FieldData;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Floating point element types accepted as box coordinates (`f32`, `f64`)
pub trait BoxFloat: NdFloat + sealed::Sealed {
    /// Name used in error messages and logs
    const DTYPE: &'static str;

    /// Extract a float array from dynamically typed field data.
    /// Float data of the other precision is cast; non-float data yields `None`.
    fn from_field(data: &FieldData) -> Option<ArrayD<Self>>;

    /// Wrap an array of this type as field data
    fn into_field(array: ArrayD<Self>) -> FieldData;
}

impl BoxFloat for f32 {
    const DTYPE: &'static str = "float32";

    fn from_field(data: &FieldData) -> Option<ArrayD<Self>> {
        match data {
            FieldData::Float32(a) => Some(a.clone()),
            FieldData::Float64(a) => Some(a.mapv(|v| v as f32)),
            _ => None,
        }
    }

    fn into_field(array: ArrayD<Self>) -> FieldData {
        FieldData::Float32(array)
    }
}

impl BoxFloat for f64 {
    const DTYPE: &'static str = "float64";

    fn from_field(data: &FieldData) -> Option<ArrayD<Self>> {
        match data {
            FieldData::Float32(a) => Some(a.mapv(f64::from)),
            FieldData::Float64(a) => Some(a.clone()),
            _ => None,
        }
    }

    fn into_field(array: ArrayD<Self>) -> FieldData {
        FieldData::Float64(array)
    }
}

/// Anything that can be read as a single box
pub trait BoundingBox<F: BoxFloat> {
    /// Returns the box corners as (y_min, x_min, y_max, x_max)
    fn corners(&self) -> (F, F, F, F);

    /// Area of the box, negative when the box is inverted
    fn area(&self) -> F {
        let (y_min, x_min, y_max, x_max) = self.corners();
        (y_max - y_min) * (x_max - x_min)
    }
}

impl<F: BoxFloat> BoundingBox<F> for [F; 4] {
    fn corners(&self) -> (F, F, F, F) {
        (self[0], self[1], self[2], self[3])
    }
}

impl<F: BoxFloat> BoundingBox<F> for (F, F, F, F) {
    fn corners(&self) -> (F, F, F, F) {
        *self
    }
}

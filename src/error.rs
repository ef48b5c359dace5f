//! Error types for box validation and box-list operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoxError {
    #[error("Invalid dimensions for box data: expected [N, 4], got {shape:?}")]
    InvalidShape { shape: Vec<usize> },

    #[error("Invalid data type for box data: float is required, got {dtype}")]
    InvalidDtype { dtype: &'static str },

    #[error("Invalid box data at row {index}: expected y_min <= y_max and x_min <= x_max")]
    InvalidBox { index: usize },

    #[error("Field {0} already exists")]
    FieldExists(String),

    #[error("Invalid dimensions for field {field}: expected {expected} rows, got shape {shape:?}")]
    FieldLength {
        field: String,
        expected: usize,
        shape: Vec<usize>,
    },

    #[error("Field {0} does not exist")]
    MissingField(String),

    #[error("Field {field} has unsupported layout: expected {expected}, got {actual}")]
    FieldType {
        field: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Index {index} out of range for {len} boxes")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, BoxError>;

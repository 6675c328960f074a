#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("value {value} outside [{min}, {max}]")]
    ArgumentOutOfRange { value: f64, min: f64, max: f64 },
    #[error("invalid field range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
    #[error("write needs {needed} bytes but capacity is {capacity}")]
    BufferOverrun { needed: usize, capacity: usize },
    #[error("read past the end of {available} available bytes")]
    BufferUnderrun { available: usize },
    #[error("string encoding failed: {0}")]
    Encoding(String),
}

impl CodecError {
    pub(crate) fn out_of_range(
        value: impl Into<f64>,
        min: impl Into<f64>,
        max: impl Into<f64>,
    ) -> Self {
        Self::ArgumentOutOfRange {
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    pub(crate) fn invalid_range(min: impl Into<f64>, max: impl Into<f64>) -> Self {
        Self::InvalidRange {
            min: min.into(),
            max: max.into(),
        }
    }
}

use thiserror::Error;

/// Errors raised by [`Data`](crate::Data) operations and the export helpers.
///
/// Every operation fails at the point of violation and leaves its inputs
/// untouched; nothing is retried internally.
#[derive(Debug, Error)]
pub enum DataError {
    /// Wrong dimensionality, column count or length.
    #[error("shape error: {0}")]
    Shape(String),

    /// Two containers combined arithmetically do not share the same x values.
    #[error("the two Data objects do not have the same x values, so cannot be {operation}")]
    MismatchedAxis { operation: String },

    /// An operand could not be coerced to numbers.
    #[error("Data cannot be {operation} with object of type {found}")]
    Type { operation: String, found: String },

    /// A requested range or query lies outside the x domain, or min > max.
    #[error("range error: {0}")]
    Range(String),

    /// A row index or boolean mask does not fit the container.
    #[error("index error: {0}")]
    Index(String),

    /// An argument has an unusable value (non-positive step, empty list, ...).
    #[error("value error: {0}")]
    Value(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;

impl DataError {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        DataError::Shape(msg.into())
    }

    pub(crate) fn range(msg: impl Into<String>) -> Self {
        DataError::Range(msg.into())
    }

    pub(crate) fn index(msg: impl Into<String>) -> Self {
        DataError::Index(msg.into())
    }

    pub(crate) fn value(msg: impl Into<String>) -> Self {
        DataError::Value(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_operation() {
        let err = DataError::MismatchedAxis {
            operation: "added".to_string(),
        };
        assert!(err.to_string().contains("cannot be added"));

        let err = DataError::Type {
            operation: "multiplied".to_string(),
            found: "string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Data cannot be multiplied with object of type string"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DataError = io.into();
        assert!(matches!(err, DataError::Io(_)));
    }
}

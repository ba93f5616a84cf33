//! Error types for forest construction, scoring and the I/O collaborators.

use thiserror::Error;

/// Errors surfaced by the isolation forest and its data utilities.
#[derive(Debug, Error)]
pub enum ForestError {
    #[error("Invalid configuration: {name} - {reason}")]
    Configuration { name: String, reason: String },

    #[error("Dimension mismatch: forest was fit on {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Forest not fit: call fit() before scoring")]
    NotFit,

    #[error("Invalid input at row {row}, column {column}: {reason}")]
    InvalidInput {
        row: usize,
        column: usize,
        reason: String,
    },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Fit cancelled after {built} of {requested} trees")]
    Cancelled { built: usize, requested: usize },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model encoding error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Model decoding error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

impl ForestError {
    pub(crate) fn configuration(name: &str, reason: impl Into<String>) -> Self {
        ForestError::Configuration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for forest operations.
pub type Result<T> = std::result::Result<T, ForestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let error = ForestError::configuration("n_trees", "must be at least 1");
        assert_eq!(
            error.to_string(),
            "Invalid configuration: n_trees - must be at least 1"
        );
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let error = ForestError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(
            error.to_string(),
            "Dimension mismatch: forest was fit on 3 features, got 2"
        );
    }

    #[test]
    fn test_not_fit_display() {
        assert_eq!(
            ForestError::NotFit.to_string(),
            "Forest not fit: call fit() before scoring"
        );
    }

    #[test]
    fn test_invalid_input_display() {
        let error = ForestError::InvalidInput {
            row: 4,
            column: 1,
            reason: "not a number: \"abc\"".to_string(),
        };
        assert!(error.to_string().starts_with("Invalid input at row 4, column 1"));
    }

    #[test]
    fn test_invalid_model_display() {
        let error = ForestError::InvalidModel("tree 3 has no nodes".to_string());
        assert_eq!(error.to_string(), "Invalid model: tree 3 has no nodes");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: ForestError = io.into();
        assert!(matches!(error, ForestError::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ForestError>();
    }
}

use thiserror::Error;

/// Core error type shared across surveyforge crates.
///
/// Every variant names the offending parameter so a caller can point the
/// user at the piece of configuration to correct.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A scalar parameter or parameter combination is out of its domain.
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },
    /// A correlation/covariance matrix cannot be used for sampling.
    #[error(
        "matrix '{parameter}' is not positive semi-definite (smallest eigenvalue {min_eigenvalue:.6})"
    )]
    NotPositiveSemiDefinite {
        parameter: String,
        min_eigenvalue: f64,
    },
    /// Two sequences that must line up have different lengths.
    #[error("length mismatch for '{parameter}': expected {expected}, found {found}")]
    MismatchedLength {
        parameter: String,
        expected: usize,
        found: usize,
    },
    /// A probability vector is negative, non-finite, or does not sum to 1.
    #[error("invalid probabilities for '{parameter}': {reason}")]
    InvalidProbability { parameter: String, reason: String },
    /// Two generated columns share a name.
    #[error("duplicate column name: {0}")]
    DuplicateColumnName(String),
}

impl Error {
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_probability(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProbability {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn mismatched_length(parameter: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::MismatchedLength {
            parameter: parameter.into(),
            expected,
            found,
        }
    }

    /// Configuration path the error refers to, when it names one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Error::InvalidParameter { parameter, .. }
            | Error::NotPositiveSemiDefinite { parameter, .. }
            | Error::MismatchedLength { parameter, .. }
            | Error::InvalidProbability { parameter, .. } => Some(parameter.as_str()),
            Error::DuplicateColumnName(_) => None,
        }
    }

    /// Stable machine-readable code for reports and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidParameter { .. } => "invalid_parameter",
            Error::NotPositiveSemiDefinite { .. } => "not_positive_semi_definite",
            Error::MismatchedLength { .. } => "mismatched_length",
            Error::InvalidProbability { .. } => "invalid_probability",
            Error::DuplicateColumnName(_) => "duplicate_column_name",
        }
    }
}

/// Convenience alias for results returned by surveyforge crates.
pub type Result<T> = std::result::Result<T, Error>;

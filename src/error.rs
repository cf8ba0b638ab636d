//! Error types for the translation core
//!
//! Scalar and pair level anomalies are absorbed where they occur; only the
//! failures below reach the caller:
//! - strict duration parsing ([`ScalarError`])
//! - lines that do not have the expected pipe-delimited shape ([`LineError`])
//! - component mapper misconfiguration ([`MapperError`])

/// Main error type for the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A scalar could not be decoded
    #[error("scalar error: {0}")]
    Scalar(#[from] ScalarError),

    /// A report line did not match the expected shape
    #[error("line error: {0}")]
    Line(#[from] LineError),

    /// The component mapping configuration is invalid
    #[error("mapper error: {0}")]
    Mapper(#[from] MapperError),
}

/// Strict scalar decoding failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScalarError {
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: &'static str },
}

impl ScalarError {
    pub(crate) fn duration(input: &str, reason: &'static str) -> Self {
        Self::InvalidDuration {
            input: input.to_string(),
            reason,
        }
    }
}

/// Structural failures of a single report line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("expected at least {expected} pipe-delimited fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
}

/// Component mapper construction failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapperError {
    #[error("component {source_component:?} maps to {target_component:?} with invalid factor {factor}")]
    InvalidFactor {
        source_component: String,
        target_component: String,
        factor: f64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_error_message() {
        let err = LineError::TooFewFields {
            expected: 4,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "expected at least 4 pipe-delimited fields, found 2"
        );
    }

    #[test]
    fn test_from_conversion() {
        let err: Error = LineError::TooFewFields {
            expected: 2,
            found: 1,
        }
        .into();
        assert!(matches!(err, Error::Line(_)));
        assert!(err.to_string().starts_with("line error:"));
    }
}

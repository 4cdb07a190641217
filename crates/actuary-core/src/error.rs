//! Error taxonomy shared by every pipeline stage.
//!
//! All errors are local and synchronous. Nothing here is retryable: callers
//! fix their input (or configuration) and invoke the stage again.

use thiserror::Error;

/// Errors raised by the actuary pipeline.
#[derive(Debug, Error)]
pub enum ActuaryError {
    /// Input tensor or vector has the wrong shape.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    /// NaN/Inf in the input, or a negative value where one is not allowed.
    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    /// Impossible configuration (zero oracles, zero qubits, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ActuaryError>;

impl ActuaryError {
    /// True for errors caused by caller input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ActuaryError::Dimension { .. }
                | ActuaryError::NumericDomain(_)
                | ActuaryError::Configuration(_)
        )
    }
}

/// Reject any non-finite value in `values`, naming the offending index.
pub fn ensure_finite(values: &[f64], what: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ActuaryError::NumericDomain(format!(
            "{what} contains non-finite value {} at index {i}",
            values[i]
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_values_pass() {
        assert!(ensure_finite(&[0.0, -1.5, 3.0e9], "tensor").is_ok());
        assert!(ensure_finite(&[], "tensor").is_ok());
    }

    #[test]
    fn nan_and_inf_are_rejected() {
        let err = ensure_finite(&[1.0, f64::NAN], "features").unwrap_err();
        assert!(matches!(err, ActuaryError::NumericDomain(_)));
        assert!(err.to_string().contains("index 1"));

        let err = ensure_finite(&[f64::NEG_INFINITY], "features").unwrap_err();
        assert!(err.to_string().contains("features"));
    }

    #[test]
    fn input_errors_are_classified() {
        assert!(
            ActuaryError::Dimension {
                expected: 40,
                actual: 39
            }
            .is_input_error()
        );
        assert!(ActuaryError::Configuration("zero oracles".into()).is_input_error());
        let io = ActuaryError::from(std::io::Error::other("disk"));
        assert!(!io.is_input_error());
    }
}

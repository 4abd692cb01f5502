//! Error types for Lair.

use thiserror::Error;

/// Top-level error type for Lair operations.
#[derive(Debug, Error)]
pub enum LairError {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Configuration text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration validation failures.
///
/// Raised when an agent or region is constructed with values that would
/// produce undefined runtime behavior.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Value must be strictly positive
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// Value must not be negative
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// Value outside of its allowed range
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Offending field
        field: &'static str,
        /// Value found
        value: f32,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },

    /// A min/max pair is inverted
    #[error("{field}: min {min} exceeds max {max}")]
    InvertedRange {
        /// Offending field
        field: &'static str,
        /// Lower bound given
        min: f32,
        /// Upper bound given
        max: f32,
    },

    /// Value is NaN or infinite
    #[error("{field} must be finite")]
    NotFinite {
        /// Offending field
        field: &'static str,
    },

    /// Region shape is degenerate
    #[error("Degenerate region: {0}")]
    DegenerateRegion(String),
}

/// Result type alias for Lair operations.
pub type LairResult<T> = Result<T, LairError>;

/// Rejects non-finite or non-positive values.
pub fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

/// Rejects non-finite or negative values.
pub fn ensure_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

/// Rejects values outside `[min, max]`.
pub fn ensure_within(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

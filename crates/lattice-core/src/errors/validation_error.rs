/// Malformed payloads. Always raised before any row is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("field `{field}` must not be empty")]
    EmptyField { field: String },

    #[error("field `{field}` is not finite: {value}")]
    NonFinite { field: String, value: f64 },

    #[error("field `{field}` out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("relation identity needs at least {min} related ids, got {actual}")]
    TooFewRelatedIds { min: usize, actual: usize },

    #[error("identity id mismatch: stored `{stored}`, derived `{derived}`")]
    IdMismatch { stored: String, derived: String },

    #[error("cannot resolve identity `{id}` against itself")]
    SelfResolution { id: String },

    #[error("malformed payload: {reason}")]
    Malformed { reason: String },
}

impl ValidationError {
    pub fn empty(field: &str) -> Self {
        Self::EmptyField {
            field: field.to_string(),
        }
    }

    /// Check that `value` is finite and inside `[min, max]`.
    pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if !value.is_finite() {
            return Err(Self::NonFinite {
                field: field.to_string(),
                value,
            });
        }
        if value < min || value > max {
            return Err(Self::OutOfRange {
                field: field.to_string(),
                value,
                min,
                max,
            });
        }
        Ok(())
    }
}

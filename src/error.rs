use thiserror::Error;

/// Errors raised when the engine is called outside its input domain.
///
/// A debt that can never be paid off is not an error; see [`crate::Payoff::Never`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmortizationError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl AmortizationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AmortizationError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// The name of the input that was rejected.
    pub fn field(&self) -> &'static str {
        match self {
            AmortizationError::InvalidInput { field, .. } => field,
        }
    }
}

pub type AmortizationResult<T> = Result<T, AmortizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message_names_field() {
        let err = AmortizationError::invalid("principal", "must not be negative");
        assert_eq!(err.field(), "principal");
        assert_eq!(err.to_string(), "invalid principal: must not be negative");
    }
}

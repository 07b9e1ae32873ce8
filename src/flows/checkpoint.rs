use serde::{Deserialize, Serialize};

use crate::error::StorewatchError;

/// Coarse classification of a flow failure, stable across report consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowErrorType {
    ValidationFailed,
    Timeout,
    Navigation,
    Unexpected,
}

/// Where and why a flow stopped. `checkpoint` names the last checkpoint
/// that had not yet been reached when the error occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowError {
    #[serde(rename = "type")]
    pub error_type: FlowErrorType,
    pub message: String,
    pub checkpoint: String,
}

impl FlowError {
    pub fn from_error(err: &StorewatchError, checkpoint: &str) -> Self {
        FlowError {
            error_type: classify(err),
            message: err.to_string(),
            checkpoint: checkpoint.to_string(),
        }
    }
}

pub fn classify(err: &StorewatchError) -> FlowErrorType {
    match err {
        StorewatchError::Timeout(_) => FlowErrorType::Timeout,
        StorewatchError::HealthCheck(_) | StorewatchError::InvalidInput(_) => {
            FlowErrorType::ValidationFailed
        }
        StorewatchError::Browser(_) => FlowErrorType::Navigation,
        _ => FlowErrorType::Unexpected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_by_variant() {
        assert_eq!(
            classify(&StorewatchError::Timeout("t".into())),
            FlowErrorType::Timeout
        );
        assert_eq!(
            classify(&StorewatchError::HealthCheck("h".into())),
            FlowErrorType::ValidationFailed
        );
        assert_eq!(
            classify(&StorewatchError::Browser("b".into())),
            FlowErrorType::Navigation
        );
        assert_eq!(
            classify(&StorewatchError::Other("o".into())),
            FlowErrorType::Unexpected
        );
    }

    #[test]
    fn error_type_serializes_screaming_snake() {
        let err = FlowError {
            error_type: FlowErrorType::ValidationFailed,
            message: "m".into(),
            checkpoint: "checkoutPageLoaded".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "VALIDATION_FAILED");
        assert_eq!(json["checkpoint"], "checkoutPageLoaded");
    }
}

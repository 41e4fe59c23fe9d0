use thiserror::Error;

use crate::Stage;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("missing required field(s): {}", fields.join(", "))]
    Validation { fields: Vec<&'static str> },

    #[error("storage error for {key}: {message}")]
    Storage { key: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("missing authorization code in callback url")]
    MissingAuthorizationCode,

    #[error("simulation aborted before {stage}")]
    SimulationAborted { stage: Stage },
}

impl LoginError {
    pub(crate) fn missing(fields: Vec<&'static str>) -> Self {
        Self::Validation { fields }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Persistence failures, including the io and serde errors a store raises.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Io(_) | Self::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LoginError;
    use crate::Stage;

    #[test]
    fn validation_message_lists_every_field() {
        let error = LoginError::missing(vec!["appId", "redirectUri"]);
        assert_eq!(
            error.to_string(),
            "missing required field(s): appId, redirectUri"
        );
        assert!(error.is_validation());
        assert!(!error.is_storage());
    }

    #[test]
    fn aborted_names_the_pending_stage() {
        let error = LoginError::SimulationAborted {
            stage: Stage::ExchangingToken,
        };
        assert_eq!(error.to_string(), "simulation aborted before exchanging_token");
    }
}

use crate::field_map::FieldMapError;
use crate::validation::MissingParameterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Translator could not be configured due to error: {0}")]
    Configuration(#[from] FieldMapError),
    #[error("{0}")]
    MissingParameters(#[from] MissingParameterError),
    #[error("Payload was considered invalid due to error: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl ConversionError {
    /// The gaps left after defaults were applied, if this is a missing-parameter failure.
    pub fn missing_parameters(&self) -> Option<&MissingParameterError> {
        match self {
            ConversionError::MissingParameters(error) => Some(error),
            _ => None,
        }
    }
}

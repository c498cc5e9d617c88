//! Error Types for the Health Advisor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Domain errors. The tool layer renders every one of these as an error
/// outcome payload fed back to the model; none crosses the tool boundary as
/// an exception.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Could not find doctor \"{0}\"")]
    ProviderNotFound(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Booking failed: {0}")]
    BookingRejected(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<agent_core::AgentError> for AdvisorError {
    fn from(err: agent_core::AgentError) -> Self {
        AdvisorError::Session(err.to_string())
    }
}

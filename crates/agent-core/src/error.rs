//! Error Types

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Orchestration error types
///
/// Two classes matter to callers: transport failures (the model capability
/// is unreachable or returned garbage) and configuration failures (missing
/// or invalid credentials). Both are converted into degraded final replies
/// inside the orchestrator; neither crosses `send_message`.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model provider returned an error response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable, timed out, or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Malformed provider response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or invalid credential for the model capability
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Attachment could not be decoded
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Whether this is a configuration-class failure (misconfigured, not down)
    pub fn is_configuration(&self) -> bool {
        matches!(self, AgentError::Auth(_) | AgentError::Config(_))
    }

    /// Render as a user-safe final reply.
    ///
    /// Configuration failures get actionable wording so operators can tell
    /// "it's down" from "it's misconfigured" apart from the reply alone.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Auth(_) | AgentError::Config(_) => {
                "The assistant is not fully configured. Please check the model \
                 credentials (API key) and try again."
                    .into()
            }
            AgentError::Session(msg) => format!("Session problem: {msg}"),
            _ => "System connection issue. Please try again.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}

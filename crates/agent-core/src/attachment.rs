//! Attachment Codec
//!
//! Converts user-supplied binary files (images, documents) into a
//! transport-safe encoded payload with a declared media type. An attachment
//! is immutable once staged and is owned by the user turn that carries it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// An encoded binary attachment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Base64-encoded content
    pub encoded_data: String,

    /// Declared media type (e.g., "image/jpeg", "application/pdf")
    pub media_type: String,

    /// Original file name shown to the user
    pub display_name: String,
}

impl Attachment {
    /// Encode raw bytes into an attachment
    pub fn from_bytes(
        bytes: &[u8],
        media_type: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            encoded_data: STANDARD.encode(bytes),
            media_type: media_type.into(),
            display_name: display_name.into(),
        }
    }

    /// Decode back to the original bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.encoded_data)
            .map_err(|e| AgentError::Attachment(format!("invalid base64 payload: {e}")))
    }

    /// Approximate decoded size in bytes, without decoding
    pub fn size_hint(&self) -> usize {
        self.encoded_data.len() / 4 * 3
    }
}

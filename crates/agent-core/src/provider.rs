//! Model Provider Strategy Pattern
//!
//! Defines the contract the orchestrator requires of the underlying language
//! model capability, allowing the engine to work with any backend without
//! code changes. Given the full ordered history plus a behavioral
//! instruction and the declared tool set, a provider returns plain text, one
//! or more tool calls, or both, possibly with grounding citations.

use async_trait::async_trait;

use crate::error::Result;
use crate::tool::{ToolCall, ToolDeclaration};
use crate::turn::{Citation, Turn};

/// One model turn: text, tool calls, or both
#[derive(Clone, Debug, Default)]
pub struct ModelTurn {
    /// Generated text, when present. Text may accompany tool calls; the
    /// orchestrator still executes the calls before treating any text as
    /// final.
    pub text: Option<String>,

    /// Tool invocations requested by the model, in emission order
    pub calls: Vec<ToolCall>,

    /// Grounding metadata for the generated text
    pub citations: Vec<Citation>,
}

impl ModelTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    pub fn calls(calls: Vec<ToolCall>) -> Self {
        Self { calls, ..Self::default() }
    }

    pub fn wants_tools(&self) -> bool {
        !self.calls.is_empty()
    }
}

/// Strategy trait for model backends
///
/// Implement this trait to add support for a new model capability. The
/// orchestrator works exclusively through this interface.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Request one model turn conditioned on instruction + history + tools
    async fn generate(
        &self,
        instruction: &str,
        history: &[Turn],
        tools: &[ToolDeclaration],
    ) -> Result<ModelTurn>;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Provider name for logging
    fn name(&self) -> &str;
}

//! # agent-runtime
//!
//! Runtime model providers for the health-advisor system.
//!
//! ## Providers
//!
//! - **Gemini**: `generateContent` REST API with native function calling and
//!   grounding metadata
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::GeminiProvider;
//!
//! let provider = Arc::new(GeminiProvider::from_env()?);
//! let orchestrator = Orchestrator::new(provider, dispatcher, config);
//! ```

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiProvider};

// Re-export core types for convenience
pub use agent_core::{
    AgentError, ModelProvider, ModelTurn, Orchestrator, Result, ToolDeclaration,
};

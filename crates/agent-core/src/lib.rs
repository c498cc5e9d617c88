//! # agent-core
//!
//! Conversation orchestration engine: turns a user message (plus optional
//! binary attachment) into a finished assistant reply while transparently
//! running a bounded multi-round tool-calling protocol against external
//! capabilities, and while tracking a replay-able conversation history per
//! session.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Orchestrator                            │
//! │  ┌────────────┐  ┌────────────────┐  ┌──────────────────┐   │
//! │  │ Tool Round │  │ ToolDispatcher │  │  ModelProvider   │   │
//! │  │    Loop    │──│   (closed set) │  │   (Strategy)     │   │
//! │  └────────────┘  └────────────────┘  └──────────────────┘   │
//! │         │                                                    │
//! │         └──▶ ResultSink (on_chunk / on_side_effect)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ModelProvider` trait enables swapping model backends without
//! changing orchestration logic; the `ToolDispatcher` trait lets each domain
//! declare a closed, compile-time-checked tool vocabulary.

pub mod attachment;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod sink;
pub mod tool;
pub mod turn;

pub use attachment::Attachment;
pub use error::{AgentError, Result};
pub use orchestrator::{FinalReply, Orchestrator, OrchestratorConfig, DEFAULT_MAX_ROUNDS};
pub use provider::{ModelProvider, ModelTurn};
pub use session::{MemorySessionStore, Session, SessionId, SessionStore};
pub use sink::{NullSink, ResultSink};
pub use tool::{
    Dispatch, ParameterSchema, ToolCall, ToolDeclaration, ToolDispatcher, ToolOutcome,
};
pub use turn::{Citation, History, Turn};

//! Tool Contracts
//!
//! The fixed vocabulary of side-effecting capabilities the model may invoke
//! mid-conversation, and the dispatcher seam the orchestrator drives. Tool
//! failures are data (`{"error": ...}` payloads fed back into history), never
//! exceptions across this boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

/// Tool invocation requested by the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Declared tool name
    pub name: String,

    /// Structured arguments as key-value pairs
    pub arguments: HashMap<String, Value>,

    /// Correlation id, echoed back in the matching outcome so multiple
    /// calls in one round stay distinguishable
    pub call_id: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: HashMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
            call_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = call_id.into();
        self
    }

    /// Fetch a string argument
    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }

    /// Fetch a numeric argument, accepting numbers and numeric strings
    /// (models are inconsistent about quoting)
    pub fn u64_arg(&self, name: &str) -> Option<u64> {
        match self.arguments.get(name)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Outcome of one tool call, success or error, always as data
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Tool that was dispatched
    pub name: String,

    /// Echo of the originating call id
    pub call_id: String,

    /// Success payload, or `{"error": ...}` on failure
    pub payload: Value,
}

impl ToolOutcome {
    pub fn success(call: &ToolCall, payload: Value) -> Self {
        Self {
            name: call.name.clone(),
            call_id: call.call_id.clone(),
            payload,
        }
    }

    pub fn error(call: &ToolCall, message: impl Into<String>) -> Self {
        Self {
            name: call.name.clone(),
            call_id: call.call_id.clone(),
            payload: json!({ "error": message.into() }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.payload.get("error").is_some()
    }
}

/// Parameter definition for a tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
        }
    }
}

/// Static declaration of one invocable capability
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolDeclaration {
    /// Names of parameters declared required
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// First declared-required argument absent from the call, if any
    pub fn missing_argument(&self, call: &ToolCall) -> Option<&str> {
        self.required_parameters()
            .into_iter()
            .find(|name| !call.arguments.contains_key(*name))
    }
}

/// Result of dispatching one tool call: the outcome appended to history and
/// an optional durable side effect surfaced through the result sink
pub struct Dispatch<E> {
    pub outcome: ToolOutcome,
    pub effect: Option<E>,
}

impl<E> Dispatch<E> {
    pub fn outcome(outcome: ToolOutcome) -> Self {
        Self { outcome, effect: None }
    }

    pub fn with_effect(outcome: ToolOutcome, effect: E) -> Self {
        Self { outcome, effect: Some(effect) }
    }
}

/// Dispatcher seam between the orchestrator and a domain's tool vocabulary.
///
/// Implementations match on a closed set of tool names; an unknown name must
/// resolve to an error outcome rather than crash the round.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// Durable side-effect payload (e.g., a confirmed booking)
    type Effect: Send + Sync;

    /// The statically declared tool set handed to the model provider
    fn declarations(&self) -> Vec<ToolDeclaration>;

    /// Execute one call against its external capability
    async fn dispatch(&self, call: &ToolCall) -> Dispatch<Self::Effect>;
}

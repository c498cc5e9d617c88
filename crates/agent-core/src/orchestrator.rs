//! Conversation Orchestrator
//!
//! Drives one complete request/response exchange, including nested tool
//! rounds, and keeps the session's working history consistent. The model
//! observes history, optionally requests tools, receives their outcomes as
//! context, and eventually produces the final reply.
//!
//! The tool-round loop is bounded: at most `max_rounds` rounds of tool
//! execution per `send_message` call. On exhaustion the orchestrator returns
//! whatever text the model last produced, preferring bounded termination
//! over completeness. Provider failures never cross `send_message`; they become
//! degraded final replies delivered through the same sink path.

use std::sync::Arc;

use crate::attachment::Attachment;
use crate::error::AgentError;
use crate::provider::ModelProvider;
use crate::sink::ResultSink;
use crate::tool::{ToolDeclaration, ToolDispatcher};
use crate::turn::{Citation, History, Turn};

/// Language assumed when the caller never initialized the session
pub const DEFAULT_LANGUAGE: &str = "en";

/// Maximum tool rounds per message. Enough for "look up providers, then
/// book" without allowing runaway loops on a misbehaving model.
pub const DEFAULT_MAX_ROUNDS: usize = 4;

const DEFAULT_INSTRUCTION: &str = "You are a helpful assistant. \
Use the declared tools when you need external data. \
Respond in language: {language}.";

/// Orchestrator configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Behavioral instruction governing the model's phrasing for the
    /// session; `{language}` is replaced at session initialization
    pub instruction_template: String,

    /// Tool round cap per `send_message` call
    pub max_rounds: usize,

    /// Final reply used when the model yields no usable text
    pub fallback_reply: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            instruction_template: DEFAULT_INSTRUCTION.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            fallback_reply: "I've processed your request.".into(),
        }
    }
}

/// The finished reply of one exchange
#[derive(Clone, Debug)]
pub struct FinalReply {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Per-session conversation orchestrator.
///
/// Logically single-threaded per session: exactly one `send_message` may be
/// in flight against a given instance, because each call both reads and
/// appends to the same ordered history. Separate sessions get separate
/// instances and are fully independent.
pub struct Orchestrator<D: ToolDispatcher> {
    provider: Arc<dyn ModelProvider>,
    dispatcher: D,
    config: OrchestratorConfig,
    instruction: String,
    language: String,
    history: History,
    initialized: bool,
}

impl<D: ToolDispatcher> Orchestrator<D> {
    pub fn new(provider: Arc<dyn ModelProvider>, dispatcher: D, config: OrchestratorConfig) -> Self {
        Self {
            provider,
            dispatcher,
            config,
            instruction: String::new(),
            language: String::new(),
            history: History::new(),
            initialized: false,
        }
    }

    /// Reset working history and record the session language.
    ///
    /// Must be called before the first `send_message` of a session and
    /// whenever the active session or its language changes. Discards any
    /// in-flight round state. Idempotent.
    pub fn initialize_session(&mut self, language: &str) {
        self.language = language.to_string();
        self.instruction = self
            .config
            .instruction_template
            .replace("{language}", language);
        self.history = History::new();
        self.initialized = true;
        tracing::debug!(%language, "session initialized");
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Working history accumulated since the last initialization
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Run one complete exchange: append the user turn, drive the tool
    /// round loop, and deliver the final reply through the sink.
    ///
    /// Never fails: transport and configuration failures are converted into
    /// degraded final replies, so the caller needs no separate error
    /// channel. `on_chunk` is invoked exactly once in every outcome.
    pub async fn send_message(
        &mut self,
        text: &str,
        attachment: Option<Attachment>,
        sink: &dyn ResultSink<D::Effect>,
    ) -> FinalReply {
        if !self.initialized {
            tracing::warn!("send_message before initialize_session; assuming default language");
            self.initialize_session(DEFAULT_LANGUAGE);
        }

        let declarations = self.dispatcher.declarations();

        self.history.push(match attachment {
            Some(att) => Turn::user_with_attachment(text, att),
            None => Turn::user(text),
        });

        let mut turn = match self.model_turn(&declarations).await {
            Ok(t) => t,
            Err(e) => return self.finish_degraded(&e, sink),
        };

        let mut rounds = 0;
        while turn.wants_tools() && rounds < self.config.max_rounds {
            rounds += 1;

            let calls = std::mem::take(&mut turn.calls);
            self.history.push(Turn::ToolRequest { calls: calls.clone() });

            // Execute in emitted order; no reordering, no deduplication.
            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                tracing::debug!(tool = %call.name, call_id = %call.call_id, "dispatching tool");
                let dispatch = self.dispatcher.dispatch(call).await;
                if let Some(effect) = dispatch.effect.as_ref() {
                    sink.on_side_effect(effect);
                }
                results.push(dispatch.outcome);
            }

            // Every call answered before the next model turn is requested.
            self.history.push(Turn::ToolResults { results });

            turn = match self.model_turn(&declarations).await {
                Ok(t) => t,
                Err(e) => return self.finish_degraded(&e, sink),
            };
        }

        if turn.wants_tools() {
            tracing::warn!(
                rounds,
                "tool round cap reached; replying with last available text"
            );
        }

        let text = turn
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.config.fallback_reply.clone());
        self.finish(text, turn.citations, sink)
    }

    async fn model_turn(
        &self,
        declarations: &[ToolDeclaration],
    ) -> crate::error::Result<crate::provider::ModelTurn> {
        self.provider
            .generate(&self.instruction, self.history.turns(), declarations)
            .await
    }

    fn finish(
        &mut self,
        text: String,
        citations: Vec<Citation>,
        sink: &dyn ResultSink<D::Effect>,
    ) -> FinalReply {
        self.history.push(Turn::Assistant {
            text: text.clone(),
            citations: citations.clone(),
        });
        sink.on_chunk(&text, &citations);
        FinalReply { text, citations }
    }

    fn finish_degraded(
        &mut self,
        error: &AgentError,
        sink: &dyn ResultSink<D::Effect>,
    ) -> FinalReply {
        if error.is_configuration() {
            tracing::error!(%error, "model capability misconfigured");
        } else {
            tracing::error!(%error, "model turn failed");
        }
        self.finish(error.user_message(), Vec::new(), sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ModelTurn;
    use crate::tool::{Dispatch, ParameterSchema, ToolCall, ToolOutcome};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Step {
        Turn(ModelTurn),
        Fail(AgentError),
    }

    /// Provider that replays a fixed script of model turns
    struct ScriptedProvider {
        script: Mutex<VecDeque<Step>>,
        generate_count: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(steps.into_iter().collect()),
                generate_count: AtomicUsize::new(0),
            }
        }

        fn generates(&self) -> usize {
            self.generate_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn generate(
            &self,
            _instruction: &str,
            _history: &[Turn],
            _tools: &[ToolDeclaration],
        ) -> crate::error::Result<ModelTurn> {
            self.generate_count.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(Step::Turn(t)) => Ok(t),
                Some(Step::Fail(e)) => Err(e),
                None => Ok(ModelTurn::calls(vec![echo_call()])),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Dispatcher that echoes arguments; emits an effect when asked to
    struct EchoDispatcher;

    #[async_trait]
    impl ToolDispatcher for EchoDispatcher {
        type Effect = String;

        fn declarations(&self) -> Vec<ToolDeclaration> {
            vec![ToolDeclaration {
                name: "echo".into(),
                description: "Echo arguments back".into(),
                parameters: vec![ParameterSchema::required("text", "string", "Text to echo")],
            }]
        }

        async fn dispatch(&self, call: &ToolCall) -> Dispatch<String> {
            let outcome = ToolOutcome::success(call, json!({ "echo": call.arguments }));
            match call.str_arg("notify") {
                Some(event) => Dispatch::with_effect(outcome, event.to_string()),
                None => Dispatch::outcome(outcome),
            }
        }
    }

    #[derive(Default)]
    struct CollectorSink {
        chunks: Mutex<Vec<(String, Vec<Citation>)>>,
        effects: Mutex<Vec<String>>,
    }

    impl CollectorSink {
        fn chunks(&self) -> Vec<(String, Vec<Citation>)> {
            self.chunks.lock().unwrap().clone()
        }

        fn effects(&self) -> Vec<String> {
            self.effects.lock().unwrap().clone()
        }
    }

    impl ResultSink<String> for CollectorSink {
        fn on_chunk(&self, text: &str, citations: &[Citation]) {
            self.chunks
                .lock()
                .unwrap()
                .push((text.to_string(), citations.to_vec()));
        }

        fn on_side_effect(&self, effect: &String) {
            self.effects.lock().unwrap().push(effect.clone());
        }
    }

    fn echo_call() -> ToolCall {
        let mut args = HashMap::new();
        args.insert("text".to_string(), json!("hi"));
        ToolCall::new("echo", args)
    }

    fn orchestrator(steps: Vec<Step>) -> (Orchestrator<EchoDispatcher>, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(steps));
        let orch = Orchestrator::new(
            provider.clone(),
            EchoDispatcher,
            OrchestratorConfig::default(),
        );
        (orch, provider)
    }

    #[tokio::test]
    async fn test_plain_reply_appends_two_turns() {
        let (mut orch, _) = orchestrator(vec![Step::Turn(ModelTurn::text("hello there"))]);
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        let reply = orch.send_message("hi", None, &sink).await;

        assert_eq!(reply.text, "hello there");
        assert_eq!(orch.history().len(), 2);
        assert_eq!(sink.chunks().len(), 1);
        assert!(sink.effects().is_empty());
    }

    #[tokio::test]
    async fn test_single_tool_round() {
        let (mut orch, provider) = orchestrator(vec![
            Step::Turn(ModelTurn::calls(vec![echo_call()])),
            Step::Turn(ModelTurn::text("done")),
        ]);
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        let reply = orch.send_message("run the tool", None, &sink).await;

        assert_eq!(reply.text, "done");
        // user, tool request, tool results, assistant
        assert_eq!(orch.history().len(), 4);
        assert_eq!(provider.generates(), 2);

        let results = match &orch.history().turns()[2] {
            Turn::ToolResults { results } => results,
            other => panic!("expected tool results, got {other:?}"),
        };
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_error());
    }

    #[tokio::test]
    async fn test_round_cap_terminates_loop() {
        // Empty script: the provider requests tools on every round.
        let (mut orch, provider) = orchestrator(Vec::new());
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        let reply = orch.send_message("loop forever", None, &sink).await;

        // Initial turn + one per completed round.
        assert_eq!(provider.generates(), 1 + DEFAULT_MAX_ROUNDS);
        // user + 4 * (request + results) + assistant
        assert_eq!(orch.history().len(), 2 + 2 * DEFAULT_MAX_ROUNDS);
        // No text ever arrived; the fallback reply stands in.
        assert_eq!(reply.text, "I've processed your request.");
        assert_eq!(sink.chunks().len(), 1);
    }

    #[tokio::test]
    async fn test_text_alongside_calls_is_not_final() {
        let with_text = ModelTurn {
            text: Some("let me check".into()),
            calls: vec![echo_call()],
            citations: Vec::new(),
        };
        let (mut orch, _) = orchestrator(vec![
            Step::Turn(with_text),
            Step::Turn(ModelTurn::text("checked")),
        ]);
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        let reply = orch.send_message("check", None, &sink).await;

        assert_eq!(reply.text, "checked");
        assert_eq!(sink.chunks().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_calls_run_in_order() {
        let first = echo_call();
        let second = echo_call();
        let ids = [first.call_id.clone(), second.call_id.clone()];
        let (mut orch, _) = orchestrator(vec![
            Step::Turn(ModelTurn::calls(vec![first, second])),
            Step::Turn(ModelTurn::text("twice")),
        ]);
        orch.initialize_session("en");

        orch.send_message("same tool twice", None, &CollectorSink::default())
            .await;

        let results = match &orch.history().turns()[2] {
            Turn::ToolResults { results } => results,
            other => panic!("expected tool results, got {other:?}"),
        };
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].call_id, ids[0]);
        assert_eq!(results[1].call_id, ids[1]);
    }

    #[tokio::test]
    async fn test_side_effect_reaches_sink() {
        let mut args = HashMap::new();
        args.insert("text".to_string(), json!("hi"));
        args.insert("notify".to_string(), json!("booked"));
        let (mut orch, _) = orchestrator(vec![
            Step::Turn(ModelTurn::calls(vec![ToolCall::new("echo", args)])),
            Step::Turn(ModelTurn::text("ok")),
        ]);
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        orch.send_message("notify me", None, &sink).await;

        assert_eq!(sink.effects(), vec!["booked".to_string()]);
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_to_apology() {
        let (mut orch, _) = orchestrator(vec![Step::Fail(AgentError::ProviderUnavailable(
            "connect timeout".into(),
        ))]);
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        let reply = orch.send_message("hi", None, &sink).await;

        assert_eq!(reply.text, "System connection issue. Please try again.");
        assert_eq!(sink.chunks().len(), 1);
        // user + degraded assistant turn
        assert_eq!(orch.history().len(), 2);
    }

    #[tokio::test]
    async fn test_config_failure_is_actionable() {
        let (mut orch, _) =
            orchestrator(vec![Step::Fail(AgentError::Auth("missing api key".into()))]);
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        let reply = orch.send_message("hi", None, &sink).await;

        assert!(reply.text.contains("configured"));
        assert_ne!(reply.text, "System connection issue. Please try again.");
        assert_eq!(sink.chunks().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_loop_still_replies_once() {
        let (mut orch, _) = orchestrator(vec![
            Step::Turn(ModelTurn::calls(vec![echo_call()])),
            Step::Fail(AgentError::Provider("boom".into())),
        ]);
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        orch.send_message("hi", None, &sink).await;

        assert_eq!(sink.chunks().len(), 1);
        // user, request, results, degraded assistant
        assert_eq!(orch.history().len(), 4);
    }

    #[tokio::test]
    async fn test_initialize_resets_history() {
        let (mut orch, _) = orchestrator(vec![
            Step::Turn(ModelTurn::text("first")),
            Step::Turn(ModelTurn::text("unused")),
        ]);
        orch.initialize_session("en");
        orch.send_message("hi", None, &CollectorSink::default())
            .await;
        assert_eq!(orch.history().len(), 2);

        orch.initialize_session("fr");
        assert!(orch.history().is_empty());
        assert_eq!(orch.language(), "fr");

        // Idempotent: initializing twice is the same empty start state.
        orch.initialize_session("fr");
        assert!(orch.history().is_empty());
        assert_eq!(orch.language(), "fr");
    }

    #[tokio::test]
    async fn test_sequential_sends_accumulate_in_order() {
        let (mut orch, _) = orchestrator(vec![
            Step::Turn(ModelTurn::text("one")),
            Step::Turn(ModelTurn::calls(vec![echo_call()])),
            Step::Turn(ModelTurn::text("two")),
        ]);
        orch.initialize_session("en");
        let sink = CollectorSink::default();

        orch.send_message("first", None, &sink).await;
        let after_first = orch.history().len();
        assert_eq!(after_first, 2);

        orch.send_message("second", None, &sink).await;
        // Second call appended user + request + results + assistant.
        assert_eq!(orch.history().len(), after_first + 4);

        // Turns from the first call precede all turns from the second.
        assert_eq!(orch.history().first_user_text(), Some("first"));
        assert_eq!(sink.chunks().len(), 2);
    }

    #[tokio::test]
    async fn test_self_initializes_with_default_language() {
        let (mut orch, _) = orchestrator(vec![Step::Turn(ModelTurn::text("hello"))]);
        let reply = orch
            .send_message("hi", None, &CollectorSink::default())
            .await;

        assert_eq!(reply.text, "hello");
        assert_eq!(orch.language(), DEFAULT_LANGUAGE);
    }

    #[tokio::test]
    async fn test_attachment_travels_with_user_turn() {
        let (mut orch, _) = orchestrator(vec![Step::Turn(ModelTurn::text("seen"))]);
        orch.initialize_session("en");
        let attachment = Attachment::from_bytes(b"pixels", "image/png", "rash.png");

        orch.send_message("what is this?", Some(attachment.clone()), &CollectorSink::default())
            .await;

        match &orch.history().turns()[0] {
            Turn::User { attachment: Some(att), .. } => assert_eq!(*att, attachment),
            other => panic!("expected user turn with attachment, got {other:?}"),
        }
    }
}

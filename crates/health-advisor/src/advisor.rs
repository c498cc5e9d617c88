//! Health Advisor Facade
//!
//! Composes the orchestration engine with the domain: one orchestrator per
//! active session, selected by an explicit session identifier, with exchanged
//! turns persisted back to the session store after every message. There is
//! no implicit global "current chat"; switching sessions always goes
//! through `select_session`, which re-initializes from the stored language.

use std::sync::Arc;

use agent_core::{
    Attachment, FinalReply, ModelProvider, Orchestrator, OrchestratorConfig, ResultSink, Session,
    SessionId, SessionStore,
};

use crate::ADVISOR_INSTRUCTION;
use crate::directory::BookingGateway;
use crate::error::{AdvisorError, Result};
use crate::model::BookingRecord;
use crate::tools::AdvisorDispatcher;

struct ActiveSession {
    id: SessionId,
    orchestrator: Orchestrator<AdvisorDispatcher>,
    /// Working-history turns already copied into the stored session
    synced: usize,
}

/// Session-aware conversation front for the health advisor
pub struct HealthAdvisor {
    provider: Arc<dyn ModelProvider>,
    gateway: Arc<dyn BookingGateway>,
    store: Arc<dyn SessionStore>,
    config: OrchestratorConfig,
    active: Option<ActiveSession>,
}

impl HealthAdvisor {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        gateway: Arc<dyn BookingGateway>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let config = OrchestratorConfig {
            instruction_template: ADVISOR_INSTRUCTION.into(),
            ..OrchestratorConfig::default()
        };
        Self {
            provider,
            gateway,
            store,
            config,
            active: None,
        }
    }

    fn build_orchestrator(&self, language: &str) -> Orchestrator<AdvisorDispatcher> {
        let dispatcher = AdvisorDispatcher::new(self.gateway.clone());
        let mut orchestrator =
            Orchestrator::new(self.provider.clone(), dispatcher, self.config.clone());
        orchestrator.initialize_session(language);
        orchestrator
    }

    /// Start a new conversation in the given language and make it active
    pub fn open_session(&mut self, language: &str) -> Result<SessionId> {
        let session = Session::new(language);
        let id = session.id.clone();
        self.store.save(&session)?;

        self.active = Some(ActiveSession {
            id: id.clone(),
            orchestrator: self.build_orchestrator(language),
            synced: 0,
        });
        tracing::info!(session = %id, %language, "session opened");
        Ok(id)
    }

    /// Switch to a stored session, re-initializing the orchestrator from its
    /// stored language
    pub fn select_session(&mut self, id: &SessionId) -> Result<()> {
        let session = self
            .store
            .load(id)?
            .ok_or_else(|| AdvisorError::Session(format!("unknown session {id}")))?;

        self.active = Some(ActiveSession {
            id: id.clone(),
            orchestrator: self.build_orchestrator(&session.language),
            synced: 0,
        });
        tracing::info!(session = %id, language = %session.language, "session selected");
        Ok(())
    }

    /// Change the active session's language; takes effect immediately
    pub fn set_language(&mut self, language: &str) -> Result<()> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| AdvisorError::Session("no active session".into()))?;

        let mut session = self
            .store
            .load(&active.id)?
            .ok_or_else(|| AdvisorError::Session(format!("unknown session {}", active.id)))?;
        session.language = language.to_string();
        session.touch();
        self.store.save(&session)?;

        active.orchestrator.initialize_session(language);
        active.synced = 0;
        Ok(())
    }

    pub fn active_session(&self) -> Option<&SessionId> {
        self.active.as_ref().map(|a| &a.id)
    }

    /// Run one exchange against the active session and persist the newly
    /// produced turns.
    ///
    /// Callers must serialize calls per session (one in flight at a time);
    /// distinct sessions are independent.
    pub async fn send_message(
        &mut self,
        text: &str,
        attachment: Option<Attachment>,
        sink: &dyn ResultSink<BookingRecord>,
    ) -> Result<FinalReply> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| AdvisorError::Session("no active session".into()))?;

        let reply = active.orchestrator.send_message(text, attachment, sink).await;

        let mut session = self
            .store
            .load(&active.id)?
            .ok_or_else(|| AdvisorError::Session(format!("unknown session {}", active.id)))?;

        let working = active.orchestrator.history().turns();
        session
            .history
            .extend(working[active.synced..].iter().cloned());
        active.synced = working.len();
        session.touch();
        self.store.save(&session)?;

        Ok(reply)
    }

    /// Stored sessions, most recently active first
    pub fn sessions(&self, limit: usize) -> Result<Vec<Session>> {
        Ok(self.store.list(limit)?)
    }

    /// Delete a stored session (explicit user action)
    pub fn delete_session(&mut self, id: &SessionId) -> Result<()> {
        if self.active.as_ref().is_some_and(|a| &a.id == id) {
            self.active = None;
        }
        self.store.delete(id)?;
        Ok(())
    }
}

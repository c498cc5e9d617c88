//! Conversation Turns
//!
//! The conversational memory the model conditions on. History is an
//! append-only ordered sequence of turns; turns are never reordered or
//! deleted, only appended.

use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::tool::{ToolCall, ToolOutcome};

/// A grounding citation attached to an assistant turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source title, when the provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Source URI
    pub uri: String,
}

impl Citation {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { title: None, uri: uri.into() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// One atomic entry in a conversation's ordered history
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    /// User message, optionally carrying an encoded attachment.
    /// Providers place the attachment before the text so the model sees it
    /// ahead of the accompanying message.
    User {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attachment: Option<Attachment>,
    },

    /// Final (or intermediate) assistant reply with grounding metadata
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        citations: Vec<Citation>,
    },

    /// Tool invocations requested by the model in one round
    ToolRequest { calls: Vec<ToolCall> },

    /// Outcomes for every call of the preceding request, in dispatch order
    ToolResults { results: Vec<ToolOutcome> },
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn::User { text: text.into(), attachment: None }
    }

    pub fn user_with_attachment(text: impl Into<String>, attachment: Attachment) -> Self {
        Turn::User { text: text.into(), attachment: Some(attachment) }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn::Assistant { text: text.into(), citations: Vec::new() }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Turn::User { .. })
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Turn::Assistant { .. })
    }
}

/// Append-only ordered sequence of turns
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. The only mutation history supports.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// First user turn, if any (used for session title derivation)
    pub fn first_user_text(&self) -> Option<&str> {
        self.turns.iter().find_map(|t| match t {
            Turn::User { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Extend<Turn> for History {
    fn extend<I: IntoIterator<Item = Turn>>(&mut self, iter: I) {
        self.turns.extend(iter);
    }
}

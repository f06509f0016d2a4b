use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Category, ChatReply, ConsultationRecord, Message, Urgency};

pub const GREETING: &str = "Hello! I'm your Maman & Bébé assistant. Ask me anything about your pregnancy or your baby's health.";
pub const CLEARED_GREETING: &str = "Conversation cleared. How can I help you?";
pub const FAILURE_REPLY: &str = "Sorry, something went wrong. Please try again.";
pub const CLEAR_PROMPT: &str = "Do you really want to clear this conversation?";

/// Where the current exchange stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangePhase {
    Idle,
    Sending,
    Resolved,
    Failed,
}

/// Visible transcript, typing placeholder and cached history panel.
///
/// The transcript is append-only except for two wholesale replacements:
/// loading a past consultation and clearing the conversation.
#[derive(Debug)]
pub struct ConversationViewModel {
    messages: Vec<Message>,
    typing: bool,
    phase: ExchangePhase,
    history: Vec<ConsultationRecord>,
    history_limit: usize,
}

impl ConversationViewModel {
    pub fn new(history_limit: usize, now: DateTime<Utc>) -> Self {
        Self {
            messages: vec![Message::assistant(GREETING, Urgency::Low, Category::General, now)],
            typing: false,
            phase: ExchangePhase::Idle,
            history: Vec::new(),
            history_limit,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn history(&self) -> &[ConsultationRecord] {
        &self.history
    }

    /// Starts an exchange: echoes the user's text and shows the typing
    /// placeholder. Returns the text to send, or `None` when the text is
    /// blank or an exchange is already waiting for its answer.
    pub fn begin_send(&mut self, text: &str, now: DateTime<Utc>) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.phase == ExchangePhase::Sending {
            log::warn!("Ignoring new message while an exchange is pending");
            return None;
        }
        self.messages.push(Message::user(text, now));
        self.typing = true;
        self.phase = ExchangePhase::Sending;
        Some(text.to_string())
    }

    /// Appends the assistant's answer. Returns the id of the new message when
    /// it is high urgency and the caller must raise the alert for it.
    pub fn resolve(&mut self, reply: ChatReply, now: DateTime<Utc>) -> Option<Uuid> {
        if self.phase != ExchangePhase::Sending {
            log::warn!("Dropping reply received outside of a pending exchange");
            return None;
        }
        self.typing = false;
        let message = Message::assistant(reply.reply, reply.urgency, reply.category, now);
        let alert = (message.urgency == Urgency::High).then_some(message.id);
        self.messages.push(message);
        self.phase = ExchangePhase::Resolved;
        alert
    }

    /// Replaces the pending answer with a single synthetic error message.
    pub fn fail(&mut self, now: DateTime<Utc>) {
        if self.phase != ExchangePhase::Sending {
            log::warn!("Ignoring failure outside of a pending exchange");
            return;
        }
        self.typing = false;
        self.messages
            .push(Message::assistant(FAILURE_REPLY, Urgency::Low, Category::Error, now));
        self.phase = ExchangePhase::Failed;
    }

    /// Stores the newest records first, bounded by the history limit.
    pub fn replace_history(&mut self, mut records: Vec<ConsultationRecord>) {
        records.truncate(self.history_limit);
        self.history = records;
    }

    /// Replaces the transcript with the question and answer of `record`.
    pub fn load_consultation(&mut self, record: &ConsultationRecord, now: DateTime<Utc>) {
        self.typing = false;
        self.messages = vec![
            Message::user(record.question.clone(), now),
            Message::assistant(record.response.clone(), record.urgency, record.category, now),
        ];
    }

    /// Loads the history entry at `index`. Returns false if there is none.
    pub fn load_history_entry(&mut self, index: usize, now: DateTime<Utc>) -> bool {
        match self.history.get(index).cloned() {
            Some(record) => {
                self.load_consultation(&record, now);
                true
            }
            None => false,
        }
    }

    /// Empties the transcript and greets again, but only once the user confirmed.
    pub fn clear(&mut self, confirmed: bool, now: DateTime<Utc>) -> bool {
        if !confirmed {
            return false;
        }
        self.typing = false;
        self.messages = vec![Message::assistant(
            CLEARED_GREETING,
            Urgency::Low,
            Category::General,
            now,
        )];
        true
    }
}

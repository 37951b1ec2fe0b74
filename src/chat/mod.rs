//! Conversational session with the meal-suggestion assistant
//!
//! The session is the single owner of the turn list; every mutation happens
//! inside [`ConversationSession::send`], so concurrent stream chunks can
//! never race on the same turns. Observers subscribe to full snapshots and
//! always see a monotonically growing open turn.

mod stream;

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;

pub use stream::{ChatModel, TokenStream};

use crate::persona::{APOLOGY, GREETING};
use crate::{Error, Result};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One chat turn; immutable once it appears in a snapshot's sealed prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Holds the ordered turns and drives streaming replies
///
/// The open assistant turn is structural, not conventional: `open` holds its
/// text while streaming and there is no way to have two of them. Snapshots
/// render it as the trailing assistant turn.
pub struct ConversationSession {
    model: Arc<dyn ChatModel>,
    greeting: String,
    sealed: Vec<ChatTurn>,
    open: Option<String>,
    sending: bool,
    snapshots: watch::Sender<Vec<ChatTurn>>,
}

impl ConversationSession {
    /// Create a session with the default greeting
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self::with_greeting(model, GREETING)
    }

    /// Create a session with a custom greeting
    ///
    /// The greeting is displayed first but never replayed as conversational
    /// context.
    #[must_use]
    pub fn with_greeting(model: Arc<dyn ChatModel>, greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        let (snapshots, _) = watch::channel(vec![ChatTurn::assistant(greeting.clone())]);
        Self {
            model,
            greeting,
            sealed: Vec::new(),
            open: None,
            sending: false,
            snapshots,
        }
    }

    /// Whether a reply is currently streaming
    #[must_use]
    pub const fn is_sending(&self) -> bool {
        self.sending
    }

    /// Full display-ordered turn list, greeting first, open turn last
    #[must_use]
    pub fn turns(&self) -> Vec<ChatTurn> {
        let mut turns = Vec::with_capacity(self.sealed.len() + 2);
        turns.push(ChatTurn::assistant(self.greeting.clone()));
        turns.extend(self.sealed.iter().cloned());
        if let Some(text) = &self.open {
            turns.push(ChatTurn::assistant(text.clone()));
        }
        turns
    }

    /// Subscribe to turn-list snapshots published after every change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatTurn>> {
        self.snapshots.subscribe()
    }

    fn publish(&self) {
        let _ = self.snapshots.send(self.turns());
    }

    /// Send a user message and stream the assistant's reply to completion
    ///
    /// Returns the display index of the sealed assistant turn. A stream
    /// failure is contained: the open turn is sealed with the fixed apology
    /// text (discarding any partial tokens) and the session stays usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChatStream`] only when a reply is already streaming.
    pub async fn send(&mut self, message: &str) -> Result<usize> {
        if self.sending {
            return Err(Error::ChatStream(
                "a reply is already streaming".to_string(),
            ));
        }

        // Optimistic append of the user's turn.
        self.sealed.push(ChatTurn::user(message));
        self.publish();

        // History sent upstream: sealed turns before this message, greeting
        // excluded by construction.
        let history: Vec<ChatTurn> = self.sealed[..self.sealed.len() - 1].to_vec();

        self.sending = true;
        self.open = Some(String::new());
        self.publish();

        match self.model.stream_reply(&history, message).await {
            Ok(mut tokens) => {
                while let Some(increment) = tokens.next().await {
                    match increment {
                        Ok(text) => {
                            if let Some(open) = self.open.as_mut() {
                                open.push_str(&text);
                            }
                            self.publish();
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "chat stream failed mid-reply");
                            self.open = Some(APOLOGY.to_string());
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat stream failed to start");
                self.open = Some(APOLOGY.to_string());
            }
        }

        // Seal the open turn; it is immutable from here on.
        let text = self.open.take().unwrap_or_default();
        self.sealed.push(ChatTurn::assistant(text));
        self.sending = false;
        self.publish();

        // Greeting occupies index 0 of the display order.
        Ok(self.sealed.len())
    }
}

/// What a renderer should do with a new snapshot of the trailing reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyChunk {
    /// Continuation of text already rendered
    Append(String),
    /// The turn text was replaced wholesale; render it fresh
    Replace(String),
}

/// Tracks how much of the trailing assistant turn has been rendered
///
/// Streaming appends yield only the new suffix. When the turn text is not an
/// extension of what was already rendered (the apology replacing a partial
/// reply), rendering restarts instead of slicing at a stale byte offset.
#[derive(Debug, Default)]
pub struct ReplyPrinter {
    index: usize,
    rendered: String,
}

impl ReplyPrinter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one snapshot of the assistant turn at `index`
    pub fn advance(&mut self, index: usize, text: &str) -> Option<ReplyChunk> {
        if index != self.index {
            self.index = index;
            self.rendered.clear();
        }
        if let Some(suffix) = text.strip_prefix(self.rendered.as_str()) {
            if suffix.is_empty() {
                return None;
            }
            let suffix = suffix.to_string();
            self.rendered = text.to_string();
            Some(ReplyChunk::Append(suffix))
        } else {
            self.rendered = text.to_string();
            Some(ReplyChunk::Replace(self.rendered.clone()))
        }
    }
}

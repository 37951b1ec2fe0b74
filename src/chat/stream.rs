//! Streaming chat model boundary

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::ChatTurn;
use crate::Result;

/// An ordered, finite, non-restartable sequence of text increments
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// External call returning an incremental reply as a token stream
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start streaming a reply to `message`
    ///
    /// `history` carries the prior turns in order; the greeting and the new
    /// message itself are not part of it.
    ///
    /// # Errors
    ///
    /// Returns error if the stream cannot be started
    async fn stream_reply(&self, history: &[ChatTurn], message: &str) -> Result<TokenStream>;
}

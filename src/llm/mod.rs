//! Upstream LLM adapter.
//!
//! - [`types`] - Conversation turns, options and the normalized result
//! - [`error`] - Adapter errors and their failure classification
//! - [`deepseek`] - The DeepSeek chat-completions client

pub mod deepseek;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use deepseek::{ChatStream, DeepSeekClient};
pub use error::AdapterError;
pub use types::{
    ChatFailure, ChatOptions, ChatOutcome, ChatReply, ChatTurn, ErrorCode, Role,
};

/// A chat backend the HTTP layer can delegate to.
///
/// Implementations never raise: every failure is folded into the
/// `Err(ChatFailure)` side of [`ChatOutcome`].
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Whether a credential is configured. Must not touch the network.
    fn is_configured(&self) -> bool;

    /// Send `message` after `history` and return the normalized outcome.
    async fn chat(&self, message: &str, history: &[ChatTurn], options: &ChatOptions)
        -> ChatOutcome;
}

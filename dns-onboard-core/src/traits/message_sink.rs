//! Outbound message transport Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::SessionId;

/// Message Sink Trait
///
/// Delivers a text message to one chat session. Implemented by the chat transport.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send `text` to `session`
    ///
    /// # Arguments
    /// * `session` - Target chat
    /// * `text` - Plain text body
    async fn send_message(&self, session: &SessionId, text: &str) -> CoreResult<()>;
}

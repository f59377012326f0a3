//! Push delivery transport contract.

use async_trait::async_trait;

use crate::error::PushError;
use crate::types::PushMessage;

/// External push transport. `destination` is the opaque payload stored in the
/// owner's subscription; only the transport interprets it.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Deliver one message. `Err(PushError::Gone)` marks the destination as
    /// permanently invalid — the dispatcher purges the subscription and never
    /// retries. Any other failure is transient and handled by the next sweep.
    async fn send(
        &self,
        destination: &serde_json::Value,
        message: &PushMessage,
    ) -> std::result::Result<(), PushError>;
}

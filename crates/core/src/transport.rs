//! MessagingTransport trait — the abstraction over chat platforms.
//!
//! A transport owns the platform-specific message objects. The coordinator
//! only ever sees opaque handles: the originating request it replies to, and
//! the single anchor message that receives every update for a session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Opaque handle to the user message that started a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestHandle(pub String);

impl std::fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to the sink-side anchor message.
///
/// Exactly one anchor exists per session; it is never shared across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorHandle(pub String);

impl std::fmt::Display for AnchorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The core MessagingTransport trait.
///
/// Implementations handle platform-specific connection logic, formatting,
/// rate limiting, and authentication. The platform only supports whole-content
/// replacement of a message, not incremental append, so every edit carries the
/// full content.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Human-readable transport name (e.g., "discord", "memory").
    fn name(&self) -> &str;

    /// Create the anchor message as a reply to the originating request.
    async fn reply(
        &self,
        origin: &RequestHandle,
        content: &str,
    ) -> std::result::Result<AnchorHandle, TransportError>;

    /// Replace the anchor's content, subject to transport-side coalescing.
    ///
    /// Rapid successive calls for the same anchor may be collapsed into the
    /// latest snapshot. Implementations must never display content older than
    /// a previously displayed edit, and must eventually reflect the
    /// last-submitted content even under coalescing.
    async fn edit_throttled(
        &self,
        anchor: &AnchorHandle,
        content: &str,
    ) -> std::result::Result<(), TransportError>;

    /// Replace the anchor's content immediately, bypassing any coalescing.
    ///
    /// Used for the error overwrite and the final flush, where the caller
    /// needs the content on screen before returning.
    async fn edit_immediate(
        &self,
        anchor: &AnchorHandle,
        content: &str,
    ) -> std::result::Result<(), TransportError>;

    /// Health check — is the transport connected and operational?
    async fn health_check(&self) -> std::result::Result<bool, TransportError> {
        Ok(true)
    }
}

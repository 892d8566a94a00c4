//! In-memory transport.
//!
//! A full-fidelity in-process sink: anchors are entries in a map, edits
//! replace their content. Used by tests and local development. Failure
//! injection flags simulate platform rejections at each capability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use anchorstream_core::error::TransportError;
use anchorstream_core::transport::{AnchorHandle, MessagingTransport, RequestHandle};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

/// In-memory messaging transport.
///
/// Throttled and immediate edits both apply synchronously here, which
/// trivially satisfies the coalescing contract: the anchor always reflects
/// the last-submitted content, and never an older snapshot.
pub struct InMemoryTransport {
    messages: Mutex<HashMap<String, String>>,
    next_id: AtomicU64,
    replies: AtomicUsize,
    throttled_edits: AtomicUsize,
    immediate_edits: AtomicUsize,
    fail_replies: AtomicBool,
    fail_edits: AtomicBool,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            replies: AtomicUsize::new(0),
            throttled_edits: AtomicUsize::new(0),
            immediate_edits: AtomicUsize::new(0),
            fail_replies: AtomicBool::new(false),
            fail_edits: AtomicBool::new(false),
        }
    }

    /// Make subsequent `reply` calls fail (placeholder rejection).
    pub fn set_fail_replies(&self, fail: bool) {
        self.fail_replies.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent edit calls fail.
    pub fn set_fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    /// Current content of an anchor, if it exists.
    pub async fn content_of(&self, anchor: &AnchorHandle) -> Option<String> {
        self.messages.lock().await.get(&anchor.0).cloned()
    }

    /// Number of anchors ever created.
    pub fn replies(&self) -> usize {
        self.replies.load(Ordering::SeqCst)
    }

    /// Number of throttled edits applied.
    pub fn throttled_edits(&self) -> usize {
        self.throttled_edits.load(Ordering::SeqCst)
    }

    /// Number of immediate edits applied.
    pub fn immediate_edits(&self) -> usize {
        self.immediate_edits.load(Ordering::SeqCst)
    }

    async fn apply_edit(&self, anchor: &AnchorHandle, content: &str) -> Result<(), TransportError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(TransportError::EditFailed {
                anchor: anchor.0.clone(),
                reason: "injected edit failure".into(),
            });
        }
        let mut messages = self.messages.lock().await;
        match messages.get_mut(&anchor.0) {
            Some(existing) => {
                *existing = content.to_string();
                Ok(())
            }
            None => Err(TransportError::EditFailed {
                anchor: anchor.0.clone(),
                reason: "unknown anchor".into(),
            }),
        }
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingTransport for InMemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn reply(
        &self,
        origin: &RequestHandle,
        content: &str,
    ) -> Result<AnchorHandle, TransportError> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(TransportError::PlaceholderRejected(
                "injected reply failure".into(),
            ));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let anchor = AnchorHandle(format!("anchor-{id}"));
        self.messages
            .lock()
            .await
            .insert(anchor.0.clone(), content.to_string());
        self.replies.fetch_add(1, Ordering::SeqCst);
        info!(origin = %origin, anchor = %anchor, "In-memory anchor created");
        Ok(anchor)
    }

    async fn edit_throttled(
        &self,
        anchor: &AnchorHandle,
        content: &str,
    ) -> Result<(), TransportError> {
        self.apply_edit(anchor, content).await?;
        self.throttled_edits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn edit_immediate(
        &self,
        anchor: &AnchorHandle,
        content: &str,
    ) -> Result<(), TransportError> {
        self.apply_edit(anchor, content).await?;
        self.immediate_edits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//! The streaming coordinator implementation.
//!
//! Sits between an incremental generation source and a rate-limited messaging
//! sink that only supports whole-content replacement of a single anchor
//! message. The driving loop invokes the callback surface in order:
//! `create_placeholder` → `on_delta`* / `on_tool_use`* → exactly one of
//! `on_final` / `on_error` → `cleanup`.
//!
//! Callbacks take `&mut self`: one session, one driver, no internal locking.
//! Multiple producers must serialize externally.

use std::sync::Arc;

use anchorstream_config::StreamingConfig;
use anchorstream_core::error::CoordinatorError;
use anchorstream_core::event::{EventBus, StreamEvent};
use anchorstream_core::transport::{AnchorHandle, MessagingTransport, RequestHandle};
use chrono::Utc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::session::{Session, SessionId, SessionState, TerminalOutcome};

/// Coordinates one generation stream into updates of one anchor message.
pub struct StreamingCoordinator {
    /// The messaging sink
    transport: Arc<dyn MessagingTransport>,

    /// Observability sink for tool-use notices and contained failures
    events: Arc<EventBus>,

    /// Session settings (placeholder text, failure template, watchdog)
    config: StreamingConfig,

    /// The single session this coordinator owns
    session: Session,

    /// Last callback activity, for the idle watchdog
    last_activity: Instant,
}

impl StreamingCoordinator {
    /// Create a coordinator for one originating request.
    pub fn new(
        transport: Arc<dyn MessagingTransport>,
        events: Arc<EventBus>,
        config: StreamingConfig,
        origin: RequestHandle,
    ) -> Self {
        Self {
            transport,
            events,
            config,
            session: Session::new(origin),
            last_activity: Instant::now(),
        }
    }

    /// Create the anchor message as a reply to the originating request.
    ///
    /// On success the session transitions `Empty → Anchored`. On failure the
    /// session stays `Empty`: no anchor will ever exist, but appends still
    /// succeed silently without transport effect.
    pub async fn create_placeholder(&mut self) -> Result<(), CoordinatorError> {
        self.expire_if_idle().await;
        match self.session.state() {
            SessionState::Empty => {}
            SessionState::Anchored => return Err(CoordinatorError::AlreadyAnchored),
            SessionState::Terminal(_) => return Err(CoordinatorError::SessionFinished),
            SessionState::Closed => return Err(CoordinatorError::SessionClosed),
        }

        match self
            .transport
            .reply(self.session.origin(), &self.config.placeholder_text)
            .await
        {
            Ok(anchor) => {
                info!(
                    session_id = %self.session.id(),
                    anchor = %anchor,
                    transport = self.transport.name(),
                    "Placeholder created"
                );
                self.events.publish(StreamEvent::PlaceholderCreated {
                    session_id: self.session.id().to_string(),
                    anchor: anchor.to_string(),
                    timestamp: Utc::now(),
                });
                self.touch();
                self.session.set_anchor(anchor)
            }
            Err(e) => {
                warn!(
                    session_id = %self.session.id(),
                    error = %e,
                    "Placeholder creation failed, session continues anchor-less"
                );
                self.events.publish(StreamEvent::PlaceholderFailed {
                    session_id: self.session.id().to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(CoordinatorError::PlaceholderCreation(e))
            }
        }
    }

    /// Append a text fragment and, if anchored, push the full buffer to the
    /// transport via its throttled-edit capability.
    ///
    /// The platform only supports whole-content replacement, so every edit
    /// carries the entire buffer, not just this delta. Edit failures are
    /// contained: logged, published, and accumulation continues.
    pub async fn on_delta(&mut self, text: &str) -> Result<(), CoordinatorError> {
        self.expire_if_idle().await;
        self.session.append(text)?;
        self.touch();

        if let Some(anchor) = self.session.anchor().cloned() {
            let snapshot = self.session.buffer().to_string();
            if let Err(e) = self.transport.edit_throttled(&anchor, &snapshot).await {
                self.contain_edit_failure(&anchor, e);
            }
        } else {
            debug!(
                session_id = %self.session.id(),
                buffered = self.session.buffer().len(),
                "Delta buffered without anchor"
            );
        }
        Ok(())
    }

    /// Record a tool-use notice. Observational only: never alters the buffer
    /// or state, and never fails.
    pub fn on_tool_use(&self, name: &str, input: &serde_json::Value) {
        debug!(
            session_id = %self.session.id(),
            tool = name,
            "Tool use observed"
        );
        self.events.publish(StreamEvent::ToolUseObserved {
            session_id: self.session.id().to_string(),
            tool_name: name.to_string(),
            input: input.clone(),
            timestamp: Utc::now(),
        });
    }

    /// Record the successful terminal outcome and flush the full buffer to
    /// the anchor with a non-throttled edit.
    ///
    /// The explicit flush means completion never depends on the transport's
    /// trailing-flush behavior under coalescing; without it, a debounced edit
    /// could leave the anchor silently truncated. If the stream produced no
    /// deltas, `response` becomes the displayed content.
    pub async fn on_final(&mut self, response: &str) -> Result<(), CoordinatorError> {
        self.expire_if_idle().await;
        if self.session.buffer().is_empty() && !response.is_empty() {
            // Non-streamed completion: the terminal response is all we have
            self.session.append(response)?;
        }
        self.session.finish(TerminalOutcome::Completed)?;

        if let Some(anchor) = self.session.anchor().cloned() {
            let content = self.session.buffer().to_string();
            if content.is_empty() {
                debug!(session_id = %self.session.id(), "Empty final buffer, placeholder left in place");
            } else if let Err(e) = self.transport.edit_immediate(&anchor, &content).await {
                self.contain_edit_failure(&anchor, e);
            }
        }

        info!(
            session_id = %self.session.id(),
            chars = self.session.buffer().len(),
            deltas = self.session.delta_count(),
            "Session completed"
        );
        self.events.publish(StreamEvent::SessionCompleted {
            session_id: self.session.id().to_string(),
            chars_streamed: self.session.buffer().len(),
            deltas: self.session.delta_count(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Record the failed terminal outcome and, if an anchor exists, overwrite
    /// it immediately with the formatted failure message.
    ///
    /// Transport failures during the overwrite are caught and logged, never
    /// re-thrown. Without an anchor there is no visible message at all; the
    /// failure is only observable through the event bus and logs.
    pub async fn on_error(
        &mut self,
        error: impl std::fmt::Display,
    ) -> Result<(), CoordinatorError> {
        self.expire_if_idle().await;
        self.session.finish(TerminalOutcome::Failed)?;

        let message = error.to_string();
        let visible = self.session.anchor().is_some();

        if let Some(anchor) = self.session.anchor().cloned() {
            let content = self.config.failure_template.replace("{error}", &message);
            if let Err(e) = self.transport.edit_immediate(&anchor, &content).await {
                self.contain_edit_failure(&anchor, e);
            }
        }

        warn!(
            session_id = %self.session.id(),
            error = %message,
            visible,
            "Session failed"
        );
        self.events.publish(StreamEvent::SessionFailed {
            session_id: self.session.id().to_string(),
            error_message: message,
            visible,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Release session resources: clears the anchor reference and resets the
    /// buffer. Idempotent, never fails, legal from any state.
    pub fn cleanup(&mut self) {
        debug!(session_id = %self.session.id(), "Session cleanup");
        self.session.close();
    }

    /// Force an idle session into failure so abandoned sessions never leak
    /// anchors in `Anchored` state indefinitely.
    ///
    /// Checked at every callback entry; the driving loop may also call it
    /// directly. Returns whether the watchdog fired. A timeout of 0 disables
    /// the watchdog.
    pub async fn expire_if_idle(&mut self) -> bool {
        let timeout = self.config.session_timeout_secs;
        if timeout == 0 {
            return false;
        }
        match self.session.state() {
            SessionState::Empty | SessionState::Anchored => {}
            SessionState::Terminal(_) | SessionState::Closed => return false,
        }
        let idle = self.last_activity.elapsed();
        if idle < Duration::from_secs(timeout) {
            return false;
        }

        // finish cannot fail here: the state was just checked to be active
        let _ = self.session.finish(TerminalOutcome::Failed);

        if let Some(anchor) = self.session.anchor().cloned() {
            let notice = self.config.timeout_notice.clone();
            if let Err(e) = self.transport.edit_immediate(&anchor, &notice).await {
                self.contain_edit_failure(&anchor, e);
            }
        }

        warn!(
            session_id = %self.session.id(),
            idle_secs = idle.as_secs(),
            "Idle watchdog forced session failure"
        );
        self.events.publish(StreamEvent::SessionTimedOut {
            session_id: self.session.id().to_string(),
            idle_secs: idle.as_secs(),
            timestamp: Utc::now(),
        });
        true
    }

    /// Unique identifier of the owned session.
    pub fn session_id(&self) -> &SessionId {
        self.session.id()
    }

    /// The anchor handle, if one was created.
    pub fn anchor(&self) -> Option<&AnchorHandle> {
        self.session.anchor()
    }

    /// The accumulated buffer content at time of call.
    pub fn buffer(&self) -> &str {
        self.session.buffer()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Log and publish a contained transport edit failure.
    fn contain_edit_failure(
        &self,
        anchor: &AnchorHandle,
        error: anchorstream_core::error::TransportError,
    ) {
        warn!(
            session_id = %self.session.id(),
            anchor = %anchor,
            error = %error,
            "Transport edit failed, continuing"
        );
        self.events.publish(StreamEvent::EditFailed {
            session_id: self.session.id().to_string(),
            anchor: anchor.to_string(),
            error_message: error.to_string(),
            timestamp: Utc::now(),
        });
    }
}

//! Per-request session state.
//!
//! A `Session` owns the ordered text accumulator and the lifecycle state
//! machine for one originating request. It is exclusively owned by one
//! coordinator instance and never shared across sessions.

use anchorstream_core::error::CoordinatorError;
use anchorstream_core::transport::{AnchorHandle, RequestHandle};
use uuid::Uuid;

/// Unique identifier for a streaming session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The terminal outcome that ends a session's active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    Completed,
    Failed,
}

/// Lifecycle states of a streaming session.
///
/// Transitions flow one way: `Empty → Anchored → Terminal → Closed`.
/// `Anchored` may be skipped (placeholder creation failed) and `Terminal`
/// may be skipped (abandoned session cleaned up directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No anchor yet; the buffer may still receive appends
    Empty,
    /// Anchor obtained; appends trigger throttled transport updates
    Anchored,
    /// Outcome recorded; no further appends accepted
    Terminal(TerminalOutcome),
    /// Resources released; only `cleanup` remains legal
    Closed,
}

/// One streaming session: anchor handle, append-only buffer, state.
pub struct Session {
    id: SessionId,
    origin: RequestHandle,
    anchor: Option<AnchorHandle>,
    buffer: String,
    deltas: usize,
    state: SessionState,
}

impl Session {
    pub fn new(origin: RequestHandle) -> Self {
        Self {
            id: SessionId::new(),
            origin,
            anchor: None,
            buffer: String::new(),
            deltas: 0,
            state: SessionState::Empty,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn origin(&self) -> &RequestHandle {
        &self.origin
    }

    pub fn anchor(&self) -> Option<&AnchorHandle> {
        self.anchor.as_ref()
    }

    /// Current accumulated content, in delta arrival order.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Number of deltas appended so far.
    pub fn delta_count(&self) -> usize {
        self.deltas
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Map a non-active state to the contract-violation error it implies.
    fn ensure_active(&self) -> Result<(), CoordinatorError> {
        match self.state {
            SessionState::Empty | SessionState::Anchored => Ok(()),
            SessionState::Terminal(_) => Err(CoordinatorError::SessionFinished),
            SessionState::Closed => Err(CoordinatorError::SessionClosed),
        }
    }

    /// Record the anchor handle: `Empty → Anchored`.
    pub fn set_anchor(&mut self, anchor: AnchorHandle) -> Result<(), CoordinatorError> {
        self.ensure_active()?;
        if self.state == SessionState::Anchored {
            return Err(CoordinatorError::AlreadyAnchored);
        }
        self.anchor = Some(anchor);
        self.state = SessionState::Anchored;
        Ok(())
    }

    /// Append a delta to the buffer. Rejected once a terminal outcome exists.
    pub fn append(&mut self, text: &str) -> Result<(), CoordinatorError> {
        self.ensure_active()?;
        self.buffer.push_str(text);
        self.deltas += 1;
        Ok(())
    }

    /// Record the terminal outcome. Exactly one per session; a second
    /// transition is a caller-contract violation.
    pub fn finish(&mut self, outcome: TerminalOutcome) -> Result<(), CoordinatorError> {
        self.ensure_active()?;
        self.state = SessionState::Terminal(outcome);
        Ok(())
    }

    /// Release resources: clears the anchor and buffer, `→ Closed`.
    ///
    /// Idempotent and legal from any state, including a session that never
    /// reached a terminal outcome (abandonment).
    pub fn close(&mut self) {
        self.anchor = None;
        self.buffer.clear();
        self.state = SessionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(RequestHandle("req-1".into()))
    }

    #[test]
    fn buffer_accumulates_in_order() {
        let mut s = session();
        s.append("Hello ").unwrap();
        s.append("world").unwrap();
        assert_eq!(s.buffer(), "Hello world");
        assert_eq!(s.delta_count(), 2);
    }

    #[test]
    fn append_allowed_before_anchor() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Empty);
        s.append("early").unwrap();
        assert_eq!(s.buffer(), "early");
    }

    #[test]
    fn anchor_transitions_to_anchored() {
        let mut s = session();
        s.set_anchor(AnchorHandle("msg-1".into())).unwrap();
        assert_eq!(s.state(), SessionState::Anchored);
        assert_eq!(s.anchor().unwrap().0, "msg-1");
    }

    #[test]
    fn second_anchor_rejected() {
        let mut s = session();
        s.set_anchor(AnchorHandle("msg-1".into())).unwrap();
        let err = s.set_anchor(AnchorHandle("msg-2".into())).unwrap_err();
        assert!(matches!(err, CoordinatorError::AlreadyAnchored));
    }

    #[test]
    fn append_after_terminal_rejected() {
        let mut s = session();
        s.append("partial").unwrap();
        s.finish(TerminalOutcome::Completed).unwrap();
        let err = s.append("late").unwrap_err();
        assert!(matches!(err, CoordinatorError::SessionFinished));
        // Buffer unchanged by the rejected append
        assert_eq!(s.buffer(), "partial");
    }

    #[test]
    fn second_terminal_transition_rejected() {
        let mut s = session();
        s.finish(TerminalOutcome::Completed).unwrap();
        let err = s.finish(TerminalOutcome::Failed).unwrap_err();
        assert!(matches!(err, CoordinatorError::SessionFinished));
        assert_eq!(s.state(), SessionState::Terminal(TerminalOutcome::Completed));
    }

    #[test]
    fn close_clears_anchor_and_buffer() {
        let mut s = session();
        s.set_anchor(AnchorHandle("msg-1".into())).unwrap();
        s.append("text").unwrap();
        s.close();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.anchor().is_none());
        assert!(s.buffer().is_empty());
    }

    #[test]
    fn close_is_idempotent_from_any_state() {
        let mut s = session();
        s.close();
        s.close();
        assert_eq!(s.state(), SessionState::Closed);

        // Abandonment: close without ever anchoring or finishing
        let mut abandoned = session();
        abandoned.append("half a thought").unwrap();
        abandoned.close();
        assert_eq!(abandoned.state(), SessionState::Closed);
    }

    #[test]
    fn operations_after_close_rejected() {
        let mut s = session();
        s.close();
        assert!(matches!(
            s.append("x").unwrap_err(),
            CoordinatorError::SessionClosed
        ));
        assert!(matches!(
            s.finish(TerminalOutcome::Failed).unwrap_err(),
            CoordinatorError::SessionClosed
        ));
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(session().id(), session().id());
    }
}

//! # anchorstream Coordinator
//!
//! The streaming-response coordinator: owns per-session text accumulation and
//! state, and translates generation stream events into transport calls against
//! a single anchor message.
//!
//! One coordinator per originating request. The driving loop calls, in order:
//! [`StreamingCoordinator::create_placeholder`], then any number of
//! [`StreamingCoordinator::on_delta`] / [`StreamingCoordinator::on_tool_use`],
//! then exactly one of [`StreamingCoordinator::on_final`] /
//! [`StreamingCoordinator::on_error`], then [`StreamingCoordinator::cleanup`].

pub mod coordinator;
pub mod session;

pub use coordinator::StreamingCoordinator;
pub use session::{Session, SessionId, SessionState, TerminalOutcome};

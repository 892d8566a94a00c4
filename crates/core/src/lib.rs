//! # anchorstream Core
//!
//! Domain types, traits, and error definitions for the anchorstream
//! streaming-response coordinator. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The messaging platform is abstracted as a capability trait
//! ([`MessagingTransport`]) over opaque handles, so the coordinator never
//! depends on a specific chat SDK's types. Observability flows through an
//! injectable event bus rather than hidden global output state.

pub mod error;
pub mod event;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use error::{CoordinatorError, Error, Result, TransportError};
pub use event::{EventBus, StreamEvent};
pub use transport::{AnchorHandle, MessagingTransport, RequestHandle};

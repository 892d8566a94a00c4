//! MessagingTransport implementations for anchorstream.
//!
//! Each transport adapts one messaging sink to the capability trait the
//! coordinator consumes: reply-to-create an anchor, throttled-edit, and
//! immediate-edit.
//!
//! Available transports:
//! - **Memory** — in-process map of anchors (tests, local development)
//! - **Discord** — Discord Bot API (stub, needs serenity in production)

pub mod discord;
pub mod memory;

pub use discord::{DiscordConfig, DiscordTransport};
pub use memory::InMemoryTransport;

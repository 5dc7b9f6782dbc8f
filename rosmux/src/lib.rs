//! # rosmux
//!
//! Tag-multiplexed response dispatch for RouterOS-style API connections.
//!
//! One physical connection carries many logical requests at once; every
//! sentence on the wire names the request it belongs to through a
//! caller-chosen tag. This crate owns the receive side of that contract:
//! a single background loop reads decoded sentences and routes each to
//! the pending request registered under its tag, detects completion, and
//! propagates connection failures to everything still outstanding.
//!
//! This crate provides:
//! - **[`Dispatcher`]**: lifecycle of the background dispatch loop
//! - **[`SentenceHandler`]** / **[`Closable`]**: the pending-request capability
//! - **[`SentenceSource`]**: the decoded-sentence reader the loop consumes
//! - **[`SentenceQueue`]**: stock channel-backed handler implementation
//! - **[`DispatchHandle`]**: one-shot notification of the loop's terminal error
//!
//! Sentence framing and parsing, connection dialing and teardown, and
//! command building all live outside this crate; it neither touches the
//! wire nor interprets payloads.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// =============================================================================
// Modules
// =============================================================================

/// Tag-based response dispatch over one connection.
pub mod dispatch;

/// Error types for the dispatch layer.
pub mod error;

/// Channel-backed reply handlers.
pub mod reply;

/// Decoded protocol sentences.
pub mod sentence;

/// The sentence source consumed by the dispatch loop.
pub mod source;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use dispatch::{
    Closable, DispatchHandle, DispatchMetrics, DispatchTable, Dispatcher, SentenceHandler,
};
pub use error::{DispatchError, DispatchResult};
pub use reply::{QueueReceiver, SentenceQueue};
pub use sentence::Sentence;
pub use source::SentenceSource;

//! Tag-based response dispatch over one connection.
//!
//! Many logical requests share one physical API connection; every response
//! sentence carries the tag of the request it belongs to. This module
//! routes each incoming sentence to the pending request registered under
//! its tag:
//!
//! - **[`DispatchTable`]**: tag → handler map, the only shared mutable state
//! - **[`SentenceHandler`]** / **[`Closable`]**: the per-request capability
//! - **[`Dispatcher`]**: starts the background loop and owns its lifecycle
//! - **[`DispatchHandle`]**: one-shot notification of the loop's terminal error
//!
//! # Design
//!
//! A single background task reads sentences and routes them by direct tag
//! lookup, so per-sentence cost is independent of the number of
//! outstanding requests. The table lock covers map access only; handler
//! code always runs outside it. Sentences for a given tag arrive at its
//! handler in wire order; a retired tag receives nothing further.

mod dispatcher;
mod handler;
mod metrics;
mod table;

pub use dispatcher::{DispatchHandle, Dispatcher};
pub use handler::{Closable, SentenceHandler};
pub use metrics::DispatchMetrics;
pub use table::DispatchTable;

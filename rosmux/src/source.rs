//! The sentence source consumed by the dispatch loop.

use async_trait::async_trait;

use crate::error::DispatchResult;
use crate::sentence::Sentence;

/// Produces decoded sentences from the underlying connection.
///
/// Implementations wrap the connection reader and the protocol decoder.
/// The dispatch loop is the sole caller of [`read_sentence`] and invokes
/// it continuously until it returns an error.
///
/// # Errors
///
/// A returned error is terminal: the dispatch loop sweeps every pending
/// request, broadcasts the error to them, and stops. Sources should return
/// [`DispatchError::ConnectionClosed`] when the read failed because the
/// caller deliberately closed the connection, so that the shutdown is not
/// reported as a fault.
///
/// [`read_sentence`]: SentenceSource::read_sentence
/// [`DispatchError::ConnectionClosed`]: crate::DispatchError::ConnectionClosed
#[async_trait]
pub trait SentenceSource: Send {
    /// Read the next sentence, waiting until one arrives or the
    /// connection becomes unusable.
    async fn read_sentence(&mut self) -> DispatchResult<Sentence>;
}

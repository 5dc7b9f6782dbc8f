//! Handler traits implemented by pending requests.

use crate::error::{DispatchError, DispatchResult};
use crate::sentence::Sentence;

/// Consumes the sentences routed to one tag.
///
/// Implementors track a single in-flight request/response exchange. The
/// dispatch loop calls [`process_sentence`] for every sentence whose tag
/// matches the registration, in wire arrival order, and retires the tag
/// once the handler reports completion or an error.
///
/// Handlers are shared as `Arc<dyn SentenceHandler>` between the caller
/// and the dispatch loop, so processing takes `&self`; implementations
/// use interior mutability for their own state.
///
/// [`process_sentence`]: SentenceHandler::process_sentence
pub trait SentenceHandler: Send + Sync {
    /// Consume one sentence for this handler's tag.
    ///
    /// # Returns
    ///
    /// `Ok(true)` once the exchange is complete and the tag should be
    /// retired; `Ok(false)` to keep receiving sentences.
    ///
    /// # Errors
    ///
    /// An error retires the tag and is delivered through the handler's
    /// close capability. It affects this tag only; the dispatch loop and
    /// all other tags continue undisturbed.
    fn process_sentence(&self, sentence: Sentence) -> DispatchResult<bool>;

    /// Optional close capability.
    ///
    /// Handlers that want to observe retirement return `Some(self)` here.
    /// The dispatch loop checks this accessor instead of downcasting.
    fn as_closable(&self) -> Option<&dyn Closable> {
        None
    }
}

/// Close capability for handlers that observe retirement.
///
/// Invoked at most once per registration, when the tag is retired: with
/// `None` after a clean completion, with the handler's own error after a
/// processing failure, or with the terminal read error when the whole
/// dispatcher shuts down.
pub trait Closable {
    /// Notify the handler that its tag has been retired.
    fn close(&self, error: Option<DispatchError>);
}

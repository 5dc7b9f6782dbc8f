//! Dispatcher lifecycle and the background dispatch loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

use super::handler::SentenceHandler;
use super::metrics::DispatchMetrics;
use super::table::DispatchTable;
use crate::error::DispatchError;
use crate::source::SentenceSource;

/// Routes tagged response sentences to their pending requests.
///
/// A dispatcher owns the [`DispatchTable`] for one connection. Callers
/// register a handler per tag, [`start`] spawns the background loop that
/// reads sentences and routes them, and the returned [`DispatchHandle`]
/// reports the loop's terminal error.
///
/// # Example
///
/// ```ignore
/// let dispatcher = Dispatcher::new();
/// let handle = dispatcher.start(source);
///
/// dispatcher.register("1", reply_handler);
/// // ... write the tagged request through the connection's writer ...
///
/// if let Some(err) = handle.terminated().await {
///     eprintln!("connection failed: {err}");
/// }
/// ```
///
/// [`start`]: Dispatcher::start
pub struct Dispatcher {
    table: Arc<DispatchTable>,
    started: AtomicBool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher with an empty table.
    pub fn new() -> Self {
        Self {
            table: Arc::new(DispatchTable::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Start the background dispatch loop, taking ownership of the source.
    ///
    /// The loop runs until the source reports a terminal error; at that
    /// point every still-registered handler is swept out of the table and
    /// closed with the error, and the returned handle resolves.
    ///
    /// Must be called from within a tokio runtime; the loop is spawned
    /// with [`tokio::spawn`].
    ///
    /// # Panics
    ///
    /// Panics when called a second time on the same dispatcher. Starting
    /// twice would race two readers against one connection, so the misuse
    /// is fatal rather than reported through the error path.
    pub fn start<S>(&self, source: S) -> DispatchHandle
    where
        S: SentenceSource + 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            panic!("Dispatcher::start must be called only once");
        }

        let table = Arc::clone(&self.table);
        let (error_tx, error_rx) = oneshot::channel();

        tokio::spawn(async move {
            let err = dispatch_loop(source, &table).await;
            if err.is_closed() {
                // Deliberate shutdown of the connection. Pending requests
                // were already unblocked; dropping the sender resolves the
                // handle with no error.
                tracing::debug!("dispatch loop stopped after deliberate close");
                return;
            }
            tracing::warn!(error = %err, "dispatch loop terminated");
            let _ = error_tx.send(err);
        });

        DispatchHandle { error_rx }
    }

    /// Register a handler for a tag.
    ///
    /// May be called from any task, before or after [`start`]. Callers
    /// must keep tags unique among outstanding requests; see
    /// [`DispatchTable::register`].
    ///
    /// [`start`]: Dispatcher::start
    pub fn register(&self, tag: impl Into<String>, handler: Arc<dyn SentenceHandler>) {
        self.table.register(tag, handler);
    }

    /// Number of requests currently waiting for sentences.
    pub fn pending(&self) -> usize {
        self.table.pending()
    }

    /// Snapshot of the routing counters.
    pub fn metrics(&self) -> DispatchMetrics {
        self.table.metrics()
    }
}

/// Resolves once the dispatch loop has terminated.
///
/// At most one terminal value is ever produced. [`terminated`] consumes
/// the handle, so awaiting it a second time is unrepresentable.
///
/// [`terminated`]: DispatchHandle::terminated
pub struct DispatchHandle {
    error_rx: oneshot::Receiver<DispatchError>,
}

impl DispatchHandle {
    /// Wait for the dispatch loop to terminate.
    ///
    /// # Returns
    ///
    /// `Some(error)` when the loop died of a genuine fault, `None` when it
    /// stopped because the connection was deliberately closed.
    pub async fn terminated(self) -> Option<DispatchError> {
        self.error_rx.await.ok()
    }
}

/// The background loop: sole reader of the source.
///
/// Runs until the source fails, then sweeps the table, broadcasts the
/// error to every captured handler and returns it.
async fn dispatch_loop<S: SentenceSource>(mut source: S, table: &DispatchTable) -> DispatchError {
    loop {
        let sentence = match source.read_sentence().await {
            Ok(sentence) => sentence,
            Err(err) => {
                close_all(table, &err);
                return err;
            }
        };

        let tag = sentence.tag().to_owned();
        let handler = match table.lookup(&tag) {
            Some(handler) => handler,
            None => {
                // Either a race with retirement or a message nobody asked
                // for; the protocol allows both, so drop it quietly.
                tracing::trace!(%tag, word = sentence.word(), "no handler for tag, discarding");
                continue;
            }
        };

        // Handler code runs without the table lock held.
        match handler.process_sentence(sentence) {
            Ok(false) => {}
            Ok(true) => {
                table.remove(&tag);
                close_handler(handler.as_ref(), None);
            }
            Err(err) => {
                table.remove(&tag);
                close_handler(handler.as_ref(), Some(err));
            }
        }
    }
}

/// Sweep the table and deliver `err` to every captured handler.
fn close_all(table: &DispatchTable, err: &DispatchError) {
    let swept = table.sweep();
    if !swept.is_empty() {
        tracing::debug!(pending = swept.len(), error = %err, "closing pending requests");
    }
    for (_tag, handler) in swept {
        close_handler(handler.as_ref(), Some(err.clone()));
    }
}

/// Deliver the close notification if the handler supports it.
fn close_handler(handler: &dyn SentenceHandler, err: Option<DispatchError>) {
    if let Some(closable) = handler.as_closable() {
        closable.close(err);
    }
}

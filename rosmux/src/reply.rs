//! Channel-backed reply handlers.
//!
//! [`SentenceQueue`] is the stock [`SentenceHandler`] implementation:
//! every sentence routed to its tag is forwarded into an unbounded
//! channel, and the consumer side ([`QueueReceiver`]) awaits them from
//! any task. Completion detection stays with the caller: a queue either
//! never completes on its own (listen-style streams, retired only when
//! the dispatcher shuts down) or completes when a caller-supplied
//! predicate matches, so the dispatch layer itself still interprets no
//! payloads.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::dispatch::{Closable, SentenceHandler};
use crate::error::{DispatchError, DispatchResult};
use crate::sentence::Sentence;

type DonePredicate = Box<dyn Fn(&Sentence) -> bool + Send + Sync>;

/// Handler that forwards routed sentences into a channel.
///
/// Register the returned `Arc` under a tag, hand the matching
/// [`QueueReceiver`] to whoever consumes the reply. When the tag is
/// retired, normally or because the connection failed, the channel closes;
/// the close error (if any) is available on the receiver afterwards.
pub struct SentenceQueue {
    /// Sender half; taken on close so the receiver observes end-of-stream.
    tx: Mutex<Option<mpsc::UnboundedSender<Sentence>>>,

    /// Completion predicate; `None` for listen-style streams.
    done: Option<DonePredicate>,

    /// Error delivered with the close notification, shared with the receiver.
    close_error: Arc<Mutex<Option<DispatchError>>>,
}

impl SentenceQueue {
    /// Create a stream queue that never completes on its own.
    ///
    /// Its tag stays registered until the dispatcher shuts down, so this
    /// fits long-running listen exchanges.
    pub fn stream() -> (Arc<Self>, QueueReceiver) {
        Self::build(None)
    }

    /// Create a queue that completes when `done` matches a sentence.
    ///
    /// The matching sentence is still forwarded to the receiver before the
    /// channel closes.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let (queue, mut replies) = SentenceQueue::until(|s| s.word() == "!done");
    /// dispatcher.register("4", queue);
    /// ```
    pub fn until<F>(done: F) -> (Arc<Self>, QueueReceiver)
    where
        F: Fn(&Sentence) -> bool + Send + Sync + 'static,
    {
        Self::build(Some(Box::new(done)))
    }

    fn build(done: Option<DonePredicate>) -> (Arc<Self>, QueueReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let close_error = Arc::new(Mutex::new(None));
        let queue = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            done,
            close_error: Arc::clone(&close_error),
        });
        (queue, QueueReceiver { rx, close_error })
    }

    fn sender(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<Sentence>>> {
        self.tx.lock().expect("queue sender lock poisoned")
    }
}

impl SentenceHandler for SentenceQueue {
    fn process_sentence(&self, sentence: Sentence) -> DispatchResult<bool> {
        let done = match &self.done {
            Some(predicate) => predicate(&sentence),
            None => false,
        };

        let delivered = match self.sender().as_ref() {
            Some(tx) => tx.send(sentence).is_ok(),
            None => false,
        };
        if !delivered {
            // Consumer went away; retire the tag instead of routing into
            // a void for the rest of the connection's life.
            return Ok(true);
        }

        Ok(done)
    }

    fn as_closable(&self) -> Option<&dyn Closable> {
        Some(self)
    }
}

impl Closable for SentenceQueue {
    fn close(&self, error: Option<DispatchError>) {
        if let Some(err) = error {
            *self.close_error.lock().expect("close error lock poisoned") = Some(err);
        }
        // The error slot is written before the sender drops, so once the
        // receiver observes end-of-stream the slot is final.
        self.sender().take();
    }
}

/// Consumer side of a [`SentenceQueue`].
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<Sentence>,
    close_error: Arc<Mutex<Option<DispatchError>>>,
}

impl QueueReceiver {
    /// Wait for the next sentence.
    ///
    /// Returns `None` once the queue's tag has been retired and every
    /// buffered sentence has been drained; check [`close_error`] then to
    /// distinguish clean completion from failure.
    ///
    /// [`close_error`]: QueueReceiver::close_error
    pub async fn recv(&mut self) -> Option<Sentence> {
        self.rx.recv().await
    }

    /// Take the next sentence if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Sentence> {
        self.rx.try_recv().ok()
    }

    /// The error the queue was closed with, if any.
    pub fn close_error(&self) -> Option<DispatchError> {
        self.close_error
            .lock()
            .expect("close error lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_queue_forwards_in_order() {
        let (queue, mut rx) = SentenceQueue::stream();

        for i in 0..3 {
            let sen = Sentence::new("!re").with_attribute("n", i.to_string());
            assert_eq!(queue.process_sentence(sen), Ok(false));
        }

        for i in 0..3 {
            let sen = rx.try_recv().expect("buffered sentence");
            assert_eq!(sen.attribute("n"), Some(i.to_string().as_str()));
        }
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_until_predicate_reports_done() {
        let (queue, mut rx) = SentenceQueue::until(|s| s.word() == "!done");

        assert_eq!(queue.process_sentence(Sentence::new("!re")), Ok(false));
        assert_eq!(queue.process_sentence(Sentence::new("!done")), Ok(true));

        // The completing sentence is still delivered.
        assert_eq!(rx.try_recv().expect("first").word(), "!re");
        assert_eq!(rx.try_recv().expect("second").word(), "!done");
    }

    #[tokio::test]
    async fn test_close_ends_stream_after_drain() {
        let (queue, mut rx) = SentenceQueue::stream();

        queue
            .process_sentence(Sentence::new("!re"))
            .expect("process");
        queue.close(None);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
        assert_eq!(rx.close_error(), None);
    }

    #[tokio::test]
    async fn test_close_error_is_exposed() {
        let (queue, mut rx) = SentenceQueue::stream();

        queue.close(Some(DispatchError::Io("broken pipe".to_string())));

        assert!(rx.recv().await.is_none());
        assert_eq!(
            rx.close_error(),
            Some(DispatchError::Io("broken pipe".to_string()))
        );
    }

    #[test]
    fn test_dropped_receiver_retires_tag() {
        let (queue, rx) = SentenceQueue::stream();
        drop(rx);

        assert_eq!(queue.process_sentence(Sentence::new("!re")), Ok(true));
    }
}

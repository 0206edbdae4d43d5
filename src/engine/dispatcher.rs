// ============================================================================
// Notification Dispatcher
// Moves events from the matching path to the Notifier on its own thread
// ============================================================================

use crate::interfaces::{MarketEvent, Notifier};
use crossbeam::channel::{self, Sender, TrySendError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Owns the delivery thread and the sending half of its queue.
///
/// `publish` never blocks: it is called while an instrument's write lock is
/// held, which keeps events of one instrument in matching order.
pub(crate) struct NotificationDispatcher {
    tx: Option<Sender<MarketEvent>>,
    handle: Option<JoinHandle<()>>,
    dropped: AtomicU64,
}

impl NotificationDispatcher {
    /// Spawn the delivery thread. `capacity` of None gives an unbounded
    /// queue.
    pub(crate) fn start(
        notifier: Arc<dyn Notifier>,
        capacity: Option<usize>,
    ) -> std::io::Result<Self> {
        let (tx, rx) = match capacity {
            Some(capacity) => channel::bounded::<MarketEvent>(capacity),
            None => channel::unbounded::<MarketEvent>(),
        };

        let handle = thread::Builder::new()
            .name("matching-notifier".to_string())
            .spawn(move || {
                for event in rx.iter() {
                    let delivered =
                        panic::catch_unwind(AssertUnwindSafe(|| notifier.notify(event)));
                    if delivered.is_err() {
                        tracing::error!("notifier panicked while handling an event");
                    }
                }
                tracing::debug!("notification queue closed, dispatcher exiting");
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            dropped: AtomicU64::new(0),
        })
    }

    pub(crate) fn publish(&self, event: MarketEvent) {
        let Some(tx) = &self.tx else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    instrument = event.instrument(),
                    dropped_total = total,
                    "notification buffer full, event dropped"
                );
            }
            Err(TrySendError::Disconnected(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    instrument = event.instrument(),
                    "notification dispatcher gone, event dropped"
                );
            }
        }
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close the queue, let the thread deliver what is already queued, and
    /// wait for it.
    pub(crate) fn shutdown(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("notification dispatcher thread panicked");
            }
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

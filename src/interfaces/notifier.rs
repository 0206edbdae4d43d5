// ============================================================================
// Notifier Interface
// Downstream sink for trades and book changes
// ============================================================================

use crate::domain::{Fill, OrderId, Side};
use crate::numeric::{Price, Quantity};
use parking_lot::Mutex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events published by the matching engine
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarketEvent {
    /// Two orders traded
    Trade(Fill),

    /// The unfilled remainder of an order was added to the book
    OrderRested {
        instrument: String,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    },

    /// A resting order was removed on request
    OrderCancelled {
        instrument: String,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    },

    /// Matching stopped on an instrument after its book was found crossed
    InstrumentHalted { instrument: String, reason: String },
}

impl MarketEvent {
    pub fn instrument(&self) -> &str {
        match self {
            MarketEvent::Trade(fill) => &fill.instrument,
            MarketEvent::OrderRested { instrument, .. }
            | MarketEvent::OrderCancelled { instrument, .. }
            | MarketEvent::InstrumentHalted { instrument, .. } => instrument,
        }
    }
}

/// Fire-and-forget sink for engine events.
///
/// Called from the engine's dispatcher thread, never from inside an
/// instrument lock, so a slow implementation delays delivery but not
/// matching.
pub trait Notifier: Send + Sync {
    /// Handle one event
    fn notify(&self, event: MarketEvent);

    /// Batch handler (optional optimization)
    fn notify_batch(&self, events: Vec<MarketEvent>) {
        for event in events {
            self.notify(event);
        }
    }
}

/// Discards every event
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _event: MarketEvent) {}
}

/// Writes every event to the tracing subscriber
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn notify(&self, event: MarketEvent) {
        match &event {
            MarketEvent::Trade(fill) => tracing::info!(
                instrument = %fill.instrument,
                seq = fill.sequence_number,
                price = %fill.price,
                quantity = fill.quantity,
                buy = %fill.buy_order_id,
                sell = %fill.sell_order_id,
                "trade"
            ),
            MarketEvent::InstrumentHalted { instrument, reason } => {
                tracing::error!(%instrument, %reason, "instrument halted")
            }
            other => tracing::debug!(event = ?other, "book update"),
        }
    }
}

/// Keeps every event in memory, in delivery order
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<MarketEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MarketEvent> {
        self.events.lock().clone()
    }

    pub fn fills(&self) -> Vec<Fill> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                MarketEvent::Trade(fill) => Some(fill.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: MarketEvent) {
        self.events.lock().push(event);
    }
}

// ============================================================================
// Async bridge
// ============================================================================

/// Forwards events into a tokio channel, for transports running on an async
/// runtime (e.g. a websocket broadcaster).
#[cfg(feature = "async")]
pub struct ChannelNotifier {
    tx: tokio::sync::mpsc::UnboundedSender<MarketEvent>,
}

#[cfg(feature = "async")]
impl ChannelNotifier {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<MarketEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[cfg(feature = "async")]
impl Notifier for ChannelNotifier {
    fn notify(&self, event: MarketEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("market event receiver dropped, event discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rested() -> MarketEvent {
        MarketEvent::OrderRested {
            instrument: "BTC-USD".to_string(),
            order_id: OrderId::new(),
            side: Side::Buy,
            price: Price::from_integer(100).unwrap(),
            quantity: 10,
        }
    }

    #[test]
    fn test_noop_notifier() {
        NoOpNotifier.notify(rested());
        // Should not panic
    }

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        let first = rested();
        let second = MarketEvent::InstrumentHalted {
            instrument: "BTC-USD".to_string(),
            reason: "test".to_string(),
        };

        notifier.notify_batch(vec![first.clone(), second.clone()]);

        assert_eq!(notifier.events(), vec![first, second]);
        assert!(notifier.fills().is_empty());
        assert_eq!(notifier.events()[1].instrument(), "BTC-USD");
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let event = rested();
        notifier.notify(event.clone());
        assert_eq!(rx.recv().await, Some(event));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_event_serializes() {
        let json = serde_json::to_string(&rested()).unwrap();
        assert!(json.contains("OrderRested"));
        let back: MarketEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.instrument(), "BTC-USD");
    }
}

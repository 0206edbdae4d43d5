// ============================================================================
// Matching Engine
// Owns every instrument book and routes submissions to them
// ============================================================================

use super::dispatcher::NotificationDispatcher;
use super::instrument::{InstrumentBook, OrderDirectory};
use super::{EngineError, StartupError, ValidationError};
use crate::domain::{
    EngineConfig, Fill, InstrumentConfig, OrderBookSnapshot, OrderId, OrderRequest, Side,
};
use crate::interfaces::Notifier;
use crate::numeric::{Price, Quantity};
use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Operation Results
// ============================================================================

/// Outcome of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubmitResult {
    pub order_id: OrderId,
    pub instrument: String,
    /// Position of the order in its instrument's arrival order
    pub arrival_sequence: u64,
    pub filled_quantity: Quantity,
    /// Fills in execution order
    pub fills: Vec<Fill>,
    /// Quantity left resting in the book; zero when fully filled
    pub resting_quantity: Quantity,
}

impl SubmitResult {
    pub fn is_fully_filled(&self) -> bool {
        self.resting_quantity == 0
    }
}

/// Confirmation of a cancelled order
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CancelResult {
    pub order_id: OrderId,
    pub instrument: String,
    pub side: Side,
    pub price: Price,
    /// Quantity that was still resting when the order was removed
    pub cancelled_quantity: Quantity,
}

// ============================================================================
// Matching Engine
// ============================================================================

/// Price-time priority matching engine for any number of instruments.
///
/// The engine is shared between submitters through `Arc`. Each instrument
/// has its own lock, so instruments never wait on each other; fills and
/// book updates are handed to the `Notifier` on a background thread.
///
/// # Example
/// ```
/// use matching_core::prelude::*;
/// use std::sync::Arc;
///
/// let engine = MatchingEngine::new(EngineConfig::default(), Arc::new(NoOpNotifier)).unwrap();
/// let price = Price::from_integer(100).unwrap();
///
/// engine.submit(OrderRequest::buy("BTC-USD", price, 10)).unwrap();
/// let result = engine.submit(OrderRequest::sell("BTC-USD", price, 6)).unwrap();
///
/// assert_eq!(result.filled_quantity, 6);
/// assert_eq!(engine.book_snapshot("BTC-USD").total_bid_quantity(), 4);
/// ```
pub struct MatchingEngine {
    config: EngineConfig,

    /// One long-lived book per instrument
    books: SkipMap<String, Arc<InstrumentBook>>,

    /// Resting order id -> owning book (for cancellations)
    directory: OrderDirectory,

    dispatcher: NotificationDispatcher,
}

impl MatchingEngine {
    /// Validate `config`, create the configured books and start delivering
    /// events to `notifier`.
    pub fn new(config: EngineConfig, notifier: Arc<dyn Notifier>) -> Result<Self, StartupError> {
        config.validate()?;

        let books = SkipMap::new();
        for instrument in &config.instruments {
            books.insert(
                instrument.symbol.clone(),
                Arc::new(InstrumentBook::new(instrument.clone())),
            );
        }

        let dispatcher = NotificationDispatcher::start(notifier, config.notification_capacity)?;

        tracing::info!(
            instruments = books.len(),
            auto_create = config.auto_create_instruments,
            notification_capacity = ?config.notification_capacity,
            "matching engine started"
        );

        Ok(Self {
            config,
            books,
            directory: SkipMap::new(),
            dispatcher,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Submit a limit order.
    ///
    /// The request is validated before any book is touched; a rejected
    /// request leaves every book unchanged. An accepted order is matched
    /// against the opposite side and any remainder rests in the book.
    pub fn submit(&self, request: OrderRequest) -> Result<SubmitResult, EngineError> {
        let book = match self.admit(&request) {
            Ok(book) => book,
            Err(err) => {
                tracing::debug!(
                    instrument = %request.instrument,
                    error = %err,
                    "order rejected"
                );
                return Err(err);
            }
        };

        book.submit(&request, &self.directory, &self.dispatcher)
    }

    /// Cancel a resting order. Fails with `OrderNotFound` when the order
    /// never existed, was already filled or was already cancelled.
    pub fn cancel(&self, order_id: OrderId) -> Result<CancelResult, EngineError> {
        let book = self
            .directory
            .get(&order_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::OrderNotFound(order_id))?;

        // A fill may land between the lookup and the lock; the book answers
        // OrderNotFound in that case.
        book.cancel(order_id, &self.directory, &self.dispatcher)
    }

    /// Full-depth snapshot of an instrument's book. Unknown instruments
    /// yield an empty snapshot.
    pub fn book_snapshot(&self, instrument: &str) -> OrderBookSnapshot {
        self.book_snapshot_with_depth(instrument, usize::MAX)
    }

    /// Snapshot limited to the best `depth` levels per side
    pub fn book_snapshot_with_depth(&self, instrument: &str, depth: usize) -> OrderBookSnapshot {
        match self.books.get(instrument.trim()) {
            Some(entry) => entry.value().snapshot(depth),
            None => OrderBookSnapshot::empty(instrument.to_string()),
        }
    }

    /// Instruments with a book, in symbol order
    pub fn instruments(&self) -> Vec<String> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn is_halted(&self, instrument: &str) -> bool {
        self.books
            .get(instrument.trim())
            .map_or(false, |entry| entry.value().is_halted())
    }

    /// Number of resting orders across all instruments
    pub fn resting_order_count(&self) -> usize {
        self.directory.len()
    }

    /// Events discarded because the notification buffer was full
    pub fn dropped_notifications(&self) -> u64 {
        self.dispatcher.dropped()
    }

    /// Stop accepting events, deliver everything already queued to the
    /// notifier and join the dispatcher thread.
    pub fn shutdown(mut self) {
        self.dispatcher.shutdown();
        tracing::info!(
            dropped_notifications = self.dispatcher.dropped(),
            "matching engine stopped"
        );
    }

    // ========================================================================
    // Admission
    // ========================================================================

    fn admit(&self, request: &OrderRequest) -> Result<Arc<InstrumentBook>, EngineError> {
        if !request.price.is_positive() {
            return Err(ValidationError::InvalidPrice(format!(
                "{} (must be greater than zero)",
                request.price
            ))
            .into());
        }

        if request.quantity == 0 {
            return Err(
                ValidationError::InvalidQuantity("0 (must be greater than zero)".to_string()).into(),
            );
        }

        let book = self.resolve_book(&request.instrument)?;
        book.config().check_grid(request.price, request.quantity)?;
        Ok(book)
    }

    /// Symbols are matched with surrounding whitespace stripped, so
    /// `"BTC-USD "` and `"BTC-USD"` share one book.
    fn resolve_book(&self, instrument: &str) -> Result<Arc<InstrumentBook>, ValidationError> {
        let instrument = instrument.trim();
        if let Some(entry) = self.books.get(instrument) {
            return Ok(Arc::clone(entry.value()));
        }

        let config = InstrumentConfig::new(instrument);
        if !self.config.auto_create_instruments || config.validate().is_err() {
            return Err(ValidationError::UnknownInstrument(instrument.to_string()));
        }

        let entry = self.books.get_or_insert_with(instrument.to_string(), || {
            tracing::info!(instrument, "creating order book on first use");
            Arc::new(InstrumentBook::new(config))
        });
        Ok(Arc::clone(entry.value()))
    }

    #[cfg(test)]
    fn book(&self, instrument: &str) -> Arc<InstrumentBook> {
        self.resolve_book(instrument).unwrap()
    }
}

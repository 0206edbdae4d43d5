// ============================================================================
// Instrument Book
// One book, its counters and its lock
// ============================================================================

use super::dispatcher::NotificationDispatcher;
use super::matching::match_order;
use super::{CancelResult, EngineError, InvariantViolation, SubmitResult, ValidationError};
use crate::domain::{InstrumentConfig, Order, OrderBook, OrderBookSnapshot, OrderId, OrderRequest};
use crate::interfaces::MarketEvent;
use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::sync::Arc;

/// Orders that rest anywhere in the engine, mapped to the book holding them
pub(crate) type OrderDirectory = SkipMap<OrderId, Arc<InstrumentBook>>;

struct BookState {
    book: OrderBook,
    /// Last arrival sequence handed out
    arrivals: u64,
    /// Last trade sequence number handed out
    trades: u64,
    halted: bool,
}

/// A long-lived book for one instrument.
///
/// `submit` and `cancel` run entirely under the write lock, so arrival
/// order, matching and the resting insert form one atomic step; snapshots
/// take the read lock and only ever see completed cycles.
pub(crate) struct InstrumentBook {
    symbol: Arc<str>,
    config: InstrumentConfig,
    state: RwLock<BookState>,
}

impl InstrumentBook {
    pub(crate) fn new(config: InstrumentConfig) -> Self {
        let symbol: Arc<str> = Arc::from(config.symbol.as_str());
        Self {
            state: RwLock::new(BookState {
                book: OrderBook::new(Arc::clone(&symbol)),
                arrivals: 0,
                trades: 0,
                halted: false,
            }),
            symbol,
            config,
        }
    }

    pub(crate) fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.state.read().halted
    }

    /// Admit an already validated request, match it and rest the remainder.
    pub(crate) fn submit(
        self: &Arc<Self>,
        request: &OrderRequest,
        directory: &OrderDirectory,
        dispatcher: &NotificationDispatcher,
    ) -> Result<SubmitResult, EngineError> {
        let mut state = self.state.write();
        if state.halted {
            return Err(self.halted_error());
        }

        // Matching only drains the opposite side, so if the whole request
        // fits on its own side now, the remainder will fit after matching.
        if !state.book.has_room_for(request.side, request.quantity) {
            return Err(ValidationError::InvalidQuantity(format!(
                "{} would overflow the resting {} quantity on {}",
                request.quantity, request.side, self.symbol
            ))
            .into());
        }

        state.arrivals += 1;
        let mut order = Order::new(
            Arc::clone(&self.symbol),
            request.side,
            request.price,
            request.quantity,
            state.arrivals,
        );

        let BookState { book, trades, .. } = &mut *state;
        let fills = match_order(book, &mut order, trades);

        let mut events: SmallVec<[MarketEvent; 8]> = SmallVec::new();
        for fill in &fills {
            if !book.contains(&fill.maker_order_id) {
                directory.remove(&fill.maker_order_id);
            }
            events.push(MarketEvent::Trade(fill.clone()));
        }

        let mut resting_quantity = order.remaining_quantity();
        if resting_quantity > 0 {
            match book.insert(order.clone()) {
                Ok(()) => {
                    directory.insert(order.id, Arc::clone(self));
                    events.push(MarketEvent::OrderRested {
                        instrument: self.symbol.to_string(),
                        order_id: order.id,
                        side: order.side,
                        price: order.price,
                        quantity: resting_quantity,
                    });
                }
                Err(_) => {
                    tracing::error!(
                        instrument = %self.symbol,
                        order_id = %order.id,
                        quantity = resting_quantity,
                        "remainder did not fit on its side, not rested"
                    );
                    resting_quantity = 0;
                }
            }
        }

        let crossed = self.check_uncrossed(book);

        for event in events {
            dispatcher.publish(event);
        }

        if let Err(violation) = crossed {
            state.halted = true;
            tracing::error!(
                instrument = %self.symbol,
                best_bid = %violation.best_bid,
                best_ask = %violation.best_ask,
                "crossed book after matching cycle, halting instrument"
            );
            dispatcher.publish(MarketEvent::InstrumentHalted {
                instrument: self.symbol.to_string(),
                reason: violation.to_string(),
            });
            return Err(violation.into());
        }

        let result = SubmitResult {
            order_id: order.id,
            instrument: self.symbol.to_string(),
            arrival_sequence: order.arrival_sequence,
            filled_quantity: order.filled_quantity(),
            resting_quantity,
            fills,
        };

        tracing::debug!(
            instrument = %self.symbol,
            order_id = %result.order_id,
            side = %order.side,
            price = %order.price,
            filled = result.filled_quantity,
            resting = result.resting_quantity,
            fills = result.fills.len(),
            "order processed"
        );

        Ok(result)
    }

    pub(crate) fn cancel(
        &self,
        order_id: OrderId,
        directory: &OrderDirectory,
        dispatcher: &NotificationDispatcher,
    ) -> Result<CancelResult, EngineError> {
        let mut state = self.state.write();
        if state.halted {
            return Err(self.halted_error());
        }

        let order = state
            .book
            .cancel(&order_id)
            .ok_or(EngineError::OrderNotFound(order_id))?;
        directory.remove(&order_id);

        let result = CancelResult {
            order_id,
            instrument: self.symbol.to_string(),
            side: order.side,
            price: order.price,
            cancelled_quantity: order.remaining_quantity(),
        };

        dispatcher.publish(MarketEvent::OrderCancelled {
            instrument: result.instrument.clone(),
            order_id,
            side: result.side,
            price: result.price,
            quantity: result.cancelled_quantity,
        });

        tracing::debug!(
            instrument = %self.symbol,
            order_id = %order_id,
            quantity = result.cancelled_quantity,
            "order cancelled"
        );

        Ok(result)
    }

    pub(crate) fn snapshot(&self, depth: usize) -> OrderBookSnapshot {
        let state = self.state.read();
        let mut snapshot = state.book.snapshot(depth);
        snapshot.halted = state.halted;
        snapshot
    }

    fn check_uncrossed(&self, book: &OrderBook) -> Result<(), InvariantViolation> {
        match (book.best_bid(), book.best_ask()) {
            (Some(best_bid), Some(best_ask)) if best_bid >= best_ask => Err(InvariantViolation {
                instrument: self.symbol.to_string(),
                best_bid,
                best_ask,
            }),
            _ => Ok(()),
        }
    }

    fn halted_error(&self) -> EngineError {
        EngineError::InstrumentHalted {
            instrument: self.symbol.to_string(),
        }
    }

    /// Place an order straight into the book, skipping matching
    #[cfg(test)]
    pub(crate) fn inject_resting(&self, order: Order) {
        self.state.write().book.insert(order).unwrap();
    }
}

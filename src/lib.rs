// ============================================================================
// Matching Core Library
// Price-time priority limit order matching across many instruments
// ============================================================================

//! # Matching Core
//!
//! An in-memory limit order matching engine.
//!
//! ## Features
//!
//! - **Price-time priority**: better prices first, FIFO within a price level
//! - **Per-instrument locking**: instruments never block each other
//! - **Fixed-point prices** with no floating-point drift
//! - **Asynchronous notifications** on a dedicated thread, so a slow
//!   downstream never stalls matching
//!
//! ## Example
//!
//! ```rust
//! use matching_core::prelude::*;
//! use std::sync::Arc;
//!
//! let notifier = Arc::new(RecordingNotifier::new());
//! let engine = MatchingEngine::new(EngineConfig::default(), notifier.clone()).unwrap();
//!
//! // Requests usually arrive as text from a transport layer
//! let bid = OrderRequest::parse("BTC-USD", "buy", "50000", "3").unwrap();
//! engine.submit(bid).unwrap();
//!
//! let ask = OrderRequest::sell("BTC-USD", Price::from_integer(49990).unwrap(), 1);
//! let result = engine.submit(ask).unwrap();
//! assert_eq!(result.fills[0].price, Price::from_integer(50000).unwrap());
//!
//! let snapshot = engine.book_snapshot("BTC-USD");
//! println!("Best bid: {:?}", snapshot.best_bid());
//! println!("Best ask: {:?}", snapshot.best_ask());
//!
//! engine.shutdown();
//! assert_eq!(notifier.fills().len(), 1);
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod numeric;

#[cfg(feature = "logging")]
pub mod telemetry;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        DepthLevel, EngineConfig, Fill, InstrumentConfig, OrderBookSnapshot, OrderId,
        OrderRequest, Side,
    };
    pub use crate::engine::{
        create_from_config, CancelResult, EngineError, MatchingEngine, MatchingEngineBuilder,
        SubmitResult, ValidationError,
    };
    pub use crate::interfaces::{
        LoggingNotifier, MarketEvent, NoOpNotifier, Notifier, RecordingNotifier,
    };
    pub use crate::numeric::{Price, Quantity};
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_end_to_end_matching() {
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = MatchingEngineBuilder::new()
            .instrument("BTC-USD")
            .auto_create(false)
            .notifier(notifier.clone())
            .build()
            .unwrap();

        // Add sell order
        let sell = OrderRequest::parse("BTC-USD", "sell", "50000.5", "2").unwrap();
        let sell_result = engine.submit(sell).unwrap();
        assert_eq!(sell_result.resting_quantity, 2);

        // Add matching buy order
        let buy = OrderRequest::parse("BTC-USD", "BID", "50001", "2").unwrap();
        let buy_result = engine.submit(buy).unwrap();

        // Verify trade occurred at the resting price
        assert_eq!(buy_result.filled_quantity, 2);
        assert!(buy_result.is_fully_filled());
        assert_eq!(buy_result.fills[0].price.to_string(), "50000.5");
        assert_eq!(buy_result.fills[0].maker_order_id, sell_result.order_id);

        // Verify book is empty
        let snapshot = engine.book_snapshot("BTC-USD");
        assert_eq!(snapshot.bids.len(), 0);
        assert_eq!(snapshot.asks.len(), 0);

        engine.shutdown();
        assert_eq!(notifier.fills(), buy_result.fills);
    }

    #[test]
    fn test_wire_side_rejected_before_submission() {
        let err = OrderRequest::parse("BTC-USD", "hold", "1", "1").unwrap_err();
        assert_eq!(err, ValidationError::InvalidSide("hold".to_string()));

        let engine_err: EngineError = err.into();
        assert!(engine_err.is_recoverable());
    }

    #[test]
    fn test_engine_shared_across_threads() {
        let engine = Arc::new(MatchingEngine::new(EngineConfig::default(), Arc::new(NoOpNotifier)).unwrap());
        let price = Price::from_integer(10).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        engine.submit(OrderRequest::buy("ETH-USD", price, 1)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = engine.book_snapshot("ETH-USD");
        assert_eq!(snapshot.bids[0].quantity, 400);
        assert_eq!(snapshot.bids[0].order_count, 400);
    }
}

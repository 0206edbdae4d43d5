// ============================================================================
// Engine Errors
// Failure taxonomy for submission, cancellation and startup
// ============================================================================
//
// - ValidationError: caller's fault, raised before any book is touched
// - EngineError::OrderNotFound: caller's fault, nothing mutated
// - InvariantViolation: a crossed book survived a matching cycle; the
//   instrument is halted because its state can no longer be trusted
// - ConfigError / StartupError: raised while building the engine

use crate::domain::OrderId;
use crate::numeric::Price;
use thiserror::Error;

/// Rejections produced while admitting an order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid side: {0:?} (expected buy or sell)")]
    InvalidSide(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("unknown instrument: {0:?}")]
    UnknownInstrument(String),
}

/// A crossed book observed after a matching cycle completed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("crossed book on {instrument}: best bid {best_bid} >= best ask {best_ask}")]
pub struct InvariantViolation {
    pub instrument: String,
    pub best_bid: Price,
    pub best_ask: Price,
}

/// Errors returned by `MatchingEngine` operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The order does not exist, or was already filled or cancelled
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Matching on the instrument stopped after an invariant violation
    #[error("matching halted on {instrument}")]
    InstrumentHalted { instrument: String },

    #[error(transparent)]
    InvariantViolation(#[from] InvariantViolation),
}

impl EngineError {
    /// True when the caller can fix the request and try again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_) | EngineError::OrderNotFound(_)
        )
    }
}

/// Invalid engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("instrument symbol cannot be empty")]
    EmptySymbol,

    #[error("instrument {0} configured more than once")]
    DuplicateInstrument(String),

    #[error("tick size for {symbol} must be positive, got {tick}")]
    InvalidTickSize { symbol: String, tick: Price },

    #[error("lot size for {symbol} must be positive")]
    InvalidLotSize { symbol: String },

    #[error("notification capacity must be positive")]
    InvalidCapacity,

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Errors raised while starting the engine
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to start notification dispatcher: {0}")]
    Dispatcher(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        let validation: EngineError = ValidationError::InvalidPrice("-1".to_string()).into();
        assert!(validation.is_recoverable());
        assert!(EngineError::OrderNotFound(OrderId::new()).is_recoverable());

        let violation = EngineError::from(InvariantViolation {
            instrument: "BTC-USD".to_string(),
            best_bid: Price::from_integer(101).unwrap(),
            best_ask: Price::from_integer(100).unwrap(),
        });
        assert!(!violation.is_recoverable());
        assert!(!EngineError::InstrumentHalted {
            instrument: "BTC-USD".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_messages() {
        let err = EngineError::from(ValidationError::InvalidSide("hold".to_string()));
        assert_eq!(err.to_string(), "invalid side: \"hold\" (expected buy or sell)");

        let violation = InvariantViolation {
            instrument: "BTC-USD".to_string(),
            best_bid: Price::from_integer(101).unwrap(),
            best_ask: Price::from_integer(100).unwrap(),
        };
        assert_eq!(
            violation.to_string(),
            "crossed book on BTC-USD: best bid 101 >= best ask 100"
        );
    }
}

// ============================================================================
// Engine Builder
// Creates matching engines with proper configuration
// ============================================================================

use crate::domain::{EngineConfig, InstrumentConfig};
use crate::engine::{MatchingEngine, StartupError};
use crate::interfaces::{NoOpNotifier, Notifier};
use std::sync::Arc;

/// Creates a matching engine from configuration
///
/// # Example
/// ```
/// use matching_core::prelude::*;
/// use matching_core::engine::create_from_config;
/// use std::sync::Arc;
///
/// let config = EngineConfig::strict(["AAPL", "MSFT"]);
/// let engine = create_from_config(config, Arc::new(NoOpNotifier)).unwrap();
/// assert_eq!(engine.instruments(), vec!["AAPL", "MSFT"]);
/// ```
pub fn create_from_config(
    config: EngineConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<MatchingEngine, StartupError> {
    MatchingEngine::new(config, notifier)
}

/// Creates a matching engine configured from `MATCHING_*` environment
/// variables
pub fn create_from_env(notifier: Arc<dyn Notifier>) -> Result<MatchingEngine, StartupError> {
    let config = EngineConfig::from_env()?;
    MatchingEngine::new(config, notifier)
}

// ============================================================================
// Builder Pattern
// ============================================================================

/// Builder for creating matching engines with fluent API
///
/// # Example
/// ```
/// use matching_core::prelude::*;
/// use std::sync::Arc;
///
/// let engine = MatchingEngineBuilder::new()
///     .instrument("BTC-USD")
///     .instrument_config(InstrumentConfig::new("ES").with_lot_size(5))
///     .auto_create(false)
///     .notification_capacity(4096)
///     .notifier(Arc::new(LoggingNotifier))
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.instruments(), vec!["BTC-USD", "ES"]);
/// ```
pub struct MatchingEngineBuilder {
    config: EngineConfig,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Default for MatchingEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngineBuilder {
    pub fn new() -> Self {
        Self::from_config(EngineConfig::default())
    }

    /// Start from an existing configuration
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            notifier: None,
        }
    }

    /// Register an instrument with no tick or lot size
    pub fn instrument(self, symbol: impl Into<String>) -> Self {
        self.instrument_config(InstrumentConfig::new(symbol))
    }

    /// Register an instrument with its own admission rules
    pub fn instrument_config(mut self, instrument: InstrumentConfig) -> Self {
        self.config.instruments.push(instrument);
        self
    }

    /// Create books for unknown instruments on first use (default: true)
    pub fn auto_create(mut self, enabled: bool) -> Self {
        self.config.auto_create_instruments = enabled;
        self
    }

    /// Bound the notification buffer; events are dropped when it is full
    pub fn notification_capacity(mut self, capacity: usize) -> Self {
        self.config.notification_capacity = Some(capacity);
        self
    }

    /// Where trades and book updates go (default: discarded)
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the matching engine
    pub fn build(self) -> Result<MatchingEngine, StartupError> {
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(NoOpNotifier));
        create_from_config(self.config, notifier)
    }

    /// Get the configuration without building (for inspection)
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

// ============================================================================
// Engine Configuration
// Instruments, their price/quantity grids, and notification buffering
// ============================================================================

use crate::engine::{ConfigError, ValidationError};
use crate::numeric::{Price, Quantity};
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Comma-separated instrument symbols registered at startup
pub const ENV_INSTRUMENTS: &str = "MATCHING_INSTRUMENTS";
/// Whether unknown instruments get a book on first use (`true`/`false`)
pub const ENV_AUTO_CREATE: &str = "MATCHING_AUTO_CREATE";
/// Capacity of the notification buffer; unset means unbounded
pub const ENV_NOTIFY_CAPACITY: &str = "MATCHING_NOTIFY_CAPACITY";

// ============================================================================
// Instrument Configuration
// ============================================================================

/// Per-instrument admission rules
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstrumentConfig {
    /// The trading instrument (e.g., "BTC-USD", "AAPL")
    pub symbol: String,

    /// Optional: minimum price increment
    /// None means no tick size enforcement
    pub tick_size: Option<Price>,

    /// Optional: minimum quantity increment
    /// None means no lot size enforcement
    pub lot_size: Option<Quantity>,
}

impl InstrumentConfig {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size: None,
            lot_size: None,
        }
    }

    /// Builder method: Set price tick size
    pub fn with_tick_size(mut self, tick: Price) -> Self {
        self.tick_size = Some(tick);
        self
    }

    /// Builder method: Set lot size
    pub fn with_lot_size(mut self, lot: Quantity) -> Self {
        self.lot_size = Some(lot);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }

        if let Some(tick) = self.tick_size {
            if !tick.is_positive() {
                return Err(ConfigError::InvalidTickSize {
                    symbol: self.symbol.clone(),
                    tick,
                });
            }
        }

        if self.lot_size == Some(0) {
            return Err(ConfigError::InvalidLotSize {
                symbol: self.symbol.clone(),
            });
        }

        Ok(())
    }

    /// Check an already range-validated price and quantity against the
    /// instrument's grids.
    pub fn check_grid(&self, price: Price, quantity: Quantity) -> Result<(), ValidationError> {
        if let Some(tick) = self.tick_size {
            if !price.is_multiple_of(tick) {
                return Err(ValidationError::InvalidPrice(format!(
                    "{} is not a multiple of tick size {} on {}",
                    price, tick, self.symbol
                )));
            }
        }

        if let Some(lot) = self.lot_size {
            if quantity % lot != 0 {
                return Err(ValidationError::InvalidQuantity(format!(
                    "{} is not a multiple of lot size {} on {}",
                    quantity, lot, self.symbol
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Engine Configuration
// ============================================================================

/// Engine-wide settings.
///
/// Notifications are unbounded by default: no event is ever dropped, but a
/// notifier that falls behind lets the dispatcher queue, and the process's
/// memory, grow for as long as it stays behind. Deployments with an
/// untrusted or remote notifier should set `notification_capacity` (or
/// `MATCHING_NOTIFY_CAPACITY`) and watch `dropped_notifications()`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Instruments whose books are created at engine start
    pub instruments: Vec<InstrumentConfig>,

    /// Create a book with default rules the first time an unknown
    /// instrument is submitted to. When false, such orders are rejected.
    pub auto_create_instruments: bool,

    /// Bound on queued notifications. None (the default) means unbounded,
    /// trading memory for completeness; when bounded, a full buffer drops
    /// the event instead of stalling matching.
    pub notification_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instruments: Vec::new(),
            auto_create_instruments: true,
            notification_capacity: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: Register an instrument at startup
    pub fn with_instrument(mut self, instrument: InstrumentConfig) -> Self {
        self.instruments.push(instrument);
        self
    }

    /// Builder method: Toggle book creation on first use
    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create_instruments = enabled;
        self
    }

    /// Builder method: Bound the notification buffer
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = Some(capacity);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            instrument.validate()?;
            if !seen.insert(instrument.symbol.as_str()) {
                return Err(ConfigError::DuplicateInstrument(instrument.symbol.clone()));
            }
        }

        if self.notification_capacity == Some(0) {
            return Err(ConfigError::InvalidCapacity);
        }

        Ok(())
    }

    /// Fixed instrument list, no auto-creation
    pub fn strict<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instruments: symbols.into_iter().map(InstrumentConfig::new).collect(),
            auto_create_instruments: false,
            notification_capacity: None,
        }
    }

    /// Load from `MATCHING_*` environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_INSTRUMENTS) {
            config.instruments = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(InstrumentConfig::new)
                .collect();
        }

        if let Some(raw) = lookup(ENV_AUTO_CREATE) {
            config.auto_create_instruments = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: ENV_AUTO_CREATE,
                        value: raw,
                    })
                }
            };
        }

        if let Some(raw) = lookup(ENV_NOTIFY_CAPACITY) {
            let capacity = raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_NOTIFY_CAPACITY,
                value: raw.clone(),
            })?;
            config.notification_capacity = Some(capacity);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.instruments.is_empty());
        assert!(config.auto_create_instruments);
        assert_eq!(config.notification_capacity, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_instrument(
                InstrumentConfig::new("AAPL")
                    .with_tick_size(Price::from_parts(0, 1_000_000).unwrap())
                    .with_lot_size(100),
            )
            .with_auto_create(false)
            .with_notification_capacity(1024);

        assert_eq!(config.instruments[0].lot_size, Some(100));
        assert!(!config.auto_create_instruments);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let empty = EngineConfig::new().with_instrument(InstrumentConfig::new("  "));
        assert_eq!(empty.validate(), Err(ConfigError::EmptySymbol));

        let duplicate = EngineConfig::strict(["BTC-USD", "BTC-USD"]);
        assert_eq!(
            duplicate.validate(),
            Err(ConfigError::DuplicateInstrument("BTC-USD".to_string()))
        );

        let zero_lot = EngineConfig::new().with_instrument(InstrumentConfig::new("X").with_lot_size(0));
        assert!(matches!(zero_lot.validate(), Err(ConfigError::InvalidLotSize { .. })));

        let bad_tick = EngineConfig::new()
            .with_instrument(InstrumentConfig::new("X").with_tick_size(Price::ZERO));
        assert!(matches!(bad_tick.validate(), Err(ConfigError::InvalidTickSize { .. })));

        let zero_capacity = EngineConfig::new().with_notification_capacity(0);
        assert_eq!(zero_capacity.validate(), Err(ConfigError::InvalidCapacity));
    }

    #[test]
    fn test_grid_checks() {
        let instrument = InstrumentConfig::new("ES")
            .with_tick_size(Price::from_parts(0, 25_000_000).unwrap())
            .with_lot_size(5);

        assert!(instrument
            .check_grid(Price::from_parts(100, 75_000_000).unwrap(), 10)
            .is_ok());
        assert!(matches!(
            instrument.check_grid(Price::from_parts(100, 10_000_000).unwrap(), 10),
            Err(ValidationError::InvalidPrice(_))
        ));
        assert!(matches!(
            instrument.check_grid(Price::from_integer(100).unwrap(), 7),
            Err(ValidationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_INSTRUMENTS, "BTC-USD, ETH-USD,,"),
            (ENV_AUTO_CREATE, "false"),
            (ENV_NOTIFY_CAPACITY, "256"),
        ]))
        .unwrap();

        let symbols: Vec<&str> = config.instruments.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC-USD", "ETH-USD"]);
        assert!(!config.auto_create_instruments);
        assert_eq!(config.notification_capacity, Some(256));

        let unset = EngineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(unset, EngineConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_AUTO_CREATE, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: ENV_AUTO_CREATE, .. }));

        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_NOTIFY_CAPACITY, "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: ENV_NOTIFY_CAPACITY, .. }));

        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_NOTIFY_CAPACITY, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidCapacity);
    }
}

// ============================================================================
// Order Domain Model
// ============================================================================

use crate::engine::ValidationError;
use crate::numeric::{Price, Quantity};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order of this side trades against
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "bid" | "b" => Ok(Side::Buy),
            "sell" | "ask" | "s" => Ok(Side::Sell),
            _ => Err(ValidationError::InvalidSide(s.to_string())),
        }
    }
}

// ============================================================================
// Order Request
// ============================================================================

/// A submitter's intent to trade, before the engine has admitted it.
///
/// Nothing here is trusted: the engine validates every field before the
/// request touches a book.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderRequest {
    pub instrument: String,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

impl OrderRequest {
    pub fn new(instrument: impl Into<String>, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            instrument: instrument.into(),
            side,
            price,
            quantity,
        }
    }

    pub fn buy(instrument: impl Into<String>, price: Price, quantity: Quantity) -> Self {
        Self::new(instrument, Side::Buy, price, quantity)
    }

    pub fn sell(instrument: impl Into<String>, price: Price, quantity: Quantity) -> Self {
        Self::new(instrument, Side::Sell, price, quantity)
    }

    /// Build a request from the untyped fields a transport hands over.
    ///
    /// Only the shape of each field is checked here; range checks
    /// (positive price, positive quantity, tick and lot grids) happen on
    /// submission.
    pub fn parse(
        instrument: &str,
        side: &str,
        price: &str,
        quantity: &str,
    ) -> Result<Self, ValidationError> {
        let side = side.parse::<Side>()?;
        let price = price
            .parse::<Price>()
            .map_err(|e| ValidationError::InvalidPrice(format!("{:?}: {}", price, e)))?;
        let quantity = quantity.trim().parse::<Quantity>().map_err(|_| {
            ValidationError::InvalidQuantity(format!("{:?} is not a whole number of units", quantity))
        })?;

        Ok(Self::new(instrument.trim(), side, price, quantity))
    }
}

// ============================================================================
// Resting Order Entity
// ============================================================================

/// An admitted order.
///
/// Identity, side and price never change after admission. Only the matching
/// engine reduces `remaining_quantity`, and it does so while holding the
/// instrument's write lock, so no atomics are needed here.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub instrument: Arc<str>,
    pub side: Side,
    pub price: Price,
    pub original_quantity: Quantity,
    pub arrival_sequence: u64,
    pub timestamp: DateTime<Utc>,
    remaining_quantity: Quantity,
}

impl Order {
    pub fn new(
        instrument: Arc<str>,
        side: Side,
        price: Price,
        quantity: Quantity,
        arrival_sequence: u64,
    ) -> Self {
        Self {
            id: OrderId::new(),
            instrument,
            side,
            price,
            original_quantity: quantity,
            arrival_sequence,
            timestamp: Utc::now(),
            remaining_quantity: quantity,
        }
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.original_quantity - self.remaining_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Reduce the remaining quantity by a fill.
    ///
    /// Returns false, leaving the order untouched, if `quantity` exceeds what
    /// is left.
    pub fn fill(&mut self, quantity: Quantity) -> bool {
        match self.remaining_quantity.checked_sub(quantity) {
            Some(rest) => {
                self.remaining_quantity = rest;
                true
            }
            None => false,
        }
    }
}

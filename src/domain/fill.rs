// ============================================================================
// Fill Domain Model
// ============================================================================

use super::{OrderId, Side};
use crate::numeric::{NumericResult, Price, Quantity};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One matched quantity between a buy and a sell order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fill {
    /// Unique trade identifier
    pub trade_id: Uuid,

    pub instrument: String,

    pub buy_order_id: OrderId,

    pub sell_order_id: OrderId,

    /// The order that was resting in the book
    pub maker_order_id: OrderId,

    /// Side of the incoming order that triggered the fill
    pub aggressor_side: Side,

    /// Execution price, always the resting order's price
    pub price: Price,

    pub quantity: Quantity,

    /// Per-instrument trade counter, starts at 1 and has no gaps
    pub sequence_number: u64,

    pub timestamp: DateTime<Utc>,
}

impl Fill {
    pub fn new(
        instrument: String,
        aggressor_side: Side,
        taker_order_id: OrderId,
        maker_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        sequence_number: u64,
    ) -> Self {
        let (buy_order_id, sell_order_id) = match aggressor_side {
            Side::Buy => (taker_order_id, maker_order_id),
            Side::Sell => (maker_order_id, taker_order_id),
        };

        Self {
            trade_id: Uuid::new_v4(),
            instrument,
            buy_order_id,
            sell_order_id,
            maker_order_id,
            aggressor_side,
            price,
            quantity,
            sequence_number,
            timestamp: Utc::now(),
        }
    }

    /// The incoming order's id
    pub fn taker_order_id(&self) -> OrderId {
        match self.aggressor_side {
            Side::Buy => self.buy_order_id,
            Side::Sell => self.sell_order_id,
        }
    }

    /// price * quantity
    pub fn notional_value(&self) -> NumericResult<Price> {
        self.price.checked_notional(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_assigns_buy_and_sell_ids() {
        let taker = OrderId::new();
        let maker = OrderId::new();
        let fill = Fill::new(
            "BTC-USD".to_string(),
            Side::Sell,
            taker,
            maker,
            Price::from_integer(100).unwrap(),
            6,
            1,
        );

        assert_eq!(fill.buy_order_id, maker);
        assert_eq!(fill.sell_order_id, taker);
        assert_eq!(fill.taker_order_id(), taker);
        assert_eq!(fill.notional_value().unwrap(), Price::from_integer(600).unwrap());
    }
}

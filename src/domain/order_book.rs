// ============================================================================
// Order Book Domain Model
// ============================================================================

use super::{Order, OrderId, PriceLevel, Side};
use crate::numeric::{Price, Quantity};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Book Side
// ============================================================================

/// One side of the book (bids or asks).
///
/// Levels are kept in a BTreeMap keyed by price; the best level is the last
/// entry for bids and the first entry for asks, so best-price lookup is
/// O(log n). The side keeps a running total of resting quantity, which
/// never exceeds `Quantity::MAX`.
#[derive(Debug, Clone)]
pub struct OrderBookSide {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
    total_quantity: Quantity,
}

impl OrderBookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            total_quantity: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Whether `quantity` more can rest on this side without the running
    /// total overflowing.
    pub fn has_room_for(&self, quantity: Quantity) -> bool {
        self.total_quantity.checked_add(quantity).is_some()
    }

    fn insert(&mut self, order: Order) -> Result<(), Order> {
        // a level never holds more than its side, so the side check covers both
        let Some(total) = self.total_quantity.checked_add(order.remaining_quantity()) else {
            return Err(order);
        };

        let price = order.price;
        let pushed = self
            .levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .push_back(order);
        match pushed {
            Ok(()) => {
                self.total_quantity = total;
                Ok(())
            }
            Err(order) => {
                self.drop_level_if_empty(price);
                Err(order)
            }
        }
    }

    fn release(&mut self, quantity: Quantity) {
        self.total_quantity = self.total_quantity.saturating_sub(quantity);
    }

    /// Best (top-of-book) price
    pub fn best_price(&self) -> Option<Price> {
        self.best_level().map(PriceLevel::price)
    }

    pub fn best_level(&self) -> Option<&PriceLevel> {
        match self.side {
            Side::Buy => self.levels.values().next_back(),
            Side::Sell => self.levels.values().next(),
        }
    }

    fn best_level_mut(&mut self) -> Option<&mut PriceLevel> {
        match self.side {
            Side::Buy => self.levels.values_mut().next_back(),
            Side::Sell => self.levels.values_mut().next(),
        }
    }

    fn drop_level_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Levels from best to worst
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    /// Aggregated depth, best-first, limited to `num_levels`
    pub fn depth(&self, num_levels: usize) -> Vec<DepthLevel> {
        self.levels()
            .take(num_levels)
            .map(|level| DepthLevel {
                price: level.price(),
                quantity: level.total_quantity(),
                order_count: level.order_count(),
            })
            .collect()
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }
}

// ============================================================================
// Order Book
// ============================================================================

/// Outcome of filling the front order of the best level on one side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakerFill {
    pub order_id: OrderId,
    pub price: Price,
    pub remaining_quantity: Quantity,
}

/// Resting liquidity for a single instrument.
///
/// Besides the two sides, the book keeps a locator from order id to
/// (side, price) so a cancel goes straight to the right level.
#[derive(Debug, Clone)]
pub struct OrderBook {
    instrument: Arc<str>,
    bids: OrderBookSide,
    asks: OrderBookSide,
    locator: HashMap<OrderId, (Side, Price)>,
}

impl OrderBook {
    pub fn new(instrument: Arc<str>) -> Self {
        Self {
            instrument,
            bids: OrderBookSide::new(Side::Buy),
            asks: OrderBookSide::new(Side::Sell),
            locator: HashMap::new(),
        }
    }

    pub fn instrument(&self) -> &Arc<str> {
        &self.instrument
    }

    pub fn side(&self, side: Side) -> &OrderBookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut OrderBookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Add an order at the tail of its price level, creating the level if
    /// needed.
    ///
    /// Fails, handing the order back and leaving the book untouched, when the
    /// side's resting total would overflow.
    pub fn insert(&mut self, order: Order) -> Result<(), Order> {
        let (id, side, price) = (order.id, order.side, order.price);
        self.side_mut(side).insert(order)?;
        self.locator.insert(id, (side, price));
        Ok(())
    }

    /// Whether an order of `quantity` can rest on `side`
    pub fn has_room_for(&self, side: Side, quantity: Quantity) -> bool {
        self.side(side).has_room_for(quantity)
    }

    pub fn best_price(&self, side: Side) -> Option<Price> {
        self.side(side).best_price()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Front order of the best level on `side`
    pub fn peek_best(&self, side: Side) -> Option<&Order> {
        self.side(side).best_level().and_then(PriceLevel::front)
    }

    /// Pop the front order of the best level on `side`, dropping the level
    /// once it is empty.
    pub fn remove_best(&mut self, side: Side) -> Option<Order> {
        let book_side = self.side_mut(side);
        let level = book_side.best_level_mut()?;
        let price = level.price();
        let order = level.pop_front();
        book_side.drop_level_if_empty(price);

        let order = order?;
        book_side.release(order.remaining_quantity());
        self.locator.remove(&order.id);
        Some(order)
    }

    /// Fill the front order of the best level on `side` by `quantity`.
    ///
    /// An order that reaches zero is removed together with its level if the
    /// level empties. Returns `None` when the side is empty or the quantity
    /// exceeds the front order.
    pub fn fill_best(&mut self, side: Side, quantity: Quantity) -> Option<MakerFill> {
        let book_side = self.side_mut(side);
        let level = book_side.best_level_mut()?;
        let price = level.price();
        let order_id = level.front()?.id;
        let remaining_quantity = level.fill_front(quantity)?;
        book_side.release(quantity);

        if remaining_quantity == 0 {
            self.remove_best(side);
        }

        Some(MakerFill {
            order_id,
            price,
            remaining_quantity,
        })
    }

    /// Remove a specific resting order.
    pub fn cancel(&mut self, order_id: &OrderId) -> Option<Order> {
        let (side, price) = self.locator.get(order_id).copied()?;
        let book_side = self.side_mut(side);
        let order = book_side.level_mut(price)?.remove(order_id);
        book_side.drop_level_if_empty(price);
        if let Some(order) = &order {
            book_side.release(order.remaining_quantity());
        }

        if order.is_some() {
            self.locator.remove(order_id);
        }
        order
    }

    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        let (side, price) = self.locator.get(order_id)?;
        self.side(*side)
            .levels
            .get(price)?
            .iter()
            .find(|o| &o.id == order_id)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.locator.contains_key(order_id)
    }

    pub fn order_count(&self) -> usize {
        self.locator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// True when best bid >= best ask. Never observable outside a matching
    /// cycle.
    pub fn is_crossed(&self) -> bool {
        matches!(
            (self.best_bid(), self.best_ask()),
            (Some(bid), Some(ask)) if bid >= ask
        )
    }

    pub fn snapshot(&self, depth: usize) -> OrderBookSnapshot {
        OrderBookSnapshot::with_depth(
            self.instrument.to_string(),
            self.bids.depth(depth),
            self.asks.depth(depth),
        )
    }
}

// ============================================================================
// Order Book Snapshot
// ============================================================================

/// Aggregated view of one price level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: usize,
}

/// Immutable snapshot of the order book, aggregated by price, best-first
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderBookSnapshot {
    pub instrument: String,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    /// Current spread (ask - bid)
    pub spread: Option<Price>,
    /// Set when matching on the instrument has been halted
    pub halted: bool,
}

impl OrderBookSnapshot {
    pub fn empty(instrument: String) -> Self {
        Self {
            instrument,
            bids: Vec::new(),
            asks: Vec::new(),
            spread: None,
            halted: false,
        }
    }

    pub fn with_depth(instrument: String, bids: Vec<DepthLevel>, asks: Vec<DepthLevel>) -> Self {
        let spread = match (bids.first(), asks.first()) {
            (Some(bid), Some(ask)) => ask.price.checked_sub(bid.price).ok(),
            _ => None,
        };

        Self {
            instrument,
            bids,
            asks,
            spread,
            halted: false,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|level| level.price)
    }

    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids
            .iter()
            .fold(0, |total: Quantity, level| total.saturating_add(level.quantity))
    }

    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks
            .iter()
            .fold(0, |total: Quantity, level| total.saturating_add(level.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(value: i64) -> Price {
        Price::from_integer(value).unwrap()
    }

    fn book() -> OrderBook {
        OrderBook::new(Arc::from("BTC-USD"))
    }

    fn order(side: Side, price: i64, quantity: Quantity, seq: u64) -> Order {
        Order::new(Arc::from("BTC-USD"), side, px(price), quantity, seq)
    }

    #[test]
    fn test_best_prices() {
        let mut book = book();
        book.insert(order(Side::Buy, 100, 1, 1)).unwrap();
        book.insert(order(Side::Buy, 101, 1, 2)).unwrap();
        book.insert(order(Side::Sell, 105, 1, 3)).unwrap();
        book.insert(order(Side::Sell, 103, 1, 4)).unwrap();

        // Best bid is the highest price, best ask the lowest
        assert_eq!(book.best_bid(), Some(px(101)));
        assert_eq!(book.best_ask(), Some(px(103)));
        assert!(!book.is_crossed());
    }

    #[test]
    fn test_remove_best_drops_empty_level() {
        let mut book = book();
        let first = order(Side::Sell, 100, 2, 1);
        let first_id = first.id;
        book.insert(first).unwrap();
        book.insert(order(Side::Sell, 101, 3, 2)).unwrap();

        let popped = book.remove_best(Side::Sell).unwrap();
        assert_eq!(popped.id, first_id);
        assert_eq!(book.best_ask(), Some(px(101)));
        assert_eq!(book.side(Side::Sell).level_count(), 1);
        assert!(!book.contains(&first_id));
        assert!(book.remove_best(Side::Buy).is_none());
    }

    #[test]
    fn test_fill_best_partial_then_full() {
        let mut book = book();
        let maker = order(Side::Buy, 100, 10, 1);
        let maker_id = maker.id;
        book.insert(maker).unwrap();

        let partial = book.fill_best(Side::Buy, 6).unwrap();
        assert_eq!(partial.order_id, maker_id);
        assert_eq!(partial.remaining_quantity, 4);
        assert_eq!(book.order(&maker_id).map(Order::remaining_quantity), Some(4));

        let full = book.fill_best(Side::Buy, 4).unwrap();
        assert_eq!(full.remaining_quantity, 0);
        assert!(book.is_empty());
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_cancel() {
        let mut book = book();
        let a = order(Side::Buy, 100, 1, 1);
        let b = order(Side::Buy, 100, 2, 2);
        let a_id = a.id;
        book.insert(a).unwrap();
        book.insert(b).unwrap();

        let cancelled = book.cancel(&a_id).unwrap();
        assert_eq!(cancelled.remaining_quantity(), 1);
        assert_eq!(book.side(Side::Buy).total_quantity(), 2);

        // second cancel of the same id misses and leaves the book alone
        assert!(book.cancel(&a_id).is_none());
        assert_eq!(book.order_count(), 1);
        assert!(book.cancel(&OrderId::new()).is_none());
    }

    #[test]
    fn test_depth_is_best_first() {
        let mut book = book();
        book.insert(order(Side::Buy, 99, 1, 1)).unwrap();
        book.insert(order(Side::Buy, 100, 2, 2)).unwrap();
        book.insert(order(Side::Buy, 100, 3, 3)).unwrap();
        book.insert(order(Side::Sell, 102, 4, 4)).unwrap();
        book.insert(order(Side::Sell, 101, 5, 5)).unwrap();

        let snapshot = book.snapshot(10);
        assert_eq!(
            snapshot.bids,
            vec![
                DepthLevel { price: px(100), quantity: 5, order_count: 2 },
                DepthLevel { price: px(99), quantity: 1, order_count: 1 },
            ]
        );
        assert_eq!(snapshot.best_ask(), Some(px(101)));
        assert_eq!(snapshot.spread, Some(px(1)));
        assert_eq!(snapshot.total_ask_quantity(), 9);

        assert_eq!(book.snapshot(1).bids.len(), 1);
    }

    #[test]
    fn test_insert_refuses_overflowing_side() {
        let mut book = book();
        book.insert(order(Side::Buy, 100, u64::MAX, 1)).unwrap();
        let before = book.snapshot(usize::MAX);

        let same_level = order(Side::Buy, 100, 1, 2);
        let same_level_id = same_level.id;
        assert!(book.insert(same_level).is_err());
        assert!(book.insert(order(Side::Buy, 99, 1, 3)).is_err());

        assert!(!book.contains(&same_level_id));
        assert_eq!(book.order_count(), 1);
        assert_eq!(book.snapshot(usize::MAX), before);
        assert!(!book.has_room_for(Side::Buy, 1));
        assert!(book.has_room_for(Side::Sell, u64::MAX));

        // filling frees room again
        book.fill_best(Side::Buy, 5).unwrap();
        assert!(book.has_room_for(Side::Buy, 5));
        assert!(!book.has_room_for(Side::Buy, 6));
        assert_eq!(book.side(Side::Buy).total_quantity(), u64::MAX - 5);
    }

    #[test]
    fn test_snapshot_totals_saturate() {
        let snapshot = OrderBookSnapshot::with_depth(
            "BTC-USD".to_string(),
            vec![
                DepthLevel { price: px(100), quantity: u64::MAX, order_count: 1 },
                DepthLevel { price: px(99), quantity: 1, order_count: 1 },
            ],
            Vec::new(),
        );
        assert_eq!(snapshot.total_bid_quantity(), u64::MAX);
    }
}

// ============================================================================
// Price/Time Priority Matching (FIFO)
// Crosses an incoming order against the opposite side of one book
// ============================================================================

use crate::domain::{Fill, Order, OrderBook, Side};
use crate::numeric::Price;

/// Whether an incoming order at `incoming_price` can trade against a resting
/// order at `book_price`.
#[inline]
pub fn prices_cross(incoming_side: Side, incoming_price: Price, book_price: Price) -> bool {
    match incoming_side {
        Side::Buy => incoming_price >= book_price,
        Side::Sell => incoming_price <= book_price,
    }
}

/// Match `incoming` against the opposite side of `book`.
///
/// Better prices always trade first; within a level, earlier arrivals trade
/// first. Every fill executes at the resting order's price. Resting orders
/// that reach zero are removed; `incoming` is left with whatever could not
/// be matched, and the caller decides whether it rests.
///
/// `next_sequence` is the instrument's trade counter and is advanced once per
/// fill.
///
/// # Example
/// ```text
/// Book:  ask 100 x 1 (A, seq 1)
///        ask 100 x 2 (B, seq 2)
///        ask 101 x 5 (C, seq 3)
///
/// Incoming: buy 4 @ 101
/// Result:   1 @ 100 with A, 2 @ 100 with B, 1 @ 101 with C
/// ```
pub fn match_order(book: &mut OrderBook, incoming: &mut Order, next_sequence: &mut u64) -> Vec<Fill> {
    let resting_side = incoming.side.opposite();
    let mut fills = Vec::new();

    while !incoming.is_filled() {
        let Some(maker) = book.peek_best(resting_side) else {
            break;
        };

        if !prices_cross(incoming.side, incoming.price, maker.price) {
            break;
        }

        let trade_quantity = incoming.remaining_quantity().min(maker.remaining_quantity());
        let Some(maker_fill) = book.fill_best(resting_side, trade_quantity) else {
            break;
        };
        if !incoming.fill(trade_quantity) {
            break;
        }

        *next_sequence += 1;
        fills.push(Fill::new(
            book.instrument().to_string(),
            incoming.side,
            incoming.id,
            maker_fill.order_id,
            maker_fill.price,
            trade_quantity,
            *next_sequence,
        ));
    }

    fills
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Quantity;
    use std::sync::Arc;

    fn px(value: i64) -> Price {
        Price::from_integer(value).unwrap()
    }

    struct Harness {
        book: OrderBook,
        arrivals: u64,
        trades: u64,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                book: OrderBook::new(Arc::from("BTC-USD")),
                arrivals: 0,
                trades: 0,
            }
        }

        fn order(&mut self, side: Side, price: i64, quantity: Quantity) -> Order {
            self.arrivals += 1;
            Order::new(Arc::from("BTC-USD"), side, px(price), quantity, self.arrivals)
        }

        fn rest(&mut self, side: Side, price: i64, quantity: Quantity) -> Order {
            let order = self.order(side, price, quantity);
            self.book.insert(order.clone()).unwrap();
            order
        }

        fn incoming(&mut self, side: Side, price: i64, quantity: Quantity) -> (Order, Vec<Fill>) {
            let mut order = self.order(side, price, quantity);
            let fills = match_order(&mut self.book, &mut order, &mut self.trades);
            (order, fills)
        }
    }

    #[test]
    fn test_prices_cross() {
        assert!(prices_cross(Side::Buy, px(100), px(100)));
        assert!(prices_cross(Side::Buy, px(101), px(100)));
        assert!(!prices_cross(Side::Buy, px(99), px(100)));
        assert!(prices_cross(Side::Sell, px(99), px(100)));
        assert!(!prices_cross(Side::Sell, px(101), px(100)));
    }

    #[test]
    fn test_fifo_within_level() {
        let mut h = Harness::new();
        let first = h.rest(Side::Sell, 100, 1);
        let second = h.rest(Side::Sell, 100, 1);

        let (_, fills) = h.incoming(Side::Buy, 100, 1);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].maker_order_id, first.id);
        assert!(h.book.contains(&second.id));
    }

    #[test]
    fn test_executes_at_resting_price() {
        let mut h = Harness::new();
        h.rest(Side::Buy, 100, 5);

        let (incoming, fills) = h.incoming(Side::Sell, 95, 5);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, px(100));
        assert_eq!(fills[0].sell_order_id, incoming.id);
        assert!(incoming.is_filled());
    }

    #[test]
    fn test_sweeps_levels_in_price_order() {
        let mut h = Harness::new();
        let a = h.rest(Side::Sell, 100, 1);
        let b = h.rest(Side::Sell, 100, 2);
        let c = h.rest(Side::Sell, 101, 5);
        h.rest(Side::Sell, 102, 5);

        let (incoming, fills) = h.incoming(Side::Buy, 101, 4);

        let summary: Vec<_> = fills.iter().map(|f| (f.maker_order_id, f.price, f.quantity)).collect();
        assert_eq!(
            summary,
            vec![(a.id, px(100), 1), (b.id, px(100), 2), (c.id, px(101), 1)]
        );
        assert!(incoming.is_filled());
        assert_eq!(h.book.order(&c.id).map(Order::remaining_quantity), Some(4));
        assert_eq!(h.book.best_ask(), Some(px(101)));
    }

    #[test]
    fn test_partial_fill_leaves_remainder_with_caller() {
        let mut h = Harness::new();
        h.rest(Side::Sell, 100, 1);

        let (incoming, fills) = h.incoming(Side::Buy, 100, 3);

        assert_eq!(fills.len(), 1);
        assert_eq!(incoming.remaining_quantity(), 2);
        assert!(h.book.side(Side::Sell).is_empty());
    }

    #[test]
    fn test_no_cross_no_fill() {
        let mut h = Harness::new();
        h.rest(Side::Sell, 101, 1);

        let (incoming, fills) = h.incoming(Side::Buy, 100, 1);

        assert!(fills.is_empty());
        assert_eq!(incoming.remaining_quantity(), 1);
        assert_eq!(h.trades, 0);
    }

    #[test]
    fn test_sequence_numbers_continue_across_calls() {
        let mut h = Harness::new();
        for _ in 0..3 {
            h.rest(Side::Buy, 100, 1);
        }

        let (_, first) = h.incoming(Side::Sell, 100, 2);
        let (_, second) = h.incoming(Side::Sell, 100, 1);

        let seqs: Vec<u64> = first.iter().chain(&second).map(|f| f.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }
}

// ============================================================================
// Price Level
// FIFO queue of resting orders at a single price
// ============================================================================

use super::{Order, OrderId};
use crate::numeric::{Price, Quantity};
use std::collections::VecDeque;

/// All resting orders at one price on one side, in arrival order.
///
/// `total_quantity` is kept equal to the sum of the orders' remaining
/// quantities so depth snapshots never walk the queue.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    orders: VecDeque<Order>,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_quantity: 0,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Append at the tail (lowest time priority).
    ///
    /// Hands the order back untouched if the level total would overflow.
    pub fn push_back(&mut self, order: Order) -> Result<(), Order> {
        debug_assert_eq!(order.price, self.price);
        debug_assert!(self
            .orders
            .back()
            .map_or(true, |last| last.arrival_sequence < order.arrival_sequence));

        match self.total_quantity.checked_add(order.remaining_quantity()) {
            Some(total) => {
                self.total_quantity = total;
                self.orders.push_back(order);
                Ok(())
            }
            None => Err(order),
        }
    }

    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn pop_front(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.total_quantity = self.total_quantity.saturating_sub(order.remaining_quantity());
        Some(order)
    }

    /// Fill the front order by `quantity`.
    ///
    /// Returns the front order's remaining quantity afterwards, or `None` if
    /// the level is empty or the fill exceeds the front order.
    pub fn fill_front(&mut self, quantity: Quantity) -> Option<Quantity> {
        let front = self.orders.front_mut()?;
        if !front.fill(quantity) {
            return None;
        }
        self.total_quantity = self.total_quantity.saturating_sub(quantity);
        Some(front.remaining_quantity())
    }

    /// Remove a specific order, wherever it sits in the queue.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| &o.id == order_id)?;
        let order = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(order.remaining_quantity());
        Some(order)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}

//! Customer-facing order numbers derived from creation order.
//!
//! There is no counter: a stall's orders sorted by `(created_at, id)` give
//! each order its position, and the number is `base + position`. Creation
//! timestamps are assigned by the store in commit order, so a new order
//! always sorts last and existing numbers never shift.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument};

use crate::clients::OrderClient;
use crate::domain::Order;
use crate::order_actor::OrderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayNumber {
    Resolved(u64),
    /// The order is not in the stall's set yet; render a placeholder.
    Unresolved,
}

impl DisplayNumber {
    pub fn value(&self) -> Option<u64> {
        match self {
            DisplayNumber::Resolved(n) => Some(*n),
            DisplayNumber::Unresolved => None,
        }
    }
}

impl fmt::Display for DisplayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayNumber::Resolved(n) => write!(f, "#{}", n),
            DisplayNumber::Unresolved => f.write_str("#..."),
        }
    }
}

/// Creation order: oldest first, ties broken by id.
pub fn creation_order(a: &Order, b: &Order) -> Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

fn offset(base: u64, index: usize) -> Option<u64> {
    u64::try_from(index).ok().and_then(|index| base.checked_add(index))
}

/// Unresolved when the order is absent or its number would not fit in a `u64`.
pub fn display_number(orders: &[Order], order_id: &str, base: u64) -> DisplayNumber {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| creation_order(a, b));
    sorted
        .iter()
        .position(|o| o.id == order_id)
        .and_then(|index| offset(base, index))
        .map_or(DisplayNumber::Unresolved, DisplayNumber::Resolved)
}

/// Numbers for every order in one pass, keyed by order id. Orders whose
/// number would overflow are left out.
pub fn display_numbers(orders: &[Order], base: u64) -> HashMap<String, u64> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| creation_order(a, b));
    sorted
        .into_iter()
        .enumerate()
        .filter_map(|(index, order)| offset(base, index).map(|n| (order.id.clone(), n)))
        .collect()
}

/// Resolves display numbers against the order store.
#[derive(Clone)]
pub struct SequencingResolver {
    orders: OrderClient,
    base: u64,
}

impl SequencingResolver {
    pub fn new(orders: OrderClient, base: u64) -> Self {
        Self { orders, base }
    }

    #[instrument(skip(self))]
    pub async fn display_number(&self, stall_id: String, order_id: String) -> Result<DisplayNumber, OrderError> {
        let orders = self.orders.list_by_stall(stall_id).await?;
        let number = display_number(&orders, &order_id, self.base);
        debug!(%number, "Display number resolved");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderLine, OrderStatus, UpdatedBy};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 14, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn order(id: &str, created_at: DateTime<Utc>) -> Order {
        Order {
            id: id.to_string(),
            stall_id: "chaat-101".to_string(),
            items: vec![OrderLine::new("m1", "Pani Puri", Decimal::from(40), 1)],
            subtotal: Decimal::from(40),
            total_amount: Decimal::from(40),
            status: OrderStatus::Verified,
            created_at,
            updated_at: created_at,
            updated_by: UpdatedBy::Customer,
            customer_reference: "123456789012".to_string(),
        }
    }

    #[test]
    fn test_numbers_follow_creation_time_not_storage_order() {
        let orders = vec![order("c", at(30)), order("a", at(10)), order("b", at(20))];
        assert_eq!(display_number(&orders, "a", 100), DisplayNumber::Resolved(100));
        assert_eq!(display_number(&orders, "b", 100), DisplayNumber::Resolved(101));
        assert_eq!(display_number(&orders, "c", 100), DisplayNumber::Resolved(102));
    }

    #[test]
    fn test_ties_broken_by_id() {
        let orders = vec![order("y", at(0)), order("x", at(0))];
        assert_eq!(display_number(&orders, "x", 100), DisplayNumber::Resolved(100));
        assert_eq!(display_number(&orders, "y", 100), DisplayNumber::Resolved(101));
    }

    #[test]
    fn test_missing_order_is_unresolved() {
        let orders = vec![order("a", at(0))];
        let number = display_number(&orders, "zzz", 100);
        assert_eq!(number, DisplayNumber::Unresolved);
        assert_eq!(number.value(), None);
        assert_eq!(number.to_string(), "#...");
        assert_eq!(display_number(&[], "a", 100), DisplayNumber::Unresolved);
    }

    #[test]
    fn test_appending_never_shifts_existing_numbers() {
        let mut orders = vec![order("m", at(0)), order("k", at(5))];
        let before = display_numbers(&orders, 100);
        orders.push(order("a", at(9)));
        let after = display_numbers(&orders, 100);

        assert_eq!(before["m"], after["m"]);
        assert_eq!(before["k"], after["k"]);
        assert_eq!(after["a"], 102);
    }

    #[test]
    fn test_numbers_past_u64_max_are_unresolved() {
        let orders = vec![order("a", at(0)), order("b", at(1))];
        assert_eq!(display_number(&orders, "a", u64::MAX), DisplayNumber::Resolved(u64::MAX));
        assert_eq!(display_number(&orders, "b", u64::MAX), DisplayNumber::Unresolved);

        let all = display_numbers(&orders, u64::MAX);
        assert_eq!(all.len(), 1);
        assert_eq!(all["a"], u64::MAX);
    }
}

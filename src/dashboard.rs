use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Order, OrderStatus};

/// Headline numbers for a vendor's dashboard.
///
/// Cancelled orders are excluded from `total_orders` and `total_revenue`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StallSummary {
    pub total_orders: usize,
    pub total_revenue: Decimal,
    /// VERIFIED or PENDING
    pub open_orders: usize,
    pub completed_orders: usize,
}

impl StallSummary {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut summary = Self::default();
        for order in orders {
            match order.status {
                OrderStatus::Cancelled => continue,
                OrderStatus::Completed => summary.completed_orders += 1,
                OrderStatus::Pending | OrderStatus::Verified => summary.open_orders += 1,
            }
            summary.total_orders += 1;
            summary.total_revenue += order.total_amount;
        }
        summary
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Verified,
    Completed,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Verified => "VERIFIED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Who last wrote an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatedBy {
    Customer,
    Vendor,
}

/// One cart line, priced at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(
        menu_item_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub stall_id: String,
    pub items: Vec<OrderLine>,
    pub subtotal: Decimal,
    /// Equal to `subtotal`; there are no fees or discounts
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: UpdatedBy,
    /// Opaque proof-of-payment reference
    pub customer_reference: String,
}

/// Checkout payload for a new order.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub stall_id: String,
    pub items: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub customer_reference: Option<String>,
}

impl OrderDraft {
    pub fn new(stall_id: impl Into<String>, items: Vec<OrderLine>, subtotal: Decimal) -> Self {
        Self {
            stall_id: stall_id.into(),
            items,
            subtotal,
            customer_reference: None,
        }
    }

    /// Draft whose subtotal is the sum of its lines.
    pub fn from_cart(stall_id: impl Into<String>, items: Vec<OrderLine>) -> Self {
        let subtotal = lines_total(&items);
        Self::new(stall_id, items, subtotal)
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.customer_reference = Some(reference.into());
        self
    }
}

pub fn lines_total(items: &[OrderLine]) -> Decimal {
    items.iter().map(OrderLine::line_total).sum()
}

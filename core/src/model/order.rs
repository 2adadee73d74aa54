// core/src/model/order.rs

use crate::order::status::OrderStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order row. Orders are created `pending` and mutated only through
/// status transitions; they are never deleted (cancellation is a status).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub restaurant_id: Uuid,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
}

/// A line item, snapshotted at order creation. `name_snapshot` and
/// `unit_price_cents` never change afterwards, even when the source menu
/// item is renamed, repriced, or deleted (`menu_item_id` then goes null).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
  pub id: Uuid,
  pub order_id: Uuid,
  pub menu_item_id: Option<Uuid>,
  pub quantity: i32,
  pub name_snapshot: String,
  pub unit_price_cents: i64,
  pub line_subtotal_cents: i64,
}

/// An order with its line items attached.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderLine>,
}

impl OrderDetail {
  pub fn total_cents(&self) -> i64 {
    self.items.iter().map(|line| line.line_subtotal_cents).sum()
  }
}

/// Input for order creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
  pub restaurant_id: Uuid,
  pub items: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderLine {
  pub menu_item_id: Uuid,
  pub quantity: i32,
}

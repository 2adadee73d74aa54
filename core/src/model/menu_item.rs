// core/src/model/menu_item.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
  pub id: Uuid,
  pub restaurant_id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: i64,
  pub available: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMenuItem {
  pub restaurant_id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: i64,
  pub available: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuItemPatch {
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: i64,
  pub available: bool,
}

// core/src/model/restaurant.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `rating_avg` and `rating_count` are denormalized from the restaurant's
/// review set. Invariant: `rating_avg * rating_count` equals the sum of the
/// live ratings and `rating_count` equals their number; every review write
/// refreshes both in the same atomic unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
  pub id: Uuid,
  pub owner_id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub rating_avg: f64,
  pub rating_count: i64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRestaurant {
  pub owner_id: Uuid,
  pub name: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestaurantPatch {
  pub name: String,
  pub description: Option<String>,
}

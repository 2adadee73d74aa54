// core/src/model/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most one review exists per (customer, restaurant) pair; the store
/// enforces that as a uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub restaurant_id: Uuid,
  pub rating: i32,
  pub comment: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
  pub customer_id: Uuid,
  pub restaurant_id: Uuid,
  pub rating: i32,
  pub comment: Option<String>,
}

/// The denormalized pair stored on the restaurant row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingAggregate {
  pub average: f64,
  pub count: i64,
}

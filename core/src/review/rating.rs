// core/src/review/rating.rs

//! Rating aggregation math.
//!
//! Two paths keep a restaurant's `(rating_avg, rating_count)` consistent
//! with its live review set:
//!
//! - [`apply_new_review`] — O(1) running-mean update, valid only for pure
//!   insertions where the previous aggregate was exact.
//! - [`recompute`] — exact aggregate from the full review set; always
//!   correct, and the only safe path after an update or delete.
//!
//! Stores call these inside the same transaction that performs the review
//! write, so the aggregate never drifts from the rows it summarizes.

use crate::error::{CoreError, CoreResult};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Rejects ratings outside `[1, 5]` before any aggregate is touched.
pub fn validate_rating(rating: i32) -> CoreResult<()> {
  if (MIN_RATING..=MAX_RATING).contains(&rating) {
    Ok(())
  } else {
    Err(CoreError::Validation(format!(
      "rating must be between {} and {}, got {}",
      MIN_RATING, MAX_RATING, rating
    )))
  }
}

/// Running-mean update for appending one review to an exact aggregate.
pub fn apply_new_review(prev_avg: f64, prev_count: i64, rating: i32) -> (f64, i64) {
  let count = prev_count + 1;
  let avg = (prev_avg * prev_count as f64 + rating as f64) / count as f64;
  (avg, count)
}

/// Exact aggregate from the sum and count of the live ratings. An empty
/// review set yields `(0.0, 0)`.
pub fn recompute(sum: i64, count: i64) -> (f64, i64) {
  if count > 0 {
    (sum as f64 / count as f64, count)
  } else {
    (0.0, 0)
  }
}

// core/src/review/policy.rs

use crate::error::{CoreError, CoreResult};
use crate::order::status::OrderStatus;

/// Which order statuses qualify a customer to review a restaurant.
///
/// Deliberately a policy parameter rather than a constant; deployments that
/// want reviews to open earlier can include `confirmed` or `preparing`.
#[derive(Debug, Clone)]
pub struct ReviewPolicy {
  qualifying: Vec<OrderStatus>,
}

impl Default for ReviewPolicy {
  fn default() -> Self {
    ReviewPolicy {
      qualifying: vec![OrderStatus::Completed],
    }
  }
}

impl ReviewPolicy {
  pub fn new(qualifying: impl IntoIterator<Item = OrderStatus>) -> CoreResult<Self> {
    let mut statuses: Vec<OrderStatus> = Vec::new();
    for status in qualifying {
      if !statuses.contains(&status) {
        statuses.push(status);
      }
    }
    if statuses.is_empty() {
      return Err(CoreError::Validation(
        "review policy needs at least one qualifying status".to_string(),
      ));
    }
    Ok(ReviewPolicy { qualifying: statuses })
  }

  /// Parses a comma-separated status list, e.g. `"completed"` or
  /// `"completed,preparing"`.
  pub fn from_csv(csv: &str) -> CoreResult<Self> {
    Self::new(
      csv
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<CoreResult<Vec<OrderStatus>>>()?,
    )
  }

  pub fn qualifying(&self) -> &[OrderStatus] {
    &self.qualifying
  }
}

// core/src/order/status.rs

//! The order lifecycle state machine.
//!
//! The transition table is a static lookup keyed by the requesting actor's
//! role. Encoding the policy as data (rather than scattered conditionals)
//! keeps it the single source of truth for both authorization and workflow
//! validity: owners drive fulfillment forward, customers may only abort
//! before fulfillment begins.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Preparing,
  Completed,
  Cancelled,
}

pub const ALL_STATUSES: [OrderStatus; 5] = [
  OrderStatus::Pending,
  OrderStatus::Confirmed,
  OrderStatus::Preparing,
  OrderStatus::Completed,
  OrderStatus::Cancelled,
];

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Preparing => "preparing",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  /// Terminal statuses admit no further transition, for any role.
  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = CoreError;

  fn from_str(s: &str) -> CoreResult<Self> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "confirmed" => Ok(OrderStatus::Confirmed),
      "preparing" => Ok(OrderStatus::Preparing),
      "completed" => Ok(OrderStatus::Completed),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(CoreError::Validation(format!("unknown order status '{}'", other))),
    }
  }
}

/// The actor's role relative to a specific order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Customer,
  Owner,
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Role::Customer => "customer",
      Role::Owner => "owner",
    })
  }
}

/// Statuses `role` may move an order to from `from`. Empty for terminal
/// states and for every customer state past `pending`.
pub fn allowed_targets(role: Role, from: OrderStatus) -> &'static [OrderStatus] {
  match role {
    Role::Owner => match from {
      OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
      OrderStatus::Confirmed => &[OrderStatus::Preparing, OrderStatus::Cancelled],
      OrderStatus::Preparing => &[OrderStatus::Completed, OrderStatus::Cancelled],
      OrderStatus::Completed | OrderStatus::Cancelled => &[],
    },
    Role::Customer => match from {
      OrderStatus::Pending => &[OrderStatus::Cancelled],
      _ => &[],
    },
  }
}

pub fn can_transition(role: Role, from: OrderStatus, to: OrderStatus) -> bool {
  allowed_targets(role, from).contains(&to)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn owner_rows() -> Vec<(OrderStatus, Vec<OrderStatus>)> {
    vec![
      (OrderStatus::Pending, vec![OrderStatus::Confirmed, OrderStatus::Cancelled]),
      (OrderStatus::Confirmed, vec![OrderStatus::Preparing, OrderStatus::Cancelled]),
      (OrderStatus::Preparing, vec![OrderStatus::Completed, OrderStatus::Cancelled]),
      (OrderStatus::Completed, vec![]),
      (OrderStatus::Cancelled, vec![]),
    ]
  }

  #[test]
  fn owner_table_is_exact() {
    for (from, allowed) in owner_rows() {
      for to in ALL_STATUSES {
        assert_eq!(
          can_transition(Role::Owner, from, to),
          allowed.contains(&to),
          "owner {from} -> {to}"
        );
      }
    }
  }

  #[test]
  fn customer_may_only_cancel_pending() {
    for from in ALL_STATUSES {
      for to in ALL_STATUSES {
        let expected = from == OrderStatus::Pending && to == OrderStatus::Cancelled;
        assert_eq!(can_transition(Role::Customer, from, to), expected, "customer {from} -> {to}");
      }
    }
  }

  #[test]
  fn terminal_states_admit_nothing() {
    for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
      assert!(from.is_terminal());
      for role in [Role::Owner, Role::Customer] {
        assert!(allowed_targets(role, from).is_empty());
      }
    }
    assert!(!OrderStatus::Pending.is_terminal());
    assert!(!OrderStatus::Confirmed.is_terminal());
    assert!(!OrderStatus::Preparing.is_terminal());
  }

  #[test]
  fn status_round_trips_through_str() {
    for status in ALL_STATUSES {
      assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
    }
    assert!("shipped".parse::<OrderStatus>().is_err());
  }
}

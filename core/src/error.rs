// core/src/error.rs
use crate::order::status::{OrderStatus, Role};
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Error taxonomy shared by the domain services and the persistence seam.
///
/// Every variant except `Storage` is an expected, recoverable-by-caller
/// condition and must be surfaced to the calling layer, never swallowed.
/// `Storage` wraps unexpected backend failures (connection loss, protocol
/// errors); the core performs no retries on it.
#[derive(Debug, Error)]
pub enum CoreError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("not authorized: {0}")]
  Authorization(String),

  #[error("illegal transition: {role} cannot set {from} -> {to}")]
  InvalidTransition {
    role: Role,
    from: OrderStatus,
    to: OrderStatus,
  },

  #[error("validation error: {0}")]
  Validation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("not eligible: {0}")]
  NotEligible(String),

  #[error("storage failure: {source}")]
  Storage {
    #[source]
    source: AnyhowError,
  },
}

impl CoreError {
  /// Wraps an arbitrary backend error as an infrastructure failure.
  pub fn storage(err: impl Into<AnyhowError>) -> Self {
    CoreError::Storage { source: err.into() }
  }

  pub fn not_found(what: impl Into<String>) -> Self {
    CoreError::NotFound(what.into())
  }
}

pub type CoreResult<T, E = CoreError> = std::result::Result<T, E>;

// core/src/model/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub full_name: Option<String>,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub is_restaurant_owner: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub email: String,
  pub full_name: Option<String>,
  pub password_hash: String,
  pub is_restaurant_owner: bool,
}

/// The authenticated identity behind a request, passed explicitly into every
/// domain operation. The role relative to a concrete order (customer vs
/// owner) is derived per operation, not stored here.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
  pub user_id: Uuid,
  pub is_restaurant_owner: bool,
}

impl From<&User> for Actor {
  fn from(user: &User) -> Self {
    Actor {
      user_id: user.id,
      is_restaurant_owner: user.is_restaurant_owner,
    }
  }
}

// server/src/web/extractors.rs

//! Request extractors.
//!
//! `CurrentUser` resolves the session cookie against the store and hands the
//! handler a full user row. Domain operations never read the session
//! themselves; they take the derived [`Actor`] as an explicit parameter.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use mensa_core::model::{Actor, User};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Name of the HttpOnly cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "mensa_session";

#[derive(Debug)]
pub struct CurrentUser {
  pub user: User,
}

impl CurrentUser {
  pub fn actor(&self) -> Actor {
    Actor::from(&self.user)
  }
}

impl FromRequest for CurrentUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = req.cookie(SESSION_COOKIE).map(|cookie| cookie.value().to_string());

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;
      let token = token.ok_or_else(|| AppError::Auth("Sign in required.".to_string()))?;

      match state.store.session_user(&token).await.map_err(AppError::from)? {
        Some(user) => Ok(CurrentUser { user }),
        None => {
          warn!("CurrentUser extractor: session token did not resolve to a user.");
          Err(AppError::Auth("Invalid or expired session.".to_string()))
        }
      }
    })
  }
}

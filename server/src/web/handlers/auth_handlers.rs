// server/src/web/handlers/auth_handlers.rs

use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};
use mensa_core::model::NewUser;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::{CurrentUser, SESSION_COOKIE};

#[derive(Deserialize, Debug)]
pub struct SignupRequestPayload {
  pub email: String,
  pub password: String,
  pub confirm_password: String,
  pub full_name: Option<String>,
  #[serde(default)]
  pub is_restaurant_owner: bool,
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
  Cookie::build(SESSION_COOKIE, token).path("/").http_only(true).finish()
}

#[instrument(name = "handler::signup", skip(app_state, payload))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let email = payload.email.trim().to_lowercase();

  if email.is_empty() || !email.contains('@') {
    return Err(AppError::Validation("A valid email address is required.".to_string()));
  }
  if payload.password.len() < 8 {
    return Err(AppError::Validation("Use at least 8 characters.".to_string()));
  }
  if payload.password != payload.confirm_password {
    return Err(AppError::Validation("Passwords do not match.".to_string()));
  }

  let password_hash = auth_service::hash_password(&payload.password)?;
  let user = app_state
    .store
    .insert_user(NewUser {
      email,
      full_name: payload.full_name,
      password_hash,
      is_restaurant_owner: payload.is_restaurant_owner,
    })
    .await?;

  info!(user_id = %user.id, "account created");
  Ok(HttpResponse::Created().json(json!({ "user": user })))
}

#[instrument(name = "handler::signin", skip(app_state, payload))]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let email = payload.email.trim().to_lowercase();

  let user = app_state.store.user_by_email(&email).await?;
  // One failure message for both unknown email and wrong password.
  let user = user.ok_or_else(|| AppError::Auth("Invalid email or password.".to_string()))?;
  if !auth_service::verify_password(&user.password_hash, &payload.password)? {
    return Err(AppError::Auth("Invalid email or password.".to_string()));
  }

  let token = app_state.store.create_session(user.id).await?;
  info!(user_id = %user.id, "signed in");
  Ok(HttpResponse::Ok().cookie(session_cookie(token)).json(json!({ "user": user })))
}

#[instrument(name = "handler::signout", skip(app_state, req))]
pub async fn signout_handler(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
  if let Some(cookie) = req.cookie(SESSION_COOKIE) {
    app_state.store.revoke_session(cookie.value()).await?;
  }
  let mut removal = Cookie::new(SESSION_COOKIE, "");
  removal.set_path("/");
  removal.make_removal();
  Ok(HttpResponse::Ok().cookie(removal).json(json!({ "ok": true })))
}

#[instrument(name = "handler::me", skip(current_user), fields(user_id = %current_user.user.id))]
pub async fn me_handler(current_user: CurrentUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(json!({ "user": current_user.user })))
}

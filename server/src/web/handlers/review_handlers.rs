// server/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[derive(Deserialize, Debug)]
pub struct ReviewPayload {
  pub rating: i32,
  pub comment: Option<String>,
}

#[instrument(name = "handler::list_reviews", skip(app_state, path), fields(restaurant_id = %path.as_ref()))]
pub async fn list_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let restaurant_id = path.into_inner();
  if app_state.store.restaurant(restaurant_id).await?.is_none() {
    return Err(AppError::NotFound(format!("Restaurant {} not found.", restaurant_id)));
  }
  let reviews = app_state.reviews.reviews_for(restaurant_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "reviews": reviews })))
}

#[instrument(name = "handler::review_eligibility", skip(app_state, current_user, path), fields(user_id = %current_user.user.id))]
pub async fn review_eligibility_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let eligibility = app_state
    .reviews
    .can_review(current_user.actor(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(eligibility))
}

#[instrument(name = "handler::my_review", skip(app_state, current_user, path), fields(user_id = %current_user.user.id))]
pub async fn my_review_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let review = app_state
    .reviews
    .my_review(current_user.actor(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "review": review })))
}

#[instrument(
  name = "handler::create_review",
  skip(app_state, current_user, path, payload),
  fields(user_id = %current_user.user.id, restaurant_id = %path.as_ref(), rating = payload.rating)
)]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let review = app_state
    .reviews
    .create_review(current_user.actor(), path.into_inner(), payload.rating, payload.comment)
    .await?;
  info!(review_id = %review.id, "review created");
  Ok(HttpResponse::Created().json(json!({ "review": review })))
}

#[instrument(
  name = "handler::update_review",
  skip(app_state, current_user, path, payload),
  fields(user_id = %current_user.user.id, restaurant_id = %path.as_ref(), rating = payload.rating)
)]
pub async fn update_review_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let review = app_state
    .reviews
    .update_review(current_user.actor(), path.into_inner(), payload.rating, payload.comment)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "review": review })))
}

#[instrument(name = "handler::delete_review", skip(app_state, current_user, path), fields(user_id = %current_user.user.id))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  app_state
    .reviews
    .delete_review(current_user.actor(), path.into_inner())
    .await?;
  Ok(HttpResponse::NoContent().finish())
}

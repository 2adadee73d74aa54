// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use mensa_core::model::CreateOrder;
use mensa_core::OrderStatus;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[derive(Deserialize, Debug)]
pub struct UpdateOrderStatusPayload {
  pub status: OrderStatus,
}

#[derive(Deserialize, Debug)]
pub struct RestaurantOrdersQuery {
  pub status: Option<OrderStatus>,
}

#[instrument(name = "handler::create_order", skip(app_state, current_user, payload), fields(user_id = %current_user.user.id))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  payload: web::Json<CreateOrder>,
) -> Result<HttpResponse, AppError> {
  let detail = app_state
    .orders
    .create_order(current_user.actor(), payload.into_inner())
    .await?;
  info!(order_id = %detail.order.id, "order placed");
  Ok(HttpResponse::Created().json(json!({ "order": detail })))
}

#[instrument(name = "handler::my_orders", skip(app_state, current_user), fields(user_id = %current_user.user.id))]
pub async fn my_orders_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.orders_for_customer(current_user.actor()).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::get_order", skip(app_state, current_user, path), fields(user_id = %current_user.user.id, order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let detail = app_state
    .orders
    .order_detail(current_user.actor(), path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "order": detail })))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, current_user, path, payload),
  fields(user_id = %current_user.user.id, order_id = %path.as_ref(), target = %payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateOrderStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .request_transition(current_user.actor(), path.into_inner(), payload.status)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(
  name = "handler::restaurant_orders",
  skip(app_state, current_user, path, query),
  fields(user_id = %current_user.user.id, restaurant_id = %path.as_ref())
)]
pub async fn restaurant_orders_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
  query: web::Query<RestaurantOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let orders = app_state
    .orders
    .orders_for_restaurant(current_user.actor(), path.into_inner(), query.status)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

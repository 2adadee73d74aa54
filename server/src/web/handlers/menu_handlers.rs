// server/src/web/handlers/menu_handlers.rs

use actix_web::{web, HttpResponse};
use mensa_core::model::{MenuItemPatch, NewMenuItem};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[derive(Deserialize, Debug)]
pub struct MenuItemPayload {
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: i64,
  #[serde(default = "default_available")]
  pub available: bool,
}

fn default_available() -> bool {
  true
}

fn validate_menu_payload(name: &str, price_cents: i64) -> Result<(), AppError> {
  if name.trim().is_empty() {
    return Err(AppError::Validation("Menu item name is required.".to_string()));
  }
  if price_cents < 0 {
    return Err(AppError::Validation("Price cannot be negative.".to_string()));
  }
  Ok(())
}

/// Loads the restaurant and checks the current user owns it.
async fn require_owned_restaurant(app_state: &AppState, restaurant_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
  let restaurant = app_state
    .store
    .restaurant(restaurant_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found.", restaurant_id)))?;
  if restaurant.owner_id != user_id {
    return Err(AppError::Forbidden(
      "Only the restaurant owner may manage its menu.".to_string(),
    ));
  }
  Ok(())
}

#[instrument(name = "handler::list_menu", skip(app_state, path), fields(restaurant_id = %path.as_ref()))]
pub async fn list_menu_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let restaurant_id = path.into_inner();
  if app_state.store.restaurant(restaurant_id).await?.is_none() {
    return Err(AppError::NotFound(format!("Restaurant {} not found.", restaurant_id)));
  }
  let items = app_state.store.menu_items_for_restaurant(restaurant_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "menuItems": items })))
}

#[instrument(name = "handler::create_menu_item", skip(app_state, current_user, payload), fields(user_id = %current_user.user.id))]
pub async fn create_menu_item_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
  payload: web::Json<MenuItemPayload>,
) -> Result<HttpResponse, AppError> {
  let restaurant_id = path.into_inner();
  let payload = payload.into_inner();
  validate_menu_payload(&payload.name, payload.price_cents)?;
  require_owned_restaurant(app_state.get_ref(), restaurant_id, current_user.user.id).await?;

  let item = app_state
    .store
    .insert_menu_item(NewMenuItem {
      restaurant_id,
      name: payload.name.trim().to_string(),
      description: payload.description,
      category: payload.category,
      price_cents: payload.price_cents,
      available: payload.available,
    })
    .await?;
  info!(menu_item_id = %item.id, "menu item created");
  Ok(HttpResponse::Created().json(json!({ "menuItem": item })))
}

#[instrument(name = "handler::update_menu_item", skip(app_state, current_user, payload), fields(user_id = %current_user.user.id))]
pub async fn update_menu_item_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
  payload: web::Json<MenuItemPayload>,
) -> Result<HttpResponse, AppError> {
  let menu_item_id = path.into_inner();
  let payload = payload.into_inner();
  validate_menu_payload(&payload.name, payload.price_cents)?;

  let item = app_state
    .store
    .menu_item(menu_item_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Menu item {} not found.", menu_item_id)))?;
  require_owned_restaurant(app_state.get_ref(), item.restaurant_id, current_user.user.id).await?;

  let updated = app_state
    .store
    .update_menu_item(
      menu_item_id,
      MenuItemPatch {
        name: payload.name.trim().to_string(),
        description: payload.description,
        category: payload.category,
        price_cents: payload.price_cents,
        available: payload.available,
      },
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Menu item {} not found.", menu_item_id)))?;
  Ok(HttpResponse::Ok().json(json!({ "menuItem": updated })))
}

#[instrument(name = "handler::delete_menu_item", skip(app_state, current_user), fields(user_id = %current_user.user.id))]
pub async fn delete_menu_item_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let menu_item_id = path.into_inner();
  let item = app_state
    .store
    .menu_item(menu_item_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Menu item {} not found.", menu_item_id)))?;
  require_owned_restaurant(app_state.get_ref(), item.restaurant_id, current_user.user.id).await?;

  app_state.store.delete_menu_item(menu_item_id).await?;
  Ok(HttpResponse::NoContent().finish())
}

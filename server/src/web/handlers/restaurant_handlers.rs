// server/src/web/handlers/restaurant_handlers.rs

use actix_web::{web, HttpResponse};
use mensa_core::model::{NewRestaurant, RestaurantPatch};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[derive(Deserialize, Debug)]
pub struct ListRestaurantsQuery {
  pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateRestaurantPayload {
  pub name: String,
  pub description: Option<String>,
}

#[instrument(name = "handler::list_restaurants", skip(app_state, query))]
pub async fn list_restaurants_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListRestaurantsQuery>,
) -> Result<HttpResponse, AppError> {
  let restaurants = app_state
    .store
    .search_restaurants(query.search.as_deref().unwrap_or(""))
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "restaurants": restaurants })))
}

#[instrument(name = "handler::get_restaurant", skip(app_state, path), fields(restaurant_id = %path.as_ref()))]
pub async fn get_restaurant_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let restaurant_id = path.into_inner();
  match app_state.store.restaurant(restaurant_id).await? {
    Some(restaurant) => Ok(HttpResponse::Ok().json(json!({ "restaurant": restaurant }))),
    None => Err(AppError::NotFound(format!("Restaurant {} not found.", restaurant_id))),
  }
}

#[instrument(name = "handler::my_restaurants", skip(app_state, current_user), fields(user_id = %current_user.user.id))]
pub async fn my_restaurants_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let restaurants = app_state.store.restaurants_by_owner(current_user.user.id).await?;
  Ok(HttpResponse::Ok().json(json!({ "restaurants": restaurants })))
}

#[instrument(name = "handler::create_restaurant", skip(app_state, current_user, payload), fields(user_id = %current_user.user.id))]
pub async fn create_restaurant_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  payload: web::Json<CreateRestaurantPayload>,
) -> Result<HttpResponse, AppError> {
  if !current_user.user.is_restaurant_owner {
    return Err(AppError::Forbidden("An owner account is required.".to_string()));
  }
  let payload = payload.into_inner();
  if payload.name.trim().is_empty() {
    return Err(AppError::Validation("Restaurant name is required.".to_string()));
  }

  let restaurant = app_state
    .store
    .insert_restaurant(NewRestaurant {
      owner_id: current_user.user.id,
      name: payload.name.trim().to_string(),
      description: payload.description,
    })
    .await?;
  info!(restaurant_id = %restaurant.id, "restaurant created");
  Ok(HttpResponse::Created().json(json!({ "restaurant": restaurant })))
}

#[instrument(name = "handler::update_restaurant", skip(app_state, current_user, payload), fields(user_id = %current_user.user.id))]
pub async fn update_restaurant_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
  payload: web::Json<RestaurantPatch>,
) -> Result<HttpResponse, AppError> {
  let restaurant_id = path.into_inner();
  let patch = payload.into_inner();
  if patch.name.trim().is_empty() {
    return Err(AppError::Validation("Restaurant name is required.".to_string()));
  }

  match app_state
    .store
    .update_restaurant(restaurant_id, current_user.user.id, patch)
    .await?
  {
    Some(restaurant) => Ok(HttpResponse::Ok().json(json!({ "restaurant": restaurant }))),
    None => Err(AppError::NotFound("Restaurant not found or not authorized.".to_string())),
  }
}

#[instrument(name = "handler::delete_restaurant", skip(app_state, current_user), fields(user_id = %current_user.user.id))]
pub async fn delete_restaurant_handler(
  app_state: web::Data<AppState>,
  current_user: CurrentUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let restaurant_id = path.into_inner();
  if app_state
    .store
    .delete_restaurant(restaurant_id, current_user.user.id)
    .await?
  {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(AppError::NotFound("Restaurant not found or not authorized.".to_string()))
  }
}

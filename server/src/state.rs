// server/src/state.rs
use crate::config::AppConfig;
use mensa_core::{OrderService, ReviewService, Store};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub orders: Arc<OrderService>,
  pub reviews: Arc<ReviewService>,
  pub config: Arc<AppConfig>, // Share loaded config
}

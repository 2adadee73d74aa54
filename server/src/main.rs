// server/src/main.rs

// Declare modules for the application
mod config;
mod errors;
mod persistence;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, StoreBackend};
use crate::persistence::PgStore;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer}; // Renamed web to actix_data
use mensa_core::{MemoryStore, OrderService, ReviewPolicy, ReviewService, Store};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing

async fn build_store(config: &AppConfig) -> std::io::Result<Arc<dyn Store>> {
  match config.store_backend {
    StoreBackend::Memory => {
      tracing::info!("Using the in-memory store (no database).");
      Ok(Arc::new(MemoryStore::new()))
    }
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .expect("DATABASE_URL is checked during config load");
      let db_pool = match PgPool::connect(database_url).await {
        Ok(pool) => {
          tracing::info!("Successfully connected to the database.");
          pool
        }
        Err(e) => {
          tracing::error!(error = %e, "Failed to connect to the database.");
          panic!("Database connection error: {}", e);
        }
      };
      if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
        tracing::error!(error = %e, "Failed to run database migrations.");
        panic!("Migration error: {}", e);
      }
      Ok(Arc::new(PgStore::new(db_pool)))
    }
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting mensa server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  let store = build_store(&app_config).await?;

  // The qualifying-status set for reviews is deployment policy, not code.
  let review_policy = match ReviewPolicy::from_csv(&app_config.review_qualifying_statuses) {
    Ok(policy) => policy,
    Err(e) => {
      tracing::error!(error = %e, "Invalid REVIEW_QUALIFYING_STATUSES.");
      panic!("Configuration error: {}", e);
    }
  };

  let app_state = AppState {
    orders: Arc::new(OrderService::new(store.clone())),
    reviews: Arc::new(ReviewService::new(store.clone(), review_policy)),
    store,
    config: app_config.clone(),
  };

  // Configure and Start Actix Web Server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(web::routes::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}

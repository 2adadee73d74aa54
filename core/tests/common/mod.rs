// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use mensa_core::model::{Actor, CreateOrder, MenuItem, NewMenuItem, NewOrderLine, NewRestaurant, NewUser, OrderDetail, Restaurant};
use mensa_core::{MemoryStore, OrderService, OrderStatus, ReviewPolicy, ReviewService, Store};
use std::sync::Arc;

pub fn setup_tracing() {
  static INIT: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
  INIT.get_or_init(|| {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
      .with_test_writer()
      .try_init();
  });
}

/// A seeded universe: one restaurant with two menu items, its owner, two
/// customers, one unrelated account, and services wired over one store.
pub struct World {
  pub store: Arc<MemoryStore>,
  pub orders: OrderService,
  pub reviews: ReviewService,
  pub owner: Actor,
  pub customer: Actor,
  pub customer2: Actor,
  pub outsider: Actor,
  pub restaurant: Restaurant,
  pub burger: MenuItem,
  pub fries: MenuItem,
}

pub async fn seed_world() -> World {
  seed_world_with_policy(ReviewPolicy::default()).await
}

pub async fn seed_world_with_policy(policy: ReviewPolicy) -> World {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let dyn_store: Arc<dyn Store> = store.clone();

  let owner = new_actor(&dyn_store, "owner@example.com", true).await;
  let customer = new_actor(&dyn_store, "customer@example.com", false).await;
  let customer2 = new_actor(&dyn_store, "customer2@example.com", false).await;
  let outsider = new_actor(&dyn_store, "outsider@example.com", false).await;

  let restaurant = dyn_store
    .insert_restaurant(NewRestaurant {
      owner_id: owner.user_id,
      name: "Trattoria Uno".to_string(),
      description: None,
    })
    .await
    .unwrap();

  let burger = dyn_store
    .insert_menu_item(NewMenuItem {
      restaurant_id: restaurant.id,
      name: "Burger".to_string(),
      description: None,
      category: Some("mains".to_string()),
      price_cents: 950,
      available: true,
    })
    .await
    .unwrap();
  let fries = dyn_store
    .insert_menu_item(NewMenuItem {
      restaurant_id: restaurant.id,
      name: "Fries".to_string(),
      description: None,
      category: Some("sides".to_string()),
      price_cents: 350,
      available: true,
    })
    .await
    .unwrap();

  World {
    orders: OrderService::new(dyn_store.clone()),
    reviews: ReviewService::new(dyn_store, policy),
    store,
    owner,
    customer,
    customer2,
    outsider,
    restaurant,
    burger,
    fries,
  }
}

pub async fn new_actor(store: &Arc<dyn Store>, email: &str, is_restaurant_owner: bool) -> Actor {
  let user = store
    .insert_user(NewUser {
      email: email.to_string(),
      full_name: None,
      password_hash: "argon2-hash-placeholder".to_string(),
      is_restaurant_owner,
    })
    .await
    .unwrap();
  Actor {
    user_id: user.id,
    is_restaurant_owner,
  }
}

/// Places a two-line order (2x burger, 1x fries) for the actor.
pub async fn place_order(world: &World, actor: Actor) -> OrderDetail {
  world
    .orders
    .create_order(
      actor,
      CreateOrder {
        restaurant_id: world.restaurant.id,
        items: vec![
          NewOrderLine {
            menu_item_id: world.burger.id,
            quantity: 2,
          },
          NewOrderLine {
            menu_item_id: world.fries.id,
            quantity: 1,
          },
        ],
      },
    )
    .await
    .unwrap()
}

/// Forces a fresh order into an arbitrary status, bypassing the state
/// machine (store-level CAS from the initial `pending`).
pub async fn order_in_status(world: &World, actor: Actor, status: OrderStatus) -> uuid::Uuid {
  let detail = place_order(world, actor).await;
  if status != OrderStatus::Pending {
    assert!(world.store.set_order_status(detail.order.id, OrderStatus::Pending, status).await.unwrap());
  }
  detail.order.id
}

/// The restaurant's persisted `(rating_avg, rating_count)` pair.
pub async fn aggregate(world: &World) -> (f64, i64) {
  let restaurant = world.store.restaurant(world.restaurant.id).await.unwrap().unwrap();
  (restaurant.rating_avg, restaurant.rating_count)
}

pub const TOLERANCE: f64 = 1e-9;

/// Asserts the rating invariant: avg * count == sum of live ratings, and
/// count matches the live review count.
pub async fn assert_aggregate_invariant(world: &World) {
  let (sum, count) = world.store.review_aggregate_inputs(world.restaurant.id).await.unwrap();
  let (avg, stored_count) = aggregate(world).await;
  assert_eq!(stored_count, count, "rating_count must equal the live review count");
  assert!(
    (avg * count as f64 - sum as f64).abs() < TOLERANCE,
    "rating_avg * rating_count ({}) must equal the rating sum ({})",
    avg * count as f64,
    sum
  );
}

// core/src/store/mod.rs

//! The Persistence Collaborator seam.
//!
//! Domain services depend on [`Store`] alone; which backend is behind it
//! (PostgreSQL in the server, the in-memory store in tests and the
//! database-free deployment mode) is a wiring decision the core never sees.
//!
//! Atomicity contracts the implementations must honor:
//!
//! - `insert_order_with_items` writes the order and all of its lines as one
//!   all-or-nothing unit.
//! - `set_order_status` is a compare-and-set: it persists `next` only if the
//!   current status still equals `expected`, and reports whether it did.
//!   Concurrent transitions on one order therefore cannot both win.
//! - `insert_review` / `update_review` / `delete_review` refresh the owning
//!   restaurant's `(rating_avg, rating_count)` inside the same transaction
//!   as the review write, serialized per restaurant, so the aggregate
//!   invariant holds at every commit point.

pub mod memory;

use crate::error::CoreResult;
use crate::model::{
  MenuItem, MenuItemPatch, NewMenuItem, NewRestaurant, NewReview, NewUser, Order, OrderDetail, OrderLine, Restaurant,
  RestaurantPatch, Review, User,
};
use crate::order::status::OrderStatus;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait Store: Send + Sync {
  // --- users & sessions ---

  /// Fails with `Conflict` when the email is already registered.
  async fn insert_user(&self, new: NewUser) -> CoreResult<User>;
  async fn user_by_email(&self, email: &str) -> CoreResult<Option<User>>;
  async fn user_by_id(&self, id: Uuid) -> CoreResult<Option<User>>;

  /// Issues an opaque session token for the user.
  async fn create_session(&self, user_id: Uuid) -> CoreResult<String>;
  async fn session_user(&self, token: &str) -> CoreResult<Option<User>>;
  async fn revoke_session(&self, token: &str) -> CoreResult<()>;

  // --- restaurants ---

  async fn insert_restaurant(&self, new: NewRestaurant) -> CoreResult<Restaurant>;
  async fn restaurant(&self, id: Uuid) -> CoreResult<Option<Restaurant>>;
  async fn search_restaurants(&self, name_like: &str) -> CoreResult<Vec<Restaurant>>;
  async fn restaurants_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Restaurant>>;

  /// Owner-scoped update; `None` when no restaurant matches (id, owner).
  async fn update_restaurant(&self, id: Uuid, owner_id: Uuid, patch: RestaurantPatch) -> CoreResult<Option<Restaurant>>;
  /// Owner-scoped delete; `false` when no restaurant matches (id, owner).
  /// A restaurant with order history fails with `Conflict` (orders are
  /// never deleted, so the reference must stay resolvable).
  async fn delete_restaurant(&self, id: Uuid, owner_id: Uuid) -> CoreResult<bool>;

  // --- menu items ---

  async fn insert_menu_item(&self, new: NewMenuItem) -> CoreResult<MenuItem>;
  async fn menu_item(&self, id: Uuid) -> CoreResult<Option<MenuItem>>;
  async fn menu_items_for_restaurant(&self, restaurant_id: Uuid) -> CoreResult<Vec<MenuItem>>;
  async fn menu_items_by_ids(&self, ids: &[Uuid]) -> CoreResult<Vec<MenuItem>>;
  async fn update_menu_item(&self, id: Uuid, patch: MenuItemPatch) -> CoreResult<Option<MenuItem>>;
  /// Historical order lines keep their snapshots; their `menu_item_id`
  /// reference goes null.
  async fn delete_menu_item(&self, id: Uuid) -> CoreResult<bool>;

  // --- orders ---

  async fn insert_order_with_items(&self, order: &Order, items: &[OrderLine]) -> CoreResult<()>;
  async fn order(&self, id: Uuid) -> CoreResult<Option<Order>>;
  async fn order_detail(&self, id: Uuid) -> CoreResult<Option<OrderDetail>>;
  async fn orders_for_customer(&self, customer_id: Uuid) -> CoreResult<Vec<OrderDetail>>;
  async fn orders_for_restaurant(
    &self,
    restaurant_id: Uuid,
    status: Option<OrderStatus>,
  ) -> CoreResult<Vec<OrderDetail>>;

  /// Compare-and-set on the order's status. Returns `false` when the order
  /// exists but its status no longer equals `expected` (the caller lost a
  /// race), and `false` likewise when the order is gone.
  async fn set_order_status(&self, id: Uuid, expected: OrderStatus, next: OrderStatus) -> CoreResult<bool>;

  // --- reviews & the rating aggregate ---

  async fn review_for(&self, customer_id: Uuid, restaurant_id: Uuid) -> CoreResult<Option<Review>>;
  async fn reviews_for_restaurant(&self, restaurant_id: Uuid) -> CoreResult<Vec<Review>>;

  /// Whether the customer has at least one order at the restaurant in any
  /// of the given statuses.
  async fn has_order_in_status(
    &self,
    customer_id: Uuid,
    restaurant_id: Uuid,
    statuses: &[OrderStatus],
  ) -> CoreResult<bool>;

  /// Inserts the review and applies the incremental aggregate update in one
  /// transaction. A concurrent duplicate surfaces as `Conflict`.
  async fn insert_review(&self, new: NewReview) -> CoreResult<Review>;

  /// Updates the customer's review (rating, comment, `updated_at`) and
  /// recomputes the aggregate in one transaction. `None` when the customer
  /// has no review at the restaurant.
  async fn update_review(
    &self,
    customer_id: Uuid,
    restaurant_id: Uuid,
    rating: i32,
    comment: Option<String>,
  ) -> CoreResult<Option<Review>>;

  /// Deletes the customer's review and recomputes the aggregate in one
  /// transaction. `false` when there was nothing to delete.
  async fn delete_review(&self, customer_id: Uuid, restaurant_id: Uuid) -> CoreResult<bool>;

  /// `(sum of ratings, count)` over the restaurant's live reviews.
  async fn review_aggregate_inputs(&self, restaurant_id: Uuid) -> CoreResult<(i64, i64)>;
}

// core/src/store/memory.rs

//! In-memory [`Store`] backend.
//!
//! All tables live behind a single `parking_lot::RwLock`, so every write
//! operation is atomic and writes are serialized — the transactional
//! contracts of the trait hold trivially. Used by the test suites and by
//! the server's database-free deployment mode.
//!
//! Lock guards are blocking and are never held across an `.await` point;
//! no method suspends while holding one.

use crate::error::{CoreError, CoreResult};
use crate::model::{
  MenuItem, MenuItemPatch, NewMenuItem, NewRestaurant, NewReview, NewUser, Order, OrderDetail, OrderLine, Restaurant,
  RestaurantPatch, Review, User,
};
use crate::order::status::OrderStatus;
use crate::review::rating;
use crate::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
  users: HashMap<Uuid, User>,
  sessions: HashMap<String, Uuid>,
  restaurants: HashMap<Uuid, Restaurant>,
  menu_items: HashMap<Uuid, MenuItem>,
  orders: HashMap<Uuid, Order>,
  order_lines: HashMap<Uuid, Vec<OrderLine>>,
  reviews: HashMap<(Uuid, Uuid), Review>,
}

impl Inner {
  fn restaurant_reviews(&self, restaurant_id: Uuid) -> impl Iterator<Item = &Review> {
    self
      .reviews
      .values()
      .filter(move |review| review.restaurant_id == restaurant_id)
  }

  /// Exact aggregate refresh from the live review set.
  fn recompute_aggregate(&mut self, restaurant_id: Uuid) {
    let (sum, count) = self
      .restaurant_reviews(restaurant_id)
      .fold((0i64, 0i64), |(sum, count), review| {
        (sum + review.rating as i64, count + 1)
      });
    let (avg, count) = rating::recompute(sum, count);
    if let Some(restaurant) = self.restaurants.get_mut(&restaurant_id) {
      restaurant.rating_avg = avg;
      restaurant.rating_count = count;
    }
  }
}

#[derive(Default)]
pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn insert_user(&self, new: NewUser) -> CoreResult<User> {
    let mut inner = self.inner.write();
    if inner.users.values().any(|user| user.email == new.email) {
      return Err(CoreError::Conflict(format!("email '{}' already in use", new.email)));
    }
    let user = User {
      id: Uuid::new_v4(),
      email: new.email,
      full_name: new.full_name,
      password_hash: new.password_hash,
      is_restaurant_owner: new.is_restaurant_owner,
      created_at: Utc::now(),
    };
    inner.users.insert(user.id, user.clone());
    Ok(user)
  }

  async fn user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
    Ok(self.inner.read().users.values().find(|user| user.email == email).cloned())
  }

  async fn user_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
    Ok(self.inner.read().users.get(&id).cloned())
  }

  async fn create_session(&self, user_id: Uuid) -> CoreResult<String> {
    let token = Uuid::new_v4().simple().to_string();
    self.inner.write().sessions.insert(token.clone(), user_id);
    Ok(token)
  }

  async fn session_user(&self, token: &str) -> CoreResult<Option<User>> {
    let inner = self.inner.read();
    Ok(
      inner
        .sessions
        .get(token)
        .and_then(|user_id| inner.users.get(user_id))
        .cloned(),
    )
  }

  async fn revoke_session(&self, token: &str) -> CoreResult<()> {
    self.inner.write().sessions.remove(token);
    Ok(())
  }

  async fn insert_restaurant(&self, new: NewRestaurant) -> CoreResult<Restaurant> {
    let mut inner = self.inner.write();
    if inner
      .restaurants
      .values()
      .any(|existing| existing.owner_id == new.owner_id && existing.name == new.name)
    {
      return Err(CoreError::Conflict(format!(
        "restaurant '{}' already exists for this owner",
        new.name
      )));
    }
    let restaurant = Restaurant {
      id: Uuid::new_v4(),
      owner_id: new.owner_id,
      name: new.name,
      description: new.description,
      rating_avg: 0.0,
      rating_count: 0,
      created_at: Utc::now(),
    };
    inner.restaurants.insert(restaurant.id, restaurant.clone());
    Ok(restaurant)
  }

  async fn restaurant(&self, id: Uuid) -> CoreResult<Option<Restaurant>> {
    Ok(self.inner.read().restaurants.get(&id).cloned())
  }

  async fn search_restaurants(&self, name_like: &str) -> CoreResult<Vec<Restaurant>> {
    let needle = name_like.to_lowercase();
    let mut rows: Vec<Restaurant> = self
      .inner
      .read()
      .restaurants
      .values()
      .filter(|restaurant| restaurant.name.to_lowercase().contains(&needle))
      .cloned()
      .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
  }

  async fn restaurants_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Restaurant>> {
    let mut rows: Vec<Restaurant> = self
      .inner
      .read()
      .restaurants
      .values()
      .filter(|restaurant| restaurant.owner_id == owner_id)
      .cloned()
      .collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(rows)
  }

  async fn update_restaurant(&self, id: Uuid, owner_id: Uuid, patch: RestaurantPatch) -> CoreResult<Option<Restaurant>> {
    let mut inner = self.inner.write();
    match inner.restaurants.get_mut(&id) {
      Some(restaurant) if restaurant.owner_id == owner_id => {
        restaurant.name = patch.name;
        restaurant.description = patch.description;
        Ok(Some(restaurant.clone()))
      }
      _ => Ok(None),
    }
  }

  async fn delete_restaurant(&self, id: Uuid, owner_id: Uuid) -> CoreResult<bool> {
    let mut inner = self.inner.write();
    let owned = matches!(inner.restaurants.get(&id), Some(r) if r.owner_id == owner_id);
    if owned {
      // Order history is immutable; a restaurant with orders cannot go away.
      if inner.orders.values().any(|order| order.restaurant_id == id) {
        return Err(CoreError::Conflict(
          "restaurant has orders and cannot be deleted".to_string(),
        ));
      }
      inner.restaurants.remove(&id);
      inner.menu_items.retain(|_, item| item.restaurant_id != id);
      inner.reviews.retain(|_, review| review.restaurant_id != id);
    }
    Ok(owned)
  }

  async fn insert_menu_item(&self, new: NewMenuItem) -> CoreResult<MenuItem> {
    let mut inner = self.inner.write();
    if inner
      .menu_items
      .values()
      .any(|existing| existing.restaurant_id == new.restaurant_id && existing.name == new.name)
    {
      return Err(CoreError::Conflict(format!(
        "menu item '{}' already exists at this restaurant",
        new.name
      )));
    }
    let item = MenuItem {
      id: Uuid::new_v4(),
      restaurant_id: new.restaurant_id,
      name: new.name,
      description: new.description,
      category: new.category,
      price_cents: new.price_cents,
      available: new.available,
      created_at: Utc::now(),
    };
    inner.menu_items.insert(item.id, item.clone());
    Ok(item)
  }

  async fn menu_item(&self, id: Uuid) -> CoreResult<Option<MenuItem>> {
    Ok(self.inner.read().menu_items.get(&id).cloned())
  }

  async fn menu_items_for_restaurant(&self, restaurant_id: Uuid) -> CoreResult<Vec<MenuItem>> {
    let mut rows: Vec<MenuItem> = self
      .inner
      .read()
      .menu_items
      .values()
      .filter(|item| item.restaurant_id == restaurant_id)
      .cloned()
      .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
  }

  async fn menu_items_by_ids(&self, ids: &[Uuid]) -> CoreResult<Vec<MenuItem>> {
    let inner = self.inner.read();
    Ok(ids.iter().filter_map(|id| inner.menu_items.get(id)).cloned().collect())
  }

  async fn update_menu_item(&self, id: Uuid, patch: MenuItemPatch) -> CoreResult<Option<MenuItem>> {
    let mut inner = self.inner.write();
    match inner.menu_items.get_mut(&id) {
      Some(item) => {
        item.name = patch.name;
        item.description = patch.description;
        item.category = patch.category;
        item.price_cents = patch.price_cents;
        item.available = patch.available;
        Ok(Some(item.clone()))
      }
      None => Ok(None),
    }
  }

  async fn delete_menu_item(&self, id: Uuid) -> CoreResult<bool> {
    let mut inner = self.inner.write();
    let removed = inner.menu_items.remove(&id).is_some();
    if removed {
      // Order lines keep their snapshots; only the lineage pointer clears.
      for lines in inner.order_lines.values_mut() {
        for line in lines.iter_mut() {
          if line.menu_item_id == Some(id) {
            line.menu_item_id = None;
          }
        }
      }
    }
    Ok(removed)
  }

  async fn insert_order_with_items(&self, order: &Order, items: &[OrderLine]) -> CoreResult<()> {
    let mut inner = self.inner.write();
    inner.orders.insert(order.id, order.clone());
    inner.order_lines.insert(order.id, items.to_vec());
    Ok(())
  }

  async fn order(&self, id: Uuid) -> CoreResult<Option<Order>> {
    Ok(self.inner.read().orders.get(&id).cloned())
  }

  async fn order_detail(&self, id: Uuid) -> CoreResult<Option<OrderDetail>> {
    let inner = self.inner.read();
    Ok(inner.orders.get(&id).map(|order| OrderDetail {
      order: order.clone(),
      items: inner.order_lines.get(&id).cloned().unwrap_or_default(),
    }))
  }

  async fn orders_for_customer(&self, customer_id: Uuid) -> CoreResult<Vec<OrderDetail>> {
    let inner = self.inner.read();
    let mut rows: Vec<OrderDetail> = inner
      .orders
      .values()
      .filter(|order| order.customer_id == customer_id)
      .map(|order| OrderDetail {
        order: order.clone(),
        items: inner.order_lines.get(&order.id).cloned().unwrap_or_default(),
      })
      .collect();
    rows.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
    Ok(rows)
  }

  async fn orders_for_restaurant(
    &self,
    restaurant_id: Uuid,
    status: Option<OrderStatus>,
  ) -> CoreResult<Vec<OrderDetail>> {
    let inner = self.inner.read();
    let mut rows: Vec<OrderDetail> = inner
      .orders
      .values()
      .filter(|order| order.restaurant_id == restaurant_id)
      .filter(|order| status.map_or(true, |wanted| order.status == wanted))
      .map(|order| OrderDetail {
        order: order.clone(),
        items: inner.order_lines.get(&order.id).cloned().unwrap_or_default(),
      })
      .collect();
    rows.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
    Ok(rows)
  }

  async fn set_order_status(&self, id: Uuid, expected: OrderStatus, next: OrderStatus) -> CoreResult<bool> {
    let mut inner = self.inner.write();
    match inner.orders.get_mut(&id) {
      Some(order) if order.status == expected => {
        order.status = next;
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn review_for(&self, customer_id: Uuid, restaurant_id: Uuid) -> CoreResult<Option<Review>> {
    Ok(self.inner.read().reviews.get(&(customer_id, restaurant_id)).cloned())
  }

  async fn reviews_for_restaurant(&self, restaurant_id: Uuid) -> CoreResult<Vec<Review>> {
    let mut rows: Vec<Review> = self.inner.read().restaurant_reviews(restaurant_id).cloned().collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(rows)
  }

  async fn has_order_in_status(
    &self,
    customer_id: Uuid,
    restaurant_id: Uuid,
    statuses: &[OrderStatus],
  ) -> CoreResult<bool> {
    Ok(self.inner.read().orders.values().any(|order| {
      order.customer_id == customer_id && order.restaurant_id == restaurant_id && statuses.contains(&order.status)
    }))
  }

  async fn insert_review(&self, new: NewReview) -> CoreResult<Review> {
    let mut inner = self.inner.write();
    let key = (new.customer_id, new.restaurant_id);
    if inner.reviews.contains_key(&key) {
      return Err(CoreError::Conflict(
        "customer already reviewed this restaurant".to_string(),
      ));
    }
    let restaurant = inner
      .restaurants
      .get(&new.restaurant_id)
      .ok_or_else(|| CoreError::not_found("restaurant"))?;

    // Incremental path: the previous aggregate is exact, this is a pure
    // insertion, and the whole block sits under one write lock.
    let (avg, count) = rating::apply_new_review(restaurant.rating_avg, restaurant.rating_count, new.rating);

    let now = Utc::now();
    let review = Review {
      id: Uuid::new_v4(),
      customer_id: new.customer_id,
      restaurant_id: new.restaurant_id,
      rating: new.rating,
      comment: new.comment,
      created_at: now,
      updated_at: now,
    };
    inner.reviews.insert(key, review.clone());
    if let Some(restaurant) = inner.restaurants.get_mut(&new.restaurant_id) {
      restaurant.rating_avg = avg;
      restaurant.rating_count = count;
    }
    Ok(review)
  }

  async fn update_review(
    &self,
    customer_id: Uuid,
    restaurant_id: Uuid,
    rating: i32,
    comment: Option<String>,
  ) -> CoreResult<Option<Review>> {
    let mut inner = self.inner.write();
    let updated = match inner.reviews.get_mut(&(customer_id, restaurant_id)) {
      Some(review) => {
        review.rating = rating;
        review.comment = comment;
        review.updated_at = Utc::now();
        Some(review.clone())
      }
      None => None,
    };
    if updated.is_some() {
      inner.recompute_aggregate(restaurant_id);
    }
    Ok(updated)
  }

  async fn delete_review(&self, customer_id: Uuid, restaurant_id: Uuid) -> CoreResult<bool> {
    let mut inner = self.inner.write();
    let removed = inner.reviews.remove(&(customer_id, restaurant_id)).is_some();
    if removed {
      inner.recompute_aggregate(restaurant_id);
    }
    Ok(removed)
  }

  async fn review_aggregate_inputs(&self, restaurant_id: Uuid) -> CoreResult<(i64, i64)> {
    Ok(
      self
        .inner
        .read()
        .restaurant_reviews(restaurant_id)
        .fold((0i64, 0i64), |(sum, count), review| {
          (sum + review.rating as i64, count + 1)
        }),
    )
  }
}

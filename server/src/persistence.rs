// server/src/persistence.rs

//! PostgreSQL implementation of the core `Store` trait.
//!
//! Runtime (non-macro) queries throughout. The transactional contracts of
//! the seam are carried by:
//!  - one transaction around order + line inserts,
//!  - a guarded `UPDATE ... WHERE status = $expected` as the status CAS,
//!  - `SELECT ... FOR UPDATE` on the restaurant row before every review
//!    write, which both serializes concurrent aggregate refreshes and keeps
//!    the review write and the aggregate update in one atomic unit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mensa_core::error::{CoreError, CoreResult};
use mensa_core::model::{
  MenuItem, MenuItemPatch, NewMenuItem, NewRestaurant, NewReview, NewUser, Order, OrderDetail, OrderLine, Restaurant,
  RestaurantPatch, Review, User,
};
use mensa_core::review::rating;
use mensa_core::{OrderStatus, Store};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    PgStore { pool }
  }
}

fn db_err(err: sqlx::Error) -> CoreError {
  CoreError::storage(err)
}

/// Maps a unique-constraint violation to `Conflict`; anything else stays an
/// infrastructure failure.
fn unique_conflict(err: sqlx::Error, message: &str) -> CoreError {
  match err.as_database_error().and_then(|db| db.code()) {
    Some(code) if code == "23505" => CoreError::Conflict(message.to_string()),
    _ => CoreError::storage(err),
  }
}

fn restrict_conflict(err: sqlx::Error, message: &str) -> CoreError {
  match err.as_database_error().and_then(|db| db.code()) {
    Some(code) if code == "23503" => CoreError::Conflict(message.to_string()),
    _ => CoreError::storage(err),
  }
}

// --- row types ---

#[derive(FromRow)]
struct UserRow {
  id: Uuid,
  email: String,
  full_name: Option<String>,
  password_hash: String,
  is_restaurant_owner: bool,
  created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
  fn from(row: UserRow) -> Self {
    User {
      id: row.id,
      email: row.email,
      full_name: row.full_name,
      password_hash: row.password_hash,
      is_restaurant_owner: row.is_restaurant_owner,
      created_at: row.created_at,
    }
  }
}

#[derive(FromRow)]
struct RestaurantRow {
  id: Uuid,
  owner_id: Uuid,
  name: String,
  description: Option<String>,
  rating_avg: f64,
  rating_count: i64,
  created_at: DateTime<Utc>,
}

impl From<RestaurantRow> for Restaurant {
  fn from(row: RestaurantRow) -> Self {
    Restaurant {
      id: row.id,
      owner_id: row.owner_id,
      name: row.name,
      description: row.description,
      rating_avg: row.rating_avg,
      rating_count: row.rating_count,
      created_at: row.created_at,
    }
  }
}

#[derive(FromRow)]
struct MenuItemRow {
  id: Uuid,
  restaurant_id: Uuid,
  name: String,
  description: Option<String>,
  category: Option<String>,
  price_cents: i64,
  available: bool,
  created_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
  fn from(row: MenuItemRow) -> Self {
    MenuItem {
      id: row.id,
      restaurant_id: row.restaurant_id,
      name: row.name,
      description: row.description,
      category: row.category,
      price_cents: row.price_cents,
      available: row.available,
      created_at: row.created_at,
    }
  }
}

#[derive(FromRow)]
struct OrderRow {
  id: Uuid,
  customer_id: Uuid,
  restaurant_id: Uuid,
  status: String,
  created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = CoreError;

  fn try_from(row: OrderRow) -> CoreResult<Self> {
    Ok(Order {
      id: row.id,
      customer_id: row.customer_id,
      restaurant_id: row.restaurant_id,
      status: row.status.parse::<OrderStatus>()?,
      created_at: row.created_at,
    })
  }
}

#[derive(FromRow)]
struct OrderLineRow {
  id: Uuid,
  order_id: Uuid,
  menu_item_id: Option<Uuid>,
  quantity: i32,
  name_snapshot: String,
  unit_price_cents: i64,
  line_subtotal_cents: i64,
}

impl From<OrderLineRow> for OrderLine {
  fn from(row: OrderLineRow) -> Self {
    OrderLine {
      id: row.id,
      order_id: row.order_id,
      menu_item_id: row.menu_item_id,
      quantity: row.quantity,
      name_snapshot: row.name_snapshot,
      unit_price_cents: row.unit_price_cents,
      line_subtotal_cents: row.line_subtotal_cents,
    }
  }
}

#[derive(FromRow)]
struct ReviewRow {
  id: Uuid,
  customer_id: Uuid,
  restaurant_id: Uuid,
  rating: i32,
  comment: Option<String>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
  fn from(row: ReviewRow) -> Self {
    Review {
      id: row.id,
      customer_id: row.customer_id,
      restaurant_id: row.restaurant_id,
      rating: row.rating,
      comment: row.comment,
      created_at: row.created_at,
      updated_at: row.updated_at,
    }
  }
}

const USER_COLS: &str = "id, email, full_name, password_hash, is_restaurant_owner, created_at";
const RESTAURANT_COLS: &str = "id, owner_id, name, description, rating_avg, rating_count, created_at";
const MENU_ITEM_COLS: &str = "id, restaurant_id, name, description, category, price_cents, available, created_at";
const ORDER_COLS: &str = "id, customer_id, restaurant_id, status, created_at";
const ORDER_LINE_COLS: &str = "id, order_id, menu_item_id, quantity, name_snapshot, unit_price_cents, line_subtotal_cents";
const REVIEW_COLS: &str = "id, customer_id, restaurant_id, rating, comment, created_at, updated_at";

impl PgStore {
  /// Line items for a set of orders, grouped by order id (single query,
  /// grouped in memory).
  async fn lines_by_order(&self, order_ids: &[Uuid]) -> CoreResult<HashMap<Uuid, Vec<OrderLine>>> {
    let rows: Vec<OrderLineRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_LINE_COLS} FROM order_items WHERE order_id = ANY($1)"
    ))
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;

    let mut grouped: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for row in rows {
      grouped.entry(row.order_id).or_default().push(row.into());
    }
    Ok(grouped)
  }

  async fn order_rows_to_details(&self, rows: Vec<OrderRow>) -> CoreResult<Vec<OrderDetail>> {
    let orders: Vec<Order> = rows.into_iter().map(Order::try_from).collect::<CoreResult<_>>()?;
    let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
    let mut grouped = self.lines_by_order(&order_ids).await?;
    Ok(
      orders
        .into_iter()
        .map(|order| {
          let items = grouped.remove(&order.id).unwrap_or_default();
          OrderDetail { order, items }
        })
        .collect(),
    )
  }
}

#[async_trait]
impl Store for PgStore {
  async fn insert_user(&self, new: NewUser) -> CoreResult<User> {
    let row: UserRow = sqlx::query_as(&format!(
      "INSERT INTO users (id, email, full_name, password_hash, is_restaurant_owner) \
       VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new.email)
    .bind(&new.full_name)
    .bind(&new.password_hash)
    .bind(new.is_restaurant_owner)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| unique_conflict(e, "email already in use"))?;
    Ok(row.into())
  }

  async fn user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLS} FROM users WHERE email = $1"))
      .bind(email)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(row.map(User::from))
  }

  async fn user_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(row.map(User::from))
  }

  async fn create_session(&self, user_id: Uuid) -> CoreResult<String> {
    let token = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
      .bind(&token)
      .bind(user_id)
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(token)
  }

  async fn session_user(&self, token: &str) -> CoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(
      "SELECT u.id, u.email, u.full_name, u.password_hash, u.is_restaurant_owner, u.created_at \
       FROM users u INNER JOIN sessions s ON s.user_id = u.id WHERE s.token = $1",
    )
    .bind(token)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.map(User::from))
  }

  async fn revoke_session(&self, token: &str) -> CoreResult<()> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
      .bind(token)
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(())
  }

  async fn insert_restaurant(&self, new: NewRestaurant) -> CoreResult<Restaurant> {
    let row: RestaurantRow = sqlx::query_as(&format!(
      "INSERT INTO restaurants (id, owner_id, name, description) \
       VALUES ($1, $2, $3, $4) RETURNING {RESTAURANT_COLS}"
    ))
    .bind(Uuid::new_v4())
    .bind(new.owner_id)
    .bind(&new.name)
    .bind(&new.description)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| unique_conflict(e, "restaurant name already exists for this owner"))?;
    Ok(row.into())
  }

  async fn restaurant(&self, id: Uuid) -> CoreResult<Option<Restaurant>> {
    let row: Option<RestaurantRow> =
      sqlx::query_as(&format!("SELECT {RESTAURANT_COLS} FROM restaurants WHERE id = $1"))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
    Ok(row.map(Restaurant::from))
  }

  async fn search_restaurants(&self, name_like: &str) -> CoreResult<Vec<Restaurant>> {
    let rows: Vec<RestaurantRow> = sqlx::query_as(&format!(
      "SELECT {RESTAURANT_COLS} FROM restaurants WHERE name ILIKE $1 ORDER BY name ASC"
    ))
    .bind(format!("%{}%", name_like))
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(Restaurant::from).collect())
  }

  async fn restaurants_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Restaurant>> {
    let rows: Vec<RestaurantRow> = sqlx::query_as(&format!(
      "SELECT {RESTAURANT_COLS} FROM restaurants WHERE owner_id = $1 ORDER BY created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(Restaurant::from).collect())
  }

  async fn update_restaurant(&self, id: Uuid, owner_id: Uuid, patch: RestaurantPatch) -> CoreResult<Option<Restaurant>> {
    let row: Option<RestaurantRow> = sqlx::query_as(&format!(
      "UPDATE restaurants SET name = $1, description = $2 \
       WHERE id = $3 AND owner_id = $4 RETURNING {RESTAURANT_COLS}"
    ))
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(id)
    .bind(owner_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| unique_conflict(e, "restaurant name already exists for this owner"))?;
    Ok(row.map(Restaurant::from))
  }

  async fn delete_restaurant(&self, id: Uuid, owner_id: Uuid) -> CoreResult<bool> {
    let result = sqlx::query("DELETE FROM restaurants WHERE id = $1 AND owner_id = $2")
      .bind(id)
      .bind(owner_id)
      .execute(&self.pool)
      .await
      .map_err(|e| restrict_conflict(e, "restaurant has orders and cannot be deleted"))?;
    Ok(result.rows_affected() == 1)
  }

  async fn insert_menu_item(&self, new: NewMenuItem) -> CoreResult<MenuItem> {
    let row: MenuItemRow = sqlx::query_as(&format!(
      "INSERT INTO menu_items (id, restaurant_id, name, description, category, price_cents, available) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {MENU_ITEM_COLS}"
    ))
    .bind(Uuid::new_v4())
    .bind(new.restaurant_id)
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.category)
    .bind(new.price_cents)
    .bind(new.available)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| unique_conflict(e, "menu item name already exists at this restaurant"))?;
    Ok(row.into())
  }

  async fn menu_item(&self, id: Uuid) -> CoreResult<Option<MenuItem>> {
    let row: Option<MenuItemRow> = sqlx::query_as(&format!("SELECT {MENU_ITEM_COLS} FROM menu_items WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(row.map(MenuItem::from))
  }

  async fn menu_items_for_restaurant(&self, restaurant_id: Uuid) -> CoreResult<Vec<MenuItem>> {
    let rows: Vec<MenuItemRow> = sqlx::query_as(&format!(
      "SELECT {MENU_ITEM_COLS} FROM menu_items WHERE restaurant_id = $1 ORDER BY name ASC"
    ))
    .bind(restaurant_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(MenuItem::from).collect())
  }

  async fn menu_items_by_ids(&self, ids: &[Uuid]) -> CoreResult<Vec<MenuItem>> {
    let rows: Vec<MenuItemRow> =
      sqlx::query_as(&format!("SELECT {MENU_ITEM_COLS} FROM menu_items WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
    Ok(rows.into_iter().map(MenuItem::from).collect())
  }

  async fn update_menu_item(&self, id: Uuid, patch: MenuItemPatch) -> CoreResult<Option<MenuItem>> {
    let row: Option<MenuItemRow> = sqlx::query_as(&format!(
      "UPDATE menu_items SET name = $1, description = $2, category = $3, price_cents = $4, available = $5 \
       WHERE id = $6 RETURNING {MENU_ITEM_COLS}"
    ))
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(&patch.category)
    .bind(patch.price_cents)
    .bind(patch.available)
    .bind(id)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| unique_conflict(e, "menu item name already exists at this restaurant"))?;
    Ok(row.map(MenuItem::from))
  }

  async fn delete_menu_item(&self, id: Uuid) -> CoreResult<bool> {
    // order_items.menu_item_id is ON DELETE SET NULL; snapshots stay.
    let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(result.rows_affected() == 1)
  }

  async fn insert_order_with_items(&self, order: &Order, items: &[OrderLine]) -> CoreResult<()> {
    let mut tx = self.pool.begin().await.map_err(db_err)?;
    sqlx::query("INSERT INTO orders (id, customer_id, restaurant_id, status, created_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(order.id)
      .bind(order.customer_id)
      .bind(order.restaurant_id)
      .bind(order.status.as_str())
      .bind(order.created_at)
      .execute(&mut *tx)
      .await
      .map_err(db_err)?;
    for line in items {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, menu_item_id, quantity, name_snapshot, unit_price_cents, line_subtotal_cents) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
      )
      .bind(line.id)
      .bind(line.order_id)
      .bind(line.menu_item_id)
      .bind(line.quantity)
      .bind(&line.name_snapshot)
      .bind(line.unit_price_cents)
      .bind(line.line_subtotal_cents)
      .execute(&mut *tx)
      .await
      .map_err(db_err)?;
    }
    tx.commit().await.map_err(db_err)
  }

  async fn order(&self, id: Uuid) -> CoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLS} FROM orders WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    row.map(Order::try_from).transpose()
  }

  async fn order_detail(&self, id: Uuid) -> CoreResult<Option<OrderDetail>> {
    let Some(order) = self.order(id).await? else {
      return Ok(None);
    };
    let mut grouped = self.lines_by_order(&[order.id]).await?;
    let items = grouped.remove(&order.id).unwrap_or_default();
    Ok(Some(OrderDetail { order, items }))
  }

  async fn orders_for_customer(&self, customer_id: Uuid) -> CoreResult<Vec<OrderDetail>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC"
    ))
    .bind(customer_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;
    self.order_rows_to_details(rows).await
  }

  async fn orders_for_restaurant(
    &self,
    restaurant_id: Uuid,
    status: Option<OrderStatus>,
  ) -> CoreResult<Vec<OrderDetail>> {
    let rows: Vec<OrderRow> = match status {
      Some(status) => {
        sqlx::query_as(&format!(
          "SELECT {ORDER_COLS} FROM orders WHERE restaurant_id = $1 AND status = $2 ORDER BY created_at DESC"
        ))
        .bind(restaurant_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
      }
      None => {
        sqlx::query_as(&format!(
          "SELECT {ORDER_COLS} FROM orders WHERE restaurant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await
      }
    }
    .map_err(db_err)?;
    self.order_rows_to_details(rows).await
  }

  async fn set_order_status(&self, id: Uuid, expected: OrderStatus, next: OrderStatus) -> CoreResult<bool> {
    // The CAS: only one of several concurrent transitions can see its
    // expected previous status.
    let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
      .bind(next.as_str())
      .bind(id)
      .bind(expected.as_str())
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(result.rows_affected() == 1)
  }

  async fn review_for(&self, customer_id: Uuid, restaurant_id: Uuid) -> CoreResult<Option<Review>> {
    let row: Option<ReviewRow> = sqlx::query_as(&format!(
      "SELECT {REVIEW_COLS} FROM reviews WHERE customer_id = $1 AND restaurant_id = $2"
    ))
    .bind(customer_id)
    .bind(restaurant_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.map(Review::from))
  }

  async fn reviews_for_restaurant(&self, restaurant_id: Uuid) -> CoreResult<Vec<Review>> {
    let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
      "SELECT {REVIEW_COLS} FROM reviews WHERE restaurant_id = $1 ORDER BY created_at DESC"
    ))
    .bind(restaurant_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(Review::from).collect())
  }

  async fn has_order_in_status(
    &self,
    customer_id: Uuid,
    restaurant_id: Uuid,
    statuses: &[OrderStatus],
  ) -> CoreResult<bool> {
    let statuses: Vec<String> = statuses.iter().map(|status| status.as_str().to_string()).collect();
    let (exists,): (bool,) = sqlx::query_as(
      "SELECT EXISTS (SELECT 1 FROM orders WHERE customer_id = $1 AND restaurant_id = $2 AND status = ANY($3))",
    )
    .bind(customer_id)
    .bind(restaurant_id)
    .bind(&statuses)
    .fetch_one(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(exists)
  }

  async fn insert_review(&self, new: NewReview) -> CoreResult<Review> {
    let mut tx = self.pool.begin().await.map_err(db_err)?;

    // Locking the restaurant row serializes concurrent review writes per
    // restaurant and pins the previous aggregate the incremental formula
    // builds on.
    let aggregate: Option<(f64, i64)> =
      sqlx::query_as("SELECT rating_avg, rating_count FROM restaurants WHERE id = $1 FOR UPDATE")
        .bind(new.restaurant_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
    let (prev_avg, prev_count) = aggregate.ok_or_else(|| CoreError::not_found("restaurant"))?;

    let row: ReviewRow = sqlx::query_as(&format!(
      "INSERT INTO reviews (id, customer_id, restaurant_id, rating, comment) \
       VALUES ($1, $2, $3, $4, $5) RETURNING {REVIEW_COLS}"
    ))
    .bind(Uuid::new_v4())
    .bind(new.customer_id)
    .bind(new.restaurant_id)
    .bind(new.rating)
    .bind(&new.comment)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| unique_conflict(e, "customer already reviewed this restaurant"))?;

    let (avg, count) = rating::apply_new_review(prev_avg, prev_count, new.rating);
    sqlx::query("UPDATE restaurants SET rating_avg = $1, rating_count = $2 WHERE id = $3")
      .bind(avg)
      .bind(count)
      .bind(new.restaurant_id)
      .execute(&mut *tx)
      .await
      .map_err(db_err)?;

    tx.commit().await.map_err(db_err)?;
    Ok(row.into())
  }

  async fn update_review(
    &self,
    customer_id: Uuid,
    restaurant_id: Uuid,
    rating_value: i32,
    comment: Option<String>,
  ) -> CoreResult<Option<Review>> {
    let mut tx = self.pool.begin().await.map_err(db_err)?;

    let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM restaurants WHERE id = $1 FOR UPDATE")
      .bind(restaurant_id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(db_err)?;
    if locked.is_none() {
      return Ok(None);
    }

    let row: Option<ReviewRow> = sqlx::query_as(&format!(
      "UPDATE reviews SET rating = $1, comment = $2, updated_at = now() \
       WHERE customer_id = $3 AND restaurant_id = $4 RETURNING {REVIEW_COLS}"
    ))
    .bind(rating_value)
    .bind(&comment)
    .bind(customer_id)
    .bind(restaurant_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_err)?;
    let Some(row) = row else {
      return Ok(None);
    };

    let (sum, count): (i64, i64) = sqlx::query_as(
      "SELECT COALESCE(SUM(rating), 0)::BIGINT, COUNT(*) FROM reviews WHERE restaurant_id = $1",
    )
    .bind(restaurant_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_err)?;
    let (avg, count) = rating::recompute(sum, count);
    sqlx::query("UPDATE restaurants SET rating_avg = $1, rating_count = $2 WHERE id = $3")
      .bind(avg)
      .bind(count)
      .bind(restaurant_id)
      .execute(&mut *tx)
      .await
      .map_err(db_err)?;

    tx.commit().await.map_err(db_err)?;
    Ok(Some(row.into()))
  }

  async fn delete_review(&self, customer_id: Uuid, restaurant_id: Uuid) -> CoreResult<bool> {
    let mut tx = self.pool.begin().await.map_err(db_err)?;

    let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM restaurants WHERE id = $1 FOR UPDATE")
      .bind(restaurant_id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(db_err)?;
    if locked.is_none() {
      return Ok(false);
    }

    let deleted: Option<(Uuid,)> =
      sqlx::query_as("DELETE FROM reviews WHERE customer_id = $1 AND restaurant_id = $2 RETURNING id")
        .bind(customer_id)
        .bind(restaurant_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
    if deleted.is_none() {
      return Ok(false);
    }

    let (sum, count): (i64, i64) = sqlx::query_as(
      "SELECT COALESCE(SUM(rating), 0)::BIGINT, COUNT(*) FROM reviews WHERE restaurant_id = $1",
    )
    .bind(restaurant_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_err)?;
    let (avg, count) = rating::recompute(sum, count);
    sqlx::query("UPDATE restaurants SET rating_avg = $1, rating_count = $2 WHERE id = $3")
      .bind(avg)
      .bind(count)
      .bind(restaurant_id)
      .execute(&mut *tx)
      .await
      .map_err(db_err)?;

    tx.commit().await.map_err(db_err)?;
    Ok(true)
  }

  async fn review_aggregate_inputs(&self, restaurant_id: Uuid) -> CoreResult<(i64, i64)> {
    sqlx::query_as("SELECT COALESCE(SUM(rating), 0)::BIGINT, COUNT(*) FROM reviews WHERE restaurant_id = $1")
      .bind(restaurant_id)
      .fetch_one(&self.pool)
      .await
      .map_err(db_err)
  }
}

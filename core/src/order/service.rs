// core/src/order/service.rs

use crate::error::{CoreError, CoreResult};
use crate::model::{Actor, CreateOrder, Order, OrderDetail, OrderLine};
use crate::order::status::{can_transition, OrderStatus, Role};
use crate::store::Store;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Order creation and the status state machine, over any [`Store`].
pub struct OrderService {
  store: Arc<dyn Store>,
}

impl OrderService {
  pub fn new(store: Arc<dyn Store>) -> Self {
    OrderService { store }
  }

  /// Creates an order in `pending` status with all line items snapshotted
  /// from the current menu, in one atomic unit.
  #[instrument(name = "orders::create", skip(self, input), fields(customer_id = %actor.user_id, restaurant_id = %input.restaurant_id))]
  pub async fn create_order(&self, actor: Actor, input: CreateOrder) -> CoreResult<OrderDetail> {
    if input.items.is_empty() {
      return Err(CoreError::Validation("at least one item is required".to_string()));
    }
    for line in &input.items {
      if line.quantity < 1 {
        return Err(CoreError::Validation(format!(
          "quantity must be at least 1, got {}",
          line.quantity
        )));
      }
    }

    if self.store.restaurant(input.restaurant_id).await?.is_none() {
      return Err(CoreError::not_found("restaurant"));
    }

    let mut menu_ids: Vec<Uuid> = input.items.iter().map(|line| line.menu_item_id).collect();
    menu_ids.sort_unstable();
    menu_ids.dedup();
    let menus = self.store.menu_items_by_ids(&menu_ids).await?;
    if menus.len() != menu_ids.len() {
      return Err(CoreError::Validation("some menu items not found".to_string()));
    }
    if menus.iter().any(|item| item.restaurant_id != input.restaurant_id) {
      return Err(CoreError::Validation(
        "menu items must belong to the specified restaurant".to_string(),
      ));
    }
    let menus_by_id: HashMap<Uuid, _> = menus.into_iter().map(|item| (item.id, item)).collect();

    let order = Order {
      id: Uuid::new_v4(),
      customer_id: actor.user_id,
      restaurant_id: input.restaurant_id,
      status: OrderStatus::Pending,
      created_at: Utc::now(),
    };
    let items: Vec<OrderLine> = input
      .items
      .iter()
      .map(|line| {
        let menu = &menus_by_id[&line.menu_item_id];
        OrderLine {
          id: Uuid::new_v4(),
          order_id: order.id,
          menu_item_id: Some(menu.id),
          quantity: line.quantity,
          name_snapshot: menu.name.clone(),
          unit_price_cents: menu.price_cents,
          line_subtotal_cents: line.quantity as i64 * menu.price_cents,
        }
      })
      .collect();

    self.store.insert_order_with_items(&order, &items).await?;
    info!(order_id = %order.id, lines = items.len(), "order created");
    Ok(OrderDetail { order, items })
  }

  /// Validates and applies a status transition for the given actor.
  ///
  /// The persisted write is a compare-and-set on the status read here, so
  /// of two concurrent transitions exactly one wins; the loser gets
  /// `Conflict`.
  #[instrument(name = "orders::request_transition", skip(self), fields(user_id = %actor.user_id, %order_id, target = %target))]
  pub async fn request_transition(&self, actor: Actor, order_id: Uuid, target: OrderStatus) -> CoreResult<Order> {
    let order = self
      .store
      .order(order_id)
      .await?
      .ok_or_else(|| CoreError::not_found("order"))?;
    let restaurant = self
      .store
      .restaurant(order.restaurant_id)
      .await?
      .ok_or_else(|| CoreError::not_found("restaurant"))?;

    // Owner wins when both relations hold (an owner ordering from their own
    // restaurant still drives fulfillment).
    let role = if actor.is_restaurant_owner && restaurant.owner_id == actor.user_id {
      Role::Owner
    } else if order.customer_id == actor.user_id {
      Role::Customer
    } else {
      return Err(CoreError::Authorization("not authorized for this order".to_string()));
    };

    let from = order.status;
    if from.is_terminal() || !can_transition(role, from, target) {
      return Err(CoreError::InvalidTransition { role, from, to: target });
    }

    if !self.store.set_order_status(order_id, from, target).await? {
      return Err(CoreError::Conflict(
        "order status changed concurrently; transition no longer applies".to_string(),
      ));
    }

    info!(role = %role, from = %from, to = %target, "order status updated");
    Ok(Order { status: target, ..order })
  }

  /// The order with its line items, visible only to its customer or the
  /// owning restaurant's owner.
  #[instrument(name = "orders::detail", skip(self), fields(user_id = %actor.user_id, %order_id))]
  pub async fn order_detail(&self, actor: Actor, order_id: Uuid) -> CoreResult<OrderDetail> {
    let detail = self
      .store
      .order_detail(order_id)
      .await?
      .ok_or_else(|| CoreError::not_found("order"))?;
    let restaurant = self
      .store
      .restaurant(detail.order.restaurant_id)
      .await?
      .ok_or_else(|| CoreError::not_found("restaurant"))?;
    if detail.order.customer_id != actor.user_id && restaurant.owner_id != actor.user_id {
      return Err(CoreError::Authorization("not authorized for this order".to_string()));
    }
    Ok(detail)
  }

  pub async fn orders_for_customer(&self, actor: Actor) -> CoreResult<Vec<OrderDetail>> {
    self.store.orders_for_customer(actor.user_id).await
  }

  /// A restaurant's orders, owner only, optionally filtered by status.
  #[instrument(name = "orders::for_restaurant", skip(self), fields(user_id = %actor.user_id, %restaurant_id))]
  pub async fn orders_for_restaurant(
    &self,
    actor: Actor,
    restaurant_id: Uuid,
    status: Option<OrderStatus>,
  ) -> CoreResult<Vec<OrderDetail>> {
    let restaurant = self
      .store
      .restaurant(restaurant_id)
      .await?
      .ok_or_else(|| CoreError::not_found("restaurant"))?;
    if restaurant.owner_id != actor.user_id {
      return Err(CoreError::Authorization(
        "only the owner may list a restaurant's orders".to_string(),
      ));
    }
    self.store.orders_for_restaurant(restaurant_id, status).await
  }
}

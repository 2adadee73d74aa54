// tests/order_transition_tests.rs
mod common; // Reference the common module

use common::*;
use mensa_core::model::{CreateOrder, MenuItemPatch, NewOrderLine};
use mensa_core::order::{allowed_targets, ALL_STATUSES};
use mensa_core::{CoreError, OrderStatus, Role, Store};
use uuid::Uuid;

#[tokio::test]
async fn every_allowed_transition_succeeds_and_persists() {
  let world = seed_world().await;

  for role in [Role::Owner, Role::Customer] {
    let actor = match role {
      Role::Owner => world.owner,
      Role::Customer => world.customer,
    };
    for from in ALL_STATUSES {
      for &to in allowed_targets(role, from) {
        let order_id = order_in_status(&world, world.customer, from).await;
        let updated = world.orders.request_transition(actor, order_id, to).await.unwrap();
        assert_eq!(updated.status, to, "{role}: {from} -> {to}");
        let persisted = world.store.order(order_id).await.unwrap().unwrap();
        assert_eq!(persisted.status, to, "{role}: {from} -> {to} must persist");
      }
    }
  }
}

#[tokio::test]
async fn every_disallowed_transition_fails_with_invalid_transition() {
  let world = seed_world().await;

  for role in [Role::Owner, Role::Customer] {
    let actor = match role {
      Role::Owner => world.owner,
      Role::Customer => world.customer,
    };
    for from in ALL_STATUSES {
      for to in ALL_STATUSES {
        if allowed_targets(role, from).contains(&to) {
          continue;
        }
        let order_id = order_in_status(&world, world.customer, from).await;
        let err = world.orders.request_transition(actor, order_id, to).await.unwrap_err();
        match err {
          CoreError::InvalidTransition {
            role: err_role,
            from: err_from,
            to: err_to,
          } => {
            assert_eq!((err_role, err_from, err_to), (role, from, to));
          }
          other => panic!("{role}: {from} -> {to} should be InvalidTransition, got {other:?}"),
        }
        // and the stored status is untouched
        let persisted = world.store.order(order_id).await.unwrap().unwrap();
        assert_eq!(persisted.status, from);
      }
    }
  }
}

#[tokio::test]
async fn finalized_orders_are_immutable_for_both_roles() {
  let world = seed_world().await;

  for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
    for actor in [world.owner, world.customer] {
      let order_id = order_in_status(&world, world.customer, terminal).await;
      for target in ALL_STATUSES {
        let err = world.orders.request_transition(actor, order_id, target).await.unwrap_err();
        assert!(
          matches!(err, CoreError::InvalidTransition { .. }),
          "terminal {terminal} -> {target} must be InvalidTransition"
        );
      }
    }
  }
}

#[tokio::test]
async fn unknown_order_is_not_found() {
  let world = seed_world().await;
  let err = world
    .orders
    .request_transition(world.owner, Uuid::new_v4(), OrderStatus::Confirmed)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn unrelated_actor_is_rejected_regardless_of_status_and_target() {
  let world = seed_world().await;

  for from in ALL_STATUSES {
    let order_id = order_in_status(&world, world.customer, from).await;
    for target in ALL_STATUSES {
      let err = world
        .orders
        .request_transition(world.outsider, order_id, target)
        .await
        .unwrap_err();
      assert!(
        matches!(err, CoreError::Authorization(_)),
        "outsider on {from} -> {target} must be Authorization"
      );
    }
  }
}

#[tokio::test]
async fn owner_flag_alone_does_not_grant_the_owner_role() {
  let world = seed_world().await;
  // An owner account that owns a different restaurant and did not place the
  // order has no relation to it at all.
  let store = world.store.clone() as std::sync::Arc<dyn Store>;
  let other_owner = new_actor(&store, "rival@example.com", true).await;
  store
    .insert_restaurant(mensa_core::model::NewRestaurant {
      owner_id: other_owner.user_id,
      name: "Rival Diner".to_string(),
      description: None,
    })
    .await
    .unwrap();

  let order_id = order_in_status(&world, world.customer, OrderStatus::Pending).await;
  let err = world
    .orders
    .request_transition(other_owner, order_id, OrderStatus::Confirmed)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Authorization(_)));
}

#[tokio::test]
async fn owner_who_ordered_at_own_restaurant_keeps_the_owner_role() {
  let world = seed_world().await;
  // Owner precedence: the owner may confirm their own pending order, which
  // a plain customer never could do.
  let order_id = order_in_status(&world, world.owner, OrderStatus::Pending).await;
  let updated = world
    .orders
    .request_transition(world.owner, order_id, OrderStatus::Confirmed)
    .await
    .unwrap();
  assert_eq!(updated.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn customer_cannot_cancel_after_owner_confirms() {
  let world = seed_world().await;
  let order_id = order_in_status(&world, world.customer, OrderStatus::Pending).await;

  let confirmed = world
    .orders
    .request_transition(world.owner, order_id, OrderStatus::Confirmed)
    .await
    .unwrap();
  assert_eq!(confirmed.status, OrderStatus::Confirmed);

  let err = world
    .orders
    .request_transition(world.customer, order_id, OrderStatus::Cancelled)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    CoreError::InvalidTransition {
      role: Role::Customer,
      from: OrderStatus::Confirmed,
      to: OrderStatus::Cancelled,
    }
  ));
}

#[tokio::test]
async fn concurrent_transitions_let_exactly_one_win() {
  let world = seed_world().await;
  let order_id = order_in_status(&world, world.customer, OrderStatus::Pending).await;

  let confirm = world.orders.request_transition(world.owner, order_id, OrderStatus::Confirmed);
  let cancel = world
    .orders
    .request_transition(world.customer, order_id, OrderStatus::Cancelled);
  let (confirm_result, cancel_result) = tokio::join!(confirm, cancel);

  let winners = [confirm_result.is_ok(), cancel_result.is_ok()].iter().filter(|ok| **ok).count();
  assert_eq!(winners, 1, "exactly one concurrent transition may win");

  for result in [confirm_result, cancel_result] {
    if let Err(err) = result {
      assert!(
        matches!(err, CoreError::Conflict(_) | CoreError::InvalidTransition { .. }),
        "loser must see Conflict or InvalidTransition, got {err:?}"
      );
    }
  }

  let persisted = world.store.order(order_id).await.unwrap().unwrap();
  assert!(matches!(persisted.status, OrderStatus::Confirmed | OrderStatus::Cancelled));
}

// --- order creation & snapshots ---

#[tokio::test]
async fn order_creation_validates_its_input() {
  let world = seed_world().await;

  let empty = CreateOrder {
    restaurant_id: world.restaurant.id,
    items: vec![],
  };
  assert!(matches!(
    world.orders.create_order(world.customer, empty).await.unwrap_err(),
    CoreError::Validation(_)
  ));

  let zero_quantity = CreateOrder {
    restaurant_id: world.restaurant.id,
    items: vec![NewOrderLine {
      menu_item_id: world.burger.id,
      quantity: 0,
    }],
  };
  assert!(matches!(
    world.orders.create_order(world.customer, zero_quantity).await.unwrap_err(),
    CoreError::Validation(_)
  ));

  let unknown_item = CreateOrder {
    restaurant_id: world.restaurant.id,
    items: vec![NewOrderLine {
      menu_item_id: Uuid::new_v4(),
      quantity: 1,
    }],
  };
  assert!(matches!(
    world.orders.create_order(world.customer, unknown_item).await.unwrap_err(),
    CoreError::Validation(_)
  ));

  let unknown_restaurant = CreateOrder {
    restaurant_id: Uuid::new_v4(),
    items: vec![NewOrderLine {
      menu_item_id: world.burger.id,
      quantity: 1,
    }],
  };
  assert!(matches!(
    world
      .orders
      .create_order(world.customer, unknown_restaurant)
      .await
      .unwrap_err(),
    CoreError::NotFound(_)
  ));
}

#[tokio::test]
async fn menu_items_must_belong_to_the_ordered_restaurant() {
  let world = seed_world().await;
  let store = world.store.clone() as std::sync::Arc<dyn Store>;
  let other_owner = new_actor(&store, "second-owner@example.com", true).await;
  let other_restaurant = store
    .insert_restaurant(mensa_core::model::NewRestaurant {
      owner_id: other_owner.user_id,
      name: "Osteria Due".to_string(),
      description: None,
    })
    .await
    .unwrap();
  let foreign_item = store
    .insert_menu_item(mensa_core::model::NewMenuItem {
      restaurant_id: other_restaurant.id,
      name: "Tiramisu".to_string(),
      description: None,
      category: None,
      price_cents: 600,
      available: true,
    })
    .await
    .unwrap();

  let err = world
    .orders
    .create_order(
      world.customer,
      CreateOrder {
        restaurant_id: world.restaurant.id,
        items: vec![NewOrderLine {
          menu_item_id: foreign_item.id,
          quantity: 1,
        }],
      },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn line_snapshots_survive_menu_changes_and_deletion() {
  let world = seed_world().await;
  let detail = place_order(&world, world.customer).await;

  assert_eq!(detail.order.status, OrderStatus::Pending);
  let burger_line = detail
    .items
    .iter()
    .find(|line| line.menu_item_id == Some(world.burger.id))
    .unwrap();
  assert_eq!(burger_line.name_snapshot, "Burger");
  assert_eq!(burger_line.unit_price_cents, 950);
  assert_eq!(burger_line.line_subtotal_cents, 2 * 950);
  assert_eq!(detail.total_cents(), 2 * 950 + 350);

  // Reprice and rename the burger, delete the fries outright.
  world
    .store
    .update_menu_item(
      world.burger.id,
      MenuItemPatch {
        name: "Smash Burger".to_string(),
        description: None,
        category: None,
        price_cents: 1250,
        available: true,
      },
    )
    .await
    .unwrap();
  world.store.delete_menu_item(world.fries.id).await.unwrap();

  let after = world.orders.order_detail(world.customer, detail.order.id).await.unwrap();
  let burger_after = after
    .items
    .iter()
    .find(|line| line.menu_item_id == Some(world.burger.id))
    .unwrap();
  assert_eq!(burger_after.name_snapshot, "Burger");
  assert_eq!(burger_after.unit_price_cents, 950);

  let fries_after = after.items.iter().find(|line| line.name_snapshot == "Fries").unwrap();
  assert_eq!(fries_after.menu_item_id, None, "deleted item clears lineage only");
  assert_eq!(fries_after.unit_price_cents, 350);
}

#[tokio::test]
async fn order_detail_is_limited_to_participants() {
  let world = seed_world().await;
  let detail = place_order(&world, world.customer).await;

  assert!(world.orders.order_detail(world.customer, detail.order.id).await.is_ok());
  assert!(world.orders.order_detail(world.owner, detail.order.id).await.is_ok());
  assert!(matches!(
    world
      .orders
      .order_detail(world.outsider, detail.order.id)
      .await
      .unwrap_err(),
    CoreError::Authorization(_)
  ));
}

#[tokio::test]
async fn restaurant_order_listing_is_owner_only_and_filters_by_status() {
  let world = seed_world().await;
  let _pending = order_in_status(&world, world.customer, OrderStatus::Pending).await;
  let completed = order_in_status(&world, world.customer2, OrderStatus::Completed).await;

  let all = world
    .orders
    .orders_for_restaurant(world.owner, world.restaurant.id, None)
    .await
    .unwrap();
  assert_eq!(all.len(), 2);

  let only_completed = world
    .orders
    .orders_for_restaurant(world.owner, world.restaurant.id, Some(OrderStatus::Completed))
    .await
    .unwrap();
  assert_eq!(only_completed.len(), 1);
  assert_eq!(only_completed[0].order.id, completed);

  assert!(matches!(
    world
      .orders
      .orders_for_restaurant(world.customer, world.restaurant.id, None)
      .await
      .unwrap_err(),
    CoreError::Authorization(_)
  ));
}

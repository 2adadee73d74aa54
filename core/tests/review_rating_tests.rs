// tests/review_rating_tests.rs
mod common; // Reference the common module

use common::*;
use mensa_core::{CoreError, OrderStatus, ReviewPolicy, Store};
use uuid::Uuid;

#[tokio::test]
async fn first_review_sets_the_aggregate() {
  let world = seed_world().await;
  order_in_status(&world, world.customer, OrderStatus::Completed).await;

  world
    .reviews
    .create_review(world.customer, world.restaurant.id, 4, Some("solid".to_string()))
    .await
    .unwrap();

  let (avg, count) = aggregate(&world).await;
  assert_eq!((avg, count), (4.0, 1));
  assert_aggregate_invariant(&world).await;
}

#[tokio::test]
async fn second_review_averages_the_aggregate() {
  let world = seed_world().await;
  order_in_status(&world, world.customer, OrderStatus::Completed).await;
  order_in_status(&world, world.customer2, OrderStatus::Completed).await;

  world
    .reviews
    .create_review(world.customer, world.restaurant.id, 4, None)
    .await
    .unwrap();
  world
    .reviews
    .create_review(world.customer2, world.restaurant.id, 2, None)
    .await
    .unwrap();

  let (avg, count) = aggregate(&world).await;
  assert_eq!(count, 2);
  assert!((avg - 3.0).abs() < TOLERANCE);
  assert_aggregate_invariant(&world).await;
}

#[tokio::test]
async fn deleting_a_review_recomputes_exactly() {
  let world = seed_world().await;
  order_in_status(&world, world.customer, OrderStatus::Completed).await;
  order_in_status(&world, world.customer2, OrderStatus::Completed).await;

  world
    .reviews
    .create_review(world.customer, world.restaurant.id, 4, None)
    .await
    .unwrap();
  world
    .reviews
    .create_review(world.customer2, world.restaurant.id, 2, None)
    .await
    .unwrap();

  // drop the 4 from {4, 2}
  world.reviews.delete_review(world.customer, world.restaurant.id).await.unwrap();

  let (avg, count) = aggregate(&world).await;
  assert_eq!((avg, count), (2.0, 1));
  assert_aggregate_invariant(&world).await;
}

#[tokio::test]
async fn review_requires_a_qualifying_order() {
  let world = seed_world().await;
  // A pending order is not qualifying under the default policy.
  order_in_status(&world, world.customer, OrderStatus::Pending).await;

  let err = world
    .reviews
    .create_review(world.customer, world.restaurant.id, 5, None)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotEligible(_)));

  let eligibility = world.reviews.can_review(world.customer, world.restaurant.id).await.unwrap();
  assert!(!eligibility.allowed);
  assert!(eligibility.reason.is_some());

  let (avg, count) = aggregate(&world).await;
  assert_eq!((avg, count), (0.0, 0));
}

#[tokio::test]
async fn qualifying_statuses_are_policy_driven() {
  let policy = ReviewPolicy::from_csv("confirmed,preparing").unwrap();
  let world = seed_world_with_policy(policy).await;
  order_in_status(&world, world.customer, OrderStatus::Confirmed).await;
  // A completed order no longer counts under this policy.
  order_in_status(&world, world.customer2, OrderStatus::Completed).await;

  assert!(world
    .reviews
    .create_review(world.customer, world.restaurant.id, 5, None)
    .await
    .is_ok());
  assert!(matches!(
    world
      .reviews
      .create_review(world.customer2, world.restaurant.id, 5, None)
      .await
      .unwrap_err(),
    CoreError::NotEligible(_)
  ));
}

#[tokio::test]
async fn one_review_per_customer_per_restaurant() {
  let world = seed_world().await;
  order_in_status(&world, world.customer, OrderStatus::Completed).await;

  world
    .reviews
    .create_review(world.customer, world.restaurant.id, 4, None)
    .await
    .unwrap();
  let err = world
    .reviews
    .create_review(world.customer, world.restaurant.id, 5, None)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Conflict(_)));

  let eligibility = world.reviews.can_review(world.customer, world.restaurant.id).await.unwrap();
  assert!(!eligibility.allowed);

  // the failed second create must not have touched the aggregate
  let (avg, count) = aggregate(&world).await;
  assert_eq!((avg, count), (4.0, 1));
}

#[tokio::test]
async fn out_of_range_ratings_never_touch_the_aggregate() {
  let world = seed_world().await;
  order_in_status(&world, world.customer, OrderStatus::Completed).await;

  for rating in [0, 6, -3] {
    let err = world
      .reviews
      .create_review(world.customer, world.restaurant.id, rating, None)
      .await
      .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)), "rating {rating}");
  }
  assert_eq!(aggregate(&world).await, (0.0, 0));
  assert!(world
    .reviews
    .my_review(world.customer, world.restaurant.id)
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn updating_a_review_recomputes_and_stamps() {
  let world = seed_world().await;
  order_in_status(&world, world.customer, OrderStatus::Completed).await;
  order_in_status(&world, world.customer2, OrderStatus::Completed).await;

  let original = world
    .reviews
    .create_review(world.customer, world.restaurant.id, 2, Some("meh".to_string()))
    .await
    .unwrap();
  world
    .reviews
    .create_review(world.customer2, world.restaurant.id, 4, None)
    .await
    .unwrap();

  let updated = world
    .reviews
    .update_review(world.customer, world.restaurant.id, 5, Some("they improved".to_string()))
    .await
    .unwrap();
  assert_eq!(updated.rating, 5);
  assert_eq!(updated.comment.as_deref(), Some("they improved"));
  assert!(updated.updated_at >= original.created_at);

  let (avg, count) = aggregate(&world).await;
  assert_eq!(count, 2);
  assert!((avg - 4.5).abs() < TOLERANCE);
  assert_aggregate_invariant(&world).await;
}

#[tokio::test]
async fn update_and_delete_require_an_existing_review() {
  let world = seed_world().await;
  order_in_status(&world, world.customer, OrderStatus::Completed).await;

  assert!(matches!(
    world
      .reviews
      .update_review(world.customer, world.restaurant.id, 4, None)
      .await
      .unwrap_err(),
    CoreError::NotFound(_)
  ));
  assert!(matches!(
    world
      .reviews
      .delete_review(world.customer, world.restaurant.id)
      .await
      .unwrap_err(),
    CoreError::NotFound(_)
  ));
}

#[tokio::test]
async fn unknown_restaurant_is_not_found() {
  let world = seed_world().await;
  let ghost = Uuid::new_v4();

  assert!(matches!(
    world
      .reviews
      .create_review(world.customer, ghost, 4, None)
      .await
      .unwrap_err(),
    CoreError::NotFound(_)
  ));
  assert!(matches!(
    world.reviews.can_review(world.customer, ghost).await.unwrap_err(),
    CoreError::NotFound(_)
  ));
}

#[tokio::test]
async fn aggregate_invariant_holds_across_a_mixed_write_sequence() {
  let world = seed_world().await;
  let store = world.store.clone() as std::sync::Arc<dyn Store>;

  let mut reviewers = vec![world.customer, world.customer2];
  for i in 0..3 {
    let extra = new_actor(&store, &format!("guest{i}@example.com"), false).await;
    reviewers.push(extra);
  }
  for reviewer in &reviewers {
    order_in_status(&world, *reviewer, OrderStatus::Completed).await;
  }

  let ratings = [5, 3, 4, 1, 2];
  for (reviewer, rating) in reviewers.iter().zip(ratings) {
    world
      .reviews
      .create_review(*reviewer, world.restaurant.id, rating, None)
      .await
      .unwrap();
    assert_aggregate_invariant(&world).await;
  }

  world
    .reviews
    .update_review(world.customer, world.restaurant.id, 1, None)
    .await
    .unwrap();
  assert_aggregate_invariant(&world).await;

  world
    .reviews
    .delete_review(world.customer2, world.restaurant.id)
    .await
    .unwrap();
  assert_aggregate_invariant(&world).await;

  world
    .reviews
    .delete_review(reviewers[4], world.restaurant.id)
    .await
    .unwrap();
  assert_aggregate_invariant(&world).await;

  let listed = world.reviews.reviews_for(world.restaurant.id).await.unwrap();
  assert_eq!(listed.len() as i64, aggregate(&world).await.1);
}

#[tokio::test]
async fn eligibility_probe_allows_a_completed_customer() {
  let world = seed_world().await;
  order_in_status(&world, world.customer, OrderStatus::Completed).await;

  let eligibility = world.reviews.can_review(world.customer, world.restaurant.id).await.unwrap();
  assert!(eligibility.allowed);
  assert!(eligibility.reason.is_none());
}

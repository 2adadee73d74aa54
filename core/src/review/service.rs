// core/src/review/service.rs

use crate::error::{CoreError, CoreResult};
use crate::model::{Actor, NewReview, Review};
use crate::review::policy::ReviewPolicy;
use crate::review::rating;
use crate::store::Store;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Outcome of the eligibility probe, shaped for direct display.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewEligibility {
  pub allowed: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
}

impl ReviewEligibility {
  fn denied(reason: &str) -> Self {
    ReviewEligibility {
      allowed: false,
      reason: Some(reason.to_string()),
    }
  }
}

/// Review lifecycle over any [`Store`]. Every write refreshes the owning
/// restaurant's rating aggregate inside the store's transaction.
pub struct ReviewService {
  store: Arc<dyn Store>,
  policy: ReviewPolicy,
}

impl ReviewService {
  pub fn new(store: Arc<dyn Store>, policy: ReviewPolicy) -> Self {
    ReviewService { store, policy }
  }

  /// Creates the actor's review of a restaurant.
  ///
  /// Preconditions, in order: rating in bounds, restaurant exists, the
  /// actor has an order there in a qualifying status, and no prior review
  /// by the actor exists.
  #[instrument(name = "reviews::create", skip(self, comment), fields(customer_id = %actor.user_id, %restaurant_id, rating))]
  pub async fn create_review(
    &self,
    actor: Actor,
    restaurant_id: Uuid,
    rating: i32,
    comment: Option<String>,
  ) -> CoreResult<Review> {
    rating::validate_rating(rating)?;
    if self.store.restaurant(restaurant_id).await?.is_none() {
      return Err(CoreError::not_found("restaurant"));
    }
    if !self
      .store
      .has_order_in_status(actor.user_id, restaurant_id, self.policy.qualifying())
      .await?
    {
      return Err(CoreError::NotEligible(
        "reviews require a qualifying order at this restaurant".to_string(),
      ));
    }
    if self.store.review_for(actor.user_id, restaurant_id).await?.is_some() {
      return Err(CoreError::Conflict("you already reviewed this restaurant".to_string()));
    }

    let review = self
      .store
      .insert_review(NewReview {
        customer_id: actor.user_id,
        restaurant_id,
        rating,
        comment,
      })
      .await?;
    info!(review_id = %review.id, "review created");
    Ok(review)
  }

  /// Updates the actor's own review; the keying by (actor, restaurant)
  /// already restricts the write to the owning customer.
  #[instrument(name = "reviews::update", skip(self, comment), fields(customer_id = %actor.user_id, %restaurant_id, rating))]
  pub async fn update_review(
    &self,
    actor: Actor,
    restaurant_id: Uuid,
    rating: i32,
    comment: Option<String>,
  ) -> CoreResult<Review> {
    rating::validate_rating(rating)?;
    self
      .store
      .update_review(actor.user_id, restaurant_id, rating, comment)
      .await?
      .ok_or_else(|| CoreError::not_found("review"))
  }

  /// Deletes the actor's own review.
  #[instrument(name = "reviews::delete", skip(self), fields(customer_id = %actor.user_id, %restaurant_id))]
  pub async fn delete_review(&self, actor: Actor, restaurant_id: Uuid) -> CoreResult<()> {
    if !self.store.delete_review(actor.user_id, restaurant_id).await? {
      return Err(CoreError::not_found("review"));
    }
    Ok(())
  }

  /// Non-failing eligibility probe for the UI: may this actor create a
  /// review here, and if not, why not.
  pub async fn can_review(&self, actor: Actor, restaurant_id: Uuid) -> CoreResult<ReviewEligibility> {
    if self.store.restaurant(restaurant_id).await?.is_none() {
      return Err(CoreError::not_found("restaurant"));
    }
    if !self
      .store
      .has_order_in_status(actor.user_id, restaurant_id, self.policy.qualifying())
      .await?
    {
      return Ok(ReviewEligibility::denied(
        "you can review only after a qualifying order",
      ));
    }
    if self.store.review_for(actor.user_id, restaurant_id).await?.is_some() {
      return Ok(ReviewEligibility::denied("you already reviewed this restaurant"));
    }
    Ok(ReviewEligibility {
      allowed: true,
      reason: None,
    })
  }

  pub async fn reviews_for(&self, restaurant_id: Uuid) -> CoreResult<Vec<Review>> {
    self.store.reviews_for_restaurant(restaurant_id).await
  }

  pub async fn my_review(&self, actor: Actor, restaurant_id: Uuid) -> CoreResult<Option<Review>> {
    self.store.review_for(actor.user_id, restaurant_id).await
  }
}

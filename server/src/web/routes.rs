// server/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{auth_handlers, menu_handlers, order_handlers, restaurant_handlers, review_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called from `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(auth_handlers::signup_handler))
          .route("/signin", web::post().to(auth_handlers::signin_handler))
          .route("/signout", web::post().to(auth_handlers::signout_handler))
          .route("/me", web::get().to(auth_handlers::me_handler)),
      )
      .service(
        web::scope("/restaurants")
          .route("", web::get().to(restaurant_handlers::list_restaurants_handler))
          .route("", web::post().to(restaurant_handlers::create_restaurant_handler))
          // literal segment before the `{restaurant_id}` catch-all
          .route("/mine", web::get().to(restaurant_handlers::my_restaurants_handler))
          .route(
            "/{restaurant_id}/menu",
            web::get().to(menu_handlers::list_menu_handler),
          )
          .route(
            "/{restaurant_id}/menu",
            web::post().to(menu_handlers::create_menu_item_handler),
          )
          .route(
            "/{restaurant_id}/orders",
            web::get().to(order_handlers::restaurant_orders_handler),
          )
          .route(
            "/{restaurant_id}/reviews/eligibility",
            web::get().to(review_handlers::review_eligibility_handler),
          )
          .route(
            "/{restaurant_id}/reviews/mine",
            web::get().to(review_handlers::my_review_handler),
          )
          .route(
            "/{restaurant_id}/reviews",
            web::get().to(review_handlers::list_reviews_handler),
          )
          .route(
            "/{restaurant_id}/reviews",
            web::post().to(review_handlers::create_review_handler),
          )
          .route(
            "/{restaurant_id}/reviews",
            web::put().to(review_handlers::update_review_handler),
          )
          .route(
            "/{restaurant_id}/reviews",
            web::delete().to(review_handlers::delete_review_handler),
          )
          .route("/{restaurant_id}", web::get().to(restaurant_handlers::get_restaurant_handler))
          .route(
            "/{restaurant_id}",
            web::put().to(restaurant_handlers::update_restaurant_handler),
          )
          .route(
            "/{restaurant_id}",
            web::delete().to(restaurant_handlers::delete_restaurant_handler),
          ),
      )
      .service(
        web::scope("/menu-items")
          .route("/{menu_item_id}", web::put().to(menu_handlers::update_menu_item_handler))
          .route(
            "/{menu_item_id}",
            web::delete().to(menu_handlers::delete_menu_item_handler),
          ),
      )
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("", web::get().to(order_handlers::my_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route(
            "/{order_id}/status",
            web::post().to(order_handlers::update_order_status_handler),
          ),
      ),
  );
}

// libs/availability-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_utils::extractor::actor_middleware;

use crate::handlers::{self, AvailabilityContext};

pub fn availability_routes(ctx: Arc<AvailabilityContext>) -> Router {
    let public_routes = Router::new()
        .route("/providers/{provider_id}/slots", get(handlers::list_provider_availability))
        .route("/providers/{provider_id}/open", get(handlers::get_open_slots));

    let protected_routes = Router::new()
        .route("/providers/{provider_id}/slots", post(handlers::create_availability))
        .route(
            "/slots/{slot_id}",
            put(handlers::update_availability).delete(handlers::delete_availability),
        )
        .layer(middleware::from_fn(actor_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(ctx)
}

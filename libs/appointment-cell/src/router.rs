// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::actor_middleware;

use crate::handlers::{self, AppointmentContext};

pub fn appointment_routes(ctx: Arc<AppointmentContext>) -> Router {
    // Every appointment operation acts on behalf of someone
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::reschedule_appointment)
                .delete(handlers::delete_appointment),
        )
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/no-show", post(handlers::mark_no_show))
        .route("/providers/{provider_id}", get(handlers::get_provider_appointments))
        .layer(middleware::from_fn(actor_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(ctx)
}

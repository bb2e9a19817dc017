use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use availability_cell::router::availability_routes;

use crate::state::AppServices;

pub fn create_router(services: &AppServices) -> Router {
    Router::new()
        .route("/", get(|| async { "Scheduling API is running!" }))
        .nest("/availability", availability_routes(services.availability.clone()))
        .nest("/appointments", appointment_routes(services.appointments.clone()))
}

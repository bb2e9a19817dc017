// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{resolve_actor, IdentityResolver};
use shared_models::error::{AppError, SchedulingError};
use shared_models::time_window::TimeWindow;
use shared_utils::extractor::Actor;

use crate::models::{
    BookAppointmentRequest, CancelAppointmentRequest, ProviderAppointmentsQuery,
    RescheduleAppointmentRequest,
};
use crate::services::{authorize_booking, authorize_participant, AppointmentLifecycle, BookingEngine};

/// Shared state behind the appointment routes.
pub struct AppointmentContext {
    pub booking: Arc<BookingEngine>,
    pub lifecycle: Arc<AppointmentLifecycle>,
    pub identity: Arc<dyn IdentityResolver>,
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(ctx): State<Arc<AppointmentContext>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_booking(ctx.identity.as_ref(), actor.id(), request.provider_id, request.client_id).await?;

    let window = TimeWindow::new(request.start, request.end)?;
    let appointment = ctx
        .booking
        .request_booking(request.provider_id, request.client_id, window, request.notes)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked, awaiting confirmation"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(ctx): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = ctx.booking.get_appointment(appointment_id).await?;
    authorize_participant(ctx.identity.as_ref(), actor.id(), &appointment).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(ctx): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let window = TimeWindow::new(request.start, request.end)?;
    let appointment = ctx
        .booking
        .update_booking(appointment_id, actor.id(), window)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled"
    })))
}

#[axum::debug_handler]
pub async fn get_provider_appointments(
    State(ctx): State<Arc<AppointmentContext>>,
    Path(provider_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ProviderAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let identity = resolve_actor(ctx.identity.as_ref(), actor.id()).await?;
    if identity.id != provider_id && !identity.is_admin() {
        return Err(SchedulingError::Permission(
            "only the provider or an admin may list these appointments".to_string(),
        )
        .into());
    }

    let range = match (query.from, query.to) {
        (Some(from), Some(to)) => Some(TimeWindow::new(from, to)?),
        (None, None) => None,
        _ => return Err(AppError::BadRequest("from and to must be given together".to_string())),
    };

    let appointments = ctx
        .booking
        .list_provider_appointments(provider_id, range)
        .await?;

    Ok(Json(json!({
        "success": true,
        "provider_id": provider_id,
        "total": appointments.len(),
        "appointments": appointments
    })))
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(ctx): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = ctx.lifecycle.confirm(appointment_id, actor.id()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment confirmed"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(ctx): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    request: Option<Json<CancelAppointmentRequest>>,
) -> Result<Json<Value>, AppError> {
    let reason = request.and_then(|Json(r)| r.reason);
    let appointment = ctx.lifecycle.cancel(appointment_id, actor.id(), reason).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(ctx): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = ctx.lifecycle.complete(appointment_id, actor.id()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment completed"
    })))
}

#[axum::debug_handler]
pub async fn mark_no_show(
    State(ctx): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = ctx.lifecycle.mark_no_show(appointment_id, actor.id()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment marked as no-show"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(ctx): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let removed = ctx.lifecycle.destroy(appointment_id, actor.id()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment_id": removed.id,
        "message": "Appointment deleted"
    })))
}

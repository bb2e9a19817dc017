// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono_tz::Tz;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::IdentityResolver;
use shared_models::error::AppError;
use shared_models::time_window::TimeWindow;
use shared_utils::extractor::Actor;
use shared_utils::timezone::TimezoneTranslator;

use crate::models::{
    AvailabilityQuery, CreateAvailabilityRequest, ListAvailabilityQuery, UpdateAvailabilityRequest,
};
use crate::services::{authorize_slot_owner, AvailabilityRegistry, SlotDiscretizer};

/// Shared state behind the availability routes.
pub struct AvailabilityContext {
    pub registry: Arc<AvailabilityRegistry>,
    pub discretizer: Arc<SlotDiscretizer>,
    pub identity: Arc<dyn IdentityResolver>,
    pub default_zone: Tz,
}

impl AvailabilityContext {
    fn zone_or_default(&self, zone: Option<&str>) -> Result<Tz, AppError> {
        match zone {
            Some(zone_id) => Ok(TimezoneTranslator::parse_zone(zone_id)?),
            None => Ok(self.default_zone),
        }
    }
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_provider_availability(
    State(ctx): State<Arc<AvailabilityContext>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<ListAvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = match query.date {
        Some(date) => {
            let zone = ctx.zone_or_default(query.zone.as_deref())?;
            ctx.registry.list_for_date(provider_id, date, zone).await?
        }
        None => ctx.registry.list_for_provider(provider_id).await?,
    };

    Ok(Json(json!({
        "success": true,
        "provider_id": provider_id,
        "total": slots.len(),
        "slots": slots,
    })))
}

#[axum::debug_handler]
pub async fn get_open_slots(
    State(ctx): State<Arc<AvailabilityContext>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let zone = ctx.zone_or_default(query.zone.as_deref())?;

    let open = ctx
        .discretizer
        .list_available_slots(provider_id, query.date, zone, query.interval)
        .await?;

    debug!("Returning {} open slots for provider {}", open.len(), provider_id);

    Ok(Json(json!({
        "success": true,
        "provider_id": provider_id,
        "date": query.date,
        "zone": zone.name(),
        "total": open.len(),
        "open_slots": open,
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_availability(
    State(ctx): State<Arc<AvailabilityContext>>,
    Path(provider_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_slot_owner(ctx.identity.as_ref(), actor.id(), provider_id).await?;

    let window = TimeWindow::new(request.start, request.end)?;
    let slot = ctx
        .registry
        .create(provider_id, window, request.recurring, request.notes)
        .await?;

    Ok(Json(json!({
        "success": true,
        "slot": slot,
        "message": "Availability created"
    })))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(ctx): State<Arc<AvailabilityContext>>,
    Path(slot_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let existing = ctx.registry.get(slot_id).await?;
    authorize_slot_owner(ctx.identity.as_ref(), actor.id(), existing.provider_id).await?;

    let window = TimeWindow::new(request.start, request.end)?;
    let slot = ctx.registry.update(slot_id, window).await?;

    Ok(Json(json!({
        "success": true,
        "slot": slot,
        "message": "Availability updated"
    })))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(ctx): State<Arc<AvailabilityContext>>,
    Path(slot_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let existing = ctx.registry.get(slot_id).await?;
    authorize_slot_owner(ctx.identity.as_ref(), actor.id(), existing.provider_id).await?;

    let removed = ctx.registry.delete(slot_id).await?;

    Ok(Json(json!({
        "success": true,
        "slot_id": removed.id,
        "message": "Availability deleted"
    })))
}

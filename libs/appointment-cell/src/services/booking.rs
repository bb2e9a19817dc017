// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use availability_cell::AvailabilityRegistry;
use notification_cell::{NotificationEvent, Notifier};
use shared_models::auth::{require_role, resolve_actor, Identity, IdentityResolver, Role};
use shared_models::error::{SchedulingError, ValidationKind};
use shared_models::time_window::TimeWindow;
use shared_utils::clock::Clock;
use shared_utils::locks::ProviderLocks;

use crate::models::{Appointment, AppointmentStatus};
use crate::repository::AppointmentRepository;
use crate::services::conflict::check_conflicts;

/// Validates and records bookings.
///
/// Validation and the write happen while holding the provider's lock, so of two
/// concurrent requests for overlapping windows the second always sees the first
/// and fails with `Conflict`.
pub struct BookingEngine {
    appointments: Arc<dyn AppointmentRepository>,
    availability: Arc<AvailabilityRegistry>,
    identity: Arc<dyn IdentityResolver>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    locks: Arc<ProviderLocks>,
}

impl BookingEngine {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        availability: Arc<AvailabilityRegistry>,
        identity: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        locks: Arc<ProviderLocks>,
    ) -> Self {
        Self {
            appointments,
            availability,
            identity,
            notifier,
            clock,
            locks,
        }
    }

    #[instrument(skip(self, notes))]
    pub async fn request_booking(
        &self,
        provider_id: Uuid,
        client_id: Uuid,
        window: TimeWindow,
        notes: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Booking request for provider {} by client {} at {}", provider_id, client_id, window);

        if provider_id == client_id {
            return Err(SchedulingError::Role(
                "provider and client must be different users".to_string(),
            ));
        }
        require_role(self.identity.as_ref(), provider_id, Role::Provider).await?;
        require_role(self.identity.as_ref(), client_id, Role::Client).await?;

        let appointment = {
            let _guard = self.locks.acquire(provider_id).await;

            self.check_within_availability(provider_id, &window).await?;
            check_conflicts(self.appointments.as_ref(), provider_id, &window, None).await?;

            let now = self.clock.now();
            if window.start() <= now {
                warn!("Rejected booking starting at {} (now {})", window.start(), now);
                return Err(SchedulingError::Validation(ValidationKind::PastBooking));
            }

            let appointment = Appointment::new(provider_id, client_id, window, notes, now);
            self.appointments.insert(appointment.clone()).await?;
            appointment
        };

        info!(
            "Appointment {} booked with provider {} for client {} at {}",
            appointment.id, provider_id, client_id, appointment.window
        );

        self.notifier.enqueue_notification(
            NotificationEvent::Created,
            appointment.id,
            appointment.participants(),
        );

        Ok(appointment)
    }

    /// Moves a pending or confirmed appointment to `new_window`.
    #[instrument(skip(self))]
    pub async fn update_booking(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
        new_window: TimeWindow,
    ) -> Result<Appointment, SchedulingError> {
        let provider_id = self.get_appointment(appointment_id).await?.provider_id;

        let appointment = {
            let _guard = self.locks.acquire(provider_id).await;

            let mut appointment = self.get_appointment(appointment_id).await?;
            authorize_participant(self.identity.as_ref(), actor_id, &appointment).await?;

            if !matches!(appointment.status, AppointmentStatus::Pending | AppointmentStatus::Confirmed) {
                return Err(SchedulingError::State(format!(
                    "cannot reschedule an appointment that is {}",
                    appointment.status
                )));
            }

            self.check_within_availability(provider_id, &new_window).await?;
            check_conflicts(self.appointments.as_ref(), provider_id, &new_window, Some(appointment_id)).await?;

            appointment.window = new_window;
            appointment.updated_at = self.clock.now();
            self.appointments.update(appointment.clone()).await?;
            appointment
        };

        info!("Appointment {} rescheduled to {}", appointment_id, new_window);

        self.notifier.enqueue_notification(
            NotificationEvent::Rescheduled,
            appointment.id,
            appointment.participants(),
        );

        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.appointments
            .get(appointment_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("appointment {}", appointment_id)))
    }

    /// Appointments of a provider in every status, optionally limited to those intersecting `range`.
    pub async fn list_provider_appointments(
        &self,
        provider_id: Uuid,
        range: Option<TimeWindow>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        match range {
            Some(range) => self.appointments.list_overlapping(provider_id, &range).await,
            None => self.appointments.list_for_provider(provider_id).await,
        }
    }

    async fn check_within_availability(
        &self,
        provider_id: Uuid,
        window: &TimeWindow,
    ) -> Result<(), SchedulingError> {
        if !self.availability.covers(provider_id, window).await? {
            warn!("Window {} is outside the availability of provider {}", window, provider_id);
            return Err(SchedulingError::Validation(ValidationKind::OutOfWindow));
        }
        Ok(())
    }
}

/// Admits the provider or client of `appointment`, or an admin.
pub async fn authorize_participant(
    identity: &dyn IdentityResolver,
    actor_id: Uuid,
    appointment: &Appointment,
) -> Result<Identity, SchedulingError> {
    let actor = resolve_actor(identity, actor_id).await?;

    if actor.is_admin() || appointment.is_participant(actor.id) {
        return Ok(actor);
    }

    warn!("Actor {} is not a participant of appointment {}", actor_id, appointment.id);
    Err(SchedulingError::Permission(format!(
        "not a participant of appointment {}",
        appointment.id
    )))
}

/// Admits an admin or a user booking on their own behalf as provider or client.
pub async fn authorize_booking(
    identity: &dyn IdentityResolver,
    actor_id: Uuid,
    provider_id: Uuid,
    client_id: Uuid,
) -> Result<Identity, SchedulingError> {
    let actor = resolve_actor(identity, actor_id).await?;

    if actor.is_admin() || actor.id == provider_id || actor.id == client_id {
        return Ok(actor);
    }

    Err(SchedulingError::Permission(
        "appointments can only be booked by their provider, their client or an admin".to_string(),
    ))
}

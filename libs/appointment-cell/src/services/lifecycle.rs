// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::{NotificationEvent, Notifier};
use shared_config::SchedulingRules;
use shared_models::auth::{resolve_actor, Identity, IdentityResolver};
use shared_models::error::SchedulingError;
use shared_utils::clock::Clock;
use shared_utils::locks::ProviderLocks;

use crate::models::{Appointment, AppointmentStatus};
use crate::repository::AppointmentRepository;
use crate::services::booking::authorize_participant;

/// Valid next statuses for `status`. Terminal statuses have none.
pub fn allowed_transitions(status: AppointmentStatus) -> &'static [AppointmentStatus] {
    match status {
        AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
        AppointmentStatus::Confirmed => &[
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
            AppointmentStatus::NoShow,
        ],
        AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::NoShow => &[],
    }
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Shared by cancel and destroy: still cancellable, and more than `notice` away from its start.
pub fn is_cancellable(appointment: &Appointment, now: DateTime<Utc>, notice: Duration) -> bool {
    can_transition(appointment.status, AppointmentStatus::Cancelled)
        && appointment.window.start() > now + notice
}

/// Drives appointment status changes. Permission is checked before state, and
/// nothing is written when either check fails.
pub struct AppointmentLifecycle {
    appointments: Arc<dyn AppointmentRepository>,
    identity: Arc<dyn IdentityResolver>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    locks: Arc<ProviderLocks>,
    rules: SchedulingRules,
}

impl AppointmentLifecycle {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        identity: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        locks: Arc<ProviderLocks>,
        rules: SchedulingRules,
    ) -> Self {
        Self {
            appointments,
            identity,
            notifier,
            clock,
            locks,
            rules,
        }
    }

    fn cancellation_notice(&self) -> Duration {
        Duration::hours(self.rules.cancellation_notice_hours)
    }

    #[instrument(skip(self))]
    pub async fn confirm(&self, appointment_id: Uuid, actor_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.provider_transition(appointment_id, actor_id, AppointmentStatus::Confirmed)
            .await
    }

    #[instrument(skip(self))]
    pub async fn complete(&self, appointment_id: Uuid, actor_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.provider_transition(appointment_id, actor_id, AppointmentStatus::Completed)
            .await
    }

    #[instrument(skip(self))]
    pub async fn mark_no_show(&self, appointment_id: Uuid, actor_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.provider_transition(appointment_id, actor_id, AppointmentStatus::NoShow)
            .await
    }

    #[instrument(skip(self, reason))]
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        let provider_id = self.load(appointment_id).await?.provider_id;

        let appointment = {
            let _guard = self.locks.acquire(provider_id).await;
            let mut appointment = self.load(appointment_id).await?;

            authorize_participant(self.identity.as_ref(), actor_id, &appointment).await?;
            self.ensure_cancellable(&appointment)?;

            appointment.status = AppointmentStatus::Cancelled;
            appointment.cancellation_reason = reason;
            appointment.updated_at = self.clock.now();
            self.appointments.update(appointment.clone()).await?;
            appointment
        };

        info!("Appointment {} cancelled by {}", appointment_id, actor_id);
        self.notifier.enqueue_notification(
            NotificationEvent::StatusChanged,
            appointment.id,
            appointment.participants(),
        );

        Ok(appointment)
    }

    /// Hard delete under the same eligibility rule as `cancel`.
    #[instrument(skip(self))]
    pub async fn destroy(&self, appointment_id: Uuid, actor_id: Uuid) -> Result<Appointment, SchedulingError> {
        let provider_id = self.load(appointment_id).await?.provider_id;

        let removed = {
            let _guard = self.locks.acquire(provider_id).await;
            let appointment = self.load(appointment_id).await?;

            authorize_participant(self.identity.as_ref(), actor_id, &appointment).await?;
            self.ensure_cancellable(&appointment)?;

            self.appointments
                .delete(appointment_id)
                .await?
                .ok_or_else(|| SchedulingError::NotFound(format!("appointment {}", appointment_id)))?
        };

        info!("Appointment {} deleted by {}", appointment_id, actor_id);
        self.notifier.enqueue_notification(
            NotificationEvent::Deleted,
            removed.id,
            removed.participants(),
        );

        Ok(removed)
    }

    async fn provider_transition(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
        target: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let provider_id = self.load(appointment_id).await?.provider_id;

        let (appointment, previous) = {
            let _guard = self.locks.acquire(provider_id).await;
            let mut appointment = self.load(appointment_id).await?;

            let actor = resolve_actor(self.identity.as_ref(), actor_id).await?;
            ensure_provider_or_admin(&actor, &appointment, target)?;

            let previous = appointment.status;
            if !can_transition(previous, target) {
                warn!(
                    "Invalid status transition attempted on {}: {} -> {}",
                    appointment_id, previous, target
                );
                return Err(SchedulingError::State(format!(
                    "cannot move appointment from {} to {}",
                    previous, target
                )));
            }

            appointment.status = target;
            appointment.updated_at = self.clock.now();
            self.appointments.update(appointment.clone()).await?;
            (appointment, previous)
        };

        info!("Appointment {} moved from {} to {}", appointment_id, previous, target);
        self.notifier.enqueue_notification(
            NotificationEvent::StatusChanged,
            appointment.id,
            appointment.participants(),
        );

        Ok(appointment)
    }

    fn ensure_cancellable(&self, appointment: &Appointment) -> Result<(), SchedulingError> {
        let now = self.clock.now();
        if is_cancellable(appointment, now, self.cancellation_notice()) {
            return Ok(());
        }

        debug!(
            "Appointment {} ({}, starts {}) is not cancellable at {}",
            appointment.id,
            appointment.status,
            appointment.window.start(),
            now
        );

        if appointment.status.is_terminal() {
            Err(SchedulingError::State(format!(
                "appointment is already {}",
                appointment.status
            )))
        } else {
            Err(SchedulingError::State(format!(
                "appointments can only be cancelled more than {} hours before they start",
                self.rules.cancellation_notice_hours
            )))
        }
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.appointments
            .get(appointment_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("appointment {}", appointment_id)))
    }
}

fn ensure_provider_or_admin(
    actor: &Identity,
    appointment: &Appointment,
    target: AppointmentStatus,
) -> Result<(), SchedulingError> {
    if actor.is_admin() || actor.id == appointment.provider_id {
        return Ok(());
    }

    warn!(
        "Actor {} may not move appointment {} to {}",
        actor.id, appointment.id, target
    );
    Err(SchedulingError::Permission(format!(
        "only the provider or an admin may mark an appointment {}",
        target
    )))
}

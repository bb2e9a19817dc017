// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use availability_cell::BookedWindowSource;
use shared_models::error::{SchedulingError, ValidationKind};
use shared_models::time_window::TimeWindow;

use crate::models::Appointment;
use crate::repository::AppointmentRepository;

/// First non-cancelled appointment overlapping `window`, ignoring `exclude_appointment_id`.
pub fn find_conflict<'a>(
    appointments: &'a [Appointment],
    window: &TimeWindow,
    exclude_appointment_id: Option<Uuid>,
) -> Option<&'a Appointment> {
    appointments.iter().find(|a| {
        Some(a.id) != exclude_appointment_id && a.blocks_time() && a.window.overlaps(window)
    })
}

/// Fails with `Conflict` if `window` collides with another live appointment of the provider.
pub async fn check_conflicts(
    repository: &dyn AppointmentRepository,
    provider_id: Uuid,
    window: &TimeWindow,
    exclude_appointment_id: Option<Uuid>,
) -> Result<(), SchedulingError> {
    let existing = repository.list_overlapping(provider_id, window).await?;

    if let Some(conflict) = find_conflict(&existing, window, exclude_appointment_id) {
        warn!(
            "Conflict detected for provider {}: {} overlaps appointment {} {}",
            provider_id, window, conflict.id, conflict.window
        );
        return Err(SchedulingError::Validation(ValidationKind::Conflict));
    }

    Ok(())
}

/// Exposes live appointment windows to the slot discretizer.
pub struct BookedAppointments(pub Arc<dyn AppointmentRepository>);

#[async_trait]
impl BookedWindowSource for BookedAppointments {
    async fn booked_windows(
        &self,
        provider_id: Uuid,
        range: &TimeWindow,
    ) -> Result<Vec<TimeWindow>, SchedulingError> {
        Ok(self
            .0
            .list_overlapping(provider_id, range)
            .await?
            .into_iter()
            .filter(Appointment::blocks_time)
            .map(|a| a.window)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::models::AppointmentStatus;

    fn w(sh: u32, eh: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 6, 2, sh, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 2, eh, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn appointment(window: TimeWindow, status: AppointmentStatus) -> Appointment {
        let mut a = Appointment::new(Uuid::new_v4(), Uuid::new_v4(), window, None, Utc::now());
        a.status = status;
        a
    }

    #[test]
    fn overlapping_live_appointment_conflicts() {
        let existing = vec![appointment(w(10, 11), AppointmentStatus::Confirmed)];
        assert!(find_conflict(&existing, &w(10, 12), None).is_some());
    }

    #[test]
    fn touching_windows_do_not_conflict() {
        let existing = vec![appointment(w(10, 11), AppointmentStatus::Pending)];
        assert!(find_conflict(&existing, &w(11, 12), None).is_none());
        assert!(find_conflict(&existing, &w(9, 10), None).is_none());
    }

    #[test]
    fn cancelled_appointments_are_ignored() {
        let existing = vec![appointment(w(10, 11), AppointmentStatus::Cancelled)];
        assert!(find_conflict(&existing, &w(10, 11), None).is_none());
    }

    #[test]
    fn finished_appointments_still_hold_their_window() {
        let existing = vec![
            appointment(w(10, 11), AppointmentStatus::Completed),
            appointment(w(12, 13), AppointmentStatus::NoShow),
        ];
        assert!(find_conflict(&existing, &w(10, 11), None).is_some());
        assert!(find_conflict(&existing, &w(12, 13), None).is_some());
    }

    #[test]
    fn excluded_appointment_is_skipped() {
        let existing = vec![appointment(w(10, 11), AppointmentStatus::Pending)];
        let own_id = existing[0].id;
        assert!(find_conflict(&existing, &w(10, 11), Some(own_id)).is_none());
    }
}

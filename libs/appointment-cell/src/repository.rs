use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::error::SchedulingError;
use shared_models::time_window::TimeWindow;

use crate::models::Appointment;

/// Storage for appointments. Windows are kept as UTC instants only.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<(), SchedulingError>;
    async fn update(&self, appointment: Appointment) -> Result<(), SchedulingError>;
    async fn delete(&self, appointment_id: Uuid) -> Result<Option<Appointment>, SchedulingError>;
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, SchedulingError>;
    async fn list_for_provider(&self, provider_id: Uuid) -> Result<Vec<Appointment>, SchedulingError>;

    /// Appointments of `provider_id` in any status whose window intersects `range`, ordered by start.
    async fn list_overlapping(
        &self,
        provider_id: Uuid,
        range: &TimeWindow,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut appointments: Vec<Appointment> = self
            .list_for_provider(provider_id)
            .await?
            .into_iter()
            .filter(|a| a.window.overlaps(range))
            .collect();
        appointments.sort_by_key(|a| a.window.start());
        Ok(appointments)
    }
}

/// In-memory storage for development and testing
#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn insert(&self, appointment: Appointment) -> Result<(), SchedulingError> {
        self.appointments.write().await.insert(appointment.id, appointment);
        Ok(())
    }

    async fn update(&self, appointment: Appointment) -> Result<(), SchedulingError> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment;
                Ok(())
            }
            None => Err(SchedulingError::NotFound(format!("appointment {}", appointment.id))),
        }
    }

    async fn delete(&self, appointment_id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        Ok(self.appointments.write().await.remove(&appointment_id))
    }

    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        Ok(self.appointments.read().await.get(&appointment_id).cloned())
    }

    async fn list_for_provider(&self, provider_id: Uuid) -> Result<Vec<Appointment>, SchedulingError> {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.provider_id == provider_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.window.start());
        Ok(appointments)
    }
}

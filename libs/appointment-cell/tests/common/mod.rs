#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentLifecycle, AppointmentRepository, BookingEngine,
    InMemoryAppointmentRepository,
};
use availability_cell::{AvailabilityRegistry, InMemoryAvailabilityRepository};
use notification_cell::RecordingNotifier;
use shared_config::SchedulingRules;
use shared_database::InMemoryIdentityDirectory;
use shared_models::error::SchedulingError;
use shared_models::time_window::TimeWindow;
use shared_utils::clock::FixedClock;
use shared_utils::locks::ProviderLocks;
use shared_utils::test_utils::{directory_with, utc, window, TestUser};

pub struct Fixture {
    pub provider: TestUser,
    pub client: TestUser,
    pub admin: TestUser,
    pub other_client: TestUser,
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub availability: Arc<AvailabilityRegistry>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub locks: Arc<ProviderLocks>,
    pub booking: Arc<BookingEngine>,
    pub lifecycle: Arc<AppointmentLifecycle>,
}

/// "Now" for every fixture: the day before the 2025-06-02 availability.
pub fn fixture_now() -> DateTime<Utc> {
    utc(2025, 6, 1, 8, 0)
}

/// Appointment storage that pauses after every read, like a remote database would.
#[derive(Default)]
pub struct SlowAppointmentRepository {
    inner: InMemoryAppointmentRepository,
}

#[async_trait]
impl AppointmentRepository for SlowAppointmentRepository {
    async fn insert(&self, appointment: Appointment) -> Result<(), SchedulingError> {
        self.inner.insert(appointment).await
    }

    async fn update(&self, appointment: Appointment) -> Result<(), SchedulingError> {
        self.inner.update(appointment).await
    }

    async fn delete(&self, appointment_id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        self.inner.delete(appointment_id).await
    }

    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        self.inner.get(appointment_id).await
    }

    async fn list_for_provider(&self, provider_id: Uuid) -> Result<Vec<Appointment>, SchedulingError> {
        let appointments = self.inner.list_for_provider(provider_id).await;
        tokio::time::sleep(StdDuration::from_millis(5)).await;
        appointments
    }
}

pub async fn fixture() -> Fixture {
    fixture_with(Arc::new(InMemoryAppointmentRepository::new())).await
}

pub async fn fixture_with(appointments: Arc<dyn AppointmentRepository>) -> Fixture {
    let provider = TestUser::provider();
    let client = TestUser::client();
    let admin = TestUser::admin();
    let other_client = TestUser::client();
    let directory = directory_with(&[&provider, &client, &admin, &other_client]).await;

    let locks = Arc::new(ProviderLocks::new());
    let availability = Arc::new(AvailabilityRegistry::new(
        Arc::new(InMemoryAvailabilityRepository::new()),
        locks.clone(),
    ));
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(FixedClock::new(fixture_now()));

    let booking = Arc::new(BookingEngine::new(
        appointments.clone(),
        availability.clone(),
        directory.clone(),
        notifier.clone(),
        clock.clone(),
        locks.clone(),
    ));
    let lifecycle = Arc::new(AppointmentLifecycle::new(
        appointments.clone(),
        directory.clone(),
        notifier.clone(),
        clock.clone(),
        locks.clone(),
        SchedulingRules::default(),
    ));

    Fixture {
        provider,
        client,
        admin,
        other_client,
        directory,
        availability,
        appointments,
        notifier,
        clock,
        locks,
        booking,
        lifecycle,
    }
}

impl Fixture {
    /// Opens `[09:00, 12:00)` UTC on 2025-06-02 for the provider.
    pub async fn open_morning(&self) -> TimeWindow {
        let morning = window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0));
        self.availability
            .create(self.provider.id, morning, false, None)
            .await
            .unwrap();
        morning
    }

    /// Opens availability and books an hour that starts `hours` after now.
    pub async fn book_in(&self, hours: i64) -> appointment_cell::Appointment {
        let start = fixture_now() + Duration::hours(hours);
        let slot = window(start - Duration::hours(1), start + Duration::hours(2));
        self.availability
            .create(self.provider.id, slot, false, None)
            .await
            .unwrap();
        self.booking
            .request_booking(
                self.provider.id,
                self.client.id,
                window(start, start + Duration::hours(1)),
                None,
            )
            .await
            .unwrap()
    }
}

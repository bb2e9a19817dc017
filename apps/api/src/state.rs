use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use appointment_cell::handlers::AppointmentContext;
use appointment_cell::{
    AppointmentLifecycle, AppointmentRepository, BookedAppointments, BookingEngine,
    InMemoryAppointmentRepository,
};
use availability_cell::handlers::AvailabilityContext;
use availability_cell::{AvailabilityRegistry, InMemoryAvailabilityRepository, SlotDiscretizer};
use notification_cell::Notifier;
use shared_config::AppConfig;
use shared_database::{InMemoryIdentityDirectory, SupabaseClient, SupabaseIdentityResolver};
use shared_models::auth::IdentityResolver;
use shared_utils::clock::Clock;
use shared_utils::locks::ProviderLocks;
use shared_utils::timezone::TimezoneTranslator;

/// Everything the routers need, wired once at startup.
pub struct AppServices {
    pub availability: Arc<AvailabilityContext>,
    pub appointments: Arc<AppointmentContext>,
}

impl AppServices {
    pub fn build(
        config: &AppConfig,
        identity: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let rules = config.scheduling_rules();
        let default_zone = TimezoneTranslator::parse_zone(&config.default_timezone)
            .context("DEFAULT_TIMEZONE is not a known IANA zone")?;

        let locks = Arc::new(ProviderLocks::new());
        let registry = Arc::new(AvailabilityRegistry::new(
            Arc::new(InMemoryAvailabilityRepository::new()),
            locks.clone(),
        ));
        let appointments: Arc<dyn AppointmentRepository> = Arc::new(InMemoryAppointmentRepository::new());

        let discretizer = Arc::new(SlotDiscretizer::new(
            registry.clone(),
            Arc::new(BookedAppointments(appointments.clone())),
            clock.clone(),
            rules.clone(),
        ));

        let booking = Arc::new(BookingEngine::new(
            appointments.clone(),
            registry.clone(),
            identity.clone(),
            notifier.clone(),
            clock.clone(),
            locks.clone(),
        ));

        let lifecycle = Arc::new(AppointmentLifecycle::new(
            appointments,
            identity.clone(),
            notifier,
            clock,
            locks,
            rules,
        ));

        Ok(Self {
            availability: Arc::new(AvailabilityContext {
                registry,
                discretizer,
                identity: identity.clone(),
                default_zone,
            }),
            appointments: Arc::new(AppointmentContext {
                booking,
                lifecycle,
                identity,
            }),
        })
    }
}

/// Supabase profiles when configured, otherwise the seeded in-memory directory.
pub fn identity_resolver(config: &AppConfig) -> anyhow::Result<Arc<dyn IdentityResolver>> {
    if config.is_supabase_configured() {
        info!("Resolving identities from Supabase at {}", config.supabase_url);
        let client = Arc::new(SupabaseClient::new(config));
        return Ok(Arc::new(SupabaseIdentityResolver::new(client)));
    }

    let directory = InMemoryIdentityDirectory::from_seed(&config.identity_seed)
        .map_err(anyhow::Error::msg)
        .context("IDENTITY_SEED is malformed")?;
    info!("Resolving identities from IDENTITY_SEED");
    Ok(Arc::new(directory))
}

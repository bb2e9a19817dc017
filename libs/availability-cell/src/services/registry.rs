// libs/availability-cell/src/services/registry.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::{require_role, resolve_actor, IdentityResolver, Role};
use shared_models::error::{SchedulingError, ValidationKind};
use shared_models::time_window::TimeWindow;
use shared_utils::locks::ProviderLocks;
use shared_utils::timezone::{TimezoneError, TimezoneTranslator};

use crate::models::AvailabilitySlot;
use crate::repository::AvailabilityRepository;

/// Owns provider availability and keeps each provider's slots pairwise disjoint.
///
/// `locks` must be the set the booking engine uses, so a slot cannot change
/// between a booking's containment check and its insert.
pub struct AvailabilityRegistry {
    repository: Arc<dyn AvailabilityRepository>,
    locks: Arc<ProviderLocks>,
}

impl AvailabilityRegistry {
    pub fn new(repository: Arc<dyn AvailabilityRepository>, locks: Arc<ProviderLocks>) -> Self {
        Self { repository, locks }
    }

    /// Create availability for a provider
    pub async fn create(
        &self,
        provider_id: Uuid,
        window: TimeWindow,
        recurring: bool,
        notes: Option<String>,
    ) -> Result<AvailabilitySlot, SchedulingError> {
        debug!("Creating availability {} for provider {}", window, provider_id);

        let _guard = self.locks.acquire(provider_id).await;

        self.check_overlap(provider_id, &window, None).await?;

        let slot = AvailabilitySlot::new(provider_id, window, recurring, notes);
        self.repository.insert(slot.clone()).await?;

        info!("Availability slot {} created for provider {}", slot.id, provider_id);
        Ok(slot)
    }

    /// Move a slot, re-validating against the provider's other slots
    pub async fn update(
        &self,
        slot_id: Uuid,
        new_window: TimeWindow,
    ) -> Result<AvailabilitySlot, SchedulingError> {
        debug!("Updating availability slot {} to {}", slot_id, new_window);

        let current = self.get(slot_id).await?;
        let _guard = self.locks.acquire(current.provider_id).await;

        // Re-read under the lock in case the slot was removed meanwhile
        let mut slot = self.get(slot_id).await?;
        self.check_overlap(slot.provider_id, &new_window, Some(slot_id)).await?;

        slot.window = new_window;
        slot.updated_at = Utc::now();
        self.repository.update(slot.clone()).await?;

        info!("Availability slot {} moved to {}", slot_id, new_window);
        Ok(slot)
    }

    /// Hard delete. Appointments booked inside the slot are left untouched.
    pub async fn delete(&self, slot_id: Uuid) -> Result<AvailabilitySlot, SchedulingError> {
        debug!("Deleting availability slot {}", slot_id);

        let current = self.get(slot_id).await?;
        let _guard = self.locks.acquire(current.provider_id).await;

        let removed = self
            .repository
            .delete(slot_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("availability slot {}", slot_id)))?;

        info!("Availability slot {} deleted for provider {}", slot_id, removed.provider_id);
        Ok(removed)
    }

    pub async fn get(&self, slot_id: Uuid) -> Result<AvailabilitySlot, SchedulingError> {
        self.repository
            .get(slot_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("availability slot {}", slot_id)))
    }

    pub async fn list_for_provider(&self, provider_id: Uuid) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        self.repository.list_for_provider(provider_id).await
    }

    /// Slots whose UTC window intersects the local day `date` in `zone`.
    pub async fn list_for_date(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        zone: Tz,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        let day = match TimezoneTranslator::day_window(date, zone) {
            Ok(day) => day,
            Err(TimezoneError::SkippedDay(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        debug!("Listing availability for provider {} within {}", provider_id, day);
        self.list_in_range(provider_id, &day).await
    }

    pub async fn list_in_range(
        &self,
        provider_id: Uuid,
        range: &TimeWindow,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        self.repository.list_overlapping(provider_id, range).await
    }

    /// True if some slot of `provider_id` fully contains `window`.
    pub async fn covers(&self, provider_id: Uuid, window: &TimeWindow) -> Result<bool, SchedulingError> {
        let slots = self.repository.list_overlapping(provider_id, window).await?;
        Ok(slots.iter().any(|slot| slot.window.contains(window)))
    }

    async fn check_overlap(
        &self,
        provider_id: Uuid,
        window: &TimeWindow,
        exclude_slot_id: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        let clashing = self
            .repository
            .list_overlapping(provider_id, window)
            .await?
            .into_iter()
            .find(|slot| Some(slot.id) != exclude_slot_id);

        if let Some(existing) = clashing {
            warn!(
                "Availability {} for provider {} overlaps slot {} {}",
                window, provider_id, existing.id, existing.window
            );
            return Err(SchedulingError::Validation(ValidationKind::Overlap));
        }

        Ok(())
    }
}

/// Checks that `actor_id` may manage the availability of `provider_id`:
/// the provider themself, or an admin acting on behalf of a registered provider.
pub async fn authorize_slot_owner(
    identity: &dyn IdentityResolver,
    actor_id: Uuid,
    provider_id: Uuid,
) -> Result<(), SchedulingError> {
    let actor = resolve_actor(identity, actor_id).await?;

    if actor.id != provider_id && !actor.is_admin() {
        warn!("Actor {} attempted to manage availability of {}", actor_id, provider_id);
        return Err(SchedulingError::Permission(
            "only the provider or an admin may manage this availability".to_string(),
        ));
    }

    require_role(identity, provider_id, Role::Provider).await?;
    Ok(())
}

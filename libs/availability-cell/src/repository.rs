use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::error::SchedulingError;
use shared_models::time_window::TimeWindow;

use crate::models::AvailabilitySlot;

/// Storage for availability slots. Start and end are kept as UTC instants only.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn insert(&self, slot: AvailabilitySlot) -> Result<(), SchedulingError>;
    async fn update(&self, slot: AvailabilitySlot) -> Result<(), SchedulingError>;
    async fn delete(&self, slot_id: Uuid) -> Result<Option<AvailabilitySlot>, SchedulingError>;
    async fn get(&self, slot_id: Uuid) -> Result<Option<AvailabilitySlot>, SchedulingError>;
    async fn list_for_provider(&self, provider_id: Uuid) -> Result<Vec<AvailabilitySlot>, SchedulingError>;

    /// Slots of `provider_id` intersecting `range`, ordered by start.
    async fn list_overlapping(
        &self,
        provider_id: Uuid,
        range: &TimeWindow,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        let mut slots: Vec<AvailabilitySlot> = self
            .list_for_provider(provider_id)
            .await?
            .into_iter()
            .filter(|slot| slot.window.overlaps(range))
            .collect();
        slots.sort_by_key(|slot| slot.window.start());
        Ok(slots)
    }
}

/// In-memory storage for development and testing
#[derive(Default)]
pub struct InMemoryAvailabilityRepository {
    slots: RwLock<HashMap<Uuid, AvailabilitySlot>>,
}

impl InMemoryAvailabilityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityRepository for InMemoryAvailabilityRepository {
    async fn insert(&self, slot: AvailabilitySlot) -> Result<(), SchedulingError> {
        self.slots.write().await.insert(slot.id, slot);
        Ok(())
    }

    async fn update(&self, slot: AvailabilitySlot) -> Result<(), SchedulingError> {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&slot.id) {
            Some(existing) => {
                *existing = slot;
                Ok(())
            }
            None => Err(SchedulingError::NotFound(format!("availability slot {}", slot.id))),
        }
    }

    async fn delete(&self, slot_id: Uuid) -> Result<Option<AvailabilitySlot>, SchedulingError> {
        Ok(self.slots.write().await.remove(&slot_id))
    }

    async fn get(&self, slot_id: Uuid) -> Result<Option<AvailabilitySlot>, SchedulingError> {
        Ok(self.slots.read().await.get(&slot_id).cloned())
    }

    async fn list_for_provider(&self, provider_id: Uuid) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        let mut slots: Vec<AvailabilitySlot> = self
            .slots
            .read()
            .await
            .values()
            .filter(|slot| slot.provider_id == provider_id)
            .cloned()
            .collect();
        slots.sort_by_key(|slot| slot.window.start());
        Ok(slots)
    }
}

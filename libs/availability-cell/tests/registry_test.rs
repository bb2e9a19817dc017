// libs/availability-cell/tests/registry_test.rs
use std::sync::Arc;
use std::time::Duration as StdDuration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use uuid::Uuid;

use availability_cell::{
    authorize_slot_owner, AvailabilityRegistry, AvailabilityRepository, AvailabilitySlot,
    InMemoryAvailabilityRepository,
};
use shared_models::error::{SchedulingError, ValidationKind};
use shared_models::time_window::TimeWindow;
use shared_utils::locks::ProviderLocks;
use shared_utils::test_utils::{directory_with, utc, window, TestUser};
use shared_utils::timezone::TimezoneTranslator;

fn registry() -> AvailabilityRegistry {
    AvailabilityRegistry::new(
        Arc::new(InMemoryAvailabilityRepository::new()),
        Arc::new(ProviderLocks::new()),
    )
}

/// Storage that pauses on every read, like a remote database would.
#[derive(Default)]
struct SlowAvailabilityRepository {
    inner: InMemoryAvailabilityRepository,
}

#[async_trait]
impl AvailabilityRepository for SlowAvailabilityRepository {
    async fn insert(&self, slot: AvailabilitySlot) -> Result<(), SchedulingError> {
        self.inner.insert(slot).await
    }

    async fn update(&self, slot: AvailabilitySlot) -> Result<(), SchedulingError> {
        self.inner.update(slot).await
    }

    async fn delete(&self, slot_id: Uuid) -> Result<Option<AvailabilitySlot>, SchedulingError> {
        self.inner.delete(slot_id).await
    }

    async fn get(&self, slot_id: Uuid) -> Result<Option<AvailabilitySlot>, SchedulingError> {
        self.inner.get(slot_id).await
    }

    async fn list_for_provider(&self, provider_id: Uuid) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        let slots = self.inner.list_for_provider(provider_id).await;
        tokio::time::sleep(StdDuration::from_millis(5)).await;
        slots
    }
}

#[tokio::test]
async fn creates_disjoint_slots() {
    let registry = registry();
    let provider = Uuid::new_v4();

    registry
        .create(provider, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0)), false, None)
        .await
        .unwrap();
    registry
        .create(provider, window(utc(2025, 6, 2, 13, 0), utc(2025, 6, 2, 17, 0)), true, Some("afternoon".into()))
        .await
        .unwrap();

    let slots = tokio_test::assert_ok!(registry.list_for_provider(provider).await);
    assert_eq!(slots.len(), 2);
    assert!(slots[0].window.start() < slots[1].window.start());
    assert!(slots[1].recurring);
}

#[tokio::test]
async fn adjacent_slots_are_not_overlapping() {
    let registry = registry();
    let provider = Uuid::new_v4();

    registry
        .create(provider, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 10, 0)), false, None)
        .await
        .unwrap();
    let result = registry
        .create(provider, window(utc(2025, 6, 2, 10, 0), utc(2025, 6, 2, 11, 0)), false, None)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn overlapping_slot_is_rejected() {
    let registry = registry();
    let provider = Uuid::new_v4();

    registry
        .create(provider, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0)), false, None)
        .await
        .unwrap();
    let result = registry
        .create(provider, window(utc(2025, 6, 2, 11, 0), utc(2025, 6, 2, 13, 0)), false, None)
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(ValidationKind::Overlap)));
    assert_eq!(registry.list_for_provider(provider).await.unwrap().len(), 1);
}

#[tokio::test]
async fn other_providers_do_not_clash() {
    let registry = registry();
    let w = window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0));

    registry.create(Uuid::new_v4(), w, false, None).await.unwrap();
    assert!(registry.create(Uuid::new_v4(), w, false, None).await.is_ok());
}

#[tokio::test]
async fn update_ignores_the_slot_itself() {
    let registry = registry();
    let provider = Uuid::new_v4();

    let slot = registry
        .create(provider, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0)), false, None)
        .await
        .unwrap();

    let moved = registry
        .update(slot.id, window(utc(2025, 6, 2, 10, 0), utc(2025, 6, 2, 13, 0)))
        .await
        .unwrap();

    assert_eq!(moved.id, slot.id);
    assert_eq!(moved.window.start(), utc(2025, 6, 2, 10, 0));
}

#[tokio::test]
async fn update_into_a_neighbour_is_rejected() {
    let registry = registry();
    let provider = Uuid::new_v4();

    let morning = registry
        .create(provider, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0)), false, None)
        .await
        .unwrap();
    registry
        .create(provider, window(utc(2025, 6, 2, 13, 0), utc(2025, 6, 2, 17, 0)), false, None)
        .await
        .unwrap();

    let result = registry
        .update(morning.id, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 14, 0)))
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(ValidationKind::Overlap)));
    let unchanged = registry.get(morning.id).await.unwrap();
    assert_eq!(unchanged.window.end(), utc(2025, 6, 2, 12, 0));
}

#[tokio::test]
async fn update_and_delete_of_missing_slot_are_not_found() {
    let registry = registry();
    let missing = Uuid::new_v4();

    assert_matches!(
        registry.update(missing, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 10, 0))).await,
        Err(SchedulingError::NotFound(_))
    );
    assert_matches!(registry.delete(missing).await, Err(SchedulingError::NotFound(_)));
}

#[tokio::test]
async fn delete_frees_the_window() {
    let registry = registry();
    let provider = Uuid::new_v4();
    let w = window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0));

    let slot = registry.create(provider, w, false, None).await.unwrap();
    registry.delete(slot.id).await.unwrap();

    assert!(registry.create(provider, w, false, None).await.is_ok());
}

#[tokio::test]
async fn covers_requires_full_containment() {
    let registry = registry();
    let provider = Uuid::new_v4();

    registry
        .create(provider, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0)), false, None)
        .await
        .unwrap();

    let inside = window(utc(2025, 6, 2, 10, 0), utc(2025, 6, 2, 11, 0));
    let straddling = window(utc(2025, 6, 2, 11, 30), utc(2025, 6, 2, 12, 30));
    let exact = window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0));

    assert!(registry.covers(provider, &inside).await.unwrap());
    assert!(registry.covers(provider, &exact).await.unwrap());
    assert!(!registry.covers(provider, &straddling).await.unwrap());
}

#[tokio::test]
async fn lists_slots_by_local_day() {
    let registry = registry();
    let provider = Uuid::new_v4();
    let new_york = TimezoneTranslator::parse_zone("America/New_York").unwrap();

    // 23:00-01:00 New York on June 2nd/3rd
    registry
        .create(provider, window(utc(2025, 6, 3, 3, 0), utc(2025, 6, 3, 5, 0)), false, None)
        .await
        .unwrap();
    // June 3rd 10:00 New York
    registry
        .create(provider, window(utc(2025, 6, 3, 14, 0), utc(2025, 6, 3, 15, 0)), false, None)
        .await
        .unwrap();

    let june_2 = registry
        .list_for_date(provider, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), new_york)
        .await
        .unwrap();
    let june_3 = registry
        .list_for_date(provider, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(), new_york)
        .await
        .unwrap();

    assert_eq!(june_2.len(), 1);
    assert_eq!(june_3.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overlapping_creates_admit_exactly_one() {
    let registry = Arc::new(AvailabilityRegistry::new(
        Arc::new(SlowAvailabilityRepository::default()),
        Arc::new(ProviderLocks::new()),
    ));
    let provider = Uuid::new_v4();
    let w = window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0));

    let attempts = (0..16).map(|_| {
        let registry = registry.clone();
        tokio::spawn(async move { registry.create(provider, w, false, None).await })
    });

    let results = futures::future::join_all(attempts).await;
    let created = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(SchedulingError::Validation(ValidationKind::Overlap)))))
        .count();

    assert_eq!(created, 1);
    assert_eq!(rejected, 15);
    assert_eq!(registry.list_for_provider(provider).await.unwrap().len(), 1);
}

#[tokio::test]
async fn slot_changes_wait_for_the_provider_lock() {
    let locks = Arc::new(ProviderLocks::new());
    let registry = Arc::new(AvailabilityRegistry::new(
        Arc::new(InMemoryAvailabilityRepository::new()),
        locks.clone(),
    ));
    let provider = Uuid::new_v4();
    let slot = registry
        .create(provider, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 12, 0)), false, None)
        .await
        .unwrap();

    // a booking in progress for this provider
    let guard = locks.acquire(provider).await;

    let shrink = {
        let registry = registry.clone();
        tokio::spawn(async move {
            registry
                .update(slot.id, window(utc(2025, 6, 2, 9, 0), utc(2025, 6, 2, 10, 0)))
                .await
        })
    };
    let remove = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.delete(slot.id).await })
    };

    tokio::time::sleep(StdDuration::from_millis(20)).await;
    assert!(!shrink.is_finished());
    assert!(!remove.is_finished());
    assert_eq!(registry.get(slot.id).await.unwrap().window, slot.window);

    drop(guard);
    let _ = shrink.await.unwrap();
    let _ = remove.await.unwrap();
}

#[tokio::test]
async fn skipped_local_day_lists_nothing() {
    let registry = registry();
    let provider = Uuid::new_v4();
    let apia = TimezoneTranslator::parse_zone("Pacific/Apia").unwrap();

    registry
        .create(provider, window(utc(2011, 12, 30, 0, 0), utc(2011, 12, 30, 20, 0)), false, None)
        .await
        .unwrap();

    let listed = registry
        .list_for_date(provider, NaiveDate::from_ymd_opt(2011, 12, 30).unwrap(), apia)
        .await
        .unwrap();
    assert!(listed.is_empty());

    assert_matches!(
        registry.list_for_date(provider, NaiveDate::MAX, apia).await,
        Err(SchedulingError::Validation(ValidationKind::InvalidRange))
    );
}

#[tokio::test]
async fn provider_and_admin_may_manage_slots() {
    let provider = TestUser::provider();
    let admin = TestUser::admin();
    let client = TestUser::client();
    let other_provider = TestUser::provider();
    let directory = directory_with(&[&provider, &admin, &client, &other_provider]).await;

    assert!(authorize_slot_owner(directory.as_ref(), provider.id, provider.id).await.is_ok());
    assert!(authorize_slot_owner(directory.as_ref(), admin.id, provider.id).await.is_ok());

    assert_matches!(
        authorize_slot_owner(directory.as_ref(), client.id, provider.id).await,
        Err(SchedulingError::Permission(_))
    );
    assert_matches!(
        authorize_slot_owner(directory.as_ref(), other_provider.id, provider.id).await,
        Err(SchedulingError::Permission(_))
    );
}

#[tokio::test]
async fn slots_belong_only_to_providers() {
    let client = TestUser::client();
    let admin = TestUser::admin();
    let directory = directory_with(&[&client, &admin]).await;

    // A client acting for itself is the owner, but does not hold the provider role
    assert_matches!(
        authorize_slot_owner(directory.as_ref(), client.id, client.id).await,
        Err(SchedulingError::Role(_))
    );
    assert_matches!(
        authorize_slot_owner(directory.as_ref(), admin.id, Uuid::new_v4()).await,
        Err(SchedulingError::Role(_))
    );
}

#[tokio::test]
async fn unknown_actor_is_refused() {
    let provider = TestUser::provider();
    let directory = directory_with(&[&provider]).await;

    assert_matches!(
        authorize_slot_owner(directory.as_ref(), Uuid::new_v4(), provider.id).await,
        Err(SchedulingError::Permission(_))
    );
}

#[derive(Debug, Clone)]
enum Op {
    Create { start_min: i64, len_min: i64 },
    Move { index: usize, start_min: i64, len_min: i64 },
    Delete { index: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..600, 15i64..180).prop_map(|(start_min, len_min)| Op::Create { start_min, len_min }),
        (0usize..8, 0i64..600, 15i64..180)
            .prop_map(|(index, start_min, len_min)| Op::Move { index, start_min, len_min }),
        (0usize..8).prop_map(|index| Op::Delete { index }),
    ]
}

fn slot_window(start_min: i64, len_min: i64) -> TimeWindow {
    let start = utc(2025, 6, 2, 8, 0) + Duration::minutes(start_min);
    window(start, start + Duration::minutes(len_min))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn slots_stay_pairwise_disjoint(ops in proptest::collection::vec(op(), 1..24)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let registry = registry();
            let provider = Uuid::new_v4();

            for op in ops {
                let ids: Vec<Uuid> = registry
                    .list_for_provider(provider)
                    .await
                    .unwrap()
                    .iter()
                    .map(|s| s.id)
                    .collect();

                match op {
                    Op::Create { start_min, len_min } => {
                        let _ = registry.create(provider, slot_window(start_min, len_min), false, None).await;
                    }
                    Op::Move { index, start_min, len_min } => {
                        if let Some(id) = ids.get(index) {
                            let _ = registry.update(*id, slot_window(start_min, len_min)).await;
                        }
                    }
                    Op::Delete { index } => {
                        if let Some(id) = ids.get(index) {
                            registry.delete(*id).await.unwrap();
                        }
                    }
                }

                let slots = registry.list_for_provider(provider).await.unwrap();
                for (i, a) in slots.iter().enumerate() {
                    for b in slots.iter().skip(i + 1) {
                        assert!(!a.window.overlaps(&b.window), "{} overlaps {}", a.window, b.window);
                    }
                }
            }
        });
    }
}

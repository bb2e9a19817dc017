// libs/availability-cell/src/services/discretizer.rs
//
// Turns availability slots into fixed-length offerable increments.

use std::iter::FusedIterator;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;
use uuid::Uuid;

use shared_config::SchedulingRules;
use shared_models::error::SchedulingError;
use shared_models::time_window::TimeWindow;
use shared_utils::clock::Clock;
use shared_utils::timezone::{TimezoneError, TimezoneTranslator};

use crate::models::OpenSlot;
use crate::services::registry::AvailabilityRegistry;

/// Windows already taken by non-cancelled appointments.
#[async_trait]
pub trait BookedWindowSource: Send + Sync {
    async fn booked_windows(
        &self,
        provider_id: Uuid,
        range: &TimeWindow,
    ) -> Result<Vec<TimeWindow>, SchedulingError>;
}

/// Lazy, restartable sequence of candidate increments inside one window.
///
/// Iterating `&SlotSequence` always starts again from the window start.
#[derive(Debug, Clone)]
pub struct SlotSequence<'a> {
    window: TimeWindow,
    step: Duration,
    booked: &'a [TimeWindow],
}

impl<'a> SlotSequence<'a> {
    pub fn iter(&self) -> SlotIter<'a> {
        SlotIter {
            next_start: self.window.start(),
            end: self.window.end(),
            step: self.step,
            booked: self.booked,
        }
    }
}

impl<'a> IntoIterator for &SlotSequence<'a> {
    type Item = TimeWindow;
    type IntoIter = SlotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct SlotIter<'a> {
    next_start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    booked: &'a [TimeWindow],
}

impl Iterator for SlotIter<'_> {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step <= Duration::zero() {
            return None;
        }

        loop {
            let candidate_end = match self.next_start.checked_add_signed(self.step) {
                Some(end) if end <= self.end => end,
                // trailing remainder shorter than one step, or past the representable range
                _ => {
                    self.next_start = self.end;
                    return None;
                }
            };

            let candidate = TimeWindow::new(self.next_start, candidate_end).ok()?;
            self.next_start = candidate_end;

            if !self.booked.iter().any(|booked| booked.overlaps(&candidate)) {
                return Some(candidate);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.step <= Duration::zero() || self.next_start >= self.end {
            return (0, Some(0));
        }
        let remaining = (self.end - self.next_start).num_seconds() / self.step.num_seconds().max(1);
        (0, Some(remaining.max(0) as usize))
    }
}

impl FusedIterator for SlotIter<'_> {}

pub struct SlotDiscretizer {
    registry: Arc<AvailabilityRegistry>,
    bookings: Arc<dyn BookedWindowSource>,
    clock: Arc<dyn Clock>,
    rules: SchedulingRules,
}

impl SlotDiscretizer {
    pub fn new(
        registry: Arc<AvailabilityRegistry>,
        bookings: Arc<dyn BookedWindowSource>,
        clock: Arc<dyn Clock>,
        rules: SchedulingRules,
    ) -> Self {
        Self {
            registry,
            bookings,
            clock,
            rules,
        }
    }

    /// Candidates of exactly `interval_minutes`, stepping from `window.start`,
    /// skipping any that overlap `booked`. A zero interval yields nothing.
    pub fn generate(window: TimeWindow, interval_minutes: u32, booked: &[TimeWindow]) -> SlotSequence<'_> {
        SlotSequence {
            window,
            step: Duration::minutes(interval_minutes as i64),
            booked,
        }
    }

    /// Open increments of `provider_id` starting on the local day `date` in `zone`,
    /// ascending and excluding anything that starts at or before now.
    pub async fn get_available_slots(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        zone: Tz,
        interval_minutes: Option<u32>,
    ) -> Result<Vec<TimeWindow>, SchedulingError> {
        let interval = interval_minutes.unwrap_or(self.rules.slot_interval_minutes);
        let day = match TimezoneTranslator::day_window(date, zone) {
            Ok(day) => day,
            Err(TimezoneError::SkippedDay(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let now = self.clock.now();

        debug!(
            "Calculating {}-minute slots for provider {} on {} ({})",
            interval, provider_id, date, zone
        );

        let slots = self.registry.list_in_range(provider_id, &day).await?;
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        // Slots may spill over the day boundary, so load bookings across their full span
        let span_start = slots.iter().map(|s| s.window.start()).min().unwrap_or(day.start()).min(day.start());
        let span_end = slots.iter().map(|s| s.window.end()).max().unwrap_or(day.end()).max(day.end());
        let span = TimeWindow::new(span_start, span_end)?;

        let booked = self.bookings.booked_windows(provider_id, &span).await?;

        let mut open: Vec<TimeWindow> = slots
            .iter()
            .flat_map(|slot| {
                Self::generate(slot.window, interval, &booked)
                    .iter()
                    .filter(|candidate| day.contains_instant(candidate.start()) && candidate.start() > now)
                    .collect::<Vec<_>>()
            })
            .collect();

        open.sort();
        open.dedup();

        debug!("Found {} available slots", open.len());
        Ok(open)
    }

    /// `get_available_slots` with each window rendered in `zone`.
    pub async fn list_available_slots(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        zone: Tz,
        interval_minutes: Option<u32>,
    ) -> Result<Vec<OpenSlot>, SchedulingError> {
        let windows = self
            .get_available_slots(provider_id, date, zone, interval_minutes)
            .await?;

        Ok(windows
            .into_iter()
            .map(|w| OpenSlot {
                start: w.start(),
                end: w.end(),
                display: TimezoneTranslator::format_range(w.start(), w.end(), zone),
            })
            .collect())
    }
}

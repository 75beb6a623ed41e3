//! Weekly delivery schedules.
//!
//! A schedule is persisted as two parallel arrays on the user document,
//! `delivery_schedule` (dates) and `delivery_status` (one status per date).
//! [`DeliverySchedule`] keeps them together so the arrays can never drift
//! apart in memory; [`DeliverySchedule::from_parts`] refuses stored arrays
//! whose lengths differ.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::DeliveryStatus;

/// Deliveries per month. A month is treated as exactly four weeks.
pub const WEEKS_PER_MONTH: u32 = 4;

const DAYS_BETWEEN_DELIVERIES: u64 = 7;

/// Errors raised while building or updating a schedule.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("subscription duration must be at least one month")]
    ZeroDuration,

    #[error("schedule runs past the supported calendar range")]
    DateOverflow,

    #[error("delivery schedule has {dates} dates but {statuses} statuses")]
    LengthMismatch { dates: usize, statuses: usize },

    #[error("delivery index {index} is out of range (schedule has {len} slots)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("delivery on {date} is already marked delivered")]
    AlreadyDelivered { date: NaiveDate },

    #[error("no pending deliveries left")]
    NothingPending,
}

/// One scheduled delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySlot {
    pub date: NaiveDate,
    pub status: DeliveryStatus,
}

/// An ordered list of weekly delivery slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliverySchedule {
    slots: Vec<DeliverySlot>,
}

impl DeliverySchedule {
    /// Generate `months × 4` weekly slots starting on `start`, all pending.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::ZeroDuration` when `months` is zero and
    /// `ScheduleError::DateOverflow` if a date would leave chrono's range.
    pub fn generate(start: NaiveDate, months: u32) -> Result<Self, ScheduleError> {
        if months == 0 {
            return Err(ScheduleError::ZeroDuration);
        }

        let count = u64::from(months) * u64::from(WEEKS_PER_MONTH);
        let slots = (0..count)
            .map(|week| {
                start
                    .checked_add_days(Days::new(week * DAYS_BETWEEN_DELIVERIES))
                    .map(|date| DeliverySlot {
                        date,
                        status: DeliveryStatus::Pending,
                    })
                    .ok_or(ScheduleError::DateOverflow)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { slots })
    }

    /// Rebuild a schedule from the stored parallel arrays.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::LengthMismatch` if the arrays differ in length.
    pub fn from_parts(
        dates: Vec<NaiveDate>,
        statuses: Vec<DeliveryStatus>,
    ) -> Result<Self, ScheduleError> {
        if dates.len() != statuses.len() {
            return Err(ScheduleError::LengthMismatch {
                dates: dates.len(),
                statuses: statuses.len(),
            });
        }

        let slots = dates
            .into_iter()
            .zip(statuses)
            .map(|(date, status)| DeliverySlot { date, status })
            .collect();
        Ok(Self { slots })
    }

    /// Split back into the stored `(dates, statuses)` arrays.
    #[must_use]
    pub fn into_parts(self) -> (Vec<NaiveDate>, Vec<DeliveryStatus>) {
        self.slots.into_iter().map(|s| (s.date, s.status)).unzip()
    }

    #[must_use]
    pub fn slots(&self) -> &[DeliverySlot] {
        &self.slots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots already delivered.
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.status == DeliveryStatus::Delivered)
            .count()
    }

    /// Number of slots still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.len() - self.delivered_count()
    }

    /// Index and slot of the earliest pending delivery.
    #[must_use]
    pub fn next_pending(&self) -> Option<(usize, &DeliverySlot)> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, s)| s.status == DeliveryStatus::Pending)
    }

    /// Mark the slot at `index` delivered and return its date.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the slot is already
    /// delivered.
    pub fn mark_delivered(&mut self, index: usize) -> Result<NaiveDate, ScheduleError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ScheduleError::IndexOutOfRange { index, len })?;

        if slot.status == DeliveryStatus::Delivered {
            return Err(ScheduleError::AlreadyDelivered { date: slot.date });
        }

        slot.status = DeliveryStatus::Delivered;
        Ok(slot.date)
    }

    /// Mark the earliest pending slot delivered and return its index.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::NothingPending` when every slot is delivered.
    pub fn mark_next_delivered(&mut self) -> Result<usize, ScheduleError> {
        let (index, _) = self.next_pending().ok_or(ScheduleError::NothingPending)?;
        self.mark_delivered(index)?;
        Ok(index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generate_two_months() {
        let schedule = DeliverySchedule::generate(date(2024, 11, 19), 2).unwrap();

        assert_eq!(schedule.len(), 8);
        assert_eq!(schedule.slots()[0].date, date(2024, 11, 19));
        assert_eq!(schedule.slots()[7].date, date(2025, 1, 7));
        assert!(
            schedule
                .slots()
                .iter()
                .all(|s| s.status == DeliveryStatus::Pending)
        );
    }

    #[test]
    fn test_dates_are_exactly_one_week_apart() {
        let schedule = DeliverySchedule::generate(date(2024, 2, 26), 3).unwrap();
        for pair in schedule.slots().windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 7);
        }
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert_eq!(
            DeliverySchedule::generate(date(2024, 1, 1), 0),
            Err(ScheduleError::ZeroDuration)
        );
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let err = DeliverySchedule::from_parts(
            vec![date(2024, 1, 1), date(2024, 1, 8)],
            vec![DeliveryStatus::Pending],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::LengthMismatch {
                dates: 2,
                statuses: 1
            }
        );
    }

    #[test]
    fn test_parts_roundtrip() {
        let mut schedule = DeliverySchedule::generate(date(2024, 5, 1), 1).unwrap();
        schedule.mark_delivered(1).unwrap();

        let (dates, statuses) = schedule.clone().into_parts();
        assert_eq!(dates.len(), statuses.len());
        assert_eq!(DeliverySchedule::from_parts(dates, statuses).unwrap(), schedule);
    }

    #[test]
    fn test_mark_delivered_is_one_way() {
        let mut schedule = DeliverySchedule::generate(date(2024, 5, 1), 1).unwrap();

        assert_eq!(schedule.mark_delivered(0).unwrap(), date(2024, 5, 1));
        assert_eq!(
            schedule.mark_delivered(0),
            Err(ScheduleError::AlreadyDelivered {
                date: date(2024, 5, 1)
            })
        );
        assert_eq!(
            schedule.mark_delivered(9),
            Err(ScheduleError::IndexOutOfRange { index: 9, len: 4 })
        );
    }

    #[test]
    fn test_mark_next_delivered_skips_done_slots() {
        let mut schedule = DeliverySchedule::generate(date(2024, 5, 1), 1).unwrap();
        schedule.mark_delivered(0).unwrap();
        schedule.mark_delivered(2).unwrap();

        assert_eq!(schedule.mark_next_delivered().unwrap(), 1);
        assert_eq!(schedule.mark_next_delivered().unwrap(), 3);
        assert_eq!(
            schedule.mark_next_delivered(),
            Err(ScheduleError::NothingPending)
        );
        assert_eq!(schedule.delivered_count(), 4);
        assert_eq!(schedule.pending_count(), 0);
    }
}

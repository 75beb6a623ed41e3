//! Admin delivery tracking.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use refill_core::{DeliveryAddress, DeliverySlot, DeliveryStatus, ScheduleError, UserId};

use super::error::{ServiceError, not_found};
use crate::db::UserRepository;
use crate::store::DocumentStore;

/// An active subscriber with their schedule.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub user_id: UserId,
    pub name: String,
    pub phone_number: String,
    pub address: DeliveryAddress,
    pub subscription_name: Option<String>,
    pub gallons_per_week: u32,
    pub total_gallons: u32,
    pub remaining_gallons: i64,
    pub next_delivery: Option<NaiveDate>,
    pub deliveries: Vec<DeliverySlot>,
}

/// Outcome of marking one slot delivered.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryUpdate {
    pub user_id: UserId,
    pub index: usize,
    pub date: NaiveDate,
    pub remaining_gallons: i64,
    pub next_delivery: Option<NaiveDate>,
}

/// One stop on the delivery calendar.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEntry {
    pub user_id: UserId,
    pub name: String,
    pub address: DeliveryAddress,
    pub gallons_per_week: u32,
    /// Position in the user's schedule.
    pub index: usize,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub deliveries: Vec<CalendarEntry>,
}

pub struct DeliveryService<'a> {
    users: UserRepository<'a>,
    lock: &'a Mutex<()>,
}

impl<'a> DeliveryService<'a> {
    /// `lock` serialises schedule updates within this process.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, lock: &'a Mutex<()>) -> Self {
        Self {
            users: UserRepository::new(store),
            lock,
        }
    }

    /// Users whose subscription is active, by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a profile is unreadable.
    pub async fn active_subscribers(&self) -> Result<Vec<Subscriber>, ServiceError> {
        let mut subscribers = Vec::new();
        for (user_id, profile) in self.users.list_active_subscribers().await? {
            let schedule = profile.schedule()?;
            subscribers.push(Subscriber {
                remaining_gallons: profile.remaining_gallons(&schedule),
                next_delivery: schedule.next_pending().map(|(_, slot)| slot.date),
                gallons_per_week: profile.gallons_per_week(),
                subscription_name: profile
                    .subscription_details
                    .map(|d| d.subscription_name),
                total_gallons: profile.total_gallons,
                deliveries: schedule.slots().to_vec(),
                name: profile.personal_details.name,
                phone_number: profile.personal_details.phone_number,
                address: profile.personal_details.address,
                user_id,
            });
        }
        subscribers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subscribers)
    }

    /// Flip one slot from `Pending` to `Delivered`.
    ///
    /// Without an index, the earliest pending slot is used.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Schedule` if the index is out of range, the slot
    /// was already delivered or nothing is pending.
    #[instrument(skip(self))]
    pub async fn mark_delivered(
        &self,
        user_id: &UserId,
        index: Option<usize>,
    ) -> Result<DeliveryUpdate, ServiceError> {
        let _guard = self.lock.lock().await;

        let profile = self.users.require(user_id).await.map_err(not_found("user"))?;
        let mut schedule = profile.schedule()?;

        let index = match index {
            Some(i) => i,
            None => schedule
                .next_pending()
                .map(|(i, _)| i)
                .ok_or(ScheduleError::NothingPending)?,
        };
        let date = schedule.mark_delivered(index)?;

        let remaining_gallons = profile.remaining_gallons(&schedule);
        let next_delivery = schedule.next_pending().map(|(_, slot)| slot.date);
        self.users.save_schedule(user_id, &schedule).await?;

        tracing::info!(user_id = %user_id, index, %date, "Delivery marked delivered");
        Ok(DeliveryUpdate {
            user_id: user_id.clone(),
            index,
            date,
            remaining_gallons,
            next_delivery,
        })
    }

    /// Every scheduled slot of every active subscriber, grouped by date.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a profile is unreadable.
    pub async fn calendar(&self) -> Result<Vec<CalendarDay>, ServiceError> {
        let mut days: BTreeMap<NaiveDate, Vec<CalendarEntry>> = BTreeMap::new();

        for (user_id, profile) in self.users.list_active_subscribers().await? {
            let schedule = profile.schedule()?;
            let gallons_per_week = profile.gallons_per_week();
            for (index, slot) in schedule.slots().iter().enumerate() {
                days.entry(slot.date).or_default().push(CalendarEntry {
                    user_id: user_id.clone(),
                    name: profile.personal_details.name.clone(),
                    address: profile.personal_details.address.clone(),
                    gallons_per_week,
                    index,
                    status: slot.status,
                });
            }
        }

        Ok(days
            .into_iter()
            .map(|(date, mut deliveries)| {
                deliveries.sort_by(|a, b| a.name.cmp(&b.name));
                CalendarDay { date, deliveries }
            })
            .collect())
    }
}

//! Read-only reporting over the booking history: dashboard counters and
//! the admin reports page (daily activity, status breakdown, popular
//! cars, total revenue).

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::db::Store;
use crate::entities::bookings;

/// Trailing window for the daily activity breakdown.
const ACTIVITY_WINDOW_DAYS: i64 = 7;

/// How many cars the popularity ranking reports.
const TOP_CARS_LIMIT: u64 = 5;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_cars: u64,
    pub available_cars: u64,
    pub total_customers: u64,
    pub total_bookings: u64,
    pub pending_bookings: u64,
}

#[derive(Debug, Serialize)]
pub struct DailyActivity {
    pub date: String,
    pub bookings: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct PopularCar {
    pub car_id: i32,
    pub brand: String,
    pub model: String,
    pub bookings: i64,
}

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub daily_activity: Vec<DailyActivity>,
    pub status_summary: Vec<StatusCount>,
    pub popular_cars: Vec<PopularCar>,
    pub total_revenue: f64,
}

pub struct ReportingService {
    store: Store,
}

impl ReportingService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        Ok(DashboardStats {
            total_cars: self.store.count_cars().await?,
            available_cars: self.store.count_available_cars().await?,
            total_customers: self.store.count_customers().await?,
            total_bookings: self.store.count_bookings().await?,
            pending_bookings: self
                .store
                .count_bookings_by_status(crate::domain::BookingStatus::Pending)
                .await?,
        })
    }

    pub async fn recent_bookings(&self, limit: u64) -> Result<Vec<bookings::Model>> {
        self.store.recent_bookings(limit).await
    }

    pub async fn summary(&self) -> Result<ReportSummary> {
        let cutoff = (Utc::now() - Duration::days(ACTIVITY_WINDOW_DAYS)).to_rfc3339();
        let recent = self.store.bookings_created_since(&cutoff).await?;
        let daily_activity = fold_daily_activity(&recent);

        let status_summary = self
            .store
            .booking_status_counts()
            .await?
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();

        let top = self.store.top_booked_cars(TOP_CARS_LIMIT).await?;
        let car_ids: Vec<i32> = top.iter().map(|(id, _)| *id).collect();
        let cars = self.store.get_cars_by_ids(&car_ids).await?;
        let popular_cars = top
            .into_iter()
            .filter_map(|(car_id, count)| {
                cars.iter().find(|c| c.id == car_id).map(|car| PopularCar {
                    car_id,
                    brand: car.brand.clone(),
                    model: car.model.clone(),
                    bookings: count,
                })
            })
            .collect();

        let total_revenue = self.store.total_revenue().await?;

        Ok(ReportSummary {
            daily_activity,
            status_summary,
            popular_cars,
            total_revenue,
        })
    }
}

/// Group bookings by the calendar date of creation, counting bookings and
/// summing their snapshotted prices. Timestamps are RFC 3339, so the date
/// is the first ten characters.
fn fold_daily_activity(recent: &[bookings::Model]) -> Vec<DailyActivity> {
    let mut by_day: BTreeMap<String, (i64, f64)> = BTreeMap::new();
    for booking in recent {
        let day = booking
            .created_at
            .get(..10)
            .unwrap_or(&booking.created_at)
            .to_string();
        let entry = by_day.entry(day).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += booking.total_price;
    }
    by_day
        .into_iter()
        .map(|(date, (bookings, revenue))| DailyActivity {
            date,
            bookings,
            revenue,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(created_at: &str, total_price: f64) -> bookings::Model {
        bookings::Model {
            id: 0,
            user_id: 1,
            car_id: 1,
            start_date: "2024-06-01".parse().unwrap(),
            end_date: "2024-06-03".parse().unwrap(),
            total_days: 2,
            total_price,
            status: "pending".to_string(),
            created_at: created_at.to_string(),
            notes: None,
        }
    }

    #[test]
    fn fold_groups_by_calendar_date() {
        let rows = vec![
            booking("2024-06-01T08:00:00+00:00", 100.0),
            booking("2024-06-01T19:30:00+00:00", 50.0),
            booking("2024-06-02T09:00:00+00:00", 25.0),
        ];
        let daily = fold_daily_activity(&rows);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, "2024-06-01");
        assert_eq!(daily[0].bookings, 2);
        assert!((daily[0].revenue - 150.0).abs() < f64::EPSILON);
        assert_eq!(daily[1].date, "2024-06-02");
        assert_eq!(daily[1].bookings, 1);
    }

    #[test]
    fn fold_of_nothing_is_empty() {
        assert!(fold_daily_activity(&[]).is_empty());
    }
}

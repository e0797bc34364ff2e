use anyhow::{Context, Result};
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use crate::domain::BookingStatus;
use crate::entities::bookings;

/// Find any active (pending/approved) booking on the car whose inclusive
/// date interval intersects `[start, end]`. Bounds are inclusive on both
/// ends: a booking ending on day X conflicts with one starting on day X.
///
/// Generic over the connection so the engine can run it inside the same
/// transaction as the subsequent insert.
pub async fn find_active_overlap<C: ConnectionTrait>(
    conn: &C,
    car_id: i32,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Option<bookings::Model>, DbErr> {
    bookings::Entity::find()
        .filter(bookings::Column::CarId.eq(car_id))
        .filter(bookings::Column::Status.is_in(BookingStatus::ACTIVE.map(BookingStatus::as_str)))
        .filter(bookings::Column::StartDate.lte(end))
        .filter(bookings::Column::EndDate.gte(start))
        .one(conn)
        .await
}

pub struct BookingRepository {
    conn: DatabaseConnection,
}

impl BookingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<bookings::Model>> {
        let booking = bookings::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query booking by ID")?;
        Ok(booking)
    }

    /// A user's booking history, newest first.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<bookings::Model>, u64)> {
        let paginator = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .order_by_desc(bookings::Column::CreatedAt)
            .paginate(&self.conn, per_page);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    /// All bookings, optionally filtered by status, newest first.
    pub async fn list_all(
        &self,
        status: Option<BookingStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<bookings::Model>, u64)> {
        let mut query = bookings::Entity::find().order_by_desc(bookings::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(bookings::Column::Status.eq(status.as_str()));
        }

        let paginator = query.paginate(&self.conn, per_page);
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<bookings::Model>> {
        let items = bookings::Entity::find()
            .order_by_desc(bookings::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query recent bookings")?;
        Ok(items)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(bookings::Entity::find().count(&self.conn).await?)
    }

    pub async fn count_by_status(&self, status: BookingStatus) -> Result<u64> {
        let count = bookings::Entity::find()
            .filter(bookings::Column::Status.eq(status.as_str()))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    pub async fn has_active_for_car(&self, car_id: i32) -> Result<bool> {
        let existing = bookings::Entity::find()
            .filter(bookings::Column::CarId.eq(car_id))
            .filter(
                bookings::Column::Status.is_in(BookingStatus::ACTIVE.map(BookingStatus::as_str)),
            )
            .one(&self.conn)
            .await
            .context("Failed to check active bookings for car")?;
        Ok(existing.is_some())
    }

    /// Booking counts grouped by status.
    pub async fn status_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::Status)
            .column_as(bookings::Column::Id.count(), "count")
            .group_by(bookings::Column::Status)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to aggregate bookings by status")?;
        Ok(rows)
    }

    /// Car ids with their booking counts, most-booked first. Ties break on
    /// ascending car id so the ordering is stable.
    pub async fn top_cars(&self, limit: u64) -> Result<Vec<(i32, i64)>> {
        let rows = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::CarId)
            .column_as(bookings::Column::Id.count(), "bookings")
            .group_by(bookings::Column::CarId)
            .order_by_desc(bookings::Column::Id.count())
            .order_by_asc(bookings::Column::CarId)
            .limit(limit)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to aggregate top booked cars")?;
        Ok(rows)
    }

    /// Sum of price snapshots over approved and completed bookings.
    /// An empty sum is 0.
    pub async fn total_revenue(&self) -> Result<f64> {
        let revenue: Option<f64> = bookings::Entity::find()
            .select_only()
            .column_as(bookings::Column::TotalPrice.sum(), "revenue")
            .filter(bookings::Column::Status.is_in([
                BookingStatus::Approved.as_str(),
                BookingStatus::Completed.as_str(),
            ]))
            .into_tuple()
            .one(&self.conn)
            .await
            .context("Failed to aggregate total revenue")?
            .flatten();

        Ok(revenue.unwrap_or(0.0))
    }

    /// Bookings created at or after the RFC 3339 cutoff, oldest first.
    pub async fn created_since(&self, cutoff: &str) -> Result<Vec<bookings::Model>> {
        let items = bookings::Entity::find()
            .filter(bookings::Column::CreatedAt.gte(cutoff))
            .order_by_asc(bookings::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query bookings by creation window")?;
        Ok(items)
    }
}

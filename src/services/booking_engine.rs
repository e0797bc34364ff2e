//! Booking-conflict detection, pricing, and lifecycle transitions.
//!
//! All date intervals are inclusive on both ends: a booking ending on day
//! X conflicts with one starting on day X. The price is snapshotted when
//! the booking is created and never recomputed.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use thiserror::Error;
use tracing::info;

use crate::db::repositories::booking::find_active_overlap;
use crate::db::Store;
use crate::domain::{BookingStatus, Identity};
use crate::entities::{bookings, cars};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Booking {0} not found")]
    NotFound(i32),

    #[error("Car {0} not found")]
    CarNotFound(i32),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for BookingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BookingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub car_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

/// Result of a cancel call. Cancelling an already-cancelled booking is an
/// idempotent no-op reported as `AlreadyCancelled`, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
}

/// Number of rental days charged for the interval, end date exclusive.
fn rental_days(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}

pub struct BookingEngine {
    store: Store,
}

impl BookingEngine {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Attempt to create a booking for the actor.
    ///
    /// The conflict scan and the insert run in one transaction that first
    /// promotes itself to a write lock on the car row, so two concurrent
    /// requests for the same car serialize instead of both passing the
    /// scan. This is what keeps the no-overlap invariant under load.
    pub async fn try_create(
        &self,
        actor: Identity,
        request: BookingRequest,
    ) -> Result<bookings::Model, BookingError> {
        if actor.role.is_admin() {
            return Err(BookingError::Forbidden(
                "Admins cannot make bookings.".to_string(),
            ));
        }

        if request.end_date <= request.start_date {
            return Err(BookingError::Validation(
                "End date must be after start date.".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        if request.start_date < today {
            return Err(BookingError::Validation(
                "Start date cannot be in the past.".to_string(),
            ));
        }

        let Ok(total_days) = i32::try_from(rental_days(request.start_date, request.end_date))
        else {
            return Err(BookingError::Validation(
                "Rental period is too long.".to_string(),
            ));
        };

        let txn = self.store.conn.begin().await?;

        let Some(car) = cars::Entity::find_by_id(request.car_id).one(&txn).await? else {
            return Err(BookingError::CarNotFound(request.car_id));
        };

        if !car.is_available {
            return Err(BookingError::Conflict(
                "This car is not currently available for rental.".to_string(),
            ));
        }

        // Self-assignment leaves the row unchanged but takes SQLite's
        // single write lock, serializing concurrent attempts on this car
        // ahead of the conflict scan.
        cars::Entity::update_many()
            .col_expr(
                cars::Column::UpdatedAt,
                Expr::col(cars::Column::UpdatedAt).into(),
            )
            .filter(cars::Column::Id.eq(request.car_id))
            .exec(&txn)
            .await?;

        if let Some(existing) =
            find_active_overlap(&txn, request.car_id, request.start_date, request.end_date).await?
        {
            return Err(BookingError::Conflict(format!(
                "This car is already booked for the selected dates ({} to {}).",
                existing.start_date, existing.end_date
            )));
        }

        let total_price = f64::from(total_days) * car.price_per_day;

        let active = bookings::ActiveModel {
            user_id: Set(actor.user_id),
            car_id: Set(request.car_id),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            total_days: Set(total_days),
            total_price: Set(total_price),
            status: Set(BookingStatus::Pending.as_str().to_string()),
            created_at: Set(Utc::now().to_rfc3339()),
            notes: Set(request.notes),
            ..Default::default()
        };

        let booking = active.insert(&txn).await?;
        txn.commit().await?;

        info!(
            booking_id = booking.id,
            car_id = booking.car_id,
            user_id = booking.user_id,
            total_price = booking.total_price,
            "Booking created"
        );

        Ok(booking)
    }

    /// Cancel a booking. Only the owner or an admin may cancel, and only
    /// before the rental period begins. Cancellation is terminal.
    pub async fn cancel(
        &self,
        actor: Identity,
        booking_id: i32,
    ) -> Result<CancelOutcome, BookingError> {
        let txn = self.store.conn.begin().await?;

        let Some(booking) = bookings::Entity::find_by_id(booking_id).one(&txn).await? else {
            return Err(BookingError::NotFound(booking_id));
        };

        if booking.user_id != actor.user_id && !actor.role.is_admin() {
            return Err(BookingError::Forbidden(
                "You do not have permission to cancel this booking.".to_string(),
            ));
        }

        let status = BookingStatus::parse(&booking.status).ok_or_else(|| {
            BookingError::InvalidState(format!("Booking has unknown status '{}'", booking.status))
        })?;

        if status == BookingStatus::Cancelled {
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let today = Utc::now().date_naive();
        if booking.start_date <= today {
            return Err(BookingError::InvalidState(
                "Cannot cancel a booking that has already started.".to_string(),
            ));
        }

        if !status.can_transition_to(BookingStatus::Cancelled) {
            return Err(BookingError::InvalidState(format!(
                "Cannot cancel a {status} booking."
            )));
        }

        let mut active: bookings::ActiveModel = booking.into();
        active.status = Set(BookingStatus::Cancelled.as_str().to_string());
        active.update(&txn).await?;
        txn.commit().await?;

        info!(booking_id, user_id = actor.user_id, "Booking cancelled");

        Ok(CancelOutcome::Cancelled)
    }

    /// Approve a pending booking. Valid only from `pending`; approving a
    /// cancelled or completed booking would resurrect a terminal state.
    /// The admin check lives at the authorization boundary, not here.
    pub async fn approve(&self, booking_id: i32) -> Result<bookings::Model, BookingError> {
        let txn = self.store.conn.begin().await?;

        let Some(booking) = bookings::Entity::find_by_id(booking_id).one(&txn).await? else {
            return Err(BookingError::NotFound(booking_id));
        };

        let status = BookingStatus::parse(&booking.status).ok_or_else(|| {
            BookingError::InvalidState(format!("Booking has unknown status '{}'", booking.status))
        })?;

        if status != BookingStatus::Pending {
            return Err(BookingError::InvalidState(format!(
                "Only pending bookings can be approved (current status: {status})."
            )));
        }

        let mut active: bookings::ActiveModel = booking.into();
        active.status = Set(BookingStatus::Approved.as_str().to_string());
        let booking = active.update(&txn).await?;
        txn.commit().await?;

        info!(booking_id, "Booking approved");

        Ok(booking)
    }

    /// Whether the car has any pending or approved booking. The inventory
    /// manager consults this before allowing deletion.
    pub async fn has_active_bookings(&self, car_id: i32) -> Result<bool, BookingError> {
        Ok(self.store.car_has_active_bookings(car_id).await?)
    }
}

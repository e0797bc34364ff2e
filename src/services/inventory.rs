//! Fleet inventory management: car CRUD with field validation and the
//! active-booking delete guard.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::config::UploadConfig;
use crate::db::Store;
use crate::domain::{CarCategory, FuelType, Transmission};
use crate::entities::cars;
use crate::services::BookingEngine;

pub const MIN_SEATS: i32 = 2;
pub const MAX_SEATS: i32 = 15;
pub const MIN_YEAR: i32 = 2000;
pub const MAX_BRAND_LEN: usize = 50;
pub const MAX_MODEL_LEN: usize = 100;
pub const MAX_PLATE_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Car {0} not found")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for InventoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for InventoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Raw car fields as submitted by the admin UI. Enum-valued fields arrive
/// as strings and are checked by [`CarInput::validate`].
#[derive(Debug, Clone, Deserialize)]
pub struct CarInput {
    pub brand: String,
    pub model: String,
    pub category: String,
    pub seat_capacity: i32,
    pub price_per_day: f64,
    pub fuel_type: String,
    pub transmission: String,
    pub year: i32,
    pub license_plate: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

const fn default_available() -> bool {
    true
}

/// Validated car fields with the enum-valued columns parsed.
#[derive(Debug, Clone)]
pub struct CarFields {
    pub brand: String,
    pub model: String,
    pub category: CarCategory,
    pub seat_capacity: i32,
    pub price_per_day: f64,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub year: i32,
    pub license_plate: String,
    pub description: Option<String>,
    pub is_available: bool,
}

impl CarInput {
    pub fn validate(self) -> Result<CarFields, InventoryError> {
        let brand = self.brand.trim().to_string();
        if brand.is_empty() || brand.len() > MAX_BRAND_LEN {
            return Err(InventoryError::Validation(format!(
                "Brand must be 1-{MAX_BRAND_LEN} characters."
            )));
        }

        let model = self.model.trim().to_string();
        if model.is_empty() || model.len() > MAX_MODEL_LEN {
            return Err(InventoryError::Validation(format!(
                "Model must be 1-{MAX_MODEL_LEN} characters."
            )));
        }

        let Some(category) = CarCategory::parse(&self.category) else {
            return Err(InventoryError::Validation(format!(
                "Unknown category '{}'. Expected one of: Sedan, SUV, Van, Pickup.",
                self.category
            )));
        };

        if !(MIN_SEATS..=MAX_SEATS).contains(&self.seat_capacity) {
            return Err(InventoryError::Validation(format!(
                "Seat capacity must be between {MIN_SEATS} and {MAX_SEATS}."
            )));
        }

        if !self.price_per_day.is_finite() || self.price_per_day < 0.0 {
            return Err(InventoryError::Validation(
                "Price per day must be a non-negative number.".to_string(),
            ));
        }

        let Some(fuel_type) = FuelType::parse(&self.fuel_type) else {
            return Err(InventoryError::Validation(format!(
                "Unknown fuel type '{}'. Expected one of: Petrol, Diesel, Hybrid, Electric.",
                self.fuel_type
            )));
        };

        let Some(transmission) = Transmission::parse(&self.transmission) else {
            return Err(InventoryError::Validation(format!(
                "Unknown transmission '{}'. Expected Automatic or Manual.",
                self.transmission
            )));
        };

        let max_year = Utc::now().year() + 1;
        if !(MIN_YEAR..=max_year).contains(&self.year) {
            return Err(InventoryError::Validation(format!(
                "Year must be between {MIN_YEAR} and {max_year}."
            )));
        }

        let license_plate = self.license_plate.trim().to_string();
        if license_plate.is_empty() || license_plate.len() > MAX_PLATE_LEN {
            return Err(InventoryError::Validation(format!(
                "License plate must be 1-{MAX_PLATE_LEN} characters."
            )));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(CarFields {
            brand,
            model,
            category,
            seat_capacity: self.seat_capacity,
            price_per_day: self.price_per_day,
            fuel_type,
            transmission,
            year: self.year,
            license_plate,
            description,
            is_available: self.is_available,
        })
    }
}

pub struct InventoryService {
    store: Store,
    engine: Arc<BookingEngine>,
    default_image: String,
}

impl InventoryService {
    #[must_use]
    pub fn new(store: Store, engine: Arc<BookingEngine>, uploads: &UploadConfig) -> Self {
        Self {
            store,
            engine,
            default_image: uploads.default_image.clone(),
        }
    }

    pub async fn add_car(&self, input: CarInput) -> Result<cars::Model, InventoryError> {
        let fields = input.validate()?;

        if self
            .store
            .license_plate_taken(&fields.license_plate, None)
            .await?
        {
            return Err(InventoryError::Validation(format!(
                "License plate '{}' is already registered.",
                fields.license_plate
            )));
        }

        let car = self
            .store
            .insert_car(&fields, self.default_image.clone())
            .await?;
        info!(car_id = car.id, plate = %car.license_plate, "Car added to fleet");
        Ok(car)
    }

    /// Update a car's fields. Price edits never touch existing bookings;
    /// their `total_price` was snapshotted at creation.
    pub async fn update_car(&self, id: i32, input: CarInput) -> Result<cars::Model, InventoryError> {
        let fields = input.validate()?;

        if self
            .store
            .license_plate_taken(&fields.license_plate, Some(id))
            .await?
        {
            return Err(InventoryError::Validation(format!(
                "License plate '{}' is already registered.",
                fields.license_plate
            )));
        }

        let car = self
            .store
            .update_car(id, &fields)
            .await?
            .ok_or(InventoryError::NotFound(id))?;
        info!(car_id = car.id, "Car updated");
        Ok(car)
    }

    /// Delete a car. Refused while any pending or approved booking
    /// references it; cancelled and completed bookings go with the car
    /// via the foreign-key cascade.
    pub async fn delete_car(&self, id: i32) -> Result<(), InventoryError> {
        if self.store.get_car(id).await?.is_none() {
            return Err(InventoryError::NotFound(id));
        }

        let has_active = self
            .engine
            .has_active_bookings(id)
            .await
            .map_err(|err| InventoryError::Database(err.to_string()))?;
        if has_active {
            return Err(InventoryError::Conflict(
                "Cannot delete a car with active bookings.".to_string(),
            ));
        }

        if !self.store.delete_car(id).await? {
            return Err(InventoryError::NotFound(id));
        }
        info!(car_id = id, "Car deleted");
        Ok(())
    }

    pub async fn attach_image(
        &self,
        id: i32,
        filename: &str,
    ) -> Result<cars::Model, InventoryError> {
        self.store
            .set_car_image(id, filename)
            .await?
            .ok_or(InventoryError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CarInput {
        CarInput {
            brand: "Toyota".to_string(),
            model: "Camry".to_string(),
            category: "Sedan".to_string(),
            seat_capacity: 5,
            price_per_day: 120_000.0,
            fuel_type: "Petrol".to_string(),
            transmission: "Automatic".to_string(),
            year: 2022,
            license_plate: "1AB-2345".to_string(),
            description: Some("  Reliable family sedan  ".to_string()),
            is_available: true,
        }
    }

    #[test]
    fn validate_accepts_well_formed_input() {
        let fields = input().validate().unwrap();
        assert_eq!(fields.category, CarCategory::Sedan);
        assert_eq!(fields.fuel_type, FuelType::Petrol);
        assert_eq!(fields.description.as_deref(), Some("Reliable family sedan"));
    }

    #[test]
    fn validate_rejects_unknown_category() {
        let mut bad = input();
        bad.category = "Hovercraft".to_string();
        assert!(matches!(
            bad.validate(),
            Err(InventoryError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_seat_capacity_out_of_range() {
        let mut bad = input();
        bad.seat_capacity = 1;
        assert!(bad.validate().is_err());
        let mut bad = input();
        bad.seat_capacity = 16;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_or_non_finite_price() {
        let mut bad = input();
        bad.price_per_day = -1.0;
        assert!(bad.validate().is_err());
        let mut bad = input();
        bad.price_per_day = f64::NAN;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validate_rejects_year_out_of_range() {
        let mut bad = input();
        bad.year = 1999;
        assert!(bad.validate().is_err());
        let mut bad = input();
        bad.year = Utc::now().year() + 2;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_plate() {
        let mut bad = input();
        bad.license_plate = "   ".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validate_drops_empty_description() {
        let mut car = input();
        car.description = Some("   ".to_string());
        assert_eq!(car.validate().unwrap().description, None);
    }
}

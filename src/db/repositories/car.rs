use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::cars;
use crate::services::inventory::CarFields;

/// Search/filter parameters for the public car catalogue.
#[derive(Debug, Clone, Default)]
pub struct CarFilter {
    pub query: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub available_only: bool,
}

pub struct CarRepository {
    conn: DatabaseConnection,
}

impl CarRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, fields: &CarFields, image_url: String) -> Result<cars::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = cars::ActiveModel {
            brand: Set(fields.brand.clone()),
            model: Set(fields.model.clone()),
            category: Set(fields.category.as_str().to_string()),
            seat_capacity: Set(fields.seat_capacity),
            price_per_day: Set(fields.price_per_day),
            image_url: Set(image_url),
            description: Set(fields.description.clone()),
            fuel_type: Set(fields.fuel_type.as_str().to_string()),
            transmission: Set(fields.transmission.as_str().to_string()),
            year: Set(fields.year),
            license_plate: Set(fields.license_plate.clone()),
            is_available: Set(fields.is_available),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert car")?;

        Ok(model)
    }

    /// Update a car's fields. Existing bookings keep their price snapshot;
    /// only the car row is touched.
    pub async fn update(&self, id: i32, fields: &CarFields) -> Result<Option<cars::Model>> {
        let Some(car) = cars::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query car for update")?
        else {
            return Ok(None);
        };

        let mut active: cars::ActiveModel = car.into();
        active.brand = Set(fields.brand.clone());
        active.model = Set(fields.model.clone());
        active.category = Set(fields.category.as_str().to_string());
        active.seat_capacity = Set(fields.seat_capacity);
        active.price_per_day = Set(fields.price_per_day);
        active.description = Set(fields.description.clone());
        active.fuel_type = Set(fields.fuel_type.as_str().to_string());
        active.transmission = Set(fields.transmission.as_str().to_string());
        active.year = Set(fields.year);
        active.license_plate = Set(fields.license_plate.clone());
        active.is_available = Set(fields.is_available);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(model))
    }

    pub async fn set_image(&self, id: i32, image_url: &str) -> Result<Option<cars::Model>> {
        let Some(car) = cars::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query car for image update")?
        else {
            return Ok(None);
        };

        let mut active: cars::ActiveModel = car.into();
        active.image_url = Set(image_url.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<cars::Model>> {
        let car = cars::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query car by ID")?;
        Ok(car)
    }

    /// Delete a car. The booking FK cascade removes its remaining
    /// (inactive) bookings. Returns false when the car does not exist.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = cars::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete car")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list(
        &self,
        filter: &CarFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<cars::Model>, u64)> {
        let mut query = cars::Entity::find().order_by_desc(cars::Column::CreatedAt);

        if filter.available_only {
            query = query.filter(cars::Column::IsAvailable.eq(true));
        }

        if let Some(text) = filter.query.as_deref().filter(|q| !q.trim().is_empty()) {
            let text = text.trim();
            query = query.filter(
                Condition::any()
                    .add(cars::Column::Brand.contains(text))
                    .add(cars::Column::Model.contains(text))
                    .add(cars::Column::Description.contains(text)),
            );
        }

        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            query = query.filter(cars::Column::Category.eq(category));
        }

        if let Some(min) = filter.min_price {
            query = query.filter(cars::Column::PricePerDay.gte(min));
        }

        if let Some(max) = filter.max_price {
            query = query.filter(cars::Column::PricePerDay.lte(max));
        }

        let paginator = query.paginate(&self.conn, per_page);
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<cars::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cars = cars::Entity::find()
            .filter(cars::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query cars by IDs")?;
        Ok(cars)
    }

    pub async fn license_plate_taken(&self, plate: &str, exclude_id: Option<i32>) -> Result<bool> {
        let mut query = cars::Entity::find().filter(cars::Column::LicensePlate.eq(plate));

        if let Some(id) = exclude_id {
            query = query.filter(cars::Column::Id.ne(id));
        }

        let existing = query
            .one(&self.conn)
            .await
            .context("Failed to check license plate uniqueness")?;
        Ok(existing.is_some())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(cars::Entity::find().count(&self.conn).await?)
    }

    pub async fn count_available(&self) -> Result<u64> {
        let count = cars::Entity::find()
            .filter(cars::Column::IsAvailable.eq(true))
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}

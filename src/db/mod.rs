use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::BookingStatus;
use crate::entities::{bookings, cars};
use crate::services::inventory::CarFields;

pub mod migrator;
pub mod repositories;

pub use repositories::car::CarFilter;
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn car_repo(&self) -> repositories::car::CarRepository {
        repositories::car::CarRepository::new(self.conn.clone())
    }

    fn booking_repo(&self) -> repositories::booking::BookingRepository {
        repositories::booking::BookingRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn create_user(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn list_customers(&self, page: u64, per_page: u64) -> Result<(Vec<User>, u64)> {
        self.user_repo().list_customers(page, per_page).await
    }

    pub async fn count_customers(&self) -> Result<u64> {
        self.user_repo().count_customers().await
    }

    // ------------------------------------------------------------------
    // Cars
    // ------------------------------------------------------------------

    pub async fn insert_car(&self, fields: &CarFields, image_url: String) -> Result<cars::Model> {
        self.car_repo().insert(fields, image_url).await
    }

    pub async fn update_car(&self, id: i32, fields: &CarFields) -> Result<Option<cars::Model>> {
        self.car_repo().update(id, fields).await
    }

    pub async fn set_car_image(&self, id: i32, image_url: &str) -> Result<Option<cars::Model>> {
        self.car_repo().set_image(id, image_url).await
    }

    pub async fn get_car(&self, id: i32) -> Result<Option<cars::Model>> {
        self.car_repo().get(id).await
    }

    pub async fn delete_car(&self, id: i32) -> Result<bool> {
        self.car_repo().delete(id).await
    }

    pub async fn list_cars(
        &self,
        filter: &CarFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<cars::Model>, u64)> {
        self.car_repo().list(filter, page, per_page).await
    }

    pub async fn get_cars_by_ids(&self, ids: &[i32]) -> Result<Vec<cars::Model>> {
        self.car_repo().get_by_ids(ids).await
    }

    pub async fn license_plate_taken(&self, plate: &str, exclude_id: Option<i32>) -> Result<bool> {
        self.car_repo().license_plate_taken(plate, exclude_id).await
    }

    pub async fn count_cars(&self) -> Result<u64> {
        self.car_repo().count().await
    }

    pub async fn count_available_cars(&self) -> Result<u64> {
        self.car_repo().count_available().await
    }

    // ------------------------------------------------------------------
    // Bookings
    // ------------------------------------------------------------------

    pub async fn get_booking(&self, id: i32) -> Result<Option<bookings::Model>> {
        self.booking_repo().get(id).await
    }

    pub async fn bookings_for_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<bookings::Model>, u64)> {
        self.booking_repo()
            .list_for_user(user_id, page, per_page)
            .await
    }

    pub async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<bookings::Model>, u64)> {
        self.booking_repo().list_all(status, page, per_page).await
    }

    pub async fn recent_bookings(&self, limit: u64) -> Result<Vec<bookings::Model>> {
        self.booking_repo().recent(limit).await
    }

    pub async fn count_bookings(&self) -> Result<u64> {
        self.booking_repo().count().await
    }

    pub async fn count_bookings_by_status(&self, status: BookingStatus) -> Result<u64> {
        self.booking_repo().count_by_status(status).await
    }

    pub async fn car_has_active_bookings(&self, car_id: i32) -> Result<bool> {
        self.booking_repo().has_active_for_car(car_id).await
    }

    pub async fn booking_status_counts(&self) -> Result<Vec<(String, i64)>> {
        self.booking_repo().status_counts().await
    }

    pub async fn top_booked_cars(&self, limit: u64) -> Result<Vec<(i32, i64)>> {
        self.booking_repo().top_cars(limit).await
    }

    pub async fn total_revenue(&self) -> Result<f64> {
        self.booking_repo().total_revenue().await
    }

    pub async fn bookings_created_since(&self, cutoff: &str) -> Result<Vec<bookings::Model>> {
        self.booking_repo().created_since(cutoff).await
    }
}

use crate::entities::prelude::*;
use crate::entities::{bookings, users};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap admin account. Change the password after first login.
const ADMIN_EMAIL: &str = "admin@fleetr.local";
const ADMIN_PASSWORD: &str = "admin123";

/// Hash the bootstrap admin password using Argon2id
fn hash_admin_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash admin password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Cars)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Bookings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // The conflict scan filters on (car_id, status) for every booking
        // attempt and delete guard.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_car_status")
                    .table(Bookings)
                    .col(bookings::Column::CarId)
                    .col(bookings::Column::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_user")
                    .table(Bookings)
                    .col(bookings::Column::UserId)
                    .to_owned(),
            )
            .await?;

        // Seed the bootstrap admin with a hashed password
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_admin_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Email,
                users::Column::PasswordHash,
                users::Column::FullName,
                users::Column::Phone,
                users::Column::IsAdmin,
                users::Column::CreatedAt,
            ])
            .values_panic([
                ADMIN_EMAIL.into(),
                password_hash.into(),
                "Fleet Administrator".into(),
                "012345678".into(),
                true.into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cars).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub brand: String,

    pub model: String,

    /// One of: Sedan, SUV, Van, Pickup
    pub category: String,

    pub seat_capacity: i32,

    /// Daily rate in a single implicit currency unit.
    pub price_per_day: f64,

    /// Filename under the uploads directory, or the placeholder image.
    pub image_url: String,

    pub description: Option<String>,

    pub fuel_type: String,

    pub transmission: String,

    pub year: i32,

    #[sea_orm(unique)]
    pub license_plate: String,

    pub is_available: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub car_id: i32,

    pub start_date: Date,

    pub end_date: Date,

    /// Calendar days between start and end (end exclusive).
    pub total_days: i32,

    /// Price snapshot taken at creation time. Never recomputed, even if
    /// the car's daily rate changes afterwards.
    pub total_price: f64,

    /// One of: pending, approved, cancelled, completed
    pub status: String,

    pub created_at: String,

    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::cars::Entity",
        from = "Column::CarId",
        to = "super::cars::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Cars,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::cars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

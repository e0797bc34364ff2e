pub use super::bookings::Entity as Bookings;
pub use super::cars::Entity as Cars;
pub use super::users::Entity as Users;

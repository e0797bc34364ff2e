pub mod prelude;

pub mod bookings;
pub mod cars;
pub mod users;

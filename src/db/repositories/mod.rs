pub mod booking;
pub mod car;
pub mod user;

use serde::Serialize;

use crate::db::User;
use crate::entities::{bookings, cars};

/// Uniform JSON envelope for every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub const fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// One page of results with the total page count for pagination controls.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: &'static str,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            role: if user.role.is_admin() {
                "admin"
            } else {
                "customer"
            },
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CarDto {
    pub id: i32,
    pub brand: String,
    pub model: String,
    pub category: String,
    pub seat_capacity: i32,
    pub price_per_day: f64,
    pub image_url: String,
    pub description: Option<String>,
    pub fuel_type: String,
    pub transmission: String,
    pub year: i32,
    pub license_plate: String,
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<cars::Model> for CarDto {
    fn from(car: cars::Model) -> Self {
        Self {
            id: car.id,
            brand: car.brand,
            model: car.model,
            category: car.category,
            seat_capacity: car.seat_capacity,
            price_per_day: car.price_per_day,
            image_url: format!("/uploads/{}", car.image_url),
            description: car.description,
            fuel_type: car.fuel_type,
            transmission: car.transmission,
            year: car.year,
            license_plate: car.license_plate,
            is_available: car.is_available,
            created_at: car.created_at,
            updated_at: car.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingDto {
    pub id: i32,
    pub user_id: i32,
    pub car_id: i32,
    pub start_date: String,
    pub end_date: String,
    pub total_days: i32,
    pub total_price: f64,
    pub status: String,
    pub created_at: String,
    pub notes: Option<String>,
}

impl From<bookings::Model> for BookingDto {
    fn from(booking: bookings::Model) -> Self {
        Self {
            id: booking.id,
            user_id: booking.user_id,
            car_id: booking.car_id,
            start_date: booking.start_date.to_string(),
            end_date: booking.end_date.to_string(),
            total_days: booking.total_days,
            total_price: booking.total_price,
            status: booking.status,
            created_at: booking.created_at,
            notes: booking.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

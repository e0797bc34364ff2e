//! Domain types for the rental system with strong typing.
//!
//! Role-based behavior is expressed as an explicit [`Role`] enum resolved
//! once at the authorization boundary instead of ad-hoc `is_admin` checks,
//! and booking lifecycle rules live on [`BookingStatus`].

use std::fmt;

/// Caller identity resolved by the session gate, attached to each
/// authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn from_flag(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::Customer }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Lifecycle state of a booking.
///
/// `pending -> approved | cancelled`, `approved -> cancelled`.
/// `cancelled` and `completed` are terminal; `completed` is only ever set
/// by an external process, never by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Pending,
    Approved,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Statuses that block a car's dates and prevent car deletion.
    pub const ACTIVE: [Self; 2] = [Self::Pending, Self::Approved];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Cancelled)
                | (Self::Approved, Self::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarCategory {
    Sedan,
    Suv,
    Van,
    Pickup,
}

impl CarCategory {
    pub const ALL: [Self; 4] = [Self::Sedan, Self::Suv, Self::Van, Self::Pickup];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sedan => "Sedan",
            Self::Suv => "SUV",
            Self::Van => "Van",
            Self::Pickup => "Pickup",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for CarCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
}

impl FuelType {
    pub const ALL: [Self; 4] = [Self::Petrol, Self::Diesel, Self::Hybrid, Self::Electric];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Petrol => "Petrol",
            Self::Diesel => "Diesel",
            Self::Hybrid => "Hybrid",
            Self::Electric => "Electric",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transmission {
    Automatic,
    Manual,
}

impl Transmission {
    pub const ALL: [Self; 2] = [Self::Automatic, Self::Manual];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "Automatic",
            Self::Manual => "Manual",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

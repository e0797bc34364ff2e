pub mod booking_engine;
pub use booking_engine::{BookingEngine, BookingError, BookingRequest, CancelOutcome};

pub mod image;
pub use image::{CarImageService, ImageError};

pub mod inventory;
pub use inventory::{CarInput, InventoryError, InventoryService};

pub mod reporting;
pub use reporting::ReportingService;

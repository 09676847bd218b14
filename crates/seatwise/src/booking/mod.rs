//! Booking intake: storage, the locking service around the allocation
//! engine, and the HTTP endpoints.

pub mod csv_store;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use csv_store::{default_routes, default_vehicles, CsvBookingStore};
pub use repository::{BookingRepository, RepositoryError, VehicleOccupancy, VehicleStatusView};
pub use router::booking_router;
pub use service::{
    BookingService, BookingServiceError, BookingSubmission, SlotOccupancy, ValidSubmission,
};

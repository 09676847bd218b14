//! Seat allocation core: layout, scoring, policies and the engine.
//!
//! Everything here is synchronous and side-effect free. The engine proposes a
//! seat from a [`FleetSnapshot`]; persisting it is the booking service's job.

pub mod catalog;
pub mod domain;
pub mod engine;
pub mod policy;
pub mod scoring;
pub mod seat;

#[cfg(test)]
mod tests;

pub use catalog::{Route, RouteZone, RouteZoneCatalog, DEFAULT_DISTANCE, DEFAULT_ZONE};
pub use domain::{
    AllocationError, Booking, BookingRequest, BookingStatus, NewBooking, SeatAssignment,
    SpecialNeeds, StudentId, TimeSlot, UnavailableReason, Vehicle, VehicleId,
};
pub use engine::{AllocationEngine, FleetSnapshot};
pub use policy::{AllocationContext, AllocationPolicy};
pub use scoring::{PriorityBand, PriorityScorer, SeatPreferenceScorer};
pub use seat::{SeatId, SeatParseError, Zone, SEATS_PER_VEHICLE, SEAT_COLUMNS, SEAT_ROWS};

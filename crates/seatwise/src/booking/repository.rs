use serde::Serialize;

use crate::allocation::{
    Booking, BookingStatus, FleetSnapshot, NewBooking, Route, RouteZoneCatalog, SeatId, TimeSlot,
    Vehicle, VehicleId,
};

/// Storage abstraction so the service can run against CSV files or memory.
///
/// `commit` must assign `max(id) + 1` and refuse a confirmed booking whose
/// seat is already confirmed on the same vehicle.
pub trait BookingRepository: Send + Sync {
    fn routes(&self) -> Result<Vec<Route>, RepositoryError>;
    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError>;
    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError>;
    fn commit(&self, booking: NewBooking) -> Result<Booking, RepositoryError>;
    fn refresh_occupancy(&self, vehicle: &VehicleId) -> Result<VehicleOccupancy, RepositoryError>;

    /// Routes, vehicles and bookings as one allocation input.
    fn snapshot(&self) -> Result<FleetSnapshot, RepositoryError> {
        Ok(FleetSnapshot::new(
            RouteZoneCatalog::new(self.routes()?),
            self.vehicles()?,
            self.bookings()?,
        ))
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("seat {seat} on {vehicle} is already booked")]
    Conflict { vehicle: VehicleId, seat: SeatId },
    #[error("vehicle {0} not found")]
    NotFound(VehicleId),
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed storage file: {0}")]
    Csv(#[from] csv::Error),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Seat counters derived from the confirmed bookings of one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VehicleOccupancy {
    pub booked: u32,
    pub available: u32,
}

impl VehicleOccupancy {
    pub fn from_bookings(vehicle: &Vehicle, bookings: &[Booking]) -> Self {
        let booked = bookings
            .iter()
            .filter(|booking| booking.is_confirmed() && booking.vehicle == vehicle.number)
            .count() as u32;
        Self {
            booked,
            available: vehicle.capacity.saturating_sub(booked),
        }
    }
}

/// Vehicle row as exposed over HTTP, counters included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleStatusView {
    #[serde(rename = "BusID")]
    pub bus_id: String,
    #[serde(rename = "BusNumber")]
    pub number: VehicleId,
    #[serde(rename = "TimeSlot")]
    pub time_slot: TimeSlot,
    #[serde(rename = "TotalSeats")]
    pub total_seats: u32,
    #[serde(rename = "BookedSeats")]
    pub booked_seats: u32,
    #[serde(rename = "AvailableSeats")]
    pub available_seats: u32,
    #[serde(rename = "IsReused")]
    pub is_reused: bool,
    #[serde(rename = "ReusedFrom")]
    pub reused_from: Option<TimeSlot>,
}

impl VehicleStatusView {
    pub fn new(vehicle: &Vehicle, occupancy: VehicleOccupancy) -> Self {
        Self {
            bus_id: vehicle.bus_id.clone(),
            number: vehicle.number.clone(),
            time_slot: vehicle.time_slot.clone(),
            total_seats: vehicle.capacity,
            booked_seats: occupancy.booked,
            available_seats: occupancy.available,
            is_reused: vehicle.is_reused,
            reused_from: vehicle.reused_from.clone(),
        }
    }
}

/// Conflict check shared by the repository implementations.
pub fn ensure_seat_free(bookings: &[Booking], candidate: &NewBooking) -> Result<(), RepositoryError> {
    let taken = bookings.iter().any(|booking| {
        booking.is_confirmed()
            && booking.vehicle == candidate.vehicle
            && booking.seat == candidate.seat
    });
    if taken && candidate.status == BookingStatus::Confirmed {
        return Err(RepositoryError::Conflict {
            vehicle: candidate.vehicle.clone(),
            seat: candidate.seat,
        });
    }
    Ok(())
}

/// Next booking id: one past the largest stored id.
pub fn next_booking_id(bookings: &[Booking]) -> u64 {
    bookings
        .iter()
        .map(|booking| booking.booking_id)
        .max()
        .map_or(1, |max| max + 1)
}

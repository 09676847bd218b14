use metrics_exporter_prometheus::PrometheusHandle;
use seatwise::allocation::{Booking, NewBooking, Route, Vehicle, VehicleId};
use seatwise::booking::repository::{ensure_seat_free, next_booking_id};
use seatwise::booking::{
    default_routes, default_vehicles, BookingRepository, RepositoryError, VehicleOccupancy,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Volatile fleet used by the demo command.
#[derive(Default, Clone)]
pub(crate) struct InMemoryBookingRepository {
    routes: Vec<Route>,
    vehicles: Vec<Vehicle>,
    bookings: Arc<Mutex<Vec<Booking>>>,
}

impl InMemoryBookingRepository {
    /// The same routes and buses a fresh data directory starts with.
    pub(crate) fn seeded() -> Self {
        Self {
            routes: default_routes(),
            vehicles: default_vehicles(),
            bookings: Arc::default(),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<Booking>>, RepositoryError> {
        self.bookings
            .lock()
            .map_err(|_| RepositoryError::Unavailable("booking mutex poisoned".to_string()))
    }
}

impl BookingRepository for InMemoryBookingRepository {
    fn routes(&self) -> Result<Vec<Route>, RepositoryError> {
        Ok(self.routes.clone())
    }

    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        Ok(self.vehicles.clone())
    }

    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.guard()?.clone())
    }

    fn commit(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        let mut bookings = self.guard()?;
        ensure_seat_free(&bookings, &booking)?;
        let stored = booking.into_booking(next_booking_id(&bookings));
        bookings.push(stored.clone());
        Ok(stored)
    }

    fn refresh_occupancy(&self, vehicle: &VehicleId) -> Result<VehicleOccupancy, RepositoryError> {
        let found = self
            .vehicles
            .iter()
            .find(|candidate| &candidate.number == vehicle)
            .ok_or_else(|| RepositoryError::NotFound(vehicle.clone()))?;
        Ok(VehicleOccupancy::from_bookings(found, &self.guard()?))
    }
}

use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::allocation::{
    AllocationEngine, AllocationPolicy, Booking, NewBooking, Route, TimeSlot, Vehicle, VehicleId,
    Zone,
};
use crate::booking::repository::{
    ensure_seat_free, next_booking_id, BookingRepository, RepositoryError, VehicleOccupancy,
};
use crate::booking::service::{BookingService, BookingSubmission};

pub(super) fn routes() -> Vec<Route> {
    vec![
        Route {
            destination: "Rajpur Road".to_string(),
            distance: 3,
            zone: Zone::Front,
        },
        Route {
            destination: "ISBT".to_string(),
            distance: 7,
            zone: Zone::Middle,
        },
        Route {
            destination: "Clement Town".to_string(),
            distance: 12,
            zone: Zone::Back,
        },
    ]
}

pub(super) fn vehicles() -> Vec<Vehicle> {
    [("B1", "BUS1", "11AM"), ("B2", "BUS2", "1PM")]
        .into_iter()
        .map(|(bus_id, number, slot)| Vehicle {
            bus_id: bus_id.to_string(),
            number: VehicleId(number.to_string()),
            time_slot: TimeSlot(slot.to_string()),
            capacity: 40,
            is_reused: false,
            reused_from: None,
        })
        .collect()
}

pub(super) fn submission(student_id: &str, destination: &str) -> BookingSubmission {
    BookingSubmission {
        name: Some(format!("Student {student_id}")),
        student_id: Some(student_id.to_string()),
        email: Some(format!("{student_id}@campus.test")),
        time_slot: Some("11AM".to_string()),
        destination: Some(destination.to_string()),
        special_needs: None,
        priority: None,
    }
}

pub(super) fn build_service(
    policy: AllocationPolicy,
) -> (BookingService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = BookingService::new(repository.clone(), AllocationEngine::new(policy));
    (service, repository)
}

#[derive(Clone)]
pub(super) struct MemoryRepository {
    pub(super) bookings: Arc<Mutex<Vec<Booking>>>,
    pub(super) refreshed: Arc<Mutex<Vec<VehicleId>>>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self {
            bookings: Arc::new(Mutex::new(Vec::new())),
            refreshed: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MemoryRepository {
    pub(super) fn stored(&self) -> Vec<Booking> {
        self.bookings.lock().expect("repository mutex poisoned").clone()
    }
}

impl BookingRepository for MemoryRepository {
    fn routes(&self) -> Result<Vec<Route>, RepositoryError> {
        Ok(routes())
    }

    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        Ok(vehicles())
    }

    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.stored())
    }

    fn commit(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        let mut guard = self.bookings.lock().expect("repository mutex poisoned");
        ensure_seat_free(&guard, &booking)?;
        let stored = booking.into_booking(next_booking_id(&guard));
        guard.push(stored.clone());
        Ok(stored)
    }

    fn refresh_occupancy(&self, vehicle: &VehicleId) -> Result<VehicleOccupancy, RepositoryError> {
        self.refreshed
            .lock()
            .expect("refresh mutex poisoned")
            .push(vehicle.clone());
        let vehicle = vehicles()
            .into_iter()
            .find(|candidate| candidate.number == *vehicle)
            .ok_or_else(|| RepositoryError::NotFound(vehicle.clone()))?;
        Ok(VehicleOccupancy::from_bookings(&vehicle, &self.stored()))
    }
}

/// Accepts every read but refuses writes with a seat conflict.
pub(super) struct ConflictRepository;

impl BookingRepository for ConflictRepository {
    fn routes(&self) -> Result<Vec<Route>, RepositoryError> {
        Ok(routes())
    }

    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        Ok(vehicles())
    }

    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        Ok(Vec::new())
    }

    fn commit(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        Err(RepositoryError::Conflict {
            vehicle: booking.vehicle,
            seat: booking.seat,
        })
    }

    fn refresh_occupancy(&self, vehicle: &VehicleId) -> Result<VehicleOccupancy, RepositoryError> {
        Err(RepositoryError::NotFound(vehicle.clone()))
    }
}

pub(super) struct UnavailableRepository;

impl BookingRepository for UnavailableRepository {
    fn routes(&self) -> Result<Vec<Route>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk offline".to_string()))
    }

    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk offline".to_string()))
    }

    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk offline".to_string()))
    }

    fn commit(&self, _booking: NewBooking) -> Result<Booking, RepositoryError> {
        Err(RepositoryError::Unavailable("disk offline".to_string()))
    }

    fn refresh_occupancy(&self, _vehicle: &VehicleId) -> Result<VehicleOccupancy, RepositoryError> {
        Err(RepositoryError::Unavailable("disk offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::repository::{BookingRepository, RepositoryError, VehicleOccupancy, VehicleStatusView};
use crate::allocation::{
    AllocationEngine, AllocationError, AllocationPolicy, Booking, BookingRequest, BookingStatus,
    NewBooking, Route, SeatAssignment, SeatId, SpecialNeeds, StudentId, TimeSlot,
    UnavailableReason, Vehicle, VehicleId,
};

/// Booking form as submitted over HTTP. Every field is optional on the wire
/// so missing values surface as one validation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub email: Option<String>,
    pub time_slot: Option<String>,
    pub destination: Option<String>,
    pub special_needs: Option<String>,
    pub priority: Option<String>,
}

/// A submission with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub name: String,
    pub email: String,
    pub request: BookingRequest,
}

impl BookingSubmission {
    pub fn validate(self) -> Result<ValidSubmission, BookingServiceError> {
        let required = |value: Option<String>| {
            value
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .ok_or(BookingServiceError::MissingFields)
        };

        let name = required(self.name)?;
        let student_id = required(self.student_id)?;
        let email = required(self.email)?;
        let time_slot = required(self.time_slot)?;
        let destination = required(self.destination)?;

        let special_needs = match self.special_needs.as_deref().map(str::parse::<SpecialNeeds>) {
            None => SpecialNeeds::None,
            Some(Ok(needs)) => needs,
            Some(Err(reason)) => {
                warn!(%reason, "ignoring unrecognised special needs");
                SpecialNeeds::None
            }
        };
        let priority = self
            .priority
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| "Normal".to_string());

        Ok(ValidSubmission {
            name,
            email,
            request: BookingRequest::new(student_id, destination, time_slot)
                .with_special_needs(special_needs)
                .with_priority_label(priority),
        })
    }
}

/// Confirmed seats of the vehicle serving a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOccupancy {
    pub vehicle: Vehicle,
    pub occupied: BTreeSet<SeatId>,
}

/// Mutex per vehicle; snapshot, allocation and commit for one vehicle never interleave.
#[derive(Debug, Default)]
pub(crate) struct VehicleLocks {
    locks: Mutex<HashMap<VehicleId, Arc<Mutex<()>>>>,
}

impl VehicleLocks {
    pub(crate) fn handle(&self, vehicle: &VehicleId) -> Result<Arc<Mutex<()>>, BookingServiceError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| BookingServiceError::LockPoisoned)?;
        Ok(locks.entry(vehicle.clone()).or_default().clone())
    }
}

/// Service composing the allocation engine with a booking repository.
pub struct BookingService<R> {
    repository: Arc<R>,
    engine: AllocationEngine,
    locks: VehicleLocks,
}

impl<R> BookingService<R>
where
    R: BookingRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: AllocationEngine) -> Self {
        Self {
            repository,
            engine,
            locks: VehicleLocks::default(),
        }
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.engine.policy()
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Validate, allocate and persist one booking.
    pub fn book(&self, submission: BookingSubmission) -> Result<Booking, BookingServiceError> {
        let submission = submission.validate()?;
        let request = &submission.request;

        let vehicle = self
            .repository
            .vehicles()?
            .into_iter()
            .find(|vehicle| vehicle.time_slot == request.time_slot)
            .ok_or_else(|| AllocationError::Unavailable {
                slot: request.time_slot.clone(),
                reason: UnavailableReason::NoVehicle,
            })?;

        let handle = self.locks.handle(&vehicle.number)?;
        let _held = handle
            .lock()
            .map_err(|_| BookingServiceError::LockPoisoned)?;

        let snapshot = self.repository.snapshot()?;
        let assignment = match self.engine.allocate(request, &snapshot) {
            Ok(assignment) => assignment,
            Err(error) => {
                warn!(
                    student = %request.student_id,
                    slot = %request.time_slot,
                    %error,
                    "booking rejected"
                );
                return Err(error.into());
            }
        };

        let booking = self
            .repository
            .commit(new_booking(&submission, &assignment, now()))?;
        let occupancy = self.repository.refresh_occupancy(&assignment.vehicle)?;

        info!(
            booking_id = booking.booking_id,
            student = %booking.student_id,
            vehicle = %booking.vehicle,
            seat = %booking.seat,
            booked = occupancy.booked,
            available = occupancy.available,
            "booking confirmed"
        );
        Ok(booking)
    }

    pub fn routes(&self) -> Result<Vec<Route>, BookingServiceError> {
        Ok(self.repository.routes()?)
    }

    pub fn bookings(&self) -> Result<Vec<Booking>, BookingServiceError> {
        Ok(self.repository.bookings()?)
    }

    /// Bookings matching the e-mail or the student id; at least one is required.
    pub fn student_bookings(
        &self,
        email: Option<&str>,
        student_id: Option<&str>,
    ) -> Result<Vec<Booking>, BookingServiceError> {
        let email = email.map(str::trim).filter(|value| !value.is_empty());
        let student_id = student_id
            .map(|value| StudentId(value.to_string()))
            .filter(|value| !value.0.trim().is_empty());
        if email.is_none() && student_id.is_none() {
            return Err(BookingServiceError::MissingLookup);
        }

        let bookings = self.repository.bookings()?;
        Ok(bookings
            .into_iter()
            .filter(|booking| {
                email.is_some_and(|email| booking.email == email)
                    || student_id
                        .as_ref()
                        .is_some_and(|student| booking.student_id.matches(student))
            })
            .collect())
    }

    /// Vehicles with counters derived from the booking ledger.
    pub fn vehicle_statuses(&self) -> Result<Vec<VehicleStatusView>, BookingServiceError> {
        let bookings = self.repository.bookings()?;
        Ok(self
            .repository
            .vehicles()?
            .iter()
            .map(|vehicle| {
                VehicleStatusView::new(vehicle, VehicleOccupancy::from_bookings(vehicle, &bookings))
            })
            .collect())
    }

    pub fn slot_occupancy(&self, slot: &TimeSlot) -> Result<SlotOccupancy, BookingServiceError> {
        let snapshot = self.repository.snapshot()?;
        let vehicle = snapshot
            .vehicle_for_slot(slot)
            .cloned()
            .ok_or_else(|| AllocationError::Unavailable {
                slot: slot.clone(),
                reason: UnavailableReason::NoVehicle,
            })?;
        let occupied = snapshot.confirmed_seats(&vehicle.number);
        Ok(SlotOccupancy { vehicle, occupied })
    }
}

fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn new_booking(
    submission: &ValidSubmission,
    assignment: &SeatAssignment,
    created_at: NaiveDateTime,
) -> NewBooking {
    let request = &submission.request;
    NewBooking {
        student_id: request.student_id.clone(),
        name: submission.name.clone(),
        email: submission.email.clone(),
        vehicle: assignment.vehicle.clone(),
        seat: assignment.seat,
        time_slot: request.time_slot.clone(),
        destination: request.destination.clone(),
        created_at,
        status: BookingStatus::Confirmed,
        priority: request
            .priority_label
            .clone()
            .unwrap_or_else(|| "Normal".to_string()),
        special_needs: request.special_needs,
    }
}

/// Error raised by the booking service.
#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Email or Student ID is required")]
    MissingLookup,
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("vehicle lock poisoned")]
    LockPoisoned,
}

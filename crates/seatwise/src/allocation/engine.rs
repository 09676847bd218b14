use std::collections::BTreeSet;

use tracing::{info, warn};

use super::catalog::RouteZoneCatalog;
use super::domain::{
    AllocationError, Booking, BookingRequest, SeatAssignment, StudentId, TimeSlot,
    UnavailableReason, Vehicle, VehicleId,
};
use super::policy::{AllocationContext, AllocationPolicy};
use super::seat::SeatId;

/// Everything an allocation decision reads, loaded once per request.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    pub catalog: RouteZoneCatalog,
    pub vehicles: Vec<Vehicle>,
    pub bookings: Vec<Booking>,
}

impl FleetSnapshot {
    pub fn new(catalog: RouteZoneCatalog, vehicles: Vec<Vehicle>, bookings: Vec<Booking>) -> Self {
        Self {
            catalog,
            vehicles,
            bookings,
        }
    }

    pub fn vehicle_for_slot(&self, slot: &TimeSlot) -> Option<&Vehicle> {
        self.vehicles
            .iter()
            .find(|vehicle| vehicle.time_slot == *slot)
    }

    pub fn has_confirmed(&self, student: &StudentId, slot: &TimeSlot) -> bool {
        self.bookings.iter().any(|booking| {
            booking.is_confirmed()
                && booking.time_slot == *slot
                && booking.student_id.matches(student)
        })
    }

    /// Seats held by confirmed bookings on `vehicle`.
    pub fn confirmed_seats(&self, vehicle: &VehicleId) -> BTreeSet<SeatId> {
        self.bookings
            .iter()
            .filter(|booking| booking.is_confirmed() && booking.vehicle == *vehicle)
            .map(|booking| booking.seat)
            .collect()
    }

    /// Pending requests of the slot in arrival order, `excluding` left out.
    pub fn pending_requests(&self, slot: &TimeSlot, excluding: &StudentId) -> Vec<BookingRequest> {
        self.slot_bookings(slot)
            .into_iter()
            .filter(|booking| !booking.is_confirmed() && !booking.student_id.matches(excluding))
            .map(Booking::as_request)
            .collect()
    }

    /// Students of every booking for the slot, ordered by creation time then id.
    pub fn arrivals(&self, slot: &TimeSlot) -> Vec<StudentId> {
        self.slot_bookings(slot)
            .into_iter()
            .map(|booking| booking.student_id.clone())
            .collect()
    }

    fn slot_bookings(&self, slot: &TimeSlot) -> Vec<&Booking> {
        let mut bookings: Vec<&Booking> = self
            .bookings
            .iter()
            .filter(|booking| booking.time_slot == *slot)
            .collect();
        bookings.sort_by_key(|booking| (booking.created_at, booking.booking_id));
        bookings
    }
}

/// Front door of the allocation core. Holds the process-wide policy.
#[derive(Debug, Clone, Copy)]
pub struct AllocationEngine {
    policy: AllocationPolicy,
}

impl AllocationEngine {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Propose a seat for `request`. Nothing is written; the caller commits.
    pub fn allocate(
        &self,
        request: &BookingRequest,
        snapshot: &FleetSnapshot,
    ) -> Result<SeatAssignment, AllocationError> {
        if snapshot.has_confirmed(&request.student_id, &request.time_slot) {
            return Err(AllocationError::DuplicateBooking {
                student: request.student_id.clone(),
                slot: request.time_slot.clone(),
            });
        }

        let vehicle = snapshot
            .vehicle_for_slot(&request.time_slot)
            .ok_or_else(|| AllocationError::Unavailable {
                slot: request.time_slot.clone(),
                reason: UnavailableReason::NoVehicle,
            })?;

        let occupied = snapshot.confirmed_seats(&vehicle.number);
        let pending = if self.policy.needs_pending() {
            snapshot.pending_requests(&request.time_slot, &request.student_id)
        } else {
            Vec::new()
        };
        let arrivals = if self.policy.needs_arrivals() {
            snapshot.arrivals(&request.time_slot)
        } else {
            Vec::new()
        };

        let context = AllocationContext {
            request,
            occupied: &occupied,
            catalog: &snapshot.catalog,
            pending: &pending,
            arrivals: &arrivals,
        };
        let route = snapshot.catalog.lookup(&request.destination);
        if route.defaulted {
            warn!(
                destination = %request.destination,
                zone = %route.zone,
                distance = route.distance,
                "unknown destination, using default route"
            );
        }

        let seat = self.policy.allocate(&context)?;
        info!(
            policy = self.policy.key(),
            student = %request.student_id,
            slot = %request.time_slot,
            vehicle = %vehicle.number,
            seat = %seat,
            batch = pending.len() + 1,
            "seat allocated"
        );

        Ok(SeatAssignment {
            vehicle: vehicle.number.clone(),
            seat,
            policy: self.policy,
            route_defaulted: route.defaulted,
        })
    }
}

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::allocation::catalog::{Route, RouteZoneCatalog};
use crate::allocation::domain::{
    Booking, BookingRequest, BookingStatus, SpecialNeeds, StudentId, TimeSlot, Vehicle, VehicleId,
};
use crate::allocation::engine::FleetSnapshot;
use crate::allocation::policy::AllocationContext;
use crate::allocation::seat::{SeatId, Zone};

pub(super) const SLOT: &str = "11AM";
pub(super) const BUS: &str = "BUS1";

pub(super) fn catalog() -> RouteZoneCatalog {
    RouteZoneCatalog::new(vec![
        route("Rajpur Road", 3, Zone::Front),
        route("ISBT", 7, Zone::Middle),
        route("Clement Town", 12, Zone::Back),
    ])
}

fn route(destination: &str, distance: u32, zone: Zone) -> Route {
    Route {
        destination: destination.to_string(),
        distance,
        zone,
    }
}

pub(super) fn vehicle() -> Vehicle {
    Vehicle {
        bus_id: "B1".to_string(),
        number: VehicleId(BUS.to_string()),
        time_slot: TimeSlot(SLOT.to_string()),
        capacity: 40,
        is_reused: false,
        reused_from: None,
    }
}

pub(super) fn seat(raw: &str) -> SeatId {
    raw.parse().expect("valid seat")
}

pub(super) fn seats(raw: &[&str]) -> BTreeSet<SeatId> {
    raw.iter().map(|value| seat(value)).collect()
}

/// Every seat except the listed ones.
pub(super) fn all_but(free: &[&str]) -> BTreeSet<SeatId> {
    let free = seats(free);
    SeatId::all().filter(|seat| !free.contains(seat)).collect()
}

pub(super) fn request(student: &str, destination: &str) -> BookingRequest {
    BookingRequest::new(student, destination, SLOT)
}

pub(super) fn needy(student: &str, destination: &str, needs: SpecialNeeds) -> BookingRequest {
    request(student, destination).with_special_needs(needs)
}

pub(super) fn context<'a>(
    request: &'a BookingRequest,
    occupied: &'a BTreeSet<SeatId>,
    catalog: &'a RouteZoneCatalog,
    pending: &'a [BookingRequest],
    arrivals: &'a [StudentId],
) -> AllocationContext<'a> {
    AllocationContext {
        request,
        occupied,
        catalog,
        pending,
        arrivals,
    }
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 6)
        .expect("valid date")
        .and_hms_opt(8, 0, 0)
        .expect("valid time")
}

/// Booking on the test vehicle created `id` minutes after the base time.
pub(super) fn booking(id: u64, student: &str, raw_seat: &str, status: BookingStatus) -> Booking {
    Booking {
        booking_id: id,
        student_id: StudentId(student.to_string()),
        name: format!("Student {student}"),
        email: format!("{student}@campus.test"),
        vehicle: VehicleId(BUS.to_string()),
        seat: seat(raw_seat),
        time_slot: TimeSlot(SLOT.to_string()),
        destination: "ISBT".to_string(),
        created_at: base_time() + Duration::minutes(id as i64),
        status,
        priority: "Normal".to_string(),
        special_needs: SpecialNeeds::None,
    }
}

pub(super) fn snapshot(bookings: Vec<Booking>) -> FleetSnapshot {
    FleetSnapshot::new(catalog(), vec![vehicle()], bookings)
}

/// Confirmed bookings on every seat of the test vehicle.
pub(super) fn full_vehicle() -> Vec<Booking> {
    SeatId::all()
        .enumerate()
        .map(|(index, seat)| {
            let mut booking = booking(
                index as u64 + 1,
                &(5000 + index).to_string(),
                "A1",
                BookingStatus::Confirmed,
            );
            booking.seat = seat;
            booking
        })
        .collect()
}

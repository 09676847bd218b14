use super::common::*;
use crate::allocation::domain::{
    AllocationError, BookingRequest, BookingStatus, SpecialNeeds, StudentId, TimeSlot,
    UnavailableReason,
};
use crate::allocation::engine::{AllocationEngine, FleetSnapshot};
use crate::allocation::policy::AllocationPolicy;

#[test]
fn confirmed_booking_blocks_a_second_one_in_the_slot() {
    let snapshot = snapshot(vec![booking(1, "101", "A1", BookingStatus::Confirmed)]);
    let engine = AllocationEngine::new(AllocationPolicy::ZoneGreedy);

    let result = engine.allocate(&request("101", "ISBT"), &snapshot);
    assert_eq!(
        result,
        Err(AllocationError::DuplicateBooking {
            student: StudentId("101".to_string()),
            slot: TimeSlot(SLOT.to_string()),
        })
    );
}

#[test]
fn pending_booking_is_not_a_duplicate() {
    let snapshot = snapshot(vec![booking(1, "101", "A1", BookingStatus::Pending)]);
    let engine = AllocationEngine::new(AllocationPolicy::ZoneGreedy);

    let assignment = engine
        .allocate(&request("101", "ISBT"), &snapshot)
        .expect("pending rows do not hold seats");
    assert_eq!(assignment.seat, seat("D1"));
}

#[test]
fn slot_without_vehicle_is_unavailable() {
    let snapshot = snapshot(Vec::new());
    let engine = AllocationEngine::new(AllocationPolicy::HybridPriorityGroup);
    let request = BookingRequest::new("101", "ISBT", "9PM");

    assert_eq!(
        engine.allocate(&request, &snapshot),
        Err(AllocationError::Unavailable {
            slot: TimeSlot("9PM".to_string()),
            reason: UnavailableReason::NoVehicle,
        })
    );
}

#[test]
fn assignment_reports_vehicle_policy_and_route_default() {
    let snapshot = snapshot(Vec::new());
    let engine = AllocationEngine::new(AllocationPolicy::PreferenceMaximizing);

    let known = engine
        .allocate(&request("101", "Clement Town"), &snapshot)
        .unwrap();
    assert_eq!(known.vehicle.0, BUS);
    assert_eq!(known.seat, seat("H1"));
    assert_eq!(known.policy, AllocationPolicy::PreferenceMaximizing);
    assert!(!known.route_defaulted);

    let unknown = engine
        .allocate(&request("101", "Mussoorie"), &snapshot)
        .unwrap();
    assert_eq!(unknown.seat, seat("D1"));
    assert!(unknown.route_defaulted);
}

#[test]
fn engine_skips_seats_of_confirmed_bookings_only() {
    let snapshot = snapshot(vec![
        booking(1, "201", "D1", BookingStatus::Confirmed),
        booking(2, "202", "D2", BookingStatus::Pending),
    ]);
    let engine = AllocationEngine::new(AllocationPolicy::ZoneGreedy);

    let assignment = engine.allocate(&request("101", "ISBT"), &snapshot).unwrap();
    assert_eq!(assignment.seat, seat("D2"));
}

#[test]
fn engine_feeds_pending_bookings_to_batch_policies() {
    let mut injured = booking(1, "300", "A1", BookingStatus::Pending);
    injured.special_needs = SpecialNeeds::Injury;
    injured.destination = "Clement Town".to_string();

    let mut bookings = full_vehicle();
    bookings.retain(|booking| booking.seat != seat("A1") && booking.seat != seat("J4"));
    bookings.push(injured);
    let snapshot = snapshot(bookings);

    let engine = AllocationEngine::new(AllocationPolicy::HybridPriorityGroup);
    let assignment = engine
        .allocate(&request("100", "Rajpur Road"), &snapshot)
        .unwrap();
    assert_eq!(assignment.seat, seat("J4"));

    // ZoneGreedy ignores the pending rider entirely.
    let greedy = AllocationEngine::new(AllocationPolicy::ZoneGreedy)
        .allocate(&request("100", "Rajpur Road"), &snapshot)
        .unwrap();
    assert_eq!(greedy.seat, seat("A1"));
}

#[test]
fn unrankable_pending_booking_does_not_block_the_slot() {
    let snapshot = snapshot(vec![booking(1, "abc", "C2", BookingStatus::Pending)]);

    for policy in [
        AllocationPolicy::PriorityQueueFair,
        AllocationPolicy::HybridPriorityGroup,
        AllocationPolicy::BatchOptimal,
    ] {
        let engine = AllocationEngine::new(policy);
        let assignment = engine
            .allocate(&request("100", "Rajpur Road"), &snapshot)
            .unwrap_or_else(|err| panic!("{policy}: {err}"));
        assert_eq!(assignment.seat, seat("A1"), "{policy}");

        let own = engine.allocate(&request("xyz", "Rajpur Road"), &snapshot);
        assert_eq!(
            own,
            Err(AllocationError::MalformedStudentId {
                raw: "xyz".to_string()
            }),
            "{policy}"
        );
    }
}

#[test]
fn own_pending_booking_does_not_compete_with_the_request() {
    let mut bookings = full_vehicle();
    bookings.retain(|booking| booking.seat != seat("E4"));
    bookings.push(booking(90, "101", "E4", BookingStatus::Pending));
    let snapshot = snapshot(bookings);

    for policy in [
        AllocationPolicy::PriorityQueueFair,
        AllocationPolicy::HybridPriorityGroup,
        AllocationPolicy::BatchOptimal,
    ] {
        let assignment = AllocationEngine::new(policy)
            .allocate(&request("101", "ISBT"), &snapshot)
            .unwrap_or_else(|err| panic!("{policy}: {err}"));
        assert_eq!(assignment.seat, seat("E4"), "{policy}");
    }
}

#[test]
fn round_robin_position_follows_creation_order() {
    // ids are out of creation order on purpose
    let mut bookings: Vec<_> = ["11", "12", "13", "14", "15"]
        .iter()
        .enumerate()
        .map(|(index, student)| {
            let mut row = booking(100 - index as u64, student, "A1", BookingStatus::Pending);
            row.created_at = booking(index as u64, student, "A1", BookingStatus::Pending).created_at;
            row
        })
        .collect();
    bookings.push(booking(200, "16", "A1", BookingStatus::Pending));
    let snapshot = snapshot(bookings);

    assert_eq!(
        snapshot.arrivals(&TimeSlot(SLOT.to_string())),
        ["11", "12", "13", "14", "15", "16"]
            .iter()
            .map(|id| StudentId(id.to_string()))
            .collect::<Vec<_>>()
    );

    let engine = AllocationEngine::new(AllocationPolicy::RoundRobinFair);
    let fifth = engine.allocate(&request("16", "ISBT"), &snapshot).unwrap();
    assert_eq!(fifth.seat, seat("B2"));
    let newcomer = engine.allocate(&request("17", "ISBT"), &snapshot).unwrap();
    assert_eq!(newcomer.seat, seat("B3"));
}

#[test]
fn full_vehicle_is_unavailable_through_the_engine() {
    let snapshot = snapshot(full_vehicle());

    for policy in AllocationPolicy::ordered() {
        let result = AllocationEngine::new(policy).allocate(&request("101", "ISBT"), &snapshot);
        assert!(
            matches!(
                result,
                Err(AllocationError::Unavailable {
                    reason: UnavailableReason::NoFreeSeat,
                    ..
                })
            ),
            "{policy}: {result:?}"
        );
    }
}

#[test]
fn allocation_leaves_the_snapshot_untouched() {
    let original = snapshot(vec![
        booking(1, "201", "D1", BookingStatus::Confirmed),
        booking(2, "202", "D2", BookingStatus::Pending),
    ]);
    let snapshot: FleetSnapshot = original.clone();

    for policy in AllocationPolicy::ordered() {
        let first = AllocationEngine::new(policy).allocate(&request("101", "ISBT"), &snapshot);
        let second = AllocationEngine::new(policy).allocate(&request("101", "ISBT"), &snapshot);
        assert_eq!(first, second, "{policy}");
    }
    assert_eq!(snapshot.bookings, original.bookings);
    assert_eq!(snapshot.vehicles, original.vehicles);
}

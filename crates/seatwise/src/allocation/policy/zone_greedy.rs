use super::AllocationContext;
use crate::allocation::domain::{AllocationError, UnavailableReason};
use crate::allocation::seat::SeatId;

/// First free seat of the destination's zone, falling back to the whole vehicle.
pub(super) fn allocate(context: &AllocationContext<'_>) -> Result<SeatId, AllocationError> {
    let zone = context.catalog.lookup(&context.request.destination).zone;

    zone.seats()
        .find(|seat| !context.occupied.contains(seat))
        .or_else(|| context.free_seats().next())
        .ok_or_else(|| context.unavailable(UnavailableReason::NoFreeSeat))
}

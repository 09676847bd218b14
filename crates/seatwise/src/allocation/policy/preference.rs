use super::{best_seat, AllocationContext};
use crate::allocation::domain::{AllocationError, UnavailableReason};
use crate::allocation::seat::SeatId;

/// Free seat with the best preference score; canonical order breaks ties.
///
/// Locally optimal for the single request only.
pub(super) fn allocate(context: &AllocationContext<'_>) -> Result<SeatId, AllocationError> {
    let scorer = context.preference();
    let destination = context.request.destination.as_str();

    best_seat(context.free_seats(), |seat| scorer.score(destination, seat))
        .ok_or_else(|| context.unavailable(UnavailableReason::NoFreeSeat))
}

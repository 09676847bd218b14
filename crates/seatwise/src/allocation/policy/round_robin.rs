use super::AllocationContext;
use crate::allocation::domain::{AllocationError, UnavailableReason};
use crate::allocation::seat::SeatId;

/// Rotates the free seats by the request's arrival position so consecutive
/// bookers are spread across the vehicle instead of filling it front to back.
pub(super) fn allocate(context: &AllocationContext<'_>) -> Result<SeatId, AllocationError> {
    context.request.student_id.numeric()?;

    let free: Vec<SeatId> = context.free_seats().collect();
    if free.is_empty() {
        return Err(context.unavailable(UnavailableReason::NoFreeSeat));
    }

    let position = context
        .arrivals
        .iter()
        .position(|student| student.matches(&context.request.student_id))
        .unwrap_or(context.arrivals.len());

    Ok(free[position % free.len()])
}

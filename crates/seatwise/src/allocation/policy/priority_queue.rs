use super::{priority_order, AllocationContext, SeatLedger};
use crate::allocation::domain::AllocationError;
use crate::allocation::seat::SeatId;
use tracing::debug;

/// Replays the pending batch in descending priority order, each request taking
/// its best remaining seat, and reports what the current request ended up with.
pub(super) fn allocate(context: &AllocationContext<'_>) -> Result<SeatId, AllocationError> {
    let batch = context.batch();
    let current = batch.len() - 1;
    let priorities = context.batch_priorities(&batch)?;
    let scorer = context.preference();
    let mut ledger = SeatLedger::new(context.occupied);

    for position in priority_order(&priorities) {
        let request = batch[position];
        let claimed = ledger.claim_best(&scorer, request);
        debug!(
            student = %request.student_id,
            priority = priorities[position],
            seat = ?claimed.map(|seat| seat.to_string()),
            "priority queue claim"
        );

        if position == current {
            return claimed.ok_or_else(|| context.exhausted());
        }
    }

    Err(context.exhausted())
}

use super::{AllocationContext, SeatLedger};
use crate::allocation::domain::AllocationError;
use crate::allocation::scoring::{band_bonus, PriorityBand};
use crate::allocation::seat::SeatId;
use tracing::debug;

/// Serves the batch band by band (Critical, High, Medium, Normal).
///
/// Inside a band members are ordered by `preference(destination, A1) *
/// band multiplier + special-needs bonus`, then each takes its best
/// remaining seat. A later band only sees seats earlier bands left over.
pub(super) fn allocate(context: &AllocationContext<'_>) -> Result<SeatId, AllocationError> {
    let batch = context.batch();
    let current = batch.len() - 1;
    let priorities = context.batch_priorities(&batch)?;
    let scorer = context.preference();
    let mut ledger = SeatLedger::new(context.occupied);

    for band in PriorityBand::ordered() {
        let mut members: Vec<(usize, f64)> = priorities
            .iter()
            .enumerate()
            .filter(|(_, priority)| PriorityBand::from_score(**priority) == band)
            .map(|(position, _)| {
                let request = batch[position];
                let reference = f64::from(scorer.score(&request.destination, SeatId::FIRST));
                let value = reference * band.multiplier() + band_bonus(request.special_needs);
                (position, value)
            })
            .collect();
        members.sort_by(|left, right| right.1.total_cmp(&left.1));

        for (position, value) in members {
            let request = batch[position];
            let claimed = ledger.claim_best(&scorer, request);
            debug!(
                band = band.label(),
                student = %request.student_id,
                value,
                seat = ?claimed.map(|seat| seat.to_string()),
                "hybrid band claim"
            );

            if position == current {
                return claimed.ok_or_else(|| context.exhausted());
            }
        }
    }

    Err(context.exhausted())
}

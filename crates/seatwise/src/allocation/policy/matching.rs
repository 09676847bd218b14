use super::{priority_order, AllocationContext};
use crate::allocation::domain::{AllocationError, UnavailableReason};
use crate::allocation::seat::{SeatId, SEATS_PER_VEHICLE};

/// Scale applied to seat values so the seat-index tiebreak never outweighs a
/// single point of preference: the index penalty of a full assignment is at
/// most 40 * 39.
const TIEBREAK_SCALE: i64 = 2048;

const INFINITY: i64 = i64::MAX / 4;

/// Exact batch assignment.
///
/// When the batch is larger than the free seats, the highest-priority requests
/// are kept. The kept requests are then matched to free seats so the sum of
/// preference plus row bonus is maximal; among optimal matchings the one using
/// the lowest seat indices wins.
pub(super) fn allocate(context: &AllocationContext<'_>) -> Result<SeatId, AllocationError> {
    let batch = context.batch();
    let current = batch.len() - 1;
    let priorities = context.batch_priorities(&batch)?;

    let free: Vec<SeatId> = context.free_seats().collect();
    if free.is_empty() {
        return Err(context.unavailable(UnavailableReason::NoFreeSeat));
    }

    let mut selected = priority_order(&priorities);
    selected.truncate(free.len());
    selected.sort_unstable();
    let Some(row) = selected.iter().position(|position| *position == current) else {
        return Err(context.unavailable(UnavailableReason::NotSelected));
    };

    let scorer = context.preference();
    let weights: Vec<Vec<i64>> = selected
        .iter()
        .map(|position| {
            let request = batch[*position];
            free.iter()
                .map(|seat| {
                    let value =
                        scorer.seat_value(&request.destination, request.special_needs, *seat);
                    i64::from(value) * TIEBREAK_SCALE - seat.index() as i64
                })
                .collect()
        })
        .collect();

    let assignment = max_weight_assignment(&weights);
    Ok(free[assignment[row]])
}

/// Hungarian algorithm over a `rows x columns` weight matrix with
/// `rows <= columns`; returns the column matched to each row.
pub(crate) fn max_weight_assignment(weights: &[Vec<i64>]) -> Vec<usize> {
    let rows = weights.len();
    if rows == 0 {
        return Vec::new();
    }
    let columns = weights[0].len();
    debug_assert!(rows <= columns && columns <= SEATS_PER_VEHICLE);

    // 1-based potentials; column 0 is the virtual start of each augmenting path.
    let cost = |row: usize, column: usize| -weights[row - 1][column - 1];
    let mut row_potential = vec![0i64; rows + 1];
    let mut column_potential = vec![0i64; columns + 1];
    let mut matched_row = vec![0usize; columns + 1];
    let mut way = vec![0usize; columns + 1];

    for row in 1..=rows {
        matched_row[0] = row;
        let mut column = 0usize;
        let mut min_slack = vec![INFINITY; columns + 1];
        let mut used = vec![false; columns + 1];

        loop {
            used[column] = true;
            let active_row = matched_row[column];
            let mut delta = INFINITY;
            let mut next_column = 0usize;

            for candidate in 1..=columns {
                if used[candidate] {
                    continue;
                }
                let slack = cost(active_row, candidate)
                    - row_potential[active_row]
                    - column_potential[candidate];
                if slack < min_slack[candidate] {
                    min_slack[candidate] = slack;
                    way[candidate] = column;
                }
                if min_slack[candidate] < delta {
                    delta = min_slack[candidate];
                    next_column = candidate;
                }
            }

            for candidate in 0..=columns {
                if used[candidate] {
                    row_potential[matched_row[candidate]] += delta;
                    column_potential[candidate] -= delta;
                } else {
                    min_slack[candidate] -= delta;
                }
            }

            column = next_column;
            if matched_row[column] == 0 {
                break;
            }
        }

        loop {
            let previous = way[column];
            matched_row[column] = matched_row[previous];
            column = previous;
            if column == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; rows];
    for column in 1..=columns {
        if matched_row[column] != 0 {
            assignment[matched_row[column] - 1] = column - 1;
        }
    }
    assignment
}

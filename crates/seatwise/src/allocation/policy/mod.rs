//! Interchangeable seat allocation policies.
//!
//! Every policy reads an [`AllocationContext`] and proposes one seat that is
//! absent from the confirmed set it was given. None of them touch storage.

mod hybrid;
mod matching;
mod preference;
mod priority_queue;
mod round_robin;
mod zone_greedy;

use super::catalog::RouteZoneCatalog;
use super::domain::{AllocationError, BookingRequest, StudentId, UnavailableReason};
use super::scoring::{PriorityScorer, SeatPreferenceScorer};
use super::seat::SeatId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// The configured allocation policy. Fixed once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// First free seat of the preferred zone, then of the whole vehicle.
    ZoneGreedy,
    /// Highest preference score among free seats. A greedy approximation,
    /// not an optimum; serves the `knapsack` and `dp_knapsack` modes.
    PreferenceMaximizing,
    /// Pending batch served in descending priority order.
    PriorityQueueFair,
    /// Free seats rotated by the request's arrival position.
    RoundRobinFair,
    /// Pending batch served band by band (Critical, High, Medium, Normal).
    HybridPriorityGroup,
    /// Exact maximum-weight matching of the batch onto the free seats.
    BatchOptimal,
}

impl AllocationPolicy {
    pub const KEYS: [&'static str; 6] = [
        "zone_greedy",
        "preference_maximizing",
        "priority_queue_fair",
        "round_robin_fair",
        "hybrid_priority_group",
        "batch_optimal",
    ];

    pub const fn ordered() -> [Self; 6] {
        [
            Self::ZoneGreedy,
            Self::PreferenceMaximizing,
            Self::PriorityQueueFair,
            Self::RoundRobinFair,
            Self::HybridPriorityGroup,
            Self::BatchOptimal,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::ZoneGreedy => "zone_greedy",
            Self::PreferenceMaximizing => "preference_maximizing",
            Self::PriorityQueueFair => "priority_queue_fair",
            Self::RoundRobinFair => "round_robin_fair",
            Self::HybridPriorityGroup => "hybrid_priority_group",
            Self::BatchOptimal => "batch_optimal",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ZoneGreedy => "Zone greedy",
            Self::PreferenceMaximizing => "Preference maximizing (greedy)",
            Self::PriorityQueueFair => "Priority queue",
            Self::RoundRobinFair => "Round robin",
            Self::HybridPriorityGroup => "Hybrid priority groups",
            Self::BatchOptimal => "Batch optimal matching",
        }
    }

    /// Whether the policy considers the other pending requests of the slot.
    pub const fn needs_pending(self) -> bool {
        matches!(
            self,
            Self::PriorityQueueFair | Self::HybridPriorityGroup | Self::BatchOptimal
        )
    }

    /// Whether the policy needs the arrival order of every booking in the slot.
    pub const fn needs_arrivals(self) -> bool {
        matches!(self, Self::RoundRobinFair)
    }

    pub fn allocate(self, context: &AllocationContext<'_>) -> Result<SeatId, AllocationError> {
        match self {
            Self::ZoneGreedy => zone_greedy::allocate(context),
            Self::PreferenceMaximizing => preference::allocate(context),
            Self::PriorityQueueFair => priority_queue::allocate(context),
            Self::RoundRobinFair => round_robin::allocate(context),
            Self::HybridPriorityGroup => hybrid::allocate(context),
            Self::BatchOptimal => matching::allocate(context),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AllocationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "zone_greedy" | "greedy" => Ok(Self::ZoneGreedy),
            "preference_maximizing" | "preference" | "knapsack" | "dp_knapsack" => {
                Ok(Self::PreferenceMaximizing)
            }
            "priority_queue_fair" | "priority_queue" => Ok(Self::PriorityQueueFair),
            "round_robin_fair" | "round_robin" => Ok(Self::RoundRobinFair),
            "hybrid_priority_group" | "hybrid" => Ok(Self::HybridPriorityGroup),
            "batch_optimal" | "optimal" => Ok(Self::BatchOptimal),
            _ => Err(format!("unknown allocation strategy '{value}'")),
        }
    }
}

/// Read-only inputs of one allocation decision.
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext<'a> {
    pub request: &'a BookingRequest,
    /// Seats held by confirmed bookings on the vehicle.
    pub occupied: &'a BTreeSet<SeatId>,
    pub catalog: &'a RouteZoneCatalog,
    /// Other pending requests for the slot in arrival order, current student excluded.
    pub pending: &'a [BookingRequest],
    /// Student of every booking for the slot, ordered by creation time.
    pub arrivals: &'a [StudentId],
}

impl<'a> AllocationContext<'a> {
    pub fn free_seats(&self) -> impl Iterator<Item = SeatId> + 'a {
        let occupied = self.occupied;
        SeatId::all().filter(move |seat| !occupied.contains(seat))
    }

    pub fn preference(&self) -> SeatPreferenceScorer<'a> {
        SeatPreferenceScorer::new(self.catalog)
    }

    pub fn priority(&self) -> PriorityScorer<'a> {
        PriorityScorer::new(self.catalog)
    }

    pub fn unavailable(&self, reason: UnavailableReason) -> AllocationError {
        AllocationError::Unavailable {
            slot: self.request.time_slot.clone(),
            reason,
        }
    }

    /// Failure for a batch member left without a seat.
    pub(crate) fn exhausted(&self) -> AllocationError {
        if self.free_seats().next().is_none() {
            self.unavailable(UnavailableReason::NoFreeSeat)
        } else {
            self.unavailable(UnavailableReason::NotSelected)
        }
    }

    /// Pending requests followed by the current one. Pending rows with a
    /// non-numeric student id cannot be ranked and sit the batch out.
    pub(crate) fn batch(&self) -> Vec<&'a BookingRequest> {
        let mut batch: Vec<&'a BookingRequest> = self
            .pending
            .iter()
            .filter(|request| match request.student_id.numeric() {
                Ok(_) => true,
                Err(error) => {
                    warn!(
                        slot = %request.time_slot,
                        %error,
                        "skipping unrankable pending booking"
                    );
                    false
                }
            })
            .collect();
        batch.push(self.request);
        batch
    }

    /// Priority scores of the batch, current request last.
    pub(crate) fn batch_priorities(
        &self,
        batch: &[&BookingRequest],
    ) -> Result<Vec<f64>, AllocationError> {
        let scorer = self.priority();
        batch
            .iter()
            .map(|request| {
                scorer.score(
                    &request.student_id,
                    request.special_needs,
                    &request.destination,
                )
            })
            .collect()
    }
}

/// Seats claimed while replaying a batch on top of the confirmed set.
#[derive(Debug, Clone)]
pub(crate) struct SeatLedger {
    taken: BTreeSet<SeatId>,
}

impl SeatLedger {
    pub(crate) fn new(occupied: &BTreeSet<SeatId>) -> Self {
        Self {
            taken: occupied.clone(),
        }
    }

    pub(crate) fn free(&self) -> impl Iterator<Item = SeatId> + '_ {
        SeatId::all().filter(move |seat| !self.taken.contains(seat))
    }

    /// Claim the free seat with the highest preference plus row bonus for `request`.
    pub(crate) fn claim_best(
        &mut self,
        scorer: &SeatPreferenceScorer<'_>,
        request: &BookingRequest,
    ) -> Option<SeatId> {
        let seat = best_seat(self.free(), |seat| {
            scorer.seat_value(&request.destination, request.special_needs, seat)
        })?;
        self.taken.insert(seat);
        Some(seat)
    }
}

/// Highest-valued seat; the first in canonical order wins ties.
pub(crate) fn best_seat(
    seats: impl Iterator<Item = SeatId>,
    value: impl Fn(SeatId) -> u32,
) -> Option<SeatId> {
    let mut best: Option<(SeatId, u32)> = None;
    for seat in seats {
        let candidate = value(seat);
        if best.map_or(true, |(_, current)| candidate > current) {
            best = Some((seat, candidate));
        }
    }
    best.map(|(seat, _)| seat)
}

/// Batch positions sorted by descending priority; equal scores keep arrival order.
pub(crate) fn priority_order(priorities: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..priorities.len()).collect();
    order.sort_by(|left, right| priorities[*right].total_cmp(&priorities[*left]));
    order
}

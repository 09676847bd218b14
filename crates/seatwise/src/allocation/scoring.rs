//! Preference and priority scoring shared by the allocation policies.

use super::catalog::RouteZoneCatalog;
use super::domain::{AllocationError, SpecialNeeds, StudentId, STUDENT_ID_LIMIT};
use super::seat::SeatId;

pub const MATCHED_ZONE_SCORE: u32 = 10;
pub const OTHER_ZONE_SCORE: u32 = 5;

/// How well a seat suits a destination: 10 inside the preferred zone, else 5.
#[derive(Debug, Clone, Copy)]
pub struct SeatPreferenceScorer<'a> {
    catalog: &'a RouteZoneCatalog,
}

impl<'a> SeatPreferenceScorer<'a> {
    pub fn new(catalog: &'a RouteZoneCatalog) -> Self {
        Self { catalog }
    }

    pub fn score(&self, destination: &str, seat: SeatId) -> u32 {
        if self.catalog.lookup(destination).zone == seat.zone() {
            MATCHED_ZONE_SCORE
        } else {
            OTHER_ZONE_SCORE
        }
    }

    /// Preference plus the special-needs row bonus, the value batch policies maximize per seat.
    pub fn seat_value(&self, destination: &str, special_needs: SpecialNeeds, seat: SeatId) -> u32 {
        self.score(destination, seat) + row_bonus(special_needs, seat)
    }
}

/// Urgency of a request; higher is served first.
#[derive(Debug, Clone, Copy)]
pub struct PriorityScorer<'a> {
    catalog: &'a RouteZoneCatalog,
}

impl<'a> PriorityScorer<'a> {
    pub fn new(catalog: &'a RouteZoneCatalog) -> Self {
        Self { catalog }
    }

    /// `needs base + distance * 2 + (10000 - id) / 10000`.
    pub fn score(
        &self,
        student_id: &StudentId,
        special_needs: SpecialNeeds,
        destination: &str,
    ) -> Result<f64, AllocationError> {
        let numeric = student_id.numeric()?;
        let distance = self.catalog.lookup(destination).distance;
        let tiebreak = f64::from(STUDENT_ID_LIMIT - numeric) / f64::from(STUDENT_ID_LIMIT);

        Ok(needs_base(special_needs) + f64::from(distance) * 2.0 + tiebreak)
    }
}

pub fn needs_base(special_needs: SpecialNeeds) -> f64 {
    match special_needs {
        SpecialNeeds::Injury => 100.0,
        SpecialNeeds::Medical => 90.0,
        SpecialNeeds::Disability => 80.0,
        SpecialNeeds::Pregnant => 70.0,
        SpecialNeeds::Elderly => 60.0,
        SpecialNeeds::None => 0.0,
    }
}

/// Extra seat value for riders who need to sit near the door.
pub fn row_bonus(special_needs: SpecialNeeds, seat: SeatId) -> u32 {
    match special_needs {
        SpecialNeeds::Injury if seat.in_rows(&['A', 'B']) => 20,
        SpecialNeeds::Disability if seat.in_rows(&['A', 'B']) => 15,
        SpecialNeeds::Elderly if seat.in_rows(&['A', 'B', 'C']) => 10,
        _ => 0,
    }
}

/// Urgency bands used by the hybrid policy, served strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityBand {
    Critical,
    High,
    Medium,
    Normal,
}

impl PriorityBand {
    pub const fn ordered() -> [Self; 4] {
        [Self::Critical, Self::High, Self::Medium, Self::Normal]
    }

    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Critical
        } else if score >= 70.0 {
            Self::High
        } else if score >= 60.0 {
            Self::Medium
        } else {
            Self::Normal
        }
    }

    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Critical => 3.0,
            Self::High => 2.0,
            Self::Medium => 1.5,
            Self::Normal => 1.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Normal => "Normal",
        }
    }
}

/// Ordering bonus applied inside a hybrid band.
pub fn band_bonus(special_needs: SpecialNeeds) -> f64 {
    match special_needs {
        SpecialNeeds::Injury => 50.0,
        SpecialNeeds::Medical => 45.0,
        SpecialNeeds::Disability => 40.0,
        _ => 0.0,
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row letters from the door to the rear of the bus.
pub const SEAT_ROWS: [char; 10] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];

/// Seats per row.
pub const SEAT_COLUMNS: u8 = 4;

/// Seats per vehicle.
pub const SEATS_PER_VEHICLE: usize = SEAT_ROWS.len() * SEAT_COLUMNS as usize;

/// Seating band a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Front,
    Middle,
    Back,
}

impl Zone {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Middle => "middle",
            Self::Back => "back",
        }
    }

    /// Zero-based row indices covered by the zone.
    const fn row_range(self) -> (u8, u8) {
        match self {
            Self::Front => (0, 3),
            Self::Middle => (3, 7),
            Self::Back => (7, 10),
        }
    }

    /// Seats of the zone in canonical order.
    pub fn seats(self) -> impl Iterator<Item = SeatId> {
        let (start, end) = self.row_range();
        (start..end).flat_map(|row| (1..=SEAT_COLUMNS).map(move |column| SeatId { row, column }))
    }

    fn for_row(row: u8) -> Self {
        match row {
            0..=2 => Self::Front,
            3..=6 => Self::Middle,
            _ => Self::Back,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Zone {
    type Err = SeatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(Self::Front),
            "middle" => Ok(Self::Middle),
            "back" => Ok(Self::Back),
            _ => Err(SeatParseError::Zone(value.to_string())),
        }
    }
}

/// A physical seat, `<row letter A-J><column 1-4>`.
///
/// The derived ordering is the canonical row-then-column order every policy
/// scans in, so `A4 < B1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatId {
    row: u8,
    column: u8,
}

impl SeatId {
    /// Front-left seat, first in canonical order.
    pub const FIRST: SeatId = SeatId { row: 0, column: 1 };

    /// Every seat of a vehicle in canonical order.
    pub fn all() -> impl Iterator<Item = SeatId> {
        (0..SEAT_ROWS.len() as u8)
            .flat_map(|row| (1..=SEAT_COLUMNS).map(move |column| SeatId { row, column }))
    }

    pub fn row_letter(self) -> char {
        SEAT_ROWS[self.row as usize]
    }

    pub const fn column(self) -> u8 {
        self.column
    }

    pub fn zone(self) -> Zone {
        Zone::for_row(self.row)
    }

    /// Position in canonical order, `0..40`.
    pub const fn index(self) -> usize {
        self.row as usize * SEAT_COLUMNS as usize + (self.column as usize - 1)
    }

    pub fn in_rows(self, rows: &[char]) -> bool {
        rows.contains(&self.row_letter())
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.column)
    }
}

impl FromStr for SeatId {
    type Err = SeatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let mut chars = trimmed.chars();
        let (Some(letter), Some(digit), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(SeatParseError::Seat(value.to_string()));
        };

        let row = SEAT_ROWS
            .iter()
            .position(|candidate| *candidate == letter.to_ascii_uppercase())
            .ok_or_else(|| SeatParseError::Seat(value.to_string()))?;
        let column = digit
            .to_digit(10)
            .filter(|column| (1..=SEAT_COLUMNS as u32).contains(column))
            .ok_or_else(|| SeatParseError::Seat(value.to_string()))?;

        Ok(Self {
            row: row as u8,
            column: column as u8,
        })
    }
}

impl TryFrom<String> for SeatId {
    type Error = SeatParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatId> for String {
    fn from(value: SeatId) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatParseError {
    #[error("'{0}' is not a seat between A1 and J4")]
    Seat(String),
    #[error("'{0}' is not a seating zone (front, middle, back)")]
    Zone(String),
}

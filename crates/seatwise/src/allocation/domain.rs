use super::policy::AllocationPolicy;
use super::seat::SeatId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Student identifiers above this bound cannot take part in priority tiebreaks.
pub const STUDENT_ID_LIMIT: u32 = 10_000;

/// Identifier wrapper for a scheduled departure such as `11AM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSlot(pub String);

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vehicle number as printed on the bus (`BUS1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw student identifier as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    /// Numeric form used for deterministic tiebreaks, `0..10000`.
    pub fn numeric(&self) -> Result<u32, AllocationError> {
        self.0
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|value| *value < STUDENT_ID_LIMIT)
            .ok_or_else(|| AllocationError::MalformedStudentId {
                raw: self.0.clone(),
            })
    }

    pub fn matches(&self, other: &StudentId) -> bool {
        self.0.trim() == other.0.trim()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Passenger attribute raising priority and possibly granting a row bonus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpecialNeeds {
    #[default]
    None,
    Injury,
    Disability,
    Elderly,
    Pregnant,
    Medical,
}

impl SpecialNeeds {
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Injury => "Injury",
            Self::Disability => "Disability",
            Self::Elderly => "Elderly",
            Self::Pregnant => "Pregnant",
            Self::Medical => "Medical",
        }
    }
}

impl fmt::Display for SpecialNeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SpecialNeeds {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "injury" => Ok(Self::Injury),
            "disability" => Ok(Self::Disability),
            "elderly" => Ok(Self::Elderly),
            "pregnant" => Ok(Self::Pregnant),
            "medical" => Ok(Self::Medical),
            _ => Err(format!("unknown special needs category '{value}'")),
        }
    }
}

impl TryFrom<String> for SpecialNeeds {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpecialNeeds> for String {
    fn from(value: SpecialNeeds) -> Self {
        value.label().to_string()
    }
}

/// Canonical request value consumed by every allocation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub student_id: StudentId,
    pub destination: String,
    pub time_slot: TimeSlot,
    pub special_needs: SpecialNeeds,
    /// Informational only; never consulted by the policies.
    pub priority_label: Option<String>,
}

impl BookingRequest {
    pub fn new(
        student_id: impl Into<String>,
        destination: impl Into<String>,
        time_slot: impl Into<String>,
    ) -> Self {
        Self {
            student_id: StudentId(student_id.into()),
            destination: destination.into(),
            time_slot: TimeSlot(time_slot.into()),
            special_needs: SpecialNeeds::None,
            priority_label: None,
        }
    }

    pub fn with_special_needs(mut self, special_needs: SpecialNeeds) -> Self {
        self.special_needs = special_needs;
        self
    }

    pub fn with_priority_label(mut self, label: impl Into<String>) -> Self {
        self.priority_label = Some(label.into());
        self
    }
}

/// The vehicle serving a time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub bus_id: String,
    pub number: VehicleId,
    pub time_slot: TimeSlot,
    pub capacity: u32,
    pub is_reused: bool,
    pub reused_from: Option<TimeSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
}

/// Persisted booking outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "BookingID")]
    pub booking_id: u64,
    #[serde(rename = "StudentID")]
    pub student_id: StudentId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "BusNumber")]
    pub vehicle: VehicleId,
    #[serde(rename = "SeatNumber")]
    pub seat: SeatId,
    #[serde(rename = "TimeSlot")]
    pub time_slot: TimeSlot,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "BookingDate", with = "booking_date")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "Status")]
    pub status: BookingStatus,
    #[serde(rename = "Priority", default = "default_priority_label")]
    pub priority: String,
    #[serde(rename = "SpecialNeeds", default)]
    pub special_needs: SpecialNeeds,
}

impl Booking {
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    /// The booking seen as a request, used when replaying pending bookings.
    pub fn as_request(&self) -> BookingRequest {
        BookingRequest {
            student_id: self.student_id.clone(),
            destination: self.destination.clone(),
            time_slot: self.time_slot.clone(),
            special_needs: self.special_needs,
            priority_label: Some(self.priority.clone()),
        }
    }
}

/// A booking about to be committed; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub student_id: StudentId,
    pub name: String,
    pub email: String,
    pub vehicle: VehicleId,
    pub seat: SeatId,
    pub time_slot: TimeSlot,
    pub destination: String,
    pub created_at: NaiveDateTime,
    pub status: BookingStatus,
    pub priority: String,
    pub special_needs: SpecialNeeds,
}

impl NewBooking {
    pub fn into_booking(self, booking_id: u64) -> Booking {
        Booking {
            booking_id,
            student_id: self.student_id,
            name: self.name,
            email: self.email,
            vehicle: self.vehicle,
            seat: self.seat,
            time_slot: self.time_slot,
            destination: self.destination,
            created_at: self.created_at,
            status: self.status,
            priority: self.priority,
            special_needs: self.special_needs,
        }
    }
}

pub(crate) fn default_priority_label() -> String {
    "Normal".to_string()
}

/// Proposed seat, handed back to the caller for commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatAssignment {
    pub vehicle: VehicleId,
    pub seat: SeatId,
    pub policy: AllocationPolicy,
    /// The destination was unknown and the default route was assumed.
    pub route_defaulted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// No vehicle is scheduled for the slot.
    NoVehicle,
    /// Every seat the policy scanned is taken.
    NoFreeSeat,
    /// Higher-priority requests of the same batch took the remaining seats.
    NotSelected,
}

impl UnavailableReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoVehicle => "no vehicle serves this time slot",
            Self::NoFreeSeat => "no seats available for this time slot",
            Self::NotSelected => "remaining seats went to higher-priority requests",
        }
    }
}

/// Terminal failures of an allocation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("{slot}: {}", .reason.label())]
    Unavailable {
        slot: TimeSlot,
        reason: UnavailableReason,
    },
    #[error("student {student} already has a confirmed booking for the {slot} slot")]
    DuplicateBooking { student: StudentId, slot: TimeSlot },
    #[error("student id '{raw}' must be a whole number below 10000")]
    MalformedStudentId { raw: String },
}

mod booking_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub(super) fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        NaiveDateTime::parse_from_str(trimmed, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|err| serde::de::Error::custom(format!("invalid booking date '{raw}': {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_student_ids_stay_below_the_limit() {
        assert_eq!(StudentId("42".to_string()).numeric(), Ok(42));
        assert_eq!(StudentId(" 9999 ".to_string()).numeric(), Ok(9999));
        for raw in ["10000", "abc", "-3", "", "12.5"] {
            assert_eq!(
                StudentId(raw.to_string()).numeric(),
                Err(AllocationError::MalformedStudentId {
                    raw: raw.to_string()
                })
            );
        }
    }

    #[test]
    fn special_needs_parse_leniently_and_default_to_none() {
        assert_eq!("injury".parse::<SpecialNeeds>(), Ok(SpecialNeeds::Injury));
        assert_eq!("".parse::<SpecialNeeds>(), Ok(SpecialNeeds::None));
        assert!("sleepy".parse::<SpecialNeeds>().is_err());
        assert_eq!(SpecialNeeds::default(), SpecialNeeds::None);
        let parsed: SpecialNeeds = serde_json::from_str("\"Medical\"").unwrap();
        assert_eq!(parsed, SpecialNeeds::Medical);
    }

    #[test]
    fn booking_serializes_with_storage_headers() {
        let booking = NewBooking {
            student_id: StudentId("101".to_string()),
            name: "Asha".to_string(),
            email: "asha@example.edu".to_string(),
            vehicle: VehicleId("BUS1".to_string()),
            seat: "A1".parse().unwrap(),
            time_slot: TimeSlot("11AM".to_string()),
            destination: "ISBT".to_string(),
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 1, 6)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
            status: BookingStatus::Confirmed,
            priority: "Normal".to_string(),
            special_needs: SpecialNeeds::None,
        }
        .into_booking(7);

        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["BookingID"], 7);
        assert_eq!(value["SeatNumber"], "A1");
        assert_eq!(value["BookingDate"], "2025-01-06 08:30:00");
        assert_eq!(value["Status"], "Confirmed");
        assert_eq!(value["SpecialNeeds"], "None");

        let back: Booking = serde_json::from_value(value).unwrap();
        assert_eq!(back, booking);
    }
}

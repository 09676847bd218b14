//! CSV-backed booking storage.
//!
//! Three files live in the data directory: `routes.csv`, `booking.csv` and
//! `buses.csv`. Missing files are seeded with the default campus roster on
//! open. All file access goes through one mutex so booking ids and the seat
//! conflict check stay consistent within the process.

use std::fs::{self, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use super::repository::{
    ensure_seat_free, next_booking_id, BookingRepository, RepositoryError, VehicleOccupancy,
};
use crate::allocation::{
    Booking, NewBooking, Route, TimeSlot, Vehicle, VehicleId, Zone, SEATS_PER_VEHICLE,
};

pub const ROUTES_FILE: &str = "routes.csv";
pub const BOOKINGS_FILE: &str = "booking.csv";
pub const BUSES_FILE: &str = "buses.csv";

const BOOKING_HEADERS: [&str; 12] = [
    "BookingID",
    "StudentID",
    "Name",
    "Email",
    "BusNumber",
    "SeatNumber",
    "TimeSlot",
    "Destination",
    "BookingDate",
    "Status",
    "Priority",
    "SpecialNeeds",
];

/// File-backed repository over a data directory.
#[derive(Debug)]
pub struct CsvBookingStore {
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl CsvBookingStore {
    /// Open `data_dir`, creating it and seeding any missing file.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        let store = Self {
            data_dir,
            lock: Mutex::new(()),
        };
        store.seed()?;
        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, RepositoryError> {
        self.lock
            .lock()
            .map_err(|_| RepositoryError::Unavailable("csv store lock poisoned".to_string()))
    }

    fn seed(&self) -> Result<(), RepositoryError> {
        let routes = self.path(ROUTES_FILE);
        if !routes.exists() {
            write_rows(&routes, &default_routes())?;
            info!(path = %routes.display(), "seeded route catalog");
        }

        let bookings = self.path(BOOKINGS_FILE);
        if !bookings.exists() {
            header_writer(&bookings)?.flush()?;
            info!(path = %bookings.display(), "created empty booking ledger");
        } else {
            self.upgrade_booking_headers(&bookings)?;
        }

        let buses = self.path(BUSES_FILE);
        if !buses.exists() {
            write_rows(&buses, &default_buses())?;
            info!(path = %buses.display(), "seeded bus roster");
        }
        Ok(())
    }

    /// Older ledgers lack the `Priority` and `SpecialNeeds` columns; rewrite
    /// them with the full header so appended rows line up.
    fn upgrade_booking_headers(&self, path: &Path) -> Result<(), RepositoryError> {
        let headers = reader(fs::File::open(path)?).headers()?.clone();
        if headers.len() >= BOOKING_HEADERS.len() {
            return Ok(());
        }

        let bookings = read_rows::<Booking>(path)?;
        let mut writer = header_writer(path)?;
        for booking in &bookings {
            writer.serialize(booking)?;
        }
        writer.flush()?;
        info!(
            path = %path.display(),
            rows = bookings.len(),
            "upgraded booking ledger columns"
        );
        Ok(())
    }

    fn read_bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        read_rows(&self.path(BOOKINGS_FILE))
    }
}

impl BookingRepository for CsvBookingStore {
    fn routes(&self) -> Result<Vec<Route>, RepositoryError> {
        let _guard = self.guard()?;
        read_rows(&self.path(ROUTES_FILE))
    }

    fn vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        let _guard = self.guard()?;
        let rows: Vec<BusRow> = read_rows(&self.path(BUSES_FILE))?;
        Ok(rows.into_iter().map(BusRow::into_vehicle).collect())
    }

    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        let _guard = self.guard()?;
        self.read_bookings()
    }

    fn commit(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        let _guard = self.guard()?;
        let existing = self.read_bookings()?;
        ensure_seat_free(&existing, &booking)?;

        let stored = booking.into_booking(next_booking_id(&existing));
        let file = OpenOptions::new()
            .append(true)
            .open(self.path(BOOKINGS_FILE))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(&stored)?;
        writer.flush()?;

        debug!(
            booking_id = stored.booking_id,
            vehicle = %stored.vehicle,
            seat = %stored.seat,
            "booking appended"
        );
        Ok(stored)
    }

    fn refresh_occupancy(&self, vehicle: &VehicleId) -> Result<VehicleOccupancy, RepositoryError> {
        let _guard = self.guard()?;
        let bookings = self.read_bookings()?;
        let path = self.path(BUSES_FILE);
        let mut rows: Vec<BusRow> = read_rows(&path)?;

        let row = rows
            .iter_mut()
            .find(|row| row.bus_number == vehicle.0)
            .ok_or_else(|| RepositoryError::NotFound(vehicle.clone()))?;
        let occupancy = VehicleOccupancy::from_bookings(&row.clone().into_vehicle(), &bookings);
        row.booked_seats = occupancy.booked;
        row.available_seats = occupancy.available;

        write_rows(&path, &rows)?;
        Ok(occupancy)
    }
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

/// Short rows are padded with per-column defaults before deserializing.
fn read_rows<T>(path: &Path) -> Result<Vec<T>, RepositoryError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = reader(fs::File::open(path)?);
    let headers = widen_booking_headers(csv_reader.headers()?);
    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let mut record = record?;
        for header in headers.iter().skip(record.len()) {
            record.push_field(column_default(header));
        }
        rows.push(record.deserialize(Some(&headers))?);
    }
    Ok(rows)
}

/// A ledger header that is a strict prefix of the booking columns names the
/// full set, so trailing `Priority`/`SpecialNeeds` fields appended under a
/// ten-column header keep their values.
fn widen_booking_headers(headers: &csv::StringRecord) -> csv::StringRecord {
    let is_prefix = headers.len() < BOOKING_HEADERS.len()
        && headers
            .iter()
            .zip(BOOKING_HEADERS.iter())
            .all(|(found, expected)| found == *expected);
    if is_prefix {
        csv::StringRecord::from(BOOKING_HEADERS.to_vec())
    } else {
        headers.clone()
    }
}

fn column_default(header: &str) -> &'static str {
    match header {
        "Priority" => "Normal",
        "SpecialNeeds" => "None",
        "IsReused" => "False",
        _ => "",
    }
}

fn header_writer(path: &Path) -> Result<csv::Writer<fs::File>, RepositoryError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(BOOKING_HEADERS)?;
    Ok(writer)
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), RepositoryError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Routes seeded into a fresh data directory.
pub fn default_routes() -> Vec<Route> {
    [
        ("Rajpur Road", 3, Zone::Front),
        ("ISBT", 7, Zone::Middle),
        ("Clement Town", 12, Zone::Back),
    ]
    .into_iter()
    .map(|(destination, distance, zone)| Route {
        destination: destination.to_string(),
        distance,
        zone,
    })
    .collect()
}

/// The four buses seeded into a fresh data directory.
pub fn default_vehicles() -> Vec<Vehicle> {
    default_buses().into_iter().map(BusRow::into_vehicle).collect()
}

fn default_buses() -> Vec<BusRow> {
    let seats = SEATS_PER_VEHICLE as u32;
    [("B1", "BUS1", "11AM"), ("B2", "BUS2", "1PM"), ("B3", "BUS3", "4PM"), ("B4", "BUS4", "6PM")]
        .into_iter()
        .map(|(bus_id, bus_number, time_slot)| BusRow {
            bus_id: bus_id.to_string(),
            bus_number: bus_number.to_string(),
            time_slot: time_slot.to_string(),
            total_seats: seats,
            booked_seats: 0,
            available_seats: seats,
            is_reused: false,
            reused_from: None,
        })
        .collect()
}

/// `buses.csv` row. Counters are a cache of the booking ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BusRow {
    #[serde(rename = "BusID")]
    bus_id: String,
    #[serde(rename = "BusNumber")]
    bus_number: String,
    #[serde(rename = "TimeSlot")]
    time_slot: String,
    #[serde(rename = "TotalSeats")]
    total_seats: u32,
    #[serde(rename = "BookedSeats", default)]
    booked_seats: u32,
    #[serde(rename = "AvailableSeats", default)]
    available_seats: u32,
    #[serde(
        rename = "IsReused",
        default,
        serialize_with = "title_case_bool",
        deserialize_with = "lenient_bool"
    )]
    is_reused: bool,
    #[serde(
        rename = "ReusedFrom",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    reused_from: Option<String>,
}

impl BusRow {
    fn into_vehicle(self) -> Vehicle {
        Vehicle {
            bus_id: self.bus_id,
            number: VehicleId(self.bus_number),
            time_slot: TimeSlot(self.time_slot),
            capacity: self.total_seats,
            is_reused: self.is_reused,
            reused_from: self.reused_from.map(TimeSlot),
        }
    }
}

fn title_case_bool<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(if *value { "True" } else { "False" })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|raw| !raw.trim().is_empty()))
}

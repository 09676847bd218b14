use crate::infra::InMemoryBookingRepository;
use clap::Args;
use seatwise::allocation::{AllocationEngine, AllocationPolicy, SeatId, TimeSlot, SEAT_COLUMNS};
use seatwise::booking::{
    BookingRepository, BookingService, BookingSubmission, CsvBookingStore, SlotOccupancy,
};
use seatwise::config::AppConfig;
use seatwise::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Allocation strategy to demonstrate. Runs every strategy when omitted.
    #[arg(long)]
    pub(crate) strategy: Option<AllocationPolicy>,
    /// Time slot the scripted students book into.
    #[arg(long, default_value = "11AM")]
    pub(crate) slot: String,
}

#[derive(Args, Debug)]
pub(crate) struct SeatMapArgs {
    /// Time slot whose bus should be printed, e.g. 11AM
    #[arg(long)]
    pub(crate) slot: String,
    /// Directory holding the CSV files. Defaults to APP_DATA_DIR.
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

/// (student id, name, destination, special needs, priority)
const SCRIPTED_STUDENTS: [(&str, &str, &str, &str, &str); 10] = [
    ("1042", "Aarav", "Clement Town", "None", "Normal"),
    ("2210", "Diya", "Rajpur Road", "Injury", "High"),
    ("3307", "Kabir", "ISBT", "None", "Normal"),
    ("4415", "Meera", "Clement Town", "Elderly", "High"),
    ("5120", "Rohan", "Mussoorie", "None", "Normal"),
    ("6031", "Sana", "ISBT", "Pregnant", "Medium"),
    ("7004", "Ishaan", "Rajpur Road", "None", "Normal"),
    ("8123", "Tara", "Clement Town", "Disability", "High"),
    ("9050", "Vihaan", "ISBT", "Medical", "Medium"),
    ("9999", "Zoya", "Rajpur Road", "None", "Normal"),
];

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { strategy, slot } = args;
    let policies: Vec<AllocationPolicy> = match strategy {
        Some(policy) => vec![policy],
        None => AllocationPolicy::ordered().to_vec(),
    };

    println!("Seat allocation demo for the {slot} bus");
    for policy in policies {
        let service = BookingService::new(
            Arc::new(InMemoryBookingRepository::seeded()),
            AllocationEngine::new(policy),
        );
        println!("\n{} ({})", policy.label(), policy.key());

        for submission in scripted_submissions(&slot) {
            let student = submission.student_id.clone().unwrap_or_default();
            let destination = submission.destination.clone().unwrap_or_default();
            let needs = submission.special_needs.clone().unwrap_or_default();
            match service.book(submission) {
                Ok(booking) => println!(
                    "  - {:<5} {:<13} {:<10} -> {} seat {} ({})",
                    student,
                    destination,
                    needs,
                    booking.vehicle.0,
                    booking.seat,
                    booking.seat.zone()
                ),
                Err(err) => println!(
                    "  - {:<5} {:<13} {:<10} -> rejected: {}",
                    student, destination, needs, err
                ),
            }
        }

        let occupancy = service.slot_occupancy(&TimeSlot(slot.clone()))?;
        print!("{}", render_seat_map(&occupancy));
    }

    Ok(())
}

pub(crate) fn run_seat_map(args: SeatMapArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let data_dir = args.data_dir.unwrap_or(config.storage.data_dir);
    let service = BookingService::new(
        Arc::new(CsvBookingStore::open(&data_dir)?),
        AllocationEngine::new(config.allocation.policy),
    );

    let occupancy = service.slot_occupancy(&TimeSlot(args.slot))?;
    let bookings = service.repository().bookings()?;
    println!(
        "{} ({}) from {}",
        occupancy.vehicle.number.0,
        occupancy.vehicle.time_slot.0,
        data_dir.display()
    );
    print!("{}", render_seat_map(&occupancy));

    for booking in bookings
        .iter()
        .filter(|booking| booking.is_confirmed() && booking.vehicle == occupancy.vehicle.number)
    {
        println!(
            "  {} {} ({}) -> {}",
            booking.seat, booking.name, booking.student_id.0, booking.destination
        );
    }
    Ok(())
}

fn scripted_submissions(slot: &str) -> Vec<BookingSubmission> {
    SCRIPTED_STUDENTS
        .iter()
        .map(|(student, name, destination, needs, priority)| BookingSubmission {
            name: Some(name.to_string()),
            student_id: Some(student.to_string()),
            email: Some(format!("{}@campus.test", name.to_ascii_lowercase())),
            time_slot: Some(slot.to_string()),
            destination: Some(destination.to_string()),
            special_needs: Some(needs.to_string()),
            priority: Some(priority.to_string()),
        })
        .collect()
}

/// Ten rows of four seats; taken seats print as `##`.
pub(crate) fn render_seat_map(occupancy: &SlotOccupancy) -> String {
    let seats: Vec<SeatId> = SeatId::all().collect();
    let mut out = String::new();
    for row in seats.chunks(SEAT_COLUMNS as usize) {
        let cells: Vec<String> = row
            .iter()
            .map(|seat| {
                if occupancy.occupied.contains(seat) {
                    "[##]".to_string()
                } else {
                    format!("[{seat}]")
                }
            })
            .collect();
        let zone = row.first().map(|seat| seat.zone().label()).unwrap_or_default();
        out.push_str(&format!(
            "  {} {}  {} {}  {}\n",
            cells[0], cells[1], cells[2], cells[3], zone
        ));
    }
    out.push_str(&format!(
        "  {} of {} seats booked\n",
        occupancy.occupied.len(),
        occupancy.vehicle.capacity
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_service(policy: AllocationPolicy) -> BookingService<InMemoryBookingRepository> {
        BookingService::new(
            Arc::new(InMemoryBookingRepository::seeded()),
            AllocationEngine::new(policy),
        )
    }

    #[test]
    fn scripted_batch_books_every_student_under_each_policy() {
        for policy in AllocationPolicy::ordered() {
            let service = demo_service(policy);
            for submission in scripted_submissions("11AM") {
                service
                    .book(submission)
                    .unwrap_or_else(|err| panic!("{policy}: {err}"));
            }
            let occupancy = service
                .slot_occupancy(&TimeSlot("11AM".to_string()))
                .unwrap();
            assert_eq!(occupancy.occupied.len(), SCRIPTED_STUDENTS.len(), "{policy}");
        }
    }

    #[test]
    fn seat_map_marks_taken_seats() {
        let service = demo_service(AllocationPolicy::ZoneGreedy);
        let mut submissions = scripted_submissions("1PM");
        service.book(submissions.remove(1)).unwrap();

        let occupancy = service
            .slot_occupancy(&TimeSlot("1PM".to_string()))
            .unwrap();
        let map = render_seat_map(&occupancy);
        let lines: Vec<&str> = map.lines().collect();

        assert_eq!(lines.len(), 11);
        assert!(lines[0].starts_with("  [##] [A2]  [A3] [A4]"));
        assert!(lines[0].ends_with("front"));
        assert!(lines[9].contains("[J4]"));
        assert!(lines[9].ends_with("back"));
        assert_eq!(lines[10], "  1 of 40 seats booked");
    }
}

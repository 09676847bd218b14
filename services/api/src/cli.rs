use crate::demo::{run_demo, run_seat_map, DemoArgs, SeatMapArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use seatwise::allocation::AllocationPolicy;
use seatwise::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "seatwise",
    about = "Run the college bus seat booking service or inspect allocations from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the seat map of the bus serving a time slot
    Seats(SeatMapArgs),
    /// Book a scripted batch of students against an in-memory fleet
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured allocation strategy
    #[arg(long)]
    pub(crate) strategy: Option<AllocationPolicy>,
    /// Directory holding routes.csv, buses.csv and booking.csv
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seats(args) => run_seat_map(args),
        Command::Demo(args) => run_demo(args),
    }
}

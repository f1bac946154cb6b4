use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod bytes;
mod checksum;
mod cmd;
mod correct;
mod csv;
mod filter;
mod fmt;
mod scan;
mod schema;
mod table;
mod write;

#[derive(Parser)]
#[command(name = "runlog", version, about = "Toolbox for binary vehicle data-logger files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a KML track of all GPS positions to stdout
    Kml { inputs: Vec<PathBuf> },
    /// Print every timestamp with its delta to the previous one
    Timestamps { inputs: Vec<PathBuf> },
    /// Dump every message as a decoded text line
    Txt { inputs: Vec<PathBuf> },
    /// Two-pass CSV of all numeric channels, one row per value change
    Values {
        input: PathBuf,
        /// write floats with a decimal comma
        #[arg(long)]
        decimal_comma: bool,
    },
    /// Per-header message and byte counts
    Histogram {
        inputs: Vec<PathBuf>,
        /// emit the counts as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Report the logger tick rate per GPS second; flag files with slow clocks
    Gpstime { inputs: Vec<PathBuf> },
    /// Extract position/distance/time at high-resolution timer events
    Event { inputs: Vec<PathBuf> },
    /// Report jumps in the logger and GPS clocks
    Timestamp { inputs: Vec<PathBuf> },
    /// Split a file into clean parts at timestamp discontinuities
    Clean { inputs: Vec<PathBuf> },
    /// Rewrite logger timestamps against the GPS clock
    Correct {
        /// input files, optionally followed by a destination
        args: Vec<PathBuf>,
    },
    /// Inject interpolated samples for one auxiliary channel
    Interpolate {
        /// auxiliary channel to interpolate
        #[arg(short = 'c', default_value_t = 37)]
        channel: u8,
        args: Vec<PathBuf>,
    },
    /// Corrected periodic CSV export with a fixed column set
    Tnoify {
        /// column definition file (header:index = name)
        #[arg(short = 'f')]
        columns: PathBuf,
        /// reporting period in seconds
        #[arg(short = 'p', default_value_t = 10.0)]
        period: f64,
        args: Vec<PathBuf>,
    },
    /// Build a binary log from a CSV file
    Fromcsv {
        /// column definition file (header:index = name)
        #[arg(short = 'f')]
        columns: PathBuf,
        args: Vec<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Kml { inputs } => cmd::kml::run(inputs),
        Command::Timestamps { inputs } => cmd::timestamps::run(inputs),
        Command::Txt { inputs } => cmd::txt::run(inputs),
        Command::Values { input, decimal_comma } => cmd::values::run(input, *decimal_comma),
        Command::Histogram { inputs, json } => cmd::histogram::run(inputs, *json),
        Command::Gpstime { inputs } => cmd::gpstime::run(inputs),
        Command::Event { inputs } => cmd::event::run(inputs),
        Command::Timestamp { inputs } => cmd::timestamp::run(inputs),
        Command::Clean { inputs } => cmd::clean::run(inputs),
        Command::Correct { args } => cmd::correct::run(args),
        Command::Interpolate { channel, args } => cmd::interpolate::run(args, *channel),
        Command::Tnoify { columns, period, args } => cmd::tnoify::run(args, columns, *period),
        Command::Fromcsv { columns, args } => cmd::fromcsv::run(args, columns),
    };

    if let Err(error) = result {
        eprintln!("{:#}", error);
        std::process::exit(1);
    }
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cabotage_cli::logging::{init_tracing, LogFormat};

mod commands;

use commands::batch::BatchArgs;
use commands::evaluate::EvaluateArgs;
use commands::sea_distance::SeaDistanceArgs;
use commands::GlobalOptions;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compare road transport with road-sea-road cabotage along the Brazilian coast"
)]
struct Cli {
    /// Directory holding ports.json, sea_matrix.json, hotel.json and diesel_prices.csv.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// SQLite file used to cache routing and geocoding lookups.
    #[arg(long, global = true)]
    cache_path: Option<PathBuf>,

    /// Log output format (logs go to stderr).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one shipment: road only versus cabotage.
    Evaluate(EvaluateArgs),
    /// Evaluate one origin against every destination listed in a file.
    Batch(BatchArgs),
    /// List catalog ports with their gates and hotel factors.
    Ports {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Sea distance between two ports, with its provenance.
    SeaDistance(SeaDistanceArgs),
    /// List the built-in truck presets.
    Trucks,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let global = GlobalOptions {
        data_dir: cli.data_dir,
        cache_path: cli.cache_path,
    };

    if let Err(err) = run(cli.command, &global) {
        eprintln!("Error: {err:?}");
        std::process::exit(commands::exit_code_for(&err));
    }
}

fn run(command: Command, global: &GlobalOptions) -> Result<()> {
    match command {
        Command::Evaluate(args) => commands::evaluate::handle_evaluate(global, &args),
        Command::Batch(args) => commands::batch::handle_batch(global, &args),
        Command::Ports { json } => commands::ports::handle_ports(global, json),
        Command::SeaDistance(args) => commands::sea_distance::handle_sea_distance(global, &args),
        Command::Trucks => commands::trucks::handle_trucks(),
    }
}

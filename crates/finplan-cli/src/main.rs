mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::energy::{CapacitySweepArgs, ConsumptionArgs, StorageArgs};
use commands::loans::{AnnuityArgs, PrepaymentArgs};

/// Loan amortisation plans and PV battery self-consumption simulation
#[derive(Parser)]
#[command(
    name = "finplan",
    version,
    about = "Loan amortisation plans and PV battery self-consumption simulation",
    long_about = "A CLI for household financial planning with decimal precision. \
                  Builds annuity and prepayment schedules for a mortgage and \
                  simulates how a home battery raises PV self-consumption."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Decimal places for money and energy figures
    #[arg(long, default_value_t = 2, global = true)]
    precision: u32,

    /// Log computation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly schedule for a loan repaid in full over a fixed term
    Annuity(AnnuityArgs),
    /// Monthly schedule with annual lump-sum prepayments until payoff
    Prepayment(PrepaymentArgs),
    /// Self-consumption per month without a battery
    Consumption(ConsumptionArgs),
    /// Simulate a battery over monthly PV readings
    Storage(StorageArgs),
    /// Compare self-consumption across a range of battery sizes
    CapacitySweep(CapacitySweepArgs),
    /// Print a sample energy CSV to start from
    EnergySample,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let precision = cli.precision;
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Annuity(args) => commands::loans::run_annuity(args, precision),
        Commands::Prepayment(args) => commands::loans::run_prepayment(args, precision),
        Commands::Consumption(args) => commands::energy::run_consumption(args, precision),
        Commands::Storage(args) => commands::energy::run_storage(args, precision),
        Commands::CapacitySweep(args) => commands::energy::run_capacity_sweep(args, precision),
        Commands::EnergySample => {
            print!("{}", input::csv_in::SAMPLE_ENERGY_CSV);
            return;
        }
        Commands::Version => {
            println!("finplan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

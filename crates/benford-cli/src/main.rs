mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::{DuplicatesArgs, MantissasArgs, ReportArgs, TestArgs};
use commands::expected::ExpectedArgs;

/// Benford's Law digit-distribution conformity testing
#[derive(Parser)]
#[command(
    name = "benford",
    version,
    about = "Benford's Law digit-distribution conformity testing",
    long_about = "A CLI for testing numeric sequences against Benford's Law with decimal \
                  precision. Supports the first digit, second digit, first two digits, \
                  first three digits and last two digits tests, duplicate counts and \
                  mantissa summaries. Data is read as JSON from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log progress to stderr (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the theoretical Benford distribution of a digit test
    Expected(ExpectedArgs),
    /// Run one digit test and rank its deviations
    Test(TestArgs),
    /// Run every digit test and summarise conformity
    Report(ReportArgs),
    /// Most frequently repeated values
    Duplicates(DuplicatesArgs),
    /// Mantissa mean and variance against the uniform reference
    Mantissas(MantissasArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Expected(args) => commands::expected::run_expected(args),
        Commands::Test(args) => commands::analysis::run_test(args),
        Commands::Report(args) => commands::analysis::run_report(args),
        Commands::Duplicates(args) => commands::analysis::run_duplicates(args),
        Commands::Mantissas(args) => commands::analysis::run_mantissas(args),
        Commands::Version => {
            println!("benford {}", env!("CARGO_PKG_VERSION"));
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

use benford_core::distribution;
use clap::Args;
use serde_json::Value;

/// Arguments for the theoretical distribution
#[derive(Args)]
pub struct ExpectedArgs {
    /// Digit test: FD, SD, FTD, F3D or LTD (names such as first_digit also work)
    #[arg(long, default_value = "FD")]
    pub test: String,

    /// Emit chart series instead of the table
    #[arg(long)]
    pub chart: bool,
}

pub fn run_expected(args: ExpectedArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = distribution::expected_for(&args.test)?;
    if args.chart {
        return Ok(serde_json::to_value(table.chart())?);
    }
    Ok(serde_json::to_value(table)?)
}

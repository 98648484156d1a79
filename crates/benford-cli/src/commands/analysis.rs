use benford_core::analysis::Conformity;
use benford_core::{Analysis, AnalysisConfig, BenfordError, DigitTest, RawValue, TestOptions};
use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::input;

/// Where the sequence comes from and how it is read
#[derive(Args)]
pub struct DataArgs {
    /// Path to a JSON request: {"data": [...], "config": {...}, "options": {...}} or a bare array
    #[arg(long)]
    pub input: Option<String>,

    /// Values as separate arguments (e.g. --values 123.45 67.8 "1.234,56");
    /// commas are kept, so Latin-format text stays one value
    #[arg(long, num_args = 1..)]
    pub values: Option<Vec<String>>,

    /// Decimal places kept when scaling values to integers
    #[arg(long)]
    pub decimals: Option<u32>,

    /// Text values use '.' for thousands and ',' for decimals
    #[arg(long)]
    pub latin: bool,
}

/// Ranking options shared by the digit tests
#[derive(Args)]
pub struct RankArgs {
    /// Deviations reported by the FTD, F3D and LTD tests
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Rank buckets found less often than expected too
    #[arg(long)]
    pub all_deviations: bool,
}

/// Arguments for a single digit test
#[derive(Args)]
pub struct TestArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub rank: RankArgs,

    /// Digit test: FD, SD, FTD, F3D or LTD
    #[arg(long, default_value = "FD")]
    pub test: String,

    /// Include chart series with the 5% confidence band
    #[arg(long)]
    pub chart: bool,

    /// Include the records whose pattern is among the ranked deviations
    #[arg(long)]
    pub flagged: bool,
}

/// Arguments for the all-tests report
#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub rank: RankArgs,
}

/// Arguments for the duplicates count
#[derive(Args)]
pub struct DuplicatesArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Number of values reported
    #[arg(long, default_value_t = 20)]
    pub top_n: usize,
}

/// Arguments for the mantissa summary
#[derive(Args)]
pub struct MantissasArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Include the sorted mantissas
    #[arg(long)]
    pub with_values: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Request {
    data: Vec<RawValue>,
    config: AnalysisConfig,
    options: TestOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReportRow {
    test: DigitTest,
    name: String,
    sample_size: usize,
    mad: Decimal,
    mse: Decimal,
    conformity: Option<Conformity>,
    top_deviations: String,
}

fn request_from_value(value: Value) -> Result<Request, serde_json::Error> {
    match value {
        Value::Array(_) => Ok(Request {
            data: serde_json::from_value(value)?,
            ..Request::default()
        }),
        other => serde_json::from_value(other),
    }
}

fn load(args: &DataArgs) -> Result<Request, Box<dyn std::error::Error>> {
    let value = if args.input.is_none() && args.values.is_some() {
        None
    } else {
        input::read_request(args.input.as_deref())?
    };

    let mut request = match value {
        Some(v) => request_from_value(v)?,
        None => Request {
            data: args
                .values
                .clone()
                .ok_or("--values is required (or provide --input or pipe JSON to stdin)")?
                .into_iter()
                .map(RawValue::from)
                .collect(),
            ..Request::default()
        },
    };

    if let Some(decimals) = args.decimals {
        request.config.decimals = decimals;
    }
    if args.latin {
        request.config.latin_format = true;
    }
    tracing::debug!(
        records = request.data.len(),
        decimals = request.config.decimals,
        latin = request.config.latin_format,
        "request loaded"
    );
    Ok(request)
}

fn apply_rank(options: &mut TestOptions, args: &RankArgs) {
    if let Some(top_n) = args.top_n {
        options.top_n = top_n;
    }
    if args.all_deviations {
        options.positive_only = false;
    }
}

pub fn run_test(args: TestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let test: DigitTest = args.test.parse()?;
    let mut request = load(&args.data)?;
    apply_rank(&mut request.options, &args.rank);

    let mut analysis = Analysis::new(&request.data, request.config)?;
    let output = analysis.run_test(test, &request.options)?;

    let mut value = serde_json::to_value(&output)?;
    if args.chart {
        value["result"]["chart"] = serde_json::to_value(output.result.table.chart())?;
    }
    if args.flagged {
        value["result"]["flagged_records"] = serde_json::to_value(analysis.flagged_records(test))?;
    }
    Ok(value)
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = load(&args.data)?;
    apply_rank(&mut request.options, &args.rank);

    let mut analysis = Analysis::new(&request.data, request.config)?;
    let mut rows = Vec::with_capacity(DigitTest::ALL.len());
    let mut warnings: Vec<String> = Vec::new();

    for test in DigitTest::ALL {
        let output = match analysis.run_test(test, &request.options) {
            Ok(output) => output,
            // a short-valued sequence has no F3D sample; report the rest
            Err(BenfordError::InsufficientData(reason)) => {
                warnings.push(format!("{}: {}", test.key(), reason));
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        for w in output.warnings {
            if !warnings.contains(&w) {
                warnings.push(w);
            }
        }
        let r = output.result;
        rows.push(ReportRow {
            test: r.test,
            name: r.test.name().to_string(),
            sample_size: r.sample_size,
            mad: r.mad,
            mse: r.mse,
            conformity: r.conformity,
            top_deviations: r
                .top_deviations
                .iter()
                .map(|b| b.bucket.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        });
    }

    Ok(serde_json::json!({
        "result": {
            "records": analysis.sanitized().total,
            "dropped": analysis.sanitized().dropped(),
            "excluded": analysis.set().excluded,
            "analysed": analysis.len(),
            "tests": rows,
            "deviation_map": analysis.deviation_map(),
        },
        "methodology": "Benford's Law digit tests (FD, SD, FTD, F3D, LTD) with MAD conformity bands",
        "warnings": warnings,
    }))
}

pub fn run_duplicates(args: DuplicatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load(&args.data)?;
    let analysis = Analysis::new(&request.data, request.config)?;
    Ok(serde_json::to_value(analysis.duplicates(args.top_n)?)?)
}

pub fn run_mantissas(args: MantissasArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load(&args.data)?;
    let analysis = Analysis::new(&request.data, request.config)?;
    let mut value = serde_json::to_value(analysis.mantissas()?)?;
    if !args.with_values {
        if let Some(map) = value.as_object_mut() {
            map.remove("mantissas");
        }
    }
    Ok(value)
}

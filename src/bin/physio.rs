//! Physio CLI - Command-line interface for physio-features
//!
//! Commands:
//! - extract: Turn a recording into the feature matrix and its companion files
//! - inspect: Report what an extraction run would see and produce
//! - schema: Print the accepted field names and the feature header

use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use physio_features::pipeline::ExtractionReport;
use physio_features::schema::CONTAINER_KEYS;
use physio_features::types::Window;
use physio_features::{
    ExtractionConfig, FeatureError, FeatureExporter, FeatureProcessor, RawRecord, RecordLoader,
    SemanticField, FEATURE_COUNT, FEATURE_NAMES, PRODUCER_NAME, VERSION,
};

/// Physio - Windowed feature extraction for physiological sensor recordings
#[derive(Parser)]
#[command(name = "physio")]
#[command(version = VERSION)]
#[command(about = "Extract per-window HRV, activity and temperature features", long_about = None)]
struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the feature matrix from a recording
    Extract {
        /// Input file path (use - for stdin)
        input: PathBuf,

        /// Feature matrix output path (.npy)
        #[arg(short, long, default_value = "features.npy")]
        out: PathBuf,

        /// Also write the aligned samples to this CSV file
        #[arg(long)]
        save_csv: Option<PathBuf>,

        #[command(flatten)]
        settings: Settings,
    },

    /// Inspect a recording without writing artifacts
    Inspect {
        /// Input file path (use - for stdin)
        input: PathBuf,

        /// Output report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: Settings,
    },

    /// Print the accepted field names and the feature header
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Extraction settings shared by commands that run the pipeline
#[derive(clap::Args)]
struct Settings {
    /// Load settings from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window duration in seconds
    #[arg(long)]
    window_seconds: Option<f64>,

    /// Minimum samples for a window to be emitted
    #[arg(long)]
    min_samples: Option<usize>,
}

impl Settings {
    fn resolve(&self) -> Result<ExtractionConfig, PhysioCliError> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::load(path)?,
            None => ExtractionConfig::default(),
        };
        if let Some(seconds) = self.window_seconds {
            config.window_seconds = seconds;
        }
        if let Some(min_samples) = self.min_samples {
            config.min_samples_per_window = min_samples;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "physio_features=debug" } else { "physio_features=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), PhysioCliError> {
    match cli.command {
        Commands::Extract {
            input,
            out,
            save_csv,
            settings,
        } => cmd_extract(&input, &out, save_csv.as_deref(), &settings),

        Commands::Inspect {
            input,
            json,
            settings,
        } => cmd_inspect(&input, json, &settings),

        Commands::Schema { json } => cmd_schema(json),
    }
}

fn cmd_extract(
    input: &Path,
    out: &Path,
    save_csv: Option<&Path>,
    settings: &Settings,
) -> Result<(), PhysioCliError> {
    let processor = FeatureProcessor::with_config(settings.resolve()?)?;
    let records = read_records(input)?;
    let output = processor.process(&records);

    let paths = FeatureExporter::write_all(&output.matrix, out)?;
    if let Some(csv_path) = save_csv {
        FeatureExporter::write_raw_csv(&output.sequences, csv_path)?;
        println!("Saved raw samples to {}", csv_path.display());
    }

    let (rows, cols) = output.matrix.shape();
    println!(
        "Saved {} ({} windows x {} features)",
        paths.matrix.display(),
        rows,
        cols
    );
    Ok(())
}

fn cmd_inspect(input: &Path, json: bool, settings: &Settings) -> Result<(), PhysioCliError> {
    let processor = FeatureProcessor::with_config(settings.resolve()?)?;
    let records = read_records(input)?;
    let report = processor.inspect(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(input, &report);
    }
    Ok(())
}

fn print_report(input: &Path, report: &ExtractionReport) {
    println!("Inspection Report: {}", input.display());
    println!("=================");
    println!("Records:          {}", report.records_total);
    println!("Samples accepted: {}", report.samples_accepted);
    println!("Records dropped:  {}", report.records_dropped);

    println!("\nField coverage (non-missing samples):");
    let coverage = &report.coverage;
    for (name, count) in [
        ("hr_bpm", coverage.hr_bpm),
        ("rr_ms", coverage.rr_ms),
        ("ax", coverage.ax),
        ("ay", coverage.ay),
        ("az", coverage.az),
        ("temp", coverage.temp),
    ] {
        println!("  {:<8} {}", name, count);
    }

    match &report.time_span {
        Some(span) => {
            println!("\nTime span:");
            println!(
                "  start: {} ({})",
                span.start,
                span.start_utc.as_deref().unwrap_or("out of range")
            );
            println!(
                "  end:   {} ({})",
                span.end,
                span.end_utc.as_deref().unwrap_or("out of range")
            );
        }
        None => println!("\nTime span: no timestamped samples"),
    }

    println!(
        "\nWindows ({} s): {} emitted, {} discarded",
        report.window_duration_seconds, report.windows_emitted, report.windows_discarded
    );
    for &start in &report.window_starts {
        let window = Window::new(start, report.window_duration_seconds);
        match window.start_utc() {
            Some(utc) => println!("  - {} ({})", start, utc.to_rfc3339()),
            None => println!("  - {}", start),
        }
    }
}

fn cmd_schema(json: bool) -> Result<(), PhysioCliError> {
    if json {
        let fields: serde_json::Map<String, serde_json::Value> = SemanticField::ALL
            .iter()
            .map(|field| (field.as_str().to_string(), serde_json::json!(field.synonyms())))
            .collect();
        let schema = serde_json::json!({
            "producer": PRODUCER_NAME,
            "version": VERSION,
            "container_keys": CONTAINER_KEYS,
            "fields": fields,
            "features": FEATURE_NAMES,
        });
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!("Accepted fields (case-insensitive, first match wins):");
    println!();
    for field in SemanticField::ALL {
        println!("  {:<12} {}", field.as_str(), field.synonyms().join(", "));
    }
    println!();
    println!("Record lists may be wrapped under: {}", CONTAINER_KEYS.join(", "));
    println!("Bare timestamps above 1e12 are read as milliseconds.");
    println!();
    println!("Feature header ({} columns):", FEATURE_COUNT);
    for (i, name) in FEATURE_NAMES.iter().enumerate() {
        println!("  {:>2}. {}", i, name);
    }
    Ok(())
}

// Helper functions

fn read_records(input: &Path) -> Result<Vec<RawRecord>, PhysioCliError> {
    if input.to_string_lossy() != "-" {
        return Ok(RecordLoader::load_path(input)?);
    }
    if atty::is(atty::Stream::Stdin) {
        return Err(PhysioCliError::InteractiveStdin);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(RecordLoader::load_str(&buffer, None, Path::new("<stdin>"))?)
}

// Error types

#[derive(Debug)]
enum PhysioCliError {
    Io(io::Error),
    Feature(FeatureError),
    Json(serde_json::Error),
    InteractiveStdin,
}

impl From<io::Error> for PhysioCliError {
    fn from(e: io::Error) -> Self {
        PhysioCliError::Io(e)
    }
}

impl From<FeatureError> for PhysioCliError {
    fn from(e: FeatureError) -> Self {
        PhysioCliError::Feature(e)
    }
}

impl From<serde_json::Error> for PhysioCliError {
    fn from(e: serde_json::Error) -> Self {
        PhysioCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        CliError {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<PhysioCliError> for CliError {
    fn from(e: PhysioCliError) -> Self {
        match e {
            PhysioCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            PhysioCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            PhysioCliError::InteractiveStdin => CliError::new(
                "STDIN_IS_TERMINAL",
                "Refusing to read records from an interactive terminal".to_string(),
                "Pipe a recording into stdin or pass a file path",
            ),
            PhysioCliError::Feature(e) => {
                let message = e.to_string();
                match e {
                    FeatureError::Schema(_) => CliError::new(
                        "SCHEMA_ERROR",
                        message,
                        "Provide a list of records or wrap it under data, records, values or rows",
                    ),
                    FeatureError::Load { .. } => CliError::new(
                        "LOAD_ERROR",
                        message,
                        "Use a .json, .ndjson or .csv extension to pick the parser",
                    ),
                    FeatureError::Json(_) => {
                        CliError::new("JSON_ERROR", message, "Check JSON syntax")
                    }
                    FeatureError::Csv(_) => CliError::new(
                        "CSV_ERROR",
                        message,
                        "Ensure every row has as many cells as the header",
                    ),
                    FeatureError::Io(_) => {
                        CliError::new("IO_ERROR", message, "Check file paths and permissions")
                    }
                    FeatureError::Export(_) => CliError::new(
                        "EXPORT_ERROR",
                        message,
                        "Check that the output directory is writable",
                    ),
                    FeatureError::Config(_) => CliError::new(
                        "CONFIG_ERROR",
                        message,
                        "Run 'physio extract --help' for valid settings",
                    ),
                }
            }
        }
    }
}

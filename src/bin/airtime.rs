//! Airtime CLI - Replay recorded sensor sessions through the throw classifier
//!
//! Commands:
//! - replay: Process a recorded sample file into throws (batch mode)
//! - run: Process samples from stdin, emitting each throw as it completes
//! - validate: Validate raw sample schema and per-channel ordering
//! - doctor: Diagnose configuration and environment
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use airtime::schema::{RawSample, RawSampleAdapter, SCHEMA_VERSION};
use airtime::types::ThrowRecord;
use airtime::{ClassifierConfig, ThrowTracker, AIRTIME_VERSION, PRODUCER_NAME};

/// Airtime - On-device throw, flight and catch classifier
#[derive(Parser)]
#[command(name = "airtime")]
#[command(author = "Synheart AI Inc")]
#[command(version = AIRTIME_VERSION)]
#[command(
    about = "Classify throws from recorded accelerometer/gyroscope samples",
    long_about = None
)]
struct Cli {
    /// Log classifier transitions to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded sample file (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "report")]
        output_format: OutputFormat,

        /// Device ID for provenance tracking
        #[arg(long, default_value = "unknown")]
        device_id: String,

        /// Classifier config JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Process streaming samples from stdin (streaming mode)
    Run {
        /// Classifier config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Flush output after each record (--flush false to buffer)
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        flush: bool,
    },

    /// Validate raw sample schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a classifier config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// JSON array of samples
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed report with summary
    Report,
    /// Newline-delimited JSON (one throw per line)
    Ndjson,
    /// JSON array of throws, most recent first
    Json,
    /// Human-readable table, most recent first
    Table,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (motion.raw_sample.v1)
    Input,
    /// Output schema (throw report)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    // Only fails if a global subscriber is already installed
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: Cli) -> Result<(), AirtimeCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            device_id,
            config,
        } => cmd_replay(
            &input,
            &output,
            input_format,
            output_format,
            &device_id,
            config.as_deref(),
        ),

        Commands::Run { config, flush } => cmd_run(config.as_deref(), flush),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema { schema_type, json_schema } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    device_id: &str,
    config: Option<&Path>,
) -> Result<(), AirtimeCliError> {
    let input_data = read_input(input)?;
    let raw = parse_input(&input_data, &input_format)?;

    if raw.is_empty() {
        return Err(AirtimeCliError::NoSamples);
    }

    let samples = RawSampleAdapter::to_samples(&raw)?;
    let mut tracker = build_tracker(config)?;

    info!(samples = samples.len(), "replaying recording");
    for sample in &samples {
        tracker.process_sample(sample);
    }
    debug!(
        throws = tracker.stored_count(),
        state = tracker.current_state().as_str(),
        "replay finished"
    );

    let output_data = match output_format {
        OutputFormat::Report => tracker.report_json(device_id)? + "\n",
        OutputFormat::Ndjson => {
            let mut lines = String::new();
            for record in tracker.history() {
                lines.push_str(&serde_json::to_string(record)?);
                lines.push('\n');
            }
            lines
        }
        OutputFormat::Json => {
            let records: Vec<&ThrowRecord> = tracker.history().collect();
            serde_json::to_string(&records)? + "\n"
        }
        OutputFormat::Table => format_table(tracker.history()),
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(config: Option<&Path>, flush: bool) -> Result<(), AirtimeCliError> {
    let mut tracker = build_tracker(config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let raw: RawSample = serde_json::from_str(trimmed).map_err(|e| {
            AirtimeCliError::ParseError(format!("Failed to parse sample: {}", e))
        })?;
        raw.validate()?;

        if let Some(record) = tracker.process_sample(&raw.to_sample()) {
            writeln!(stdout, "{}", serde_json::to_string(&record)?)?;
            if flush {
                stdout.flush()?;
            }
        }
    }

    stdout.flush()?;
    info!(throws = tracker.stored_count(), "stream closed");
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), AirtimeCliError> {
    let input_data = read_input(input)?;
    let raw = parse_input(&input_data, &input_format)?;

    let results = RawSampleAdapter::validate_samples(&raw);

    let report = ValidationReport {
        total_samples: raw.len(),
        valid_samples: raw.len() - results.len(),
        invalid_samples: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                sample_id: r.sample_id.clone(),
                error: r.result.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total samples:   {}", report.total_samples);
        println!("Valid samples:   {}", report.valid_samples);
        println!("Invalid samples: {}", report.invalid_samples);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Sample {} (index {}): {}",
                    err.sample_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_samples > 0 {
        Err(AirtimeCliError::ValidationFailed(report.invalid_samples))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), AirtimeCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "airtime_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Airtime version {}", AIRTIME_VERSION),
        },
        DoctorCheck {
            name: "schema_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Input schema: {}", SCHEMA_VERSION),
        },
    ];

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist, defaults will be used".to_string(),
            }
        } else {
            match fs::read_to_string(config_path) {
                Ok(content) => match ClassifierConfig::from_json(&content) {
                    Ok(cfg) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (throw {}g, free fall {}g, catch {}g, timeout {}s)",
                            cfg.throw_threshold_g,
                            cfg.free_fall_threshold_g,
                            cfg.catch_threshold_g,
                            cfg.throw_timeout_seconds
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    // Check stdin is available (for streaming mode)
    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (streaming mode ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: AIRTIME_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Airtime Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AirtimeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), AirtimeCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per sensor reading, channels interleaved in arrival order:");
                println!();
                println!("- schema_version: \"{}\"", SCHEMA_VERSION);
                println!("- sensor: accelerometer (m/s^2) | gyroscope (rad/s)");
                println!("- timestamp_ns: monotonic sensor-clock nanoseconds,");
                println!("  non-decreasing within each channel");
                println!("- values: [x, y, z]");
                println!("- sample_id, device_id, accuracy: optional");
                println!("  (accuracy \"unreliable\" is reported by 'airtime validate')");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: throw report {}", airtime::encoder::REPORT_VERSION);
                println!();
                println!("- report_version");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- provenance: {{ device_id, computed_at_utc, first_throw_at_ns, last_catch_at_ns }}");
                println!("- summary: {{ throw_count, total_flight_time_seconds, longest_flight_seconds,");
                println!("             highest_throw_meters, total_rotations, best_catch }}");
                println!("- throws: most recent first, each containing:");
                println!("  - id, rotation_count {{ x, y, z }}, accumulated_rotation_rad {{ x, y, z }}");
                println!("  - flight_time_seconds, max_height_meters");
                println!("  - peak_catch_accel_magnitude, catch_quality (soft | firm | hard | harsh)");
                println!("  - throw_started_at_ns, flight_started_at_ns, caught_at_ns");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, AirtimeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_input(data: &str, format: &InputFormat) -> Result<Vec<RawSample>, AirtimeCliError> {
    let raw = match format {
        InputFormat::Ndjson => RawSampleAdapter::parse_ndjson(data)?,
        InputFormat::Json => RawSampleAdapter::parse_array(data)?,
    };
    Ok(raw)
}

fn build_tracker(config: Option<&Path>) -> Result<ThrowTracker, AirtimeCliError> {
    let tracker = match config {
        Some(path) => {
            let config = ClassifierConfig::from_json(&fs::read_to_string(path)?)?;
            ThrowTracker::with_config(config)?
        }
        None => ThrowTracker::new(),
    };
    Ok(tracker)
}

fn format_table<'a>(records: impl Iterator<Item = &'a ThrowRecord>) -> String {
    let mut out = format!(
        "{:>4}  {:>9}  {:>9}  {:>13}  {:>8}  {:<6}\n",
        "#", "flight s", "height m", "spins x/y/z", "peak g", "catch"
    );
    for r in records {
        let spins = format!(
            "{}/{}/{}",
            r.rotation_count.x, r.rotation_count.y, r.rotation_count.z
        );
        out.push_str(&format!(
            "{:>4}  {:>9.3}  {:>9.3}  {:>13}  {:>8.2}  {:<6}\n",
            r.id,
            r.flight_time_seconds,
            r.max_height_meters,
            spins,
            r.peak_catch_accel_magnitude / airtime::types::GRAVITY,
            r.catch_quality.as_str()
        ));
    }
    out
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/motion.raw_sample.v1.json",
        "title": "motion.raw_sample.v1",
        "description": "Airtime raw sensor sample schema",
        "type": "object",
        "required": ["schema_version", "sensor", "timestamp_ns", "values"],
        "properties": {
            "schema_version": {
                "type": "string",
                "const": "motion.raw_sample.v1"
            },
            "sample_id": { "type": "string" },
            "sensor": {
                "type": "string",
                "enum": ["accelerometer", "gyroscope"]
            },
            "timestamp_ns": { "type": "integer", "minimum": 0 },
            "values": {
                "type": "array",
                "items": { "type": "number" },
                "minItems": 3,
                "maxItems": 3
            },
            "device_id": { "type": "string" },
            "accuracy": {
                "type": "string",
                "enum": ["unreliable", "low", "medium", "high"]
            }
        }
    }).to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/airtime.throw_report.v1.json",
        "title": "airtime throw report",
        "description": "Airtime throw report schema",
        "type": "object",
        "required": ["report_version", "producer", "provenance", "summary", "throws"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "device_id": { "type": "string" },
                    "computed_at_utc": { "type": "string" },
                    "first_throw_at_ns": { "type": ["integer", "null"] },
                    "last_catch_at_ns": { "type": ["integer", "null"] }
                }
            },
            "summary": { "type": "object" },
            "throws": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": [
                        "id", "rotation_count", "flight_time_seconds", "max_height_meters",
                        "peak_catch_accel_magnitude", "catch_quality", "caught_at_ns"
                    ],
                    "properties": {
                        "catch_quality": {
                            "type": "string",
                            "enum": ["soft", "firm", "hard", "harsh"]
                        }
                    }
                }
            }
        }
    }).to_string()
}

// Error types

#[derive(Debug)]
enum AirtimeCliError {
    Io(io::Error),
    Airtime(airtime::AirtimeError),
    Json(serde_json::Error),
    Validation(airtime::schema::ValidationError),
    NoSamples,
    ValidationFailed(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for AirtimeCliError {
    fn from(e: io::Error) -> Self {
        AirtimeCliError::Io(e)
    }
}

impl From<airtime::AirtimeError> for AirtimeCliError {
    fn from(e: airtime::AirtimeError) -> Self {
        AirtimeCliError::Airtime(e)
    }
}

impl From<serde_json::Error> for AirtimeCliError {
    fn from(e: serde_json::Error) -> Self {
        AirtimeCliError::Json(e)
    }
}

impl From<airtime::schema::ValidationError> for AirtimeCliError {
    fn from(e: airtime::schema::ValidationError) -> Self {
        AirtimeCliError::Validation(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AirtimeCliError> for CliError {
    fn from(e: AirtimeCliError) -> Self {
        match e {
            AirtimeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AirtimeCliError::Airtime(airtime::AirtimeError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'airtime doctor --config <file>' for details".to_string()),
            },
            AirtimeCliError::Airtime(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches motion.raw_sample.v1 schema".to_string()),
            },
            AirtimeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AirtimeCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'airtime validate' for details".to_string()),
            },
            AirtimeCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            AirtimeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} samples failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            AirtimeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            AirtimeCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_samples: usize,
    valid_samples: usize,
    invalid_samples: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    sample_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

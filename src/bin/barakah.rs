//! Barakah CLI - Command-line interface for Barakah Score
//!
//! Commands:
//! - score: Compute the feature, score and outcome tables from the daily log
//! - analyze: Fit the outcome model and persist its report
//! - log: Append one daily entry to the log
//! - summary: Summarize the data held in the log
//! - config: Show or initialize the config document
//! - doctor: Diagnose the data directory and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use barakah_score::insights::{self, LogSummary};
use barakah_score::model::{ModelStatus, OutcomeAnalyzer};
use barakah_score::normalizer::{self, DateKey};
use barakah_score::pipeline::{self, ScoreTables};
use barakah_score::store::{self, DataDir};
use barakah_score::{tables, Component, Config, RawLogEntry, BARAKAH_VERSION, PRODUCER_NAME};

/// Barakah - Daily composite scoring of spiritual and lifestyle habits
#[derive(Parser)]
#[command(name = "barakah")]
#[command(version = BARAKAH_VERSION)]
#[command(about = "Score daily habits into a Baraka score", long_about = None)]
struct Cli {
    /// Data directory holding config/, data/ and models/
    #[arg(short, long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Config file (defaults to <data-dir>/config/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the score tables from the daily log
    Score {
        /// Read entries from this JSON array instead of the stored log (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Table printed to stdout
        #[arg(long, default_value = "scores")]
        table: TableKind,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: OutputFormat,

        /// Write the tables under <data-dir>/data/processed
        #[arg(long)]
        save: bool,
    },

    /// Fit the outcome model and write its report
    Analyze {
        /// Rebuild features from the log instead of reading data/processed/daily_features.csv
        #[arg(long)]
        from_log: bool,

        /// Run ID recorded in the report (defaults to a fresh UUID)
        #[arg(long)]
        run_id: Option<String>,

        /// Print the report without writing it to <data-dir>/models
        #[arg(long)]
        no_save: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append one daily entry (a JSON object) to the log
    Log {
        /// Entry file (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Date to record the entry under, overriding the entry's own
        #[arg(long)]
        date: Option<String>,
    },

    /// Summarize the log and suggest improvements for the latest day
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or initialize the config document
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose the data directory and configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config
    Show,
    /// Write the default config
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TableKind {
    Features,
    Scores,
    Outcomes,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), BarakahCliError> {
    let dir = DataDir::new(cli.data_dir);
    let config_path = cli.config.unwrap_or_else(|| dir.config_path());

    match cli.command {
        Commands::Score {
            input,
            table,
            format,
            save,
        } => cmd_score(&dir, &config_path, input.as_deref(), table, format, save),

        Commands::Analyze {
            from_log,
            run_id,
            no_save,
            json,
        } => cmd_analyze(&dir, &config_path, from_log, run_id, !no_save, json),

        Commands::Log { input, date } => cmd_log(&dir, &input, date),

        Commands::Summary { json } => cmd_summary(&dir, &config_path, json),

        Commands::Config { action } => match action {
            ConfigAction::Show => cmd_config_show(&config_path),
            ConfigAction::Init { force } => cmd_config_init(&config_path, force),
        },

        Commands::Doctor { json } => cmd_doctor(&dir, &config_path, json),
    }
}

fn read_input(path: &Path) -> Result<String, BarakahCliError> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn load_entries(dir: &DataDir, input: Option<&Path>) -> Result<Vec<RawLogEntry>, BarakahCliError> {
    match input {
        Some(path) => Ok(barakah_score::parse_log_array(&read_input(path)?)?),
        None => Ok(dir.log_store().load()?),
    }
}

fn cmd_score(
    dir: &DataDir,
    config_path: &Path,
    input: Option<&Path>,
    table: TableKind,
    format: OutputFormat,
    save: bool,
) -> Result<(), BarakahCliError> {
    let config = store::load_config(config_path)?;
    let entries = load_entries(dir, input)?;
    let tables = pipeline::run(&entries, &config);

    if save {
        dir.save_tables(&tables)?;
    }

    let rendered = match (table, format) {
        (TableKind::Features, OutputFormat::Csv) => tables::to_csv_string(&tables.features)?,
        (TableKind::Scores, OutputFormat::Csv) => tables::to_csv_string(&tables.scores)?,
        (TableKind::Outcomes, OutputFormat::Csv) => tables::to_csv_string(&tables.outcomes())?,
        (TableKind::Features, OutputFormat::Json) => serde_json::to_string_pretty(&tables.features)?,
        (TableKind::Scores, OutputFormat::Json) => serde_json::to_string_pretty(&tables.scores)?,
        (TableKind::Outcomes, OutputFormat::Json) => serde_json::to_string_pretty(&tables.outcomes())?,
    };
    print!("{}", rendered);
    if matches!(format, OutputFormat::Json) {
        println!();
    }

    Ok(())
}

fn cmd_analyze(
    dir: &DataDir,
    config_path: &Path,
    from_log: bool,
    run_id: Option<String>,
    save: bool,
    json: bool,
) -> Result<(), BarakahCliError> {
    let config = store::load_config(config_path)?;
    let features = if from_log {
        pipeline::run(&dir.log_store().load()?, &config).features
    } else {
        dir.load_features()?
    };

    let analyzer = match run_id {
        Some(run_id) => OutcomeAnalyzer::with_run_id(config.model.clone(), run_id),
        None => OutcomeAnalyzer::new(config.model.clone()),
    };
    let report = analyzer.analyze(&features);
    if save {
        dir.save_model_report(&report)?;
    }

    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("Outcome Model");
    println!("=============");
    match report.status {
        ModelStatus::NoData => {
            println!("No processed days yet. Run 'barakah score --save' or pass --from-log.")
        }
        ModelStatus::InsufficientData => {
            println!(
                "Need at least {} days with outcome ratings for a model.",
                config.model.min_samples
            );
            if let Some(correlations) = &report.correlations {
                print_ranked("Correlations with outcome", correlations);
            }
        }
        ModelStatus::Ok => {
            println!("Samples:     {}", report.n_samples.unwrap_or(0));
            println!("CV R² mean:  {:.3}", report.cv_r2_mean.unwrap_or(0.0));
            println!("CV R² std:   {:.3}", report.cv_r2_std.unwrap_or(0.0));
            if let Some(importances) = &report.feature_importances {
                print_ranked("Feature importances", importances);
            }
            if let Some(correlations) = &report.correlations_with_outcome {
                print_ranked("Correlations with outcome", correlations);
            }
        }
        ModelStatus::Error => {
            println!(
                "Model fitting failed: {}",
                report.error_message.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn print_ranked(title: &str, values: &std::collections::BTreeMap<String, f64>) {
    let mut ranked: Vec<(&String, &f64)> = values.iter().collect();
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

    println!("\n{}:", title);
    for (name, value) in ranked {
        println!("  {:<16} {:>8.3}", name, value);
    }
}

fn cmd_log(dir: &DataDir, input: &Path, date: Option<String>) -> Result<(), BarakahCliError> {
    let value: serde_json::Value = serde_json::from_str(&read_input(input)?)?;
    if !value.is_object() {
        return Err(BarakahCliError::InvalidEntry(
            "entry must be a JSON object".to_string(),
        ));
    }

    let mut entry = RawLogEntry::from_value(value)?;
    if let Some(date) = date {
        entry.date = date;
    }
    if matches!(normalizer::normalize_date(&entry.date), DateKey::Missing) {
        return Err(BarakahCliError::InvalidEntry("entry has no date".to_string()));
    }

    for issue in entry.issues() {
        tracing::warn!(date = %entry.date, "{}", issue);
    }

    let store = dir.log_store();
    let count = store.append(&entry)?;
    println!("Logged {} ({} entries in {})", entry.date, count, store.path().display());

    Ok(())
}

#[derive(serde::Serialize)]
struct SummaryReport {
    #[serde(flatten)]
    summary: LogSummary,
    suggestions: Vec<SuggestionLine>,
}

#[derive(serde::Serialize)]
struct SuggestionLine {
    kind: insights::Suggestion,
    component: Option<Component>,
    message: String,
}

fn cmd_summary(dir: &DataDir, config_path: &Path, json: bool) -> Result<(), BarakahCliError> {
    let config = store::load_config(config_path)?;
    let entries = dir.log_store().load()?;
    let tables = pipeline::run(&entries, &config);

    let summary = LogSummary::new(&entries, &tables);
    let suggestions: Vec<SuggestionLine> = tables
        .latest()
        .map(insights::suggestions)
        .unwrap_or_default()
        .into_iter()
        .map(|kind| SuggestionLine {
            kind,
            component: kind.component(),
            message: kind.message().to_string(),
        })
        .collect();

    if json {
        let report = SummaryReport {
            summary,
            suggestions,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Barakah Summary");
    println!("===============");
    println!("Entries logged:      {}", summary.total_entries);
    println!("Days scored:         {}", summary.scored_days);
    println!("Days with outcomes:  {}", summary.days_with_outcomes);
    if let (Some(first), Some(latest)) = (&summary.first_date, &summary.latest_date) {
        println!("Date range:          {} to {}", first, latest);
    }
    print_latest(&tables);

    if !suggestions.is_empty() {
        println!("\nSuggestions:");
        for line in &suggestions {
            println!("  - {}", line.message);
        }
    }

    Ok(())
}

fn print_latest(tables: &ScoreTables) {
    let Some(latest) = tables.latest() else {
        return;
    };

    println!("\nLatest day ({}):", latest.date);
    println!("  {:<18} {:>6.1}", "baraka_score", latest.baraka_score);
    for (name, score) in latest.components().to_map() {
        println!("  {:<18} {:>6.1}", name, score);
    }
}

fn cmd_config_show(config_path: &Path) -> Result<(), BarakahCliError> {
    let config = store::load_config(config_path)?;
    println!("{}", config.to_json()?);
    Ok(())
}

fn cmd_config_init(config_path: &Path, force: bool) -> Result<(), BarakahCliError> {
    if config_path.exists() && !force {
        return Err(BarakahCliError::ConfigExists(config_path.to_path_buf()));
    }

    store::save_json(config_path, &Config::default())?;
    println!("Wrote default config to {}", config_path.display());
    Ok(())
}

fn cmd_doctor(dir: &DataDir, config_path: &Path, json: bool) -> Result<(), BarakahCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "barakah_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Barakah version {}", BARAKAH_VERSION),
    });

    // Config document
    match store::load_config(config_path) {
        Ok(config) => {
            let issues = config.issues();
            if issues.is_empty() {
                let source = if config_path.exists() { "Config file" } else { "Default config" };
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("{} is consistent", source),
                });
            }
            for issue in issues {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Warning,
                    message: issue.to_string(),
                });
            }
        }
        Err(e) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot load {}: {}", config_path.display(), e),
        }),
    }

    // Daily log
    let store = dir.log_store();
    match store.load() {
        Ok(entries) if entries.is_empty() => checks.push(DoctorCheck {
            name: "daily_log".to_string(),
            status: CheckStatus::Warning,
            message: format!("No entries in {}", store.path().display()),
        }),
        Ok(entries) => {
            checks.push(DoctorCheck {
                name: "daily_log".to_string(),
                status: CheckStatus::Ok,
                message: format!("{} entries readable", entries.len()),
            });
            for entry in &entries {
                for issue in entry.issues() {
                    checks.push(DoctorCheck {
                        name: "entry".to_string(),
                        status: CheckStatus::Warning,
                        message: format!("{}: {}", display_date(&entry.date), issue),
                    });
                }
            }
        }
        Err(e) => checks.push(DoctorCheck {
            name: "daily_log".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read {}: {}", store.path().display(), e),
        }),
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: BARAKAH_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Barakah Doctor Report");
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
        Err(BarakahCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn display_date(date: &str) -> &str {
    if date.trim().is_empty() {
        "(undated)"
    } else {
        date
    }
}

// Error types

#[derive(Debug)]
enum BarakahCliError {
    Io(io::Error),
    Compute(barakah_score::ComputeError),
    Json(serde_json::Error),
    InvalidEntry(String),
    ConfigExists(PathBuf),
    DoctorFailed,
}

impl From<io::Error> for BarakahCliError {
    fn from(e: io::Error) -> Self {
        BarakahCliError::Io(e)
    }
}

impl From<barakah_score::ComputeError> for BarakahCliError {
    fn from(e: barakah_score::ComputeError) -> Self {
        BarakahCliError::Compute(e)
    }
}

impl From<serde_json::Error> for BarakahCliError {
    fn from(e: serde_json::Error) -> Self {
        BarakahCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BarakahCliError> for CliError {
    fn from(e: BarakahCliError) -> Self {
        match e {
            BarakahCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BarakahCliError::Compute(barakah_score::ComputeError::ConfigError(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'barakah config init --force' to reset the config".to_string()),
            },
            BarakahCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'barakah doctor' for details".to_string()),
            },
            BarakahCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BarakahCliError::InvalidEntry(msg) => CliError {
                code: "INVALID_ENTRY".to_string(),
                message: msg,
                hint: Some("Provide a JSON object with a \"date\" field or pass --date".to_string()),
            },
            BarakahCliError::ConfigExists(path) => CliError {
                code: "CONFIG_EXISTS".to_string(),
                message: format!("{} already exists", path.display()),
                hint: Some("Pass --force to overwrite it".to_string()),
            },
            BarakahCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

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

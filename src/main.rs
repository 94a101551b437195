//! Circadian Biomarkers CLI
//!
//! Batch computation of L5, M10 and VMC from recording files.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use circadian_biomarkers::{
    audit::{create_shared_log_with_persistence, RunLog, SharedRunLog},
    config::Config,
    core::{compute_vmc_range, DaySelection},
    input::load_recording,
    report::{BiomarkerReport, ReportBuilder, ReportNames},
    VERSION,
};
use clap::{Parser, Subcommand};
use crossbeam_channel::{bounded, unbounded};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "circadian")]
#[command(version = VERSION)]
#[command(about = "Circadian and activity biomarkers from wearable recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute L5, M10 and VMC for one or more recording files
    Analyze {
        /// Recording files (JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory for reports
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Number of recordings analyzed in parallel
        #[arg(long)]
        workers: Option<usize>,

        /// Use weekdays for VMC and heart rate
        #[arg(long)]
        weekday: bool,

        /// Use weekend days for VMC and heart rate
        #[arg(long)]
        weekend: bool,
    },

    /// Compute VMC over an explicit time range
    Vmc {
        /// Recording file (JSON)
        file: PathBuf,

        /// Range start (RFC3339)
        #[arg(long)]
        from: DateTime<Utc>,

        /// Range end (RFC3339)
        #[arg(long)]
        to: DateTime<Utc>,

        /// Output format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show cumulative run statistics
    Status {
        /// Reset the stored counters
        #[arg(long)]
        reset: bool,
    },

    /// Show or change configuration
    Config {
        /// Default IANA time zone for recordings that do not name one
        #[arg(long)]
        set_timezone: Option<String>,

        /// L5 window in hours
        #[arg(long)]
        set_l5_hours: Option<i64>,

        /// M10 window in hours
        #[arg(long)]
        set_m10_hours: Option<i64>,

        /// Include weekdays in the default day selection
        #[arg(long)]
        set_weekdays: Option<bool>,

        /// Include weekend days in the default day selection
        #[arg(long)]
        set_weekends: Option<bool>,

        /// Default number of workers
        #[arg(long)]
        set_workers: Option<usize>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            files,
            output,
            workers,
            weekday,
            weekend,
        } => cmd_analyze(files, output, workers, weekday, weekend),
        Commands::Vmc {
            file,
            from,
            to,
            format,
        } => cmd_vmc(&file, from, to, &format),
        Commands::Status { reset } => cmd_status(reset),
        Commands::Config {
            set_timezone,
            set_l5_hours,
            set_m10_hours,
            set_weekdays,
            set_weekends,
            set_workers,
        } => cmd_config(
            set_timezone,
            set_l5_hours,
            set_m10_hours,
            set_weekdays,
            set_weekends,
            set_workers,
        ),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Outcome of one recording in a batch.
struct JobResult {
    input: PathBuf,
    outcome: Result<PathBuf>,
}

fn cmd_analyze(
    files: Vec<PathBuf>,
    output: Option<PathBuf>,
    workers: Option<usize>,
    weekday: bool,
    weekend: bool,
) -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let circadian = config.circadian()?;

    let selection = if weekday || weekend {
        DaySelection {
            weekdays: weekday,
            weekends: weekend,
        }
    } else {
        config.days
    };
    let export_dir = output.unwrap_or_else(|| config.export_path.clone());
    std::fs::create_dir_all(&export_dir)
        .with_context(|| format!("failed to create {}", export_dir.display()))?;

    let workers = workers.unwrap_or(config.workers).clamp(1, files.len().max(1));
    let run_log = create_shared_log_with_persistence(config.run_log_path());
    let builder = ReportBuilder::new(circadian).with_days(selection);
    let names = ReportNames::new();

    info!(
        recordings = files.len(),
        workers,
        weekdays = selection.weekdays,
        weekends = selection.weekends,
        instance = %builder.instance_id(),
        "starting analysis"
    );

    let (job_tx, job_rx) = bounded::<PathBuf>(workers * 2);
    let (result_tx, result_rx) = unbounded::<JobResult>();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let builder = &builder;
            let run_log = &run_log;
            let names = &names;
            let export_dir = export_dir.as_path();
            let tz = config.timezone;
            scope.spawn(move || {
                for input in job_rx {
                    let outcome = analyze_file(&input, export_dir, tz, builder, names, run_log);
                    if result_tx.send(JobResult { input, outcome }).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        for file in files {
            if job_tx.send(file).is_err() {
                break;
            }
        }
        drop(job_tx);
    });

    let mut failed = 0;
    for result in result_rx {
        match result.outcome {
            Ok(path) => println!("{} -> {}", result.input.display(), path.display()),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {e:#}", result.input.display());
            }
        }
    }

    if let Err(e) = run_log.save() {
        warn!("failed to save run statistics: {e}");
    }

    println!();
    println!("{}", run_log.summary());

    if failed > 0 {
        bail!("{failed} recording(s) failed");
    }
    Ok(())
}

fn analyze_file(
    input: &Path,
    export_dir: &Path,
    default_tz: Tz,
    builder: &ReportBuilder,
    names: &ReportNames,
    run_log: &SharedRunLog,
) -> Result<PathBuf> {
    let outcome = write_report(input, export_dir, default_tz, builder, names, run_log);
    match &outcome {
        Ok(_) => run_log.record_processed(),
        Err(e) => {
            error!(input = %input.display(), "analysis failed: {e:#}");
            run_log.record_failed();
        }
    }
    outcome
}

fn write_report(
    input: &Path,
    export_dir: &Path,
    default_tz: Tz,
    builder: &ReportBuilder,
    names: &ReportNames,
    run_log: &RunLog,
) -> Result<PathBuf> {
    let recording = load_recording(input, default_tz)?;
    run_log.record_samples(recording.sample_count() as u64);

    let report: BiomarkerReport = builder.build(&recording)?;
    if let Some(vmc) = &report.vmc {
        run_log.record_buckets(vmc.summary.buckets as u64, vmc.summary.empty_buckets as u64);
    }
    for reading in report.readings.iter().filter(|r| !r.is_available()) {
        warn!(
            participant = %report.participant,
            marker = ?reading.marker,
            signal = ?reading.signal,
            "marker unavailable: {}",
            reading.error.as_deref().unwrap_or_default()
        );
    }

    let path = export_dir.join(names.claim(&report.participant));
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn cmd_vmc(file: &Path, from: DateTime<Utc>, to: DateTime<Utc>, format: &str) -> Result<()> {
    if to <= from {
        bail!("--to must be after --from");
    }
    let config = Config::load().context("failed to load configuration")?;
    let recording = load_recording(file, config.timezone)?;
    let tz = recording.tz;

    let vmc = compute_vmc_range(recording.magnitude.view(), from, to);
    info!(buckets = vmc.len(), "computed VMC range");

    let entries: Vec<serde_json::Value> = vmc
        .entries()
        .map(|(key, value)| {
            serde_json::json!({
                "timestamp": key.with_timezone(&tz).to_rfc3339(),
                "value": value,
            })
        })
        .collect();

    match format {
        "jsonl" => {
            for entry in &entries {
                println!("{entry}");
            }
        }
        "json" => {
            let body = serde_json::json!({
                "participant": recording.participant,
                "summary": vmc.summary(),
                "entries": entries,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        other => bail!("unknown format {other:?} (expected json or jsonl)"),
    }
    Ok(())
}

fn cmd_status(reset: bool) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let stats_path = config.run_log_path();

    println!("Circadian Biomarkers Status");
    println!("===========================");
    println!();

    println!("Configuration:");
    println!("  Time zone: {}", config.timezone);
    println!(
        "  Windows: L5 {}h, M10 {}h",
        config.l5_window.num_hours(),
        config.m10_window.num_hours()
    );
    println!(
        "  Days: weekdays {}, weekends {}",
        if config.days.weekdays { "on" } else { "off" },
        if config.days.weekends { "on" } else { "off" }
    );
    println!("  Reports: {}", config.export_path.display());
    println!();

    if !stats_path.exists() {
        println!("No previous run data found.");
        return Ok(());
    }

    let run_log = RunLog::with_persistence(stats_path);
    if reset {
        run_log.reset();
        run_log.save().context("failed to save run statistics")?;
        println!("Run statistics reset.");
        return Ok(());
    }

    let stats = run_log.stats();
    println!("Cumulative Statistics:");
    println!("  Recordings processed: {}", stats.recordings_processed);
    println!("  Recordings failed: {}", stats.recordings_failed);
    println!("  Samples ingested: {}", stats.samples_ingested);
    println!(
        "  VMC buckets: {} ({} without data)",
        stats.buckets_emitted, stats.empty_buckets
    );
    Ok(())
}

fn cmd_config(
    timezone: Option<String>,
    l5_hours: Option<i64>,
    m10_hours: Option<i64>,
    weekdays: Option<bool>,
    weekends: Option<bool>,
    workers: Option<usize>,
) -> Result<()> {
    let mut config = Config::load().context("failed to load configuration")?;
    let mut changed = false;

    if let Some(name) = timezone {
        config.timezone = name
            .parse::<Tz>()
            .map_err(|e| anyhow!("unknown time zone {name:?}: {e}"))?;
        changed = true;
    }
    if let Some(hours) = l5_hours {
        config.l5_window = window_hours(hours)?;
        changed = true;
    }
    if let Some(hours) = m10_hours {
        config.m10_window = window_hours(hours)?;
        changed = true;
    }
    if let Some(on) = weekdays {
        config.days.weekdays = on;
        changed = true;
    }
    if let Some(on) = weekends {
        config.days.weekends = on;
        changed = true;
    }
    if let Some(n) = workers {
        config.workers = n;
        changed = true;
    }

    if changed {
        config.save().context("failed to save configuration")?;
        println!("Configuration updated.");
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn window_hours(hours: i64) -> Result<Duration> {
    Duration::try_hours(hours).ok_or_else(|| anyhow!("window of {hours} hours is out of range"))
}

//! Circadian Biomarkers - rest/activity markers from wearable recordings.
//!
//! This library computes circadian and activity biomarkers from time series
//! recorded by wrist-worn accelerometers and heart-rate sensors:
//!
//! - **L5**: midpoint of the least active five hours of the day
//! - **M10**: midpoint of the most active ten hours of the day
//! - **VMC**: per-minute mean absolute deviation of acceleration magnitude
//!
//! All timestamps are instants; the time zone attached to a series decides
//! where local midnight and wall-clock minute marks fall, including across
//! DST transitions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Circadian Biomarkers                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │    Input    │──▶│  Magnitude  │──▶│  Day chunks │       │
//! │  │   (JSON)    │   │  (x, y, z)  │   │ (midnights) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                │                   │              │
//! │         ▼                ▼                   ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Calendar   │   │  VMC minute │   │  L5 / M10   │       │
//! │  │ (day split) │   │   buckets   │   │  windows    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                          │                   │              │
//! │                          ▼                   ▼              │
//! │                    ┌───────────────────────────┐            │
//! │                    │     Biomarker report      │            │
//! │                    └───────────────────────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use circadian_biomarkers::{core, input};
//! use std::path::Path;
//!
//! let recording = input::load_recording(Path::new("P001.json"), chrono_tz::Tz::UTC)?;
//! let l5 = core::compute_l5(recording.magnitude.view())?;
//! println!("L5 at {}", l5.time_of_day(recording.tz));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod input;
pub mod report;
pub mod series;

// Re-export key types at crate root for convenience
pub use audit::{RunLog, RunStats, SharedRunLog};
pub use config::{Config, ConfigError};
pub use core::{
    compute_l5, compute_m10, compute_vmc, BiomarkerError, CircadianConfig, DaySelection,
    ExtremumTime, VmcSeries,
};
pub use input::{load_recording, InputError, Recording};
pub use report::{BiomarkerReport, ReportBuilder};
pub use series::{Sample, SeriesError, SeriesView, TimeSeries};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core biomarker computations.
//!
//! This module contains:
//! - Vector magnitude of triaxial acceleration
//! - Sliding windows and extremum search (L5, M10)
//! - Day chunking at local midnight with cross-day averaging
//! - Clock-aligned minute buckets for VMC
//! - Weekday/weekend day selection
//!
//! Everything here is a pure function of its arguments: no I/O, no clock
//! reads, no state kept between calls.

pub mod calendar;
pub mod circadian;
pub mod days;
pub mod error;
pub mod magnitude;
pub mod vmc;
pub mod windowing;

// Re-export commonly used types
pub use calendar::{select_days, DayPartition, DaySelection, RecordingPeriod};
pub use circadian::{
    compute_l5, compute_m10, extremum_time, least_active, most_active, CircadianConfig,
    ExtremumTime, L5_WINDOW_HOURS, M10_WINDOW_HOURS,
};
pub use days::{aggregate_by_day, day_segments, DaySegment, DaySegments};
pub use error::BiomarkerError;
pub use magnitude::{magnitude, vector_magnitude};
pub use vmc::{
    bucketize, compute_vmc, compute_vmc_for_days, compute_vmc_range, MinuteBucket, VmcSeries,
    VmcSummary,
};
pub use windowing::{find_extremum, scan, Extremum, WindowAverage, WindowScan};

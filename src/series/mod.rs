//! Time series containers consumed by the biomarker core.
//!
//! Acquisition (database queries, file parsing) happens elsewhere; this
//! module only defines the validated, already-fetched shape of the data.

pub mod types;

// Re-export commonly used types
pub use types::{Sample, SeriesError, SeriesView, TimeSeries};

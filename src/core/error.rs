//! Errors returned by the biomarker computations.
//!
//! Every condition here is recoverable: batch callers log the error for one
//! participant and move on to the next.

use crate::series::SeriesError;
use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BiomarkerError {
    #[error(
        "series spans {} min, shorter than the {} min window",
        .actual.num_minutes(),
        .required.num_minutes()
    )]
    InsufficientSpan { required: Duration, actual: Duration },

    #[error("acceleration channels are misaligned at sample {index}: {reason}")]
    MisalignedChannels { index: usize, reason: String },

    #[error("day selection is empty: enable weekdays, weekends or both")]
    EmptyDaySelection,

    #[error(transparent)]
    Series(#[from] SeriesError),
}

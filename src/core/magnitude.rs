//! Vector magnitude of triaxial acceleration.
//!
//! The three channels arrive as separate series (one per axis) and must be
//! sampled at exactly the same instants. Aligning them is the data source's
//! job; here we only verify it and refuse to guess.

use crate::core::error::BiomarkerError;
use crate::series::{Sample, SeriesView, TimeSeries};

/// Euclidean norm of a single triaxial reading.
pub fn vector_magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Combine lateral, longitudinal and vertical channels into `sqrt(x² + y² + z²)`.
///
/// Missing values (NaN) on any axis propagate to a missing magnitude for that
/// instant.
pub fn magnitude(
    lateral: SeriesView<'_>,
    longitudinal: SeriesView<'_>,
    vertical: SeriesView<'_>,
) -> Result<TimeSeries, BiomarkerError> {
    if lateral.len() != longitudinal.len() || lateral.len() != vertical.len() {
        let index = lateral.len().min(longitudinal.len()).min(vertical.len());
        return Err(BiomarkerError::MisalignedChannels {
            index,
            reason: format!(
                "channel lengths differ (lateral {}, longitudinal {}, vertical {})",
                lateral.len(),
                longitudinal.len(),
                vertical.len()
            ),
        });
    }

    let mut samples = Vec::with_capacity(lateral.len());
    for (index, ((x, y), z)) in lateral
        .into_iter()
        .zip(longitudinal)
        .zip(vertical)
        .enumerate()
    {
        if x.timestamp != y.timestamp || x.timestamp != z.timestamp {
            return Err(BiomarkerError::MisalignedChannels {
                index,
                reason: format!(
                    "timestamps differ (lateral {}, longitudinal {}, vertical {})",
                    x.timestamp, y.timestamp, z.timestamp
                ),
            });
        }
        samples.push(Sample::new(
            x.timestamp,
            vector_magnitude(x.value, y.value, z.value),
        ));
    }

    Ok(TimeSeries::new(samples, lateral.tz())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use chrono_tz::Tz;

    fn channel(values: &[f64], offset_secs: i64) -> TimeSeries {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TimeSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Duration::seconds(i as i64 + offset_secs), v)),
            Tz::UTC,
        )
        .unwrap()
    }

    #[test]
    fn test_pythagorean_magnitude() {
        assert_eq!(vector_magnitude(3.0, 4.0, 0.0), 5.0);
        assert_eq!(vector_magnitude(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_magnitude_series() {
        let x = channel(&[3.0, 0.0, 1.0], 0);
        let y = channel(&[4.0, 0.0, 2.0], 0);
        let z = channel(&[0.0, 0.0, 2.0], 0);

        let r = magnitude(x.view(), y.view(), z.view()).unwrap();
        let values: Vec<f64> = r.samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![5.0, 0.0, 3.0]);
        assert_eq!(r.samples()[1].timestamp, x.samples()[1].timestamp);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let x = channel(&[1.0, 1.0], 0);
        let y = channel(&[1.0], 0);
        let z = channel(&[1.0, 1.0], 0);

        let err = magnitude(x.view(), y.view(), z.view()).unwrap_err();
        assert!(matches!(err, BiomarkerError::MisalignedChannels { index: 1, .. }));
    }

    #[test]
    fn test_rejects_timestamp_mismatch() {
        let x = channel(&[1.0, 1.0], 0);
        let y = channel(&[1.0, 1.0], 0);
        let z = channel(&[1.0, 1.0], 1);

        let err = magnitude(x.view(), y.view(), z.view()).unwrap_err();
        assert!(matches!(err, BiomarkerError::MisalignedChannels { index: 0, .. }));
    }

    #[test]
    fn test_missing_axis_propagates() {
        let x = channel(&[f64::NAN], 0);
        let y = channel(&[1.0], 0);
        let z = channel(&[1.0], 0);

        let r = magnitude(x.view(), y.view(), z.view()).unwrap();
        assert!(r.samples()[0].is_missing());
    }
}

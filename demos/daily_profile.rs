//! Demonstration of the circadian biomarker pipeline on synthetic data.
//!
//! This example shows how to:
//! 1. Build triaxial acceleration series for three days
//! 2. Combine them into a magnitude series
//! 3. Compute L5 and M10
//! 4. Compute VMC for the whole recording
//! 5. Generate a biomarker report
//!
//! Run with: cargo run --example daily_profile

use chrono::{Duration, TimeZone, Utc};
use circadian_biomarkers::{
    core::{
        compute_l5, compute_m10, compute_vmc, days::next_local_midnight, magnitude,
        CircadianConfig, RecordingPeriod,
    },
    input::Recording,
    report::ReportBuilder,
    series::TimeSeries,
};

fn main() {
    println!("Circadian Biomarkers - Daily Profile Demo");
    println!("=========================================");
    println!();

    let tz = chrono_tz::Europe::Berlin;
    // Thursday evening to Sunday evening, one sample every 30 seconds.
    let start = tz
        .with_ymd_and_hms(2024, 1, 4, 18, 0, 0)
        .single()
        .map(|local| local.with_timezone(&Utc));
    let Some(start) = start else {
        eprintln!("Start time is ambiguous in {tz}");
        return;
    };
    let samples = 3 * 24 * 120;

    let axis = |phase: f64| -> TimeSeries {
        let pairs = (0..samples).map(|i| {
            let at = start + Duration::seconds(30 * i);
            let hour = (18.0 + i as f64 / 120.0) % 24.0;
            // Quiet from 23:00 to 07:00, busiest mid-afternoon.
            let awake = (7.0..23.0).contains(&hour);
            let level = if awake {
                1.0 + (std::f64::consts::PI * (hour - 7.0) / 16.0).sin()
            } else {
                0.05
            };
            (at, level * (1.0 + 0.3 * ((i as f64) * 0.7 + phase).sin()))
        });
        TimeSeries::from_pairs(pairs, tz).expect("synthetic samples are ordered")
    };

    let (x, y, z) = (axis(0.0), axis(2.1), axis(4.2));
    let activity = match magnitude(x.view(), y.view(), z.view()) {
        Ok(series) => series,
        Err(e) => {
            eprintln!("Error combining channels: {e}");
            return;
        }
    };
    println!("Samples: {}", activity.len());
    println!();

    match compute_l5(activity.view()) {
        Ok(l5) => println!("L5:  {} (averaged over {} days)", l5.time_of_day(tz), l5.days),
        Err(e) => println!("L5:  unavailable ({e})"),
    }
    match compute_m10(activity.view()) {
        Ok(m10) => println!("M10: {} (averaged over {} days)", m10.time_of_day(tz), m10.days),
        Err(e) => println!("M10: unavailable ({e})"),
    }
    println!();

    let vmc = compute_vmc(activity.view(), start);
    let summary = vmc.summary();
    println!("VMC buckets: {} ({} empty)", summary.buckets, summary.empty_buckets);
    if let (Some(mean), Some(max)) = (summary.mean, summary.max) {
        println!("VMC mean: {mean:.4}, max: {max:.4}");
    }
    println!();

    // The period ends at the midnight after the last sample so Sunday counts.
    let end = next_local_midnight(activity.view().last().unwrap_or(start), tz);
    let recording = Recording {
        participant: "demo".to_string(),
        tz,
        period: RecordingPeriod::new(start, end).with_calendar_weekends(tz),
        heart_rate: TimeSeries::empty(tz),
        magnitude: activity,
    };

    let builder = ReportBuilder::new(CircadianConfig::default());
    match builder.build_json(&recording) {
        Ok(json) => {
            let preview: String = json.lines().take(30).collect::<Vec<_>>().join("\n");
            println!("Report (first 30 lines):");
            println!("{preview}");
        }
        Err(e) => eprintln!("Error building report: {e}"),
    }
}

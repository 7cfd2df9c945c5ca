//! Generate a synthetic two-throw recording and print its report

use std::f64::consts::TAU;

use airtime::types::GRAVITY;
use airtime::{Sample, ThrowTracker};

const MS: i64 = 1_000_000;

/// Resting hand, launch, `flight_ms` of free fall spinning `turns_per_s` about x,
/// then a catch at `catch_g`
fn throw(start_ns: i64, flight_ms: i64, turns_per_s: f64, catch_g: f64) -> Vec<Sample> {
    let accel =
        |t_ms: i64, g: f64| Sample::accelerometer([0.0, 0.0, g * GRAVITY], start_ns + t_ms * MS);
    let mut samples = Vec::new();

    for t in (0..100).step_by(10) {
        samples.push(accel(t, 1.0));
    }
    samples.push(accel(100, 2.5));
    for t in (110..110 + flight_ms).step_by(10) {
        samples.push(accel(t, 0.1));
    }
    samples.push(accel(110 + flight_ms, catch_g));
    for t in (120 + flight_ms..300 + flight_ms).step_by(10) {
        samples.push(accel(t, 1.0));
    }

    for t in (5..300 + flight_ms).step_by(10) {
        samples.push(Sample::gyroscope([turns_per_s * TAU, 0.0, 0.0], start_ns + t * MS));
    }

    samples.sort_by_key(|s| s.timestamp_ns);
    samples
}

fn main() {
    let mut tracker = ThrowTracker::new();

    let session = throw(0, 800, 2.0, 3.5)
        .into_iter()
        .chain(throw(2_000 * MS, 1_200, 1.0, 9.0));

    for sample in session {
        if let Some(record) = tracker.process_sample(&sample) {
            println!(
                "throw {}: {:.2}s, {:.2}m, {} spins, {} catch",
                record.id,
                record.flight_time_seconds,
                record.max_height_meters,
                record.rotation_count.total(),
                record.catch_quality.as_str()
            );
        }
    }

    match tracker.report_json("demo-device") {
        Ok(report) => print!("{report}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}

//! Derived throw metrics
//!
//! Pure functions applied once per throw at finalization:
//! - Flight time from sensor-clock timestamps
//! - Peak height from flight time
//! - Whole revolutions per axis
//! - Catch quality tier

use std::f64::consts::TAU;

use crate::types::{AxisRotation, CatchQuality, RotationCounts, NANOS_PER_SECOND};

/// Slack (in revolutions) absorbed before truncating, so a spin that
/// integrates to 2π minus rounding error still counts as one turn.
const REVOLUTION_EPSILON: f64 = 1e-9;

/// Elapsed seconds between two sensor-clock timestamps
///
/// Regressions clamp to zero. A missing start yields zero.
pub fn elapsed_seconds(start_ns: Option<i64>, end_ns: i64) -> f64 {
    match start_ns {
        Some(start) => end_ns.saturating_sub(start).max(0) as f64 / NANOS_PER_SECOND,
        None => 0.0,
    }
}

/// Release to catch duration (seconds)
pub fn flight_time_seconds(flight_start_ns: Option<i64>, caught_at_ns: i64) -> f64 {
    elapsed_seconds(flight_start_ns, caught_at_ns)
}

/// Peak height of a body in free flight for total airtime T: g·T²/8
///
/// The body rises for T/2 and falls for T/2; h = ½·g·(T/2)².
pub fn max_height_meters(flight_time_seconds: f64, gravity: f64) -> f64 {
    gravity * flight_time_seconds * flight_time_seconds / 8.0
}

/// Whole revolutions in an accumulated angle; sign discarded, fractions truncated
pub fn rotation_count(angle_rad: f64) -> u32 {
    let revolutions = angle_rad.abs() / TAU + REVOLUTION_EPSILON;
    if revolutions.is_finite() {
        revolutions.floor() as u32
    } else {
        0
    }
}

pub fn rotation_counts(rotation: &AxisRotation) -> RotationCounts {
    RotationCounts {
        x: rotation_count(rotation.x),
        y: rotation_count(rotation.y),
        z: rotation_count(rotation.z),
    }
}

/// Map a peak catch acceleration (m/s²) to a quality tier
///
/// `boundaries` are the inclusive lower bounds (m/s²) of the second, third
/// and worst tiers.
pub fn catch_quality(peak_accel: f64, boundaries: [f64; 3]) -> CatchQuality {
    let [firm, hard, harsh] = boundaries;
    if peak_accel >= harsh {
        CatchQuality::Harsh
    } else if peak_accel >= hard {
        CatchQuality::Hard
    } else if peak_accel >= firm {
        CatchQuality::Firm
    } else {
        CatchQuality::Soft
    }
}

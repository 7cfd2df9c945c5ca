//! Core types for Airtime
//!
//! This module defines the data that flows through the classifier: raw sensor
//! samples in, motion states and finalized throw records out.

use serde::{Deserialize, Serialize};

/// Standard gravitational acceleration (m/s²), the unit for all thresholds
pub const GRAVITY: f64 = 9.81;

/// Nanoseconds per second on the sensor clock
pub const NANOS_PER_SECOND: f64 = 1e9;

/// Sensor channel a sample was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannel {
    /// Linear acceleration including gravity (m/s²)
    Accelerometer,
    /// Angular velocity (rad/s)
    Gyroscope,
}

impl SensorChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorChannel::Accelerometer => "accelerometer",
            SensorChannel::Gyroscope => "gyroscope",
        }
    }
}

/// A single sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Channel the reading came from
    pub channel: SensorChannel,
    /// Three components in the sensor's native axes
    pub values: [f64; 3],
    /// Monotonic sensor-clock timestamp (nanoseconds, not wall-clock)
    pub timestamp_ns: i64,
}

impl Sample {
    pub fn accelerometer(values: [f64; 3], timestamp_ns: i64) -> Self {
        Self {
            channel: SensorChannel::Accelerometer,
            values,
            timestamp_ns,
        }
    }

    pub fn gyroscope(values: [f64; 3], timestamp_ns: i64) -> Self {
        Self {
            channel: SensorChannel::Gyroscope,
            values,
            timestamp_ns,
        }
    }

    /// Euclidean norm of the three components
    pub fn magnitude(&self) -> f64 {
        let [x, y, z] = self.values;
        (x * x + y * y + z * z).sqrt()
    }
}

/// Discrete motion state of the tracked device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    /// Resting or being handled normally
    #[default]
    Idle,
    /// Launch acceleration observed, waiting for release
    Throwing,
    /// Airborne; gyroscope integration is active
    FreeFlight,
    /// Impact observed. Transient: the classifier returns to `Idle` in the
    /// same step, so this is never the current state between calls.
    Catching,
}

impl MotionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionState::Idle => "idle",
            MotionState::Throwing => "throwing",
            MotionState::FreeFlight => "free_flight",
            MotionState::Catching => "catching",
        }
    }

    /// Stable integer code used across the C ABI
    pub fn code(&self) -> i32 {
        match self {
            MotionState::Idle => 0,
            MotionState::Throwing => 1,
            MotionState::FreeFlight => 2,
            MotionState::Catching => 3,
        }
    }
}

/// Ordered catch severity, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchQuality {
    /// Peak below the first boundary (4g by default)
    Soft,
    /// [4g, 6g)
    Firm,
    /// [6g, 8g)
    Hard,
    /// 8g and above
    Harsh,
}

impl CatchQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatchQuality::Soft => "soft",
            CatchQuality::Firm => "firm",
            CatchQuality::Hard => "hard",
            CatchQuality::Harsh => "harsh",
        }
    }
}

/// Running per-axis angle totals (radians)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisRotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AxisRotation {
    /// Add `angular_velocity * dt` to each axis
    pub fn integrate(&mut self, angular_velocity: [f64; 3], dt_seconds: f64) {
        self.x += angular_velocity[0] * dt_seconds;
        self.y += angular_velocity[1] * dt_seconds;
        self.z += angular_velocity[2] * dt_seconds;
    }
}

/// Whole revolutions per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RotationCounts {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl RotationCounts {
    /// Sum over all axes, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        self.x.saturating_add(self.y).saturating_add(self.z)
    }
}

/// Statistics for one completed throw
///
/// Built once at the catch transition and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowRecord {
    /// Sequence number within one classifier, starting at 1
    pub id: u64,
    /// Whole revolutions per axis during the flight
    pub rotation_count: RotationCounts,
    /// Raw integrated angle per axis (radians)
    pub accumulated_rotation_rad: AxisRotation,
    /// Release to catch (seconds)
    pub flight_time_seconds: f64,
    /// Projectile estimate g·T²/8 (meters)
    pub max_height_meters: f64,
    /// Largest accelerometer magnitude seen during flight and catch (m/s²)
    pub peak_catch_accel_magnitude: f64,
    pub catch_quality: CatchQuality,
    /// Sensor-clock timestamp of the launch spike
    pub throw_started_at_ns: Option<i64>,
    /// Sensor-clock timestamp of release
    pub flight_started_at_ns: Option<i64>,
    /// Sensor-clock timestamp of the catch
    pub caught_at_ns: i64,
}

/// Result of feeding one accelerometer sample to the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// State in effect after the sample
    pub state: MotionState,
    /// Present only on the step that finalized a throw
    pub record: Option<ThrowRecord>,
}

// ============================================================================
// Report output
// ============================================================================

/// Throw report payload handed to presentation layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrowReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub summary: ReportSummary,
    /// Completed throws, most recent first
    pub throws: Vec<ThrowRecord>,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub device_id: String,
    pub computed_at_utc: String,
    /// Sensor-clock span covered by the reported throws
    pub first_throw_at_ns: Option<i64>,
    pub last_catch_at_ns: Option<i64>,
}

/// Aggregates over the reported throws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub throw_count: usize,
    pub total_flight_time_seconds: f64,
    pub longest_flight_seconds: Option<f64>,
    pub highest_throw_meters: Option<f64>,
    pub total_rotations: u32,
    pub best_catch: Option<CatchQuality>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_magnitude() {
        let sample = Sample::accelerometer([3.0, 4.0, 12.0], 0);
        assert!((sample.magnitude() - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_magnitude_propagates() {
        let sample = Sample::accelerometer([f64::NAN, 0.0, 0.0], 0);
        assert!(sample.magnitude().is_nan());
    }

    #[test]
    fn test_catch_quality_ordering() {
        assert!(CatchQuality::Soft < CatchQuality::Firm);
        assert!(CatchQuality::Firm < CatchQuality::Hard);
        assert!(CatchQuality::Hard < CatchQuality::Harsh);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&MotionState::FreeFlight).unwrap();
        assert_eq!(json, "\"free_flight\"");
        let back: MotionState = serde_json::from_str("\"throwing\"").unwrap();
        assert_eq!(back, MotionState::Throwing);
    }

    #[test]
    fn test_rotation_total_saturates() {
        let counts = RotationCounts {
            x: u32::MAX,
            y: u32::MAX,
            z: 3,
        };
        assert_eq!(counts.total(), u32::MAX);
        assert_eq!(RotationCounts { x: 1, y: 2, z: 3 }.total(), 6);
    }

    #[test]
    fn test_axis_integration() {
        let mut rotation = AxisRotation::default();
        rotation.integrate([1.0, -2.0, 0.5], 0.5);
        assert_eq!(rotation.x, 0.5);
        assert_eq!(rotation.y, -1.0);
        assert_eq!(rotation.z, 0.25);
    }
}

//! motion.raw_sample.v1 schema definition
//!
//! One record per sensor reading, as captured from the host's sensor
//! callbacks. Recordings are usually NDJSON with both channels interleaved
//! in arrival order.

use serde::{Deserialize, Serialize};

use crate::types::{Sample, SensorChannel};

/// Current schema version
pub const SCHEMA_VERSION: &str = "motion.raw_sample.v1";

/// Sensor-reported accuracy, mirroring the host platform's status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorAccuracy {
    Unreliable,
    Low,
    Medium,
    High,
}

/// A single recorded sensor reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSample {
    /// Schema version identifier
    pub schema_version: String,
    /// Unique sample identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_id: Option<String>,
    /// Channel the reading came from
    pub sensor: SensorChannel,
    /// Monotonic sensor-clock timestamp (nanoseconds)
    pub timestamp_ns: i64,
    /// [x, y, z] in m/s² (accelerometer) or rad/s (gyroscope)
    pub values: [f64; 3],
    /// Recording device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<SensorAccuracy>,
}

impl RawSample {
    pub fn new(sensor: SensorChannel, values: [f64; 3], timestamp_ns: i64) -> Self {
        RawSample {
            schema_version: SCHEMA_VERSION.to_string(),
            sample_id: Some(uuid::Uuid::new_v4().to_string()),
            sensor,
            timestamp_ns,
            values,
            device_id: None,
            accuracy: None,
        }
    }

    pub fn from_sample(sample: &Sample) -> Self {
        Self::new(sample.channel, sample.values, sample.timestamp_ns)
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_accuracy(mut self, accuracy: SensorAccuracy) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// The classifier-facing sample
    pub fn to_sample(&self) -> Sample {
        Sample {
            channel: self.sensor,
            values: self.values,
            timestamp_ns: self.timestamp_ns,
        }
    }

    /// Validate a single record in isolation
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if self.timestamp_ns < 0 {
            return Err(ValidationError::NegativeTimestamp(self.timestamp_ns));
        }

        Ok(())
    }
}

/// Validation errors for raw samples
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Negative timestamp: {0} ns")]
    NegativeTimestamp(i64),

    #[error("{channel} timestamp went backwards: {timestamp_ns} ns after {previous_ns} ns")]
    NonMonotonicTimestamp {
        channel: String,
        timestamp_ns: i64,
        previous_ns: i64,
    },

    #[error("{channel} sample at {timestamp_ns} ns reported unreliable accuracy")]
    UnreliableAccuracy { channel: String, timestamp_ns: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_sample() {
        let raw = RawSample::new(SensorChannel::Gyroscope, [0.1, 0.2, 0.3], 42)
            .with_device_id("pixel-7")
            .with_accuracy(SensorAccuracy::High);
        let json = serde_json::to_string(&raw).unwrap();

        assert!(json.contains("motion.raw_sample.v1"));
        assert!(json.contains("\"sensor\":\"gyroscope\""));
        assert!(json.contains("\"accuracy\":\"high\""));
        assert!(json.contains("pixel-7"));
    }

    #[test]
    fn test_deserialize_minimal_sample() {
        let json = r#"{
            "schema_version": "motion.raw_sample.v1",
            "sensor": "accelerometer",
            "timestamp_ns": 1500000000,
            "values": [0.0, 9.81, 0.0]
        }"#;

        let raw: RawSample = serde_json::from_str(json).unwrap();
        assert!(raw.validate().is_ok());
        assert!(raw.sample_id.is_none());
        assert!(raw.accuracy.is_none());

        let sample = raw.to_sample();
        assert_eq!(sample.channel, SensorChannel::Accelerometer);
        assert_eq!(sample.timestamp_ns, 1_500_000_000);
        assert!((sample.magnitude() - 9.81).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_unknown_sensor() {
        let json = r#"{
            "schema_version": "motion.raw_sample.v1",
            "sensor": "magnetometer",
            "timestamp_ns": 0,
            "values": [0.0, 0.0, 0.0]
        }"#;
        assert!(serde_json::from_str::<RawSample>(json).is_err());
    }

    #[test]
    fn test_validation_schema_version() {
        let mut raw = RawSample::new(SensorChannel::Accelerometer, [0.0; 3], 0);
        raw.schema_version = "motion.raw_sample.v0".to_string();
        assert!(matches!(
            raw.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_validation_negative_timestamp() {
        let raw = RawSample::new(SensorChannel::Accelerometer, [0.0; 3], -5);
        assert_eq!(raw.validate(), Err(ValidationError::NegativeTimestamp(-5)));
    }
}

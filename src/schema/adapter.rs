//! Adapter for converting motion.raw_sample.v1 records into classifier samples

use std::collections::HashMap;

use crate::error::AirtimeError;
use crate::schema::raw_sample::*;
use crate::types::{Sample, SensorChannel};

/// Adapter for parsing and checking recorded sample streams
pub struct RawSampleAdapter;

impl RawSampleAdapter {
    /// Parse a JSON string containing an array of RawSamples
    pub fn parse_array(json: &str) -> Result<Vec<RawSample>, AirtimeError> {
        let samples: Vec<RawSample> = serde_json::from_str(json)?;
        Ok(samples)
    }

    /// Parse NDJSON (newline-delimited JSON) containing RawSamples
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawSample>, AirtimeError> {
        let mut samples = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawSample>(trimmed) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    return Err(AirtimeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(samples)
    }

    /// Convert raw records to classifier samples, keeping arrival order
    ///
    /// Fails on the first record that does not validate on its own. Ordering
    /// across records is not enforced here; see `validate_samples`.
    pub fn to_samples(raw: &[RawSample]) -> Result<Vec<Sample>, AirtimeError> {
        raw.iter()
            .enumerate()
            .map(|(idx, r)| {
                r.validate()
                    .map(|()| r.to_sample())
                    .map_err(|e| AirtimeError::InvalidSample(format!("record {idx}: {e}")))
            })
            .collect()
    }

    /// Validate a batch of records, including per-channel timestamp order
    ///
    /// Samples the sensor itself marked `Unreliable` are flagged here, but
    /// `to_samples` still accepts them.
    pub fn validate_samples(raw: &[RawSample]) -> Vec<ValidationResult> {
        let mut last_seen: HashMap<SensorChannel, i64> = HashMap::new();
        let mut results = Vec::new();

        for (idx, r) in raw.iter().enumerate() {
            let mut error = r.validate().err();

            if let Some(&previous) = last_seen.get(&r.sensor) {
                if error.is_none() && r.timestamp_ns < previous {
                    error = Some(ValidationError::NonMonotonicTimestamp {
                        channel: r.sensor.as_str().to_string(),
                        timestamp_ns: r.timestamp_ns,
                        previous_ns: previous,
                    });
                }
            }
            if error.is_none() && r.accuracy == Some(SensorAccuracy::Unreliable) {
                error = Some(ValidationError::UnreliableAccuracy {
                    channel: r.sensor.as_str().to_string(),
                    timestamp_ns: r.timestamp_ns,
                });
            }

            let entry = last_seen.entry(r.sensor).or_insert(r.timestamp_ns);
            *entry = (*entry).max(r.timestamp_ns);

            if error.is_some() {
                results.push(ValidationResult {
                    index: idx,
                    sample_id: r.sample_id.clone(),
                    result: error,
                });
            }
        }

        results
    }
}

/// Result of sample validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub sample_id: Option<String>,
    pub result: Option<ValidationError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(sensor: &str, ts: i64, values: [f64; 3]) -> String {
        serde_json::json!({
            "schema_version": "motion.raw_sample.v1",
            "sensor": sensor,
            "timestamp_ns": ts,
            "values": values,
        })
        .to_string()
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let ndjson = [
            line("accelerometer", 0, [0.0, 0.0, 9.81]),
            String::new(),
            line("gyroscope", 5, [0.1, 0.0, 0.0]),
            "   ".to_string(),
        ]
        .join("\n");

        let samples = RawSampleAdapter::parse_ndjson(&ndjson).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].sensor, SensorChannel::Gyroscope);
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let ndjson = format!("{}\nnot json\n", line("accelerometer", 0, [0.0; 3]));
        let err = RawSampleAdapter::parse_ndjson(&ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let json = format!(
            "[{},{}]",
            line("accelerometer", 0, [0.0; 3]),
            line("accelerometer", 10, [1.0, 0.0, 0.0])
        );
        let samples = RawSampleAdapter::parse_array(&json).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn test_to_samples_keeps_order() {
        let raw = vec![
            RawSample::new(SensorChannel::Gyroscope, [1.0, 0.0, 0.0], 20),
            RawSample::new(SensorChannel::Accelerometer, [0.0, 0.0, 9.81], 10),
        ];
        let samples = RawSampleAdapter::to_samples(&raw).unwrap();
        assert_eq!(samples[0].channel, SensorChannel::Gyroscope);
        assert_eq!(samples[1].timestamp_ns, 10);
    }

    #[test]
    fn test_to_samples_rejects_invalid_record() {
        let raw = vec![
            RawSample::new(SensorChannel::Accelerometer, [0.0; 3], 0),
            RawSample::new(SensorChannel::Accelerometer, [0.0; 3], -1),
        ];
        let err = RawSampleAdapter::to_samples(&raw).unwrap_err();
        assert!(matches!(err, AirtimeError::InvalidSample(msg) if msg.contains("record 1")));
    }

    #[test]
    fn test_interleaved_channels_are_monotonic_per_channel() {
        // The gyroscope stream lags the accelerometer; that is fine
        let raw = vec![
            RawSample::new(SensorChannel::Accelerometer, [0.0; 3], 100),
            RawSample::new(SensorChannel::Gyroscope, [0.0; 3], 50),
            RawSample::new(SensorChannel::Accelerometer, [0.0; 3], 200),
            RawSample::new(SensorChannel::Gyroscope, [0.0; 3], 150),
        ];
        assert!(RawSampleAdapter::validate_samples(&raw).is_empty());
    }

    #[test]
    fn test_detects_regression_within_channel() {
        let raw = vec![
            RawSample::new(SensorChannel::Accelerometer, [0.0; 3], 100),
            RawSample::new(SensorChannel::Accelerometer, [0.0; 3], 90),
            RawSample::new(SensorChannel::Accelerometer, [0.0; 3], 95),
        ];
        let results = RawSampleAdapter::validate_samples(&raw);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 1);
        assert_eq!(
            results[1].result,
            Some(ValidationError::NonMonotonicTimestamp {
                channel: "accelerometer".to_string(),
                timestamp_ns: 95,
                previous_ns: 100,
            })
        );
    }

    #[test]
    fn test_flags_unreliable_accuracy() {
        let raw = vec![
            RawSample::new(SensorChannel::Gyroscope, [0.0; 3], 10)
                .with_accuracy(SensorAccuracy::High),
            RawSample::new(SensorChannel::Gyroscope, [0.0; 3], 20)
                .with_accuracy(SensorAccuracy::Unreliable),
            RawSample::new(SensorChannel::Gyroscope, [0.0; 3], 30),
        ];

        let results = RawSampleAdapter::validate_samples(&raw);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, 1);
        assert_eq!(
            results[0].result,
            Some(ValidationError::UnreliableAccuracy {
                channel: "gyroscope".to_string(),
                timestamp_ns: 20,
            })
        );

        // Conversion for replay does not drop them
        assert_eq!(RawSampleAdapter::to_samples(&raw).unwrap().len(), 3);
    }
}

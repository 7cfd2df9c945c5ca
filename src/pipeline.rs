//! Sample routing and throw history
//!
//! This module provides the public API for Airtime. `ThrowTracker` sits
//! between the host's sensor callbacks and the classifier: it routes each
//! sample to the right entry point, keeps the completed throws in memory and
//! remembers the latest reading per channel for live display.

use tracing::debug;

use crate::classifier::MotionClassifier;
use crate::config::ClassifierConfig;
use crate::encoder::ThrowReportEncoder;
use crate::error::AirtimeError;
use crate::schema::RawSampleAdapter;
use crate::types::{MotionState, Sample, SensorChannel, ThrowRecord, ThrowReport};

/// Replay a recorded sample sequence through a fresh classifier.
///
/// # Returns
/// Completed throws in the order they were caught
pub fn replay_samples(samples: &[Sample]) -> Vec<ThrowRecord> {
    let mut tracker = ThrowTracker::new();
    samples
        .iter()
        .filter_map(|sample| tracker.process_sample(sample))
        .collect()
}

/// Convert an NDJSON motion.raw_sample.v1 recording into report JSON.
///
/// # Arguments
/// * `ndjson` - One raw sample record per line
/// * `device_id` - Device identifier for provenance
///
/// # Example
/// ```ignore
/// let report_json = samples_to_report(recording, "pixel-7".to_string())?;
/// ```
pub fn samples_to_report(ndjson: String, device_id: String) -> Result<String, AirtimeError> {
    let raw = RawSampleAdapter::parse_ndjson(&ndjson)?;
    let samples = RawSampleAdapter::to_samples(&raw)?;

    let mut tracker = ThrowTracker::new();
    for sample in &samples {
        tracker.process_sample(sample);
    }
    tracker.report_json(&device_id)
}

/// Live status of one sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelStatus {
    /// Most recent reading, `None` until the channel has delivered anything
    pub latest: Option<Sample>,
    pub sample_count: u64,
}

impl ChannelStatus {
    /// True until the first sample arrives
    pub fn is_waiting(&self) -> bool {
        self.latest.is_none()
    }

    fn record(&mut self, sample: &Sample) {
        self.latest = Some(*sample);
        self.sample_count += 1;
    }
}

/// Stateful tracker for one device
///
/// History lives in memory only and is gone when the tracker is dropped.
pub struct ThrowTracker {
    classifier: MotionClassifier,
    encoder: ThrowReportEncoder,
    /// Oldest first; `history()` reverses
    history: Vec<ThrowRecord>,
    accelerometer: ChannelStatus,
    gyroscope: ChannelStatus,
}

impl Default for ThrowTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ThrowTracker {
    /// Create a tracker with default thresholds
    pub fn new() -> Self {
        Self::from_classifier(MotionClassifier::new())
    }

    /// Create a tracker with a custom classifier config
    pub fn with_config(config: ClassifierConfig) -> Result<Self, AirtimeError> {
        Ok(Self::from_classifier(MotionClassifier::with_config(config)?))
    }

    fn from_classifier(classifier: MotionClassifier) -> Self {
        Self {
            classifier,
            encoder: ThrowReportEncoder::new(),
            history: Vec::new(),
            accelerometer: ChannelStatus::default(),
            gyroscope: ChannelStatus::default(),
        }
    }

    /// Feed one sample from either channel
    ///
    /// # Returns
    /// The finalized throw if this sample was the catch
    pub fn process_sample(&mut self, sample: &Sample) -> Option<ThrowRecord> {
        match sample.channel {
            SensorChannel::Accelerometer => {
                self.accelerometer.record(sample);
                let update = self.classifier.process_accelerometer(sample);
                let record = update.record?;
                self.history.push(record.clone());
                debug!(id = record.id, stored = self.history.len(), "throw stored");
                Some(record)
            }
            SensorChannel::Gyroscope => {
                self.gyroscope.record(sample);
                let state = self.classifier.state();
                self.classifier.process_gyroscope(sample, state);
                None
            }
        }
    }

    pub fn current_state(&self) -> MotionState {
        self.classifier.state()
    }

    /// Completed throws, most recent first
    pub fn history(&self) -> impl Iterator<Item = &ThrowRecord> {
        self.history.iter().rev()
    }

    /// Most recently completed throw
    pub fn last_throw(&self) -> Option<&ThrowRecord> {
        self.history.last()
    }

    /// Number of throws currently held in history
    ///
    /// Drops to zero on `clear_history`; `MotionClassifier::throw_count`
    /// keeps counting every finalized throw.
    pub fn stored_count(&self) -> usize {
        self.history.len()
    }

    /// Drop stored throws. Ids keep counting from where they were.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn channel_status(&self, channel: SensorChannel) -> ChannelStatus {
        match channel {
            SensorChannel::Accelerometer => self.accelerometer,
            SensorChannel::Gyroscope => self.gyroscope,
        }
    }

    pub fn classifier(&self) -> &MotionClassifier {
        &self.classifier
    }

    /// Build a report over the stored history
    pub fn report(&self, device_id: &str) -> ThrowReport {
        self.encoder.encode(&self.history, device_id)
    }

    pub fn report_json(&self, device_id: &str) -> Result<String, AirtimeError> {
        self.encoder.encode_to_json(&self.history, device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawSample;
    use crate::types::{CatchQuality, GRAVITY};
    use pretty_assertions::assert_eq;
    use std::f64::consts::TAU;

    const MS: i64 = 1_000_000;

    /// A 1.0 s flight spinning 1.5 turns/s on z, caught at 4.5g, with the
    /// accelerometer at 100 Hz and the gyroscope at 200 Hz offset by 2.5 ms.
    fn throw_session(start_ns: i64) -> Vec<Sample> {
        let mut accel = Vec::new();
        let mut gyro = Vec::new();

        let accel_at = |t_ms: i64, g: f64| {
            Sample::accelerometer([0.0, 0.0, g * GRAVITY], start_ns + t_ms * MS)
        };

        // Resting, launch spike, release, flight, catch, resting
        for t in (0..200).step_by(10) {
            accel.push(accel_at(t, 1.0));
        }
        accel.push(accel_at(200, 2.6));
        accel.push(accel_at(210, 2.8));
        for t in (220..1220).step_by(10) {
            accel.push(accel_at(t, 0.05));
        }
        accel.push(accel_at(1220, 4.5));
        for t in (1230..1500).step_by(10) {
            accel.push(accel_at(t, 1.0));
        }

        for i in 0..300 {
            let t = start_ns + i * 5 * MS + 2_500_000;
            gyro.push(Sample::gyroscope([0.0, 0.0, 1.5 * TAU], t));
        }

        let mut all: Vec<Sample> = accel.into_iter().chain(gyro).collect();
        all.sort_by_key(|s| s.timestamp_ns);
        all
    }

    #[test]
    fn test_replay_single_throw() {
        let records = replay_samples(&throw_session(0));
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.id, 1);
        assert!((record.flight_time_seconds - 1.0).abs() < 1e-9);
        assert!((record.max_height_meters - GRAVITY / 8.0).abs() < 1e-9);
        assert_eq!(record.catch_quality, CatchQuality::Firm);
        assert_eq!(record.rotation_count.x, 0);
        assert_eq!(record.rotation_count.y, 0);
        // Gyro samples land between accel samples: integration runs from the
        // first gyro after release (222.5 ms) to the last before the catch
        // (1217.5 ms), 0.995 s at 1.5 turns/s
        assert_eq!(record.rotation_count.z, 1);
        assert!((record.accumulated_rotation_rad.z - 1.5 * TAU * 0.995).abs() < 1e-6);
    }

    #[test]
    fn test_tracker_history_most_recent_first() {
        let mut tracker = ThrowTracker::new();
        let mut completed = Vec::new();
        for n in 0..3 {
            for sample in throw_session(n * 2_000 * MS) {
                if let Some(record) = tracker.process_sample(&sample) {
                    completed.push(record.id);
                }
            }
        }

        assert_eq!(completed, vec![1, 2, 3]);
        let ids: Vec<u64> = tracker.history().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(tracker.last_throw().map(|r| r.id), Some(3));
        assert_eq!(tracker.current_state(), MotionState::Idle);
    }

    #[test]
    fn test_clear_history_keeps_numbering() {
        let mut tracker = ThrowTracker::new();
        for sample in throw_session(0) {
            tracker.process_sample(&sample);
        }
        tracker.clear_history();
        assert_eq!(tracker.stored_count(), 0);
        assert_eq!(tracker.classifier().throw_count(), 1);

        let next: Vec<ThrowRecord> = throw_session(2_000 * MS)
            .iter()
            .filter_map(|s| tracker.process_sample(s))
            .collect();
        assert_eq!(next[0].id, 2);
    }

    #[test]
    fn test_report_with_extreme_spin() {
        let mut tracker = ThrowTracker::new();
        let accel =
            |g: f64, t_ms: i64| Sample::accelerometer([0.0, 0.0, g * GRAVITY], t_ms * MS);

        tracker.process_sample(&accel(2.5, 0));
        tracker.process_sample(&accel(0.1, 100));
        tracker.process_sample(&Sample::gyroscope([1e12, 1e12, 0.0], 100 * MS));
        tracker.process_sample(&Sample::gyroscope([1e12, 1e12, 0.0], 200 * MS));
        let record = tracker.process_sample(&accel(4.0, 300)).unwrap();

        assert_eq!(record.rotation_count.x, u32::MAX);
        assert_eq!(record.rotation_count.y, u32::MAX);
        assert_eq!(record.rotation_count.total(), u32::MAX);

        let json = tracker.report_json("device").unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["summary"]["total_rotations"], u32::MAX);
    }

    #[test]
    fn test_channel_status() {
        let mut tracker = ThrowTracker::new();
        assert!(tracker.channel_status(SensorChannel::Accelerometer).is_waiting());
        assert!(tracker.channel_status(SensorChannel::Gyroscope).is_waiting());

        let sample = Sample::accelerometer([0.0, 9.81, 0.0], 10);
        tracker.process_sample(&sample);

        let accel = tracker.channel_status(SensorChannel::Accelerometer);
        assert_eq!(accel.latest, Some(sample));
        assert_eq!(accel.sample_count, 1);
        assert!(tracker.channel_status(SensorChannel::Gyroscope).is_waiting());
    }

    #[test]
    fn test_gyro_uses_tracker_state() {
        let mut tracker = ThrowTracker::new();
        tracker.process_sample(&Sample::gyroscope([TAU, 0.0, 0.0], 0));
        tracker.process_sample(&Sample::gyroscope([TAU, 0.0, 0.0], 500 * MS));
        assert_eq!(tracker.classifier().accumulated_rotation().x, 0.0);
    }

    #[test]
    fn test_tracker_with_invalid_config() {
        let config = ClassifierConfig {
            catch_threshold_g: f64::NAN,
            ..Default::default()
        };
        assert!(ThrowTracker::with_config(config).is_err());
    }

    #[test]
    fn test_samples_to_report() {
        let ndjson: String = throw_session(0)
            .iter()
            .map(|s| serde_json::to_string(&RawSample::from_sample(s)).unwrap() + "\n")
            .collect();

        let json = samples_to_report(ndjson, "test-device".to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["provenance"]["device_id"], "test-device");
        assert_eq!(payload["summary"]["throw_count"], 1);
        assert_eq!(payload["throws"][0]["id"], 1);
        assert_eq!(payload["throws"][0]["catch_quality"], "firm");
    }

    #[test]
    fn test_samples_to_report_invalid_json() {
        let result = samples_to_report("not valid json".to_string(), "device".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_samples_to_report_empty() {
        let json = samples_to_report(String::new(), "device".to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["summary"]["throw_count"], 0);
        assert!(payload["throws"].as_array().unwrap().is_empty());
    }
}

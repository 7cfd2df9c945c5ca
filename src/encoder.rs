//! Throw report encoding
//!
//! This module encodes completed throw records into report JSON with
//! producer and provenance metadata.

use crate::error::AirtimeError;
use crate::types::{
    ReportProducer, ReportProvenance, ReportSummary, ThrowRecord, ThrowReport,
};
use crate::{AIRTIME_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder for throw report payloads
pub struct ThrowReportEncoder {
    instance_id: String,
}

impl Default for ThrowReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThrowReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode throw records into a report
    ///
    /// Records may arrive in any order; the report lists them most recent
    /// first (highest id first).
    pub fn encode(&self, records: &[ThrowRecord], device_id: &str) -> ThrowReport {
        let mut throws = records.to_vec();
        throws.sort_by(|a, b| b.id.cmp(&a.id));

        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: AIRTIME_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            device_id: device_id.to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
            first_throw_at_ns: throws
                .iter()
                .filter_map(|t| t.throw_started_at_ns.or(t.flight_started_at_ns))
                .min(),
            last_catch_at_ns: throws.iter().map(|t| t.caught_at_ns).max(),
        };

        ThrowReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            summary: summarize(&throws),
            throws,
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        records: &[ThrowRecord],
        device_id: &str,
    ) -> Result<String, AirtimeError> {
        let report = self.encode(records, device_id);
        serde_json::to_string_pretty(&report)
            .map_err(|e| AirtimeError::EncodingError(e.to_string()))
    }
}

fn summarize(throws: &[ThrowRecord]) -> ReportSummary {
    ReportSummary {
        throw_count: throws.len(),
        total_flight_time_seconds: throws.iter().map(|t| t.flight_time_seconds).sum(),
        longest_flight_seconds: max_of(throws, |t| t.flight_time_seconds),
        highest_throw_meters: max_of(throws, |t| t.max_height_meters),
        total_rotations: throws
            .iter()
            .map(|t| t.rotation_count.total())
            .fold(0u32, u32::saturating_add),
        best_catch: throws.iter().map(|t| t.catch_quality).min(),
    }
}

fn max_of(throws: &[ThrowRecord], field: impl Fn(&ThrowRecord) -> f64) -> Option<f64> {
    throws
        .iter()
        .map(field)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AxisRotation, CatchQuality, RotationCounts};
    use pretty_assertions::assert_eq;

    fn record(id: u64, flight: f64, quality: CatchQuality, spins: u32) -> ThrowRecord {
        ThrowRecord {
            id,
            rotation_count: RotationCounts { x: spins, y: 0, z: 0 },
            accumulated_rotation_rad: AxisRotation::default(),
            flight_time_seconds: flight,
            max_height_meters: crate::metrics::max_height_meters(flight, crate::types::GRAVITY),
            peak_catch_accel_magnitude: 40.0,
            catch_quality: quality,
            throw_started_at_ns: Some(id as i64 * 1_000),
            flight_started_at_ns: Some(id as i64 * 1_000 + 100),
            caught_at_ns: id as i64 * 1_000 + 900,
        }
    }

    #[test]
    fn test_encode_report() {
        let encoder = ThrowReportEncoder::with_instance_id("test-instance".to_string());
        let records = vec![
            record(1, 0.5, CatchQuality::Hard, 1),
            record(2, 0.9, CatchQuality::Firm, 2),
            record(3, 0.7, CatchQuality::Harsh, 0),
        ];

        let report = encoder.encode(&records, "phone-1");

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.provenance.device_id, "phone-1");
        assert_eq!(report.provenance.first_throw_at_ns, Some(1_000));
        assert_eq!(report.provenance.last_catch_at_ns, Some(3_900));

        let ids: Vec<u64> = report.throws.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let summary = &report.summary;
        assert_eq!(summary.throw_count, 3);
        assert!((summary.total_flight_time_seconds - 2.1).abs() < 1e-9);
        assert_eq!(summary.longest_flight_seconds, Some(0.9));
        assert_eq!(summary.total_rotations, 3);
        assert_eq!(summary.best_catch, Some(CatchQuality::Firm));
    }

    #[test]
    fn test_encode_empty() {
        let encoder = ThrowReportEncoder::new();
        let report = encoder.encode(&[], "device");
        assert_eq!(
            report.summary,
            ReportSummary {
                throw_count: 0,
                total_flight_time_seconds: 0.0,
                longest_flight_seconds: None,
                highest_throw_meters: None,
                total_rotations: 0,
                best_catch: None,
            }
        );
        assert!(report.throws.is_empty());
        assert_eq!(report.provenance.first_throw_at_ns, None);
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = ThrowReportEncoder::new();
        let json = encoder
            .encode_to_json(&[record(1, 0.8, CatchQuality::Soft, 1)], "device")
            .unwrap();

        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["report_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "airtime");
        assert_eq!(payload["throws"][0]["catch_quality"], "soft");
        assert_eq!(payload["throws"][0]["rotation_count"]["x"], 1);
        assert!(payload["provenance"]["computed_at_utc"].is_string());
    }

    #[test]
    fn test_encode_saturated_rotation_counts() {
        let mut spun = record(1, 0.5, CatchQuality::Firm, 0);
        spun.rotation_count = RotationCounts {
            x: u32::MAX,
            y: u32::MAX,
            z: 0,
        };
        let records = vec![spun, record(2, 0.5, CatchQuality::Firm, 7)];

        let encoder = ThrowReportEncoder::new();
        let json = encoder.encode_to_json(&records, "device").unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(payload["summary"]["total_rotations"], u32::MAX);
    }

    #[test]
    fn test_unique_instance_ids() {
        let a = ThrowReportEncoder::new();
        let b = ThrowReportEncoder::new();
        assert_ne!(a.instance_id(), b.instance_id());
    }
}

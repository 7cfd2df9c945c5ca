//! Throw, flight and catch classification
//!
//! A four-state machine driven by accelerometer magnitude. Transitions are
//! evaluated once per accelerometer sample; gyroscope samples only feed the
//! rotation integrator while the device is in free flight.
//!
//! ```text
//!  Idle --(|a| > throw)--> Throwing --(|a| < free fall)--> FreeFlight
//!   ^                         |                               |
//!   +----(timeout, abandon)---+                               |
//!   +-------------(|a| > catch: emit ThrowRecord)-------------+
//! ```
//!
//! The throw timeout is checked lazily on the next accelerometer sample. If
//! samples stop arriving the machine stays where it is.

use tracing::{debug, info, warn};

use crate::config::ClassifierConfig;
use crate::error::AirtimeError;
use crate::metrics;
use crate::types::{
    AxisRotation, MotionState, Sample, StateUpdate, ThrowRecord, NANOS_PER_SECOND,
};

/// Stateful classifier for one tracked device
///
/// Not internally synchronized. Hosts delivering sensor callbacks from
/// several threads must serialize every call into one instance.
#[derive(Debug, Clone)]
pub struct MotionClassifier {
    config: ClassifierConfig,
    state: MotionState,
    throw_started_at_ns: Option<i64>,
    flight_started_at_ns: Option<i64>,
    /// Timestamp the next gyroscope dt is measured from
    gyro_reference_ns: Option<i64>,
    last_accel_ns: Option<i64>,
    rotation: AxisRotation,
    peak_catch_accel: f64,
    throw_count: u64,
}

impl Default for MotionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionClassifier {
    /// Create a classifier with default thresholds (2g / 0.5g / 3g)
    pub fn new() -> Self {
        Self::build(ClassifierConfig::default())
    }

    /// Create a classifier from a custom config
    pub fn with_config(config: ClassifierConfig) -> Result<Self, AirtimeError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ClassifierConfig) -> Self {
        Self {
            config,
            state: MotionState::Idle,
            throw_started_at_ns: None,
            flight_started_at_ns: None,
            gyro_reference_ns: None,
            last_accel_ns: None,
            rotation: AxisRotation::default(),
            peak_catch_accel: 0.0,
            throw_count: 0,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// State after the most recent accelerometer sample
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Rotation integrated so far in the current (or last) flight
    pub fn accumulated_rotation(&self) -> AxisRotation {
        self.rotation
    }

    /// Largest magnitude seen since free flight began
    pub fn peak_catch_accel(&self) -> f64 {
        self.peak_catch_accel
    }

    /// Number of throws finalized so far
    pub fn throw_count(&self) -> u64 {
        self.throw_count
    }

    /// Apply one accelerometer sample to the state machine
    pub fn process_accelerometer(&mut self, sample: &Sample) -> StateUpdate {
        let now = sample.timestamp_ns;
        if let Some(last) = self.last_accel_ns {
            if now < last {
                warn!(
                    timestamp_ns = now,
                    previous_ns = last,
                    "accelerometer timestamp went backwards"
                );
            }
        }
        self.last_accel_ns = Some(now);

        let magnitude = sample.magnitude();
        let mut record = None;

        let next = match self.state {
            MotionState::Idle => {
                if magnitude > self.config.throw_threshold() {
                    self.throw_started_at_ns = Some(now);
                    MotionState::Throwing
                } else {
                    MotionState::Idle
                }
            }
            MotionState::Throwing => {
                if magnitude < self.config.free_fall_threshold() {
                    self.begin_flight(now);
                    MotionState::FreeFlight
                } else if self.throw_elapsed_seconds(now) > self.config.throw_timeout_seconds
                    && magnitude >= self.config.free_fall_threshold()
                {
                    debug!(
                        timestamp_ns = now,
                        magnitude, "throw abandoned before free fall"
                    );
                    self.throw_started_at_ns = None;
                    MotionState::Idle
                } else {
                    MotionState::Throwing
                }
            }
            MotionState::FreeFlight => {
                self.peak_catch_accel = self.peak_catch_accel.max(magnitude);
                if magnitude > self.config.catch_threshold() {
                    record = Some(self.finalize_throw(now));
                    // Catching collapses into Idle within this step
                    MotionState::Idle
                } else {
                    MotionState::FreeFlight
                }
            }
            MotionState::Catching => MotionState::Idle,
        };

        if next != self.state {
            debug!(
                from = self.state.as_str(),
                to = next.as_str(),
                timestamp_ns = now,
                magnitude,
                "motion state transition"
            );
        }
        self.state = next;

        StateUpdate {
            state: self.state,
            record,
        }
    }

    /// Integrate one gyroscope sample
    ///
    /// `current_state` is the state the caller observed when the sample
    /// arrived. Outside free flight the sample only re-arms the integration
    /// reference, so the first sample after release contributes nothing.
    pub fn process_gyroscope(&mut self, sample: &Sample, current_state: MotionState) {
        let now = sample.timestamp_ns;

        if current_state != MotionState::FreeFlight {
            self.gyro_reference_ns = Some(now);
            return;
        }

        let Some(reference) = self.gyro_reference_ns else {
            self.gyro_reference_ns = Some(now);
            return;
        };

        if now < reference {
            warn!(
                timestamp_ns = now,
                reference_ns = reference,
                "gyroscope timestamp went backwards, skipping integration"
            );
            return;
        }

        let dt = now.saturating_sub(reference) as f64 / NANOS_PER_SECOND;
        self.rotation.integrate(sample.values, dt);
        self.gyro_reference_ns = Some(now);
    }

    fn begin_flight(&mut self, now: i64) {
        self.flight_started_at_ns = Some(now);
        self.rotation = AxisRotation::default();
        self.gyro_reference_ns = None;
        self.peak_catch_accel = 0.0;
    }

    fn throw_elapsed_seconds(&self, now: i64) -> f64 {
        metrics::elapsed_seconds(self.throw_started_at_ns, now)
    }

    fn finalize_throw(&mut self, caught_at_ns: i64) -> ThrowRecord {
        self.throw_count += 1;

        let flight_time_seconds =
            metrics::flight_time_seconds(self.flight_started_at_ns, caught_at_ns);
        let record = ThrowRecord {
            id: self.throw_count,
            rotation_count: metrics::rotation_counts(&self.rotation),
            accumulated_rotation_rad: self.rotation,
            flight_time_seconds,
            max_height_meters: metrics::max_height_meters(
                flight_time_seconds,
                self.config.gravity,
            ),
            peak_catch_accel_magnitude: self.peak_catch_accel,
            catch_quality: metrics::catch_quality(
                self.peak_catch_accel,
                self.config.quality_boundaries(),
            ),
            throw_started_at_ns: self.throw_started_at_ns,
            flight_started_at_ns: self.flight_started_at_ns,
            caught_at_ns,
        };

        info!(
            id = record.id,
            flight_time_seconds = record.flight_time_seconds,
            max_height_meters = record.max_height_meters,
            rotations = record.rotation_count.total(),
            quality = record.catch_quality.as_str(),
            "throw completed"
        );

        self.throw_started_at_ns = None;
        self.flight_started_at_ns = None;
        record
    }
}

//! Airtime - On-device throw, flight and catch classifier
//!
//! Airtime consumes accelerometer and gyroscope samples from a handheld
//! device and recognises throw cycles: launch spike → free flight → catch
//! impact. Each completed throw yields a record with flight time, peak height,
//! whole rotations per axis and catch quality.
//!
//! ## Modules
//!
//! - **Classifier**: The state machine, driven one sample at a time
//! - **Pipeline**: `ThrowTracker`, which routes samples and keeps history
//! - **Schema / Encoder**: Recorded-sample input and report output formats

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::MotionClassifier;
pub use config::ClassifierConfig;
pub use error::AirtimeError;
pub use pipeline::{replay_samples, samples_to_report, ThrowTracker};
pub use types::{CatchQuality, MotionState, Sample, SensorChannel, StateUpdate, ThrowRecord};

// Schema exports
pub use schema::{RawSample, RawSampleAdapter, SCHEMA_VERSION};

/// Airtime version embedded in all reports
pub const AIRTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "airtime";

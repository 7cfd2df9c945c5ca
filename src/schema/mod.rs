//! motion.raw_sample.v1 schema
//!
//! This module defines the recorded-sample input format read by the replay
//! pipeline and the CLI, plus parsing and validation helpers.

mod raw_sample;
mod adapter;

pub use raw_sample::*;
pub use adapter::*;

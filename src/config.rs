//! Classifier configuration
//!
//! Thresholds are expressed as multiples of `gravity`. Every field has a
//! default, so a config file only needs to name what it overrides.

use crate::error::AirtimeError;
use crate::types::GRAVITY;
use serde::{Deserialize, Serialize};

/// Default launch spike threshold (g)
pub const DEFAULT_THROW_THRESHOLD_G: f64 = 2.0;
/// Default free-fall ceiling (g)
pub const DEFAULT_FREE_FALL_THRESHOLD_G: f64 = 0.5;
/// Default impact threshold (g)
pub const DEFAULT_CATCH_THRESHOLD_G: f64 = 3.0;
/// Default time allowed between launch spike and release (seconds)
pub const DEFAULT_THROW_TIMEOUT_SECONDS: f64 = 0.5;
/// Default catch quality tier boundaries (g)
pub const DEFAULT_QUALITY_BOUNDARIES_G: [f64; 3] = [4.0, 6.0, 8.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    pub throw_threshold_g: f64,
    pub free_fall_threshold_g: f64,
    pub catch_threshold_g: f64,
    /// A throw that has not reached free fall within this window is abandoned
    pub throw_timeout_seconds: f64,
    /// Lower bounds of the second, third and worst catch tiers
    pub quality_boundaries_g: [f64; 3],
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            throw_threshold_g: DEFAULT_THROW_THRESHOLD_G,
            free_fall_threshold_g: DEFAULT_FREE_FALL_THRESHOLD_G,
            catch_threshold_g: DEFAULT_CATCH_THRESHOLD_G,
            throw_timeout_seconds: DEFAULT_THROW_TIMEOUT_SECONDS,
            quality_boundaries_g: DEFAULT_QUALITY_BOUNDARIES_G,
        }
    }
}

impl ClassifierConfig {
    /// Load and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, AirtimeError> {
        let config: ClassifierConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, AirtimeError> {
        serde_json::to_string_pretty(self).map_err(AirtimeError::JsonError)
    }

    pub fn validate(&self) -> Result<(), AirtimeError> {
        let positive = [
            ("gravity", self.gravity),
            ("throw_threshold_g", self.throw_threshold_g),
            ("free_fall_threshold_g", self.free_fall_threshold_g),
            ("catch_threshold_g", self.catch_threshold_g),
            ("throw_timeout_seconds", self.throw_timeout_seconds),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(AirtimeError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }

        if self.free_fall_threshold_g >= self.throw_threshold_g {
            return Err(AirtimeError::InvalidConfig(format!(
                "free_fall_threshold_g ({}) must be below throw_threshold_g ({})",
                self.free_fall_threshold_g, self.throw_threshold_g
            )));
        }

        let [a, b, c] = self.quality_boundaries_g;
        if !(a.is_finite() && b.is_finite() && c.is_finite()) || !(0.0 < a && a < b && b < c) {
            return Err(AirtimeError::InvalidConfig(format!(
                "quality_boundaries_g must be positive and strictly increasing, got {:?}",
                self.quality_boundaries_g
            )));
        }

        Ok(())
    }

    /// Launch spike threshold (m/s²)
    pub fn throw_threshold(&self) -> f64 {
        self.throw_threshold_g * self.gravity
    }

    /// Free-fall ceiling (m/s²)
    pub fn free_fall_threshold(&self) -> f64 {
        self.free_fall_threshold_g * self.gravity
    }

    /// Impact threshold (m/s²)
    pub fn catch_threshold(&self) -> f64 {
        self.catch_threshold_g * self.gravity
    }

    /// Catch tier boundaries (m/s²)
    pub fn quality_boundaries(&self) -> [f64; 3] {
        self.quality_boundaries_g.map(|b| b * self.gravity)
    }
}

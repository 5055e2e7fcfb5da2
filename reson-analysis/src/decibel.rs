//! Linear magnitude to decibel conversion with a floor

use crate::error::{AnalysisError, Result};

/// Default lower bound for decibel values
pub const DEFAULT_FLOOR_DB: f32 = -100.0;

/// Decibel scale bounded below by `floor_db`
///
/// Zero, negative and NaN magnitudes map to the floor instead of
/// `-inf` / NaN, so downstream comparisons always see a finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecibelScale {
    floor_db: f32,
}

impl Default for DecibelScale {
    fn default() -> Self {
        Self {
            floor_db: DEFAULT_FLOOR_DB,
        }
    }
}

impl DecibelScale {
    /// Create a scale with a custom floor (must be finite and below 0 dB)
    pub fn new(floor_db: f32) -> Result<Self> {
        if !floor_db.is_finite() || floor_db >= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "decibel floor must be finite and below 0 dB, got {}",
                floor_db
            )));
        }
        Ok(Self { floor_db })
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    /// Convert a linear magnitude to dB (0 dB = magnitude 1.0)
    #[inline]
    pub fn to_decibel(&self, linear: f32) -> f32 {
        if linear.is_nan() || linear <= 0.0 {
            return self.floor_db;
        }
        (20.0 * linear.log10()).max(self.floor_db)
    }

    /// Decibel value mapped to 0.0 (floor) - 1.0 (0 dB) for display
    pub fn normalized(&self, linear: f32) -> f32 {
        let db = self.to_decibel(linear);
        ((db - self.floor_db) / -self.floor_db).clamp(0.0, 1.0)
    }
}

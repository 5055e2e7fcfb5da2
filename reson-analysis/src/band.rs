//! Frequency band configuration and per-band aggregation
//!
//! A band is a named `[low_hz, high_hz]` range with two decibel thresholds.
//! The classifier reduces the bins a band covers to one level per frame.
//!
//! The canonical reduction is [`Reduction::Peak`]: the loudest bin in the
//! range. Peaks keep short onsets (kicks, plucks) visible where a mean over
//! a wide band would smear them out.

use std::ops::RangeInclusive;

use crate::decibel::DecibelScale;
use crate::error::{AnalysisError, Result};
use crate::frame::SpectrumFrame;

/// A named frequency band with hysteresis thresholds
///
/// Validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BandConfig {
    name: String,
    low_hz: f32,
    high_hz: f32,
    enter_db: f32,
    exit_db: f32,
    min_dwell_ticks: u32,
}

impl BandConfig {
    /// Create a band
    ///
    /// Fails with [`AnalysisError::InvalidConfig`] unless
    /// `0 <= low_hz < high_hz`, `enter_db >= exit_db`, all values are finite,
    /// the name is non-empty and `min_dwell_ticks >= 1`.
    pub fn new(
        name: impl Into<String>,
        low_hz: f32,
        high_hz: f32,
        enter_db: f32,
        exit_db: f32,
        min_dwell_ticks: u32,
    ) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: String| {
            Err(AnalysisError::InvalidConfig(format!(
                "band '{}': {}",
                name, reason
            )))
        };

        if name.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "band name must not be empty".into(),
            ));
        }
        if !low_hz.is_finite() || !high_hz.is_finite() {
            return invalid("frequency bounds must be finite".into());
        }
        if low_hz < 0.0 || low_hz >= high_hz {
            return invalid(format!(
                "bounds must satisfy 0 <= low < high, got [{}, {}] Hz",
                low_hz, high_hz
            ));
        }
        if !enter_db.is_finite() || !exit_db.is_finite() {
            return invalid("thresholds must be finite".into());
        }
        if enter_db < exit_db {
            return invalid(format!(
                "enter threshold {} dB is below exit threshold {} dB",
                enter_db, exit_db
            ));
        }
        if min_dwell_ticks == 0 {
            return invalid("minimum dwell must be at least one tick".into());
        }

        Ok(Self {
            name,
            low_hz,
            high_hz,
            enter_db,
            exit_db,
            min_dwell_ticks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn low_hz(&self) -> f32 {
        self.low_hz
    }

    pub fn high_hz(&self) -> f32 {
        self.high_hz
    }

    /// Level at or above which an inactive band starts counting toward `Active`
    pub fn enter_db(&self) -> f32 {
        self.enter_db
    }

    /// Level at or below which an active band starts counting toward `Inactive`
    pub fn exit_db(&self) -> f32 {
        self.exit_db
    }

    /// Consecutive ticks a condition must hold before a transition is confirmed
    pub fn min_dwell_ticks(&self) -> u32 {
        self.min_dwell_ticks
    }

    /// Centre of the band in Hz
    pub fn centre_hz(&self) -> f32 {
        (self.low_hz + self.high_hz) / 2.0
    }

    /// Reject a band whose upper bound lies above `nyquist`
    pub fn check_nyquist(&self, nyquist: f32) -> Result<()> {
        if self.high_hz > nyquist {
            return Err(AnalysisError::InvalidConfig(format!(
                "band '{}': upper bound {} Hz is above nyquist {} Hz",
                self.name, self.high_hz, nyquist
            )));
        }
        Ok(())
    }
}

/// How the bins of a band are reduced to one magnitude
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reduction {
    /// Maximum magnitude in the range
    #[default]
    Peak,
    /// Arithmetic mean of the range
    Mean,
}

/// Derives one level per band from a magnitude spectrum
#[derive(Debug, Clone, Copy, Default)]
pub struct BandClassifier {
    scale: DecibelScale,
    reduction: Reduction,
}

impl BandClassifier {
    pub fn new(scale: DecibelScale, reduction: Reduction) -> Self {
        Self { scale, reduction }
    }

    pub fn scale(&self) -> &DecibelScale {
        &self.scale
    }

    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Inclusive range of bins whose centres lie within the band
    ///
    /// A band narrower than one bin resolves to the single bin nearest its
    /// centre.
    pub fn bin_range(
        &self,
        frame: &SpectrumFrame<'_>,
        band: &BandConfig,
    ) -> Result<RangeInclusive<usize>> {
        if band.high_hz() > frame.nyquist() {
            return Err(AnalysisError::OutOfRange {
                band: band.name().to_string(),
                high_hz: band.high_hz(),
                nyquist: frame.nyquist(),
            });
        }

        let mapper = frame.mapper();
        let first = mapper.first_bin_at_or_above(band.low_hz())?;
        let last = mapper.last_bin_at_or_below(band.high_hz())?;
        if first <= last {
            Ok(first..=last)
        } else {
            let nearest = mapper.frequency_to_bin(band.centre_hz())?;
            Ok(nearest..=nearest)
        }
    }

    /// Reduced linear magnitude of the band
    pub fn aggregate_linear(&self, frame: &SpectrumFrame<'_>, band: &BandConfig) -> Result<f32> {
        let range = self.bin_range(frame, band)?;
        let bins = &frame.magnitudes()[range];
        let level = match self.reduction {
            Reduction::Peak => bins.iter().copied().fold(0.0f32, f32::max),
            Reduction::Mean => bins.iter().sum::<f32>() / bins.len() as f32,
        };
        Ok(level)
    }

    /// Reduced band level in dB
    pub fn aggregate(&self, frame: &SpectrumFrame<'_>, band: &BandConfig) -> Result<f32> {
        let linear = self.aggregate_linear(frame, band)?;
        Ok(self.scale.to_decibel(linear))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decibel::DEFAULT_FLOOR_DB;

    fn low_band() -> BandConfig {
        BandConfig::new("low", 80.0, 200.0, -20.0, -30.0, 2).unwrap()
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let result = BandConfig::new("low", 80.0, 200.0, -30.0, -20.0, 2);
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_accepts_equal_thresholds() {
        assert!(BandConfig::new("flat", 80.0, 200.0, -20.0, -20.0, 1).is_ok());
    }

    #[test]
    fn test_rejects_bad_bounds() {
        assert!(BandConfig::new("a", 200.0, 80.0, -20.0, -30.0, 1).is_err());
        assert!(BandConfig::new("a", 100.0, 100.0, -20.0, -30.0, 1).is_err());
        assert!(BandConfig::new("a", -5.0, 80.0, -20.0, -30.0, 1).is_err());
        assert!(BandConfig::new("a", 0.0, f32::INFINITY, -20.0, -30.0, 1).is_err());
        assert!(BandConfig::new("", 0.0, 80.0, -20.0, -30.0, 1).is_err());
        assert!(BandConfig::new("a", 0.0, 80.0, -20.0, -30.0, 0).is_err());
    }

    #[test]
    fn test_check_nyquist() {
        let band = BandConfig::new("air", 16000.0, 24000.0, -40.0, -50.0, 1).unwrap();
        assert!(band.check_nyquist(24000.0).is_ok());
        assert!(matches!(
            band.check_nyquist(22050.0),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bin_range() {
        let magnitudes = vec![0.0f32; 1024];
        let frame = SpectrumFrame::new(&magnitudes, 44100, 2048).unwrap();
        let range = BandClassifier::default()
            .bin_range(&frame, &low_band())
            .unwrap();
        assert_eq!(range, 4..=9);
    }

    #[test]
    fn test_narrow_band_falls_back_to_nearest_bin() {
        let magnitudes = vec![0.0f32; 1024];
        let frame = SpectrumFrame::new(&magnitudes, 44100, 2048).unwrap();
        // 100-105 Hz lies between bins 4 (86.1 Hz) and 5 (107.7 Hz)
        let band = BandConfig::new("narrow", 100.0, 105.0, -20.0, -30.0, 1).unwrap();
        let range = BandClassifier::default().bin_range(&frame, &band).unwrap();
        assert_eq!(range, 5..=5);
    }

    #[test]
    fn test_aggregate_takes_peak() {
        let mut magnitudes = vec![0.0f32; 1024];
        magnitudes[5] = 0.01;
        magnitudes[7] = 0.1;
        magnitudes[9] = 0.05;
        // Outside the band, must be ignored
        magnitudes[12] = 1.0;
        let frame = SpectrumFrame::new(&magnitudes, 44100, 2048).unwrap();

        let classifier = BandClassifier::default();
        let linear = classifier.aggregate_linear(&frame, &low_band()).unwrap();
        assert_eq!(linear, 0.1);
        let db = classifier.aggregate(&frame, &low_band()).unwrap();
        assert!((db + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_aggregate_mean() {
        let mut magnitudes = vec![0.0f32; 1024];
        for bin in 4..=9 {
            magnitudes[bin] = 0.6;
        }
        magnitudes[4] = 0.0;
        let frame = SpectrumFrame::new(&magnitudes, 44100, 2048).unwrap();
        let classifier = BandClassifier::new(DecibelScale::default(), Reduction::Mean);
        let linear = classifier.aggregate_linear(&frame, &low_band()).unwrap();
        assert!((linear - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_silent_band_is_floor() {
        let magnitudes = vec![0.0f32; 1024];
        let frame = SpectrumFrame::new(&magnitudes, 44100, 2048).unwrap();
        let db = BandClassifier::default()
            .aggregate(&frame, &low_band())
            .unwrap();
        assert_eq!(db, DEFAULT_FLOOR_DB);
    }

    #[test]
    fn test_band_above_frame_nyquist() {
        let band = BandConfig::new("air", 12000.0, 20000.0, -40.0, -50.0, 1).unwrap();
        let magnitudes = vec![0.0f32; 1024];
        let frame = SpectrumFrame::new(&magnitudes, 32000, 2048).unwrap();
        assert!(matches!(
            BandClassifier::default().aggregate(&frame, &band),
            Err(AnalysisError::OutOfRange { .. })
        ));
    }
}

//! Conversion between FFT bin indices and frequencies
//!
//! Everything here works on true bin indices of a magnitude spectrum
//! (`0..fft_size / 2`). Screen or plot coordinates are converted with
//! [`FrequencyMapper::bin_for_position`] first, never used as indices.

use crate::error::{AnalysisError, Result};

/// Bin <-> frequency mapping for one sample rate / FFT size pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyMapper {
    sample_rate: u32,
    fft_size: usize,
}

impl FrequencyMapper {
    /// Create a mapper for the given analysis format
    ///
    /// The FFT size must be even and at least 2 so that the spectrum has
    /// at least one bin.
    pub fn new(sample_rate: u32, fft_size: usize) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidArgument(
                "sample rate must be greater than zero".into(),
            ));
        }
        if fft_size < 2 || fft_size % 2 != 0 {
            return Err(AnalysisError::InvalidArgument(format!(
                "FFT size must be an even number >= 2, got {}",
                fft_size
            )));
        }
        Ok(Self {
            sample_rate,
            fft_size,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bins in a magnitude spectrum (`fft_size / 2`)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Width of one bin in Hz
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    /// Half the sample rate
    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Centre frequency of a bin: `bin * sample_rate / fft_size`
    ///
    /// `fft_size / 2` (the nyquist bin) is accepted so the upper edge of the
    /// last spectrum bin can be computed.
    pub fn bin_to_frequency(&self, bin: usize) -> Result<f32> {
        if bin > self.num_bins() {
            return Err(AnalysisError::InvalidArgument(format!(
                "bin {} is past the nyquist bin {}",
                bin,
                self.num_bins()
            )));
        }
        Ok(bin as f32 * self.bin_width())
    }

    /// Nearest bin for a frequency, clamped to `[0, fft_size / 2 - 1]`
    pub fn frequency_to_bin(&self, hz: f32) -> Result<usize> {
        let exact = self.exact_bin(hz)?;
        Ok((exact.round() as usize).min(self.num_bins() - 1))
    }

    /// First bin whose centre is at or above `hz`
    ///
    /// May return `num_bins()` when `hz` lies above the last bin centre.
    pub fn first_bin_at_or_above(&self, hz: f32) -> Result<usize> {
        let exact = self.exact_bin(hz)?;
        Ok((exact.ceil() as usize).min(self.num_bins()))
    }

    /// Last bin whose centre is at or below `hz`, clamped to the last bin
    pub fn last_bin_at_or_below(&self, hz: f32) -> Result<usize> {
        let exact = self.exact_bin(hz)?;
        Ok((exact.floor() as usize).min(self.num_bins() - 1))
    }

    /// Position of a frequency on a linear `0..=nyquist` axis (0.0 - 1.0)
    pub fn normalize(&self, hz: f32) -> f32 {
        if !hz.is_finite() {
            return 0.0;
        }
        (hz / self.nyquist()).clamp(0.0, 1.0)
    }

    /// Bin under a position on a linear frequency axis
    ///
    /// `fraction` is the distance along the axis (0.0 at 0 Hz, 1.0 at
    /// nyquist) and is clamped into range.
    pub fn bin_for_position(&self, fraction: f32) -> Result<usize> {
        if fraction.is_nan() {
            return Err(AnalysisError::InvalidArgument(
                "axis position is NaN".into(),
            ));
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let bin = (fraction * self.num_bins() as f32) as usize;
        Ok(bin.min(self.num_bins() - 1))
    }

    /// Fractional bin position of a frequency
    fn exact_bin(&self, hz: f32) -> Result<f32> {
        if !hz.is_finite() || hz < 0.0 {
            return Err(AnalysisError::InvalidArgument(format!(
                "frequency must be a finite, non-negative value, got {}",
                hz
            )));
        }
        Ok(hz * self.fft_size as f32 / self.sample_rate as f32)
    }
}

/// Centre frequency of `bin` for the given format
pub fn bin_to_frequency(bin: usize, sample_rate: u32, fft_size: usize) -> Result<f32> {
    FrequencyMapper::new(sample_rate, fft_size)?.bin_to_frequency(bin)
}

/// Nearest bin to `hz` for the given format, clamped to the spectrum
pub fn frequency_to_bin(hz: f32, sample_rate: u32, fft_size: usize) -> Result<usize> {
    FrequencyMapper::new(sample_rate, fft_size)?.frequency_to_bin(hz)
}

//! One tick's magnitude spectrum

use crate::decibel::DecibelScale;
use crate::error::{AnalysisError, Result};
use crate::frequency::FrequencyMapper;

/// Linear magnitude spectrum for a single analysis window
///
/// Borrows the magnitudes handed over by the audio side for the duration
/// of one tick. Holds exactly `fft_size / 2` bins.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumFrame<'a> {
    magnitudes: &'a [f32],
    mapper: FrequencyMapper,
}

/// Description of a single bin, for inspection and display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinInfo {
    pub bin: usize,
    /// Lower edge of the bin in Hz
    pub low_hz: f32,
    /// Upper edge of the bin in Hz
    pub high_hz: f32,
    pub magnitude_db: f32,
}

impl<'a> SpectrumFrame<'a> {
    /// Wrap a magnitude spectrum captured at `sample_rate` with `fft_size`
    pub fn new(magnitudes: &'a [f32], sample_rate: u32, fft_size: usize) -> Result<Self> {
        let mapper = FrequencyMapper::new(sample_rate, fft_size)?;
        if magnitudes.len() != mapper.num_bins() {
            return Err(AnalysisError::InvalidArgument(format!(
                "spectrum has {} bins, expected {} for FFT size {}",
                magnitudes.len(),
                mapper.num_bins(),
                fft_size
            )));
        }
        Ok(Self { magnitudes, mapper })
    }

    pub fn magnitudes(&self) -> &'a [f32] {
        self.magnitudes
    }

    pub fn mapper(&self) -> &FrequencyMapper {
        &self.mapper
    }

    pub fn sample_rate(&self) -> u32 {
        self.mapper.sample_rate()
    }

    pub fn fft_size(&self) -> usize {
        self.mapper.fft_size()
    }

    pub fn nyquist(&self) -> f32 {
        self.mapper.nyquist()
    }

    /// Frequency span and level of one bin
    pub fn bin_info(&self, bin: usize, scale: &DecibelScale) -> Result<BinInfo> {
        let magnitude = self.magnitudes.get(bin).copied().ok_or_else(|| {
            AnalysisError::InvalidArgument(format!(
                "bin {} is outside the {}-bin spectrum",
                bin,
                self.magnitudes.len()
            ))
        })?;
        Ok(BinInfo {
            bin,
            low_hz: self.mapper.bin_to_frequency(bin)?,
            high_hz: self.mapper.bin_to_frequency(bin + 1)?,
            magnitude_db: scale.to_decibel(magnitude),
        })
    }

    /// Magnitude-weighted mean bin frequency ("brightness")
    ///
    /// Returns 0 Hz for a silent frame. Negative and non-finite magnitudes
    /// are ignored.
    pub fn spectral_centroid(&self) -> f32 {
        let bin_width = self.mapper.bin_width();
        let (weighted, total) = self
            .magnitudes
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_finite() && **m > 0.0)
            .fold((0.0f64, 0.0f64), |(weighted, total), (bin, &m)| {
                let hz = bin as f64 * bin_width as f64;
                (weighted + hz * m as f64, total + m as f64)
            });

        if total > 0.0 {
            (weighted / total) as f32
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        let magnitudes = vec![0.0f32; 1000];
        assert!(matches!(
            SpectrumFrame::new(&magnitudes, 44100, 2048),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bin_info() {
        let mut magnitudes = vec![0.0f32; 1024];
        magnitudes[5] = 0.1;
        let frame = SpectrumFrame::new(&magnitudes, 44100, 2048).unwrap();
        let info = frame.bin_info(5, &DecibelScale::default()).unwrap();
        assert_eq!(info.bin, 5);
        assert!((info.low_hz - 107.666).abs() < 0.01);
        assert!((info.high_hz - info.low_hz - 21.533).abs() < 0.01);
        assert!((info.magnitude_db + 20.0).abs() < 1e-4);

        assert!(frame.bin_info(1024, &DecibelScale::default()).is_err());
    }

    #[test]
    fn test_centroid_single_bin() {
        let mut magnitudes = vec![0.0f32; 1024];
        magnitudes[100] = 0.8;
        let frame = SpectrumFrame::new(&magnitudes, 44100, 2048).unwrap();
        let expected = frame.mapper().bin_to_frequency(100).unwrap();
        assert!((frame.spectral_centroid() - expected).abs() < 0.01);
    }

    #[test]
    fn test_centroid_balanced_pair() {
        let mut magnitudes = vec![0.0f32; 512];
        magnitudes[10] = 1.0;
        magnitudes[30] = 1.0;
        let frame = SpectrumFrame::new(&magnitudes, 48000, 1024).unwrap();
        let expected = frame.mapper().bin_to_frequency(20).unwrap();
        assert!((frame.spectral_centroid() - expected).abs() < 0.01);
    }

    #[test]
    fn test_centroid_silence() {
        let magnitudes = vec![0.0f32; 512];
        let frame = SpectrumFrame::new(&magnitudes, 48000, 1024).unwrap();
        assert_eq!(frame.spectral_centroid(), 0.0);
    }
}

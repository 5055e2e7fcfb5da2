//! Spectral reactive engine
//!
//! Owns the configured bands and their trigger state. Each call to
//! [`SpectralEngine::process`] is one tick: every band is aggregated from
//! the frame, then every trigger advances, and the confirmed transitions
//! are returned in band order.
//!
//! A tick either succeeds as a whole or fails without touching any state,
//! so a failed tick never yields a partial event list.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, trace};

use crate::band::{BandClassifier, BandConfig};
use crate::error::{AnalysisError, Result};
use crate::frame::SpectrumFrame;
use crate::frequency::FrequencyMapper;
use crate::trigger::{BandActivity, BandState, HysteresisTrigger};

/// A confirmed band transition
#[derive(Debug, Clone, PartialEq)]
pub struct BandEvent {
    /// Index of the band in configuration order
    pub band: usize,
    pub name: String,
    pub activity: BandActivity,
    /// Tick that confirmed the transition (the first tick is 1)
    pub tick: u64,
    /// Sum of the tick durations supplied so far
    pub elapsed: Duration,
    /// Band level that confirmed the transition
    pub level_db: f32,
}

/// Current spectral centroid, ready for display
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectralCentroid {
    pub hz: f32,
    /// Position on a linear `0..=nyquist` axis (0.0 - 1.0)
    pub normalized: f32,
    /// Nearest spectrum bin
    pub bin: usize,
}

struct BandSlot {
    config: BandConfig,
    trigger: HysteresisTrigger,
}

/// Turns magnitude spectra into band activation events
pub struct SpectralEngine {
    mapper: FrequencyMapper,
    classifier: BandClassifier,
    bands: Vec<BandSlot>,
    tick: u64,
    elapsed: Duration,
    centroid: Option<SpectralCentroid>,
    /// Reused per tick to hold band levels before any trigger advances
    levels: Vec<f32>,
}

impl SpectralEngine {
    /// Create an engine with the default classifier (peak reduction, -100 dB floor)
    pub fn new(bands: Vec<BandConfig>, sample_rate: u32, fft_size: usize) -> Result<Self> {
        Self::with_classifier(bands, sample_rate, fft_size, BandClassifier::default())
    }

    /// Create an engine with a custom classifier
    ///
    /// Every band is checked against the nyquist of the configured format;
    /// band names must be unique.
    pub fn with_classifier(
        bands: Vec<BandConfig>,
        sample_rate: u32,
        fft_size: usize,
        classifier: BandClassifier,
    ) -> Result<Self> {
        let mapper = FrequencyMapper::new(sample_rate, fft_size)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        let slots = Self::build_slots(bands, &mapper)?;

        debug!(
            "SpectralEngine created: sample_rate={}, fft_size={}, bands={}, reduction={:?}, floor={} dB",
            sample_rate,
            fft_size,
            slots.len(),
            classifier.reduction(),
            classifier.scale().floor_db()
        );

        Ok(Self {
            mapper,
            classifier,
            levels: Vec::with_capacity(slots.len()),
            bands: slots,
            tick: 0,
            elapsed: Duration::ZERO,
            centroid: None,
        })
    }

    fn build_slots(bands: Vec<BandConfig>, mapper: &FrequencyMapper) -> Result<Vec<BandSlot>> {
        let mut names = HashSet::with_capacity(bands.len());
        for band in &bands {
            band.check_nyquist(mapper.nyquist())?;
            if !names.insert(band.name()) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "duplicate band name '{}'",
                    band.name()
                )));
            }
        }

        Ok(bands
            .into_iter()
            .map(|config| BandSlot {
                trigger: HysteresisTrigger::new(&config),
                config,
            })
            .collect())
    }

    /// Replace the band set
    ///
    /// All trigger state is reset. On error the previous bands stay in place.
    pub fn reconfigure(&mut self, bands: Vec<BandConfig>) -> Result<()> {
        self.bands = Self::build_slots(bands, &self.mapper)?;
        self.levels = Vec::with_capacity(self.bands.len());
        debug!("SpectralEngine reconfigured: bands={}", self.bands.len());
        Ok(())
    }

    /// Change the expected frame format, e.g. after a device sample-rate change
    ///
    /// Fails with [`AnalysisError::OutOfRange`] if a band no longer fits
    /// below the new nyquist; the previous format is kept in that case.
    /// Trigger state is preserved.
    pub fn set_format(&mut self, sample_rate: u32, fft_size: usize) -> Result<()> {
        let mapper = FrequencyMapper::new(sample_rate, fft_size)?;
        if let Some(slot) = self
            .bands
            .iter()
            .find(|slot| slot.config.high_hz() > mapper.nyquist())
        {
            return Err(AnalysisError::OutOfRange {
                band: slot.config.name().to_string(),
                high_hz: slot.config.high_hz(),
                nyquist: mapper.nyquist(),
            });
        }
        debug!(
            "SpectralEngine format changed: sample_rate={}, fft_size={}",
            sample_rate, fft_size
        );
        self.mapper = mapper;
        Ok(())
    }

    /// Advance one tick
    ///
    /// `centroid_hz` forwards a centroid computed by the audio side; when
    /// `None` the centroid is computed from `frame`.
    pub fn process(
        &mut self,
        frame: &SpectrumFrame<'_>,
        centroid_hz: Option<f32>,
    ) -> Result<Vec<BandEvent>> {
        self.advance(frame, centroid_hz, None)
    }

    /// Advance one tick that lasted `dt`
    ///
    /// Dwell is still counted in ticks; `dt` feeds [`BandEvent::elapsed`]
    /// and [`BandState::held_for`].
    pub fn process_timed(
        &mut self,
        frame: &SpectrumFrame<'_>,
        centroid_hz: Option<f32>,
        dt: Duration,
    ) -> Result<Vec<BandEvent>> {
        self.advance(frame, centroid_hz, Some(dt))
    }

    fn advance(
        &mut self,
        frame: &SpectrumFrame<'_>,
        centroid_hz: Option<f32>,
        dt: Option<Duration>,
    ) -> Result<Vec<BandEvent>> {
        if frame.fft_size() != self.mapper.fft_size() {
            return Err(AnalysisError::InvalidArgument(format!(
                "frame FFT size {} does not match configured FFT size {}",
                frame.fft_size(),
                self.mapper.fft_size()
            )));
        }

        // Everything fallible happens before any state is touched
        let centroid = self.resolve_centroid(frame, centroid_hz)?;
        self.levels.clear();
        for slot in &self.bands {
            let level = self.classifier.aggregate(frame, &slot.config)?;
            self.levels.push(level);
        }

        self.tick += 1;
        self.elapsed = self.elapsed.saturating_add(dt.unwrap_or_default());
        self.centroid = Some(centroid);

        let mut events = Vec::new();
        for (index, (slot, &level_db)) in self.bands.iter_mut().zip(&self.levels).enumerate() {
            if let Some(activity) = slot.trigger.advance(level_db, dt) {
                debug!(
                    "Band '{}' -> {:?} at tick {} ({:.1} dB)",
                    slot.config.name(),
                    activity,
                    self.tick,
                    level_db
                );
                events.push(BandEvent {
                    band: index,
                    name: slot.config.name().to_string(),
                    activity,
                    tick: self.tick,
                    elapsed: self.elapsed,
                    level_db,
                });
            }
        }

        trace!(
            "tick {}: levels={:?}, centroid={:.1} Hz, events={}",
            self.tick,
            self.levels,
            centroid.hz,
            events.len()
        );

        Ok(events)
    }

    fn resolve_centroid(
        &self,
        frame: &SpectrumFrame<'_>,
        centroid_hz: Option<f32>,
    ) -> Result<SpectralCentroid> {
        let hz = match centroid_hz {
            Some(hz) if !hz.is_finite() || hz < 0.0 => {
                return Err(AnalysisError::InvalidArgument(format!(
                    "spectral centroid must be finite and non-negative, got {}",
                    hz
                )));
            }
            Some(hz) => hz.min(frame.nyquist()),
            None => frame.spectral_centroid(),
        };

        let mapper = frame.mapper();
        Ok(SpectralCentroid {
            hz,
            normalized: mapper.normalize(hz),
            bin: mapper.frequency_to_bin(hz)?,
        })
    }

    /// Number of completed ticks
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Sum of all tick durations supplied to [`process_timed`](Self::process_timed)
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Centroid of the most recent successful tick
    pub fn centroid(&self) -> Option<SpectralCentroid> {
        self.centroid
    }

    pub fn mapper(&self) -> &FrequencyMapper {
        &self.mapper
    }

    pub fn classifier(&self) -> &BandClassifier {
        &self.classifier
    }

    /// Configured bands in order
    pub fn bands(&self) -> impl Iterator<Item = &BandConfig> {
        self.bands.iter().map(|slot| &slot.config)
    }

    /// State of a band by name
    pub fn state(&self, name: &str) -> Option<&BandState> {
        self.bands
            .iter()
            .find(|slot| slot.config.name() == name)
            .map(|slot| slot.trigger.state())
    }

    /// All bands with their state, in configuration order
    pub fn states(&self) -> impl Iterator<Item = (&BandConfig, &BandState)> {
        self.bands
            .iter()
            .map(|slot| (&slot.config, slot.trigger.state()))
    }

    /// Names of the bands that are currently active
    pub fn active_bands(&self) -> impl Iterator<Item = &str> {
        self.bands
            .iter()
            .filter(|slot| slot.trigger.activity().is_active())
            .map(|slot| slot.config.name())
    }

    /// Reset every trigger, the tick counter and the centroid
    pub fn reset(&mut self) {
        for slot in &mut self.bands {
            slot.trigger.reset();
        }
        self.tick = 0;
        self.elapsed = Duration::ZERO;
        self.centroid = None;
    }
}

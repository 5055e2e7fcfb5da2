//! Spectral band analysis for reson
//!
//! Turns a stream of magnitude spectra into stable band activation events:
//! bin <-> frequency mapping, floored decibel conversion, per-band
//! aggregation and dwell-confirmed hysteresis triggers.

mod band;
mod decibel;
mod engine;
mod error;
mod frame;
mod frequency;
mod trigger;

pub use band::{BandClassifier, BandConfig, Reduction};
pub use decibel::{DecibelScale, DEFAULT_FLOOR_DB};
pub use engine::{BandEvent, SpectralCentroid, SpectralEngine};
pub use error::{AnalysisError, Result};
pub use frame::{BinInfo, SpectrumFrame};
pub use frequency::{bin_to_frequency, frequency_to_bin, FrequencyMapper};
pub use trigger::{BandActivity, BandState, HysteresisTrigger};

//! Spectrum sources standing in for a live audio input
//!
//! - [`ToneSource`] renders synthetic tones through a Hann window and FFT.
//! - [`read_replay`] loads previously captured magnitude spectra.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use thiserror::Error;

/// One sine component: frequency in Hz and peak amplitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub hz: f32,
    pub amplitude: f32,
}

impl Partial {
    pub const fn new(hz: f32, amplitude: f32) -> Self {
        Self { hz, amplitude }
    }
}

/// A stretch of the demo script: the same partials for `ticks` frames
#[derive(Debug, Clone)]
pub struct Segment {
    pub label: &'static str,
    pub ticks: usize,
    pub partials: Vec<Partial>,
}

/// Bass hit, silence, a bright chord, a fade into the hysteresis gap, silence
pub fn demo_script() -> Vec<Segment> {
    vec![
        Segment {
            label: "bass hit",
            ticks: 8,
            partials: vec![Partial::new(120.0, 0.5)],
        },
        Segment {
            label: "silence",
            ticks: 6,
            partials: Vec::new(),
        },
        Segment {
            label: "chord",
            ticks: 8,
            partials: vec![
                Partial::new(110.0, 0.3),
                Partial::new(330.0, 0.2),
                Partial::new(4400.0, 0.4),
            ],
        },
        Segment {
            label: "fade",
            ticks: 6,
            partials: vec![Partial::new(110.0, 0.05), Partial::new(330.0, 0.03)],
        },
        Segment {
            label: "silence",
            ticks: 6,
            partials: Vec::new(),
        },
    ]
}

/// Renders magnitude spectra of synthetic tones
///
/// Consecutive frames advance by half an FFT window so tone phases move
/// the way they would with a 50% overlapped analysis.
pub struct ToneSource {
    sample_rate: u32,
    fft_size: usize,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    /// Pre-allocated FFT buffer to avoid allocation in render()
    fft_buffer: Vec<Complex<f32>>,
    position: u64,
}

impl ToneSource {
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Pre-compute Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Self {
            sample_rate,
            fft_size,
            fft,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            position: 0,
        }
    }

    /// Samples between consecutive frames
    pub fn hop_size(&self) -> usize {
        self.fft_size / 2
    }

    /// Render the next frame's linear magnitudes (`fft_size / 2` bins)
    ///
    /// A full-scale sine centred on a bin comes out at 1.0.
    pub fn render(&mut self, partials: &[Partial]) -> Vec<f32> {
        let sample_rate = self.sample_rate as f64;
        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let t = (self.position + i as u64) as f64 / sample_rate;
            let sample: f32 = partials
                .iter()
                .map(|p| {
                    let phase = (2.0 * std::f64::consts::PI * p.hz as f64 * t) as f32;
                    p.amplitude * phase.sin()
                })
                .sum();
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.position += self.hop_size() as u64;

        self.fft.process(&mut self.fft_buffer);

        // Hann coherent gain is 0.5, one-sided spectrum doubles it back
        let scale = 4.0 / self.fft_size as f32;
        self.fft_buffer[..self.fft_size / 2]
            .iter()
            .map(|c| c.norm() * scale)
            .collect()
    }
}

/// Errors that can occur while reading a replay file
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid magnitude '{token}'")]
    Parse { line: usize, token: String },
}

/// Read captured spectra: one frame per line, whitespace-separated magnitudes
pub fn read_replay(path: &Path) -> Result<Vec<Vec<f32>>, ReplayError> {
    let content = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_replay(&content)
}

fn parse_replay(content: &str) -> Result<Vec<Vec<f32>>, ReplayError> {
    let mut frames = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let frame = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f32>().map_err(|_| ReplayError::Parse {
                    line: index + 1,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;
        frames.push(frame);
    }
    Ok(frames)
}

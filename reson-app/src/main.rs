//! reson - spectral band trigger harness
//!
//! Feeds magnitude spectra (synthetic tones or a replay file) through the
//! band engine once per tick and logs every confirmed band transition.

mod cli;
mod config;
mod source;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use reson_analysis::{BandActivity, BinInfo, SpectralEngine, SpectrumFrame};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::Args;
use config::Config;
use source::{demo_script, read_replay, ToneSource};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.init {
        let path = args.config.unwrap_or_else(Config::config_path);
        Config::default()
            .save_to(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    let mut engine = config.engine().context("invalid band configuration")?;
    info!(
        "Engine ready: {} Hz, FFT {}, {} bands",
        config.sample_rate,
        config.fft_size,
        config.bands.len()
    );

    let mut runner = Runner::new(&config);
    match args.replay {
        Some(path) => {
            let frames = read_replay(&path)
                .with_context(|| format!("failed to read replay {}", path.display()))?;
            info!("Replaying {} frames from {}", frames.len(), path.display());
            for magnitudes in &frames {
                runner.tick(&mut engine, magnitudes);
            }
        }
        None => {
            let mut tones = ToneSource::new(config.sample_rate, config.fft_size);
            for segment in demo_script() {
                info!("Segment '{}' ({} ticks)", segment.label, segment.ticks);
                for _ in 0..segment.ticks {
                    let magnitudes = tones.render(&segment.partials);
                    runner.tick(&mut engine, &magnitudes);
                }
            }
        }
    }

    runner.summarize(&engine);
    Ok(())
}

/// Drives the engine one frame at a time and tallies the results
struct Runner {
    sample_rate: u32,
    fft_size: usize,
    tick_duration: Duration,
    activations: HashMap<String, u32>,
    failed_ticks: u32,
}

impl Runner {
    fn new(config: &Config) -> Self {
        // 50% overlap between analysis windows
        let hop = config.fft_size / 2;
        Self {
            sample_rate: config.sample_rate,
            fft_size: config.fft_size,
            tick_duration: Duration::from_secs_f64(hop as f64 / config.sample_rate as f64),
            activations: HashMap::new(),
            failed_ticks: 0,
        }
    }

    fn tick(&mut self, engine: &mut SpectralEngine, magnitudes: &[f32]) {
        let frame = match SpectrumFrame::new(magnitudes, self.sample_rate, self.fft_size) {
            Ok(frame) => frame,
            Err(e) => {
                self.failed_ticks += 1;
                warn!("Skipped frame: {}", e);
                return;
            }
        };

        match engine.process_timed(&frame, None, self.tick_duration) {
            Ok(events) => {
                for event in events {
                    info!(
                        "[{:>7.3}s] tick {:>4}  {:<10} {:<8} {:>7.1} dB",
                        event.elapsed.as_secs_f32(),
                        event.tick,
                        event.name,
                        format!("{:?}", event.activity),
                        event.level_db
                    );
                    if event.activity == BandActivity::Active {
                        *self.activations.entry(event.name).or_default() += 1;
                    }
                }
                if let Some(info) = centroid_bin_info(engine, &frame) {
                    debug!(
                        "centroid bin {}: {:.1}-{:.1} Hz, {:.1} dB",
                        info.bin, info.low_hz, info.high_hz, info.magnitude_db
                    );
                }
            }
            Err(e) => {
                self.failed_ticks += 1;
                warn!("Skipped frame: {}", e);
            }
        }
    }

    fn summarize(&self, engine: &SpectralEngine) {
        info!(
            "Processed {} ticks ({:.2}s), {} skipped",
            engine.tick(),
            engine.elapsed().as_secs_f32(),
            self.failed_ticks
        );
        for (band, state) in engine.states() {
            info!(
                "  {:<10} {:>6.0}-{:<6.0} Hz  {:<8} activations={} last={}",
                band.name(),
                band.low_hz(),
                band.high_hz(),
                format!("{:?}", state.activity),
                self.activations.get(band.name()).copied().unwrap_or(0),
                state
                    .last_db
                    .map(|db| format!("{:.1} dB", db))
                    .unwrap_or_else(|| "-".into())
            );
        }
    }
}

/// Bin under the current centroid's position on the frequency axis
fn centroid_bin_info(engine: &SpectralEngine, frame: &SpectrumFrame<'_>) -> Option<BinInfo> {
    let centroid = engine.centroid()?;
    let bin = frame.mapper().bin_for_position(centroid.normalized).ok()?;
    frame.bin_info(bin, engine.classifier().scale()).ok()
}

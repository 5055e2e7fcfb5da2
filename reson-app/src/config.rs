//! Band configuration file for reson
//!
//! Simple `key=value` lines; `#` starts a comment. Bands are listed one
//! per line:
//!
//! ```text
//! sample_rate=44100
//! fft_size=2048
//! floor_db=-100
//! reduction=peak
//! band=low,80,200,-20,-30,2
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reson_analysis::{
    AnalysisError, BandClassifier, BandConfig, DecibelScale, Reduction, SpectralEngine,
    DEFAULT_FLOOR_DB,
};
use thiserror::Error;

/// Errors that can occur while loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: {source}")]
    Band {
        line: usize,
        #[source]
        source: AnalysisError,
    },
}

/// Harness configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub sample_rate: u32,
    pub fft_size: usize,
    pub floor_db: f32,
    pub reduction: Reduction,
    pub bands: Vec<BandConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 2048,
            floor_db: DEFAULT_FLOOR_DB,
            reduction: Reduction::Peak,
            bands: default_bands(),
        }
    }
}

/// Built-in bands used when no configuration file exists
pub fn default_bands() -> Vec<BandConfig> {
    // (name, low, high, enter, exit, dwell)
    let table: [(&str, f32, f32, f32, f32, u32); 4] = [
        ("low", 80.0, 200.0, -20.0, -30.0, 2),
        ("bass", 31.0, 262.0, -20.0, -30.0, 2),
        ("guitar", 82.0, 1379.0, -24.0, -34.0, 2),
        ("drums", 60.0, 5000.0, -15.0, -25.0, 1),
    ];
    table
        .iter()
        .filter_map(|&(name, low, high, enter, exit, dwell)| {
            BandConfig::new(name, low, high, enter, exit, dwell).ok()
        })
        .collect()
}

impl Config {
    /// Load the configuration
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and the built-in defaults are used if it is missing.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.serialize())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reson")
            .join("bands.conf")
    }

    /// Build an engine for this configuration
    pub fn engine(&self) -> Result<SpectralEngine, AnalysisError> {
        let classifier = BandClassifier::new(DecibelScale::new(self.floor_db)?, self.reduction);
        SpectralEngine::with_classifier(
            self.bands.clone(),
            self.sample_rate,
            self.fft_size,
            classifier,
        )
    }

    /// Parse config from `key=value` lines
    ///
    /// Band lines replace the built-in bands; unknown keys are ignored.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut bands = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: line_no,
                    message: format!("expected key=value, got '{}'", line),
                });
            };
            let value = value.trim();

            match key.trim() {
                "sample_rate" => config.sample_rate = parse_value(line_no, "sample_rate", value)?,
                "fft_size" => config.fft_size = parse_value(line_no, "fft_size", value)?,
                "floor_db" => config.floor_db = parse_value(line_no, "floor_db", value)?,
                "reduction" => {
                    config.reduction = match value.to_ascii_lowercase().as_str() {
                        "peak" | "max" => Reduction::Peak,
                        "mean" => Reduction::Mean,
                        other => {
                            return Err(ConfigError::Parse {
                                line: line_no,
                                message: format!("unknown reduction '{}'", other),
                            })
                        }
                    }
                }
                "band" => bands.push(parse_band(line_no, value)?),
                _ => {} // Ignore unknown keys
            }
        }

        if !bands.is_empty() {
            config.bands = bands;
        }
        Ok(config)
    }

    /// Serialize config to `key=value` lines
    fn serialize(&self) -> String {
        let mut lines = vec![
            "# reson band configuration".to_string(),
            format!("sample_rate={}", self.sample_rate),
            format!("fft_size={}", self.fft_size),
            format!("floor_db={}", self.floor_db),
            format!(
                "reduction={}",
                match self.reduction {
                    Reduction::Peak => "peak",
                    Reduction::Mean => "mean",
                }
            ),
            "# band=name,low_hz,high_hz,enter_db,exit_db,dwell_ticks".to_string(),
        ];

        for band in &self.bands {
            lines.push(format!(
                "band={},{},{},{},{},{}",
                band.name(),
                band.low_hz(),
                band.high_hz(),
                band.enter_db(),
                band.exit_db(),
                band.min_dwell_ticks()
            ));
        }

        lines.join("\n")
    }
}

fn parse_value<T: std::str::FromStr>(line: usize, key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Parse {
        line,
        message: format!("invalid value '{}' for {}", value, key),
    })
}

fn parse_band(line: usize, value: &str) -> Result<BandConfig, ConfigError> {
    let fields: Vec<&str> = value.split(',').map(str::trim).collect();
    let &[name, low, high, enter, exit, dwell] = fields.as_slice() else {
        return Err(ConfigError::Parse {
            line,
            message: format!(
                "band needs 6 fields (name,low_hz,high_hz,enter_db,exit_db,dwell_ticks), got {}",
                fields.len()
            ),
        });
    };

    BandConfig::new(
        name,
        parse_value(line, "low_hz", low)?,
        parse_value(line, "high_hz", high)?,
        parse_value(line, "enter_db", enter)?,
        parse_value(line, "exit_db", exit)?,
        parse_value(line, "dwell_ticks", dwell)?,
    )
    .map_err(|source| ConfigError::Band { line, source })
}

//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "reson")]
#[command(about = "Dwell-confirmed spectral band triggers", long_about = None)]
pub struct Args {
    /// Band configuration (default: <config dir>/reson/bands.conf)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Replay captured spectra, one frame of magnitudes per line
    #[arg(long, value_name = "PATH")]
    pub replay: Option<PathBuf>,

    /// Write the built-in configuration and exit
    #[arg(long)]
    pub init: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let args = Args::try_parse_from(["reson"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.replay.is_none());
        assert!(!args.init);
    }

    #[test]
    fn test_all_arguments() {
        let args = Args::try_parse_from([
            "reson",
            "--config",
            "bands.conf",
            "--replay",
            "capture.txt",
            "--init",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("bands.conf")));
        assert_eq!(args.replay, Some(PathBuf::from("capture.txt")));
        assert!(args.init);
    }

    #[test]
    fn test_rejects_unknown_flag() {
        assert!(Args::try_parse_from(["reson", "--loud"]).is_err());
        assert!(Args::try_parse_from(["reson", "--config"]).is_err());
    }
}

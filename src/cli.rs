//! Command-line argument surface.

use std::path::PathBuf;

use clap::Parser;

/// Segment scanned manga sheets into panel and balloon cutouts.
#[derive(Debug, Parser)]
#[command(name = "manga-segmenter", version, about)]
pub struct Cli {
    /// Folder of scanned sheet images (read in file-name order).
    pub input: PathBuf,

    /// Output folder; cutouts land in `panels/` and `balloons/` below it.
    pub output: PathBuf,

    /// Optional TOML file overriding detection thresholds.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Worker threads (defaults to the number of cores).
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["manga-segmenter", "in", "out"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("in"));
        assert_eq!(cli.output, PathBuf::from("out"));
        assert!(cli.config.is_none());
        assert!(cli.jobs.is_none());
    }

    #[test]
    fn test_parse_options() {
        let cli = Cli::try_parse_from([
            "manga-segmenter",
            "in",
            "out",
            "--config",
            "tuned.toml",
            "-j",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("tuned.toml")));
        assert_eq!(cli.jobs, Some(4));
    }

    #[test]
    fn test_missing_args_rejected() {
        assert!(Cli::try_parse_from(["manga-segmenter", "in"]).is_err());
    }
}

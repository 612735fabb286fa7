//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Output directory used when neither the CLI nor the config file names one.
pub const DEFAULT_OUTPUT_DIR: &str = "flickr_photos";

/// Download every photo of an online album at its highest available resolution.
///
/// Interrupted runs resume: files already on disk are skipped, resolved URLs
/// are reused, and earlier failures are retried.
#[derive(Parser, Debug)]
#[command(name = "album-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Album URL, e.g. <https://www.flickr.com/photos/{user}/albums/{id}>
    pub album_url: String,

    /// Directory for photos and run logs [default: flickr_photos]
    pub output_dir: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Concurrent download workers (1-32) [default: 4]
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub workers: Option<u8>,

    /// Pause after the service rate-limits us, in minutes (1-1440) [default: 60]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=1440))]
    pub cooldown_minutes: Option<u64>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALBUM: &str = "https://www.flickr.com/photos/someone/albums/72177720330390070";

    #[test]
    fn test_cli_album_url_is_required() {
        let err = Args::try_parse_from(["album-downloader"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["album-downloader", ALBUM]).unwrap();
        assert_eq!(args.album_url, ALBUM);
        assert!(args.output_dir.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.workers.is_none());
        assert!(args.cooldown_minutes.is_none());
        assert!(!args.headed);
    }

    #[test]
    fn test_cli_positional_output_dir() {
        let args = Args::try_parse_from(["album-downloader", ALBUM, "gdansk"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("gdansk")));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["album-downloader", ALBUM, "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_workers_range() {
        let args = Args::try_parse_from(["album-downloader", ALBUM, "-w", "8"]).unwrap();
        assert_eq!(args.workers, Some(8));

        assert!(Args::try_parse_from(["album-downloader", ALBUM, "-w", "0"]).is_err());
        assert!(Args::try_parse_from(["album-downloader", ALBUM, "--workers", "33"]).is_err());
    }

    #[test]
    fn test_cli_cooldown_and_headed() {
        let args = Args::try_parse_from([
            "album-downloader",
            ALBUM,
            "--cooldown-minutes",
            "30",
            "--headed",
        ])
        .unwrap();
        assert_eq!(args.cooldown_minutes, Some(30));
        assert!(args.headed);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["album-downloader", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "civic-reporter", version, about = "Capture, classify and report civic issues")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Photograph an issue, classify it and, once confirmed, report it
    Report {
        /// Photo to report (any format the image decoder understands)
        photo: PathBuf,
        #[arg(long, allow_hyphen_values = true, requires = "longitude")]
        latitude: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "latitude")]
        longitude: Option<f64>,
        #[arg(long, short = 'y', default_value_t = false, help = "Grant permissions and confirm without prompting")]
        yes: bool,
        #[arg(long, default_value_t = false, help = "Refuse location access")]
        deny_location: bool,
        #[arg(
            long,
            default_value_t = false,
            help = "Keep reports in memory and photos under LOCAL_STORAGE_PATH (or a temp dir); no database"
        )]
        dry_run: bool,
    },
    /// Check that the inference service is reachable
    Health,
    /// Apply database migrations
    Migrate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "civic-reporter",
            "report",
            "road.jpg",
            "--latitude",
            "-33.8688",
            "--longitude",
            "151.2093",
            "-y",
        ])
        .unwrap();

        match cli.command {
            Commands::Report {
                photo,
                latitude,
                longitude,
                yes,
                deny_location,
                dry_run,
            } => {
                assert_eq!(photo, PathBuf::from("road.jpg"));
                assert_eq!(latitude, Some(-33.8688));
                assert_eq!(longitude, Some(151.2093));
                assert!(yes);
                assert!(!deny_location);
                assert!(!dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn latitude_requires_longitude() {
        let result = Cli::try_parse_from(["civic-reporter", "report", "road.jpg", "--latitude", "12.9"]);
        assert!(result.is_err());
    }
}

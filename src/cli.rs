use clap::{Parser, Subcommand};
use farmweather::logic::fetcher::MAX_HISTORY_DAYS;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "farmweather",
    version,
    about = "Weather-driven crop and risk recommendations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// City query overriding the configured location, e.g. "Ames,US"
    #[arg(long, global = true, conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,

    /// Latitude overriding the configured location
    #[arg(long, global = true, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude overriding the configured location
    #[arg(long, global = true, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn has_location_override(&self) -> bool {
        self.city.is_some() || (self.lat.is_some() && self.lon.is_some())
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Current conditions
    Current,
    /// 5-day forecast in 3-hour steps
    Forecast,
    /// Hourly history for the last N days
    History {
        #[arg(long, default_value_t = 7, value_parser = history_days())]
        days: u32,
    },
    /// Ranked crop and weather-risk recommendations from recent history and the forecast
    Recommend {
        /// Days of history to score before the forecast
        #[arg(long, default_value_t = 30, value_parser = history_days())]
        history_days: u32,
    },
    /// Weather risk alerts for the forecast period
    Alerts,
    /// Climate indicators, anomalies, patterns and trends from history
    Analyze {
        #[arg(long, default_value_t = 30, value_parser = history_days())]
        days: u32,
    },
    /// Suitability insight for one crop
    Crop {
        name: String,
        #[arg(long, default_value_t = 30, value_parser = history_days())]
        days: u32,
    },
    /// List the crop catalog
    Crops,
    /// Validate config and test the API connection
    Check,
    /// Re-run interactive setup
    Init,
}

fn history_days() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_HISTORY_DAYS))
}

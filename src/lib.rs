pub mod config;
pub mod datasources;
pub mod error;
pub mod logic;
pub mod models;
pub mod report;

pub use config::Config;
pub use error::{FarmWeatherError, FetchError, InsufficientDataError, Result};
pub use logic::{FetchMode, RecommendationScorer, WeatherFetcher};
pub use models::{LocationId, Recommendation, WeatherObservation, WeatherSeries};

pub mod calculations;
pub mod fetcher;
pub mod patterns;
pub mod scoring;
pub mod seasonal;

pub use fetcher::{FetchMode, WeatherFetcher};
pub use scoring::{RecommendationScorer, ScoringStrategy, StrategySet};

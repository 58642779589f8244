pub mod crop_suitability;
pub mod engine;
pub mod weather_risk;

pub use crop_suitability::{ClimateProfile, CropSuitabilityStrategy};
pub use engine::StrategySet;
pub use weather_risk::WeatherRiskStrategy;

use crate::config::ScoringConfig;
use crate::error::InsufficientDataError;
use crate::models::{Recommendation, WeatherSeries};

/// A scoring function that turns a weather series into recommendations
pub trait ScoringStrategy: Send + Sync {
    /// Unique identifier for this strategy
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Score a non-empty series. Output order is not significant.
    fn score(&self, series: &WeatherSeries) -> Vec<Recommendation>;
}

/// Applies a [`ScoringStrategy`] to a series, enforcing a minimum number of
/// observations and ranking the result by descending confidence.
pub struct RecommendationScorer {
    min_observations: usize,
    strategy: Box<dyn ScoringStrategy>,
}

impl RecommendationScorer {
    pub fn new(strategy: Box<dyn ScoringStrategy>, min_observations: usize) -> Self {
        Self {
            min_observations,
            strategy,
        }
    }

    /// Crop suitability plus weather risk, tuned by `config`
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(
            Box::new(StrategySet::standard(config)),
            config.min_observations,
        )
    }

    pub fn with_strategy(config: &ScoringConfig, strategy: Box<dyn ScoringStrategy>) -> Self {
        Self::new(strategy, config.min_observations)
    }

    pub fn min_observations(&self) -> usize {
        self.min_observations
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn score(
        &self,
        series: &WeatherSeries,
    ) -> Result<Vec<Recommendation>, InsufficientDataError> {
        // An empty series never scores, whatever the configured minimum
        let required = self.min_observations.max(1);
        if series.len() < required {
            return Err(InsufficientDataError {
                required,
                actual: series.len(),
            });
        }

        let mut recommendations = self.strategy.score(series);
        recommendations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        tracing::debug!(
            "{} produced {} recommendations from {} observations",
            self.strategy.id(),
            recommendations.len(),
            series.len()
        );

        Ok(recommendations)
    }
}

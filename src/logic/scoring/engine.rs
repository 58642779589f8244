use super::{CropSuitabilityStrategy, ScoringStrategy, WeatherRiskStrategy};
use crate::config::ScoringConfig;
use crate::models::{Recommendation, WeatherSeries};

/// Runs several strategies and concatenates their output
pub struct StrategySet {
    strategies: Vec<Box<dyn ScoringStrategy>>,
}

impl StrategySet {
    pub fn new(strategies: Vec<Box<dyn ScoringStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn standard(config: &ScoringConfig) -> Self {
        let strategies: Vec<Box<dyn ScoringStrategy>> = vec![
            Box::new(CropSuitabilityStrategy::from_config(config)),
            Box::new(WeatherRiskStrategy),
        ];

        Self { strategies }
    }

    pub fn list_strategies(&self) -> Vec<(&'static str, &'static str)> {
        self.strategies.iter().map(|s| (s.id(), s.name())).collect()
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::standard(&ScoringConfig::default())
    }
}

impl ScoringStrategy for StrategySet {
    fn id(&self) -> &'static str {
        "standard"
    }

    fn name(&self) -> &'static str {
        "Crop Suitability and Weather Risk"
    }

    fn score(&self, series: &WeatherSeries) -> Vec<Recommendation> {
        self.strategies
            .iter()
            .flat_map(|strategy| strategy.score(series))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scoring::test_support::series_from;
    use crate::models::RecommendationCategory;

    #[test]
    fn standard_set_lists_both_strategies() {
        let set = StrategySet::default();
        assert_eq!(
            set.list_strategies(),
            vec![
                ("crop_suitability", "Crop Suitability"),
                ("weather_risk", "Weather Risk Alerts"),
            ]
        );
    }

    #[test]
    fn combined_output_concatenates() {
        let set = StrategySet::default();
        let series = series_from(3, &[(-3.0, 0.0, 2.0); 8]);

        let crops = CropSuitabilityStrategy::default().score(&series);
        let risks = WeatherRiskStrategy.score(&series);
        let combined = set.score(&series);

        assert_eq!(combined.len(), crops.len() + risks.len());
        assert!(combined
            .iter()
            .any(|r| r.category == RecommendationCategory::Frost));
        assert!(combined
            .iter()
            .any(|r| r.category == RecommendationCategory::CropSuitability));
    }
}

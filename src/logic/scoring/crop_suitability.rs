use super::ScoringStrategy;
use crate::config::ScoringConfig;
use crate::models::{
    CropProfile, DailySummary, Recommendation, RecommendationCategory, Season, Severity,
    WeatherSeries, CROP_CATALOG,
};
use chrono::Datelike;

const TEMPERATURE_WEIGHT: f64 = 0.6;
const RAINFALL_WEIGHT: f64 = 0.4;
const DROUGHT_PENALTY: f64 = 0.7;
const FROST_PENALTY: f64 = 0.8;

/// Climate indicators the crop scores are computed from, built from daily
/// summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateProfile {
    pub avg_temp_c: f64,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub total_rainfall_mm: f64,
    /// Total rainfall scaled to a 365-day year
    pub annual_rainfall_mm: f64,
    pub days: usize,
    pub frost_risk: bool,
    pub drought_risk: bool,
}

impl ClimateProfile {
    pub fn from_series(series: &WeatherSeries) -> Option<Self> {
        Self::from_days(&series.daily_summaries())
    }

    pub fn from_days(days: &[DailySummary]) -> Option<Self> {
        if days.is_empty() {
            return None;
        }

        let count = days.len() as f64;
        let avg_temp_c = days.iter().map(|d| d.temp_mean_c).sum::<f64>() / count;
        let min_temp_c = days.iter().map(|d| d.temp_min_c).reduce(f64::min)?;
        let max_temp_c = days.iter().map(|d| d.temp_max_c).reduce(f64::max)?;
        let total_rainfall_mm: f64 = days.iter().map(|d| d.precipitation_mm).sum();

        let frost_days = days.iter().filter(|d| d.temp_min_c < 0.0).count();

        // 13 or more dry days in any 15-day window, only judged on a month of data
        let drought_risk = days.len() > 30
            && days
                .windows(15)
                .any(|w| w.iter().filter(|d| d.precipitation_mm < 1.0).count() >= 13);

        Some(Self {
            avg_temp_c,
            min_temp_c,
            max_temp_c,
            total_rainfall_mm,
            annual_rainfall_mm: total_rainfall_mm * 365.0 / count,
            days: days.len(),
            frost_risk: frost_days > 5,
            drought_risk,
        })
    }
}

/// How well temperatures match a crop, in `0.1..=1.0`
pub fn temperature_score(climate: &ClimateProfile, crop: &CropProfile) -> f64 {
    if climate.max_temp_c < crop.min_temp_c || climate.min_temp_c > crop.max_temp_c {
        return 0.1;
    }

    let optimal = 1.0 - ((climate.avg_temp_c - crop.optimal_temp_c).abs() / 15.0).min(1.0);

    let mut penalty = 0.0;
    if climate.min_temp_c < crop.min_temp_c && crop.min_temp_c > 0.0 {
        penalty += 0.3 * (crop.min_temp_c - climate.min_temp_c) / crop.min_temp_c;
    }
    if climate.max_temp_c > crop.max_temp_c && crop.max_temp_c > 0.0 {
        penalty += 0.3 * (climate.max_temp_c - crop.max_temp_c) / crop.max_temp_c;
    }

    (optimal * (1.0 - penalty)).clamp(0.1, 1.0)
}

/// How well annual rainfall matches a crop, in `0.3..=1.0`
pub fn rainfall_score(annual_rainfall_mm: f64, crop: &CropProfile) -> f64 {
    let (min, max) = (crop.min_rainfall_mm, crop.max_rainfall_mm);

    if annual_rainfall_mm < min * 0.5 {
        // Irrigation required
        return 0.3;
    }
    if annual_rainfall_mm > max * 1.5 {
        return 0.4;
    }

    if (min..=max).contains(&annual_rainfall_mm) {
        let width = max - min;
        let position = if width > 0.0 {
            (annual_rainfall_mm - min) / width
        } else {
            0.5
        };
        // Best in the middle of the band
        return 0.8 + (1.0 - (0.5 - position).abs()) * 0.2;
    }

    if annual_rainfall_mm < min {
        0.4 + (annual_rainfall_mm / min) * 0.4
    } else {
        0.4 + (max / annual_rainfall_mm).min(1.0) * 0.4
    }
}

/// Component and combined scores for one crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropAssessment {
    pub crop: &'static CropProfile,
    pub temperature_score: f64,
    pub rainfall_score: f64,
    pub overall: f64,
}

impl CropAssessment {
    /// Scores with drought and frost penalties applied for intolerant crops
    pub fn evaluate(crop: &'static CropProfile, climate: &ClimateProfile) -> Self {
        let mut temperature = temperature_score(climate, crop);
        let mut rainfall = rainfall_score(climate.annual_rainfall_mm, crop);

        if climate.drought_risk && !crop.drought_tolerant {
            rainfall *= DROUGHT_PENALTY;
        }
        if climate.frost_risk && !crop.frost_tolerant {
            temperature *= FROST_PENALTY;
        }

        Self {
            crop,
            temperature_score: temperature,
            rainfall_score: rainfall,
            overall: temperature * TEMPERATURE_WEIGHT + rainfall * RAINFALL_WEIGHT,
        }
    }

    fn reasons(&self, climate: &ClimateProfile) -> Vec<String> {
        let mut reasons = Vec::new();

        reasons.push(match self.temperature_score {
            s if s > 0.8 => format!(
                "Temperature range ({:.1}°C to {:.1}°C) is ideal",
                climate.min_temp_c, climate.max_temp_c
            ),
            s if s > 0.6 => "Temperature range is suitable".to_string(),
            s if s > 0.4 => "Temperature range is acceptable but not optimal".to_string(),
            _ => "Temperature range may be challenging".to_string(),
        });

        reasons.push(
            match self.rainfall_score {
                s if s > 0.8 => "Precipitation levels are ideal",
                s if s > 0.6 => "Precipitation levels are suitable",
                s if s > 0.4 => "Precipitation levels are acceptable with proper irrigation",
                _ => "Irrigation will be necessary",
            }
            .to_string(),
        );

        if climate.drought_risk {
            reasons.push(if self.crop.drought_tolerant {
                "Drought tolerance is advantageous in this climate".to_string()
            } else {
                "Drought risk requires careful water management".to_string()
            });
        }

        if climate.frost_risk {
            reasons.push(if self.crop.frost_tolerant {
                "Frost tolerance is beneficial in this climate".to_string()
            } else {
                "Frost protection measures may be needed".to_string()
            });
        }

        reasons
    }

    fn into_recommendation(self, climate: &ClimateProfile, season: Season) -> Recommendation {
        let explanation = format!("{}.", self.reasons(climate).join(". "));

        Recommendation::new(
            format!("crop_{}", self.crop.name.to_lowercase().replace(' ', "_")),
            self.crop.name,
            self.overall,
            RecommendationCategory::CropSuitability,
            Severity::Info,
        )
        .with_explanation(explanation)
        .with_data_point("Temperature match", format!("{:.0}%", self.temperature_score * 100.0))
        .with_data_point("Rainfall match", format!("{:.0}%", self.rainfall_score * 100.0))
        .with_data_point("Annualized rainfall", format!("{:.0} mm", climate.annual_rainfall_mm))
        .with_data_point("Planting season", season)
        .with_data_point("Crop seasons", self.crop.season_label())
    }
}

/// Crop suitability scoring
///
/// Ranks the in-season crops of the catalog by how well the observed
/// temperature and rainfall fit each crop's requirements.
///
/// - Temperature fit (60%): distance of the mean from the crop optimum,
///   penalized when the observed extremes leave the tolerated range
/// - Rainfall fit (40%): annualized rainfall against the crop band
/// - Drought risk scales rainfall fit by 0.7 and frost risk scales
///   temperature fit by 0.8 for crops without the matching tolerance
///
/// When no crop reaches the minimum confidence the best one is still
/// returned, marked as experimental.
pub struct CropSuitabilityStrategy {
    max_recommendations: usize,
    min_confidence: f64,
}

impl CropSuitabilityStrategy {
    pub fn new(max_recommendations: usize, min_confidence: f64) -> Self {
        Self {
            max_recommendations,
            min_confidence,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.max_crop_recommendations, config.min_crop_confidence)
    }
}

impl Default for CropSuitabilityStrategy {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl ScoringStrategy for CropSuitabilityStrategy {
    fn id(&self) -> &'static str {
        "crop_suitability"
    }

    fn name(&self) -> &'static str {
        "Crop Suitability"
    }

    fn score(&self, series: &WeatherSeries) -> Vec<Recommendation> {
        let (Some(climate), Some(last)) = (ClimateProfile::from_series(series), series.last())
        else {
            return Vec::new();
        };

        let season = Season::for_month(
            last.timestamp.month(),
            series.location().is_northern_hemisphere(),
        );

        let mut assessments: Vec<CropAssessment> = CROP_CATALOG
            .iter()
            .filter(|crop| crop.in_season(season))
            .map(|crop| CropAssessment::evaluate(crop, &climate))
            .collect();
        assessments.sort_by(|a, b| b.overall.total_cmp(&a.overall));

        let qualified: Vec<Recommendation> = assessments
            .iter()
            .take(self.max_recommendations)
            .filter(|a| a.overall >= self.min_confidence)
            .map(|a| a.into_recommendation(&climate, season))
            .collect();

        if !qualified.is_empty() {
            return qualified;
        }

        assessments
            .first()
            .map(|best| {
                let rec = best.into_recommendation(&climate, season);
                let explanation = format!(
                    "{} Consider as experimental with proper adaptations.",
                    rec.explanation.as_deref().unwrap_or_default()
                );
                rec.with_explanation(explanation)
                    .with_action("Trial on a small plot before committing a full field")
            })
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scoring::test_support::{ames, series_at, series_from, start};
    use crate::models::LocationId;
    use chrono::{TimeZone, Utc};

    fn climate(avg: f64, min: f64, max: f64, annual: f64) -> ClimateProfile {
        ClimateProfile {
            avg_temp_c: avg,
            min_temp_c: min,
            max_temp_c: max,
            total_rainfall_mm: annual,
            annual_rainfall_mm: annual,
            days: 365,
            frost_risk: false,
            drought_risk: false,
        }
    }

    fn corn() -> &'static CropProfile {
        CropProfile::find("Corn").unwrap()
    }

    #[test]
    fn temperature_score_cases() {
        assert!((temperature_score(&climate(25.0, 15.0, 30.0, 800.0), corn()) - 1.0).abs() < 1e-9);
        // Entirely below the tolerated range
        assert_eq!(temperature_score(&climate(2.0, -5.0, 5.0, 800.0), corn()), 0.1);
        // 5 degrees off optimum and 5 below the crop minimum
        let score = temperature_score(&climate(20.0, 5.0, 30.0, 800.0), corn());
        assert!((score - (2.0 / 3.0) * 0.85).abs() < 1e-9);
    }

    #[test]
    fn rainfall_score_cases() {
        let corn = corn();
        assert!((rainfall_score(850.0, corn) - 1.0).abs() < 1e-9);
        assert!((rainfall_score(500.0, corn) - 0.9).abs() < 1e-9);
        assert_eq!(rainfall_score(200.0, corn), 0.3);
        assert_eq!(rainfall_score(2000.0, corn), 0.4);
        assert!((rainfall_score(400.0, corn) - 0.72).abs() < 1e-9);
        assert!((rainfall_score(1500.0, corn) - 0.72).abs() < 1e-9);
    }

    #[test]
    fn risk_penalties_apply_to_intolerant_crops() {
        let mut risky = climate(25.0, 15.0, 30.0, 850.0);
        risky.drought_risk = true;
        risky.frost_risk = true;

        let corn = CropAssessment::evaluate(CropProfile::find("Corn").unwrap(), &risky);
        assert!((corn.rainfall_score - 0.7).abs() < 1e-9);
        assert!((corn.temperature_score - 0.8).abs() < 1e-9);

        let wheat_climate = climate(20.0, 15.0, 25.0, 675.0);
        let mut risky_wheat = wheat_climate.clone();
        risky_wheat.drought_risk = true;
        risky_wheat.frost_risk = true;
        let wheat = CropProfile::find("Wheat").unwrap();
        assert_eq!(
            CropAssessment::evaluate(wheat, &risky_wheat).overall,
            CropAssessment::evaluate(wheat, &wheat_climate).overall
        );
    }

    #[test]
    fn climate_profile_flags_frost_and_drought() {
        // 40 daily observations, cold and dry
        let series = series_from(24, &[(-2.0, 0.0, 2.0); 40]);
        let profile = ClimateProfile::from_series(&series).unwrap();
        assert_eq!(profile.days, 40);
        assert!(profile.frost_risk);
        assert!(profile.drought_risk);

        // Drought is not judged on short series
        let short = series_from(24, &[(-2.0, 0.0, 2.0); 20]);
        assert!(!ClimateProfile::from_series(&short).unwrap().drought_risk);
    }

    #[test]
    fn rainfall_is_annualized_over_days() {
        // Four 3-hourly readings a day for 10 days, 1 mm each
        let series = series_from(6, &[(20.0, 1.0, 2.0); 40]);
        let profile = ClimateProfile::from_series(&series).unwrap();
        assert_eq!(profile.days, 10);
        assert!((profile.total_rainfall_mm - 40.0).abs() < 1e-9);
        assert!((profile.annual_rainfall_mm - 1460.0).abs() < 1e-9);
    }

    #[test]
    fn favorable_summer_returns_ranked_in_season_crops() {
        // 8 days in June, 0.3 mm every 3 hours (~876 mm/yr)
        let series = series_from(3, &[(22.0, 0.3, 3.0); 64]);
        let recs = CropSuitabilityStrategy::default().score(&series);

        assert!(!recs.is_empty());
        assert!(recs.len() <= 5);
        assert!(recs.iter().all(|r| r.confidence >= 0.4));
        assert!(recs.iter().any(|r| r.label == "Corn"));
        for rec in &recs {
            let crop = CropProfile::find(&rec.label).unwrap();
            assert!(crop.in_season(Season::Summer), "{}", rec.label);
        }
        let corn = recs.iter().find(|r| r.id == "crop_corn").unwrap();
        assert!(corn.explanation.as_deref().unwrap().contains("Precipitation levels are ideal"));
    }

    #[test]
    fn hostile_climate_falls_back_to_experimental_pick() {
        let series = series_from(3, &[(45.0, 0.0, 3.0); 16]);
        let recs = CropSuitabilityStrategy::default().score(&series);

        assert_eq!(recs.len(), 1);
        assert!(recs[0].confidence < 0.4);
        assert!(recs[0]
            .explanation
            .as_deref()
            .unwrap()
            .ends_with("Consider as experimental with proper adaptations."));
        assert!(recs[0].suggested_action.is_some());
    }

    #[test]
    fn southern_hemisphere_uses_flipped_season() {
        // June in Cape Town is winter
        let cape_town = LocationId::coordinates(-33.9, 18.4);
        let series = series_at(cape_town, start(), 3, &[(14.0, 0.3, 3.0); 16]);
        let recs = CropSuitabilityStrategy::new(15, 0.0).score(&series);

        assert!(!recs.is_empty());
        for rec in &recs {
            let crop = CropProfile::find(&rec.label).unwrap();
            assert!(crop.in_season(Season::Winter), "{}", rec.label);
        }
        assert!(recs.iter().all(|r| r.label != "Corn"));
    }

    #[test]
    fn season_follows_latest_observation() {
        let december = Utc.with_ymd_and_hms(2024, 12, 10, 0, 0, 0).unwrap();
        let series = series_at(ames(), december, 3, &[(2.0, 0.3, 3.0); 16]);
        let recs = CropSuitabilityStrategy::new(15, 0.0).score(&series);
        assert!(recs.iter().any(|r| r.label == "Wheat"));
        assert!(recs.iter().all(|r| r.label != "Tomatoes"));
    }
}

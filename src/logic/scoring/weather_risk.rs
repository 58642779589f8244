use super::ScoringStrategy;
use crate::models::{
    Recommendation, RecommendationCategory, Severity, WeatherObservation, WeatherSeries,
};
use chrono::{DateTime, Utc};

const EXTREME_HEAT_C: f64 = 35.0;
const FROST_C: f64 = 0.0;
const HEAVY_RAIN_MM: f64 = 25.0;
const HIGH_CUMULATIVE_RAIN_MM: f64 = 50.0;
const STRONG_WIND_MS: f64 = 10.0;
const DRY_TOTAL_MM: f64 = 5.0;
/// Five days of 3-hourly forecast points
const DRY_MIN_OBSERVATIONS: usize = 40;

/// Weather risk alerts
///
/// Flags hazards for field work and crops anywhere in the series:
/// - Extreme heat: any reading above 35°C (Critical)
/// - Frost: any reading below 0°C (Critical)
/// - Heavy rain: more than 25mm in a single observation (Warning)
/// - High cumulative rainfall: more than 50mm in total (Warning)
/// - Strong wind: above 10 m/s (Warning)
/// - Dry conditions: under 5mm across at least 40 observations (Advisory)
///
/// Confidence grows with how far past its threshold the worst reading is.
pub struct WeatherRiskStrategy;

impl ScoringStrategy for WeatherRiskStrategy {
    fn id(&self) -> &'static str {
        "weather_risk"
    }

    fn name(&self) -> &'static str {
        "Weather Risk Alerts"
    }

    fn score(&self, series: &WeatherSeries) -> Vec<Recommendation> {
        let mut alerts = Vec::new();

        if let Some(max_temp) = series.max_temperature().filter(|t| *t > EXTREME_HEAT_C) {
            let window = time_window(series, |o| o.temperature_c > EXTREME_HEAT_C);
            alerts.push(
                Recommendation::new(
                    "extreme_heat",
                    "Extreme Heat Warning",
                    exceedance_confidence(max_temp - EXTREME_HEAT_C, 10.0),
                    RecommendationCategory::ExtremeHeat,
                    Severity::Critical,
                )
                .with_explanation(format!(
                    "Temperatures exceed {:.0}°C during the period, peaking at {:.1}°C. \
                     High temperatures cause crop stress and raise water needs; flowering crops are particularly vulnerable.",
                    EXTREME_HEAT_C, max_temp
                ))
                .with_data_point("Max Temp", format!("{:.1}°C", max_temp))
                .with_data_point("When", window)
                .with_action(
                    "Increase irrigation frequency, shade sensitive crops and avoid midday field operations.",
                ),
            );
        }

        if let Some(min_temp) = series.min_temperature().filter(|t| *t < FROST_C) {
            let window = time_window(series, |o| o.temperature_c < FROST_C);
            alerts.push(
                Recommendation::new(
                    "frost",
                    "Frost Warning",
                    exceedance_confidence(FROST_C - min_temp, 5.0),
                    RecommendationCategory::Frost,
                    Severity::Critical,
                )
                .with_explanation(format!(
                    "Temperatures drop below freezing during the period, down to {:.1}°C. \
                     Frost can damage or kill crops, especially seedlings and flowering plants.",
                    min_temp
                ))
                .with_data_point("Min Temp", format!("{:.1}°C", min_temp))
                .with_data_point("When", window)
                .with_action(
                    "Cover sensitive crops, use frost protection and delay planting new seedlings.",
                ),
            );
        }

        let max_rain = series
            .iter()
            .map(|o| o.precipitation_mm)
            .reduce(f64::max)
            .unwrap_or(0.0);
        if max_rain > HEAVY_RAIN_MM {
            let onset = series
                .iter()
                .find(|o| o.precipitation_mm > HEAVY_RAIN_MM)
                .map(|o| format!("{} onwards", format_time(o.timestamp)))
                .unwrap_or_default();
            alerts.push(
                Recommendation::new(
                    "heavy_rain",
                    "Heavy Rain Alert",
                    exceedance_confidence(max_rain - HEAVY_RAIN_MM, HEAVY_RAIN_MM),
                    RecommendationCategory::HeavyRain,
                    Severity::Warning,
                )
                .with_explanation(format!(
                    "Heavy rainfall of up to {:.1}mm in a single observation. \
                     Heavy rain may cause soil erosion and waterlogging, and increases disease pressure.",
                    max_rain
                ))
                .with_data_point("Max Rain", format!("{:.1}mm", max_rain))
                .with_data_point("When", onset)
                .with_action(
                    "Check drainage systems, secure young plants and consider delaying pesticide application.",
                ),
            );
        }

        let total_rain = series.total_precipitation();
        let period = period_label(series);
        if total_rain > HIGH_CUMULATIVE_RAIN_MM {
            alerts.push(
                Recommendation::new(
                    "high_cumulative_rain",
                    "High Cumulative Rainfall",
                    exceedance_confidence(
                        total_rain - HIGH_CUMULATIVE_RAIN_MM,
                        HIGH_CUMULATIVE_RAIN_MM,
                    ),
                    RecommendationCategory::Rainfall,
                    Severity::Warning,
                )
                .with_explanation(format!(
                    "Total rainfall of {:.1}mm over the period. \
                     Persistent wet conditions increase disease risk and may delay field operations.",
                    total_rain
                ))
                .with_data_point("Total Rain", format!("{:.1}mm", total_rain))
                .with_data_point("Period", &period)
                .with_action(
                    "Monitor low-lying areas for flooding and check crops for signs of disease.",
                ),
            );
        }

        if let Some(max_wind) = series.max_wind_speed().filter(|w| *w > STRONG_WIND_MS) {
            let window = time_window(series, |o| o.wind_speed_ms > STRONG_WIND_MS);
            alerts.push(
                Recommendation::new(
                    "strong_wind",
                    "Strong Wind Warning",
                    exceedance_confidence(max_wind - STRONG_WIND_MS, STRONG_WIND_MS),
                    RecommendationCategory::Wind,
                    Severity::Warning,
                )
                .with_explanation(format!(
                    "Strong winds reach speeds of {:.1}m/s during the period. \
                     Wind may damage tall crops, increase evaporation and hamper spraying.",
                    max_wind
                ))
                .with_data_point("Max Wind", format!("{:.1}m/s", max_wind))
                .with_data_point("When", window)
                .with_action(
                    "Secure structures, provide windbreaks and avoid spraying during windy periods.",
                ),
            );
        }

        if total_rain < DRY_TOTAL_MM && series.len() >= DRY_MIN_OBSERVATIONS {
            alerts.push(
                Recommendation::new(
                    "dry_conditions",
                    "Dry Conditions Alert",
                    0.5 + 0.4 * (1.0 - total_rain / DRY_TOTAL_MM),
                    RecommendationCategory::Drought,
                    Severity::Advisory,
                )
                .with_explanation(format!(
                    "Limited rainfall ({:.1}mm) over the period. \
                     Extended dry conditions deplete soil moisture and stress crops.",
                    total_rain
                ))
                .with_data_point("Total Rain", format!("{:.1}mm", total_rain))
                .with_data_point("Period", &period)
                .with_action(
                    "Monitor soil moisture, prioritize irrigation for critical growth stages and mulch to conserve water.",
                ),
            );
        }

        alerts
    }
}

/// 0.6 at the threshold, rising to 1.0 once `excess` reaches `scale`
fn exceedance_confidence(excess: f64, scale: f64) -> f64 {
    0.6 + 0.4 * (excess / scale).clamp(0.0, 1.0)
}

fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%a %b %d, %H:%M").to_string()
}

/// First to last observation matching `pred`
fn time_window(series: &WeatherSeries, pred: impl Fn(&WeatherObservation) -> bool) -> String {
    let first = series.iter().find(|o| pred(o));
    let last = series.iter().rev().find(|o| pred(o));
    match (first, last) {
        (Some(first), Some(last)) => format!(
            "{} - {}",
            format_time(first.timestamp),
            format_time(last.timestamp)
        ),
        _ => String::new(),
    }
}

fn period_label(series: &WeatherSeries) -> String {
    match series.daily_summaries().len() {
        1 => "1 day".to_string(),
        n => format!("{} days", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scoring::test_support::series_from;

    fn ids(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn calm_weather_raises_nothing() {
        let series = series_from(3, &[(20.0, 0.5, 3.0); 16]);
        assert!(WeatherRiskStrategy.score(&series).is_empty());
    }

    #[test]
    fn extreme_heat_is_critical() {
        let series = series_from(3, &[(30.0, 0.5, 3.0), (36.0, 0.5, 3.0), (41.0, 0.5, 3.0)]);
        let recs = WeatherRiskStrategy.score(&series);

        assert_eq!(ids(&recs), vec!["extreme_heat"]);
        assert_eq!(recs[0].severity, Severity::Critical);
        assert!((recs[0].confidence - 0.84).abs() < 1e-9);
        assert!(recs[0]
            .explanation
            .as_deref()
            .unwrap()
            .starts_with("Temperatures exceed 35°C during the period, peaking at 41.0°C."));
        assert_eq!(recs[0].data_points[0].value, "41.0°C");
        assert_eq!(
            recs[0].data_points[1].value,
            "Sat Jun 01, 03:00 - Sat Jun 01, 06:00"
        );
    }

    #[test]
    fn exactly_at_threshold_does_not_alert() {
        let series = series_from(3, &[(35.0, 25.0, 10.0), (0.0, 0.0, 10.0)]);
        assert!(WeatherRiskStrategy.score(&series).is_empty());
    }

    #[test]
    fn frost_confidence_saturates() {
        let series = series_from(3, &[(-8.0, 0.5, 3.0), (-1.0, 0.5, 3.0)]);
        let recs = WeatherRiskStrategy.score(&series);

        assert_eq!(ids(&recs), vec!["frost"]);
        assert_eq!(recs[0].confidence, 1.0);
        assert_eq!(recs[0].category, RecommendationCategory::Frost);
    }

    #[test]
    fn heavy_and_cumulative_rain() {
        let series = series_from(3, &[(18.0, 30.0, 3.0), (18.0, 12.0, 3.0), (18.0, 20.0, 3.0)]);
        let recs = WeatherRiskStrategy.score(&series);

        assert_eq!(ids(&recs), vec!["heavy_rain", "high_cumulative_rain"]);
        assert_eq!(recs[0].data_points[1].value, "Sat Jun 01, 00:00 onwards");
        assert_eq!(recs[1].data_points[1].value, "1 day");
    }

    #[test]
    fn strong_wind_is_a_warning() {
        let series = series_from(3, &[(18.0, 0.5, 4.0), (18.0, 0.5, 14.0)]);
        let recs = WeatherRiskStrategy.score(&series);

        assert_eq!(ids(&recs), vec!["strong_wind"]);
        assert_eq!(recs[0].severity, Severity::Warning);
        assert!((recs[0].confidence - 0.76).abs() < 1e-9);
    }

    #[test]
    fn dry_conditions_need_a_full_forecast() {
        let dry = series_from(3, &[(22.0, 0.0, 3.0); 40]);
        let recs = WeatherRiskStrategy.score(&dry);
        assert_eq!(ids(&recs), vec!["dry_conditions"]);
        assert_eq!(recs[0].severity, Severity::Advisory);
        assert!((recs[0].confidence - 0.9).abs() < 1e-9);
        assert_eq!(recs[0].data_points[1].value, "5 days");

        let short = series_from(3, &[(22.0, 0.0, 3.0); 39]);
        assert!(WeatherRiskStrategy.score(&short).is_empty());
    }
}

//! Plain-text and JSON rendering for the command line.

use crate::error::Result;
use crate::logic::calculations::{
    ClimateIndicators, ClimateTrends, CropInsight, ExtremeEvent, GrowingSeasonStatus,
};
use crate::logic::patterns::PatternAnalysis;
use crate::logic::seasonal::SeasonalGuidance;
use crate::models::{DailySummary, LocationId, Recommendation, WeatherSeries, CROP_CATALOG};
use serde::Serialize;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn optional(value: Option<f64>, unit: &str) -> String {
    value
        .map(|v| format!("{:.1}{}", v, unit))
        .unwrap_or_else(|| "-".to_string())
}

pub fn series_table(series: &WeatherSeries) -> String {
    let mut lines = vec![
        format!("Weather for {} ({} observations)", series.location(), series.len()),
        format!(
            "{:<17} {:>7} {:>13} {:>7} {:>5} {:>7}  {}",
            "Time (UTC)", "Temp", "Low/High", "Rain", "Hum", "Wind", "Conditions"
        ),
    ];

    for obs in series {
        lines.push(format!(
            "{:<17} {:>7} {:>13} {:>7} {:>5} {:>7}  {} {}",
            obs.timestamp.format("%Y-%m-%d %H:%M"),
            format!("{:.1}°C", obs.temperature_c),
            format!("{:.1}/{:.1}", obs.low_c(), obs.high_c()),
            format!("{:.1}mm", obs.precipitation_mm),
            format!("{:.0}%", obs.humidity_percent),
            format!("{:.1}m/s", obs.wind_speed_ms),
            obs.condition.symbol(),
            obs.condition,
        ));
    }

    if let Some(obs) = series.first().filter(|_| series.len() == 1) {
        lines.push(format!(
            "Feels like {}, pressure {}, cloud cover {}",
            optional(obs.feels_like_c, "°C"),
            optional(obs.pressure_hpa, " hPa"),
            optional(obs.cloud_cover_percent, "%"),
        ));
    }

    lines.join("\n")
}

pub fn daily_table(days: &[DailySummary]) -> String {
    let mut lines = vec![format!(
        "{:<10} {:>7} {:>7} {:>7} {:>8} {:>5} {:>8}  {}",
        "Date", "Min", "Max", "Mean", "Rain", "Hum", "Wind", "Conditions"
    )];

    for day in days {
        lines.push(format!(
            "{:<10} {:>7} {:>7} {:>7} {:>8} {:>5} {:>8}  {} {}",
            day.date,
            format!("{:.1}°C", day.temp_min_c),
            format!("{:.1}°C", day.temp_max_c),
            format!("{:.1}°C", day.temp_mean_c),
            format!("{:.1}mm", day.precipitation_mm),
            format!("{:.0}%", day.humidity_mean),
            format!("{:.1}m/s", day.wind_max_ms),
            day.dominant_condition.symbol(),
            day.dominant_condition,
        ));
    }

    lines.join("\n")
}

pub fn recommendations_table(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "No recommendations.".to_string();
    }

    let mut lines = Vec::new();
    for (rank, rec) in recommendations.iter().enumerate() {
        lines.push(format!(
            "{:>2}. {} {} [{}] {:.0}%",
            rank + 1,
            rec.severity.symbol(),
            rec.label,
            rec.category,
            rec.confidence_percent()
        ));
        if let Some(explanation) = &rec.explanation {
            lines.push(format!("    {}", explanation));
        }
        for point in &rec.data_points {
            lines.push(format!("    {}: {}", point.label, point.value));
        }
        if let Some(action) = &rec.suggested_action {
            lines.push(format!("    → {}", action));
        }
    }

    lines.join("\n")
}

/// Everything `analyze` reports for a location
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub location: LocationId,
    pub indicators: ClimateIndicators,
    pub events: Vec<ExtremeEvent>,
    pub trends: Option<ClimateTrends>,
    pub trend_note: Option<String>,
    pub growing_season: Option<GrowingSeasonStatus>,
    pub patterns: PatternAnalysis,
    pub guidance: SeasonalGuidance,
}

impl AnalysisReport {
    pub fn render(&self) -> String {
        let ind = &self.indicators;
        let mut lines = vec![
            format!("Climate analysis for {} ({} days)", self.location, ind.days),
            String::new(),
            self.patterns.summary.clone(),
            String::new(),
            format!("  Mean temperature     {:.1}°C", ind.mean_temp_c),
            format!("  Temperature range    {:.1}°C", ind.temp_range_c),
            format!("  Growing degree days  {:.0}", ind.growing_degree_days),
            format!("  Total rainfall       {:.1}mm", ind.total_rainfall_mm),
            format!(
                "  Rainy days           {} ({} heavy)",
                ind.rainy_days, ind.heavy_rain_days
            ),
            format!("  Frost days           {}", ind.frost_days),
            format!("  Heat stress days     {}", ind.heat_stress_days),
            format!(
                "  Longest dry spell    {} days ({} spells of 5+ days)",
                ind.longest_dry_spell, ind.dry_spells_5d_plus
            ),
        ];

        for season in &ind.seasons {
            lines.push(format!(
                "  {:<20} {:.1}°C, {:.1}mm",
                season.season, season.mean_temp_c, season.total_rainfall_mm
            ));
        }

        if let Some(status) = &self.growing_season {
            lines.push(format!("  Growing season       {}", status));
        }

        lines.push(String::new());
        lines.push("Extreme events".to_string());
        if self.events.is_empty() {
            lines.push("  None".to_string());
        }
        for event in &self.events {
            lines.push(format!(
                "  {} .. {}  {}: {}",
                event.start, event.end, event.kind, event.description
            ));
        }

        lines.push(String::new());
        lines.push("Trends".to_string());
        if let Some(trends) = &self.trends {
            for description in &trends.descriptions {
                lines.push(format!("  {}", description));
            }
        }
        if let Some(note) = &self.trend_note {
            lines.push(format!("  {}", note));
        }

        lines.push(String::new());
        lines.push("Anomalies".to_string());
        if self.patterns.anomalies.is_empty() {
            lines.push("  None".to_string());
        }
        for anomaly in &self.patterns.anomalies {
            lines.push(format!("  {}  {}", anomaly.date, anomaly.description));
        }

        lines.push(String::new());
        lines.push("Weather patterns".to_string());
        for pattern in &self.patterns.patterns {
            lines.push(format!(
                "  {:>3.0}%  {} ({:.1}°C, {:.1}mm, {:.0}%, {:.1}m/s)",
                pattern.share_percent,
                pattern.description,
                pattern.mean_temp_c,
                pattern.mean_rain_mm,
                pattern.mean_humidity,
                pattern.mean_wind_ms
            ));
        }

        if let Some(outlook) = &self.patterns.outlook {
            lines.push(String::new());
            lines.push("Forecast outlook".to_string());
            lines.push(format!("  {}", outlook.analysis));
            lines.extend(outlook.notes.iter().map(|n| format!("  - {}", n)));
        }

        lines.push(String::new());
        lines.push(format!("{} guidance", self.guidance.season));
        lines.push(format!("  {}", self.guidance.summary));
        for month in &self.guidance.monthly_tasks {
            lines.push(format!("  {}", month.month));
            lines.extend(month.tasks.iter().map(|t| format!("    - {}", t)));
        }

        lines.join("\n")
    }
}

pub fn crop_insight_report(insight: &CropInsight) -> String {
    let mut lines = vec![
        format!("{}: {}", insight.crop, insight.suitability),
        insight.summary.clone(),
        format!(
            "Temperature match {:.0}%, rainfall match {:.0}%",
            insight.temperature_score * 100.0,
            insight.rainfall_score * 100.0
        ),
        String::new(),
        "Challenges".to_string(),
    ];
    lines.extend(insight.challenges.iter().map(|c| format!("  - {}", c)));
    lines.push(String::new());
    lines.push("Management".to_string());
    lines.extend(insight.actions.iter().map(|a| format!("  - {}", a)));
    lines.join("\n")
}

pub fn crop_catalog_table() -> String {
    let mut lines = vec![format!(
        "{:<11} {:>17} {:>14} {:>8} {:>6}  {}",
        "Crop", "Temp min/opt/max", "Rain (mm)", "Drought", "Frost", "Season"
    )];

    for crop in CROP_CATALOG.iter() {
        lines.push(format!(
            "{:<11} {:>17} {:>14} {:>8} {:>6}  {}",
            crop.name,
            format!(
                "{:.0}/{:.0}/{:.0}°C",
                crop.min_temp_c, crop.optimal_temp_c, crop.max_temp_c
            ),
            format!("{:.0}-{:.0}", crop.min_rainfall_mm, crop.max_rainfall_mm),
            if crop.drought_tolerant { "yes" } else { "no" },
            if crop.frost_tolerant { "yes" } else { "no" },
            crop.season_label(),
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecommendationCategory, Severity, WeatherObservation};
    use chrono::{TimeZone, Utc};

    fn single_series() -> WeatherSeries {
        let location = LocationId::named("Ames,US");
        let mut obs = WeatherObservation::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            location.clone(),
            22.5,
            0.4,
            65.0,
            3.5,
        );
        obs.pressure_hpa = Some(1013.0);
        WeatherSeries::from_observations(location, vec![obs]).unwrap()
    }

    #[test]
    fn series_table_lists_observations() {
        let table = series_table(&single_series());
        assert!(table.starts_with("Weather for Ames,US (1 observations)"));
        assert!(table.contains("2024-06-01 12:00"));
        assert!(table.contains("22.5°C"));
        assert!(table.contains("pressure 1013.0 hPa"));
        assert!(table.contains("Feels like -"));
    }

    #[test]
    fn recommendations_are_numbered_in_order() {
        let recs = vec![
            Recommendation::new(
                "frost",
                "Frost Warning",
                0.9,
                RecommendationCategory::Frost,
                Severity::Critical,
            )
            .with_action("Cover sensitive crops."),
            Recommendation::new(
                "crop_wheat",
                "Wheat",
                0.72,
                RecommendationCategory::CropSuitability,
                Severity::Info,
            ),
        ];

        let text = recommendations_table(&recs);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], " 1. ! Frost Warning [Frost] 90%");
        assert_eq!(lines[1], "    → Cover sensitive crops.");
        assert_eq!(lines[2], " 2. ℹ Wheat [Crop Suitability] 72%");

        assert_eq!(recommendations_table(&[]), "No recommendations.");
    }

    #[test]
    fn series_json_carries_location_and_observations() {
        let json = to_json(&single_series()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["location"], "Ames,US");
        assert_eq!(value["observations"][0]["temperature_c"], 22.5);
        assert_eq!(value["observations"][0]["condition"], "Clear");
    }

    #[test]
    fn analysis_report_renders_every_section() {
        use crate::logic::calculations::climate_indicators;
        use crate::logic::patterns::analyze_patterns;
        use crate::logic::seasonal::seasonal_guidance;
        use crate::models::Season;

        let series = single_series();
        let days = series.daily_summaries();
        let report = AnalysisReport {
            location: series.location().clone(),
            indicators: climate_indicators(&days, true).unwrap(),
            events: Vec::new(),
            trends: None,
            trend_note: Some("Trend analysis skipped".to_string()),
            growing_season: None,
            patterns: analyze_patterns(&days, Some(&series), None),
            guidance: seasonal_guidance(Season::Summer, true, &[], &days),
        };

        let text = report.render();
        assert!(text.starts_with("Climate analysis for Ames,US (1 days)"));
        assert!(text.contains("Based on historical weather data"));
        assert!(text.contains("Anomalies\n  None"));
        assert!(text.contains("Weather patterns"));
        assert!(text.contains("Forecast outlook"));
        assert!(text.contains("Summer guidance"));
        assert!(
            text.contains("  July\n    - Maintain consistent irrigation during peak water demand")
        );

        let json: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert_eq!(json["guidance"]["monthly_tasks"][0]["month"], "June");
        assert_eq!(json["patterns"]["patterns"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn catalog_table_has_every_crop() {
        let table = crop_catalog_table();
        assert_eq!(table.lines().count(), CROP_CATALOG.len() + 1);
        assert!(table.contains("Alfalfa"));
        assert!(table.contains("Perennial"));
    }
}

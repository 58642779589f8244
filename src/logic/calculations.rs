use crate::error::InsufficientDataError;
use crate::logic::scoring::crop_suitability::{rainfall_score, temperature_score, ClimateProfile};
use crate::models::{CropProfile, DailySummary, GrowingSeason, Season};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Base temperature for growing degree days, °C
pub const GDD_BASE_C: f64 = 10.0;
/// A day with less than this much rain counts as dry
pub const DRY_DAY_MM: f64 = 1.0;

const HEAVY_RAIN_DAY_MM: f64 = 20.0;
const HEAT_STRESS_C: f64 = 30.0;

const EXTREME_HEAT_C: f64 = 35.0;
const EXTREME_RAIN_MM: f64 = 30.0;
const EXTREME_COLD_C: f64 = -5.0;
const DROUGHT_DAYS: usize = 15;

const MIN_TREND_POINTS: usize = 10;
const MIN_TREND_DAYS: usize = 30;
const RECENT_CHANGE_C: f64 = 1.0;

/// Agricultural climate indicators over a run of days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateIndicators {
    pub days: usize,
    pub mean_temp_c: f64,
    pub temp_range_c: f64,
    pub growing_degree_days: f64,
    pub total_rainfall_mm: f64,
    pub rainy_days: usize,
    pub heavy_rain_days: usize,
    pub frost_days: usize,
    pub heat_stress_days: usize,
    pub longest_dry_spell: usize,
    pub dry_spells_5d_plus: usize,
    pub seasons: Vec<SeasonalClimate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalClimate {
    pub season: Season,
    pub mean_temp_c: f64,
    pub total_rainfall_mm: f64,
}

pub fn climate_indicators(days: &[DailySummary], northern: bool) -> Option<ClimateIndicators> {
    if days.is_empty() {
        return None;
    }

    let count = days.len() as f64;
    let max_temp = days.iter().map(|d| d.temp_max_c).reduce(f64::max)?;
    let min_temp = days.iter().map(|d| d.temp_min_c).reduce(f64::min)?;

    let spells = dry_spells(days);

    Some(ClimateIndicators {
        days: days.len(),
        mean_temp_c: days.iter().map(|d| d.temp_mean_c).sum::<f64>() / count,
        temp_range_c: max_temp - min_temp,
        growing_degree_days: days
            .iter()
            .map(|d| (d.temp_mean_c - GDD_BASE_C).max(0.0))
            .sum(),
        total_rainfall_mm: days.iter().map(|d| d.precipitation_mm).sum(),
        rainy_days: days.iter().filter(|d| d.precipitation_mm > 0.0).count(),
        heavy_rain_days: days
            .iter()
            .filter(|d| d.precipitation_mm > HEAVY_RAIN_DAY_MM)
            .count(),
        frost_days: days.iter().filter(|d| d.temp_min_c < 0.0).count(),
        heat_stress_days: days.iter().filter(|d| d.temp_max_c > HEAT_STRESS_C).count(),
        longest_dry_spell: spells.iter().copied().max().unwrap_or(0),
        dry_spells_5d_plus: spells.iter().filter(|&&len| len >= 5).count(),
        seasons: seasonal_climate(days, northern),
    })
}

/// Lengths of consecutive dry-day runs
fn dry_spells(days: &[DailySummary]) -> Vec<usize> {
    let mut spells = Vec::new();
    let mut current = 0;

    for day in days {
        if day.precipitation_mm < DRY_DAY_MM {
            current += 1;
        } else if current > 0 {
            spells.push(current);
            current = 0;
        }
    }
    if current > 0 {
        spells.push(current);
    }

    spells
}

fn seasonal_climate(days: &[DailySummary], northern: bool) -> Vec<SeasonalClimate> {
    [Season::Spring, Season::Summer, Season::Fall, Season::Winter]
        .into_iter()
        .filter_map(|season| {
            let in_season: Vec<&DailySummary> = days
                .iter()
                .filter(|d| Season::for_month(d.date.month(), northern) == season)
                .collect();
            if in_season.is_empty() {
                return None;
            }
            Some(SeasonalClimate {
                season,
                mean_temp_c: in_season.iter().map(|d| d.temp_mean_c).sum::<f64>()
                    / in_season.len() as f64,
                total_rainfall_mm: in_season.iter().map(|d| d.precipitation_mm).sum(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtremeEventKind {
    HeatWave,
    HeavyRainfall,
    ColdSnap,
    Drought,
}

impl ExtremeEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtremeEventKind::HeatWave => "Heat Wave",
            ExtremeEventKind::HeavyRainfall => "Heavy Rainfall",
            ExtremeEventKind::ColdSnap => "Cold Snap",
            ExtremeEventKind::Drought => "Drought",
        }
    }
}

impl std::fmt::Display for ExtremeEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeEvent {
    pub kind: ExtremeEventKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration_days: usize,
    /// Peak temperature, rainfall or dry-day count depending on kind
    pub peak_value: f64,
    pub description: String,
}

/// Heat waves, heavy rainfall days, cold snaps and droughts, ordered by start date
pub fn extreme_events(days: &[DailySummary]) -> Vec<ExtremeEvent> {
    let mut events = Vec::new();

    for run in consecutive_runs(days, |d| d.temp_max_c > EXTREME_HEAT_C) {
        if run.len() < 3 {
            continue;
        }
        let peak = run.iter().map(|d| d.temp_max_c).fold(f64::MIN, f64::max);
        events.push(ExtremeEvent {
            kind: ExtremeEventKind::HeatWave,
            start: run[0].date,
            end: run[run.len() - 1].date,
            duration_days: run.len(),
            peak_value: peak,
            description: format!(
                "Heat wave with temperatures up to {:.1}°C for {} days",
                peak,
                run.len()
            ),
        });
    }

    for day in days.iter().filter(|d| d.precipitation_mm > EXTREME_RAIN_MM) {
        events.push(ExtremeEvent {
            kind: ExtremeEventKind::HeavyRainfall,
            start: day.date,
            end: day.date,
            duration_days: 1,
            peak_value: day.precipitation_mm,
            description: format!("Heavy rainfall of {:.1}mm", day.precipitation_mm),
        });
    }

    for run in consecutive_runs(days, |d| d.temp_min_c < EXTREME_COLD_C) {
        if run.len() < 2 {
            continue;
        }
        let low = run.iter().map(|d| d.temp_min_c).fold(f64::MAX, f64::min);
        events.push(ExtremeEvent {
            kind: ExtremeEventKind::ColdSnap,
            start: run[0].date,
            end: run[run.len() - 1].date,
            duration_days: run.len(),
            peak_value: low,
            description: format!(
                "Cold snap with temperatures down to {:.1}°C for {} days",
                low,
                run.len()
            ),
        });
    }

    // At most one drought per calendar month, dated by the first day that
    // closes a fully dry window
    let mut drought_months: Vec<(i32, u32)> = Vec::new();
    for window in days.windows(DROUGHT_DAYS) {
        if !window.iter().all(|d| d.precipitation_mm < DRY_DAY_MM) {
            continue;
        }
        let end = window[DROUGHT_DAYS - 1].date;
        let month = (end.year(), end.month());
        if drought_months.contains(&month) {
            continue;
        }
        drought_months.push(month);
        events.push(ExtremeEvent {
            kind: ExtremeEventKind::Drought,
            start: end - Duration::days(DROUGHT_DAYS as i64),
            end,
            duration_days: DROUGHT_DAYS,
            peak_value: DROUGHT_DAYS as f64,
            description: format!(
                "Drought period of {}+ days without significant rainfall",
                DROUGHT_DAYS
            ),
        });
    }

    events.sort_by_key(|e| e.start);
    events
}

/// Maximal runs of matching days on consecutive calendar dates
fn consecutive_runs(
    days: &[DailySummary],
    pred: impl Fn(&DailySummary) -> bool,
) -> Vec<Vec<&DailySummary>> {
    let mut runs: Vec<Vec<&DailySummary>> = Vec::new();

    for day in days.iter().filter(|d| pred(d)) {
        let extends = runs
            .last()
            .and_then(|run| run.last())
            .is_some_and(|prev| day.date - prev.date <= Duration::days(1));

        match runs.last_mut() {
            Some(run) if extends => run.push(day),
            _ => runs.push(vec![day]),
        }
    }

    runs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendField {
    Temperature,
    Precipitation,
    Humidity,
}

impl TrendField {
    fn value(&self, day: &DailySummary) -> f64 {
        match self {
            TrendField::Temperature => day.temp_mean_c,
            TrendField::Precipitation => day.precipitation_mm,
            TrendField::Humidity => day.humidity_mean,
        }
    }

    /// Smallest monthly change worth reporting
    fn threshold(&self) -> f64 {
        match self {
            TrendField::Temperature => 0.01,
            TrendField::Precipitation | TrendField::Humidity => 0.5,
        }
    }
}

/// Least-squares slope of `field` against day offset, scaled to 30 days.
/// `None` with fewer than ten days.
pub fn linear_trend_per_month(days: &[DailySummary], field: TrendField) -> Option<f64> {
    if days.len() < MIN_TREND_POINTS {
        return None;
    }

    let first = days[0].date;
    let points: Vec<(f64, f64)> = days
        .iter()
        .map(|d| ((d.date - first).num_days() as f64, field.value(d)))
        .collect();

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (cov, var) = points.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
        (
            cov + (x - mean_x) * (y - mean_y),
            var + (x - mean_x) * (x - mean_x),
        )
    });

    if var == 0.0 {
        return None;
    }

    Some(cov / var * 30.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub field: TrendField,
    pub per_month: f64,
}

impl Trend {
    pub fn describe(&self) -> String {
        let direction = if self.per_month > 0.0 {
            "increasing"
        } else {
            "decreasing"
        };
        match self.field {
            TrendField::Temperature => format!(
                "Temperature has been {} by approximately {:.2}°C per month.",
                direction,
                self.per_month.abs()
            ),
            TrendField::Precipitation => format!(
                "Precipitation has been {} by approximately {:.1}mm per month.",
                direction,
                self.per_month.abs()
            ),
            TrendField::Humidity => format!(
                "Humidity has been {} by approximately {:.1}% per month.",
                direction,
                self.per_month.abs()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateTrends {
    pub trends: Vec<Trend>,
    /// Mean temperature of the last 30 days minus the first 30
    pub recent_change_c: f64,
    pub descriptions: Vec<String>,
}

impl ClimateTrends {
    /// Descriptions of real trends, empty when nothing notable was found
    pub fn significant(&self) -> &[String] {
        if self.trends.is_empty() && self.recent_change_c.abs() <= RECENT_CHANGE_C {
            &[]
        } else {
            &self.descriptions
        }
    }
}

pub fn climate_trends(days: &[DailySummary]) -> Result<ClimateTrends, InsufficientDataError> {
    if days.len() < MIN_TREND_DAYS {
        return Err(InsufficientDataError {
            required: MIN_TREND_DAYS,
            actual: days.len(),
        });
    }

    let trends: Vec<Trend> = [
        TrendField::Temperature,
        TrendField::Precipitation,
        TrendField::Humidity,
    ]
    .into_iter()
    .filter_map(|field| {
        let per_month = linear_trend_per_month(days, field)?;
        (per_month.abs() > field.threshold()).then_some(Trend { field, per_month })
    })
    .collect();

    let mean_temp = |slice: &[DailySummary]| {
        slice.iter().map(|d| d.temp_mean_c).sum::<f64>() / slice.len() as f64
    };
    let recent_change_c =
        mean_temp(&days[days.len() - MIN_TREND_DAYS..]) - mean_temp(&days[..MIN_TREND_DAYS]);

    let mut descriptions: Vec<String> = trends.iter().map(Trend::describe).collect();
    if recent_change_c.abs() > RECENT_CHANGE_C {
        descriptions.push(format!(
            "The recent period has been {} than earlier periods by {:.1}°C on average.",
            if recent_change_c > 0.0 { "warmer" } else { "cooler" },
            recent_change_c.abs()
        ));
    }
    if descriptions.is_empty() {
        descriptions.push("No significant weather trends detected in the available data.".into());
    }

    Ok(ClimateTrends {
        trends,
        recent_change_c,
        descriptions,
    })
}

/// Growing window for a latitude and whether `month` falls inside it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowingSeasonStatus {
    pub window: GrowingSeason,
    pub month: u32,
    pub active: bool,
}

impl std::fmt::Display for GrowingSeasonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.window.is_year_round() {
            return write!(f, "Year-round growing season");
        }
        write!(
            f,
            "{} to {} ({})",
            month_name(self.window.start_month),
            month_name(self.window.end_month),
            if self.active {
                "currently in season"
            } else {
                "currently out of season"
            }
        )
    }
}

pub(crate) fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| chrono::Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("?")
}

pub fn growing_season(latitude: f64, month: u32) -> GrowingSeasonStatus {
    let window = GrowingSeason::for_latitude(latitude);
    GrowingSeasonStatus {
        window,
        month,
        active: window.contains(month),
    }
}

/// Narrative suitability assessment for a single crop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropInsight {
    pub crop: &'static str,
    pub overall_score: f64,
    pub temperature_score: f64,
    pub rainfall_score: f64,
    pub suitability: &'static str,
    pub summary: String,
    pub challenges: Vec<String>,
    pub actions: Vec<String>,
}

pub fn crop_insight(crop: &'static CropProfile, days: &[DailySummary]) -> Option<CropInsight> {
    let climate = ClimateProfile::from_days(days)?;
    let temp_score = temperature_score(&climate, crop);
    let rain_score = rainfall_score(climate.annual_rainfall_mm, crop);
    let overall = temp_score * 0.6 + rain_score * 0.4;

    let suitability = match overall {
        s if s > 0.8 => "Excellent match for this climate",
        s if s > 0.6 => "Good match with proper management",
        s if s > 0.4 => "Fair match with adaptations required",
        _ => "Challenging match, consider alternatives",
    };

    let mut summary = format!(
        "Overall climate suitability for {} is {:.0}%.",
        crop.name,
        overall * 100.0
    );
    if temp_score < 0.6 {
        summary.push_str(&format!(
            " The average temperature of {:.1}°C is {} the optimal {}°C for this crop.",
            climate.avg_temp_c,
            if climate.avg_temp_c < crop.optimal_temp_c {
                "below"
            } else {
                "above"
            },
            crop.optimal_temp_c
        ));
    }
    if rain_score < 0.6 {
        if climate.annual_rainfall_mm < crop.min_rainfall_mm {
            summary.push_str(&format!(
                " Annual rainfall of {:.0}mm is below the minimum {}mm needed.",
                climate.annual_rainfall_mm, crop.min_rainfall_mm
            ));
        } else if climate.annual_rainfall_mm > crop.max_rainfall_mm {
            summary.push_str(&format!(
                " Annual rainfall of {:.0}mm exceeds the maximum {}mm recommended.",
                climate.annual_rainfall_mm, crop.max_rainfall_mm
            ));
        }
    }

    let too_cold = climate.min_temp_c < crop.min_temp_c;
    let too_hot = climate.max_temp_c > crop.max_temp_c;
    let too_dry = climate.annual_rainfall_mm < crop.min_rainfall_mm;
    let too_wet = climate.annual_rainfall_mm > crop.max_rainfall_mm;
    let drought_exposed = climate.drought_risk && !crop.drought_tolerant;
    let frost_exposed = climate.frost_risk && !crop.frost_tolerant;

    let mut challenges = Vec::new();
    let mut actions: Vec<String> = Vec::new();

    if too_cold {
        challenges.push(format!(
            "Minimum temperatures of {:.1}°C may be too cold (crop minimum: {}°C)",
            climate.min_temp_c, crop.min_temp_c
        ));
        actions.push("Consider using row covers or high tunnels for cold protection".into());
        actions.push("Plant after risk of frost has passed".into());
    }
    if too_hot {
        challenges.push(format!(
            "Maximum temperatures of {:.1}°C may cause heat stress (crop maximum: {}°C)",
            climate.max_temp_c, crop.max_temp_c
        ));
        actions.push("Use shade cloth during peak heat periods".into());
        actions.push("Plant early to avoid peak summer heat for maturation".into());
    }
    if too_dry {
        challenges.push(format!(
            "Insufficient natural rainfall ({:.0}mm vs. needed {}mm)",
            climate.annual_rainfall_mm, crop.min_rainfall_mm
        ));
        actions.push("Implement efficient irrigation systems".into());
        actions.push("Use mulch to conserve soil moisture".into());
    }
    if too_wet {
        challenges.push(format!(
            "Excessive rainfall may increase disease pressure ({:.0}mm vs. optimal maximum {}mm)",
            climate.annual_rainfall_mm, crop.max_rainfall_mm
        ));
        actions.push("Ensure good drainage to prevent waterlogging".into());
        actions.push("Consider raised beds to improve drainage".into());
        actions.push("Implement disease monitoring and prevention strategies".into());
    }
    if drought_exposed {
        challenges.push(
            "Drought periods may affect crop development as this variety has low drought tolerance"
                .into(),
        );
        actions.push("Develop a drought contingency irrigation plan".into());
        actions.push("Consider drought-resistant varieties or alternative crops".into());
    }
    if frost_exposed {
        challenges.push(
            "Frost risk may damage crops as this variety has low frost tolerance".into(),
        );
        actions.push("Have frost protection measures ready (covers, sprinklers)".into());
        actions.push("Monitor weather forecasts closely during frost-risk periods".into());
    }

    if challenges.is_empty() {
        challenges.push("No major climate challenges identified for this crop".into());
    }
    if actions.is_empty() {
        actions.push("Follow standard agricultural practices for this crop".into());
        actions.push("Monitor for pests and diseases common to this crop".into());
    }

    Some(CropInsight {
        crop: crop.name,
        overall_score: overall,
        temperature_score: temp_score,
        rainfall_score: rain_score,
        suitability,
        summary,
        challenges,
        actions,
    })
}

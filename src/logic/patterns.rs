//! Anomaly detection, weather-type clustering and forecast comparison over
//! daily summaries.

use crate::logic::calculations::ClimateTrends;
use crate::models::{DailySummary, WeatherSeries};
use chrono::NaiveDate;
use serde::Serialize;

/// Mean, min and max temperature, humidity, rainfall and mean wind
const FEATURES: usize = 6;

/// Days further than this many standard deviations from the mean on any
/// feature are anomalous
pub const ANOMALY_Z: f64 = 2.5;
/// Anomaly detection needs at least this many days
pub const MIN_ANOMALY_DAYS: usize = 10;

const MAX_ANOMALIES: usize = 5;
const MAX_PATTERNS: usize = 5;
const KMEANS_ITERATIONS: usize = 100;

type Features = [f64; FEATURES];

fn features(day: &DailySummary) -> Features {
    [
        day.temp_mean_c,
        day.temp_min_c,
        day.temp_max_c,
        day.humidity_mean,
        day.precipitation_mm,
        day.wind_mean_ms,
    ]
}

/// Per-feature z-scores. Constant features score 0.
struct Standardizer {
    mean: Features,
    std_dev: Features,
}

impl Standardizer {
    fn fit(rows: &[Features]) -> Self {
        let n = rows.len().max(1) as f64;
        let mean: Features =
            std::array::from_fn(|i| rows.iter().map(|r| r[i]).sum::<f64>() / n);
        let std_dev = std::array::from_fn(|i| {
            (rows.iter().map(|r| (r[i] - mean[i]).powi(2)).sum::<f64>() / n).sqrt()
        });
        Self { mean, std_dev }
    }

    fn transform(&self, row: &Features) -> Features {
        std::array::from_fn(|i| {
            if self.std_dev[i] > 0.0 {
                (row[i] - self.mean[i]) / self.std_dev[i]
            } else {
                0.0
            }
        })
    }
}

/// Linearly interpolated quantile of the finite values, `q` in `[0, 1]`
pub fn quantile(values: impl IntoIterator<Item = f64>, q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    /// Largest absolute z-score across features
    pub score: f64,
    pub unusual: Vec<String>,
    pub description: String,
}

/// 5th and 95th percentiles used to explain what made a day stand out
struct UnusualBounds {
    temp_max_high: f64,
    temp_min_low: f64,
    rain_high: f64,
    wind_high: f64,
    humidity_high: f64,
    humidity_low: f64,
}

impl UnusualBounds {
    fn of(days: &[DailySummary]) -> Option<Self> {
        let column = |f: fn(&DailySummary) -> f64| days.iter().map(f);
        Some(Self {
            temp_max_high: quantile(column(|d| d.temp_max_c), 0.95)?,
            temp_min_low: quantile(column(|d| d.temp_min_c), 0.05)?,
            rain_high: quantile(column(|d| d.precipitation_mm), 0.95)?,
            wind_high: quantile(column(|d| d.wind_mean_ms), 0.95)?,
            humidity_high: quantile(column(|d| d.humidity_mean), 0.95)?,
            humidity_low: quantile(column(|d| d.humidity_mean), 0.05)?,
        })
    }

    fn explain(&self, day: &DailySummary) -> Vec<String> {
        let mut unusual = Vec::new();
        if day.temp_max_c > self.temp_max_high {
            unusual.push(format!(
                "unusually high maximum temperature ({:.1}°C)",
                day.temp_max_c
            ));
        }
        if day.temp_min_c < self.temp_min_low {
            unusual.push(format!(
                "unusually low minimum temperature ({:.1}°C)",
                day.temp_min_c
            ));
        }
        if day.precipitation_mm > self.rain_high {
            unusual.push(format!(
                "unusually high rainfall ({:.1}mm)",
                day.precipitation_mm
            ));
        }
        if day.wind_mean_ms > self.wind_high {
            unusual.push(format!(
                "unusually high wind speed ({:.1}m/s)",
                day.wind_mean_ms
            ));
        }
        if day.humidity_mean > self.humidity_high {
            unusual.push(format!("unusually high humidity ({:.1}%)", day.humidity_mean));
        }
        if day.humidity_mean < self.humidity_low {
            unusual.push(format!("unusually low humidity ({:.1}%)", day.humidity_mean));
        }
        if unusual.is_empty() {
            unusual.push("unusual combination of weather conditions".to_string());
        }
        unusual
    }
}

/// Days whose weather is far from the period's norm.
///
/// Up to five, the most extreme first chosen and then listed by date.
/// Empty with fewer than [`MIN_ANOMALY_DAYS`] days.
pub fn detect_anomalies(days: &[DailySummary]) -> Vec<Anomaly> {
    if days.len() < MIN_ANOMALY_DAYS {
        return Vec::new();
    }
    let Some(bounds) = UnusualBounds::of(days) else {
        return Vec::new();
    };

    let rows: Vec<Features> = days.iter().map(features).collect();
    let scaler = Standardizer::fit(&rows);

    let mut anomalies: Vec<Anomaly> = days
        .iter()
        .zip(&rows)
        .filter_map(|(day, row)| {
            let score = scaler
                .transform(row)
                .iter()
                .map(|z| z.abs())
                .fold(0.0, f64::max);
            if score <= ANOMALY_Z {
                return None;
            }
            let unusual = bounds.explain(day);
            Some(Anomaly {
                date: day.date,
                score,
                description: format!("Weather anomaly detected with {}", unusual.join(", ")),
                unusual,
            })
        })
        .collect();

    anomalies.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut seen: Vec<String> = Vec::new();
    anomalies.retain(|a| {
        if seen.contains(&a.description) {
            return false;
        }
        seen.push(a.description.clone());
        true
    });
    anomalies.truncate(MAX_ANOMALIES);
    anomalies.sort_by_key(|a| a.date);
    anomalies
}

/// A recurring type of day found by clustering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherPattern {
    pub days: usize,
    pub share_percent: f64,
    pub mean_temp_c: f64,
    pub mean_rain_mm: f64,
    pub mean_humidity: f64,
    pub mean_wind_ms: f64,
    pub description: String,
}

impl WeatherPattern {
    fn from_members(members: &[&DailySummary], total: usize) -> Option<Self> {
        if members.is_empty() {
            return None;
        }
        let n = members.len() as f64;
        let mean = |f: fn(&DailySummary) -> f64| members.iter().map(|d| f(d)).sum::<f64>() / n;

        let mean_temp_c = mean(|d| d.temp_mean_c);
        let mean_rain_mm = mean(|d| d.precipitation_mm);
        let mean_humidity = mean(|d| d.humidity_mean);
        let mean_wind_ms = mean(|d| d.wind_mean_ms);

        Some(Self {
            days: members.len(),
            share_percent: n / total as f64 * 100.0,
            mean_temp_c,
            mean_rain_mm,
            mean_humidity,
            mean_wind_ms,
            description: describe_pattern(mean_temp_c, mean_rain_mm, mean_humidity, mean_wind_ms),
        })
    }
}

fn describe_pattern(temp_c: f64, rain_mm: f64, humidity: f64, wind_ms: f64) -> String {
    let temp = match temp_c {
        t if t < 5.0 => "cold",
        t if t < 15.0 => "cool",
        t if t < 25.0 => "mild",
        _ => "hot",
    };
    let rain = match rain_mm {
        r if r < 0.1 => "dry",
        r if r < 2.0 => "light precipitation",
        r if r < 10.0 => "moderate precipitation",
        _ => "heavy precipitation",
    };
    let humidity = match humidity {
        h if h < 40.0 => "low humidity",
        h if h < 70.0 => "moderate humidity",
        _ => "high humidity",
    };
    let wind = match wind_ms {
        w if w < 3.0 => "light winds",
        w if w < 7.0 => "moderate winds",
        _ => "strong winds",
    };
    format!("{} days with {}, {}, and {}", temp, rain, humidity, wind)
}

/// Group days into recurring weather types, largest group first.
///
/// k-means over standardized daily features with one group per ten days
/// (at most five, two for ten days or fewer). Seeding is deterministic.
pub fn identify_patterns(days: &[DailySummary]) -> Vec<WeatherPattern> {
    if days.len() < 2 {
        return Vec::new();
    }
    let k = if days.len() > 10 {
        (days.len() / 10).min(MAX_PATTERNS)
    } else {
        2
    };

    let rows: Vec<Features> = days.iter().map(features).collect();
    let scaler = Standardizer::fit(&rows);
    let points: Vec<Features> = rows.iter().map(|r| scaler.transform(r)).collect();
    let labels = kmeans(&points, k);

    let mut patterns: Vec<WeatherPattern> = (0..k)
        .filter_map(|cluster| {
            let members: Vec<&DailySummary> = days
                .iter()
                .zip(&labels)
                .filter(|(_, label)| **label == cluster)
                .map(|(day, _)| day)
                .collect();
            WeatherPattern::from_members(&members, days.len())
        })
        .collect();

    patterns.sort_by(|a, b| b.days.cmp(&a.days));
    patterns
}

fn distance2(a: &Features, b: &Features) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of the closest candidate, earliest on ties
fn nearest(candidates: &[Features], point: &Features) -> usize {
    candidates
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, c)| {
            let d = distance2(c, point);
            if d < best.1 {
                (i, d)
            } else {
                best
            }
        })
        .0
}

/// Cluster label per point
fn kmeans(points: &[Features], k: usize) -> Vec<usize> {
    let k = k.min(points.len());
    if k == 0 {
        return Vec::new();
    }

    // Seed with the most central point, then repeatedly the point furthest
    // from every chosen centroid
    let mut centroids = vec![points[nearest(points, &[0.0; FEATURES])]];
    while centroids.len() < k {
        let furthest = points
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, p)| {
                let d = centroids
                    .iter()
                    .map(|c| distance2(c, p))
                    .fold(f64::INFINITY, f64::min);
                if d > best.1 {
                    (i, d)
                } else {
                    best
                }
            })
            .0;
        centroids.push(points[furthest]);
    }

    let mut labels = vec![0; points.len()];
    for _ in 0..KMEANS_ITERATIONS {
        let next: Vec<usize> = points.iter().map(|p| nearest(&centroids, p)).collect();
        let changed = next != labels;
        labels = next;

        for (cluster, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&Features> = points
                .iter()
                .zip(&labels)
                .filter(|(_, label)| **label == cluster)
                .map(|(p, _)| p)
                .collect();
            if !members.is_empty() {
                let n = members.len() as f64;
                *centroid =
                    std::array::from_fn(|i| members.iter().map(|m| m[i]).sum::<f64>() / n);
            }
        }

        if !changed {
            break;
        }
    }

    labels
}

/// How a forecast compares with the history before it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutlook {
    /// Forecast mean temperature minus the historical mean
    pub temp_difference_c: Option<f64>,
    pub analysis: String,
    pub notes: Vec<String>,
}

pub fn forecast_outlook(history: &[DailySummary], forecast: &WeatherSeries) -> ForecastOutlook {
    if forecast.is_empty() {
        return ForecastOutlook {
            temp_difference_c: None,
            analysis: "No forecast data available for comparison.".to_string(),
            notes: Vec::new(),
        };
    }

    let avg_temp =
        forecast.iter().map(|o| o.temperature_c).sum::<f64>() / forecast.len() as f64;
    let total_rain = forecast.total_precipitation();
    let mut notes = Vec::new();

    let (temp_difference_c, analysis) = if history.is_empty() {
        (
            None,
            "Unable to compare the forecast with historical averages without historical data."
                .to_string(),
        )
    } else {
        let hist_temp =
            history.iter().map(|d| d.temp_mean_c).sum::<f64>() / history.len() as f64;
        let diff = avg_temp - hist_temp;
        let comparison = match diff {
            d if d > 3.0 => "significantly warmer than",
            d if d > 1.0 => "warmer than",
            d if d < -3.0 => "significantly cooler than",
            d if d < -1.0 => "cooler than",
            _ => "similar to",
        };

        let usual_high = quantile(history.iter().map(|d| d.temp_max_c), 0.9);
        if let (Some(high), Some(usual)) = (forecast.max_temperature(), usual_high) {
            if high > usual {
                notes.push(format!(
                    "Unusually warm temperatures expected with highs reaching {:.1}°C.",
                    high
                ));
            }
        }
        let usual_low = quantile(history.iter().map(|d| d.temp_min_c), 0.1);
        if let (Some(low), Some(usual)) = (forecast.min_temperature(), usual_low) {
            if low < usual {
                notes.push(format!(
                    "Unusually cool temperatures expected with lows reaching {:.1}°C.",
                    low
                ));
            }
        }

        let hist_daily_rain =
            history.iter().map(|d| d.precipitation_mm).sum::<f64>() / history.len() as f64;
        let forecast_days = forecast.daily_summaries().len().max(1) as f64;
        let forecast_daily_rain = total_rain / forecast_days;
        if forecast_daily_rain > hist_daily_rain * 2.0 {
            notes.push(
                "Higher than average rainfall expected in the upcoming period.".to_string(),
            );
        } else if forecast_daily_rain < hist_daily_rain * 0.5 {
            notes.push(
                "Drier than average conditions expected in the upcoming period.".to_string(),
            );
        }

        (
            Some(diff),
            format!(
                "The upcoming period is forecast to be {} historical averages.",
                comparison
            ),
        )
    };

    notes.push(format!(
        "Forecast shows average temperatures of {:.1}°C, with a total expected rainfall of {:.1}mm.",
        avg_temp, total_rain
    ));

    let temps: Vec<f64> = forecast.iter().map(|o| o.temperature_c).collect();
    if temps.len() > 5 {
        let head = temps[..3].iter().sum::<f64>() / 3.0;
        let tail = temps[temps.len() - 3..].iter().sum::<f64>() / 3.0;
        let change = tail - head;
        if change.abs() > 5.0 {
            notes.push(format!(
                "Temperatures are expected to be {} significantly during the forecast period.",
                if change > 0.0 { "increasing" } else { "decreasing" }
            ));
        }
    }

    ForecastOutlook {
        temp_difference_c,
        analysis,
        notes,
    }
}

/// Anomalies, weather types and the forecast outlook, with a narrative summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternAnalysis {
    pub summary: String,
    pub anomalies: Vec<Anomaly>,
    pub patterns: Vec<WeatherPattern>,
    pub outlook: Option<ForecastOutlook>,
}

pub fn analyze_patterns(
    history: &[DailySummary],
    forecast: Option<&WeatherSeries>,
    trends: Option<&ClimateTrends>,
) -> PatternAnalysis {
    if history.is_empty() {
        return PatternAnalysis {
            summary: "Insufficient historical data for analysis.".to_string(),
            anomalies: Vec::new(),
            patterns: Vec::new(),
            outlook: None,
        };
    }

    let anomalies = detect_anomalies(history);
    let patterns = identify_patterns(history);
    let outlook = forecast.map(|f| forecast_outlook(history, f));
    let trend_lines = trends.map(ClimateTrends::significant).unwrap_or_default();

    PatternAnalysis {
        summary: summarize(history, trend_lines, outlook.as_ref(), &anomalies),
        anomalies,
        patterns,
        outlook,
    }
}

fn summarize(
    history: &[DailySummary],
    trends: &[String],
    outlook: Option<&ForecastOutlook>,
    anomalies: &[Anomaly],
) -> String {
    let mut parts = Vec::new();

    let avg_temp = history.iter().map(|d| d.temp_mean_c).sum::<f64>() / history.len() as f64;
    let total_rain: f64 = history.iter().map(|d| d.precipitation_mm).sum();
    parts.push(format!(
        "Based on historical weather data, this region has an average temperature of {:.1}°C.",
        avg_temp
    ));
    parts.push(format!(
        "The area has received approximately {:.0}mm of rainfall over the analyzed period.",
        total_rain
    ));

    if !trends.is_empty() {
        let lines: Vec<String> = trends
            .iter()
            .take(2)
            .map(|t| lower_first(t.trim_end_matches('.')))
            .collect();
        parts.push(format!(
            "Weather trends analysis reveals that {}.",
            lines.join(" and ")
        ));
    }

    if let Some(outlook) = outlook {
        parts.push(outlook.analysis.clone());
        if let Some(note) = outlook.notes.first() {
            parts.push(note.clone());
        }
    }

    if let Some(anomaly) = anomalies.first() {
        parts.push(format!(
            "Weather anomalies have been detected, including {}.",
            lower_first(&anomaly.description)
        ));
    }

    parts.push(
        "These weather patterns suggest farmers should monitor soil moisture levels closely and adjust irrigation schedules accordingly."
            .to_string(),
    );
    parts.join(" ")
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

use super::observation::{LocationId, WeatherCondition, WeatherObservation};
use crate::error::SeriesError;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Chronologically ordered observations for a single location.
///
/// Insertion order is chronological order: every observation shares the
/// series location and timestamps strictly increase. The only way in is
/// [`WeatherSeries::push`] (or [`WeatherSeries::from_observations`]), which
/// enforces both rules, so readers can rely on them without re-checking.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherSeries {
    location: LocationId,
    observations: Vec<WeatherObservation>,
}

impl WeatherSeries {
    pub fn new(location: LocationId) -> Self {
        Self {
            location,
            observations: Vec::new(),
        }
    }

    pub fn from_observations(
        location: LocationId,
        observations: impl IntoIterator<Item = WeatherObservation>,
    ) -> Result<Self, SeriesError> {
        let mut series = Self::new(location);
        for observation in observations {
            series.push(observation)?;
        }
        Ok(series)
    }

    pub fn push(&mut self, observation: WeatherObservation) -> Result<(), SeriesError> {
        if observation.location != self.location {
            return Err(SeriesError::LocationMismatch {
                expected: self.location.to_string(),
                found: observation.location.to_string(),
            });
        }

        if let Some(last) = self.observations.last() {
            if observation.timestamp <= last.timestamp {
                return Err(SeriesError::NonIncreasingTimestamp {
                    previous: last.timestamp,
                    found: observation.timestamp,
                });
            }
        }

        self.observations.push(observation);
        Ok(())
    }

    pub fn location(&self) -> &LocationId {
        &self.location
    }

    pub fn observations(&self) -> &[WeatherObservation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WeatherObservation> {
        self.observations.iter()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&WeatherObservation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&WeatherObservation> {
        self.observations.last()
    }

    /// Time between the first and last observation
    pub fn span(&self) -> Option<Duration> {
        Some(self.last()?.timestamp - self.first()?.timestamp)
    }

    pub fn max_temperature(&self) -> Option<f64> {
        self.iter().map(|o| o.temperature_c).reduce(f64::max)
    }

    pub fn min_temperature(&self) -> Option<f64> {
        self.iter().map(|o| o.temperature_c).reduce(f64::min)
    }

    pub fn total_precipitation(&self) -> f64 {
        self.iter().map(|o| o.precipitation_mm).sum()
    }

    pub fn max_wind_speed(&self) -> Option<f64> {
        self.iter().map(|o| o.wind_speed_ms).reduce(f64::max)
    }

    /// Append the part of `later` that starts after this series ends.
    ///
    /// Observations of `later` at or before the last timestamp here are
    /// dropped, so overlapping fetches never count an hour twice.
    pub fn merge(mut self, later: WeatherSeries) -> Result<Self, SeriesError> {
        if later.location != self.location {
            return Err(SeriesError::LocationMismatch {
                expected: self.location.to_string(),
                found: later.location.to_string(),
            });
        }

        let cutoff = self.last().map(|o| o.timestamp);
        for observation in later.observations {
            if cutoff.is_some_and(|cutoff| observation.timestamp <= cutoff) {
                continue;
            }
            self.push(observation)?;
        }
        Ok(self)
    }

    /// Aggregate observations by UTC calendar date, oldest first
    pub fn daily_summaries(&self) -> Vec<DailySummary> {
        let mut days: Vec<DailySummary> = Vec::new();
        let mut start = 0;

        // Observations are already chronological, so each day is a contiguous run.
        while start < self.observations.len() {
            let date = self.observations[start].timestamp.date_naive();
            let end = start
                + self.observations[start..]
                    .iter()
                    .take_while(|o| o.timestamp.date_naive() == date)
                    .count();
            days.push(DailySummary::aggregate(date, &self.observations[start..end]));
            start = end;
        }

        days
    }
}

impl<'a> IntoIterator for &'a WeatherSeries {
    type Item = &'a WeatherObservation;
    type IntoIter = std::slice::Iter<'a, WeatherObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Aggregated daily weather
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub temp_mean_c: f64,
    pub precipitation_mm: f64,
    pub humidity_mean: f64,
    pub wind_mean_ms: f64,
    pub wind_max_ms: f64,
    pub dominant_condition: WeatherCondition,
    pub observation_count: usize,
}

impl DailySummary {
    fn aggregate(date: NaiveDate, points: &[WeatherObservation]) -> Self {
        let count = points.len().max(1) as f64;

        let temp_min_c = points
            .iter()
            .map(|p| p.low_c())
            .reduce(f64::min)
            .unwrap_or(0.0);
        let temp_max_c = points
            .iter()
            .map(|p| p.high_c())
            .reduce(f64::max)
            .unwrap_or(0.0);
        let temp_mean_c = points.iter().map(|p| p.temperature_c).sum::<f64>() / count;
        let precipitation_mm = points.iter().map(|p| p.precipitation_mm).sum();
        let humidity_mean = points.iter().map(|p| p.humidity_percent).sum::<f64>() / count;
        let wind_mean_ms = points.iter().map(|p| p.wind_speed_ms).sum::<f64>() / count;
        let wind_max_ms = points
            .iter()
            .map(|p| p.wind_speed_ms)
            .reduce(f64::max)
            .unwrap_or(0.0);

        // Most frequent condition, earliest wins ties
        let mut counts: Vec<(WeatherCondition, usize)> = Vec::new();
        for point in points {
            match counts.iter_mut().find(|(c, _)| *c == point.condition) {
                Some((_, n)) => *n += 1,
                None => counts.push((point.condition, 1)),
            }
        }
        let dominant_condition = counts
            .iter()
            .fold(None::<(WeatherCondition, usize)>, |best, &(c, n)| match best {
                Some((_, best_n)) if best_n >= n => best,
                _ => Some((c, n)),
            })
            .map(|(c, _)| c)
            .unwrap_or_default();

        Self {
            date,
            temp_min_c,
            temp_max_c,
            temp_mean_c,
            precipitation_mm,
            humidity_mean,
            wind_mean_ms,
            wind_max_ms,
            dominant_condition,
            observation_count: points.len(),
        }
    }
}

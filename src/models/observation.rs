use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies where a series was fetched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationId {
    Coordinates { latitude: f64, longitude: f64 },
    Named(String),
}

impl LocationId {
    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        LocationId::Coordinates {
            latitude,
            longitude,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        LocationId::Named(name.into())
    }

    /// Latitude is only known for coordinate locations
    pub fn latitude(&self) -> Option<f64> {
        match self {
            LocationId::Coordinates { latitude, .. } => Some(*latitude),
            LocationId::Named(_) => None,
        }
    }

    pub fn is_northern_hemisphere(&self) -> bool {
        self.latitude().map(|lat| lat >= 0.0).unwrap_or(true)
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationId::Coordinates {
                latitude,
                longitude,
            } => write!(f, "{:.4},{:.4}", latitude, longitude),
            LocationId::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A single normalized weather record. Metric units throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub timestamp: DateTime<Utc>,
    pub location: LocationId,
    pub temperature_c: f64,
    pub precipitation_mm: f64, // rain + snow over the source interval
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
    pub feels_like_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub cloud_cover_percent: Option<f64>,
    pub condition: WeatherCondition,
}

impl WeatherObservation {
    pub fn new(
        timestamp: DateTime<Utc>,
        location: LocationId,
        temperature_c: f64,
        precipitation_mm: f64,
        humidity_percent: f64,
        wind_speed_ms: f64,
    ) -> Self {
        Self {
            timestamp,
            location,
            temperature_c,
            precipitation_mm,
            humidity_percent,
            wind_speed_ms,
            feels_like_c: None,
            temp_min_c: None,
            temp_max_c: None,
            pressure_hpa: None,
            cloud_cover_percent: None,
            condition: WeatherCondition::default(),
        }
    }

    pub fn with_condition(mut self, condition: WeatherCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Lowest temperature seen in the observation interval
    pub fn low_c(&self) -> f64 {
        self.temp_min_c.unwrap_or(self.temperature_c)
    }

    /// Highest temperature seen in the observation interval
    pub fn high_c(&self) -> f64 {
        self.temp_max_c.unwrap_or(self.temperature_c)
    }
}

/// Weather condition categories from OpenWeatherMap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WeatherCondition {
    #[default]
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Fog,
    Other,
}

impl WeatherCondition {
    pub fn from_owm_id(id: u32) -> Self {
        match id {
            200..=232 => WeatherCondition::Thunderstorm,
            300..=321 => WeatherCondition::Drizzle,
            500..=531 => WeatherCondition::Rain,
            600..=622 => WeatherCondition::Snow,
            701 => WeatherCondition::Mist,
            741 => WeatherCondition::Fog,
            800 => WeatherCondition::Clear,
            801..=804 => WeatherCondition::Clouds,
            _ => WeatherCondition::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Clouds => "Cloudy",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Mist => "Mist",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::Other => "Other",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "☀",
            WeatherCondition::Clouds => "☁",
            WeatherCondition::Rain => "🌧",
            WeatherCondition::Drizzle => "🌦",
            WeatherCondition::Thunderstorm => "⛈",
            WeatherCondition::Snow => "❄",
            WeatherCondition::Mist | WeatherCondition::Fog => "🌫",
            WeatherCondition::Other => "?",
        }
    }

    /// Whether this condition involves precipitation
    pub fn has_precipitation(&self) -> bool {
        matches!(
            self,
            WeatherCondition::Rain
                | WeatherCondition::Drizzle
                | WeatherCondition::Thunderstorm
                | WeatherCondition::Snow
        )
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

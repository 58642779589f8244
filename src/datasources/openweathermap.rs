use crate::config::OpenWeatherMapConfig;
use crate::error::FetchError;
use crate::models::{LocationId, WeatherCondition, WeatherObservation};
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmListResponse {
    #[serde(default)]
    list: Vec<OwmPoint>,
}

/// Shared shape of `/weather`, `/forecast` list items and history list items
#[derive(Debug, Deserialize)]
struct OwmPoint {
    dt: i64,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmWeather>,
    #[serde(default)]
    clouds: Option<OwmClouds>,
    #[serde(default)]
    wind: Option<OwmWind>,
    #[serde(default)]
    rain: Option<OwmPrecipitation>,
    #[serde(default)]
    snow: Option<OwmPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
    #[serde(default)]
    pressure: Option<f64>,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct OwmClouds {
    all: f64, // cloudiness percentage
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

/// Current weather and history report `1h`, the forecast reports `3h`
#[derive(Debug, Deserialize)]
struct OwmPrecipitation {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    three_hour: Option<f64>,
}

impl OwmPrecipitation {
    fn amount_mm(&self) -> f64 {
        self.three_hour.or(self.one_hour).unwrap_or(0.0).max(0.0)
    }
}

#[derive(Debug, Deserialize)]
struct OwmErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Current conditions, always a single observation
    pub async fn fetch_current(
        &self,
        location: &LocationId,
    ) -> Result<Vec<WeatherObservation>, FetchError> {
        let url = self.build_url(&self.config.base_url, "weather", location, &[])?;
        let point: OwmPoint = self.get_json(url).await?;
        Ok(vec![convert_point(&point, location)?])
    }

    /// 5-day/3-hour forecast
    pub async fn fetch_forecast(
        &self,
        location: &LocationId,
    ) -> Result<Vec<WeatherObservation>, FetchError> {
        let url = self.build_url(&self.config.base_url, "forecast", location, &[])?;
        let response: OwmListResponse = self.get_json(url).await?;
        convert_list(&response, location)
    }

    /// Hourly history between `start` and `end` (paid history endpoint)
    pub async fn fetch_history(
        &self,
        location: &LocationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<WeatherObservation>, FetchError> {
        let extra = [
            ("type", "hour".to_string()),
            ("start", start.timestamp().to_string()),
            ("end", end.timestamp().to_string()),
        ];
        let url = self.build_url(&self.config.history_url, "history/city", location, &extra)?;
        let response: OwmListResponse = self.get_json(url).await?;
        convert_list(&response, location)
    }

    /// Test connection to OpenWeatherMap API
    pub async fn test_connection(&self, location: &LocationId) -> Result<bool, FetchError> {
        let url = self.build_url(&self.config.base_url, "weather", location, &[])?;
        self.ensure_api_key()?;

        let response = self.client.get(url).send().await?;
        Ok(response.status().is_success())
    }

    fn build_url(
        &self,
        base: &str,
        path: &str,
        location: &LocationId,
        extra: &[(&str, String)],
    ) -> Result<Url, FetchError> {
        let mut params: Vec<(&str, String)> = match location {
            LocationId::Coordinates {
                latitude,
                longitude,
            } => vec![("lat", latitude.to_string()), ("lon", longitude.to_string())],
            LocationId::Named(name) => vec![("q", name.clone())],
        };
        params.extend(extra.iter().cloned());
        params.push(("units", "metric".to_string()));

        tracing::debug!(
            "OpenWeatherMap request: {}/{} {:?}",
            base.trim_end_matches('/'),
            path,
            params
        );

        params.push(("appid", self.config.api_key.clone()));

        let endpoint = format!("{}/{}", base.trim_end_matches('/'), path);
        Url::parse_with_params(&endpoint, &params)
            .map_err(|e| FetchError::InvalidRequest(format!("bad URL {}: {}", endpoint, e)))
    }

    fn ensure_api_key(&self) -> Result<(), FetchError> {
        if self.config.api_key.trim().is_empty() {
            return Err(FetchError::InvalidApiKey(format!(
                "no API key configured; set {}",
                crate::config::API_KEY_ENV
            )));
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        self.ensure_api_key()?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<OwmErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);

            return Err(match status {
                StatusCode::UNAUTHORIZED => FetchError::InvalidApiKey(message),
                StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited(message),
                _ => FetchError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            FetchError::MalformedResponse(format!(
                "Failed to parse OpenWeatherMap response: {}",
                e
            ))
        })
    }
}

fn convert_list(
    response: &OwmListResponse,
    location: &LocationId,
) -> Result<Vec<WeatherObservation>, FetchError> {
    response
        .list
        .iter()
        .map(|item| convert_point(item, location))
        .collect()
}

fn convert_point(
    item: &OwmPoint,
    location: &LocationId,
) -> Result<WeatherObservation, FetchError> {
    let timestamp = DateTime::from_timestamp(item.dt, 0).ok_or_else(|| {
        FetchError::MalformedResponse(format!("timestamp {} out of range", item.dt))
    })?;

    let condition = item
        .weather
        .first()
        .map(|w| WeatherCondition::from_owm_id(w.id))
        .unwrap_or_default();

    // Combine rain and snow precipitation
    let rain_mm = item.rain.as_ref().map(|r| r.amount_mm()).unwrap_or(0.0);
    let snow_mm = item.snow.as_ref().map(|s| s.amount_mm()).unwrap_or(0.0);

    let mut observation = WeatherObservation::new(
        timestamp,
        location.clone(),
        item.main.temp,
        rain_mm + snow_mm,
        item.main.humidity,
        item.wind.as_ref().map(|w| w.speed).unwrap_or(0.0),
    )
    .with_condition(condition);

    observation.feels_like_c = item.main.feels_like;
    observation.temp_min_c = item.main.temp_min;
    observation.temp_max_c = item.main.temp_max;
    observation.pressure_hpa = item.main.pressure;
    observation.cloud_cover_percent = item.clouds.as_ref().map(|c| c.all);

    Ok(observation)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_BASE: &str = crate::config::DEFAULT_BASE_URL;

    fn sample_config() -> OpenWeatherMapConfig {
        OpenWeatherMapConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn coordinate_url_carries_lat_lon_units_and_key() {
        let client = OpenWeatherMapClient::new(sample_config());
        let url = client
            .build_url(
                "https://api.openweathermap.org/data/2.5/",
                "forecast",
                &LocationId::coordinates(42.03, -93.62),
                &[],
            )
            .unwrap();

        assert_eq!(url.path(), "/data/2.5/forecast");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("lat".into(), "42.03".into())));
        assert!(query.contains(&("lon".into(), "-93.62".into())));
        assert!(query.contains(&("units".into(), "metric".into())));
        assert!(query.contains(&("appid".into(), "test_key".into())));
    }

    #[test]
    fn named_url_is_encoded() {
        let client = OpenWeatherMapClient::new(sample_config());
        let url = client
            .build_url(
                DEFAULT_BASE,
                "weather",
                &LocationId::named("Des Moines,US"),
                &[],
            )
            .unwrap();

        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("q".into(), "Des Moines,US".into())));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn converts_forecast_item_with_rain_and_snow() {
        let json = r#"{
            "dt": 1717200000,
            "main": {"temp": 1.5, "feels_like": -2.0, "temp_min": 0.5, "temp_max": 2.0,
                     "pressure": 1012, "humidity": 88},
            "weather": [{"id": 601, "main": "Snow", "description": "snow"}],
            "clouds": {"all": 100},
            "wind": {"speed": 6.2, "deg": 270},
            "rain": {"3h": 1.25},
            "snow": {"3h": 2.0}
        }"#;
        let point: OwmPoint = serde_json::from_str(json).unwrap();
        let obs = convert_point(&point, &LocationId::named("Ames,US")).unwrap();

        assert_eq!(obs.timestamp.timestamp(), 1717200000);
        assert_eq!(obs.temperature_c, 1.5);
        assert!((obs.precipitation_mm - 3.25).abs() < 1e-9);
        assert_eq!(obs.humidity_percent, 88.0);
        assert_eq!(obs.wind_speed_ms, 6.2);
        assert_eq!(obs.temp_min_c, Some(0.5));
        assert_eq!(obs.pressure_hpa, Some(1012.0));
        assert_eq!(obs.cloud_cover_percent, Some(100.0));
        assert_eq!(obs.condition, WeatherCondition::Snow);
    }

    #[test]
    fn converts_current_weather_with_hourly_rain() {
        let json = r#"{
            "dt": 1717200000,
            "main": {"temp": 21.0, "humidity": 55},
            "weather": [{"id": 500}],
            "wind": {"speed": 3.0},
            "rain": {"1h": 0.4},
            "name": "Ames"
        }"#;
        let point: OwmPoint = serde_json::from_str(json).unwrap();
        let obs = convert_point(&point, &LocationId::named("Ames,US")).unwrap();

        assert!((obs.precipitation_mm - 0.4).abs() < 1e-9);
        assert_eq!(obs.feels_like_c, None);
        assert_eq!(obs.cloud_cover_percent, None);
        assert_eq!(obs.condition, WeatherCondition::Rain);
    }

    #[test]
    fn missing_wind_and_precipitation_default_to_zero() {
        let json = r#"{"dt": 1717200000, "main": {"temp": 10.0, "humidity": 40}}"#;
        let point: OwmPoint = serde_json::from_str(json).unwrap();
        let obs = convert_point(&point, &LocationId::named("Ames,US")).unwrap();

        assert_eq!(obs.precipitation_mm, 0.0);
        assert_eq!(obs.wind_speed_ms, 0.0);
        assert_eq!(obs.condition, WeatherCondition::Clear);
    }

    #[tokio::test]
    async fn empty_api_key_fails_before_any_request() {
        let client = OpenWeatherMapClient::new(OpenWeatherMapConfig {
            api_key: "  ".into(),
            // Unroutable; a request here would surface as Network, not InvalidApiKey
            base_url: "http://127.0.0.1:9".into(),
            history_url: "http://127.0.0.1:9".into(),
        });

        let result = client.fetch_current(&LocationId::named("Ames,US")).await;
        assert!(matches!(result, Err(FetchError::InvalidApiKey(_))));
    }
}

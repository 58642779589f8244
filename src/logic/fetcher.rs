use crate::config::OpenWeatherMapConfig;
use crate::datasources::OpenWeatherMapClient;
use crate::error::FetchError;
use crate::models::{LocationId, WeatherObservation, WeatherSeries};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FetchMode {
    Current,
    Forecast,
    Historical {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Longest range one history request returns
pub const HISTORY_WINDOW_DAYS: u32 = 7;
/// Longest range [`WeatherFetcher::fetch_history`] accepts
pub const MAX_HISTORY_DAYS: u32 = 366;

impl FetchMode {
    /// The `days` days leading up to `now`
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Result<Self, FetchError> {
        Ok(FetchMode::Historical {
            start: days_before(now, days)?,
            end: now,
        })
    }

    /// The last `days` days split into consecutive ranges of at most
    /// [`HISTORY_WINDOW_DAYS`], oldest first
    pub fn history_windows(days: u32, now: DateTime<Utc>) -> Result<Vec<Self>, FetchError> {
        if days == 0 || days > MAX_HISTORY_DAYS {
            return Err(FetchError::InvalidRequest(format!(
                "history must cover 1 to {} days, got {}",
                MAX_HISTORY_DAYS, days
            )));
        }

        let mut windows = Vec::new();
        let mut remaining = days;
        while remaining > 0 {
            let span = remaining.min(HISTORY_WINDOW_DAYS);
            let end = days_before(now, remaining - span)?;
            windows.push(FetchMode::last_days(span, end)?);
            remaining -= span;
        }
        Ok(windows)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Current => "current",
            FetchMode::Forecast => "forecast",
            FetchMode::Historical { .. } => "historical",
        }
    }
}

fn days_before(instant: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, FetchError> {
    instant
        .checked_sub_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| {
            FetchError::InvalidRequest(format!("{} days before {} is out of range", days, instant))
        })
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fetches weather for a location and normalizes it into a [`WeatherSeries`].
///
/// Every call makes exactly one request; failures come back as
/// [`FetchError`] without retrying.
pub struct WeatherFetcher {
    client: OpenWeatherMapClient,
}

impl WeatherFetcher {
    pub fn new(config: OpenWeatherMapConfig) -> Self {
        Self {
            client: OpenWeatherMapClient::new(config),
        }
    }

    pub async fn fetch(
        &self,
        location: &LocationId,
        mode: FetchMode,
    ) -> Result<WeatherSeries, FetchError> {
        let raw = match mode {
            FetchMode::Current => self.client.fetch_current(location).await?,
            FetchMode::Forecast => self.client.fetch_forecast(location).await?,
            FetchMode::Historical { start, end } => {
                if end <= start {
                    return Err(FetchError::InvalidRequest(format!(
                        "historical range must end after it starts ({} .. {})",
                        start, end
                    )));
                }
                self.client.fetch_history(location, start, end).await?
            }
        };

        let series = normalize(location, raw)?;
        tracing::info!(
            "Fetched {} {} observations for {}",
            series.len(),
            mode,
            location
        );
        Ok(series)
    }

    /// Hourly history for the `days` days before `now`, one request per
    /// week-long window.
    ///
    /// Logs a warning when the data returned starts more than a day after
    /// the requested start.
    pub async fn fetch_history(
        &self,
        location: &LocationId,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<WeatherSeries, FetchError> {
        let windows = FetchMode::history_windows(days, now)?;
        let requested_start = days_before(now, days)?;

        let mut series = WeatherSeries::new(location.clone());
        for mode in windows {
            let part = self.fetch(location, mode).await?;
            series = series
                .merge(part)
                .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
        }

        if let Some(first) = series.first() {
            let missing = first.timestamp - requested_start;
            if missing > Duration::days(1) {
                tracing::warn!(
                    "History for {} starts {} days after the requested {} days",
                    location,
                    missing.num_days(),
                    days
                );
            }
        }
        if let Some(span) = series.span() {
            tracing::info!(
                "History for {} spans {} hours in {} observations",
                location,
                span.num_hours(),
                series.len()
            );
        }

        Ok(series)
    }

    pub async fn test_connection(&self, location: &LocationId) -> Result<bool, FetchError> {
        self.client.test_connection(location).await
    }
}

/// Order observations chronologically and drop repeated timestamps.
///
/// An empty input is a malformed response: callers are promised a
/// non-empty series.
pub fn normalize(
    location: &LocationId,
    mut observations: Vec<WeatherObservation>,
) -> Result<WeatherSeries, FetchError> {
    if observations.is_empty() {
        return Err(FetchError::MalformedResponse(format!(
            "no observations returned for {}",
            location
        )));
    }

    observations.sort_by_key(|o| o.timestamp);
    let before = observations.len();
    observations.dedup_by_key(|o| o.timestamp);
    if observations.len() < before {
        tracing::warn!(
            "Dropped {} duplicate observations for {}",
            before - observations.len(),
            location
        );
    }

    WeatherSeries::from_observations(location.clone(), observations)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const START: i64 = 1_717_200_000;

    fn fetcher_for(server: &MockServer) -> WeatherFetcher {
        WeatherFetcher::new(OpenWeatherMapConfig {
            api_key: "test_key".into(),
            base_url: server.uri(),
            history_url: server.uri(),
        })
    }

    fn ames() -> LocationId {
        LocationId::coordinates(42.03, -93.62)
    }

    fn point(dt: i64, temp: f64) -> Value {
        json!({
            "dt": dt,
            "main": {"temp": temp, "feels_like": temp, "temp_min": temp - 1.0,
                     "temp_max": temp + 1.0, "pressure": 1013, "humidity": 65},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}],
            "clouds": {"all": 0},
            "wind": {"speed": 3.5, "deg": 180}
        })
    }

    fn forecast_body(count: i64) -> Value {
        let list: Vec<Value> = (0..count)
            .map(|i| point(START + i * 3 * 3600, 15.0 + i as f64 * 0.1))
            .collect();
        json!({"cod": "200", "cnt": count, "list": list,
               "city": {"name": "Ames", "country": "US", "coord": {"lat": 42.03, "lon": -93.62}}})
    }

    fn assert_strictly_increasing(series: &WeatherSeries) {
        for pair in series.observations().windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn current_weather_is_a_single_observation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "42.03"))
            .and(query_param("lon", "-93.62"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(point(START, 22.5)))
            .expect(1)
            .mount(&server)
            .await;

        let series = fetcher_for(&server)
            .fetch(&ames(), FetchMode::Current)
            .await
            .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.location(), &ames());
        assert_eq!(series.observations()[0].temperature_c, 22.5);
    }

    #[tokio::test]
    async fn five_day_forecast_has_forty_three_hour_points() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(40)))
            .expect(1)
            .mount(&server)
            .await;

        let series = fetcher_for(&server)
            .fetch(&ames(), FetchMode::Forecast)
            .await
            .unwrap();

        assert_eq!(series.len(), 40);
        assert_strictly_increasing(&series);
        for pair in series.observations().windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(3));
        }
        assert!(series.iter().all(|o| o.location == ames()));
    }

    #[tokio::test]
    async fn out_of_order_and_duplicate_points_are_normalized() {
        let server = MockServer::start().await;
        let body = json!({"list": [
            point(START + 7200, 14.0),
            point(START, 12.0),
            point(START + 3600, 13.0),
            point(START + 3600, 99.0),
        ]});
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let series = fetcher_for(&server)
            .fetch(&ames(), FetchMode::Forecast)
            .await
            .unwrap();

        let temps: Vec<f64> = series.iter().map(|o| o.temperature_c).collect();
        assert_eq!(temps, vec![12.0, 13.0, 14.0]);
        assert_strictly_increasing(&series);
    }

    #[tokio::test]
    async fn named_location_uses_city_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Ames,US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(point(START, 20.0)))
            .expect(1)
            .mount(&server)
            .await;

        let location = LocationId::named("Ames,US");
        let series = fetcher_for(&server)
            .fetch(&location, FetchMode::Current)
            .await
            .unwrap();
        assert_eq!(series.location(), &location);
    }

    #[tokio::test]
    async fn historical_requests_hourly_range() {
        let server = MockServer::start().await;
        let start = Utc.timestamp_opt(START, 0).unwrap();
        let end = start + Duration::hours(3);
        let body = json!({"cod": "200", "cnt": 3, "list": [
            point(START, 10.0), point(START + 3600, 11.0), point(START + 7200, 12.0)
        ]});
        Mock::given(method("GET"))
            .and(path("/history/city"))
            .and(query_param("type", "hour"))
            .and(query_param("start", START.to_string().as_str()))
            .and(query_param("end", (START + 3 * 3600).to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let series = fetcher_for(&server)
            .fetch(&ames(), FetchMode::Historical { start, end })
            .await
            .unwrap();
        assert_eq!(series.len(), 3);
    }

    #[tokio::test]
    async fn inverted_historical_range_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let end = Utc.timestamp_opt(START, 0).unwrap();
        let result = fetcher_for(&server)
            .fetch(
                &ames(),
                FetchMode::Historical {
                    start: end + Duration::days(1),
                    end,
                },
            )
            .await;
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "cod": 401,
                "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
            })))
            .mount(&server)
            .await;

        let err = fetcher_for(&server)
            .fetch(&ames(), FetchMode::Current)
            .await
            .unwrap_err();
        match err {
            FetchError::InvalidApiKey(message) => assert!(message.starts_with("Invalid API key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = fetcher_for(&server)
            .fetch(&ames(), FetchMode::Forecast)
            .await
            .unwrap_err();
        match err {
            FetchError::RateLimited(message) => assert_eq!(message, "slow down"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_statuses_carry_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&server)
            .await;

        let err = fetcher_for(&server)
            .fetch(&LocationId::named("Atlantis"), FetchMode::Current)
            .await
            .unwrap_err();
        match err {
            FetchError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "city not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = fetcher_for(&server)
            .fetch(&ames(), FetchMode::Forecast)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn empty_forecast_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": []})))
            .mount(&server)
            .await;

        let err = fetcher_for(&server)
            .fetch(&ames(), FetchMode::Forecast)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_connection_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(point(START, 20.0)))
            .mount(&server)
            .await;

        assert!(fetcher_for(&server).test_connection(&ames()).await.unwrap());
    }

    #[test]
    fn normalize_rejects_foreign_observations() {
        let obs = WeatherObservation::new(
            Utc.timestamp_opt(START, 0).unwrap(),
            LocationId::named("Pune,IN"),
            20.0,
            0.0,
            50.0,
            2.0,
        );
        let err = normalize(&ames(), vec![obs]).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn last_days_spans_requested_window() {
        let now = Utc.timestamp_opt(START, 0).unwrap();
        match FetchMode::last_days(7, now).unwrap() {
            FetchMode::Historical { start, end } => {
                assert_eq!(end, now);
                assert_eq!(end - start, Duration::days(7));
            }
            other => panic!("unexpected mode {other}"),
        }
    }

    #[test]
    fn last_days_out_of_range_is_an_error() {
        let result = FetchMode::last_days(u32::MAX, Utc::now());
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));

        let result = FetchMode::history_windows(u32::MAX, Utc::now());
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }

    #[test]
    fn history_windows_cover_range_in_weeks() {
        let now = Utc.timestamp_opt(START, 0).unwrap();
        let windows = FetchMode::history_windows(30, now).unwrap();

        let ranges: Vec<(DateTime<Utc>, DateTime<Utc>)> = windows
            .iter()
            .map(|mode| match mode {
                FetchMode::Historical { start, end } => (*start, *end),
                other => panic!("unexpected mode {other}"),
            })
            .collect();

        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[0].0, now - Duration::days(30));
        assert_eq!(ranges[0].1 - ranges[0].0, Duration::days(7));
        assert_eq!(ranges[4].1, now);
        assert_eq!(ranges[4].1 - ranges[4].0, Duration::days(2));
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }

        assert!(FetchMode::history_windows(0, now).is_err());
        assert_eq!(FetchMode::history_windows(7, now).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_is_fetched_per_week_and_merged() {
        let server = MockServer::start().await;
        let now = Utc.timestamp_opt(START, 0).unwrap();
        let boundary = START - 3 * 86_400;

        // Older window ends at the boundary hour, newer window repeats it
        Mock::given(method("GET"))
            .and(path("/history/city"))
            .and(query_param("start", (START - 10 * 86_400).to_string().as_str()))
            .and(query_param("end", boundary.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": [
                point(START - 10 * 86_400, 10.0),
                point(boundary, 11.0),
            ]})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history/city"))
            .and(query_param("start", boundary.to_string().as_str()))
            .and(query_param("end", START.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": [
                point(boundary, 99.0),
                point(boundary + 3600, 12.0),
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let series = fetcher_for(&server)
            .fetch_history(&ames(), 10, now)
            .await
            .unwrap();

        let temps: Vec<f64> = series.iter().map(|o| o.temperature_c).collect();
        assert_eq!(temps, vec![10.0, 11.0, 12.0]);
        assert_strictly_increasing(&series);
    }

    #[tokio::test]
    async fn history_stops_at_first_failing_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/city"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher_for(&server)
            .fetch_history(&ames(), 20, Utc.timestamp_opt(START, 0).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::RateLimited(_)));
    }

    #[tokio::test]
    async fn history_range_is_validated_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let now = Utc.timestamp_opt(START, 0).unwrap();
        for days in [0, MAX_HISTORY_DAYS + 1, u32::MAX] {
            let err = fetcher.fetch_history(&ames(), days, now).await.unwrap_err();
            assert!(matches!(err, FetchError::InvalidRequest(_)));
        }
    }
}

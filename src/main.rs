mod cli;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use farmweather::config::{
    Config, LocationConfig, OpenWeatherMapConfig, ScoringConfig, API_KEY_ENV,
};
use farmweather::logic::calculations::{
    climate_indicators, climate_trends, crop_insight, extreme_events, growing_season,
};
use farmweather::logic::patterns::analyze_patterns;
use farmweather::logic::scoring::WeatherRiskStrategy;
use farmweather::logic::seasonal::seasonal_guidance;
use farmweather::logic::{FetchMode, RecommendationScorer, StrategySet, WeatherFetcher};
use farmweather::models::{
    CropProfile, LocationId, Recommendation, Season, WeatherSeries, CROP_CATALOG,
};
use farmweather::report::{self, AnalysisReport};
use farmweather::FarmWeatherError;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // RUST_LOG applies unless -v is given
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Init => {
            Config::setup_interactive().context("Setup failed")?;
            Ok(())
        }
        Commands::Crops => {
            if cli.json {
                println!("{}", report::to_json(&CROP_CATALOG[..])?);
            } else {
                println!("{}", report::crop_catalog_table());
            }
            Ok(())
        }
        Commands::Current => show_series(&cli, FetchMode::Current).await,
        Commands::Forecast => show_series(&cli, FetchMode::Forecast).await,
        Commands::History { days } => show_history(&cli, *days).await,
        Commands::Recommend { history_days } => recommend(&cli, *history_days).await,
        Commands::Alerts => alerts(&cli).await,
        Commands::Analyze { days } => analyze(&cli, *days).await,
        Commands::Crop { name, days } => crop(&cli, name, *days).await,
        Commands::Check => check(&cli).await,
    }
}

/// Resolved configuration, location and fetcher for one command
struct Session {
    config: Config,
    location: LocationId,
    fetcher: WeatherFetcher,
}

impl Session {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = load_config(cli)?;
        let location = resolve_location(cli, &config)?;
        let fetcher = WeatherFetcher::new(config.openweathermap.clone());
        Ok(Self {
            config,
            location,
            fetcher,
        })
    }

    async fn fetch(&self, mode: FetchMode) -> anyhow::Result<WeatherSeries> {
        self.fetcher
            .fetch(&self.location, mode)
            .await
            .with_context(|| format!("Failed to fetch {} weather for {}", mode, self.location))
    }

    async fn fetch_history(&self, days: u32) -> anyhow::Result<WeatherSeries> {
        self.fetcher
            .fetch_history(&self.location, days, Utc::now())
            .await
            .with_context(|| {
                format!("Failed to fetch {} days of history for {}", days, self.location)
            })
    }
}

async fn show_series(cli: &Cli, mode: FetchMode) -> anyhow::Result<()> {
    let session = Session::open(cli)?;
    let series = session.fetch(mode).await?;

    if cli.json {
        println!("{}", report::to_json(&series)?);
    } else {
        println!("{}", report::series_table(&series));
    }
    Ok(())
}

async fn show_history(cli: &Cli, days: u32) -> anyhow::Result<()> {
    let session = Session::open(cli)?;
    let series = session.fetch_history(days).await?;

    if cli.json {
        println!("{}", report::to_json(&series)?);
    } else {
        println!("History for {} ({} observations)", session.location, series.len());
        println!("{}", report::daily_table(&series.daily_summaries()));
    }
    Ok(())
}

async fn recommend(cli: &Cli, history_days: u32) -> anyhow::Result<()> {
    let session = Session::open(cli)?;
    let history = session.fetch_history(history_days).await?;
    let forecast = session.fetch(FetchMode::Forecast).await?;
    let series = history.merge(forecast)?;

    let scorer = RecommendationScorer::from_config(&session.config.scoring);
    let recommendations = scorer.score(&series).with_context(|| {
        format!(
            "Cannot score {} for {}",
            scorer.strategy_name(),
            session.location
        )
    })?;

    print_recommendations(cli, &session.location, &recommendations)
}

async fn alerts(cli: &Cli) -> anyhow::Result<()> {
    let session = Session::open(cli)?;
    let series = session.fetch(FetchMode::Forecast).await?;

    let scorer =
        RecommendationScorer::with_strategy(&session.config.scoring, Box::new(WeatherRiskStrategy));
    let alerts = scorer.score(&series)?;

    print_recommendations(cli, &session.location, &alerts)
}

async fn analyze(cli: &Cli, days: u32) -> anyhow::Result<()> {
    let session = Session::open(cli)?;
    let series = session.fetch_history(days).await?;
    let forecast = session.fetch(FetchMode::Forecast).await?;
    let summaries = series.daily_summaries();
    let location = &session.location;
    let northern = location.is_northern_hemisphere();

    let indicators =
        climate_indicators(&summaries, northern).context("No daily data to analyze")?;
    let (trends, trend_note) = match climate_trends(&summaries) {
        Ok(trends) => (Some(trends), None),
        Err(e) => (None, Some(format!("Trend analysis skipped: {}", e))),
    };
    let month = series
        .last()
        .map(|o| o.timestamp.month())
        .unwrap_or_else(|| Utc::now().month());

    let patterns = analyze_patterns(&summaries, Some(&forecast), trends.as_ref());
    let guidance = seasonal_guidance(
        Season::for_month(month, northern),
        northern,
        trends.as_ref().map(|t| t.trends.as_slice()).unwrap_or_default(),
        &summaries,
    );

    let analysis = AnalysisReport {
        location: location.clone(),
        indicators,
        events: extreme_events(&summaries),
        trends,
        trend_note,
        growing_season: location.latitude().map(|lat| growing_season(lat, month)),
        patterns,
        guidance,
    };

    if cli.json {
        println!("{}", report::to_json(&analysis)?);
    } else {
        println!("{}", analysis.render());
    }
    Ok(())
}

async fn crop(cli: &Cli, name: &str, days: u32) -> anyhow::Result<()> {
    let crop = CropProfile::find(name).ok_or_else(|| {
        FarmWeatherError::NotFound(format!(
            "crop '{}' (run `farmweather crops` for the catalog)",
            name
        ))
    })?;

    let session = Session::open(cli)?;
    let series = session.fetch_history(days).await?;
    let insight =
        crop_insight(crop, &series.daily_summaries()).context("No daily data to assess")?;

    if cli.json {
        println!("{}", report::to_json(&insight)?);
    } else {
        println!("{}", report::crop_insight_report(&insight));
    }
    Ok(())
}

async fn check(cli: &Cli) -> anyhow::Result<()> {
    let session = Session::open(cli)?;

    println!("Location: {} ({})", session.config.location.name, session.location);
    println!(
        "API key:  {}",
        if session.config.openweathermap.api_key.is_empty() {
            "missing"
        } else {
            "configured"
        }
    );

    let strategies = StrategySet::standard(&session.config.scoring);
    let scorer = RecommendationScorer::from_config(&session.config.scoring);
    println!(
        "Scoring:  {} (at least {} observations)",
        strategies
            .list_strategies()
            .iter()
            .map(|(id, _)| *id)
            .collect::<Vec<_>>()
            .join(", "),
        scorer.min_observations()
    );

    match session.fetcher.test_connection(&session.location).await {
        Ok(true) => println!("OpenWeatherMap: OK"),
        Ok(false) => println!("OpenWeatherMap: request rejected"),
        Err(e) => println!("OpenWeatherMap: {}", e),
    }
    Ok(())
}

fn print_recommendations(
    cli: &Cli,
    location: &LocationId,
    recommendations: &[Recommendation],
) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", report::to_json(recommendations)?);
    } else {
        println!("Recommendations for {}", location);
        println!("{}", report::recommendations_table(recommendations));
    }
    Ok(())
}

/// The config file, or defaults plus the environment when a location is
/// given on the command line and no file exists
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    if Config::exists(cli.config.as_ref()) || !cli.has_location_override() {
        return Config::load(cli.config.clone()).context("Configuration error");
    }

    tracing::warn!("No config file found, using defaults and ${}", API_KEY_ENV);
    let mut config = Config {
        location: LocationConfig {
            name: "Command line".into(),
            ..Default::default()
        },
        openweathermap: OpenWeatherMapConfig::default(),
        scoring: ScoringConfig::default(),
    };
    config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
    Ok(config)
}

fn resolve_location(cli: &Cli, config: &Config) -> anyhow::Result<LocationId> {
    let mut location = config.location.clone();

    if let Some(city) = &cli.city {
        location.city = Some(city.clone());
        location.latitude = None;
        location.longitude = None;
    }
    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        location.latitude = Some(lat);
        location.longitude = Some(lon);
    }

    Ok(location.location_id()?)
}

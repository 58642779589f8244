use crate::error::{FarmWeatherError, Result};
use crate::models::LocationId;
use dialoguer::{Input, Password};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_HISTORY_URL: &str = "https://history.openweathermap.org/data/2.5";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub location: LocationConfig,
    #[serde(default)]
    pub openweathermap: OpenWeatherMapConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Display label, e.g. "North Field"
    pub name: String,
    /// City query understood by OpenWeatherMap, e.g. "Ames,US"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Coordinates win over a city query when both are present
    pub fn location_id(&self) -> Result<LocationId> {
        match (self.latitude, self.longitude, &self.city) {
            (Some(lat), Some(lon), _) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(FarmWeatherError::Config(format!(
                        "coordinates out of range: lat={}, lon={}",
                        lat, lon
                    )));
                }
                Ok(LocationId::coordinates(lat, lon))
            }
            (_, _, Some(city)) if !city.trim().is_empty() => {
                Ok(LocationId::named(city.trim()))
            }
            _ => Err(FarmWeatherError::Config(
                "location needs either latitude/longitude or a city".into(),
            )),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    #[serde(default, deserialize_with = "deserialize_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_history_url")]
    pub history_url: String,
}

// An unset `${VAR}` leaves `api_key:` with no value, which YAML reads as null
fn deserialize_api_key<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_history_url() -> String {
    DEFAULT_HISTORY_URL.to_string()
}

impl Default for OpenWeatherMapConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            history_url: default_history_url(),
        }
    }
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("history_url", &self.history_url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
    #[serde(default = "default_max_crop_recommendations")]
    pub max_crop_recommendations: usize,
    #[serde(default = "default_min_crop_confidence")]
    pub min_crop_confidence: f64,
}

fn default_min_observations() -> usize {
    8
}

fn default_max_crop_recommendations() -> usize {
    5
}

fn default_min_crop_confidence() -> f64 {
    0.4
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_observations: default_min_observations(),
            max_crop_recommendations: default_max_crop_recommendations(),
            min_crop_confidence: default_min_crop_confidence(),
        }
    }
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(FarmWeatherError::Config(format!(
                "Config file not found at {:?}. Run `farmweather init` to set up.",
                config_path
            )));
        }

        let mut config = Self::load_from(&config_path)?;
        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading configuration from {}", path.display());
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| FarmWeatherError::Config(format!("Failed to read config: {}", e)))?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content)?;
        serde_yaml::from_str(&content)
            .map_err(|e| FarmWeatherError::Config(format!("Failed to parse config: {}", e)))
    }

    /// The environment key wins over whatever the file says
    pub fn apply_api_key_override(&mut self, env_key: Option<String>) {
        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            self.openweathermap.api_key = key.trim().to_string();
        }
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let default_path = Self::default_config_path()?;
        if !default_path.exists() {
            tracing::debug!("No config at {}", default_path.display());
        }
        Ok(default_path)
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/farmweather/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FarmWeatherError::Config("Cannot determine config directory".into()))?
            .join("farmweather");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up FarmWeather!");
        println!();

        println!("Location");
        let name: String = Input::new()
            .with_prompt("  Farm or field name")
            .default("Home Farm".into())
            .interact_text()
            .map_err(input_error)?;

        let city: String = Input::new()
            .with_prompt("  City (e.g. Ames,US) - leave blank to enter coordinates")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_error)?;

        let (city, latitude, longitude) = if city.trim().is_empty() {
            let latitude: f64 = Input::new()
                .with_prompt("  Latitude")
                .default(42.03)
                .interact_text()
                .map_err(input_error)?;
            let longitude: f64 = Input::new()
                .with_prompt("  Longitude")
                .default(-93.62)
                .interact_text()
                .map_err(input_error)?;
            (None, Some(latitude), Some(longitude))
        } else {
            (Some(city), None, None)
        };

        println!();
        println!("OpenWeatherMap (leave blank to read ${} at runtime)", API_KEY_ENV);
        let api_key: String = Password::new()
            .with_prompt("  API key")
            .allow_empty_password(true)
            .interact()
            .map_err(input_error)?;

        let config = Config {
            location: LocationConfig {
                name,
                city,
                latitude,
                longitude,
            },
            openweathermap: OpenWeatherMapConfig {
                api_key: if api_key.is_empty() {
                    format!("${{{}}}", API_KEY_ENV)
                } else {
                    api_key
                },
                ..Default::default()
            },
            scoring: ScoringConfig::default(),
        };

        let config_path = Self::default_config_path()?;
        config.write_to(&config_path)?;

        println!();
        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| FarmWeatherError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# FarmWeather Configuration\n# Generated by `farmweather init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| FarmWeatherError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            match std::env::var(var_name) {
                Ok(value) => result = result.replace(placeholder, &value),
                Err(_) => {
                    // Leave an empty value rather than the literal placeholder
                    tracing::warn!("Environment variable {} is not set", var_name);
                    result = result.replace(placeholder, "");
                }
            }
        }

        Ok(result)
    }
}

fn input_error(e: dialoguer::Error) -> FarmWeatherError {
    FarmWeatherError::Config(format!("Input error: {}", e))
}

//! Session configuration.
//!
//! Only the directions access token is required. Everything else has a
//! default matching the original web client.

use serde::{Deserialize, Serialize};

use crate::camera::FitBoundsOptions;
use crate::coord::Position;
use crate::error::{Error, Result};
use crate::location::{PositionOptions, DEFAULT_POSITION};
use crate::state::WAYPOINT_OFFSET_DEG;

pub const DEFAULT_API_BASE_URL: &str = "https://api.mapbox.com";

/// Environment variables, in lookup order, that may hold the access token.
const TOKEN_VARS: [&str; 2] = ["MAPBOX_ACCESS_TOKEN", "NEXT_PUBLIC_MAP_BOX_TOKEN"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub access_token: String,
    pub api_base_url: String,
    /// Language of the service's instruction text.
    pub language: String,
    pub geolocation: PositionOptions,
    pub fit_bounds: FitBoundsOptions,
    pub fallback_position: Position,
    pub waypoint_offset_deg: f64,
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            language: "ja".to_string(),
            geolocation: PositionOptions::default(),
            fit_bounds: FitBoundsOptions::default(),
            fallback_position: DEFAULT_POSITION,
            waypoint_offset_deg: WAYPOINT_OFFSET_DEG,
            request_timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Read the token and optional overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse a JSON config handed over by the host.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = TOKEN_VARS
            .iter()
            .filter_map(|key| lookup(*key))
            .find(|v| !v.trim().is_empty())
            .ok_or(Error::MissingAccessToken)?;

        let mut config = Config {
            access_token,
            ..Config::default()
        };
        if let Some(url) = lookup("PINROUTE_DIRECTIONS_URL") {
            config.api_base_url = url;
        }
        if let Some(language) = lookup("PINROUTE_LANGUAGE") {
            config.language = language;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::MissingAccessToken);
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        Ok(())
    }
}

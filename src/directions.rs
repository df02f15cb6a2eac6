//! Directions service access.
//!
//! Builds Mapbox Directions v5 requests, decodes the JSON response into
//! a [`Route`], and wraps the blocking HTTP call behind the
//! [`DirectionsService`] trait so hosts and tests can substitute it.

use std::time::Duration;

use geojson::{Geometry, Value};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::coord::{coordinate_string, path_length, Position};
use crate::instructions::{self, Instruction};
use crate::state::Profile;

/// One route derivation, identified by the token that issued it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub token: u64,
    pub profile: Profile,
    /// Current position, optional waypoint, destination.
    pub coordinates: Vec<Position>,
}

impl RouteRequest {
    pub fn coordinate_string(&self) -> String {
        coordinate_string(&self.coordinates)
    }

    /// Full request URL including query parameters.
    pub fn url(&self, config: &Config) -> Result<Url, DirectionsError> {
        let base = config.api_base_url.trim_end_matches('/');
        let endpoint = format!(
            "{base}/directions/v5/mapbox/{}/{}",
            self.profile.as_str(),
            self.coordinate_string()
        );
        Url::parse_with_params(
            &endpoint,
            &[
                ("steps", "true"),
                ("geometries", "geojson"),
                ("language", config.language.as_str()),
                ("access_token", config.access_token.as_str()),
            ],
        )
        .map_err(|e| DirectionsError::InvalidUrl(e.to_string()))
    }
}

/// The best route returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub geometry: Vec<Position>,
    pub distance_m: f64,
    pub duration_s: f64,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Error, Debug)]
pub enum DirectionsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directions service responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("directions service returned {code}: {message}")]
    Service { code: String, message: String },

    #[error("no route found")]
    NoRoute,

    #[error("malformed directions response: {0}")]
    Malformed(String),

    #[error("invalid directions URL: {0}")]
    InvalidUrl(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializable summary of a failed derivation, kept in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Status,
    Service,
    NoRoute,
    Malformed,
}

impl From<&DirectionsError> for RouteFailure {
    fn from(e: &DirectionsError) -> Self {
        let kind = match e {
            DirectionsError::Http(_) => FailureKind::Network,
            DirectionsError::Status { .. } => FailureKind::Status,
            DirectionsError::Service { .. } => FailureKind::Service,
            DirectionsError::NoRoute => FailureKind::NoRoute,
            DirectionsError::Malformed(_)
            | DirectionsError::InvalidUrl(_)
            | DirectionsError::Json(_) => FailureKind::Malformed,
        };
        RouteFailure {
            kind,
            message: e.to_string(),
        }
    }
}

/// Anything that can resolve a route request.
pub trait DirectionsService {
    fn route(&mut self, request: &RouteRequest) -> Result<Route, DirectionsError>;
}

/// Blocking client for the Mapbox Directions API.
pub struct MapboxDirections {
    client: Client,
    config: Config,
}

impl MapboxDirections {
    pub fn new(config: Config) -> Result<Self, DirectionsError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }
}

impl DirectionsService for MapboxDirections {
    fn route(&mut self, request: &RouteRequest) -> Result<Route, DirectionsError> {
        let url = request.url(&self.config)?;
        log::debug!(
            "requesting {} route #{} for {}",
            request.profile.as_str(),
            request.token,
            request.coordinate_string()
        );

        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            return Err(DirectionsError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Top-level response body.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteBody {
    pub geometry: Geometry,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteLeg {
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteStep {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub name: String,
    pub maneuver: Maneuver,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Maneuver {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub modifier: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub bearing_before: Option<f64>,
    #[serde(default)]
    pub bearing_after: Option<f64>,
    #[serde(default)]
    pub location: Vec<f64>,
}

/// Decode a response body and pick the first (best) route.
pub fn parse_response(body: &str) -> Result<Route, DirectionsError> {
    let response: DirectionsResponse = serde_json::from_str(body)?;
    decode(response)
}

pub fn decode(response: DirectionsResponse) -> Result<Route, DirectionsError> {
    if response.code != "Ok" {
        if response.code == "NoRoute" {
            return Err(DirectionsError::NoRoute);
        }
        return Err(DirectionsError::Service {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let best = response
        .routes
        .into_iter()
        .next()
        .ok_or(DirectionsError::NoRoute)?;

    let geometry = line_positions(&best.geometry)?;
    if geometry.is_empty() {
        return Err(DirectionsError::Malformed("empty route geometry".into()));
    }

    let steps: Vec<RouteStep> = best.legs.into_iter().flat_map(|leg| leg.steps).collect();
    let distance_m = best.distance.unwrap_or_else(|| path_length(&geometry));

    Ok(Route {
        distance_m,
        duration_s: best.duration,
        instructions: instructions::from_steps(&steps),
        geometry,
    })
}

fn line_positions(geometry: &Geometry) -> Result<Vec<Position>, DirectionsError> {
    match &geometry.value {
        Value::LineString(coords) => coords
            .iter()
            .map(|c| {
                Position::from_lng_lat(c)
                    .ok_or_else(|| DirectionsError::Malformed(format!("bad coordinate {c:?}")))
            })
            .collect(),
        _ => Err(DirectionsError::Malformed(
            "expected LineString geometry".into(),
        )),
    }
}

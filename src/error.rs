//! Crate-level error type.

use thiserror::Error;

use crate::directions::DirectionsError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no directions access token: set MAPBOX_ACCESS_TOKEN")]
    MissingAccessToken,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Directions(#[from] DirectionsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

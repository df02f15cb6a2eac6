//! One-shot device position acquisition with a fixed fallback.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::Position;

/// Tokyo Station.
pub const DEFAULT_POSITION: Position = Position::new(35.6809591, 139.7673068);

/// Options forwarded to the platform geolocation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    /// Oldest cached reading accepted; zero forces a fresh fix.
    pub maximum_age_ms: u64,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("timed out waiting for a position")]
    Timeout,
}

impl GeolocationError {
    /// Map a W3C `GeolocationPositionError.code`. Unknown codes count as
    /// unavailable.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => GeolocationError::PermissionDenied,
            3 => GeolocationError::Timeout,
            _ => GeolocationError::PositionUnavailable,
        }
    }
}

/// Source of the device position.
pub trait Geolocator {
    fn current_position(&mut self, options: &PositionOptions) -> Result<Position, GeolocationError>;
}

/// Geolocator with a preset answer.
#[derive(Debug, Clone)]
pub struct FixedGeolocator(pub Result<Position, GeolocationError>);

impl Geolocator for FixedGeolocator {
    fn current_position(
        &mut self,
        _options: &PositionOptions,
    ) -> Result<Position, GeolocationError> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixSource {
    Device,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub position: Position,
    pub source: FixSource,
}

/// Ask the device once; on any failure use `fallback` so the map always
/// has a center.
pub fn acquire<G: Geolocator + ?Sized>(
    geolocator: &mut G,
    options: &PositionOptions,
    fallback: Position,
) -> Fix {
    match geolocator.current_position(options) {
        Ok(position) => {
            log::info!("device position {:.6},{:.6}", position.lat, position.lng);
            Fix {
                position,
                source: FixSource::Device,
            }
        }
        Err(e) => {
            log::warn!("geolocation failed ({e}), using fallback position");
            Fix {
                position: fallback,
                source: FixSource::Fallback,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingGeolocator {
        seen: Option<PositionOptions>,
    }

    impl Geolocator for RecordingGeolocator {
        fn current_position(
            &mut self,
            options: &PositionOptions,
        ) -> Result<Position, GeolocationError> {
            self.seen = Some(*options);
            Ok(Position::new(35.0, 139.0))
        }
    }

    #[test]
    fn default_options_request_fresh_high_accuracy_fix() {
        let options = PositionOptions::default();
        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout_ms, 10_000);
        assert_eq!(options.maximum_age_ms, 0);
    }

    #[test]
    fn device_position_is_used() {
        let mut geo = RecordingGeolocator { seen: None };
        let fix = acquire(&mut geo, &PositionOptions::default(), DEFAULT_POSITION);
        assert_eq!(fix.source, FixSource::Device);
        assert_eq!(fix.position, Position::new(35.0, 139.0));
        assert_eq!(geo.seen, Some(PositionOptions::default()));
    }

    #[test]
    fn every_failure_falls_back() {
        for code in [1, 2, 3, 99] {
            let mut geo = FixedGeolocator(Err(GeolocationError::from_code(code)));
            let fix = acquire(&mut geo, &PositionOptions::default(), DEFAULT_POSITION);
            assert_eq!(fix.source, FixSource::Fallback);
            assert_eq!(fix.position, DEFAULT_POSITION);
        }
    }

    #[test]
    fn error_codes() {
        assert_eq!(GeolocationError::from_code(1), GeolocationError::PermissionDenied);
        assert_eq!(GeolocationError::from_code(2), GeolocationError::PositionUnavailable);
        assert_eq!(GeolocationError::from_code(3), GeolocationError::Timeout);
    }
}

//! Navigation session state and its transitions.
//!
//! All mutation goes through [`transition`], a pure function from the
//! current state and one event to the next state plus the side effects
//! the host has to carry out (issue a directions request, move the
//! camera). Nothing here performs I/O.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::coord::{Bounds, Position};
use crate::directions::{Route, RouteFailure, RouteRequest};
use crate::location::{GeolocationError, DEFAULT_POSITION};

/// Degrees added to both axes of the map center when a waypoint is placed.
pub const WAYPOINT_OFFSET_DEG: f64 = 0.001;

/// Travel mode passed to the directions service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Walking,
    #[default]
    Driving,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Walking => "walking",
            Profile::Driving => "driving",
        }
    }
}

/// UI state of one navigation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationState {
    pub profile: Profile,
    pub destination: Option<Position>,
    pub waypoint: Option<Position>,
    pub waypoint_enabled: bool,
    pub is_navigating: bool,
    /// Path of the displayed route. Only set while navigating.
    pub route_geometry: Option<Vec<Position>>,
    pub route: Option<Route>,
    pub route_error: Option<RouteFailure>,
    pub current_position: Option<Position>,
    pub map_center: Option<Position>,
    /// Token of the most recently issued route request.
    pub request_token: u64,
    pub waypoint_offset_deg: f64,
    /// Used as the current position when the device cannot provide one.
    pub fallback_position: Position,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            profile: Profile::Driving,
            destination: None,
            waypoint: None,
            waypoint_enabled: false,
            is_navigating: false,
            route_geometry: None,
            route: None,
            route_error: None,
            current_position: None,
            map_center: None,
            request_token: 0,
            waypoint_offset_deg: WAYPOINT_OFFSET_DEG,
            fallback_position: DEFAULT_POSITION,
        }
    }
}

/// Inputs to the session: user interactions and completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PositionAcquired { position: Position },
    /// Geolocation failed with a W3C error code.
    PositionFailed { code: u16 },
    MapMoved { center: Position },
    MapClicked { position: Position },
    ProfileSelected { profile: Profile },
    WaypointToggled { enabled: bool },
    WaypointDragged { position: Position },
    StartNavigation,
    FinishNavigation,
    RouteLoaded { token: u64, route: Route },
    RouteFailed { token: u64, failure: RouteFailure },
}

/// Work the host must perform after a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    RequestRoute { request: RouteRequest },
    FitBounds { bounds: Bounds },
}

impl NavigationState {
    /// Fresh session state carrying the configured placement constants.
    pub fn from_config(config: &Config) -> Self {
        Self {
            waypoint_offset_deg: config.waypoint_offset_deg,
            fallback_position: config.fallback_position,
            ..Self::default()
        }
    }

    pub fn can_start_navigation(&self) -> bool {
        self.destination.is_some() && !self.is_navigating
    }

    pub fn can_finish_navigation(&self) -> bool {
        self.is_navigating
    }

    /// Ordered request coordinates: current position, optional waypoint,
    /// destination. None until both endpoints are known.
    pub fn route_coordinates(&self) -> Option<Vec<Position>> {
        let origin = self.current_position?;
        let destination = self.destination?;

        let mut coords = vec![origin];
        if self.waypoint_enabled {
            if let Some(waypoint) = self.waypoint {
                coords.push(waypoint);
            }
        }
        coords.push(destination);
        Some(coords)
    }

    fn clear_route(&mut self) {
        self.route_geometry = None;
        self.route = None;
        self.route_error = None;
    }

    /// Leave navigation mode and orphan any request still in flight.
    fn stop_navigating(&mut self) {
        if self.is_navigating {
            self.request_token += 1;
        }
        self.is_navigating = false;
        self.clear_route();
    }

    /// Issue a fresh route request if navigating with both endpoints known.
    fn derive_route(&mut self, effects: &mut Vec<Effect>) {
        if !self.is_navigating {
            return;
        }
        let Some(coordinates) = self.route_coordinates() else {
            log::debug!("route derivation deferred: position or destination unknown");
            return;
        };

        self.request_token += 1;
        effects.push(Effect::RequestRoute {
            request: RouteRequest {
                token: self.request_token,
                profile: self.profile,
                coordinates,
            },
        });
    }
}

/// Apply one event. Returns the next state and the effects to run.
pub fn transition(mut state: NavigationState, event: Event) -> (NavigationState, Vec<Effect>) {
    let mut effects = Vec::new();
    log::debug!("event {event:?}");

    match event {
        Event::PositionAcquired { position } => {
            state.current_position = Some(position);
            if state.map_center.is_none() {
                state.map_center = Some(position);
            }
        }

        Event::PositionFailed { code } => {
            let reason = GeolocationError::from_code(code);
            if state.current_position.is_none() {
                log::warn!("geolocation failed ({reason}), using fallback position");
                let fallback = state.fallback_position;
                state.current_position = Some(fallback);
                state.map_center.get_or_insert(fallback);
            } else {
                log::debug!("geolocation failed ({reason}), keeping known position");
            }
        }

        Event::MapMoved { center } => {
            state.map_center = Some(center);
        }

        Event::MapClicked { position } => {
            if !state.is_navigating {
                state.destination = Some(position);
                state.clear_route();
            }
        }

        Event::ProfileSelected { profile } => {
            if profile != state.profile {
                state.profile = profile;
                if state.is_navigating {
                    state.derive_route(&mut effects);
                } else {
                    state.clear_route();
                }
            }
        }

        Event::WaypointToggled { enabled } => {
            state.stop_navigating();
            state.waypoint_enabled = enabled;
            if enabled {
                if let Some(anchor) = state.map_center.or(state.current_position) {
                    state.waypoint = Some(anchor.offset(state.waypoint_offset_deg));
                }
            }
        }

        Event::WaypointDragged { position } => {
            state.stop_navigating();
            state.waypoint = Some(position);
        }

        Event::StartNavigation => {
            if state.can_start_navigation() {
                state.is_navigating = true;
                state.clear_route();
                state.derive_route(&mut effects);
            }
        }

        Event::FinishNavigation => {
            if state.can_finish_navigation() {
                state.stop_navigating();
            }
        }

        Event::RouteLoaded { token, route } => {
            if token != state.request_token || !state.is_navigating {
                log::debug!(
                    "discarding stale route #{token} (latest #{})",
                    state.request_token
                );
            } else {
                match Bounds::of(&route.geometry) {
                    Some(bounds) => {
                        log::info!(
                            "route #{token}: {} points, {:.0} m",
                            route.geometry.len(),
                            route.distance_m
                        );
                        state.route_geometry = Some(route.geometry.clone());
                        state.route = Some(route);
                        state.route_error = None;
                        effects.push(Effect::FitBounds { bounds });
                    }
                    None => log::warn!("route #{token} has no geometry"),
                }
            }
        }

        Event::RouteFailed { token, failure } => {
            if token == state.request_token && state.is_navigating {
                log::warn!("route #{token} failed: {}", failure.message);
                state.route_geometry = None;
                state.route = None;
                state.route_error = Some(failure);
            }
        }
    }

    (state, effects)
}

//! Presentation model.
//!
//! A [`Scene`] is derived one-way from [`NavigationState`] and describes
//! everything the map host draws: markers, the route line layer and the
//! enabled state of the navigation buttons. The host never mutates it.

use geojson::{Feature, Geometry, Value};
use serde::Serialize;

use crate::coord::Position;
use crate::state::NavigationState;

pub const MAP_STYLE: &str = "mapbox://styles/mapbox/light-v10";
pub const INITIAL_ZOOM: f64 = 14.0;
pub const ROUTE_SOURCE_ID: &str = "route-source";
pub const ROUTE_LAYER_ID: &str = "route";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Destination,
    CurrentPosition,
    Waypoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub position: Position,
    pub color: &'static str,
    pub draggable: bool,
}

/// Paint and layout of the route line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub line_join: &'static str,
    pub line_cap: &'static str,
    pub line_color: &'static str,
    pub line_width: f64,
    pub line_opacity: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            line_join: "round",
            line_cap: "round",
            line_color: "#3887be",
            line_width: 5.0,
            line_opacity: 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLayer {
    pub source_id: &'static str,
    pub layer_id: &'static str,
    pub style: LineStyle,
    pub data: Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub start_enabled: bool,
    pub finish_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialView {
    pub center: Position,
    pub zoom: f64,
    pub style: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// None until a position (device or fallback) is known; the map is
    /// not shown before that.
    pub initial_view: Option<InitialView>,
    pub markers: Vec<Marker>,
    pub route: Option<RouteLayer>,
    pub controls: Controls,
}

impl Scene {
    pub fn from_state(state: &NavigationState) -> Self {
        let initial_view = state.current_position.map(|center| InitialView {
            center,
            zoom: INITIAL_ZOOM,
            style: MAP_STYLE,
        });

        let mut markers = Vec::with_capacity(3);
        if let Some(position) = state.destination {
            markers.push(Marker {
                kind: MarkerKind::Destination,
                position,
                color: "#d00",
                draggable: false,
            });
        }
        if let Some(position) = state.current_position {
            markers.push(Marker {
                kind: MarkerKind::CurrentPosition,
                position,
                color: "blue",
                draggable: false,
            });
        }
        if state.waypoint_enabled {
            if let Some(position) = state.waypoint {
                markers.push(Marker {
                    kind: MarkerKind::Waypoint,
                    position,
                    color: "green",
                    draggable: true,
                });
            }
        }

        let route = state
            .route_geometry
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| RouteLayer {
                source_id: ROUTE_SOURCE_ID,
                layer_id: ROUTE_LAYER_ID,
                style: LineStyle::default(),
                data: route_feature(path),
            });

        Scene {
            initial_view,
            markers,
            route,
            controls: Controls {
                start_enabled: state.can_start_navigation(),
                finish_enabled: state.can_finish_navigation(),
            },
        }
    }
}

/// GeoJSON `Feature` wrapping the route as a `LineString`.
pub fn route_feature(path: &[Position]) -> Feature {
    let coords = path.iter().map(|p| p.to_lng_lat()).collect();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coords))),
        id: None,
        properties: Some(serde_json::Map::new()),
        foreign_members: None,
    }
}

//! Navigation session controller.
//!
//! [`Controller`] owns the state and config and turns effects into
//! requests and camera commands; hosts with their own executor drive it
//! directly and feed completions back. [`Session`] wires a controller to
//! a [`DirectionsService`] and a [`MapView`] and resolves each request
//! inline.

use crate::camera::{CameraCommand, MapView};
use crate::config::Config;
use crate::directions::{DirectionsService, MapboxDirections, RouteFailure, RouteRequest};
use crate::location::{self, Fix, Geolocator};
use crate::scene::Scene;
use crate::state::{transition, Effect, Event, NavigationState};

/// What the host has to do after an event.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outcome {
    pub requests: Vec<RouteRequest>,
    pub camera: Vec<CameraCommand>,
}

pub struct Controller {
    config: Config,
    state: NavigationState,
}

impl Controller {
    pub fn new(config: Config) -> Self {
        let state = NavigationState::from_config(&config);
        Self { config, state }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn scene(&self) -> Scene {
        Scene::from_state(&self.state)
    }

    /// Resolve the starting position once and record it.
    pub fn locate<G: Geolocator + ?Sized>(&mut self, geolocator: &mut G) -> Fix {
        let fix = location::acquire(
            geolocator,
            &self.config.geolocation,
            self.config.fallback_position,
        );
        self.dispatch(Event::PositionAcquired {
            position: fix.position,
        });
        fix
    }

    pub fn dispatch(&mut self, event: Event) -> Outcome {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = transition(state, event);
        self.state = state;

        let mut outcome = Outcome::default();
        for effect in effects {
            match effect {
                Effect::RequestRoute { request } => outcome.requests.push(request),
                Effect::FitBounds { bounds } => outcome
                    .camera
                    .push(CameraCommand::fit(bounds, &self.config.fit_bounds)),
            }
        }
        outcome
    }
}

/// Synchronous session: every route request is resolved before
/// `handle` returns.
pub struct Session<D, V> {
    controller: Controller,
    directions: D,
    view: V,
}

impl<V: MapView> Session<MapboxDirections, V> {
    /// Session backed by the Mapbox client, configured from the environment.
    pub fn from_env(view: V) -> crate::Result<Self> {
        Self::with_mapbox(Config::from_env()?, view)
    }

    pub fn with_mapbox(config: Config, view: V) -> crate::Result<Self> {
        let directions = MapboxDirections::new(config.clone())?;
        Ok(Self::new(config, directions, view))
    }
}

impl<D: DirectionsService, V: MapView> Session<D, V> {
    pub fn new(config: Config, directions: D, view: V) -> Self {
        Self {
            controller: Controller::new(config),
            directions,
            view,
        }
    }

    pub fn start<G: Geolocator + ?Sized>(&mut self, geolocator: &mut G) -> Fix {
        self.controller.locate(geolocator)
    }

    pub fn handle(&mut self, event: Event) {
        let mut pending = vec![event];

        while let Some(event) = pending.pop() {
            let outcome = self.controller.dispatch(event);

            for command in &outcome.camera {
                self.view.fit_bounds(command);
            }

            for request in outcome.requests {
                let completion = match self.directions.route(&request) {
                    Ok(route) => Event::RouteLoaded {
                        token: request.token,
                        route,
                    },
                    Err(e) => Event::RouteFailed {
                        token: request.token,
                        failure: RouteFailure::from(&e),
                    },
                };
                pending.push(completion);
            }
        }
    }

    pub fn state(&self) -> &NavigationState {
        self.controller.state()
    }

    pub fn scene(&self) -> Scene {
        self.controller.scene()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CommandQueue;
    use crate::coord::Position;
    use crate::directions::{parse_response, DirectionsError, FailureKind, Route};
    use crate::location::{FixSource, FixedGeolocator, GeolocationError, DEFAULT_POSITION};
    use crate::state::Profile;
    use crate::testing::serve_once;

    /// Replays canned responses and records the coordinate strings it saw.
    struct FakeDirections {
        body: &'static str,
        fail: bool,
        seen: Vec<String>,
    }

    impl FakeDirections {
        fn ok(body: &'static str) -> Self {
            Self { body, fail: false, seen: Vec::new() }
        }
    }

    impl DirectionsService for FakeDirections {
        fn route(&mut self, request: &RouteRequest) -> Result<Route, DirectionsError> {
            self.seen.push(request.coordinate_string());
            if self.fail {
                return Err(DirectionsError::Status {
                    status: 401,
                    message: "Not Authorized - Invalid Token".into(),
                });
            }
            parse_response(self.body)
        }
    }

    const ROUTE_BODY: &str = r#"{"code": "Ok", "routes": [{
        "geometry": {"type": "LineString", "coordinates": [[139.0, 35.0], [139.1, 35.1]]},
        "distance": 15000.0, "duration": 1200.0, "legs": []
    }]}"#;

    fn config() -> Config {
        Config {
            access_token: "pk.test".into(),
            ..Config::default()
        }
    }

    fn session(directions: FakeDirections) -> Session<FakeDirections, CommandQueue> {
        let mut session = Session::new(config(), directions, CommandQueue::default());
        session.start(&mut FixedGeolocator(Ok(Position::new(35.0, 139.0))));
        session
    }

    #[test]
    fn start_falls_back_when_location_denied() {
        let directions = FakeDirections::ok(ROUTE_BODY);
        let mut session = Session::new(config(), directions, CommandQueue::default());
        let fix = session.start(&mut FixedGeolocator(Err(GeolocationError::PermissionDenied)));
        assert_eq!(fix.source, FixSource::Fallback);
        assert_eq!(session.state().current_position, Some(DEFAULT_POSITION));
        assert_eq!(session.state().map_center, Some(DEFAULT_POSITION));
        assert!(session.scene().initial_view.is_some());
    }

    #[test]
    fn navigation_fetches_route_and_fits_camera() {
        let mut session = session(FakeDirections::ok(ROUTE_BODY));
        session.handle(Event::MapClicked { position: Position::new(35.1, 139.1) });
        session.handle(Event::StartNavigation);

        assert_eq!(session.directions.seen, vec!["139.0,35.0;139.1,35.1"]);
        assert_eq!(
            session.state().route_geometry,
            Some(vec![Position::new(35.0, 139.0), Position::new(35.1, 139.1)])
        );

        let commands = session.view_mut().drain();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].bbox, [139.0, 35.0, 139.1, 35.1]);
        assert_eq!(commands[0].padding, 200.0);
        assert_eq!(commands[0].duration_ms, 1000);
    }

    #[test]
    fn waypoint_is_sent_between_endpoints() {
        let mut session = session(FakeDirections::ok(ROUTE_BODY));
        session.handle(Event::MapClicked { position: Position::new(35.1, 139.1) });
        session.handle(Event::WaypointToggled { enabled: true });
        session.handle(Event::WaypointDragged { position: Position::new(35.05, 139.05) });
        session.handle(Event::StartNavigation);

        assert_eq!(session.directions.seen, vec!["139.0,35.0;139.05,35.05;139.1,35.1"]);
    }

    #[test]
    fn profile_change_while_navigating_refetches() {
        let mut session = session(FakeDirections::ok(ROUTE_BODY));
        session.handle(Event::MapClicked { position: Position::new(35.1, 139.1) });
        session.handle(Event::StartNavigation);
        session.handle(Event::ProfileSelected { profile: Profile::Walking });

        assert_eq!(session.directions.seen.len(), 2);
        assert!(session.state().route_geometry.is_some());
        assert_eq!(session.view().commands.len(), 2);
    }

    #[test]
    fn failed_request_shows_no_route() {
        let mut directions = FakeDirections::ok(ROUTE_BODY);
        directions.fail = true;
        let mut session = session(directions);
        session.handle(Event::MapClicked { position: Position::new(35.1, 139.1) });
        session.handle(Event::StartNavigation);

        assert!(session.state().is_navigating);
        assert!(session.state().route_geometry.is_none());
        assert!(session.scene().route.is_none());
        assert_eq!(session.state().route_error.as_ref().map(|f| f.kind), Some(FailureKind::Status));
        assert!(session.view().commands.is_empty());
    }

    #[test]
    fn finish_removes_route_layer() {
        let mut session = session(FakeDirections::ok(ROUTE_BODY));
        session.handle(Event::MapClicked { position: Position::new(35.1, 139.1) });
        session.handle(Event::StartNavigation);
        assert!(session.scene().route.is_some());

        session.handle(Event::FinishNavigation);
        assert!(session.scene().route.is_none());
        assert!(session.scene().controls.start_enabled);
    }

    #[test]
    fn controller_reports_requests_for_async_hosts() {
        let mut controller = Controller::new(config());
        controller.dispatch(Event::PositionAcquired { position: Position::new(35.0, 139.0) });
        controller.dispatch(Event::MapClicked { position: Position::new(35.1, 139.1) });
        let outcome = controller.dispatch(Event::StartNavigation);

        assert_eq!(outcome.requests.len(), 1);
        assert!(outcome.camera.is_empty());

        let request = &outcome.requests[0];
        let route = parse_response(ROUTE_BODY).unwrap();
        let outcome = controller.dispatch(Event::RouteLoaded { token: request.token, route });
        assert_eq!(outcome.camera.len(), 1);
        assert!(controller.state().route_geometry.is_some());
    }

    #[test]
    fn controller_applies_configured_waypoint_offset() {
        let mut controller = Controller::new(Config {
            waypoint_offset_deg: 0.01,
            ..config()
        });
        controller.dispatch(Event::MapMoved { center: Position::new(35.0, 139.0) });
        controller.dispatch(Event::WaypointToggled { enabled: true });
        let wp = controller.state().waypoint.unwrap();
        assert!((wp.lat - 35.01).abs() < 1e-9);
    }

    #[test]
    fn mapbox_session_loads_route_over_http() {
        let (base_url, requests) = serve_once("200 OK", ROUTE_BODY);
        let config = Config {
            api_base_url: base_url,
            ..config()
        };
        let mut session = Session::with_mapbox(config, CommandQueue::default()).unwrap();
        session.start(&mut FixedGeolocator(Ok(Position::new(35.0, 139.0))));
        session.handle(Event::MapClicked { position: Position::new(35.1, 139.1) });
        session.handle(Event::StartNavigation);

        let request_line = requests.recv().unwrap();
        assert!(request_line.starts_with(
            "GET /directions/v5/mapbox/driving/139.0,35.0;139.1,35.1?steps=true"
        ));
        assert_eq!(session.state().route_geometry.as_ref().map(Vec::len), Some(2));
        assert_eq!(session.view().commands.len(), 1);
    }

    #[test]
    fn controller_seeds_fallback_from_config() {
        let mut controller = Controller::new(Config {
            fallback_position: Position::new(34.7025, 135.4959),
            ..config()
        });
        controller.dispatch(Event::PositionFailed { code: 1 });
        assert_eq!(controller.state().current_position, Some(Position::new(34.7025, 135.4959)));
    }
}

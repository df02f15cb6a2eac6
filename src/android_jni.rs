//! JNI bindings for the Android app.
//!
//! Each public function here corresponds to an `external fun` declaration
//! in RustBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! State, events and results cross the boundary as JSON strings. Errors
//! are raised as `java.lang.IllegalArgumentException` and the function
//! returns null.

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use serde::Serialize;

use crate::config::Config;
use crate::directions::{self, RouteRequest};
use crate::error::Result;
use crate::scene::Scene;
use crate::state::{self, Effect, Event, NavigationState};

#[derive(Serialize)]
struct TransitionResult {
    state: NavigationState,
    effects: Vec<Effect>,
}

/// Returns the rust-core library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_pinroute_app_RustBridge_version<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    respond(&mut env, Ok(crate::VERSION.to_string()))
}

/// Routes `log` output to logcat. Safe to call more than once.
/// Maps to: RustBridge.initLogging()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_pinroute_app_RustBridge_initLogging<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("pinroute"),
    );
}

/// Fresh session state for a host config.
/// Maps to: RustBridge.initialState(configJson: String) -> String
///
/// The result is the `stateJson` to pass to the first `transition` call so
/// the configured fallback position and waypoint offset apply.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_pinroute_app_RustBridge_initialState<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    config_json: JString<'local>,
) -> jstring {
    let result = read_args(&mut env, &[&config_json]).and_then(|args| initial_state_json(&args[0]));
    respond(&mut env, result)
}

/// Applies one event to a state.
/// Maps to: RustBridge.transition(stateJson: String, eventJson: String) -> String
///
/// An empty `stateJson` starts a fresh session.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_pinroute_app_RustBridge_transition<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    state_json: JString<'local>,
    event_json: JString<'local>,
) -> jstring {
    let result = read_args(&mut env, &[&state_json, &event_json])
        .and_then(|args| transition_json(&args[0], &args[1]));
    respond(&mut env, result)
}

/// Decodes a directions response body into a route.
/// Maps to: RustBridge.parseDirections(body: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_pinroute_app_RustBridge_parseDirections<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    body: JString<'local>,
) -> jstring {
    let result = read_args(&mut env, &[&body]).and_then(|args| parse_directions_json(&args[0]));
    respond(&mut env, result)
}

/// Builds the directions URL for a request effect.
/// Maps to: RustBridge.directionsUrl(configJson: String, requestJson: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_pinroute_app_RustBridge_directionsUrl<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    config_json: JString<'local>,
    request_json: JString<'local>,
) -> jstring {
    let result = read_args(&mut env, &[&config_json, &request_json])
        .and_then(|args| directions_url(&args[0], &args[1]));
    respond(&mut env, result)
}

/// Renders the presentation model for a state.
/// Maps to: RustBridge.scene(stateJson: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_pinroute_app_RustBridge_scene<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    state_json: JString<'local>,
) -> jstring {
    let result = read_args(&mut env, &[&state_json]).and_then(|args| scene_json(&args[0]));
    respond(&mut env, result)
}

fn read_args(env: &mut JNIEnv, args: &[&JString]) -> Result<Vec<String>> {
    args.iter()
        .map(|arg| {
            env.get_string(arg)
                .map(String::from)
                .map_err(|e| crate::error::Error::Config(format!("invalid string argument: {e}")))
        })
        .collect()
}

fn respond(env: &mut JNIEnv, result: Result<String>) -> jstring {
    let message = match result {
        Ok(json) => match env.new_string(json) {
            Ok(s) => return s.into_raw(),
            Err(e) => format!("failed to create Java string: {e}"),
        },
        Err(e) => e.to_string(),
    };

    log::error!("bridge call failed: {message}");
    let _ = env.throw_new("java/lang/IllegalArgumentException", message);
    std::ptr::null_mut()
}

fn parse_state(state_json: &str) -> Result<NavigationState> {
    if state_json.trim().is_empty() {
        return Ok(NavigationState::default());
    }
    Ok(serde_json::from_str(state_json)?)
}

fn initial_state_json(config_json: &str) -> Result<String> {
    let config = Config::from_json(config_json)?;
    Ok(serde_json::to_string(&NavigationState::from_config(&config))?)
}

fn transition_json(state_json: &str, event_json: &str) -> Result<String> {
    let state = parse_state(state_json)?;
    let event: Event = serde_json::from_str(event_json)?;
    let (state, effects) = state::transition(state, event);
    Ok(serde_json::to_string(&TransitionResult { state, effects })?)
}

fn parse_directions_json(body: &str) -> Result<String> {
    let route = directions::parse_response(body)?;
    Ok(serde_json::to_string(&route)?)
}

fn directions_url(config_json: &str, request_json: &str) -> Result<String> {
    let config = Config::from_json(config_json)?;
    let request: RouteRequest = serde_json::from_str(request_json)?;
    Ok(request.url(&config)?.to_string())
}

fn scene_json(state_json: &str) -> Result<String> {
    let state = parse_state(state_json)?;
    Ok(serde_json::to_string(&Scene::from_state(&state))?)
}

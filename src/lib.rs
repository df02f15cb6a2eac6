pub mod android_jni;
pub mod camera;
pub mod config;
pub mod controller;
pub mod coord;
pub mod directions;
pub mod error;
pub mod instructions;
pub mod location;
pub mod scene;
pub mod state;

#[cfg(test)]
mod testing;

pub use controller::{Controller, Session};
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

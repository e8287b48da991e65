//! Demo scene driver: free-look camera rig, physics stepping and exit
//! handling, driven by per-frame input snapshots.
//!
//! # Invariants
//! - Physics steps before any camera update in a frame.
//! - Keyboard movement is applied only while some key is held.
//! - Camera pitch stays within ±90 degrees.

mod config;
mod driver;
mod error;
mod rig;

pub use config::{CameraStart, DemoConfig, IndexPosition};
pub use driver::{ClockWorld, DemoDriver, PhysicsWorld};
pub use error::SceneError;
pub use rig::{DEFAULT_EYE, FreeLookRig, PITCH_LIMIT};

pub fn crate_info() -> &'static str {
    "gamekit-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}

//! Shared types used across gamekit crates.

mod types;

pub use types::{Transform, euler_degrees_from_quat, quat_from_euler_degrees};

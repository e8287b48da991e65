//! Input snapshots: per-frame keyboard and mouse state.
//!
//! # Invariants
//! - State is refreshed once per frame; no history is retained.
//! - Queries outside the valid scan-code range report "not down".

pub mod keyboard;
pub mod mouse;

pub use keyboard::{KEY_COUNT, KeyboardDevice, ScanCode, key_state};
pub use mouse::{MouseButtons, MouseDevice};

pub fn crate_info() -> &'static str {
    "gamekit-input v0.1.0"
}

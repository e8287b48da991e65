use bitflags::bitflags;
use glam::Vec2;

bitflags! {
    /// Mouse buttons currently held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        const LEFT = 1 << 0;
        const MIDDLE = 1 << 1;
        const RIGHT = 1 << 2;
    }
}

/// Mouse snapshot for the current frame.
#[derive(Debug, Clone, Default)]
pub struct MouseDevice {
    pub position: Vec2,
    /// Motion accumulated since the last `begin_frame`.
    pub relative: Vec2,
    pub wheel_delta: f32,
    pub buttons: MouseButtons,
    pub moved: bool,
}

impl MouseDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute cursor move. Contributes to `relative` as well.
    pub fn move_to(&mut self, position: Vec2) {
        let delta = position - self.position;
        self.position = position;
        self.accumulate_motion(delta);
    }

    /// Raw relative motion (e.g. from a captured device).
    pub fn accumulate_motion(&mut self, delta: Vec2) {
        if delta != Vec2::ZERO {
            self.relative += delta;
            self.moved = true;
        }
    }

    pub fn set_button(&mut self, button: MouseButtons, down: bool) {
        self.buttons.set(button, down);
    }

    pub fn is_button_down(&self, button: MouseButtons) -> bool {
        self.buttons.contains(button)
    }

    pub fn add_wheel(&mut self, delta: f32) {
        self.wheel_delta += delta;
    }

    pub fn begin_frame(&mut self) {
        self.relative = Vec2::ZERO;
        self.wheel_delta = 0.0;
        self.moved = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_accumulates_until_frame_start() {
        let mut m = MouseDevice::new();
        m.accumulate_motion(Vec2::new(2.0, 1.0));
        m.accumulate_motion(Vec2::new(1.0, -3.0));
        assert!(m.moved);
        assert_eq!(m.relative, Vec2::new(3.0, -2.0));

        m.begin_frame();
        assert!(!m.moved);
        assert_eq!(m.relative, Vec2::ZERO);
    }

    #[test]
    fn zero_motion_is_not_a_move() {
        let mut m = MouseDevice::new();
        m.accumulate_motion(Vec2::ZERO);
        assert!(!m.moved);
    }

    #[test]
    fn move_to_tracks_delta() {
        let mut m = MouseDevice::new();
        m.move_to(Vec2::new(10.0, 5.0));
        m.begin_frame();
        m.move_to(Vec2::new(12.0, 4.0));
        assert_eq!(m.relative, Vec2::new(2.0, -1.0));
        assert_eq!(m.position, Vec2::new(12.0, 4.0));
    }

    #[test]
    fn buttons() {
        let mut m = MouseDevice::new();
        m.set_button(MouseButtons::RIGHT, true);
        assert!(m.is_button_down(MouseButtons::RIGHT));
        m.set_button(MouseButtons::RIGHT, false);
        assert!(!m.is_button_down(MouseButtons::RIGHT));
    }
}

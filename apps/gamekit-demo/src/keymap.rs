use gamekit_input::ScanCode;
use winit::keyboard::KeyCode;

/// Map a physical winit key to a scan code. Unmapped keys give `None`.
pub fn scan_code(key: KeyCode) -> ScanCode {
    match key {
        KeyCode::KeyA => ScanCode::A,
        KeyCode::KeyB => ScanCode::B,
        KeyCode::KeyC => ScanCode::C,
        KeyCode::KeyD => ScanCode::D,
        KeyCode::KeyE => ScanCode::E,
        KeyCode::KeyF => ScanCode::F,
        KeyCode::KeyG => ScanCode::G,
        KeyCode::KeyH => ScanCode::H,
        KeyCode::KeyI => ScanCode::I,
        KeyCode::KeyJ => ScanCode::J,
        KeyCode::KeyK => ScanCode::K,
        KeyCode::KeyL => ScanCode::L,
        KeyCode::KeyM => ScanCode::M,
        KeyCode::KeyN => ScanCode::N,
        KeyCode::KeyO => ScanCode::O,
        KeyCode::KeyP => ScanCode::P,
        KeyCode::KeyQ => ScanCode::Q,
        KeyCode::KeyR => ScanCode::R,
        KeyCode::KeyS => ScanCode::S,
        KeyCode::KeyT => ScanCode::T,
        KeyCode::KeyU => ScanCode::U,
        KeyCode::KeyV => ScanCode::V,
        KeyCode::KeyW => ScanCode::W,
        KeyCode::KeyX => ScanCode::X,
        KeyCode::KeyY => ScanCode::Y,
        KeyCode::KeyZ => ScanCode::Z,
        KeyCode::Digit0 => ScanCode::Digit0,
        KeyCode::Digit1 => ScanCode::Digit1,
        KeyCode::Digit2 => ScanCode::Digit2,
        KeyCode::Digit3 => ScanCode::Digit3,
        KeyCode::Digit4 => ScanCode::Digit4,
        KeyCode::Digit5 => ScanCode::Digit5,
        KeyCode::Digit6 => ScanCode::Digit6,
        KeyCode::Digit7 => ScanCode::Digit7,
        KeyCode::Digit8 => ScanCode::Digit8,
        KeyCode::Digit9 => ScanCode::Digit9,
        KeyCode::ArrowUp => ScanCode::ArrowUp,
        KeyCode::ArrowDown => ScanCode::ArrowDown,
        KeyCode::ArrowLeft => ScanCode::ArrowLeft,
        KeyCode::ArrowRight => ScanCode::ArrowRight,
        KeyCode::Space => ScanCode::Space,
        KeyCode::Enter => ScanCode::Enter,
        KeyCode::Escape => ScanCode::Escape,
        KeyCode::Tab => ScanCode::Tab,
        KeyCode::Backspace => ScanCode::Backspace,
        KeyCode::Delete => ScanCode::Delete,
        KeyCode::ShiftLeft => ScanCode::ShiftLeft,
        KeyCode::ShiftRight => ScanCode::ShiftRight,
        KeyCode::ControlLeft => ScanCode::ControlLeft,
        KeyCode::ControlRight => ScanCode::ControlRight,
        KeyCode::AltLeft => ScanCode::AltLeft,
        KeyCode::AltRight => ScanCode::AltRight,
        KeyCode::F1 => ScanCode::F1,
        KeyCode::F2 => ScanCode::F2,
        KeyCode::F3 => ScanCode::F3,
        KeyCode::F4 => ScanCode::F4,
        KeyCode::F5 => ScanCode::F5,
        KeyCode::F6 => ScanCode::F6,
        KeyCode::F7 => ScanCode::F7,
        KeyCode::F8 => ScanCode::F8,
        KeyCode::F9 => ScanCode::F9,
        KeyCode::F10 => ScanCode::F10,
        KeyCode::F11 => ScanCode::F11,
        KeyCode::F12 => ScanCode::F12,
        _ => ScanCode::None,
    }
}

/// Windowing-independent keyboard scan codes.
///
/// `None` occupies slot 0 and is never reported as held.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScanCode {
    None = 0,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

/// One past the highest valid scan code.
pub const KEY_COUNT: usize = ScanCode::F12 as usize + 1;

/// Per-key state bits.
pub mod key_state {
    pub const NULL: u8 = 0;
    pub const PRESSED: u8 = 1;
    pub const RELEASED: u8 = 2;
}

/// Keyboard snapshot for the current frame.
///
/// Holds the pressed/released bits of every key plus frame-level flags.
/// No history is kept: [`KeyboardDevice::begin_frame`] drops the previous
/// frame's release edges.
#[derive(Debug, Clone)]
pub struct KeyboardDevice {
    keys: [u8; KEY_COUNT],
    key_count: usize,
    was_pressed: bool,
    was_released: bool,
}

impl Default for KeyboardDevice {
    fn default() -> Self {
        Self {
            keys: [key_state::NULL; KEY_COUNT],
            key_count: 0,
            was_pressed: false,
            was_released: false,
        }
    }
}

impl KeyboardDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently held.
    pub fn is_key_down(&self, key: ScanCode) -> bool {
        self.is_scan_code_down(key as i32)
    }

    /// Raw scan-code query. Codes outside `(0, KEY_COUNT)` are never down.
    pub fn is_scan_code_down(&self, code: i32) -> bool {
        if code > ScanCode::None as i32 && (code as usize) < KEY_COUNT {
            return self.keys[code as usize] & key_state::PRESSED != 0;
        }
        false
    }

    /// Raw state bits for `key`.
    pub fn state(&self, key: ScanCode) -> u8 {
        self.keys[key as usize]
    }

    /// Record a key-down event.
    pub fn press(&mut self, key: ScanCode) {
        if key == ScanCode::None {
            return;
        }
        let slot = &mut self.keys[key as usize];
        if *slot & key_state::PRESSED == 0 {
            self.key_count += 1;
        }
        *slot = key_state::PRESSED;
        self.was_pressed = true;
    }

    /// Record a key-up event.
    pub fn release(&mut self, key: ScanCode) {
        if key == ScanCode::None {
            return;
        }
        let slot = &mut self.keys[key as usize];
        if *slot & key_state::PRESSED != 0 {
            self.key_count -= 1;
        }
        *slot = key_state::RELEASED;
        self.was_released = true;
    }

    /// Start a new frame: clear edge flags and release bits.
    pub fn begin_frame(&mut self) {
        self.was_pressed = false;
        self.was_released = false;
        for slot in self.keys.iter_mut() {
            *slot &= !key_state::RELEASED;
        }
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        if self.key_count > 0 {
            tracing::debug!(held = self.key_count, "clearing keyboard state");
        }
        *self = Self::default();
    }

    /// Number of keys currently held.
    pub fn key_count(&self) -> usize {
        self.key_count
    }

    /// Whether any key went down since the last `begin_frame`.
    pub fn was_pressed(&self) -> bool {
        self.was_pressed
    }

    /// Whether any key went up since the last `begin_frame`.
    pub fn was_released(&self) -> bool {
        self.was_released
    }
}

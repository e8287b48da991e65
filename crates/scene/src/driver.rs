use gamekit_input::{KeyboardDevice, MouseDevice, ScanCode};
use glam::Vec3;

use crate::config::DemoConfig;
use crate::rig::FreeLookRig;

/// Seconds of `move_speed` travel per wheel line.
const WHEEL_DOLLY_SECONDS: f32 = 0.05;

/// The physics world a demo steps once per frame.
pub trait PhysicsWorld {
    fn step_simulation(&mut self, dt: f32);
}

/// A world with no bodies that only keeps time.
#[derive(Debug, Clone, Default)]
pub struct ClockWorld {
    elapsed: f32,
    steps: u64,
}

impl ClockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds simulated so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl PhysicsWorld for ClockWorld {
    fn step_simulation(&mut self, dt: f32) {
        self.elapsed += dt;
        self.steps += 1;
    }
}

/// Per-frame demo logic: physics stepping, free-look camera and quit key.
pub struct DemoDriver<P: PhysicsWorld> {
    physics: P,
    config: DemoConfig,
    rig: FreeLookRig,
    quit: bool,
}

impl<P: PhysicsWorld> DemoDriver<P> {
    pub fn new(physics: P) -> Self {
        Self {
            physics,
            config: DemoConfig::default(),
            rig: FreeLookRig::default(),
            quit: false,
        }
    }

    /// Set up the camera rig from `config`.
    pub fn create_scene(&mut self, config: DemoConfig) {
        self.rig = FreeLookRig::from_camera_start(config.camera.as_ref());
        tracing::info!(
            eye = ?self.rig.position(),
            from_config = config.camera.is_some(),
            "scene created"
        );
        self.config = config;
        self.quit = false;
    }

    /// Advance one frame of `tick` seconds.
    pub fn update(&mut self, tick: f32, keyboard: &KeyboardDevice, mouse: &MouseDevice) {
        self.physics.step_simulation(tick);

        if mouse.moved {
            self.rig.look(mouse.relative, tick, self.config.look_divisor);
        }
        if mouse.wheel_delta != 0.0 {
            let dolly = mouse.wheel_delta * self.config.move_speed * WHEEL_DOLLY_SECONDS;
            self.rig.translate_local(Vec3::new(0.0, 0.0, -dolly));
        }

        if keyboard.key_count() == 0 {
            return;
        }
        let held = |a: ScanCode, b: ScanCode| keyboard.is_key_down(a) || keyboard.is_key_down(b);
        let forward = axis(
            held(ScanCode::W, ScanCode::ArrowUp),
            held(ScanCode::S, ScanCode::ArrowDown),
        );
        let left = axis(
            held(ScanCode::A, ScanCode::ArrowLeft),
            held(ScanCode::D, ScanCode::ArrowRight),
        );

        let step = self.config.move_speed * tick;
        if forward != 0.0 {
            self.rig.translate_local(Vec3::new(0.0, 0.0, -forward * step));
        }
        if left != 0.0 {
            self.rig.translate_local(Vec3::new(-left * step, 0.0, 0.0));
        }
    }

    /// Frame epilogue. Holding `Q` requests exit.
    pub fn end_frame(&mut self, keyboard: &KeyboardDevice) {
        if keyboard.is_key_down(ScanCode::Q) {
            tracing::debug!("quit requested");
            self.quit = true;
        }
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn background(&self) -> [f32; 4] {
        self.config.background
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn rig(&self) -> &FreeLookRig {
        &self.rig
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    f32::from(u8::from(positive)) - f32::from(u8::from(negative))
}

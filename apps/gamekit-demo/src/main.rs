mod content;
mod keymap;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use gamekit_input::{KeyboardDevice, MouseButtons, MouseDevice};
use gamekit_render_wgpu::{AtlasQuadRenderer, AtlasScene, Projection};
use gamekit_scene::{ClockWorld, DemoConfig, DemoDriver};
use gamekit_shadergen::TextureAddressingMode;
use glam::Vec2;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::content::{DemoContent, FLOOR_HEIGHT};

#[derive(Parser)]
#[command(name = "gamekit-demo", about = "Free-look demo over atlas-sampled quads")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Demo config (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Addressing mode for the atlas unit: wrap, mirror, clamp or border
    #[arg(long, default_value = "wrap")]
    addressing: String,
}

struct GpuState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: AtlasQuadRenderer,
}

struct DemoApp {
    driver: DemoDriver<ClockWorld>,
    content: DemoContent,
    keyboard: KeyboardDevice,
    mouse: MouseDevice,
    mouse_captured: bool,
    projection: Projection,
    last_frame: Instant,
    gpu: Option<GpuState>,
}

impl DemoApp {
    fn new(config: DemoConfig, content: DemoContent) -> Self {
        let mut driver = DemoDriver::new(ClockWorld::new());
        driver.create_scene(config);
        Self {
            driver,
            content,
            keyboard: KeyboardDevice::new(),
            mouse: MouseDevice::new(),
            mouse_captured: false,
            projection: Projection::default(),
            last_frame: Instant::now(),
            gpu: None,
        }
    }

    fn init_gpu(&self, event_loop: &ActiveEventLoop) -> Result<GpuState> {
        let attrs = Window::default_attributes()
            .with_title("gamekit demo")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("gamekit_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = AtlasQuadRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            AtlasScene {
                shader: &self.content.shader,
                layout: &self.content.layout,
                quads: &self.content.quads,
                atlas: &self.content.atlas_image,
                floor_height: FLOOR_HEIGHT,
            },
        )?;

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            "GPU initialized"
        );

        Ok(GpuState {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let tick = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        self.driver.update(tick, &self.keyboard, &self.mouse);
        self.driver.end_frame(&self.keyboard);
        self.keyboard.begin_frame();
        self.mouse.begin_frame();
        if self.driver.should_quit() {
            event_loop.exit();
            return;
        }

        let Some(gpu) = &self.gpu else {
            return;
        };

        self.content
            .render_state
            .update_gpu_program_params(&mut self.content.pass);
        if let Err(e) = gpu.renderer.flush_params(&gpu.queue, &mut self.content.pass) {
            tracing::error!("failed to upload pass constants: {e}");
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let view_proj = self
            .projection
            .view_projection(self.driver.rig().view_matrix());
        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            view_proj,
            self.driver.background(),
        );

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => {
                self.projection
                    .set_viewport(gpu.config.width, gpu.config.height);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.driver.request_quit();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    gpu.renderer
                        .resize(&gpu.device, gpu.config.width, gpu.config.height);
                    self.projection
                        .set_viewport(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::Focused(false) => {
                self.keyboard.clear();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                let code = keymap::scan_code(key);
                match state {
                    ElementState::Pressed => self.keyboard.press(code),
                    ElementState::Released => self.keyboard.release(code),
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                let bit = match button {
                    MouseButton::Left => MouseButtons::LEFT,
                    MouseButton::Middle => MouseButtons::MIDDLE,
                    MouseButton::Right => MouseButtons::RIGHT,
                    _ => return,
                };
                self.mouse.set_button(bit, pressed);
                if bit == MouseButtons::RIGHT {
                    self.mouse_captured = pressed;
                    if let Some(gpu) = &self.gpu {
                        gpu.window.set_cursor_visible(!pressed);
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 120.0,
                };
                self.mouse.add_wheel(lines);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.mouse_captured {
                self.mouse
                    .accumulate_motion(Vec2::new(delta.0 as f32, delta.1 as f32));
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("gamekit-demo starting");

    let (config, base_dir) = match &cli.config {
        Some(path) => (
            DemoConfig::load(path)?,
            path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        ),
        None => (DemoConfig::default(), PathBuf::from(".")),
    };
    let addressing: TextureAddressingMode = cli.addressing.parse()?;
    let content = DemoContent::build(&config, &base_dir, addressing)?;
    tracing::debug!(tables = content.registry.len(), "atlas registry ready");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp::new(config, content);
    event_loop.run_app(&mut app)?;

    tracing::info!(
        frames = app.driver.physics().steps(),
        "gamekit-demo finished"
    );
    Ok(())
}

//! Blobgrid - a grid of audio-reactive metaball blobs
//!
//! Dots breathe on randomized timers; microphone loudness decides how
//! aggressively neighbors merge and how far each dot swells.

mod audio;
mod cli;
mod field;
mod params;
mod rendering;
mod volume;

use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use audio::AudioSystem;
use clap::Parser;
use field::FieldSystem;
use params::{RenderConfig, WobbleConfig};
use rendering::{FieldUniforms, RenderSystem};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation systems
    field: FieldSystem,
    audio: Option<AudioSystem>,

    // Configuration
    render_config: RenderConfig,

    // Time tracking
    start_time: Instant,
}

impl App {
    fn new(args: &cli::Args) -> Self {
        let field = FieldSystem::new(
            args.grid_layout(),
            WobbleConfig::default(),
            args.mic_config(),
            args.volume_mapping(),
        );

        Self {
            window: None,
            render_system: None,
            field,
            audio: None,
            render_config: RenderConfig::default(),
            start_time: Instant::now(),
        }
    }

    /// Milliseconds since application start (monotonic).
    fn now_ms(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32() * 1000.0
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Blobgrid - Mic-Reactive Metaballs")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        // Populate the lattice before sizing GPU buffers for it
        let size = window.inner_size();
        let now_ms = self.now_ms();
        self.field
            .rebuild(size.width as f32, size.height as f32, now_ms);
        log::info!(
            "Initial grid: {}x{} px, {} dots",
            size.width,
            size.height,
            self.field.dot_count()
        );

        // Initialize rendering system
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.field.dot_count(),
        ))
        .unwrap();

        // Microphone trouble degrades to a silent, steady field
        let audio = match AudioSystem::new() {
            Ok(audio) => Some(audio),
            Err(e) => {
                log::warn!("Audio input unavailable ({}), rendering at silence", e);
                None
            }
        };

        println!("\nBlobgrid is running!");
        println!("Press F to toggle fullscreen, ESC to quit\n");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.audio = audio;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        self.handle_key(key_code, event_loop);
                    }
                }
            }
            WindowEvent::Resized(new_size) => {
                // Surface, lattice, and GPU capacity all settle here,
                // before the next redraw serializes the field
                let now_ms = self.now_ms();
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(new_size.width, new_size.height);
                }
                self.field
                    .rebuild(new_size.width as f32, new_size.height as f32, now_ms);
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.ensure_dot_capacity(self.field.dot_count());
                }
                log::info!(
                    "Window resized to {}x{}, {} dots",
                    new_size.width,
                    new_size.height,
                    self.field.dot_count()
                );
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

impl App {
    fn handle_key(&mut self, key_code: KeyCode, event_loop: &ActiveEventLoop) {
        match key_code {
            KeyCode::KeyF => {
                if let Some(window) = &self.window {
                    if window.fullscreen().is_some() {
                        window.set_fullscreen(None);
                    } else {
                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                    }
                }
            }
            // Escape leaves fullscreen first, then quits
            KeyCode::Escape => match &self.window {
                Some(window) if window.fullscreen().is_some() => window.set_fullscreen(None),
                _ => event_loop.exit(),
            },
            _ => {}
        }
    }

    /// Render a single frame
    fn render_frame(&mut self) {
        let now_ms = self.now_ms();

        // Latest raw loudness; a missing stream reads as silence
        let raw_level = self.audio.as_ref().map(|a| a.level()).unwrap_or(0.0);

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        // Advance the pipeline and pack this frame's payload
        let (strength, size_scale) = self.field.update(raw_level, now_ms);
        let payload = self.field.serialize(size_scale);
        let dot_count = (payload.len() / 3) as u32;

        render_system.update_dots(payload);

        let (width, height) = render_system.size();
        render_system.update_uniforms(&FieldUniforms {
            resolution: [width as f32, height as f32],
            strength,
            dot_count,
        });

        match render_system.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = render_system.size();
                render_system.resize(width, height);
            }
            Err(e) => log::error!("Render error: {:?}", e),
        }
    }
}

fn main() {
    env_logger::init();

    let args = cli::Args::parse();

    println!("Blobgrid - audio-reactive metaball grid");

    let mut app = App::new(&args);
    let event_loop = EventLoop::new().unwrap();
    let _ = event_loop.run_app(&mut app);
}

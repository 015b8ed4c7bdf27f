//! Window, GPU and fixed-step main loop shared by every demo.
//!
//! winit drives the loop through `ApplicationHandler`. Each redraw:
//!
//!   1. frame boundary: the demo may hot reload, new textures are loaded
//!   2. `while should_step()`: global hotkeys, then one `Demo::step`
//!   3. the demo draws into a fresh `SpriteBatch`, which is uploaded
//!   4. scene pass, then the egui overlay on top

use std::sync::Arc;

use qb_core::{InputState, Key, MouseBtn, TimeState, FIXED_DT_SECS, FIXED_DT_US};
use qb_devtools::{DebugOverlay, OverlayStats};
use qb_render::{GpuContext, SpriteBatch, SpriteRenderer};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::demo::{Demo, StepContext, TextureRequest, TextureSource};

/// Pixels per scroll line for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f64 = 120.0;

struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: SpriteRenderer,
    overlay: DebugOverlay,
    input: InputState,
    time: TimeState,
    batch: SpriteBatch,
    paused: bool,
    single_step_requested: bool,
    demo: Box<dyn Demo>,
}

impl EngineState {
    fn new(window: Arc<Window>, mut demo: Box<dyn Demo>) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let mut renderer = SpriteRenderer::new(&gpu);
        load_textures(&mut renderer, &gpu, &demo.textures())?;
        let overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);
        demo.resized(gpu.aspect());
        log::info!("Running demo: {}", demo.label());

        Ok(Self {
            window,
            gpu,
            renderer,
            overlay,
            input: InputState::new(),
            time: TimeState::new(),
            batch: SpriteBatch::new(),
            paused: false,
            single_step_requested: false,
            demo,
        })
    }

    fn frame_boundary(&mut self) {
        if !self.demo.frame_boundary() {
            return;
        }
        if let Err(err) = load_textures(&mut self.renderer, &self.gpu, &self.demo.textures()) {
            log::warn!("Texture load after reload failed: {err}");
        }
    }

    /// Run the fixed steps this frame owes. Returns false when the app
    /// should exit.
    fn simulate(&mut self) -> bool {
        self.time.begin_frame();
        self.frame_boundary();

        let mut first = true;
        while self.time.should_step() {
            if first {
                if self.input.is_just_pressed(Key::Escape) {
                    return false;
                }
                if self.input.is_just_pressed(Key::F3) {
                    self.overlay.toggle();
                }
            }

            if self.paused && !self.single_step_requested {
                self.time.discard_pending();
                break;
            }
            self.single_step_requested = false;

            let ctx = StepContext {
                input: &self.input,
                dt: FIXED_DT_SECS,
                dt_us: FIXED_DT_US,
                window_size: self.gpu.size,
                fresh_edges: first,
            };
            self.demo.step(&ctx);
            first = false;
        }
        self.time.end_frame();
        true
    }

    fn render(&mut self) {
        self.batch.clear();
        self.demo.draw(&mut self.batch);
        let camera = self.demo.camera();
        self.renderer.prepare(&self.gpu, &self.batch, &camera);

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let render_stats = self.renderer.stats();
        let stats = OverlayStats {
            draw_calls: render_stats.draw_calls,
            texture_binds: render_stats.texture_binds,
            quad_count: render_stats.quad_count,
            memory_estimate_mb: self.renderer.estimate_memory_mb(),
            demo_label: self.demo.label().to_string(),
            lua_status_label: self.demo.lua_status(),
            status_lines: self.demo.status_lines(),
            paused: self.paused,
        };
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.overlay.prepare(&self.window, &self.time, &stats);

        if overlay_actions.toggle_pause {
            self.paused = !self.paused;
            log::info!(
                "Simulation {}",
                if self.paused { "PAUSED" } else { "RESUMED" }
            );
        }
        if overlay_actions.single_step {
            self.single_step_requested = true;
        }
        if overlay_actions.restart {
            self.demo.restart();
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.demo.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            self.renderer.draw(&mut render_pass, &self.batch);
        }

        self.overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

pub struct App {
    pending_demo: Option<Box<dyn Demo>>,
    state: Option<EngineState>,
    failed: bool,
}

impl App {
    pub fn new(demo: Box<dyn Demo>) -> Self {
        Self {
            pending_demo: Some(demo),
            state: None,
            failed: false,
        }
    }

    /// True when startup failed and the loop exited early.
    pub fn failed(&self) -> bool {
        self.failed
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, msg: &str) {
        log::error!("{msg}");
        self.failed = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(demo) = self.pending_demo.take() else {
            return;
        };
        let window = match qb_platform::create_window(event_loop, &demo.platform_config()) {
            Ok(window) => window,
            Err(err) => return self.fail(event_loop, &err),
        };
        match EngineState::new(window, demo) {
            Ok(state) => self.state = Some(state),
            Err(err) => self.fail(event_loop, &format!("Startup failed: {err}")),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.demo.resized(state.gpu.aspect());
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(key),
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } if !egui_consumed => {
                if let Some(btn) = map_mouse(button) {
                    match button_state {
                        ElementState::Pressed => state.input.mouse_down(btn),
                        ElementState::Released => state.input.mouse_up(btn),
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } if !egui_consumed => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                state.input.scroll(lines);
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = (position.x, position.y);
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                if !state.simulate() {
                    log::info!("Escape pressed, exiting.");
                    event_loop.exit();
                    return;
                }
                state.render();

                // Edges survive frames that ran no step, so a tap is never lost.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

/// Register every requested texture not already loaded.
fn load_textures(
    renderer: &mut SpriteRenderer,
    gpu: &GpuContext,
    requests: &[TextureRequest],
) -> Result<(), String> {
    for request in requests {
        if renderer.has_texture(&request.key) {
            continue;
        }
        match &request.source {
            TextureSource::File(path) => {
                renderer.load_texture(gpu, &request.key, path, request.options)?
            }
            TextureSource::Rgba { pixels, size } => {
                renderer.insert_rgba8(gpu, &request.key, pixels, *size, request.options)
            }
        }
    }
    Ok(())
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Digit1 | KeyCode::Numpad1 => Some(Key::Digit1),
        KeyCode::Digit2 | KeyCode::Numpad2 => Some(Key::Digit2),
        KeyCode::Digit3 | KeyCode::Numpad3 => Some(Key::Digit3),
        KeyCode::KeyB => Some(Key::B),
        KeyCode::KeyC => Some(Key::C),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F5 => Some(Key::F5),
        _ => None,
    }
}

fn map_mouse(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        _ => None,
    }
}

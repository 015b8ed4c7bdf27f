//! Debug overlay rendered via egui on top of the running demo.
//!
//! egui needs a `RenderPass<'static>` while `begin_render_pass` borrows the
//! encoder, so rendering is split into phases:
//!
//!   1. `prepare()` -- run the UI, produce tessellated primitives
//!   2. `upload()`  -- upload textures and buffers (borrows the encoder)
//!   3. `paint()`   -- draw into a pass created with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! UI logic only runs while `visible` (F3), but events always go through egui
//! so the window can take clicks when shown.

use qb_core::time::TimeState;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub quad_count: u32,
    /// Estimated GPU memory usage in megabytes
    pub memory_estimate_mb: f32,
    pub demo_label: String,
    /// `None` for demos without a scripted controller
    pub lua_status_label: Option<String>,
    /// Free-form demo state (score, mode, books left...)
    pub status_lines: Vec<String>,
    pub paused: bool,
}

impl OverlayStats {
    pub fn render_lines(&self) -> Vec<String> {
        vec![
            format!("Draw calls: {}", self.draw_calls),
            format!("Texture binds: {}", self.texture_binds),
            format!("Quads: {}", self.quad_count),
            format!("Memory: {:.1} MB", self.memory_estimate_mb),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Advance one fixed step while paused
    pub single_step: bool,
    pub restart: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        // Hidden overlay never swallows demo input.
        self.visible && response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        stats: &OverlayStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !self.visible {
                return;
            }
            egui::Window::new(stats.demo_label.as_str())
                .default_pos([10.0, 10.0])
                .show(ctx, |ui| {
                    ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                    ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                    ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                    ui.label(format!("Total steps: {}", time.fixed_step_count));

                    ui.separator();
                    for line in stats.render_lines() {
                        ui.label(line);
                    }
                    if let Some(lua) = &stats.lua_status_label {
                        ui.label(lua);
                    }

                    if !stats.status_lines.is_empty() {
                        ui.separator();
                        for line in &stats.status_lines {
                            ui.label(line);
                        }
                    }

                    ui.separator();
                    ui.horizontal(|ui| {
                        let pause_label = if stats.paused { "Resume" } else { "Pause" };
                        if ui.button(pause_label).clicked() {
                            actions.toggle_pause = true;
                        }
                        if stats.paused && ui.button("Step").clicked() {
                            actions.single_step = true;
                        }
                        if ui.button("Restart").clicked() {
                            actions.restart = true;
                        }
                    });
                    if stats.paused {
                        ui.label("\u{23f8} PAUSED");
                    }
                });
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lines_report_batch_counters() {
        let stats = OverlayStats {
            draw_calls: 3,
            texture_binds: 2,
            quad_count: 410,
            memory_estimate_mb: 1.5,
            ..Default::default()
        };
        let lines = stats.render_lines();
        assert_eq!(lines[0], "Draw calls: 3");
        assert_eq!(lines[1], "Texture binds: 2");
        assert_eq!(lines[2], "Quads: 410");
        assert_eq!(lines[3], "Memory: 1.5 MB");
    }
}

//! The seam between the shared main loop and the individual programs.
//!
//! The app owns the window, GPU, clock and overlay. A demo owns its world and
//! only sees input through a [`StepContext`], once per fixed step. Edge
//! queries (`pressed`, `clicked`, `scroll`) only fire on the first step of a
//! frame, so a frame that runs several catch-up steps acts on a tap once.

use std::path::PathBuf;
use std::sync::Arc;

use qb_core::{InputState, Key, MouseBtn};
use qb_platform::PlatformConfig;
use qb_render::{Camera2D, SpriteBatch, TextureOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    File(PathBuf),
    Rgba { pixels: Vec<u8>, size: (u32, u32) },
}

/// A texture the demo draws with, registered under `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRequest {
    pub key: Arc<str>,
    pub source: TextureSource,
    pub options: TextureOptions,
}

impl TextureRequest {
    pub fn file(key: &Arc<str>, path: impl Into<PathBuf>, options: TextureOptions) -> Self {
        Self {
            key: key.clone(),
            source: TextureSource::File(path.into()),
            options,
        }
    }

    /// A single opaque white texel, for flat tinted quads.
    pub fn white(key: &Arc<str>) -> Self {
        Self {
            key: key.clone(),
            source: TextureSource::Rgba {
                pixels: vec![255; 4],
                size: (1, 1),
            },
            options: TextureOptions::PIXEL_ART,
        }
    }
}

pub struct StepContext<'a> {
    pub input: &'a InputState,
    pub dt: f32,
    pub dt_us: u64,
    /// Window size in physical pixels.
    pub window_size: (u32, u32),
    /// First fixed step of this frame.
    pub fresh_edges: bool,
}

impl StepContext<'_> {
    pub fn held(&self, key: Key) -> bool {
        self.input.is_held(key)
    }

    pub fn pressed(&self, key: Key) -> bool {
        self.fresh_edges && self.input.is_just_pressed(key)
    }

    pub fn clicked(&self, btn: MouseBtn) -> bool {
        self.fresh_edges && self.input.is_mouse_just_pressed(btn)
    }

    pub fn scroll(&self) -> f32 {
        if self.fresh_edges {
            self.input.scroll_delta()
        } else {
            0.0
        }
    }

    pub fn cursor(&self) -> (f64, f64) {
        self.input.mouse_position
    }
}

pub trait Demo {
    fn label(&self) -> &str;

    fn platform_config(&self) -> PlatformConfig;

    /// Every texture the demo currently needs. Asked once at startup and
    /// again whenever [`Demo::frame_boundary`] reports a change.
    fn textures(&self) -> Vec<TextureRequest>;

    fn step(&mut self, ctx: &StepContext<'_>);

    fn camera(&self) -> Camera2D;

    fn clear_color(&self) -> wgpu::Color;

    /// Painter's order: later pushes draw on top.
    fn draw(&self, batch: &mut SpriteBatch);

    fn status_lines(&self) -> Vec<String> {
        Vec::new()
    }

    fn lua_status(&self) -> Option<String> {
        None
    }

    fn restart(&mut self);

    fn resized(&mut self, _aspect: f32) {}

    /// Called between frames, outside the fixed-step loop. Returns true when
    /// the demo reloaded assets and may need new textures.
    fn frame_boundary(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoKind {
    Anaglyph,
    ColorGame,
    Mineiso,
    Platformer,
}

impl DemoKind {
    pub fn parse(name: Option<&str>) -> Result<Self, String> {
        match name {
            None | Some("platformer") => Ok(Self::Platformer),
            Some("anaglyph") => Ok(Self::Anaglyph),
            Some("color") => Ok(Self::ColorGame),
            Some("mineiso") => Ok(Self::Mineiso),
            Some(other) => Err(format!(
                "Unknown demo '{other}' (expected anaglyph, color, mineiso or platformer)"
            )),
        }
    }
}

/// Fixed seed for reproducible runs, entropy otherwise.
pub fn demo_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// RGB bytes of `0xRRGGBB` as a clear color.
pub fn hex_color(rgb: u32) -> wgpu::Color {
    let channel = |shift: u32| f64::from((rgb >> shift) & 0xff) / 255.0;
    wgpu::Color {
        r: channel(16),
        g: channel(8),
        b: channel(0),
        a: 1.0,
    }
}

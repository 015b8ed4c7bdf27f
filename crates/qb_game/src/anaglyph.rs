//! Red/cyan stereo viewer: one full-window quad sampling a left and a right
//! photograph, combined per pixel in the fragment shader.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec2;
use qb_core::{Key, Transform};
use qb_platform::PlatformConfig;
use qb_render::{Camera2D, QuadMesh, SpriteBatch, SpriteDraw, TextureOptions};

use crate::demo::{Demo, StepContext, TextureRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnaglyphFormula {
    True,
    Gray,
    #[default]
    Color,
}

impl AnaglyphFormula {
    /// Value of the shader's formula uniform.
    pub fn index(self) -> u32 {
        match self {
            Self::True => 0,
            Self::Gray => 1,
            Self::Color => 2,
        }
    }

    /// Same math as the fragment shader, on linear `[0, 1]` RGB.
    #[cfg(test)]
    pub fn combine(self, left: [f32; 3], right: [f32; 3]) -> [f32; 3] {
        match self {
            Self::True => [luminance(right), 0.0, luminance(left)],
            Self::Gray => [luminance(right), luminance(left), luminance(left)],
            Self::Color => [right[0], left[1], left[2]],
        }
    }
}

impl fmt::Display for AnaglyphFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::True => "true",
            Self::Gray => "gray",
            Self::Color => "color",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

pub struct AnaglyphDemo {
    left_path: PathBuf,
    right_path: PathBuf,
    left: Arc<str>,
    right: Arc<str>,
    quad: QuadMesh,
    formula: AnaglyphFormula,
}

impl AnaglyphDemo {
    pub fn new(left_path: PathBuf, right_path: PathBuf) -> Self {
        Self {
            left_path,
            right_path,
            left: Arc::from("anaglyph/left"),
            right: Arc::from("anaglyph/right"),
            quad: QuadMesh::unit(),
            formula: AnaglyphFormula::default(),
        }
    }

    pub fn formula(&self) -> AnaglyphFormula {
        self.formula
    }

    fn select(&mut self, formula: AnaglyphFormula) {
        if self.formula != formula {
            self.formula = formula;
            log::info!("Anaglyph formula: {formula}");
        }
    }
}

impl Demo for AnaglyphDemo {
    fn label(&self) -> &str {
        "Anaglyph"
    }

    fn platform_config(&self) -> PlatformConfig {
        PlatformConfig::new("Anaglyph", 800, 600)
    }

    fn textures(&self) -> Vec<TextureRequest> {
        vec![
            TextureRequest::file(&self.left, &self.left_path, TextureOptions::PHOTO),
            TextureRequest::file(&self.right, &self.right_path, TextureOptions::PHOTO),
        ]
    }

    fn step(&mut self, ctx: &StepContext<'_>) {
        if ctx.pressed(Key::Digit1) {
            self.select(AnaglyphFormula::True);
        } else if ctx.pressed(Key::Digit2) {
            self.select(AnaglyphFormula::Gray);
        } else if ctx.pressed(Key::Digit3) {
            self.select(AnaglyphFormula::Color);
        }
    }

    fn camera(&self) -> Camera2D {
        Camera2D::ndc()
    }

    fn clear_color(&self) -> wgpu::Color {
        wgpu::Color::BLACK
    }

    fn draw(&self, batch: &mut SpriteBatch) {
        // Photos keep their top row first, so the quad is mirrored vertically.
        let model = Transform::default().with_scale(Vec2::new(1.0, -1.0)).matrix();
        batch.anaglyph_formula = self.formula.index();
        batch.push_anaglyph(&self.left, &self.right, SpriteDraw::whole(&self.quad, model));
    }

    fn status_lines(&self) -> Vec<String> {
        vec![format!("Formula: {} (1/2/3)", self.formula)]
    }

    fn restart(&mut self) {
        self.select(AnaglyphFormula::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qb_core::InputState;
    use qb_render::Material;

    const LEFT: [f32; 3] = [0.2, 0.4, 0.6];
    const RIGHT: [f32; 3] = [0.9, 0.1, 0.3];

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn luminance_weights_sum_to_one() {
        assert!((luminance([1.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((luminance([1.0, 0.0, 0.0]) - 0.299).abs() < 1e-6);
    }

    #[test]
    fn true_formula_drops_green() {
        let out = AnaglyphFormula::True.combine(LEFT, RIGHT);
        assert!(approx(out, [luminance(RIGHT), 0.0, luminance(LEFT)]));
    }

    #[test]
    fn gray_formula_uses_left_luma_for_cyan() {
        let out = AnaglyphFormula::Gray.combine(LEFT, RIGHT);
        assert!(approx(out, [luminance(RIGHT), luminance(LEFT), luminance(LEFT)]));
    }

    #[test]
    fn color_formula_takes_red_from_right() {
        let out = AnaglyphFormula::Color.combine(LEFT, RIGHT);
        assert!(approx(out, [0.9, 0.4, 0.6]));
    }

    #[test]
    fn digit_keys_select_formula() {
        let mut demo = AnaglyphDemo::new("l.png".into(), "r.png".into());
        assert_eq!(demo.formula(), AnaglyphFormula::Color);

        let mut input = InputState::new();
        input.key_down(Key::Digit1);
        demo.step(&StepContext {
            input: &input,
            dt: 1.0 / 60.0,
            dt_us: 16_667,
            window_size: (800, 600),
            fresh_edges: true,
        });
        assert_eq!(demo.formula(), AnaglyphFormula::True);

        demo.restart();
        assert_eq!(demo.formula(), AnaglyphFormula::Color);
    }

    #[test]
    fn draws_one_anaglyph_quad() {
        let mut demo = AnaglyphDemo::new("l.png".into(), "r.png".into());
        demo.select(AnaglyphFormula::Gray);
        let mut batch = SpriteBatch::new();
        demo.draw(&mut batch);
        assert_eq!(batch.quad_count(), 1);
        assert_eq!(batch.anaglyph_formula, 1);
        assert!(matches!(batch.draw_calls[0].material, Material::Anaglyph { .. }));
        // Mirrored: the vertex sampling v = 0 ends up on top.
        assert_eq!(batch.vertices[0].position, [-1.0, 1.0]);
        assert_eq!(batch.vertices[0].tex_coords, [0.0, 0.0]);
    }

    #[test]
    fn requests_both_photos() {
        let demo = AnaglyphDemo::new("l.png".into(), "r.png".into());
        let textures = demo.textures();
        assert_eq!(textures.len(), 2);
        assert!(textures.iter().all(|t| t.options == TextureOptions::PHOTO));
    }
}

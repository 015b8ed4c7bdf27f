use std::ops::Range;
use std::sync::Arc;

use qb_core::{Gravity, Highlight, Motion, SpriteAnimation, TextureOffset, TextureSlide, Transform};
use qb_render::{QuadMesh, SpriteBatch, SpriteDraw};

/// One drawable entity: components plus a shared mesh and texture key.
#[derive(Debug, Clone)]
pub struct GameObject {
    pub transform: Transform,
    pub motion: Motion,
    pub gravity: Option<Gravity>,
    pub sprite: Option<SpriteAnimation>,
    pub highlight: Highlight,
    pub slide: Option<TextureSlide>,
    pub tex_offset: TextureOffset,
    pub mesh: Arc<QuadMesh>,
    pub texture: Arc<str>,
    pub tint: [f32; 4],
}

impl GameObject {
    pub fn new(mesh: Arc<QuadMesh>, texture: Arc<str>, transform: Transform) -> Self {
        Self {
            transform,
            motion: Motion::default(),
            gravity: None,
            sprite: None,
            highlight: Highlight::default(),
            slide: None,
            tex_offset: TextureOffset::default(),
            mesh,
            texture,
            tint: [1.0; 4],
        }
    }

    pub fn with_sprite(mut self, sprite: SpriteAnimation) -> Self {
        self.sprite = Some(sprite);
        self
    }

    pub fn with_slide(mut self, slide: TextureSlide) -> Self {
        self.slide = Some(slide);
        self
    }

    /// Gravity, then motion, then sprite animation, then texture slide.
    pub fn update(&mut self, dt: f32, dt_us: u64) {
        if let Some(gravity) = &self.gravity {
            gravity.apply(&mut self.motion);
        }
        self.motion.integrate(&mut self.transform, dt);
        if let Some(sprite) = &mut self.sprite {
            sprite.update(dt_us);
        }
        if let Some(slide) = &self.slide {
            slide.advance(&mut self.tex_offset, dt);
        }
    }

    /// Index range of the current sprite frame, or the whole mesh.
    pub fn draw_range(&self) -> Range<u32> {
        match &self.sprite {
            Some(sprite) => self.mesh.frame_range(sprite.current_strip_frame()),
            None => self.mesh.full_range(),
        }
    }

    pub fn color(&self) -> [f32; 4] {
        let h = self.highlight.color();
        [
            self.tint[0] * h[0],
            self.tint[1] * h[1],
            self.tint[2] * h[2],
            self.tint[3] * h[3],
        ]
    }

    pub fn draw(&self, batch: &mut SpriteBatch) {
        batch.push_sprite(
            &self.texture,
            SpriteDraw::new(&self.mesh, self.draw_range(), self.transform.matrix())
                .with_color(self.color())
                .with_uv_offset(self.tex_offset.as_array()),
        );
    }
}

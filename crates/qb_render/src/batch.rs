//! Per-frame CPU sprite batch.
//!
//! Demos push mesh slices with a model matrix; the batch bakes them into world
//! space vertices and a single index list, then the renderer streams both into
//! GPU buffers. Consecutive pushes with the same material collapse into one
//! draw call.

use std::ops::Range;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::mesh::QuadMesh;
use crate::vertex::SpriteVertex;

/// What a draw call binds: a pipeline plus its texture set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Material {
    Sprite(Arc<str>),
    Lines(Arc<str>),
    Anaglyph { left: Arc<str>, right: Arc<str> },
}

/// A contiguous run of indices that share the same material.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub material: Material,
    pub index_start: u32,
    pub index_count: u32,
}

pub struct SpriteDraw<'a> {
    pub mesh: &'a QuadMesh,
    pub range: Range<u32>,
    pub model: Mat4,
    pub color: [f32; 4],
    pub uv_offset: [f32; 2],
}

impl<'a> SpriteDraw<'a> {
    pub fn new(mesh: &'a QuadMesh, range: Range<u32>, model: Mat4) -> Self {
        Self {
            mesh,
            range,
            model,
            color: [1.0; 4],
            uv_offset: [0.0; 2],
        }
    }

    pub fn whole(mesh: &'a QuadMesh, model: Mat4) -> Self {
        Self::new(mesh, mesh.full_range(), model)
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_uv_offset(mut self, uv_offset: [f32; 2]) -> Self {
        self.uv_offset = uv_offset;
        self
    }
}

#[derive(Default)]
pub struct SpriteBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
    pub anaglyph_formula: u32,
    quad_count: usize,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
        self.quad_count = 0;
    }

    pub fn quad_count(&self) -> usize {
        self.quad_count
    }

    pub fn push_sprite(&mut self, texture: &Arc<str>, draw: SpriteDraw<'_>) {
        self.push(Material::Sprite(texture.clone()), draw);
    }

    pub fn push_lines(&mut self, texture: &Arc<str>, draw: SpriteDraw<'_>) {
        self.push(Material::Lines(texture.clone()), draw);
    }

    pub fn push_anaglyph(&mut self, left: &Arc<str>, right: &Arc<str>, draw: SpriteDraw<'_>) {
        self.push(
            Material::Anaglyph {
                left: left.clone(),
                right: right.clone(),
            },
            draw,
        );
    }

    /// Bake the index slice `draw.range` of `draw.mesh`. Only the vertices
    /// that slice references are copied.
    pub fn push(&mut self, material: Material, draw: SpriteDraw<'_>) {
        let start = draw.range.start as usize;
        let end = (draw.range.end as usize).min(draw.mesh.indices.len());
        if start >= end {
            return;
        }
        let slice = &draw.mesh.indices[start..end];
        let (Some(&lo), Some(&hi)) = (slice.iter().min(), slice.iter().max()) else {
            return;
        };
        let Some(source) = draw.mesh.vertices.get(lo as usize..=hi as usize) else {
            log::warn!("Mesh slice references missing vertices {lo}..={hi}, skipping");
            return;
        };

        let base = self.vertices.len() as u32;
        self.vertices.extend(source.iter().map(|v| {
            let world = draw.model.transform_point3(Vec3::new(v.position.x, v.position.y, 0.0));
            SpriteVertex {
                position: [world.x, world.y],
                tex_coords: v.uv.to_array(),
                color: draw.color,
                uv_offset: draw.uv_offset,
            }
        }));

        let index_start = self.indices.len() as u32;
        self.indices.extend(slice.iter().map(|&i| base + (i - lo)));
        if !matches!(material, Material::Lines(_)) {
            self.quad_count += slice.len() / 6;
        }
        push_draw_call(&mut self.draw_calls, material, index_start, slice.len() as u32);
    }
}

/// Append a draw call, merging with the previous one when the material matches
/// and indices are contiguous. Objects are emitted in painter's order, so runs
/// of tiles sharing one tileset collapse into a single `draw_indexed`.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    material: Material,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if last.material == material && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        material,
        index_start,
        index_count,
    });
}

/// Number of bind group switches a render pass over `draw_calls` performs.
pub fn count_texture_binds(draw_calls: &[DrawCall]) -> usize {
    let mut binds = 0usize;
    let mut current: Option<&Material> = None;
    for draw in draw_calls {
        if current != Some(&draw.material) {
            current = Some(&draw.material);
            binds += 1;
        }
    }
    binds
}

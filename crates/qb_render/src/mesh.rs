//! CPU-side quad geometry shared between objects.
//!
//! A mesh is built once per asset and handed out as `Arc<QuadMesh>`; every
//! frame the sprite batch transforms the slice it needs by the object's model
//! matrix. Texture coordinates follow the loaded-texture convention: `(0, 0)`
//! is the bottom-left of the image.

use std::ops::Range;

use glam::Vec2;

pub const INDICES_PER_QUAD: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Vec2,
    pub uv: Vec2,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl QuadMesh {
    /// Quad spanning `-half..half`, sampling `tex_origin..tex_origin + tex_size`.
    pub fn centered(half: Vec2, tex_origin: Vec2, tex_size: Vec2) -> Self {
        Self::strip(1, half, tex_origin, tex_size)
    }

    /// The `[-1, 1]` square over the whole texture.
    pub fn unit() -> Self {
        Self::centered(Vec2::ONE, Vec2::ZERO, Vec2::ONE)
    }

    /// Quad with its lower-left corner on the origin, spanning `size`.
    pub fn anchored(size: Vec2, tex_origin: Vec2, tex_size: Vec2) -> Self {
        let mut mesh = Self::default();
        mesh.push_quad(Vec2::ZERO, size, tex_origin, tex_size);
        mesh
    }

    /// `count` centered quads over consecutive horizontal slices of
    /// `tex_origin..tex_origin + tex_size`. Quad `i` is animation frame `i`.
    pub fn strip(count: usize, half: Vec2, tex_origin: Vec2, tex_size: Vec2) -> Self {
        let slice = Vec2::new(tex_size.x / count.max(1) as f32, tex_size.y);
        let mut mesh = Self {
            vertices: Vec::with_capacity(4 * count),
            indices: Vec::with_capacity(6 * count),
        };
        for i in 0..count {
            let origin = tex_origin + Vec2::new(slice.x * i as f32, 0.0);
            mesh.push_quad(-half, half, origin, slice);
        }
        mesh
    }

    /// Diamond outline of a tile top with surface height `h`, for line drawing.
    pub fn outline_diamond(h: f32) -> Self {
        let corners = [
            Vec2::new(0.0, 0.5 * h),
            Vec2::new(0.5, 0.0),
            Vec2::new(1.0, 0.5 * h),
            Vec2::new(0.5, h),
        ];
        let vertices = corners
            .iter()
            .map(|&position| MeshVertex {
                position,
                uv: Vec2::new(position.x, position.y / h.max(f32::EPSILON)),
            })
            .collect();
        Self {
            vertices,
            indices: vec![0, 1, 1, 2, 2, 3, 3, 0],
        }
    }

    fn push_quad(&mut self, min: Vec2, max: Vec2, tex_origin: Vec2, tex_size: Vec2) {
        let base = self.vertices.len() as u32;
        let tex_max = tex_origin + tex_size;
        self.vertices.extend_from_slice(&[
            MeshVertex {
                position: Vec2::new(min.x, min.y),
                uv: Vec2::new(tex_origin.x, tex_origin.y),
            },
            MeshVertex {
                position: Vec2::new(min.x, max.y),
                uv: Vec2::new(tex_origin.x, tex_max.y),
            },
            MeshVertex {
                position: Vec2::new(max.x, min.y),
                uv: Vec2::new(tex_max.x, tex_origin.y),
            },
            MeshVertex {
                position: Vec2::new(max.x, max.y),
                uv: Vec2::new(tex_max.x, tex_max.y),
            },
        ]);
        self.indices
            .extend([0, 1, 2, 2, 1, 3].iter().map(|i| base + i));
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / INDICES_PER_QUAD as usize
    }

    /// Index range of quad `frame`. Out-of-range frames clamp to the last quad.
    pub fn frame_range(&self, frame: usize) -> Range<u32> {
        let last = self.quad_count().saturating_sub(1);
        let start = frame.min(last) as u32 * INDICES_PER_QUAD;
        start..(start + INDICES_PER_QUAD).min(self.indices.len() as u32)
    }

    pub fn full_range(&self) -> Range<u32> {
        0..self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchored_quad_uses_shared_corner_indices() {
        let mesh = QuadMesh::anchored(Vec2::ONE, Vec2::new(0.1, 0.2), Vec2::new(0.5, 0.25));
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(mesh.vertices[0].position, Vec2::ZERO);
        assert_eq!(mesh.vertices[3].position, Vec2::ONE);
        assert_eq!(mesh.vertices[3].uv, Vec2::new(0.6, 0.45));
    }

    #[test]
    fn strip_slices_texture_horizontally() {
        let mesh = QuadMesh::strip(5, Vec2::new(0.5, 1.0), Vec2::ZERO, Vec2::new(1.0, 1.0));
        assert_eq!(mesh.quad_count(), 5);
        assert_eq!(mesh.vertices.len(), 20);
        // Frame 2 starts at u = 0.4 and ends at u = 0.6.
        let f2 = &mesh.vertices[8..12];
        assert!((f2[0].uv.x - 0.4).abs() < 1e-6);
        assert!((f2[3].uv.x - 0.6).abs() < 1e-6);
        assert_eq!(f2[0].position, Vec2::new(-0.5, -1.0));
        assert_eq!(&mesh.indices[12..18], &[8, 9, 10, 10, 9, 11]);
    }

    #[test]
    fn frame_range_selects_six_indices_per_frame() {
        let mesh = QuadMesh::strip(8, Vec2::ONE, Vec2::ZERO, Vec2::ONE);
        assert_eq!(mesh.frame_range(0), 0..6);
        assert_eq!(mesh.frame_range(3), 18..24);
        assert_eq!(mesh.frame_range(99), 42..48);
        assert_eq!(mesh.full_range(), 0..48);
    }

    #[test]
    fn unit_quad_spans_clip_space() {
        let mesh = QuadMesh::unit();
        assert_eq!(mesh.vertices[0].position, Vec2::new(-1.0, -1.0));
        assert_eq!(mesh.vertices[3].position, Vec2::new(1.0, 1.0));
        assert_eq!(mesh.vertices[3].uv, Vec2::ONE);
    }

    #[test]
    fn diamond_outline_is_closed_line_list() {
        let mesh = QuadMesh::outline_diamond(26.0 / 58.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 8);
        assert_eq!(mesh.indices[0], 0);
        assert_eq!(mesh.indices[7], 0);
        assert_eq!(mesh.vertices[3].position, Vec2::new(0.5, 26.0 / 58.0));
    }
}

use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic camera over a world-space canvas centered on `position`.
///
/// `half_extent` is the half size of the visible canvas at zoom 1; `zoom`
/// scales it, so larger values show more of the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub half_extent: Vec2,
}

impl Camera2D {
    /// Shows normalized device coordinates as-is.
    pub fn ndc() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            half_extent: Vec2::ONE,
        }
    }

    /// A canvas `canvas_width` units wide with height following `aspect`,
    /// both scaled by `zoom`.
    pub fn ortho_canvas(canvas_width: f32, aspect: f32, zoom: f32) -> Self {
        let height = canvas_width / aspect.max(f32::EPSILON);
        Self {
            position: Vec2::ZERO,
            zoom,
            half_extent: Vec2::new(canvas_width, height) * 0.5,
        }
    }

    pub fn visible_half_extent(&self) -> Vec2 {
        self.half_extent * self.zoom
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.visible_half_extent();
        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y - half.y,
            self.position.y + half.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }

    /// Cursor in window pixels (origin top-left) to world coordinates.
    pub fn screen_to_world(&self, cursor: (f64, f64), window: (u32, u32)) -> Vec2 {
        let w = window.0.max(1) as f32;
        let h = window.1.max(1) as f32;
        let normal = Vec2::new(cursor.0 as f32 / w, 1.0 - cursor.1 as f32 / h);
        self.position + (normal * 2.0 - Vec2::ONE) * self.visible_half_extent()
    }
}

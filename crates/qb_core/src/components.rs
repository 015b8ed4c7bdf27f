//! Per-object components shared by every demo.

use glam::{Mat4, Quat, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub scale: Vec2,
    /// Radians, counter-clockwise around +Z.
    pub rotation: f32,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// `translate * rotate * scale`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.extend(1.0),
            Quat::from_rotation_z(self.rotation),
            self.position.extend(0.0),
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Motion {
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

impl Motion {
    /// Explicit Euler: velocity first, then position with the new velocity.
    pub fn integrate(&mut self, transform: &mut Transform, dt: f32) {
        self.velocity += self.acceleration * dt;
        transform.position += self.velocity * dt;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    /// Magnitude of the downward acceleration.
    pub acceleration: f32,
}

impl Gravity {
    pub fn apply(&self, motion: &mut Motion) {
        motion.acceleration.y = -self.acceleration;
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self { acceleration: 10.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub active: bool,
    pub tint: f32,
}

impl Highlight {
    /// Color multiplier to draw with this frame.
    pub fn color(&self) -> [f32; 4] {
        if self.active {
            [self.tint, self.tint, self.tint, 1.0]
        } else {
            [1.0; 4]
        }
    }
}

impl Default for Highlight {
    fn default() -> Self {
        Self {
            active: false,
            tint: 0.65,
        }
    }
}

/// Scrolls a texture across its quad at a constant UV rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureSlide {
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureOffset {
    pub uv: Vec2,
}

impl TextureSlide {
    /// Advances `offset` and keeps it in `[0, 1)` so long runs keep precision.
    pub fn advance(&self, offset: &mut TextureOffset, dt: f32) {
        let uv = offset.uv + self.velocity * dt;
        offset.uv = Vec2::new(wrap_unit(uv.x), wrap_unit(uv.y));
    }
}

/// `v` mod 1 in `[0, 1)`. `rem_euclid` rounds tiny negatives up to exactly 1.
fn wrap_unit(v: f32) -> f32 {
    let wrapped = v.rem_euclid(1.0);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

impl TextureOffset {
    pub fn as_array(&self) -> [f32; 2] {
        self.uv.to_array()
    }
}

use glam::Vec2;
use qb_core::{Gravity, Motion, Transform};

use crate::collision::{Aabb, PlatformSet};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerInput {
    pub move_x: f32,
    pub jump_pressed: bool,
}

/// Tuning in normalized device units per second.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub max_speed: f32,
    pub accel_ground: f32,
    pub accel_air: f32,
    pub friction_ground: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_speed: f32,
    /// Horizontal extent the player's center may reach.
    pub world_half_width: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_speed: 0.9,
            accel_ground: 6.0,
            accel_air: 3.5,
            friction_ground: 8.0,
            gravity: 6.0,
            max_fall_speed: 3.0,
            jump_speed: 2.6,
            world_half_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CharacterController {
    pub transform: Transform,
    pub motion: Motion,
    pub gravity: Gravity,
    pub half: Vec2,
    pub grounded: bool,
    pub config: ControllerConfig,
}

impl CharacterController {
    pub fn new(position: Vec2, half: Vec2) -> Self {
        let config = ControllerConfig::default();
        Self {
            transform: Transform::at(position),
            motion: Motion::default(),
            gravity: Gravity {
                acceleration: config.gravity,
            },
            half,
            grounded: false,
            config,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.transform.position, self.half)
    }

    pub fn step(&mut self, input: ControllerInput, dt: f32, platforms: &PlatformSet) {
        // Horizontal control: accelerate toward intent, friction when grounded and idle.
        let accel = if self.grounded {
            self.config.accel_ground
        } else {
            self.config.accel_air
        };
        let vx = self.motion.velocity.x;
        self.motion.velocity.x = if input.move_x != 0.0 {
            move_towards(vx, input.move_x.clamp(-1.0, 1.0) * self.config.max_speed, accel * dt)
        } else if self.grounded {
            move_towards(vx, 0.0, self.config.friction_ground * dt)
        } else {
            vx
        };

        // Jump is edge-triggered and only legal from grounded state.
        if input.jump_pressed && self.grounded {
            self.motion.velocity.y = self.config.jump_speed;
            self.grounded = false;
        }

        let prev = self.aabb();
        self.gravity.apply(&mut self.motion);
        self.motion.integrate(&mut self.transform, dt);
        self.motion.velocity.y = self.motion.velocity.y.max(-self.config.max_fall_speed);

        let landing = platforms.resolve_landing(prev, self.aabb());
        self.transform.position = landing.aabb.center;
        if landing.landed {
            self.motion.velocity.y = 0.0;
        }
        self.grounded = landing.landed;

        let limit = (self.config.world_half_width - self.half.x).max(0.0);
        if self.transform.position.x.abs() > limit {
            self.transform.position.x = self.transform.position.x.clamp(-limit, limit);
            self.motion.velocity.x = 0.0;
        }
    }

    /// Put the player back at `position` at rest.
    pub fn respawn(&mut self, position: Vec2) {
        self.transform.position = position;
        self.motion = Motion::default();
        self.grounded = false;
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else if target > current {
        current + max_delta
    } else {
        current - max_delta
    }
}

//! Entity-vs-platform collision for the platformer.
//!
//! Boxes are never rotated, so the broad and narrow phase are the same
//! overlap test. Platforms are one-way: an entity falling onto a platform top
//! is pushed back up and lands; nothing blocks sideways or upward motion.
//! Platforms are kept in a plain list and scanned linearly.

use glam::Vec2;

/// Small slack so an entity resting exactly on a top keeps landing on it.
const LANDING_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Strict overlap; touching edges do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }

    fn overlaps_x(&self, other: &Aabb) -> bool {
        self.min().x < other.max().x && self.max().x > other.min().x
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub aabb: Aabb,
    pub landed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlatformSet {
    boxes: Vec<Aabb>,
}

impl PlatformSet {
    pub fn new(boxes: Vec<Aabb>) -> Self {
        Self { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Any platform overlapping `aabb`.
    pub fn any_overlap(&self, aabb: &Aabb) -> bool {
        self.boxes.iter().any(|p| p.overlaps(aabb))
    }

    /// Resolve a move from `prev` to `moved`. When the bottom edge crossed a
    /// platform top this step (with horizontal overlap), the box is placed on
    /// the highest such top.
    pub fn resolve_landing(&self, prev: Aabb, moved: Aabb) -> Landing {
        let falling = moved.center.y <= prev.center.y;
        if !falling {
            return Landing {
                aabb: moved,
                landed: false,
            };
        }

        let prev_bottom = prev.min().y;
        let moved_bottom = moved.min().y;
        let top = self
            .boxes
            .iter()
            .filter(|p| p.overlaps_x(&moved))
            .map(|p| p.max().y)
            .filter(|&top| prev_bottom >= top - LANDING_EPSILON && moved_bottom <= top)
            .fold(None, |best: Option<f32>, top| {
                Some(best.map_or(top, |b| b.max(top)))
            });

        match top {
            Some(top) => {
                let mut aabb = moved;
                aabb.center.y = top + moved.half.y;
                Landing { aabb, landed: true }
            }
            None => Landing {
                aabb: moved,
                landed: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> PlatformSet {
        PlatformSet::new(vec![
            Aabb::new(Vec2::new(0.0, -0.9), Vec2::new(1.0, 0.1)),
            Aabb::new(Vec2::new(0.5, -0.3), Vec2::new(0.2, 0.05)),
        ])
    }

    fn body(x: f32, y: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(0.05, 0.1))
    }

    #[test]
    fn overlap_is_strict() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let touching = Aabb::new(Vec2::new(2.0, 0.0), Vec2::ONE);
        let inside = Aabb::new(Vec2::new(1.5, 0.5), Vec2::ONE);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
    }

    #[test]
    fn falling_through_top_lands_on_it() {
        let platforms = floor();
        let prev = body(0.0, -0.69);
        let moved = body(0.0, -0.75);
        let result = platforms.resolve_landing(prev, moved);
        assert!(result.landed);
        assert!((result.aabb.min().y + 0.8).abs() < 1e-6);
    }

    #[test]
    fn resting_on_top_keeps_landing() {
        let platforms = floor();
        let resting = body(0.0, -0.7);
        let nudged = body(0.0, -0.7001);
        let result = platforms.resolve_landing(resting, nudged);
        assert!(result.landed);
        assert!((result.aabb.center.y + 0.7).abs() < 1e-5);
    }

    #[test]
    fn rising_passes_through_from_below() {
        let platforms = floor();
        let prev = body(0.5, -0.45);
        let moved = body(0.5, -0.35);
        let result = platforms.resolve_landing(prev, moved);
        assert!(!result.landed);
        assert_eq!(result.aabb, moved);
    }

    #[test]
    fn no_horizontal_overlap_means_no_landing() {
        let platforms = floor();
        let prev = body(1.5, -0.69);
        let moved = body(1.5, -0.75);
        assert!(!platforms.resolve_landing(prev, moved).landed);
    }

    #[test]
    fn fast_fall_picks_highest_crossed_top() {
        let platforms = floor();
        // Crosses both the ledge top (-0.25) and the floor top (-0.8) in one step.
        let prev = body(0.5, -0.1);
        let moved = body(0.5, -0.85);
        let result = platforms.resolve_landing(prev, moved);
        assert!(result.landed);
        assert!((result.aabb.min().y + 0.25).abs() < 1e-6);
    }

    #[test]
    fn any_overlap_scans_every_platform() {
        let platforms = floor();
        assert_eq!(platforms.len(), 2);
        assert!(platforms.any_overlap(&body(0.5, -0.3)));
        assert!(!platforms.any_overlap(&body(0.0, 0.5)));
    }
}

//! Isometric projection of map cells onto the 2D canvas, and the inverse
//! used for cursor picking.
//!
//! A block quad is one canvas unit square, anchored at its lower-left corner.
//! Stepping `i` moves half a unit right and a quarter up, stepping `j` half
//! right and a quarter down, stepping `k` half up.

use glam::Vec2;

use crate::block_map::{BlockMap, Cell, ObjectType};

/// Block tile height in the tileset, pixels.
pub const TILE_HEIGHT_PX: f32 = 58.0;
/// Height of the walkable top face inside a tile, pixels.
pub const SURFACE_HEIGHT_PX: f32 = 26.0;

/// Top-face height as a fraction of the tile.
pub fn surface_height() -> f32 {
    SURFACE_HEIGHT_PX / TILE_HEIGHT_PX
}

/// Lower-left corner of the block quad at `cell` on a map `size_x` wide.
pub fn block_position((i, j, k): Cell, size_x: usize) -> Vec2 {
    let (i, j, k) = (i as f32, j as f32, k as f32);
    Vec2::new(
        i * 0.5 + j * 0.5 - size_x as f32 / 2.0,
        i * 0.25 - j * 0.25 + k * 0.5 - 0.5,
    )
}

/// Center of a sprite (player, book) standing in `cell`.
pub fn sprite_position((i, j, k): Cell, size_x: usize) -> Vec2 {
    let (fi, fj, fk) = (i as f32, j as f32, k as f32);
    Vec2::new(
        fi * 0.5 + fj * 0.5 - size_x as f32 / 2.0 + 0.5,
        fi * 0.25 - fj * 0.25 + fk * 0.5 + 0.3,
    )
}

/// Ground column `(i, j)` under a canvas point, `None` off the map.
pub fn canvas_to_column(canvas: Vec2, map_size: [usize; 3]) -> Option<(usize, usize)> {
    let p = Vec2::new(canvas.x, canvas.y - (1.25 - surface_height()));
    let i = p.x + 2.0 * p.y + map_size[0] as f32 / 2.0 + 1.0;
    let j = i - 4.0 * p.y - 2.0;
    let in_range = |v: f32, len: usize| v >= 0.0 && v < len as f32;
    (in_range(i, map_size[0]) && in_range(j, map_size[1])).then(|| (i as usize, j as usize))
}

/// Block under a canvas point. Walks up the diagonal `(i - n, j + n, n)`
/// from the ground column and returns the highest non-air block on it,
/// or the ground cell when nothing stands there.
pub fn pick_cell(canvas: Vec2, map: &BlockMap) -> Option<Cell> {
    let size = map.size();
    let (i, j) = canvas_to_column(canvas, size)?;
    let hit = (1..size[2]).rev().find_map(|n| {
        let cell = (i.checked_sub(n)?, j + n, n);
        map.get(cell)
            .filter(|block| **block != ObjectType::Air)
            .map(|_| cell)
    });
    Some(hit.unwrap_or((i, j, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: [usize; 3] = [20, 20, 10];

    /// Canvas point in the middle of the top face of the ground block at
    /// `(i, j, 0)`.
    fn ground_face_center(i: usize, j: usize) -> Vec2 {
        let corner = block_position((i, j, 0), SIZE[0]);
        corner + Vec2::new(0.5, 1.0 - surface_height() / 2.0)
    }

    #[test]
    fn block_and_sprite_positions() {
        assert_eq!(block_position((0, 0, 0), 20), Vec2::new(-10.0, -0.5));
        assert_eq!(block_position((2, 4, 1), 20), Vec2::new(-7.0, -0.5));
        assert_eq!(sprite_position((0, 0, 1), 20), Vec2::new(-9.5, 0.8));
    }

    #[test]
    fn face_center_picks_its_column() {
        for &(i, j) in &[(0, 0), (5, 8), (19, 19), (10, 3)] {
            assert_eq!(
                canvas_to_column(ground_face_center(i, j), SIZE),
                Some((i, j)),
                "column ({i}, {j})"
            );
        }
    }

    #[test]
    fn far_off_canvas_is_none() {
        assert_eq!(canvas_to_column(Vec2::new(-50.0, 0.0), SIZE), None);
        assert_eq!(canvas_to_column(Vec2::new(0.0, 50.0), SIZE), None);
    }

    #[test]
    fn empty_column_picks_ground() {
        let map = BlockMap::new(SIZE);
        assert_eq!(pick_cell(ground_face_center(6, 6), &map), Some((6, 6, 0)));
    }

    #[test]
    fn topmost_block_on_the_diagonal_wins() {
        let mut map = BlockMap::new(SIZE);
        map.set((5, 7, 1), ObjectType::Stone);
        map.set((3, 9, 3), ObjectType::Wood);
        assert_eq!(pick_cell(ground_face_center(6, 6), &map), Some((3, 9, 3)));

        map.set((3, 9, 3), ObjectType::Air);
        assert_eq!(pick_cell(ground_face_center(6, 6), &map), Some((5, 7, 1)));
    }

    #[test]
    fn diagonal_stops_at_map_edge() {
        let mut map = BlockMap::new(SIZE);
        map.set((0, 19, 1), ObjectType::Stone);
        assert_eq!(pick_cell(ground_face_center(1, 18), &map), Some((0, 19, 1)));
        assert_eq!(pick_cell(ground_face_center(0, 19), &map), Some((0, 19, 0)));
    }
}

//! The voxel map behind mineiso: a dense `x * y * z` grid of block types.
//!
//! Cells are addressed `(i, j, k)` with `k` the height. There is no spatial
//! index; everything walks the grid directly.

use rand::rngs::StdRng;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectType {
    #[default]
    Air,
    Grass,
    Stone,
    Wood,
    WoodPlank,
    Book,
}

impl ObjectType {
    pub const PLACEABLE: [ObjectType; 5] = [
        ObjectType::Grass,
        ObjectType::Stone,
        ObjectType::Wood,
        ObjectType::WoodPlank,
        ObjectType::Book,
    ];

    /// Next placeable type, wrapping from Book back to Grass.
    pub fn next_placeable(self) -> Self {
        let pos = Self::PLACEABLE.iter().position(|&t| t == self);
        match pos {
            Some(i) => Self::PLACEABLE[(i + 1) % Self::PLACEABLE.len()],
            None => Self::PLACEABLE[0],
        }
    }

    /// Frame name in the block sheet. Books are a sprite, not a block.
    pub fn sheet_frame(self) -> Option<&'static str> {
        match self {
            Self::Grass => Some("grass"),
            Self::Stone => Some("stone"),
            Self::Wood => Some("wood"),
            Self::WoodPlank => Some("wood_plank"),
            Self::Air | Self::Book => None,
        }
    }

    pub fn is_air(self) -> bool {
        self == Self::Air
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    CollectBooks,
    Creative,
}

impl GameMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::CollectBooks => "COLLECT_BOOKS",
            Self::Creative => "CREATIVE",
        }
    }
}

pub type Cell = (usize, usize, usize);

/// Dense 3D array stored flat, `k` fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3<T> {
    size: [usize; 3],
    cells: Vec<T>,
}

impl<T: Clone + Default> Grid3<T> {
    pub fn new(size: [usize; 3]) -> Self {
        Self {
            size,
            cells: vec![T::default(); size[0] * size[1] * size[2]],
        }
    }
}

impl<T> Grid3<T> {
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    pub fn contains(&self, (i, j, k): Cell) -> bool {
        i < self.size[0] && j < self.size[1] && k < self.size[2]
    }

    fn offset(&self, cell: Cell) -> Option<usize> {
        let (i, j, k) = cell;
        self.contains(cell)
            .then(|| (i * self.size[1] + j) * self.size[2] + k)
    }

    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.offset(cell).map(|o| &self.cells[o])
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        self.offset(cell).map(|o| &mut self.cells[o])
    }

    /// Stores `value` if `cell` is in bounds; out-of-bounds writes are dropped.
    pub fn set(&mut self, cell: Cell, value: T) {
        if let Some(slot) = self.get_mut(cell) {
            *slot = value;
        }
    }

    /// Every cell in render order: `i` descending, `j` ascending, `k`
    /// ascending. Far cells come first so nearer ones paint over them.
    pub fn painter_order(&self) -> impl Iterator<Item = Cell> {
        let [x, y, z] = self.size;
        (0..x)
            .rev()
            .flat_map(move |i| (0..y).flat_map(move |j| (0..z).map(move |k| (i, j, k))))
    }
}

pub type BlockMap = Grid3<ObjectType>;

/// CollectBooks ground mixes grass, stone and planks in these proportions.
const GROUND_MIX: [ObjectType; 7] = [
    ObjectType::Grass,
    ObjectType::Grass,
    ObjectType::Grass,
    ObjectType::Stone,
    ObjectType::Stone,
    ObjectType::Stone,
    ObjectType::WoodPlank,
];

/// Fill layer 0 with ground and, in CollectBooks, scatter `books` on layer 1
/// at distinct columns. `books` must be smaller than the column count.
pub fn generate_map(size: [usize; 3], mode: GameMode, books: usize, rng: &mut StdRng) -> BlockMap {
    let mut map = BlockMap::new(size);
    let [x, y, _] = size;
    for i in 0..x {
        for j in 0..y {
            let ground = match mode {
                GameMode::CollectBooks => GROUND_MIX[rng.gen_range(0..GROUND_MIX.len())],
                GameMode::Creative => ObjectType::Grass,
            };
            map.set((i, j, 0), ground);
        }
    }

    if mode == GameMode::CollectBooks {
        let mut placed = 0;
        while placed < books.min(x * y) {
            let cell = (rng.gen_range(0..x), rng.gen_range(0..y), 1);
            if map.get(cell) == Some(&ObjectType::Book) {
                continue;
            }
            map.set(cell, ObjectType::Book);
            placed += 1;
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_rng;

    #[test]
    fn placeable_cycle_skips_air() {
        let mut t = ObjectType::Stone;
        let mut seen = Vec::new();
        for _ in 0..5 {
            t = t.next_placeable();
            seen.push(t);
        }
        assert_eq!(
            seen,
            vec![
                ObjectType::Wood,
                ObjectType::WoodPlank,
                ObjectType::Book,
                ObjectType::Grass,
                ObjectType::Stone
            ]
        );
        assert_eq!(ObjectType::Air.next_placeable(), ObjectType::Grass);
    }

    #[test]
    fn grid_bounds_are_checked() {
        let mut grid: Grid3<u8> = Grid3::new([2, 3, 4]);
        grid.set((1, 2, 3), 9);
        assert_eq!(grid.get((1, 2, 3)), Some(&9));
        assert_eq!(grid.get((2, 0, 0)), None);
        grid.set((0, 3, 0), 5);
        assert!(grid.cells.iter().filter(|&&v| v == 5).count() == 0);
    }

    #[test]
    fn painter_order_runs_far_to_near() {
        let grid: Grid3<u8> = Grid3::new([2, 2, 2]);
        let order: Vec<Cell> = grid.painter_order().collect();
        assert_eq!(order.len(), 8);
        assert_eq!(order[0], (1, 0, 0));
        assert_eq!(order[1], (1, 0, 1));
        assert_eq!(order[2], (1, 1, 0));
        assert_eq!(order[7], (0, 1, 1));
    }

    #[test]
    fn collect_books_places_distinct_books_on_layer_one() {
        let mut rng = demo_rng(Some(3));
        let map = generate_map([20, 20, 10], GameMode::CollectBooks, 10, &mut rng);
        let books = map
            .painter_order()
            .filter(|&c| map.get(c) == Some(&ObjectType::Book))
            .collect::<Vec<_>>();
        assert_eq!(books.len(), 10);
        assert!(books.iter().all(|&(_, _, k)| k == 1));
        for i in 0..20 {
            for j in 0..20 {
                let ground = map.get((i, j, 0)).copied();
                assert!(matches!(
                    ground,
                    Some(ObjectType::Grass | ObjectType::Stone | ObjectType::WoodPlank)
                ));
            }
        }
    }

    #[test]
    fn creative_ground_is_all_grass_without_books() {
        let mut rng = demo_rng(Some(3));
        let map = generate_map([5, 5, 4], GameMode::Creative, 10, &mut rng);
        assert!(map
            .painter_order()
            .all(|c| map.get(c) == Some(if c.2 == 0 { &ObjectType::Grass } else { &ObjectType::Air })));
    }
}

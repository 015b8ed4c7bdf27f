//! Isometric voxel sandbox. In CollectBooks the ground crumbles column by
//! column while the player gathers books; Creative lets the player build.
//!
//! The block map says what each cell holds; a parallel grid holds the live
//! objects drawn and moved there. The player lives only in the object grid.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use qb_core::{Gravity, Key, MouseBtn, RepeatingTimer, SpriteAnimation, Transform};
use qb_platform::PlatformConfig;
use qb_render::{Camera2D, QuadMesh, SpriteBatch, SpriteDraw, TextureOptions};
use rand::rngs::StdRng;
use rand::Rng;

use crate::block_map::{generate_map, BlockMap, Cell, GameMode, Grid3, ObjectType};
use crate::config::MineisoConfig;
use crate::demo::{demo_rng, hex_color, Demo, StepContext, TextureRequest};
use crate::iso::{block_position, pick_cell, sprite_position, surface_height};
use crate::object::GameObject;
use crate::sheet::{load_sheet_from_path, SheetFile};

pub const BLOCKS_SHEET: &str = "assets/sheets/mine_blocks.json";
pub const BOOK_SHEET: &str = "assets/sheets/mine_book.json";
pub const PLAYER_SHEET: &str = "assets/sheets/mine_steve.json";

const CANVAS_WIDTH: f32 = 20.0;
const BOOK_SCALE: f32 = 0.4;
const PLAYER_SCALE: f32 = 0.7;
const PLAYER_FRAMES: usize = 8;
const BOOK_FRAMES: usize = 5;
const MIN_ZOOM: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Player sprite frame facing this way.
    fn facing_frame(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Up => 3,
        }
    }

    fn step(self, (i, j, k): Cell) -> Option<Cell> {
        match self {
            Self::Up => Some((i + 1, j, k)),
            Self::Down => Some((i.checked_sub(1)?, j, k)),
            Self::Right => Some((i, j + 1, k)),
            Self::Left => Some((i, j.checked_sub(1)?, k)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

/// Meshes and texture keys built from the three sprite sheets.
pub struct MineAssets {
    blocks_texture: Arc<str>,
    book_texture: Arc<str>,
    player_texture: Arc<str>,
    lines_texture: Arc<str>,
    block_meshes: HashMap<ObjectType, Arc<QuadMesh>>,
    book_mesh: Arc<QuadMesh>,
    player_mesh: Arc<QuadMesh>,
    diamond: QuadMesh,
}

impl MineAssets {
    pub fn load() -> Result<Self, String> {
        let blocks = load_sheet_from_path(Path::new(BLOCKS_SHEET))?;
        let book = load_sheet_from_path(Path::new(BOOK_SHEET))?;
        let player = load_sheet_from_path(Path::new(PLAYER_SHEET))?;
        Self::from_sheets(&blocks, &book, &player)
    }

    pub fn from_sheets(
        blocks: &SheetFile,
        book: &SheetFile,
        player: &SheetFile,
    ) -> Result<Self, String> {
        let mut block_meshes = HashMap::new();
        for block in ObjectType::PLACEABLE {
            if let Some(frame) = block.sheet_frame() {
                let uv = blocks.require_uv(frame)?;
                block_meshes.insert(
                    block,
                    Arc::new(QuadMesh::anchored(Vec2::ONE, uv.origin, uv.size)),
                );
            }
        }

        let strip = |sheet: &SheetFile, frames: usize| -> Result<QuadMesh, String> {
            if sheet.frames.len() != frames {
                return Err(format!(
                    "Sheet '{}' has {} frames, expected {}",
                    sheet.sheet_id,
                    sheet.frames.len(),
                    frames
                ));
            }
            let uv = sheet.strip_uv();
            let half = Vec2::new(sheet.frame_aspect(), 1.0);
            Ok(QuadMesh::strip(frames, half, uv.origin, uv.size))
        };

        Ok(Self {
            blocks_texture: Arc::from(blocks.texture.path.as_str()),
            book_texture: Arc::from(book.texture.path.as_str()),
            player_texture: Arc::from(player.texture.path.as_str()),
            lines_texture: Arc::from("mineiso/lines"),
            block_meshes,
            book_mesh: Arc::new(strip(book, BOOK_FRAMES)?),
            player_mesh: Arc::new(strip(player, PLAYER_FRAMES)?),
            diamond: QuadMesh::outline_diamond(surface_height()),
        })
    }
}

pub struct MineisoDemo {
    config: MineisoConfig,
    rng: StdRng,
    assets: MineAssets,
    mode: GameMode,
    outcome: Option<Outcome>,
    map: BlockMap,
    objects: Grid3<Option<GameObject>>,
    player: Cell,
    highlight: Option<Cell>,
    books_collected: usize,
    drop_timer: RepeatingTimer,
    check_timer: RepeatingTimer,
    target_type: ObjectType,
    preview: GameObject,
    show_surface: bool,
    zoom: f32,
    aspect: f32,
}

impl MineisoDemo {
    pub fn new(config: MineisoConfig, seed: Option<u64>) -> Result<Self, String> {
        Ok(Self::with_assets(config, seed, MineAssets::load()?))
    }

    pub fn with_assets(config: MineisoConfig, seed: Option<u64>, assets: MineAssets) -> Self {
        let rng = demo_rng(seed);
        let drop_timer = RepeatingTimer::new(config.drop_interval_ms as f32 / 1000.0);
        let check_timer = RepeatingTimer::new(config.check_interval_ms as f32 / 1000.0);
        let preview = GameObject::new(
            assets.book_mesh.clone(),
            assets.book_texture.clone(),
            Transform::default(),
        );
        let mut demo = Self {
            map: BlockMap::new(config.map_size),
            objects: Grid3::new(config.map_size),
            config,
            rng,
            assets,
            mode: GameMode::CollectBooks,
            outcome: None,
            player: (0, 0, 1),
            highlight: None,
            books_collected: 0,
            drop_timer,
            check_timer,
            target_type: ObjectType::Stone,
            preview,
            show_surface: false,
            zoom: 1.0,
            aspect: 1280.0 / 720.0,
        };
        demo.reset(GameMode::CollectBooks);
        demo.refresh_preview();
        log::info!("GAME START");
        demo
    }

    #[cfg(test)]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[cfg(test)]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[cfg(test)]
    pub fn player_cell(&self) -> Cell {
        self.player
    }

    #[cfg(test)]
    pub fn books_collected(&self) -> usize {
        self.books_collected
    }

    fn reset(&mut self, mode: GameMode) {
        self.mode = mode;
        self.outcome = None;
        self.books_collected = 0;
        self.highlight = None;
        self.drop_timer.reset();
        self.check_timer.reset();
        self.map = generate_map(self.config.map_size, mode, self.config.books, &mut self.rng);
        self.objects = Grid3::new(self.config.map_size);

        let cells: Vec<Cell> = self.map.painter_order().collect();
        for cell in cells {
            let block = self.map.get(cell).copied().unwrap_or_default();
            if !block.is_air() {
                let object = self.make_object(cell, block);
                self.objects.set(cell, object);
            }
        }
        self.spawn_player();
    }

    fn restart_with(&mut self, mode: GameMode) {
        self.reset(mode);
        log::info!("GAME RESTART: Mode {}", mode.label());
    }

    fn make_object(&mut self, cell: Cell, block: ObjectType) -> Option<GameObject> {
        let size_x = self.config.map_size[0];
        if block == ObjectType::Book {
            let mut anim = SpriteAnimation::ping_pong(BOOK_FRAMES, 750_000, 150_000);
            anim.extend_frame(0, self.rng.gen_range(0..10u64) * 100_000);
            let transform = Transform::at(sprite_position(cell, size_x))
                .with_scale(Vec2::splat(BOOK_SCALE));
            return Some(
                GameObject::new(
                    self.assets.book_mesh.clone(),
                    self.assets.book_texture.clone(),
                    transform,
                )
                .with_sprite(anim),
            );
        }
        let mesh = self.assets.block_meshes.get(&block)?.clone();
        Some(GameObject::new(
            mesh,
            self.assets.blocks_texture.clone(),
            Transform::at(block_position(cell, size_x)),
        ))
    }

    fn spawn_player(&mut self) {
        let [x, y, _] = self.config.map_size;
        let free: Vec<Cell> = (0..x)
            .flat_map(|i| (0..y).map(move |j| (i, j, 1)))
            .filter(|&(i, j, _)| {
                self.map.get((i, j, 1)).is_some_and(|b| b.is_air())
                    && self.map.get((i, j, 2)).is_some_and(|b| b.is_air())
            })
            .collect();
        let Some(&cell) = free.get(self.rng.gen_range(0..free.len().max(1))) else {
            log::warn!("No free column to spawn the player");
            return;
        };
        let transform = Transform::at(sprite_position(cell, x))
            .with_scale(Vec2::splat(PLAYER_SCALE));
        let player = GameObject::new(
            self.assets.player_mesh.clone(),
            self.assets.player_texture.clone(),
            transform,
        )
        .with_sprite(SpriteAnimation::held(PLAYER_FRAMES));
        self.objects.set(cell, Some(player));
        self.player = cell;
    }

    fn player_falling(&self) -> bool {
        self.objects
            .get(self.player)
            .and_then(|o| o.as_ref())
            .is_some_and(|o| o.gravity.is_some())
    }

    fn occupied(&self, cell: Cell) -> bool {
        matches!(self.objects.get(cell), Some(Some(_)))
    }

    /// Move the player one cell. Returns true when the player changed cell.
    pub fn try_move(&mut self, dir: Direction) -> bool {
        if self.player_falling() {
            return false;
        }
        if let Some(Some(player)) = self.objects.get_mut(self.player) {
            if let Some(sprite) = &mut player.sprite {
                sprite.set_frame(dir.facing_frame());
            }
        }

        let Some(target) = dir.step(self.player).filter(|&c| self.objects.contains(c)) else {
            return false;
        };
        let (ti, tj, tk) = target;
        let has_book = self.mode == GameMode::CollectBooks
            && self.map.get(target) == Some(&ObjectType::Book);
        let free = !self.occupied(target) && !self.occupied((ti, tj, tk + 1));
        if !(free || has_book) {
            return false;
        }

        let Some(mut player) = self.objects.get_mut(self.player).and_then(Option::take) else {
            return false;
        };
        player.transform.position = sprite_position(target, self.config.map_size[0]);
        let ground_falling = matches!(self.objects.get((ti, tj, 0)), Some(Some(o)) if o.gravity.is_some());
        if ground_falling {
            player.gravity = Some(self.gravity());
        }
        self.objects.set(target, Some(player));
        self.player = target;

        if has_book {
            self.map.set(target, ObjectType::Air);
            self.books_collected += 1;
            log::info!(
                "Book collected ({}/{})",
                self.books_collected,
                self.config.books
            );
        }
        true
    }

    fn gravity(&self) -> Gravity {
        Gravity {
            acceleration: self.config.gravity,
        }
    }

    /// Start a random column falling. Columns holding a book or the player
    /// are spared.
    fn drop_column(&mut self) -> Option<(usize, usize)> {
        let [x, y, z] = self.config.map_size;
        let (pi, pj, _) = self.player;
        let candidates: Vec<(usize, usize)> = (0..x)
            .flat_map(|i| (0..y).map(move |j| (i, j)))
            .filter(|&(i, j)| {
                self.map.get((i, j, 1)) != Some(&ObjectType::Book) && (i, j) != (pi, pj)
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let (i, j) = candidates[self.rng.gen_range(0..candidates.len())];
        let gravity = self.gravity();
        for k in 0..z {
            if let Some(Some(object)) = self.objects.get_mut((i, j, k)) {
                object.gravity = Some(gravity);
            }
        }
        Some((i, j))
    }

    fn check_outcome(&mut self) {
        if self.books_collected >= self.config.books {
            log::info!("YOU WIN");
            self.outcome = Some(Outcome::Won);
        } else if self.player_falling() {
            log::info!("GAME OVER");
            self.outcome = Some(Outcome::Lost);
        }
    }

    fn camera_canvas(&self) -> Vec2 {
        Vec2::new(CANVAS_WIDTH, CANVAS_WIDTH / self.aspect.max(f32::EPSILON))
    }

    fn refresh_preview(&mut self) {
        let target = self.target_type;
        if let Some(mut preview) = self.make_object((0, 0, 0), target) {
            preview.transform.position = -self.camera_canvas() / 2.0 + Vec2::splat(0.5);
            self.preview = preview;
        }
    }

    fn set_highlight(&mut self, cell: Option<Cell>) {
        if self.highlight == cell {
            return;
        }
        if let Some(old) = self.highlight {
            if let Some(Some(object)) = self.objects.get_mut(old) {
                object.highlight.active = false;
            }
        }
        if let Some(new) = cell {
            if let Some(Some(object)) = self.objects.get_mut(new) {
                object.highlight.active = true;
            }
        }
        self.highlight = cell;
    }

    fn update_highlight(&mut self, ctx: &StepContext<'_>) {
        let world = self.camera().screen_to_world(ctx.cursor(), ctx.window_size);
        let cell = pick_cell(world, &self.map);
        self.set_highlight(cell);
    }

    /// Place the current type on top of the highlighted block.
    pub fn place_above_highlight(&mut self) -> bool {
        let Some((i, j, k)) = self.highlight else {
            return false;
        };
        let above = (i, j, k + 1);
        if above == self.player || self.map.get(above) != Some(&ObjectType::Air) {
            return false;
        }
        let block = self.target_type;
        self.map.set(above, block);
        let object = self.make_object(above, block);
        self.objects.set(above, object);
        true
    }

    /// Remove the highlighted block. The ground layer stays.
    pub fn remove_highlighted(&mut self) -> bool {
        let Some(cell) = self.highlight.filter(|&(_, _, k)| k != 0) else {
            return false;
        };
        self.map.set(cell, ObjectType::Air);
        self.objects.set(cell, None);
        self.highlight = None;
        true
    }

    fn handle_mode_keys(&mut self, ctx: &StepContext<'_>) -> bool {
        if ctx.pressed(Key::R) {
            self.restart_with(self.mode);
        } else if ctx.pressed(Key::C) && self.mode != GameMode::Creative {
            self.restart_with(GameMode::Creative);
        } else if ctx.pressed(Key::B) && self.mode != GameMode::CollectBooks {
            self.restart_with(GameMode::CollectBooks);
        } else {
            return false;
        }
        true
    }

    fn handle_creative_input(&mut self, ctx: &StepContext<'_>) {
        if ctx.pressed(Key::Space) {
            self.target_type = self.target_type.next_placeable();
            self.refresh_preview();
            log::debug!("Placement type: {:?}", self.target_type);
        }
        self.update_highlight(ctx);
        if ctx.clicked(MouseBtn::Right) {
            self.place_above_highlight();
        } else if ctx.clicked(MouseBtn::Left) && self.remove_highlighted() {
            self.update_highlight(ctx);
        }
    }

    fn update_objects(&mut self, dt: f32, dt_us: u64) {
        let cells: Vec<Cell> = self.objects.painter_order().collect();
        for cell in cells {
            if let Some(Some(object)) = self.objects.get_mut(cell) {
                object.update(dt, dt_us);
            }
        }
        self.preview.update(dt, dt_us);
    }
}

impl Demo for MineisoDemo {
    fn label(&self) -> &str {
        "Mineiso"
    }

    fn platform_config(&self) -> PlatformConfig {
        PlatformConfig::new("Mineiso", 1280, 720)
    }

    fn textures(&self) -> Vec<TextureRequest> {
        let a = &self.assets;
        vec![
            TextureRequest::file(&a.blocks_texture, &*a.blocks_texture, TextureOptions::PIXEL_ART),
            TextureRequest::file(&a.book_texture, &*a.book_texture, TextureOptions::PIXEL_ART),
            TextureRequest::file(&a.player_texture, &*a.player_texture, TextureOptions::PIXEL_ART),
            TextureRequest::white(&a.lines_texture),
        ]
    }

    fn step(&mut self, ctx: &StepContext<'_>) {
        if self.handle_mode_keys(ctx) {
            return;
        }
        let scroll = ctx.scroll();
        if scroll != 0.0 {
            self.zoom = (self.zoom - scroll * 0.05).max(MIN_ZOOM);
        }
        if self.outcome.is_some() {
            return;
        }

        if ctx.pressed(Key::F5) {
            self.show_surface = !self.show_surface;
        }
        for (key, dir) in [
            (Key::Up, Direction::Up),
            (Key::Down, Direction::Down),
            (Key::Left, Direction::Left),
            (Key::Right, Direction::Right),
        ] {
            if ctx.pressed(key) {
                self.try_move(dir);
            }
        }
        if self.mode == GameMode::Creative {
            self.handle_creative_input(ctx);
        }

        let drop_due = self.drop_timer.tick(ctx.dt);
        let check_due = self.check_timer.tick(ctx.dt);
        if self.mode == GameMode::CollectBooks {
            if drop_due {
                self.drop_column();
            }
            if check_due {
                self.check_outcome();
            }
        }
        self.update_objects(ctx.dt, ctx.dt_us);
    }

    fn camera(&self) -> Camera2D {
        Camera2D::ortho_canvas(CANVAS_WIDTH, self.aspect, self.zoom)
    }

    fn clear_color(&self) -> wgpu::Color {
        hex_color(0x2E3E69)
    }

    fn draw(&self, batch: &mut SpriteBatch) {
        for cell in self.objects.painter_order() {
            if let Some(Some(object)) = self.objects.get(cell) {
                object.draw(batch);
            }
        }
        if self.mode == GameMode::Creative {
            self.preview.draw(batch);
        }
        if self.show_surface {
            let lift = Vec2::new(0.0, 1.0 - surface_height());
            for cell in self.objects.painter_order() {
                if let Some(Some(object)) = self.objects.get(cell) {
                    let mut transform = object.transform;
                    transform.position += lift;
                    batch.push_lines(
                        &self.assets.lines_texture,
                        SpriteDraw::whole(&self.assets.diamond, transform.matrix())
                            .with_color([0.0, 0.0, 0.0, 1.0]),
                    );
                }
            }
        }
    }

    fn status_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Mode: {}", self.mode.label())];
        match self.mode {
            GameMode::CollectBooks => lines.push(format!(
                "Books: {}/{}",
                self.books_collected, self.config.books
            )),
            GameMode::Creative => lines.push(format!("Placing: {:?}", self.target_type)),
        }
        match self.outcome {
            Some(Outcome::Won) => lines.push("YOU WIN (R restarts)".to_string()),
            Some(Outcome::Lost) => lines.push("GAME OVER (R restarts)".to_string()),
            None => {}
        }
        lines.push(format!("Zoom: {:.2}", self.zoom));
        lines
    }

    fn restart(&mut self) {
        self.restart_with(self.mode);
    }

    fn resized(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.refresh_preview();
    }
}

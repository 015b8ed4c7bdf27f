//! Color-matching game: click a target tile, then try to find tiles of a
//! similar color. Close enough matches disappear from the palette.

use std::sync::Arc;

use glam::Vec2;
use qb_core::{Key, MouseBtn, Transform};
use qb_platform::PlatformConfig;
use qb_render::{Camera2D, QuadMesh, SpriteBatch, SpriteDraw};
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::ColorGameConfig;
use crate::demo::{demo_rng, Demo, StepContext, TextureRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PickTarget,
    Matching,
    End,
}

/// Result of one click, in `(row, col)` tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickOutcome {
    TargetSet { row: usize, col: usize },
    AlreadyHidden,
    IsTarget,
    Match { distance: f32 },
    TooFar { distance: f32 },
    /// Click outside the palette or after the game ended.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Palette {
    cols: usize,
    rows: usize,
    colors: Vec<[f32; 3]>,
    hidden: Vec<bool>,
}

impl Palette {
    pub fn random(cols: usize, rows: usize, rng: &mut StdRng) -> Self {
        let colors = (0..cols * rows)
            .map(|_| {
                [
                    rng.gen_range(0..255u8) as f32 / 255.0,
                    rng.gen_range(0..255u8) as f32 / 255.0,
                    rng.gen_range(0..255u8) as f32 / 255.0,
                ]
            })
            .collect();
        Self {
            cols,
            rows,
            colors,
            hidden: vec![false; cols * rows],
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn color(&self, row: usize, col: usize) -> [f32; 3] {
        self.colors[self.index(row, col)]
    }

    pub fn is_hidden(&self, row: usize, col: usize) -> bool {
        self.hidden[self.index(row, col)]
    }

    fn hide(&mut self, row: usize, col: usize) {
        let i = self.index(row, col);
        self.hidden[i] = true;
    }
}

/// Euclidean distance between two colors in unit RGB space.
pub fn rgb_distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Window pixel to `(row, col)`, `None` outside the grid.
pub fn cursor_to_tile(
    cursor: (f64, f64),
    window: (u32, u32),
    cols: usize,
    rows: usize,
) -> Option<(usize, usize)> {
    let (x, y) = cursor;
    if x < 0.0 || y < 0.0 || window.0 == 0 || window.1 == 0 {
        return None;
    }
    let tile_w = f64::from(window.0) / cols as f64;
    let tile_h = f64::from(window.1) / rows as f64;
    let col = (x / tile_w) as usize;
    let row = (y / tile_h) as usize;
    (row < rows && col < cols).then_some((row, col))
}

pub struct ColorGame {
    config: ColorGameConfig,
    rng: StdRng,
    palette: Palette,
    phase: Phase,
    target: Option<(usize, usize)>,
    matches: Vec<(usize, usize)>,
    picks: u32,
    white: Arc<str>,
    quad: QuadMesh,
}

impl ColorGame {
    pub fn new(config: ColorGameConfig, seed: Option<u64>) -> Self {
        let mut rng = demo_rng(seed);
        let palette = Palette::random(config.cols, config.rows, &mut rng);
        log::info!(
            "Color game: {}x{} palette, tolerance {:.2}, {} picks",
            config.cols,
            config.rows,
            config.tolerance,
            config.picking_count
        );
        Self {
            config,
            rng,
            palette,
            phase: Phase::PickTarget,
            target: None,
            matches: Vec::new(),
            picks: 0,
            white: Arc::from("color/white"),
            quad: QuadMesh::unit(),
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// `(matches, counted picks)`.
    pub fn score(&self) -> (usize, u32) {
        (self.matches.len(), self.picks)
    }

    fn max_distance(&self) -> f32 {
        self.config.tolerance * 3.0f32.sqrt()
    }

    /// Apply a click on tile `(row, col)` to the state machine.
    pub fn pick(&mut self, row: usize, col: usize) -> PickOutcome {
        if !self.palette.contains(row, col) {
            return PickOutcome::Ignored;
        }
        match self.phase {
            Phase::PickTarget => {
                self.target = Some((row, col));
                self.phase = Phase::Matching;
                PickOutcome::TargetSet { row, col }
            }
            Phase::Matching => {
                let outcome = self.match_against_target(row, col);
                if self.picks >= self.config.picking_count {
                    let (matches, picks) = self.score();
                    log::info!("Score: {matches:02}/{picks:02}");
                    self.phase = Phase::End;
                }
                outcome
            }
            Phase::End => PickOutcome::Ignored,
        }
    }

    fn match_against_target(&mut self, row: usize, col: usize) -> PickOutcome {
        let Some(target) = self.target else {
            return PickOutcome::Ignored;
        };
        if self.palette.is_hidden(row, col) {
            return PickOutcome::AlreadyHidden;
        }
        if target == (row, col) {
            return PickOutcome::IsTarget;
        }
        let distance = rgb_distance(
            self.palette.color(target.0, target.1),
            self.palette.color(row, col),
        );
        self.picks += 1;
        if distance <= self.max_distance() {
            self.palette.hide(row, col);
            self.matches.push((row, col));
            PickOutcome::Match { distance }
        } else {
            PickOutcome::TooFar { distance }
        }
    }

    fn tile_transform(&self, row: usize, col: usize) -> Transform {
        let size = Vec2::new(2.0 / self.config.cols as f32, 2.0 / self.config.rows as f32);
        Transform::at(Vec2::new(
            -1.0 + size.x / 2.0 + col as f32 * size.x,
            1.0 - size.y / 2.0 - row as f32 * size.y,
        ))
        .with_scale(Vec2::new(
            0.85 / self.config.cols as f32,
            0.85 / self.config.rows as f32,
        ))
    }

    fn report(&self, row: usize, col: usize, outcome: PickOutcome) {
        let [r, g, b] = self.palette.color(row, col).map(|c| (c * 255.0) as u8);
        log::info!("Picked RGB{{{r:3},{g:3},{b:3}}} @ row {row}, col {col}");
        match outcome {
            PickOutcome::TargetSet { .. } => log::info!(">> TARGET defined"),
            PickOutcome::AlreadyHidden => log::info!("Color already picked"),
            PickOutcome::IsTarget => log::info!("This is the TARGET color"),
            PickOutcome::Match { distance } => {
                log::info!(">> MATCH, distance {:.2}", distance * 255.0)
            }
            PickOutcome::TooFar { distance } => {
                log::info!(">> TOO FAR, distance {:.2}", distance * 255.0)
            }
            PickOutcome::Ignored => {}
        }
    }
}

impl Demo for ColorGame {
    fn label(&self) -> &str {
        "Color Game"
    }

    fn platform_config(&self) -> PlatformConfig {
        PlatformConfig::new("Color Game", 800, 480)
    }

    fn textures(&self) -> Vec<TextureRequest> {
        vec![TextureRequest::white(&self.white)]
    }

    fn step(&mut self, ctx: &StepContext<'_>) {
        if ctx.pressed(Key::R) {
            self.restart();
            return;
        }
        if !ctx.clicked(MouseBtn::Left) || self.phase == Phase::End {
            return;
        }
        let Some((row, col)) =
            cursor_to_tile(ctx.cursor(), ctx.window_size, self.config.cols, self.config.rows)
        else {
            return;
        };
        let outcome = self.pick(row, col);
        self.report(row, col, outcome);
    }

    fn camera(&self) -> Camera2D {
        Camera2D::ndc()
    }

    fn clear_color(&self) -> wgpu::Color {
        wgpu::Color::BLACK
    }

    fn draw(&self, batch: &mut SpriteBatch) {
        for row in 0..self.config.rows {
            for col in 0..self.config.cols {
                if self.palette.is_hidden(row, col) {
                    continue;
                }
                let [r, g, b] = self.palette.color(row, col);
                let model = self.tile_transform(row, col).matrix();
                batch.push_sprite(
                    &self.white,
                    SpriteDraw::whole(&self.quad, model).with_color([r, g, b, 1.0]),
                );
            }
        }
    }

    fn status_lines(&self) -> Vec<String> {
        let (matches, picks) = self.score();
        let phase = match self.phase {
            Phase::PickTarget => "pick a target",
            Phase::Matching => "matching",
            Phase::End => "game over (R restarts)",
        };
        vec![
            format!("Phase: {phase}"),
            format!("Score: {matches:02}/{picks:02} of {}", self.config.picking_count),
        ]
    }

    fn restart(&mut self) {
        self.palette = Palette::random(self.config.cols, self.config.rows, &mut self.rng);
        self.phase = Phase::PickTarget;
        self.target = None;
        self.matches.clear();
        self.picks = 0;
        log::info!("Color game restarted");
    }
}

//! Side-scrolling platformer in normalized device coordinates.
//!
//! The level file drives everything visible: background layers, platform
//! tiles, loose props and the player sprite. Player intent comes from the
//! Lua controller script when it is loaded and from arrow keys otherwise.
//! Both hot reload at frame boundaries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec2;
use qb_core::animation::{load_animation_file, AnimationFile};
use qb_core::{Gravity, Key, SpriteAnimation, TextureSlide, Transform};
use qb_platform::PlatformConfig;
use qb_render::{Camera2D, QuadMesh, SpriteBatch, TextureOptions};

use crate::collision::{Aabb, PlatformSet};
use crate::config::PlatformerConfig;
use crate::controller::{CharacterController, ControllerInput};
use crate::demo::{hex_color, Demo, StepContext, TextureRequest};
use crate::level::{load_level_from_path, LevelFile};
use crate::lua_bridge::{InputSnapshot, LuaBridge, LuaStatus, PlayerSnapshot};
use crate::object::GameObject;
use crate::sheet::{load_sheet_from_path, SheetFile};
use crate::watcher::FileWatcher;

/// Below this the player has left the world and respawns.
const RESPAWN_Y: f32 = -1.2;
/// Horizontal speed under which the idle clip plays.
const RUN_THRESHOLD: f32 = 0.05;

/// A loose object that falls until it rests on a platform.
#[derive(Debug, Clone)]
pub struct Prop {
    pub object: GameObject,
    pub half: Vec2,
    pub resting: bool,
}

impl Prop {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.object.transform.position, self.half)
    }

    fn update(&mut self, dt: f32, dt_us: u64, platforms: &PlatformSet) {
        let prev = self.aabb();
        self.object.update(dt, dt_us);
        let landing = platforms.resolve_landing(prev, self.aabb());
        self.object.transform.position = landing.aabb.center;
        if landing.landed {
            self.object.motion.velocity.y = 0.0;
        }
        self.resting = landing.landed;
    }
}

/// Everything built from one level file.
pub struct Scene {
    pub level: LevelFile,
    backgrounds: Vec<GameObject>,
    tiles: Vec<GameObject>,
    pub platforms: PlatformSet,
    pub props: Vec<Prop>,
    tile_texture: Arc<str>,
    player_texture: Arc<str>,
    player_mesh: Arc<QuadMesh>,
    animations: AnimationFile,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self, String> {
        let level = load_level_from_path(path)?;
        let tile_sheet = load_sheet_from_path(Path::new(&level.tiles.sheet))?;
        let player_sheet = load_sheet_from_path(Path::new(&level.player.sheet))?;
        let animations = load_animation_file(Path::new(&level.player.animation))?;
        let scene = Self::build(level, &tile_sheet, &player_sheet, animations)?;
        log::info!(
            "Loaded level '{}': {} platforms, {} props",
            scene.level.level_id,
            scene.platforms.len(),
            scene.props.len()
        );
        Ok(scene)
    }

    pub fn build(
        level: LevelFile,
        tile_sheet: &SheetFile,
        player_sheet: &SheetFile,
        animations: AnimationFile,
    ) -> Result<Self, String> {
        for clip in [&level.player.idle_clip, &level.player.run_clip] {
            if !animations.clips.contains_key(clip.as_str()) {
                return Err(format!(
                    "Animation '{}' has no clip named '{clip}'",
                    animations.animation_id
                ));
            }
        }
        let strip_len = player_sheet.frames.len();
        for (name, frames) in &animations.clips {
            if let Some(frame) = frames.iter().find(|f| f.strip_frame >= strip_len) {
                return Err(format!(
                    "Animation '{}' clip '{name}' uses strip frame {} but sheet '{}' has {strip_len} frames",
                    animations.animation_id, frame.strip_frame, player_sheet.sheet_id
                ));
            }
        }

        let unit = Arc::new(QuadMesh::unit());
        let backgrounds = level
            .backgrounds
            .iter()
            .map(|bg| {
                let object =
                    GameObject::new(unit.clone(), Arc::from(bg.texture.as_str()), Transform::default());
                match bg.slide {
                    Some(v) => object.with_slide(TextureSlide {
                        velocity: Vec2::from(v),
                    }),
                    None => object,
                }
            })
            .collect();

        let scale = level.tiles.scale;
        let tile_texture: Arc<str> = Arc::from(tile_sheet.texture.path.as_str());
        let tile_uv = tile_sheet.require_uv(&level.tiles.frame)?;
        let tile_mesh = Arc::new(QuadMesh::centered(Vec2::ONE, tile_uv.origin, tile_uv.size));
        let tile_scale = Vec2::splat(scale);
        let positions = level.tile_positions();
        let tiles = positions
            .iter()
            .map(|&p| {
                GameObject::new(
                    tile_mesh.clone(),
                    tile_texture.clone(),
                    Transform::at(p).with_scale(tile_scale),
                )
            })
            .collect();
        let platforms = PlatformSet::new(
            positions
                .iter()
                .map(|&p| Aabb::new(p, tile_scale))
                .collect(),
        );
        if platforms.is_empty() {
            log::warn!("Level '{}' has no platform tiles", level.level_id);
        }
        let spawn_box = Aabb::new(level.spawn(), Vec2::from(level.player.half));
        if platforms.any_overlap(&spawn_box) {
            return Err(format!(
                "Level '{}': player spawn {:?} is inside a platform tile",
                level.level_id, level.player.spawn
            ));
        }

        let mut props = Vec::with_capacity(level.props.len());
        for prop in &level.props {
            let uv = tile_sheet.require_uv(&prop.frame)?;
            let object = GameObject::new(
                Arc::new(QuadMesh::centered(Vec2::ONE, uv.origin, uv.size)),
                tile_texture.clone(),
                Transform::at(Vec2::from(prop.position)).with_scale(tile_scale),
            );
            props.push(Prop {
                object: GameObject {
                    gravity: Some(Gravity::default()),
                    ..object
                },
                half: tile_scale,
                resting: false,
            });
        }

        let strip = player_sheet.strip_uv();
        let player_mesh = Arc::new(QuadMesh::strip(
            player_sheet.frames.len(),
            Vec2::from(level.player.half),
            strip.origin,
            strip.size,
        ));

        Ok(Self {
            backgrounds,
            tiles,
            platforms,
            props,
            tile_texture,
            player_texture: Arc::from(player_sheet.texture.path.as_str()),
            player_mesh,
            animations,
            level,
        })
    }

    fn clip(&self, name: &str) -> Option<SpriteAnimation> {
        self.animations.instantiate(name)
    }
}

pub struct PlatformerDemo {
    scene: Scene,
    level_watcher: FileWatcher,
    lua: LuaBridge,
    player: CharacterController,
    sprite: GameObject,
    clip: String,
    facing_left: bool,
}

impl PlatformerDemo {
    pub fn new(config: &PlatformerConfig) -> Result<Self, String> {
        let scene = Scene::load(&config.level_path)?;
        Ok(Self::with_scene(
            scene,
            config.level_path.clone(),
            config.script_path.clone(),
        ))
    }

    pub fn with_scene(scene: Scene, level_path: PathBuf, script_path: PathBuf) -> Self {
        let player = CharacterController::new(scene.level.spawn(), Vec2::from(scene.level.player.half));
        let clip = scene.level.player.idle_clip.clone();
        let sprite = Self::player_sprite(&scene, &clip);
        Self {
            level_watcher: FileWatcher::new(level_path),
            lua: LuaBridge::new(script_path),
            player,
            sprite,
            clip,
            facing_left: false,
            scene,
        }
    }

    fn player_sprite(scene: &Scene, clip: &str) -> GameObject {
        let object = GameObject::new(
            scene.player_mesh.clone(),
            scene.player_texture.clone(),
            Transform::at(scene.level.spawn()),
        );
        match scene.clip(clip) {
            Some(anim) => object.with_sprite(anim),
            None => object,
        }
    }

    #[cfg(test)]
    pub fn player(&self) -> &CharacterController {
        &self.player
    }

    #[cfg(test)]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[cfg(test)]
    pub fn clip(&self) -> &str {
        &self.clip
    }

    fn play(&mut self, clip: &str) {
        if clip == self.clip {
            return;
        }
        match self.scene.clip(clip) {
            Some(anim) => {
                self.sprite.sprite = Some(anim);
                self.clip = clip.to_string();
            }
            None => log::debug!("Ignoring unknown clip '{clip}'"),
        }
    }

    fn fallback_input(ctx: &StepContext<'_>) -> ControllerInput {
        let mut move_x = 0.0;
        if ctx.held(Key::Left) {
            move_x -= 1.0;
        }
        if ctx.held(Key::Right) {
            move_x += 1.0;
        }
        ControllerInput {
            move_x,
            jump_pressed: ctx.pressed(Key::Space),
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            grounded: self.player.grounded,
            velocity: self.player.motion.velocity.to_array(),
            position: self.player.transform.position.to_array(),
            clip: Some(self.clip.clone()),
        }
    }

    fn respawn(&mut self) {
        self.player.respawn(self.scene.level.spawn());
        self.facing_left = false;
        let idle = self.scene.level.player.idle_clip.clone();
        self.clip.clear();
        self.play(&idle);
    }

    fn reload_level(&mut self) -> bool {
        if !self.level_watcher.should_reload() {
            return false;
        }
        match Scene::load(self.level_watcher.path()) {
            Ok(scene) => {
                log::info!("Level reloaded: {}", self.level_watcher.path().display());
                self.scene = scene;
                self.sprite = Self::player_sprite(&self.scene, &self.scene.level.player.idle_clip);
                self.player = CharacterController::new(
                    self.scene.level.spawn(),
                    Vec2::from(self.scene.level.player.half),
                );
                self.respawn();
                true
            }
            Err(err) => {
                log::warn!("Level reload failed, keeping previous level: {err}");
                false
            }
        }
    }
}

impl Demo for PlatformerDemo {
    fn label(&self) -> &str {
        "Platformer"
    }

    fn platform_config(&self) -> PlatformConfig {
        PlatformConfig::new("Platformer", 900, 500)
    }

    fn textures(&self) -> Vec<TextureRequest> {
        let mut requests: Vec<TextureRequest> = self
            .scene
            .backgrounds
            .iter()
            .map(|bg| TextureRequest::file(&bg.texture, &*bg.texture, TextureOptions::PIXEL_ART))
            .collect();
        for key in [&self.scene.tile_texture, &self.scene.player_texture] {
            if !requests.iter().any(|r| &r.key == key) {
                requests.push(TextureRequest::file(key, &**key, TextureOptions::PIXEL_ART));
            }
        }
        requests
    }

    fn step(&mut self, ctx: &StepContext<'_>) {
        if ctx.pressed(Key::R) {
            self.restart();
            return;
        }

        let input = InputSnapshot::capture(ctx.input, ctx.fresh_edges);
        let snapshot = self.snapshot();
        let (control, requested_clip) = match self.lua.call_update(ctx.dt, &input, &snapshot) {
            Some(intent) => (
                ControllerInput {
                    move_x: intent.move_x,
                    jump_pressed: intent.jump,
                },
                intent.clip,
            ),
            None => (Self::fallback_input(ctx), None),
        };

        self.player.step(control, ctx.dt, &self.scene.platforms);
        if self.player.transform.position.y < RESPAWN_Y {
            log::info!("Player fell out of the world, respawning");
            self.respawn();
        }

        if control.move_x < 0.0 {
            self.facing_left = true;
        } else if control.move_x > 0.0 {
            self.facing_left = false;
        }
        let clip = requested_clip.unwrap_or_else(|| {
            let player = &self.scene.level.player;
            if self.player.motion.velocity.x.abs() > RUN_THRESHOLD {
                player.run_clip.clone()
            } else {
                player.idle_clip.clone()
            }
        });
        self.play(&clip);
        if let Some(anim) = &mut self.sprite.sprite {
            anim.update(ctx.dt_us);
        }
        let flip = if self.facing_left { -1.0 } else { 1.0 };
        self.sprite.transform = self.player.transform.with_scale(Vec2::new(flip, 1.0));

        for bg in &mut self.scene.backgrounds {
            bg.update(ctx.dt, ctx.dt_us);
        }
        for prop in &mut self.scene.props {
            prop.update(ctx.dt, ctx.dt_us, &self.scene.platforms);
        }
    }

    fn camera(&self) -> Camera2D {
        Camera2D::ndc()
    }

    fn clear_color(&self) -> wgpu::Color {
        hex_color(0xF8E0B0)
    }

    fn draw(&self, batch: &mut SpriteBatch) {
        for bg in &self.scene.backgrounds {
            bg.draw(batch);
        }
        for tile in &self.scene.tiles {
            tile.draw(batch);
        }
        for prop in &self.scene.props {
            prop.object.draw(batch);
        }
        self.sprite.draw(batch);
    }

    fn status_lines(&self) -> Vec<String> {
        let p = self.player.transform.position;
        let mut lines = vec![
            format!("Level: {}", self.scene.level.level_id),
            format!("Player: ({:.2}, {:.2}) grounded={}", p.x, p.y, self.player.grounded),
            format!("Clip: {}", self.clip),
        ];
        if let Some(err) = self.lua.last_error() {
            lines.push(err.to_string());
        }
        lines
    }

    fn lua_status(&self) -> Option<String> {
        Some(self.lua.status().label().to_string())
    }

    fn restart(&mut self) {
        self.lua.force_reload();
        self.respawn();
        log::info!(
            "Platformer restarted ({})",
            match self.lua.status() {
                LuaStatus::Loaded => "Lua controller",
                LuaStatus::Error | LuaStatus::Fallback => "Rust controller",
            }
        );
    }

    fn frame_boundary(&mut self) -> bool {
        self.lua.check_reload();
        self.reload_level()
    }
}

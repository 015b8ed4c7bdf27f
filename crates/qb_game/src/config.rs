//! `assets/config/quadbox.json`: tunables for every demo.
//!
//! Every field has a default, so an empty object (or no file at all) is a
//! valid configuration.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH: &str = "assets/config/quadbox.json";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuadboxConfig {
    /// Fixed RNG seed. Absent means a fresh seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub color_game: ColorGameConfig,
    #[serde(default)]
    pub mineiso: MineisoConfig,
    #[serde(default)]
    pub platformer: PlatformerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColorGameConfig {
    #[serde(default = "default_cols")]
    pub cols: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
    #[serde(default = "default_picking_count")]
    pub picking_count: u32,
}

impl Default for ColorGameConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            tolerance: default_tolerance(),
            picking_count: default_picking_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MineisoConfig {
    #[serde(default = "default_map_size")]
    pub map_size: [usize; 3],
    #[serde(default = "default_books")]
    pub books: usize,
    #[serde(default = "default_drop_interval_ms")]
    pub drop_interval_ms: u64,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
}

impl Default for MineisoConfig {
    fn default() -> Self {
        Self {
            map_size: default_map_size(),
            books: default_books(),
            drop_interval_ms: default_drop_interval_ms(),
            check_interval_ms: default_check_interval_ms(),
            gravity: default_gravity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlatformerConfig {
    #[serde(default = "default_level_path")]
    pub level_path: PathBuf,
    #[serde(default = "default_script_path")]
    pub script_path: PathBuf,
}

impl Default for PlatformerConfig {
    fn default() -> Self {
        Self {
            level_path: default_level_path(),
            script_path: default_script_path(),
        }
    }
}

const fn default_cols() -> usize {
    15
}

const fn default_rows() -> usize {
    20
}

const fn default_tolerance() -> f32 {
    0.17
}

const fn default_picking_count() -> u32 {
    5
}

const fn default_map_size() -> [usize; 3] {
    [20, 20, 10]
}

const fn default_books() -> usize {
    10
}

const fn default_drop_interval_ms() -> u64 {
    400
}

const fn default_check_interval_ms() -> u64 {
    3000
}

const fn default_gravity() -> f32 {
    10.0
}

fn default_level_path() -> PathBuf {
    PathBuf::from("assets/levels/platformer.json")
}

fn default_script_path() -> PathBuf {
    PathBuf::from("assets/scripts/platformer.lua")
}

/// Load and validate the config. A missing file yields the defaults.
pub fn load_config_from_path(path: &Path) -> Result<QuadboxConfig, String> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(QuadboxConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: QuadboxConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn validate_config(config: &QuadboxConfig) -> Result<(), String> {
    let color = &config.color_game;
    if color.cols == 0 || color.rows == 0 {
        return Err(format!(
            "Config validation failed: color_game grid {}x{} must be non-zero",
            color.cols, color.rows
        ));
    }
    if !(color.tolerance > 0.0 && color.tolerance <= 1.0) {
        return Err(format!(
            "Config validation failed: color_game.tolerance {} must be in (0, 1]",
            color.tolerance
        ));
    }
    if color.picking_count == 0 {
        return Err("Config validation failed: color_game.picking_count must be > 0".to_string());
    }

    let mine = &config.mineiso;
    let [x, y, z] = mine.map_size;
    // Player stands on layer 1 with headroom on layer 2.
    if x == 0 || y == 0 || z < 3 {
        return Err(format!(
            "Config validation failed: mineiso.map_size {:?} needs x, y > 0 and z >= 3",
            mine.map_size
        ));
    }
    // One ground cell must stay free for the player to spawn.
    if mine.books >= x * y {
        return Err(format!(
            "Config validation failed: mineiso.books {} does not fit on a {}x{} map",
            mine.books, x, y
        ));
    }
    if mine.drop_interval_ms == 0 || mine.check_interval_ms == 0 {
        return Err("Config validation failed: mineiso intervals must be > 0".to_string());
    }
    if !(mine.gravity.is_finite() && mine.gravity > 0.0) {
        return Err(format!(
            "Config validation failed: mineiso.gravity {} must be positive",
            mine.gravity
        ));
    }

    let plat = &config.platformer;
    if plat.level_path.as_os_str().is_empty() {
        return Err("Config validation failed: platformer.level_path is empty".to_string());
    }
    Ok(())
}

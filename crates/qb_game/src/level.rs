//! Platformer level files.
//!
//! A level names its background images, the sheet frame used for platform
//! tiles and a character grid: `#` is a tile, `.` or space is empty. The last
//! row sits on the bottom edge of the screen. All positions are in normalized
//! device coordinates.

use glam::Vec2;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    #[serde(default)]
    pub backgrounds: Vec<BackgroundDef>,
    pub tiles: TileDef,
    pub rows: Vec<String>,
    pub player: PlayerDef,
    #[serde(default)]
    pub props: Vec<PropDef>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BackgroundDef {
    pub texture: String,
    /// UV units per second.
    #[serde(default)]
    pub slide: Option<[f32; 2]>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TileDef {
    pub sheet: String,
    pub frame: String,
    /// Half size of one tile.
    pub scale: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PlayerDef {
    pub sheet: String,
    pub animation: String,
    pub spawn: [f32; 2],
    pub half: [f32; 2],
    #[serde(default = "default_idle_clip")]
    pub idle_clip: String,
    #[serde(default = "default_run_clip")]
    pub run_clip: String,
}

/// A loose tile-sheet frame that falls until it lands on a platform.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PropDef {
    pub frame: String,
    pub position: [f32; 2],
}

fn default_idle_clip() -> String {
    "idle".to_string()
}

fn default_run_clip() -> String {
    "run".to_string()
}

impl LevelFile {
    /// Centers of every `#` cell, bottom row first.
    pub fn tile_positions(&self) -> Vec<Vec2> {
        let s = self.tiles.scale;
        let mut positions = Vec::new();
        for (from_bottom, row) in self.rows.iter().rev().enumerate() {
            for (col, c) in row.chars().enumerate() {
                if c == '#' {
                    positions.push(Vec2::new(
                        -1.0 + s + col as f32 * 2.0 * s,
                        -1.0 + s + from_bottom as f32 * 2.0 * s,
                    ));
                }
            }
        }
        positions
    }

    pub fn spawn(&self) -> Vec2 {
        Vec2::from(self.player.spawn)
    }
}

pub fn load_level_from_path(path: &Path) -> Result<LevelFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read level file {}: {e}", path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    validate_level(&level).map_err(|e| format!("{e} ({})", path.display()))?;
    Ok(level)
}

fn validate_level(level: &LevelFile) -> Result<(), String> {
    if level.version != "0.1" {
        return Err(format!(
            "Level validation failed: unsupported version '{}'",
            level.version
        ));
    }
    if level.level_id.trim().is_empty() {
        return Err("Level validation failed: level_id is empty".to_string());
    }
    for (i, bg) in level.backgrounds.iter().enumerate() {
        if bg.texture.trim().is_empty() {
            return Err(format!(
                "Level validation failed: backgrounds[{i}].texture is empty"
            ));
        }
        if let Some(slide) = bg.slide {
            if !slide.iter().all(|v| v.is_finite()) {
                return Err(format!(
                    "Level validation failed: backgrounds[{i}].slide must be finite"
                ));
            }
        }
    }
    let scale = level.tiles.scale;
    if !(scale.is_finite() && scale > 0.0 && scale <= 1.0) {
        return Err(format!(
            "Level validation failed: tiles.scale {scale} must be in (0, 1]"
        ));
    }
    if level.rows.is_empty() {
        return Err("Level validation failed: rows array is empty".to_string());
    }
    for (i, row) in level.rows.iter().enumerate() {
        if let Some(bad) = row.chars().find(|c| !matches!(c, '#' | '.' | ' ')) {
            return Err(format!(
                "Level validation failed: rows[{i}] has unknown cell '{bad}'"
            ));
        }
    }
    let [hx, hy] = level.player.half;
    if !(hx > 0.0 && hy > 0.0) {
        return Err("Level validation failed: player.half must be positive".to_string());
    }
    if !level.player.spawn.iter().all(|v| v.is_finite()) {
        return Err("Level validation failed: player.spawn must be finite".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "qb_level_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn level_json(rows: &[&str], scale: f32) -> String {
        let rows = serde_json::to_string(rows).expect("rows to json");
        format!(
            r#"{{
              "version": "0.1",
              "level_id": "test",
              "backgrounds": [
                {{ "texture": "bg.png" }},
                {{ "texture": "clouds.png", "slide": [0.04, 0.0] }}
              ],
              "tiles": {{ "sheet": "tiles.json", "frame": "ground", "scale": {scale} }},
              "rows": {rows},
              "player": {{
                "sheet": "hero.json", "animation": "hero_anim.json",
                "spawn": [-0.8, 0.0], "half": [0.05, 0.08]
              }},
              "props": [ {{ "frame": "ground", "position": [0.2, 0.5] }} ]
            }}"#
        )
    }

    #[test]
    fn loads_level_with_defaults() {
        let path = temp_file_path("valid");
        fs::write(&path, level_json(&["#...", "####"], 0.05))
            .expect("failed to write temp level");
        let level = load_level_from_path(&path).expect("valid level should load");
        assert_eq!(level.level_id, "test");
        assert_eq!(level.backgrounds.len(), 2);
        assert_eq!(level.backgrounds[1].slide, Some([0.04, 0.0]));
        assert_eq!(level.player.idle_clip, "idle");
        assert_eq!(level.player.run_clip, "run");
        assert_eq!(level.props.len(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn tile_positions_start_bottom_left() {
        let path = temp_file_path("positions");
        fs::write(&path, level_json(&["#...", "##.."], 0.05))
            .expect("failed to write temp level");
        let level = load_level_from_path(&path).expect("valid level should load");
        let tiles = level.tile_positions();
        assert_eq!(tiles.len(), 3);
        assert!(tiles[0].abs_diff_eq(Vec2::new(-0.95, -0.95), 1e-6));
        assert!(tiles[1].abs_diff_eq(Vec2::new(-0.85, -0.95), 1e-6));
        assert!(tiles[2].abs_diff_eq(Vec2::new(-0.95, -0.85), 1e-6));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_unknown_cells() {
        let path = temp_file_path("cells");
        fs::write(&path, level_json(&["#x.."], 0.05)).expect("failed to write temp level");
        let err = load_level_from_path(&path).expect_err("unknown cell should fail");
        assert!(err.contains("unknown cell 'x'"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_non_positive_scale() {
        let path = temp_file_path("scale");
        fs::write(&path, level_json(&["####"], 0.0)).expect("failed to write temp level");
        let err = load_level_from_path(&path).expect_err("zero scale should fail");
        assert!(err.contains("tiles.scale"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_empty_rows() {
        let path = temp_file_path("rows");
        fs::write(&path, level_json(&[], 0.05)).expect("failed to write temp level");
        let err = load_level_from_path(&path).expect_err("empty rows should fail");
        assert!(err.contains("rows array is empty"));
        let _ = fs::remove_file(path);
    }
}

//! Recorded controller input for determinism checks.
//!
//! A replay lists controller inputs with repeat counts. Feeding the same
//! replay to two controllers must leave them in identical states.

use crate::controller::ControllerInput;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub jump: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    /// One input per fixed step. A jump only fires on the first repeat.
    pub fn expanded_inputs(&self) -> Vec<ControllerInput> {
        self.frames
            .iter()
            .flat_map(|frame| {
                (0..frame.repeat.max(1)).map(move |i| ControllerInput {
                    move_x: frame.move_x.clamp(-1.0, 1.0),
                    jump_pressed: frame.jump && i == 0,
                })
            })
            .collect()
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    if !(replay.fixed_dt > 0.0) {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(replay)
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Aabb, PlatformSet};
    use crate::controller::CharacterController;
    use crate::level::load_level_from_path;
    use glam::Vec2;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "qb_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    /// Collision boxes of the shipped platformer level.
    fn shipped_platforms() -> (PlatformSet, Vec2, Vec2) {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/levels/platformer.json");
        let level = load_level_from_path(&path).expect("shipped level");
        let half = Vec2::splat(level.tiles.scale);
        let boxes = level
            .tile_positions()
            .into_iter()
            .map(|center| Aabb::new(center, half))
            .collect();
        let player_half = Vec2::from(level.player.half);
        (PlatformSet::new(boxes), level.spawn(), player_half)
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "move_x": 1.0, "repeat": 3 },
                { "jump": true, "repeat": 2 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert!(expanded[3].jump_pressed);
        assert!(!expanded[4].jump_pressed);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016667,
              "frames": [
                { "move_x": 1.0, "repeat": 60 },
                { "move_x": 1.0, "jump": true },
                { "move_x": 1.0, "repeat": 120 },
                { "move_x": -1.0, "repeat": 45 },
                { "jump": true, "repeat": 30 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let inputs = replay.expanded_inputs();
        let (platforms, start, half) = shipped_platforms();

        let mut run_a = CharacterController::new(start, half);
        let mut run_b = CharacterController::new(start, half);
        for input in &inputs {
            run_a.step(*input, replay.fixed_dt, &platforms);
        }
        for input in &inputs {
            run_b.step(*input, replay.fixed_dt, &platforms);
        }

        assert_eq!(run_a.transform.position, run_b.transform.position);
        assert_eq!(run_a.motion.velocity, run_b.motion.velocity);
        assert_eq!(run_a.grounded, run_b.grounded);
        assert!(run_a.transform.position.y > -1.0, "player fell through the floor");

        let _ = fs::remove_file(path);
    }
}

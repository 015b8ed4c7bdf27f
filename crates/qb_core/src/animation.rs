//! Sprite-strip animation: timed frames with explicit successors.
//!
//! Each frame names a quad in a shared strip mesh (`strip_frame`), how long it
//! is shown, and which frame follows it. Wrapping (`next` pointing back to 0),
//! ping-pong sequences and frames that hold forever all fall out of that one
//! shape. Timing uses integer microseconds so advancement under the fixed
//! timestep is identical on every run.
//!
//! The JSON format stores `duration_ms` for readability; on load it becomes
//! microseconds.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDuration {
    Timed(u64),
    /// Shown until something calls [`SpriteAnimation::set_frame`].
    Hold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteFrame {
    pub strip_frame: usize,
    pub duration: FrameDuration,
    pub next: usize,
}

#[derive(Debug, Clone)]
pub struct SpriteAnimation {
    pub frames: Vec<SpriteFrame>,
    pub current: usize,
    pub elapsed_us: u64,
    pub frozen: bool,
}

impl SpriteAnimation {
    pub fn new(frames: Vec<SpriteFrame>) -> Self {
        Self {
            frames,
            current: 0,
            elapsed_us: 0,
            frozen: false,
        }
    }

    /// Every strip frame in order, each shown for `duration_us`, wrapping.
    pub fn looping(strip_frames: &[usize], duration_us: u64) -> Self {
        let len = strip_frames.len();
        Self::new(
            strip_frames
                .iter()
                .enumerate()
                .map(|(i, &strip_frame)| SpriteFrame {
                    strip_frame,
                    duration: FrameDuration::Timed(duration_us),
                    next: (i + 1) % len.max(1),
                })
                .collect(),
        )
    }

    /// `0, 1, .., n-1, n-2, .., 1` then back to 0. The two end frames last
    /// `end_us`, the ones in between `step_us`.
    pub fn ping_pong(strip_len: usize, end_us: u64, step_us: u64) -> Self {
        let mut order: Vec<usize> = (0..strip_len).collect();
        if strip_len > 2 {
            order.extend((1..strip_len - 1).rev());
        }
        let len = order.len();
        Self::new(
            order
                .into_iter()
                .enumerate()
                .map(|(i, strip_frame)| {
                    let at_end = strip_frame == 0 || strip_frame + 1 == strip_len;
                    SpriteFrame {
                        strip_frame,
                        duration: FrameDuration::Timed(if at_end { end_us } else { step_us }),
                        next: (i + 1) % len.max(1),
                    }
                })
                .collect(),
        )
    }

    /// Frozen animation over `strip_len` frames that only moves on `set_frame`.
    pub fn held(strip_len: usize) -> Self {
        let mut anim = Self::new(
            (0..strip_len)
                .map(|i| SpriteFrame {
                    strip_frame: i,
                    duration: FrameDuration::Hold,
                    next: i,
                })
                .collect(),
        );
        anim.frozen = true;
        anim
    }

    /// Adds `extra_us` to a timed frame. Used to desynchronize copies of the
    /// same animation.
    pub fn extend_frame(&mut self, index: usize, extra_us: u64) {
        if let Some(frame) = self.frames.get_mut(index) {
            if let FrameDuration::Timed(us) = frame.duration {
                frame.duration = FrameDuration::Timed(us + extra_us);
            }
        }
    }

    /// Advances by `dt_us`. At most one frame transition happens per call.
    pub fn update(&mut self, dt_us: u64) {
        if self.frozen || self.frames.is_empty() {
            return;
        }
        let frame = &self.frames[self.current];
        let FrameDuration::Timed(duration_us) = frame.duration else {
            return;
        };

        self.elapsed_us += dt_us;
        if self.elapsed_us >= duration_us {
            self.elapsed_us -= duration_us;
            self.current = frame.next % self.frames.len();
        }
    }

    pub fn set_frame(&mut self, index: usize) {
        if self.frames.is_empty() {
            return;
        }
        self.current = index % self.frames.len();
        self.elapsed_us = 0;
    }

    /// Strip quad to draw for the current frame.
    pub fn current_strip_frame(&self) -> usize {
        self.frames
            .get(self.current)
            .map(|f| f.strip_frame)
            .unwrap_or(0)
    }
}

/// Named clips loaded from one animation file.
#[derive(Debug, Clone)]
pub struct AnimationFile {
    pub animation_id: String,
    pub clips: HashMap<String, Vec<SpriteFrame>>,
}

impl AnimationFile {
    pub fn instantiate(&self, clip: &str) -> Option<SpriteAnimation> {
        self.clips.get(clip).map(|frames| SpriteAnimation::new(frames.clone()))
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct AnimationFileJson {
    version: String,
    animation_id: String,
    clips: HashMap<String, Vec<SpriteFrameJson>>,
}

#[derive(Debug, Deserialize)]
struct SpriteFrameJson {
    strip_frame: usize,
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default)]
    hold: bool,
    #[serde(default)]
    next: Option<usize>,
}

/// Load an animation file from disk. Frames without `next` advance to the
/// following frame and the last one wraps to 0.
pub fn load_animation_file(path: &Path) -> Result<AnimationFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read animation file {}: {e}", path.display()))?;
    let json: AnimationFileJson = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse animation file {}: {e}", path.display()))?;
    validate_animation_json(&json)?;

    let clips = json
        .clips
        .into_iter()
        .map(|(name, frames)| {
            let len = frames.len();
            let frames = frames
                .into_iter()
                .enumerate()
                .map(|(i, f)| SpriteFrame {
                    strip_frame: f.strip_frame,
                    duration: match (f.hold, f.duration_ms) {
                        (true, _) | (false, None) => FrameDuration::Hold,
                        (false, Some(ms)) => FrameDuration::Timed(ms * 1000),
                    },
                    next: f.next.unwrap_or((i + 1) % len),
                })
                .collect();
            (name, frames)
        })
        .collect();

    Ok(AnimationFile {
        animation_id: json.animation_id,
        clips,
    })
}

fn validate_animation_json(json: &AnimationFileJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Animation validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.animation_id.is_empty() {
        return Err("Animation validation failed: animation_id is empty".to_string());
    }
    for (name, frames) in &json.clips {
        if frames.is_empty() {
            return Err(format!(
                "Animation validation failed: clip '{}' has no frames",
                name
            ));
        }
        for (i, frame) in frames.iter().enumerate() {
            if let Some(next) = frame.next {
                if next >= frames.len() {
                    return Err(format!(
                        "Animation validation failed: clip '{}' frame {} has next {} out of range",
                        name, i, next
                    ));
                }
            }
            if !frame.hold && frame.duration_ms == Some(0) {
                return Err(format!(
                    "Animation validation failed: clip '{}' frame {} has zero duration",
                    name, i
                ));
            }
            if !frame.hold && frame.duration_ms.is_none() {
                return Err(format!(
                    "Animation validation failed: clip '{}' frame {} needs duration_ms or hold",
                    name, i
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FIXED_DT_US;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "qb_anim_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn update_advances_after_duration() {
        let mut anim = SpriteAnimation::looping(&[0, 1, 2], 100_000);
        anim.update(50_000);
        assert_eq!(anim.current_strip_frame(), 0);
        anim.update(60_000);
        assert_eq!(anim.current_strip_frame(), 1);
        assert_eq!(anim.elapsed_us, 10_000);
    }

    #[test]
    fn update_makes_one_transition_per_call() {
        let mut anim = SpriteAnimation::looping(&[0, 1, 2], 100_000);
        anim.update(250_000);
        assert_eq!(anim.current, 1);
        // Leftover time carries into the next call.
        anim.update(0);
        assert_eq!(anim.current, 2);
    }

    #[test]
    fn looping_wraps_to_first_frame() {
        let mut anim = SpriteAnimation::looping(&[4, 5], 100_000);
        anim.update(100_000);
        anim.update(100_000);
        assert_eq!(anim.current, 0);
        assert_eq!(anim.current_strip_frame(), 4);
    }

    #[test]
    fn ping_pong_visits_strip_back_and_forth() {
        let mut anim = SpriteAnimation::ping_pong(5, 750_000, 150_000);
        let order: Vec<usize> = anim.frames.iter().map(|f| f.strip_frame).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 3, 2, 1]);
        assert_eq!(anim.frames[0].duration, FrameDuration::Timed(750_000));
        assert_eq!(anim.frames[4].duration, FrameDuration::Timed(750_000));
        assert_eq!(anim.frames[5].duration, FrameDuration::Timed(150_000));

        for _ in 0..8 {
            let FrameDuration::Timed(us) = anim.frames[anim.current].duration else {
                panic!("ping pong frames are timed");
            };
            anim.update(us);
        }
        assert_eq!(anim.current, 0);
    }

    #[test]
    fn extend_frame_delays_first_transition() {
        let mut anim = SpriteAnimation::ping_pong(5, 750_000, 150_000);
        anim.extend_frame(0, 300_000);
        anim.update(750_000);
        assert_eq!(anim.current, 0);
        anim.update(300_000);
        assert_eq!(anim.current, 1);
    }

    #[test]
    fn hold_frame_never_advances() {
        let mut anim = SpriteAnimation::new(vec![
            SpriteFrame {
                strip_frame: 0,
                duration: FrameDuration::Hold,
                next: 1,
            },
            SpriteFrame {
                strip_frame: 1,
                duration: FrameDuration::Timed(10),
                next: 0,
            },
        ]);
        anim.update(1_000_000);
        assert_eq!(anim.current, 0);
        assert_eq!(anim.elapsed_us, 0);
    }

    #[test]
    fn held_animation_moves_only_on_set_frame() {
        let mut anim = SpriteAnimation::held(8);
        assert!(anim.frozen);
        anim.update(FIXED_DT_US * 1000);
        assert_eq!(anim.current_strip_frame(), 0);
        anim.set_frame(3);
        assert_eq!(anim.current_strip_frame(), 3);
        anim.set_frame(10);
        assert_eq!(anim.current_strip_frame(), 2);
    }

    #[test]
    fn determinism_identical_results() {
        let mut a = SpriteAnimation::ping_pong(5, 750_000, 150_000);
        let mut b = a.clone();
        for _ in 0..500 {
            a.update(FIXED_DT_US);
            b.update(FIXED_DT_US);
            assert_eq!(a.current, b.current);
        }
        assert_eq!(a.elapsed_us, b.elapsed_us);
    }

    #[test]
    fn load_animation_file_parses_valid_json() {
        let path = temp_file_path("valid");
        let json = r#"
        {
          "version": "0.1",
          "animation_id": "hero",
          "clips": {
            "run": [
              { "strip_frame": 1, "duration_ms": 100 },
              { "strip_frame": 2, "duration_ms": 100 }
            ],
            "idle": [
              { "strip_frame": 0, "hold": true }
            ]
          }
        }
        "#;
        fs::write(&path, json).expect("write temp file");

        let file = load_animation_file(&path).expect("should parse");
        assert_eq!(file.animation_id, "hero");
        assert_eq!(file.clips.len(), 2);
        let run = &file.clips["run"];
        assert_eq!(run[0].duration, FrameDuration::Timed(100_000));
        assert_eq!(run[1].next, 0);
        assert_eq!(file.clips["idle"][0].duration, FrameDuration::Hold);
        assert!(file.instantiate("run").is_some());
        assert!(file.instantiate("swim").is_none());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_animation_file_rejects_bad_version() {
        let path = temp_file_path("bad_version");
        let json = r#"
        { "version": "9.9", "animation_id": "hero",
          "clips": { "idle": [{ "strip_frame": 0, "duration_ms": 100 }] } }
        "#;
        fs::write(&path, json).expect("write temp file");
        let err = load_animation_file(&path).expect_err("bad version should fail");
        assert!(err.contains("unsupported version"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_animation_file_rejects_next_out_of_range() {
        let path = temp_file_path("bad_next");
        let json = r#"
        { "version": "0.1", "animation_id": "hero",
          "clips": { "idle": [{ "strip_frame": 0, "duration_ms": 100, "next": 3 }] } }
        "#;
        fs::write(&path, json).expect("write temp file");
        let err = load_animation_file(&path).expect_err("bad next should fail");
        assert!(err.contains("out of range"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_animation_file_rejects_zero_duration() {
        let path = temp_file_path("zero_dur");
        let json = r#"
        { "version": "0.1", "animation_id": "hero",
          "clips": { "idle": [{ "strip_frame": 0, "duration_ms": 0 }] } }
        "#;
        fs::write(&path, json).expect("write temp file");
        let err = load_animation_file(&path).expect_err("zero duration should fail");
        assert!(err.contains("zero duration"));
        let _ = fs::remove_file(path);
    }
}

//! Sprite sheet metadata.
//!
//! `qb_sheet_packer` writes one JSON file per texture listing named pixel
//! rects. Rects use the image's top-left origin; [`SheetFile::uv_rect`]
//! converts them to the bottom-left UV convention of flipped textures, which
//! is what `QuadMesh` constructors expect.

use glam::Vec2;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct SheetFile {
    pub version: String,
    pub sheet_id: String,
    pub texture: SheetTexture,
    pub frames: Vec<SheetFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetTexture {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetFrame {
    pub frame_id: String,
    pub name: String,
    /// `[x, y, w, h]` in pixels, origin top-left.
    pub rect_px: [u32; 4],
}

/// Texture region in normalized coordinates, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl SheetFile {
    pub fn frame(&self, name: &str) -> Option<&SheetFrame> {
        self.frames.iter().find(|f| f.name == name)
    }

    pub fn uv_rect(&self, name: &str) -> Option<UvRect> {
        self.frame(name).map(|f| self.rect_to_uv(f.rect_px))
    }

    /// Frame `name`, or an error naming the sheet and the missing frame.
    pub fn require_uv(&self, name: &str) -> Result<UvRect, String> {
        self.uv_rect(name)
            .ok_or_else(|| format!("Sheet '{}' has no frame named '{}'", self.sheet_id, name))
    }

    /// Bounding region of every frame. Packed strips lay frames out left to
    /// right, so this is the region `QuadMesh::strip` slices.
    pub fn strip_uv(&self) -> UvRect {
        let mut min = [u32::MAX, u32::MAX];
        let mut max = [0u32, 0u32];
        for frame in &self.frames {
            let [x, y, w, h] = frame.rect_px;
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
            max[0] = max[0].max(x + w);
            max[1] = max[1].max(y + h);
        }
        if self.frames.is_empty() {
            return UvRect {
                origin: Vec2::ZERO,
                size: Vec2::ONE,
            };
        }
        self.rect_to_uv([min[0], min[1], max[0] - min[0], max[1] - min[1]])
    }

    /// Width over height of the first frame.
    pub fn frame_aspect(&self) -> f32 {
        self.frames
            .first()
            .map(|f| f.rect_px[2] as f32 / f.rect_px[3].max(1) as f32)
            .unwrap_or(1.0)
    }

    fn rect_to_uv(&self, rect_px: [u32; 4]) -> UvRect {
        let [x, y, w, h] = rect_px;
        let tw = self.texture.width as f32;
        let th = self.texture.height as f32;
        UvRect {
            origin: Vec2::new(x as f32 / tw, (th - (y + h) as f32) / th),
            size: Vec2::new(w as f32 / tw, h as f32 / th),
        }
    }
}

pub fn load_sheet_from_path(path: &Path) -> Result<SheetFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read sheet metadata {}: {e}", path.display()))?;
    let sheet = parse_sheet(&raw).map_err(|e| format!("{e} ({})", path.display()))?;
    log::debug!(
        "Loaded sheet '{}' with {} frames",
        sheet.sheet_id,
        sheet.frames.len()
    );
    Ok(sheet)
}

/// Parse and validate sheet JSON already in memory.
pub fn parse_sheet(raw: &str) -> Result<SheetFile, String> {
    let sheet: SheetFile =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse sheet metadata: {e}"))?;
    validate_sheet(&sheet)?;
    Ok(sheet)
}

fn validate_sheet(sheet: &SheetFile) -> Result<(), String> {
    if sheet.version != "0.1" {
        return Err(format!(
            "Sheet validation failed: unsupported version '{}'",
            sheet.version
        ));
    }
    if sheet.sheet_id.trim().is_empty() {
        return Err("Sheet validation failed: sheet_id is empty".to_string());
    }
    if sheet.texture.path.trim().is_empty() {
        return Err("Sheet validation failed: texture.path is empty".to_string());
    }
    if sheet.texture.width == 0 || sheet.texture.height == 0 {
        return Err("Sheet validation failed: texture width/height must be > 0".to_string());
    }
    if sheet.frames.is_empty() {
        return Err("Sheet validation failed: frames array is empty".to_string());
    }

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for frame in &sheet.frames {
        if frame.frame_id.trim().is_empty() {
            return Err(format!(
                "Sheet validation failed: frame '{}' has an empty frame_id",
                frame.name
            ));
        }
        if !ids.insert(frame.frame_id.as_str()) {
            return Err(format!(
                "Sheet validation failed: duplicate frame_id '{}'",
                frame.frame_id
            ));
        }
        if !names.insert(frame.name.as_str()) {
            return Err(format!(
                "Sheet validation failed: duplicate frame name '{}'",
                frame.name
            ));
        }
        let [x, y, w, h] = frame.rect_px;
        if w == 0 || h == 0 {
            return Err(format!(
                "Sheet validation failed: frame '{}' has zero-sized rect",
                frame.name
            ));
        }
        let right = x.checked_add(w);
        let bottom = y.checked_add(h);
        let inside = matches!(
            (right, bottom),
            (Some(r), Some(b)) if r <= sheet.texture.width && b <= sheet.texture.height
        );
        if !inside {
            return Err(format!(
                "Sheet validation failed: frame '{}' rect {:?} exceeds texture {}x{}",
                frame.name, frame.rect_px, sheet.texture.width, sheet.texture.height
            ));
        }
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
            "qb_sheet_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_sheet(name_hint: &str, body: &str) -> PathBuf {
        let path = temp_file_path(name_hint);
        fs::write(&path, body).expect("failed to write temp sheet file");
        path
    }

    const BLOCKS: &str = r#"
    {
      "version": "0.1",
      "sheet_id": "mine_blocks",
      "texture": { "path": "assets/textures/mine-blocks.png", "width": 526, "height": 232 },
      "frames": [
        { "frame_id": "a", "name": "grass", "rect_px": [0, 174, 52, 58] },
        { "frame_id": "b", "name": "wood_plank", "rect_px": [53, 58, 52, 58] }
      ]
    }
    "#;

    #[test]
    fn uv_rect_flips_to_bottom_left_origin() {
        let path = write_sheet("blocks", BLOCKS);
        let sheet = load_sheet_from_path(&path).expect("valid sheet should load");
        let grass = sheet.uv_rect("grass").expect("grass frame");
        assert!(grass.origin.abs_diff_eq(Vec2::ZERO, 1e-6));
        assert!(grass.size.abs_diff_eq(Vec2::new(52.0 / 526.0, 58.0 / 232.0), 1e-6));

        let plank = sheet.uv_rect("wood_plank").expect("plank frame");
        assert!(plank
            .origin
            .abs_diff_eq(Vec2::new(53.0 / 526.0, 116.0 / 232.0), 1e-6));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn strip_uv_bounds_all_frames() {
        let path = write_sheet(
            "strip",
            r#"{
              "version": "0.1", "sheet_id": "book",
              "texture": { "path": "book.png", "width": 467, "height": 42 },
              "frames": [
                { "frame_id": "0", "name": "book_0", "rect_px": [0, 0, 31, 42] },
                { "frame_id": "1", "name": "book_1", "rect_px": [31, 0, 31, 42] },
                { "frame_id": "2", "name": "book_2", "rect_px": [62, 0, 31, 42] }
              ]
            }"#,
        );
        let sheet = load_sheet_from_path(&path).expect("strip sheet should load");
        let strip = sheet.strip_uv();
        assert!(strip.origin.abs_diff_eq(Vec2::ZERO, 1e-6));
        assert!(strip.size.abs_diff_eq(Vec2::new(93.0 / 467.0, 1.0), 1e-6));
        assert!((sheet.frame_aspect() - 31.0 / 42.0).abs() < 1e-6);
        let _ = fs::remove_file(path);
    }

    /// Packer output for three 4x4 frames where the first two share pixels.
    const PACKED_REPEAT: &str = r#"{
      "version": "0.1",
      "sheet_id": "pose",
      "texture": { "path": "pose.png", "width": 12, "height": 4 },
      "frames": [
        { "frame_id": "49a3e3c7-fd3a-52d1-acfc-a229d3e0d980", "name": "pose_0", "rect_px": [0, 0, 4, 4] },
        { "frame_id": "23bbc56a-06ea-58d7-ada3-dd8056a55382", "name": "pose_1", "rect_px": [4, 0, 4, 4] },
        { "frame_id": "10d9c0ae-2d50-5850-a0b8-1bb65dee771a", "name": "pose_2", "rect_px": [8, 0, 4, 4] }
      ]
    }"#;

    #[test]
    fn packed_sheet_with_repeated_art_loads() {
        let sheet = parse_sheet(PACKED_REPEAT).expect("packer output should load");
        assert_eq!(sheet.frames.len(), 3);
        assert!(sheet.strip_uv().size.abs_diff_eq(Vec2::ONE, 1e-6));
    }

    #[test]
    fn rejects_duplicate_frame_ids() {
        let raw = PACKED_REPEAT.replace(
            "23bbc56a-06ea-58d7-ada3-dd8056a55382",
            "49a3e3c7-fd3a-52d1-acfc-a229d3e0d980",
        );
        let err = parse_sheet(&raw).expect_err("shared frame ids should fail");
        assert!(err.contains("duplicate frame_id"));
    }

    #[test]
    fn missing_frame_is_reported_by_name() {
        let path = write_sheet("missing_frame", BLOCKS);
        let sheet = load_sheet_from_path(&path).expect("valid sheet should load");
        let err = sheet.require_uv("stone").expect_err("stone is not in the sheet");
        assert!(err.contains("stone"));
        assert!(err.contains("mine_blocks"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_rect_outside_texture() {
        let path = write_sheet(
            "oob",
            r#"{
              "version": "0.1", "sheet_id": "s",
              "texture": { "path": "s.png", "width": 32, "height": 32 },
              "frames": [ { "frame_id": "x", "name": "big", "rect_px": [16, 0, 32, 32] } ]
            }"#,
        );
        let err = load_sheet_from_path(&path).expect_err("rect beyond width should fail");
        assert!(err.contains("exceeds texture"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_duplicate_names() {
        let path = write_sheet(
            "dup",
            r#"{
              "version": "0.1", "sheet_id": "s",
              "texture": { "path": "s.png", "width": 32, "height": 32 },
              "frames": [
                { "frame_id": "x", "name": "a", "rect_px": [0, 0, 8, 8] },
                { "frame_id": "y", "name": "a", "rect_px": [8, 0, 8, 8] }
              ]
            }"#,
        );
        let err = load_sheet_from_path(&path).expect_err("duplicate names should fail");
        assert!(err.contains("duplicate frame name"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_unknown_version() {
        let path = write_sheet(
            "version",
            r#"{
              "version": "9", "sheet_id": "s",
              "texture": { "path": "s.png", "width": 32, "height": 32 },
              "frames": [ { "frame_id": "x", "name": "a", "rect_px": [0, 0, 8, 8] } ]
            }"#,
        );
        let err = load_sheet_from_path(&path).expect_err("unknown version should fail");
        assert!(err.contains("unsupported version"));
        let _ = fs::remove_file(path);
    }
}

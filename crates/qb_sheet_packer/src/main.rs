//! Packs a directory of PNG frames into one horizontal strip plus the sheet
//! JSON the game loads. Frames are laid out left to right in file-name
//! order, so name animation frames with zero-padded indices.
//!
//! Frame ids are UUID v5 of the frame name plus its pixel hash: repacking
//! unchanged art keeps every id stable, and frames that repeat the same
//! pixels (a held pose) still get distinct ids.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct SheetMetadata {
    version: String,
    sheet_id: String,
    texture: SheetTexture,
    frames: Vec<SheetFrame>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SheetTexture {
    path: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
struct SheetFrame {
    frame_id: String,
    name: String,
    rect_px: [u32; 4],
}

fn usage() -> String {
    "Usage: cargo run -p qb_sheet_packer -- <input_dir> <sheet_png_output> <sheet_json_output> [padding]\nExample: cargo run -p qb_sheet_packer -- art/hero assets/textures/hero.png assets/sheets/hero.json 1".to_string()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run(std::env::args().skip(1).collect()) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    if args.len() < 3 || args.len() > 4 {
        return Err(usage());
    }

    let input_dir = PathBuf::from(&args[0]);
    let png_output = PathBuf::from(&args[1]);
    let json_output = PathBuf::from(&args[2]);
    let padding = match args.get(3) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|e| format!("Invalid padding '{raw}': {e}"))?,
        None => 0,
    };

    let mut input_files: Vec<PathBuf> = fs::read_dir(&input_dir)
        .map_err(|e| format!("Failed to read input dir '{}': {e}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect();
    input_files.sort();

    if input_files.is_empty() {
        return Err(format!(
            "No .png files found in input directory '{}'",
            input_dir.display()
        ));
    }

    let mut sources = Vec::with_capacity(input_files.len());
    for path in &input_files {
        let image = image::open(path)
            .map_err(|e| format!("Failed to open '{}': {e}", path.display()))?
            .to_rgba8();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame")
            .to_string();
        sources.push((name, image));
    }

    let (strip, frames) = pack_strip(&sources, padding)?;

    for output in [&png_output, &json_output] {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                format!("Failed to create output dir '{}': {e}", parent.display())
            })?;
        }
    }

    let png_tmp = temporary_output_path(&png_output);
    strip
        .save_with_format(&png_tmp, image::ImageFormat::Png)
        .map_err(|e| format!("Failed to write '{}': {e}", png_tmp.display()))?;

    let sheet_id = json_output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sheet")
        .to_string();
    let metadata = SheetMetadata {
        version: "0.1".to_string(),
        sheet_id,
        texture: SheetTexture {
            path: normalize_path_for_json(&png_output),
            width: strip.width(),
            height: strip.height(),
        },
        frames,
    };
    let json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| format!("Failed to serialize sheet metadata: {e}"))?;
    let json_tmp = temporary_output_path(&json_output);
    fs::write(&json_tmp, json)
        .map_err(|e| format!("Failed to write '{}': {e}", json_tmp.display()))?;

    promote_outputs_transactional(&[(&png_tmp, &png_output), (&json_tmp, &json_output)])?;

    log::info!(
        "Packed {} frames ({}x{}) -> {} and {}",
        metadata.frames.len(),
        metadata.texture.width,
        metadata.texture.height,
        png_output.display(),
        json_output.display()
    );
    Ok(())
}

/// Lay `sources` out left to right, `padding` pixels apart, top-aligned.
fn pack_strip(
    sources: &[(String, RgbaImage)],
    padding: u32,
) -> Result<(RgbaImage, Vec<SheetFrame>), String> {
    let mut seen_names = HashMap::new();
    for (i, (name, _)) in sources.iter().enumerate() {
        if let Some(first) = seen_names.insert(name.as_str(), i) {
            return Err(format!(
                "Frame name '{name}' appears twice (inputs {first} and {i})"
            ));
        }
    }

    let height = sources.iter().map(|(_, img)| img.height()).max().unwrap_or(0);
    let width = sources
        .iter()
        .map(|(_, img)| img.width())
        .sum::<u32>()
        + padding * sources.len().saturating_sub(1) as u32;
    if width == 0 || height == 0 {
        return Err("Nothing to pack: frames are empty".to_string());
    }

    let mut strip = RgbaImage::new(width, height);
    let mut frames = Vec::with_capacity(sources.len());
    let mut x = 0u32;
    for (name, image) in sources {
        let (w, h) = image.dimensions();
        image::imageops::replace(&mut strip, image, x as i64, 0);
        frames.push(SheetFrame {
            frame_id: frame_id_for(name, &hash_rgba8_bytes(image.as_raw())),
            name: name.clone(),
            rect_px: [x, 0, w, h],
        });
        x += w + padding;
    }
    Ok((strip, frames))
}

fn normalize_path_for_json(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn hash_rgba8_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    format!("{digest:x}")
}

fn frame_id_for(name: &str, content_hash: &str) -> String {
    let key = format!("{name}:{content_hash}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

fn temporary_output_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("output");
    path.with_file_name(format!("{file_name}.tmp"))
}

fn promote_temporary_file(temp_path: &Path, final_path: &Path) -> Result<(), String> {
    if final_path.exists() {
        fs::remove_file(final_path).map_err(|e| {
            format!(
                "Failed to replace existing output '{}': {e}",
                final_path.display()
            )
        })?;
    }
    fs::rename(temp_path, final_path).map_err(|e| {
        format!(
            "Failed to move temporary output '{}' -> '{}': {e}",
            temp_path.display(),
            final_path.display()
        )
    })
}

/// Move every temp file over its target. On failure, targets already
/// replaced are rolled back to their previous contents.
fn promote_outputs_transactional(pairs: &[(&Path, &Path)]) -> Result<(), String> {
    let mut backups: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut promoted: Vec<PathBuf> = Vec::new();

    for (_, final_path) in pairs {
        if final_path.exists() {
            let backup_path = final_path.with_extension("bak.tmp");
            fs::rename(final_path, &backup_path).map_err(|e| {
                format!(
                    "Failed to stage backup '{}' -> '{}': {e}",
                    final_path.display(),
                    backup_path.display()
                )
            })?;
            backups.insert((*final_path).to_path_buf(), backup_path);
        }
    }

    for (temp_path, final_path) in pairs {
        match promote_temporary_file(temp_path, final_path) {
            Ok(()) => promoted.push((*final_path).to_path_buf()),
            Err(err) => {
                for promoted_path in promoted.iter().rev() {
                    let _ = fs::remove_file(promoted_path);
                    if let Some(backup_path) = backups.get(promoted_path) {
                        let _ = fs::rename(backup_path, promoted_path);
                    }
                }
                for (final_path, backup_path) in backups {
                    if !final_path.exists() {
                        let _ = fs::rename(backup_path, final_path);
                    }
                }
                return Err(err);
            }
        }
    }

    for (_, backup_path) in backups {
        let _ = fs::remove_file(backup_path);
    }

    Ok(())
}

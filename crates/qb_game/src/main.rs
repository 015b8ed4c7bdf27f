//! Quadbox: four small 2D programs on one wgpu sprite pipeline.
//!
//!   qb_game [anaglyph|color|mineiso|platformer] [args...]
//!
//! The anaglyph viewer takes the left and right image paths as the next two
//! arguments, or reads them from stdin one per line. Tunables live in
//! `assets/config/quadbox.json`.

mod anaglyph;
mod app;
mod block_map;
mod collision;
mod color_game;
mod config;
mod controller;
mod demo;
mod iso;
mod level;
mod lua_bridge;
mod mineiso;
mod object;
mod platformer;
#[cfg(test)]
mod replay;
mod sheet;
mod watcher;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use winit::event_loop::{ControlFlow, EventLoop};

use anaglyph::AnaglyphDemo;
use app::App;
use color_game::ColorGame;
use config::{load_config_from_path, QuadboxConfig, CONFIG_PATH};
use demo::{Demo, DemoKind};
use mineiso::MineisoDemo;
use platformer::PlatformerDemo;

/// Image paths from the command line, or two lines of stdin.
fn anaglyph_paths(args: &[String]) -> Result<(PathBuf, PathBuf), String> {
    if let [left, right, ..] = args {
        return Ok((PathBuf::from(left), PathBuf::from(right)));
    }
    println!("Left and right image paths, one per line:");
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut next = |eye: &str| -> Result<PathBuf, String> {
        match lines.next() {
            Some(Ok(line)) if !line.trim().is_empty() => Ok(PathBuf::from(line.trim())),
            Some(Err(e)) => Err(format!("Failed to read {eye} image path: {e}")),
            _ => Err(format!("Missing {eye} image path")),
        }
    };
    let left = next("left")?;
    let right = next("right")?;
    Ok((left, right))
}

fn build_demo(
    kind: DemoKind,
    config: &QuadboxConfig,
    rest: &[String],
) -> Result<Box<dyn Demo>, String> {
    Ok(match kind {
        DemoKind::Anaglyph => {
            let (left, right) = anaglyph_paths(rest)?;
            Box::new(AnaglyphDemo::new(left, right))
        }
        DemoKind::ColorGame => Box::new(ColorGame::new(config.color_game.clone(), config.seed)),
        DemoKind::Mineiso => Box::new(MineisoDemo::new(config.mineiso.clone(), config.seed)?),
        DemoKind::Platformer => Box::new(PlatformerDemo::new(&config.platformer)?),
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Quadbox starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (name, rest) = match args.split_first() {
        Some((name, rest)) => (Some(name.as_str()), rest),
        None => (None, &args[..]),
    };

    let demo = DemoKind::parse(name)
        .and_then(|kind| {
            let config = load_config_from_path(Path::new(CONFIG_PATH))?;
            build_demo(kind, &config, rest)
        });
    let demo = match demo {
        Ok(demo) => demo,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(demo);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
        std::process::exit(1);
    }
    if app.failed() {
        std::process::exit(1);
    }
}

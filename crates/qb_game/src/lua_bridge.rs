//! Lua controller scripts for the platformer player.
//!
//! A script reads a snapshot of input and player state and answers with an
//! intent (horizontal direction, jump, animation clip). Rust applies the
//! intent through the same `CharacterController` the fallback uses, so the
//! script never touches physics directly.
//!
//! Script API (all under the `engine` global):
//!
//!   engine.input.held(name)         -- key held this step
//!   engine.input.pressed(name)      -- key went down this step
//!   engine.player.grounded          -- bool
//!   engine.player.vx / vy / x / y   -- numbers
//!   engine.player.clip              -- current animation clip or nil
//!   engine.player.intend(move_x, jump)
//!   engine.player.play(clip)
//!
//! Reloads build a fresh Lua state and re-run the file, so no globals leak
//! between versions of a script.

use std::path::PathBuf;

use mlua::prelude::*;
use qb_core::{InputState, Key};

use crate::watcher::FileWatcher;

/// Key names visible to scripts.
const SCRIPT_KEYS: &[(Key, &str)] = &[
    (Key::Left, "left"),
    (Key::Right, "right"),
    (Key::Up, "up"),
    (Key::Down, "down"),
    (Key::Space, "space"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LuaIntent {
    pub move_x: f32,
    pub jump: bool,
    pub clip: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuaStatus {
    Loaded,
    /// Load or runtime error; the Rust controller drives the player.
    Error,
    /// No script on disk; the Rust controller drives the player.
    Fallback,
}

impl LuaStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Loaded => "Lua: loaded",
            Self::Error => "Lua: ERROR",
            Self::Fallback => "Lua: fallback",
        }
    }
}

impl std::fmt::Display for LuaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayerSnapshot {
    pub grounded: bool,
    pub velocity: [f32; 2],
    pub position: [f32; 2],
    pub clip: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    pub held: Vec<&'static str>,
    pub pressed: Vec<&'static str>,
}

impl InputSnapshot {
    /// `edges` is false when this frame's presses were already handed out.
    pub fn capture(input: &InputState, edges: bool) -> Self {
        let mut snapshot = Self::default();
        for &(key, name) in SCRIPT_KEYS {
            if input.is_held(key) {
                snapshot.held.push(name);
            }
            if edges && input.is_just_pressed(key) {
                snapshot.pressed.push(name);
            }
        }
        snapshot
    }
}

pub struct LuaBridge {
    lua: Lua,
    watcher: FileWatcher,
    status: LuaStatus,
    last_error: Option<String>,
}

impl LuaBridge {
    pub fn new(script_path: PathBuf) -> Self {
        let mut bridge = Self {
            lua: Lua::new(),
            watcher: FileWatcher::new(script_path),
            status: LuaStatus::Fallback,
            last_error: None,
        };
        bridge.load();
        bridge
    }

    pub fn status(&self) -> LuaStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reload when the script changed on disk. Call between fixed steps.
    pub fn check_reload(&mut self) {
        if self.watcher.should_reload() {
            log::info!(
                "Lua script changed, reloading: {}",
                self.watcher.path().display()
            );
            self.load();
        }
    }

    pub fn force_reload(&mut self) {
        log::info!("Lua script reload requested: {}", self.watcher.path().display());
        self.load();
    }

    /// Run `on_update(dt)`. `None` means the caller should use the fallback.
    pub fn call_update(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        player: &PlayerSnapshot,
    ) -> Option<LuaIntent> {
        if self.status != LuaStatus::Loaded {
            return None;
        }
        match self.run_update(dt, input, player) {
            Ok(intent) => Some(intent),
            Err(err) => {
                // Stay in error until the file changes so the log is not flooded.
                let msg = format!("Lua on_update error: {err}");
                log::error!("{msg}");
                self.status = LuaStatus::Error;
                self.last_error = Some(msg);
                None
            }
        }
    }

    fn run_update(
        &self,
        dt: f32,
        input: &InputSnapshot,
        player: &PlayerSnapshot,
    ) -> LuaResult<LuaIntent> {
        let engine: LuaTable = self.lua.globals().get("engine")?;

        let input_table: LuaTable = engine.get("input")?;
        input_table.set("_held", self.flag_table(&input.held)?)?;
        input_table.set("_pressed", self.flag_table(&input.pressed)?)?;

        let player_table: LuaTable = engine.get("player")?;
        player_table.set("grounded", player.grounded)?;
        player_table.set("vx", player.velocity[0])?;
        player_table.set("vy", player.velocity[1])?;
        player_table.set("x", player.position[0])?;
        player_table.set("y", player.position[1])?;
        player_table.set("clip", player.clip.as_deref())?;

        let intent: LuaTable = self.lua.create_table()?;
        intent.set("move_x", 0.0f32)?;
        intent.set("jump", false)?;
        engine.set("_intent", intent.clone())?;

        let on_update: LuaFunction = self.lua.globals().get("on_update")?;
        on_update.call::<()>(dt)?;

        Ok(LuaIntent {
            move_x: intent.get::<f32>("move_x")?.clamp(-1.0, 1.0),
            jump: intent.get("jump")?,
            clip: intent.get::<Option<String>>("clip")?,
        })
    }

    fn flag_table(&self, names: &[&str]) -> LuaResult<LuaTable> {
        let table = self.lua.create_table()?;
        for name in names {
            table.set(*name, true)?;
        }
        Ok(table)
    }

    fn load(&mut self) {
        self.watcher.mark_seen();
        let path = self.watcher.path().to_path_buf();
        if !path.exists() {
            log::warn!(
                "Lua script not found: {}. Using Rust controller.",
                path.display()
            );
            self.status = LuaStatus::Fallback;
            self.last_error = None;
            return;
        }

        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                self.fail(format!("Failed to read Lua script {}: {err}", path.display()));
                return;
            }
        };

        let lua = Lua::new();
        if let Err(err) = install_engine_api(&lua) {
            self.fail(format!("Failed to set up Lua engine API: {err}"));
            return;
        }
        if let Err(err) = lua.load(&source).set_name(path.to_string_lossy()).exec() {
            self.fail(format!("Lua script load error: {err}"));
            return;
        }
        if lua.globals().get::<LuaFunction>("on_update").is_err() {
            self.fail(format!("Lua script {} defines no on_update", path.display()));
            return;
        }
        if let Ok(on_init) = lua.globals().get::<LuaFunction>("on_init") {
            if let Err(err) = on_init.call::<()>(()) {
                log::error!("Lua on_init error: {err}");
            }
        }

        self.lua = lua;
        self.status = LuaStatus::Loaded;
        self.last_error = None;
        log::info!("Lua script loaded: {}", path.display());
    }

    fn fail(&mut self, msg: String) {
        log::error!("{msg}");
        self.status = LuaStatus::Error;
        self.last_error = Some(msg);
    }
}

fn install_engine_api(lua: &Lua) -> LuaResult<()> {
    let engine = lua.create_table()?;

    let input = lua.create_table()?;
    input.set("_held", lua.create_table()?)?;
    input.set("_pressed", lua.create_table()?)?;
    input.set(
        "held",
        lua.create_function(|lua, name: String| lookup_flag(lua, "_held", &name))?,
    )?;
    input.set(
        "pressed",
        lua.create_function(|lua, name: String| lookup_flag(lua, "_pressed", &name))?,
    )?;
    engine.set("input", input)?;

    let player = lua.create_table()?;
    player.set("grounded", false)?;
    player.set("vx", 0.0f32)?;
    player.set("vy", 0.0f32)?;
    player.set("x", 0.0f32)?;
    player.set("y", 0.0f32)?;
    player.set(
        "intend",
        lua.create_function(|lua, (move_x, jump): (f32, Option<bool>)| {
            let intent = current_intent(lua)?;
            intent.set("move_x", move_x)?;
            intent.set("jump", jump.unwrap_or(false))?;
            Ok(())
        })?,
    )?;
    player.set(
        "play",
        lua.create_function(|lua, clip: String| current_intent(lua)?.set("clip", clip))?,
    )?;
    engine.set("player", player)?;
    engine.set("_intent", lua.create_table()?)?;

    lua.globals().set("engine", engine)
}

fn lookup_flag(lua: &Lua, table: &str, name: &str) -> LuaResult<bool> {
    let engine: LuaTable = lua.globals().get("engine")?;
    let input: LuaTable = engine.get("input")?;
    let flags: LuaTable = input.get(table)?;
    Ok(flags.get::<Option<bool>>(name)?.unwrap_or(false))
}

fn current_intent(lua: &Lua) -> LuaResult<LuaTable> {
    let engine: LuaTable = lua.globals().get("engine")?;
    engine.get("_intent")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    const WALK_RIGHT: &str = r#"
function on_update(dt)
    engine.player.intend(1.0, true)
end
"#;

    fn temp_lua_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "qb_lua_bridge_test_{}_{}_{}.lua",
            name,
            std::process::id(),
            nanos
        ))
    }

    fn write_script(path: &PathBuf, content: &str) {
        std::fs::write(path, content).expect("failed to write temp script");
    }

    #[test]
    fn status_display_matches_label() {
        for status in [LuaStatus::Loaded, LuaStatus::Error, LuaStatus::Fallback] {
            assert_eq!(format!("{status}"), status.label());
        }
    }

    #[test]
    fn missing_script_falls_back() {
        let mut bridge = LuaBridge::new(temp_lua_path("missing"));
        assert_eq!(bridge.status(), LuaStatus::Fallback);
        let result = bridge.call_update(
            1.0 / 60.0,
            &InputSnapshot::default(),
            &PlayerSnapshot::default(),
        );
        assert!(result.is_none());
    }

    #[test]
    fn valid_script_returns_intent() {
        let path = temp_lua_path("valid");
        write_script(&path, WALK_RIGHT);
        let mut bridge = LuaBridge::new(path.clone());
        assert_eq!(
            bridge.status(),
            LuaStatus::Loaded,
            "error: {:?}",
            bridge.last_error()
        );
        let intent = bridge
            .call_update(1.0 / 60.0, &InputSnapshot::default(), &PlayerSnapshot::default())
            .expect("loaded script should answer");
        assert_eq!(intent.move_x, 1.0);
        assert!(intent.jump);
        assert!(intent.clip.is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn syntax_error_reports_error() {
        let path = temp_lua_path("syntax");
        write_script(&path, "this is not lua !@#");
        let bridge = LuaBridge::new(path.clone());
        assert_eq!(bridge.status(), LuaStatus::Error);
        assert!(bridge.last_error().is_some());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn script_without_on_update_is_an_error() {
        let path = temp_lua_path("no_update");
        write_script(&path, "x = 1");
        let bridge = LuaBridge::new(path.clone());
        assert_eq!(bridge.status(), LuaStatus::Error);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn runtime_error_switches_to_error() {
        let path = temp_lua_path("runtime");
        write_script(&path, "function on_update(dt) error('boom') end");
        let mut bridge = LuaBridge::new(path.clone());
        assert_eq!(bridge.status(), LuaStatus::Loaded);
        let result = bridge.call_update(
            1.0 / 60.0,
            &InputSnapshot::default(),
            &PlayerSnapshot::default(),
        );
        assert!(result.is_none());
        assert_eq!(bridge.status(), LuaStatus::Error);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn force_reload_picks_up_new_script() {
        let path = temp_lua_path("reload");
        let mut bridge = LuaBridge::new(path.clone());
        assert_eq!(bridge.status(), LuaStatus::Fallback);
        write_script(&path, WALK_RIGHT);
        bridge.force_reload();
        assert_eq!(bridge.status(), LuaStatus::Loaded);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn check_reload_loads_script_that_appears() {
        let path = temp_lua_path("appear");
        let mut bridge = LuaBridge::new(path.clone());
        assert_eq!(bridge.status(), LuaStatus::Fallback);
        write_script(&path, WALK_RIGHT);
        bridge.check_reload();
        assert_eq!(bridge.status(), LuaStatus::Loaded);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn script_reads_input_and_player_state() {
        let path = temp_lua_path("reads");
        write_script(
            &path,
            r#"
function on_update(dt)
    local move_x = 0
    if engine.input.held("right") then move_x = 1 end
    if engine.input.held("left") then move_x = move_x - 1 end
    engine.player.intend(move_x, engine.input.pressed("space") and engine.player.grounded)
    if move_x ~= 0 then engine.player.play("run") else engine.player.play("idle") end
end
"#,
        );
        let mut bridge = LuaBridge::new(path.clone());
        let input = InputSnapshot {
            held: vec!["right", "space"],
            pressed: vec!["space"],
        };
        let airborne = PlayerSnapshot::default();
        let intent = bridge
            .call_update(1.0 / 60.0, &input, &airborne)
            .expect("script should answer");
        assert_eq!(intent.move_x, 1.0);
        assert!(!intent.jump);
        assert_eq!(intent.clip.as_deref(), Some("run"));

        let grounded = PlayerSnapshot {
            grounded: true,
            ..Default::default()
        };
        let intent = bridge
            .call_update(1.0 / 60.0, &input, &grounded)
            .expect("script should answer");
        assert!(intent.jump);

        let idle = bridge
            .call_update(1.0 / 60.0, &InputSnapshot::default(), &grounded)
            .expect("script should answer");
        assert_eq!(idle.move_x, 0.0);
        assert_eq!(idle.clip.as_deref(), Some("idle"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn capture_maps_engine_keys_to_names() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_down(Key::Space);
        let snapshot = InputSnapshot::capture(&input, true);
        assert_eq!(snapshot.held, vec!["left", "space"]);
        assert_eq!(snapshot.pressed, vec!["left", "space"]);

        let later_step = InputSnapshot::capture(&input, false);
        assert_eq!(later_step.held, vec!["left", "space"]);
        assert!(later_step.pressed.is_empty());
    }
}

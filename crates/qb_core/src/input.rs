//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every frame the key is
//!   physically down. The platformer reads movement this way.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened. Cleared by `end_frame()`, which the main loop
//!   calls only after at least one fixed simulation step has consumed them, so a
//!   click or key tap is never lost on a frame with zero steps.
//!
//! Scroll deltas accumulate the same way and are cleared with the edges.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
    Space,
    Digit1,
    Digit2,
    Digit3,
    B,
    C,
    R,
    F3,
    F5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_just_pressed: HashSet<MouseBtn>,
    mouse_just_released: HashSet<MouseBtn>,

    /// Cursor in physical pixels, origin at the window's top-left.
    pub mouse_position: (f64, f64),
    scroll_y: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_just_pressed: HashSet::new(),
            mouse_just_released: HashSet::new(),
            mouse_position: (0.0, 0.0),
            scroll_y: 0.0,
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        if self.mouse_held.insert(btn) {
            self.mouse_just_pressed.insert(btn);
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        if self.mouse_held.remove(&btn) {
            self.mouse_just_released.insert(btn);
        }
    }

    /// Positive `lines` scrolls up (away from the user).
    pub fn scroll(&mut self, lines: f32) {
        self.scroll_y += lines;
    }

    pub fn scroll_delta(&self) -> f32 {
        self.scroll_y
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse_held.contains(&btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_just_pressed.contains(&btn)
    }

    pub fn is_mouse_just_released(&self, btn: MouseBtn) -> bool {
        self.mouse_just_released.contains(&btn)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_just_pressed.clear();
        self.mouse_just_released.clear();
        self.scroll_y = 0.0;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::Up);
        assert!(input.is_held(Key::Up));
        assert!(input.is_just_pressed(Key::Up));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::Up);
        input.key_up(Key::Up);
        assert!(!input.is_held(Key::Up));
        assert!(input.is_just_released(Key::Up));
    }

    #[test]
    fn test_key_repeat_keeps_single_press() {
        let mut input = InputState::new();
        input.key_down(Key::Space);
        input.end_frame();
        // OS key repeat delivers another press while held; it is not a new edge.
        input.key_down(Key::Space);
        assert!(input.is_held(Key::Space));
        assert!(!input.is_just_pressed(Key::Space));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::R);
        assert!(!input.is_just_released(Key::R));
        assert!(!input.is_held(Key::R));
    }

    #[test]
    fn test_end_frame_clears_transient_state() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_down(Key::Digit2);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Left));
        assert!(!input.is_just_pressed(Key::Digit2));
        assert!(input.is_held(Key::Left));
        assert!(input.is_held(Key::Digit2));
    }

    #[test]
    fn test_mouse_press_and_release_edges() {
        let mut input = InputState::new();
        input.mouse_down(MouseBtn::Right);
        assert!(input.is_mouse_held(MouseBtn::Right));
        assert!(input.is_mouse_just_pressed(MouseBtn::Right));
        input.end_frame();
        assert!(!input.is_mouse_just_pressed(MouseBtn::Right));

        input.mouse_up(MouseBtn::Right);
        assert!(input.is_mouse_just_released(MouseBtn::Right));
        assert!(!input.is_mouse_held(MouseBtn::Right));
        input.end_frame();
        assert!(!input.is_mouse_just_released(MouseBtn::Right));
    }

    #[test]
    fn test_scroll_accumulates_until_end_frame() {
        let mut input = InputState::new();
        input.scroll(1.0);
        input.scroll(2.0);
        assert!((input.scroll_delta() - 3.0).abs() < f32::EPSILON);
        input.end_frame();
        assert_eq!(input.scroll_delta(), 0.0);
    }

    #[test]
    fn test_default_state_is_empty() {
        let input = InputState::default();
        assert!(!input.is_held(Key::Escape));
        assert!(!input.is_just_pressed(Key::F3));
        assert!(!input.is_mouse_held(MouseBtn::Left));
        assert_eq!(input.mouse_position, (0.0, 0.0));
        assert_eq!(input.scroll_delta(), 0.0);
    }
}

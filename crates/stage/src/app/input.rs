use std::collections::{HashMap, HashSet};

pub const KEY_SHIFT: &str = "Shift";
pub const KEY_SPACE: &str = "Space";

/// Live held/not-held state per key identifier.
///
/// Identifiers are layout-independent names derived from physical keys:
/// lowercase letters and digits (`"w"`, `"1"`), `"ArrowUp"`, `"Shift"`,
/// `"Space"`, `"Escape"`, `"F3"` and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    held: HashMap<String, bool>,
    pressed: HashSet<String>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, is_down: bool) {
        if is_down && !self.is_held(key) {
            self.pressed.insert(key.to_string());
        }
        self.held.insert(key.to_string(), is_down);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.get(key).copied().unwrap_or(false)
    }

    pub fn any_held<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().any(|key| self.is_held(key.as_ref()))
    }

    pub fn was_pressed(&self, key: &str) -> bool {
        self.pressed.contains(key)
    }

    pub fn held_count(&self) -> usize {
        self.held.values().filter(|down| **down).count()
    }

    pub fn with_key_down(mut self, key: &str, is_down: bool) -> Self {
        self.set(key, is_down);
        self
    }

    /// Marks a key as freshly pressed without touching its held state.
    pub fn with_key_pressed(mut self, key: &str) -> Self {
        self.pressed.insert(key.to_string());
        self
    }

    pub(crate) fn clear_pressed(&mut self) {
        self.pressed.clear();
    }

    pub(crate) fn release_all(&mut self) {
        for down in self.held.values_mut() {
            *down = false;
        }
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_reads_as_released() {
        let keys = KeyState::new();
        assert!(!keys.is_held("w"));
        assert!(!keys.was_pressed("w"));
    }

    #[test]
    fn press_then_release_clears_held_state() {
        let mut keys = KeyState::new();
        keys.set("d", true);
        assert!(keys.is_held("d"));
        keys.set("d", false);
        assert!(!keys.is_held("d"));
        assert_eq!(keys.held_count(), 0);
    }

    #[test]
    fn pressed_edge_is_recorded_once_until_cleared() {
        let mut keys = KeyState::new();
        keys.set("r", true);
        assert!(keys.was_pressed("r"));
        keys.clear_pressed();
        keys.set("r", true);
        assert!(!keys.was_pressed("r"));
        keys.set("r", false);
        keys.set("r", true);
        assert!(keys.was_pressed("r"));
    }

    #[test]
    fn any_held_checks_alternate_bindings() {
        let keys = KeyState::new().with_key_down("ArrowUp", true);
        assert!(keys.any_held(&["w", "ArrowUp"]));
        assert!(!keys.any_held(&["s", "ArrowDown"]));
    }

    #[test]
    fn release_all_drops_every_key() {
        let mut keys = KeyState::new()
            .with_key_down("w", true)
            .with_key_down(KEY_SHIFT, true);
        keys.release_all();
        assert_eq!(keys.held_count(), 0);
        assert!(!keys.was_pressed("w"));
    }
}

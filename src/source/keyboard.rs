//! Keyboard chord source
//!
//! Tracks a fixed set of keys, each bound to either one button slot or one
//! signed axis direction. The table is owned by the panel while keyboard mode
//! is active: it is created on mode entry, discarded on mode exit, and
//! disabling the mode releases every held key so a hidden table can never keep
//! driving an axis.

use egui::Key;
use std::collections::HashMap;
use tracing::debug;

/// Output slot a tracked key drives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyTarget {
    /// Held state written straight into this button slot
    Button(usize),

    /// `direction` summed into this axis slot while held
    Axis { index: usize, direction: f32 },
}

/// One tracked key: its target slot and current held state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyBinding {
    pub target: KeyTarget,
    pub held: bool,
}

/// Held-state table for all tracked keys
#[derive(Debug, Clone)]
pub struct KeyStateTable {
    bindings: HashMap<Key, KeyBinding>,
}

impl KeyStateTable {
    pub fn new(targets: HashMap<Key, KeyTarget>) -> Self {
        let bindings = targets
            .into_iter()
            .map(|(key, target)| {
                (
                    key,
                    KeyBinding {
                        target,
                        held: false,
                    },
                )
            })
            .collect();

        Self { bindings }
    }

    /// Default chord map: WASD and arrows on the first two axis pairs,
    /// a handful of action keys on the low button slots
    pub fn with_default_bindings() -> Self {
        let mut targets = HashMap::new();

        targets.insert(Key::A, KeyTarget::Axis { index: 0, direction: 1.0 });
        targets.insert(Key::D, KeyTarget::Axis { index: 0, direction: -1.0 });
        targets.insert(Key::W, KeyTarget::Axis { index: 1, direction: 1.0 });
        targets.insert(Key::S, KeyTarget::Axis { index: 1, direction: -1.0 });
        targets.insert(Key::ArrowLeft, KeyTarget::Axis { index: 2, direction: 1.0 });
        targets.insert(Key::ArrowRight, KeyTarget::Axis { index: 2, direction: -1.0 });
        targets.insert(Key::ArrowUp, KeyTarget::Axis { index: 3, direction: 1.0 });
        targets.insert(Key::ArrowDown, KeyTarget::Axis { index: 3, direction: -1.0 });

        targets.insert(Key::Space, KeyTarget::Button(0));
        targets.insert(Key::Enter, KeyTarget::Button(1));
        targets.insert(Key::Q, KeyTarget::Button(2));
        targets.insert(Key::E, KeyTarget::Button(3));
        targets.insert(Key::Tab, KeyTarget::Button(4));
        targets.insert(Key::X, KeyTarget::Button(5));

        debug!("Built default key-state table");
        Self::new(targets)
    }

    /// Marks a tracked key as held; untracked keys are ignored
    pub fn key_down(&mut self, key: Key) {
        if let Some(binding) = self.bindings.get_mut(&key) {
            binding.held = true;
        }
    }

    /// Marks a tracked key as released; untracked keys are ignored
    pub fn key_up(&mut self, key: Key) {
        if let Some(binding) = self.bindings.get_mut(&key) {
            binding.held = false;
        }
    }

    /// Releases every held key (keyboard mode disabled)
    pub fn release_all(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.held = false;
        }
    }

    pub fn is_tracked(&self, key: Key) -> bool {
        self.bindings.contains_key(&key)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held_count(table: &KeyStateTable) -> usize {
        table.bindings().filter(|binding| binding.held).count()
    }

    #[test]
    fn tracks_held_state_per_key() {
        let mut table = KeyStateTable::with_default_bindings();

        table.key_down(Key::W);
        table.key_down(Key::Space);
        assert_eq!(held_count(&table), 2);

        table.key_up(Key::W);
        assert_eq!(held_count(&table), 1);
    }

    #[test]
    fn untracked_keys_are_ignored() {
        let mut table = KeyStateTable::with_default_bindings();

        table.key_down(Key::F12);
        assert!(!table.is_tracked(Key::F12));
        assert_eq!(held_count(&table), 0);
    }

    #[test]
    fn release_all_clears_every_held_key() {
        let mut table = KeyStateTable::with_default_bindings();

        table.key_down(Key::W);
        table.key_down(Key::A);
        table.key_down(Key::Enter);
        table.release_all();

        assert_eq!(held_count(&table), 0);
    }

    #[test]
    fn opposite_directions_share_one_axis() {
        let table = KeyStateTable::with_default_bindings();

        let on_axis_one: Vec<f32> = table
            .bindings()
            .filter_map(|binding| match binding.target {
                KeyTarget::Axis { index: 1, direction } => Some(direction),
                _ => None,
            })
            .collect();

        assert_eq!(on_axis_one.len(), 2);
        assert!((on_axis_one[0] + on_axis_one[1]).abs() < 1e-6);
    }
}

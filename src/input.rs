use std::collections::{HashMap, HashSet};

use bitflags::bitflags;
use winit::keyboard::KeyCode;
use winit_input_helper::WinitInputHelper;

bitflags! {
    /// Packed per-player button byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const UP    = 0b0000_0001;
        const DOWN  = 0b0000_0010;
        const LEFT  = 0b0000_0100;
        const RIGHT = 0b0000_1000;
        const A     = 0b0001_0000;
        const B     = 0b0010_0000;
        const X     = 0b0100_0000;
        const Y     = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    X,
    Y,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
    ];

    pub fn bit(self) -> Buttons {
        match self {
            Button::Up => Buttons::UP,
            Button::Down => Buttons::DOWN,
            Button::Left => Buttons::LEFT,
            Button::Right => Buttons::RIGHT,
            Button::A => Buttons::A,
            Button::B => Buttons::B,
            Button::X => Buttons::X,
            Button::Y => Buttons::Y,
        }
    }
}

/// Answers whether a physical key is currently down. Press/release
/// bookkeeping belongs to whoever implements this.
pub trait HeldKeys {
    fn is_held(&self, key: KeyCode) -> bool;
}

impl HeldKeys for WinitInputHelper {
    fn is_held(&self, key: KeyCode) -> bool {
        self.key_held(key)
    }
}

impl HeldKeys for HashSet<KeyCode> {
    fn is_held(&self, key: KeyCode) -> bool {
        self.contains(&key)
    }
}

/// Ordered set of equivalent keys bound to one button.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeySet(Vec<KeyCode>);

impl KeySet {
    pub fn keys(&self) -> &[KeyCode] {
        &self.0
    }

    pub fn any_held(&self, held: &dyn HeldKeys) -> bool {
        self.0.iter().any(|&key| held.is_held(key))
    }
}

impl FromIterator<KeyCode> for KeySet {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        let mut keys: Vec<KeyCode> = Vec::new();
        for key in iter {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        KeySet(keys)
    }
}

impl From<KeyCode> for KeySet {
    fn from(key: KeyCode) -> Self {
        KeySet(vec![key])
    }
}

impl From<Vec<KeyCode>> for KeySet {
    fn from(keys: Vec<KeyCode>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<&[KeyCode]> for KeySet {
    fn from(keys: &[KeyCode]) -> Self {
        keys.iter().copied().collect()
    }
}

impl<const N: usize> From<[KeyCode; N]> for KeySet {
    fn from(keys: [KeyCode; N]) -> Self {
        keys.into_iter().collect()
    }
}

type PlayerMapping = HashMap<Button, KeySet>;

/// Merges simulated (touch, external controller) button bits with
/// keyboard-derived bits into one mask per player.
#[derive(Debug, Clone)]
pub struct InputState {
    simulated: HashMap<usize, Buttons>,
    mappings: HashMap<usize, PlayerMapping>,
}

impl Default for InputState {
    fn default() -> Self {
        InputState::new()
    }
}

impl InputState {
    /// Two players with the stock keyboard layout.
    pub fn new() -> Self {
        let mut input = InputState::empty();
        for (player, button, keys) in default_mappings() {
            input.set_key_mapping(player, button, keys);
        }
        input
    }

    pub fn empty() -> Self {
        InputState {
            simulated: HashMap::new(),
            mappings: HashMap::new(),
        }
    }

    pub fn simulated(&self, player: usize) -> Buttons {
        self.simulated.get(&player).copied().unwrap_or_default()
    }

    pub fn keyboard(&self, player: usize, held: &dyn HeldKeys) -> Buttons {
        let Some(mapping) = self.mappings.get(&player) else {
            return Buttons::empty();
        };
        mapping
            .iter()
            .filter(|(_, keys)| keys.any_held(held))
            .fold(Buttons::empty(), |acc, (button, _)| acc | button.bit())
    }

    pub fn button_state(&self, player: usize, held: &dyn HeldKeys) -> Buttons {
        self.simulated(player) | self.keyboard(player, held)
    }

    pub fn set_simulated_button(&mut self, player: usize, button: Button, pressed: bool) {
        self.simulated
            .entry(player)
            .or_default()
            .set(button.bit(), pressed);
    }

    pub fn clear_simulated(&mut self) {
        self.simulated.clear();
    }

    pub fn set_key_mapping(&mut self, player: usize, button: Button, keys: impl Into<KeySet>) {
        self.mappings
            .entry(player)
            .or_default()
            .insert(button, keys.into());
    }

    pub fn key_mapping(&self, player: usize, button: Button) -> Option<&KeySet> {
        self.mappings.get(&player)?.get(&button)
    }
}

fn default_mappings() -> Vec<(usize, Button, Vec<KeyCode>)> {
    use KeyCode::*;
    vec![
        (0, Button::Up, vec![ArrowUp, KeyW]),
        (0, Button::Down, vec![ArrowDown, KeyS]),
        (0, Button::Left, vec![ArrowLeft, KeyA]),
        (0, Button::Right, vec![ArrowRight, KeyD]),
        (0, Button::A, vec![KeyZ, Space]),
        (0, Button::B, vec![KeyX, ShiftLeft]),
        (0, Button::X, vec![KeyC, KeyN]),
        (0, Button::Y, vec![KeyV, KeyM]),
        (1, Button::Up, vec![KeyI]),
        (1, Button::Down, vec![KeyK]),
        (1, Button::Left, vec![KeyJ]),
        (1, Button::Right, vec![KeyL]),
        (1, Button::A, vec![KeyU]),
        (1, Button::B, vec![KeyO]),
        (1, Button::X, vec![KeyY]),
        (1, Button::Y, vec![KeyP]),
    ]
}

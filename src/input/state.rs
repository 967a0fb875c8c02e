//! Device state snapshot read by the dispatcher

use rustc_hash::{FxHashMap, FxHashSet};
use winit::keyboard::KeyCode;

use crate::input::events::InputEvent;
use crate::input::gamepad::{GamepadAxis, GamepadButton};

/// Live keyboard and gamepad state
///
/// Only one gamepad drives the command tables at a time: the first one that
/// connects. Events from any other pad are ignored. Without an active pad no
/// button is pressed and every axis reads zero.
#[derive(Debug, Default)]
pub struct DeviceState {
    /// Currently pressed keys
    pressed_keys: FxHashSet<KeyCode>,
    /// Currently pressed buttons on the active gamepad
    pressed_buttons: FxHashSet<GamepadButton>,
    /// Axis values of the active gamepad
    axes: FxHashMap<GamepadAxis, f32>,
    /// Identifier of the gamepad feeding the tables
    active_gamepad: Option<usize>,
}

impl DeviceState {
    /// Create an empty device state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one buffered device event
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { key, pressed } => {
                if pressed {
                    self.pressed_keys.insert(key);
                } else {
                    self.pressed_keys.remove(&key);
                }
            }
            InputEvent::Button { id, button, pressed } => {
                if !self.accepts(id) {
                    return;
                }
                if pressed {
                    self.pressed_buttons.insert(button);
                } else {
                    self.pressed_buttons.remove(&button);
                }
            }
            InputEvent::Axis { id, axis, value } => {
                if self.accepts(id) {
                    self.axes.insert(axis, value.clamp(-1.0, 1.0));
                }
            }
            InputEvent::GamepadConnected { id, name } => {
                if self.active_gamepad.is_none() {
                    self.active_gamepad = Some(id);
                    log::info!("gamepad {id} connected: {name}");
                }
            }
            InputEvent::GamepadDisconnected { id } => {
                if self.active_gamepad == Some(id) {
                    self.active_gamepad = None;
                    self.pressed_buttons.clear();
                    self.axes.clear();
                    log::info!("gamepad {id} disconnected");
                }
            }
            InputEvent::FocusLost => self.release_all(),
        }
    }

    /// Whether events from gamepad `id` feed the tables, adopting it when no
    /// pad is active yet (some platforms report input before the connection).
    fn accepts(&mut self, id: usize) -> bool {
        match self.active_gamepad {
            Some(active) => active == id,
            None => {
                self.active_gamepad = Some(id);
                true
            }
        }
    }

    /// Release every key and button, zero every axis.
    ///
    /// Used when the window loses focus and release events may never arrive.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.pressed_buttons.clear();
        self.axes.clear();
    }

    /// Check if a key is currently pressed
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if a gamepad button is currently pressed
    pub fn is_button_pressed(&self, button: GamepadButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Current axis value, zero when unknown or no gamepad is active
    pub fn axis(&self, axis: GamepadAxis) -> f32 {
        self.axes.get(&axis).copied().unwrap_or(0.0)
    }

    /// Identifier of the active gamepad
    pub fn active_gamepad(&self) -> Option<usize> {
        self.active_gamepad
    }
}

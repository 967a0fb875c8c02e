//! Gamepad identifiers and polling backends
//!
//! Buttons and axes follow the standard (Xbox-style) layout so command tables
//! can name them without knowing which polling library produced the events.

use serde::{Deserialize, Serialize};

use crate::input::events::InputEvent;

/// Default deadzone for analog sticks
pub const DEFAULT_DEADZONE: f32 = 0.2;

/// Gamepad buttons in the standard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadButton {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    Back,
    Start,
    LeftStick,
    RightStick,
    Up,
    Down,
    Left,
    Right,
}

/// Analog gamepad axes, each reporting a value in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadAxis {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftTrigger,
    RightTrigger,
}

/// Source of gamepad events (e.g. gilrs on desktop).
///
/// Backends never touch device state directly: they translate whatever the
/// platform reports into [`InputEvent`]s, which the frame loop applies at the
/// start of the next tick.
pub trait GamepadBackend {
    /// Drain pending platform events into `sink`.
    fn poll(&mut self, sink: &mut dyn FnMut(InputEvent));
}

/// Backend for platforms without gamepad support.
#[derive(Debug, Default)]
pub struct NullBackend;

impl GamepadBackend for NullBackend {
    fn poll(&mut self, _sink: &mut dyn FnMut(InputEvent)) {}
}

#[cfg(feature = "gilrs")]
pub use gilrs_backend::GilrsBackend;

#[cfg(feature = "gilrs")]
mod gilrs_backend {
    use gilrs::{Axis, Button, Event, EventType, Gilrs};

    use super::{GamepadAxis, GamepadBackend, GamepadButton};
    use crate::input::events::InputEvent;

    /// Desktop gamepad polling through gilrs
    pub struct GilrsBackend {
        gilrs: Gilrs,
    }

    impl GilrsBackend {
        /// Initialise gilrs.
        ///
        /// # Errors
        ///
        /// Returns an error if the platform gamepad subsystem is unavailable.
        pub fn new() -> Result<Self, gilrs::Error> {
            Ok(Self {
                gilrs: Gilrs::new()?,
            })
        }
    }

    impl GamepadBackend for GilrsBackend {
        fn poll(&mut self, sink: &mut dyn FnMut(InputEvent)) {
            while let Some(Event { id: gamepad_id, event, .. }) = self.gilrs.next_event() {
                let id = usize::from(gamepad_id);
                match event {
                    EventType::Connected => {
                        let name = self.gilrs.gamepad(gamepad_id).name().to_owned();
                        sink(InputEvent::GamepadConnected { id, name });
                    }
                    EventType::Disconnected => sink(InputEvent::GamepadDisconnected { id }),
                    EventType::ButtonPressed(button, _) => {
                        if let Some(button) = map_button(button) {
                            sink(InputEvent::Button { id, button, pressed: true });
                        }
                    }
                    EventType::ButtonReleased(button, _) => {
                        if let Some(button) = map_button(button) {
                            sink(InputEvent::Button { id, button, pressed: false });
                        }
                    }
                    EventType::AxisChanged(axis, value, _) => {
                        if let Some(axis) = map_axis(axis) {
                            // Stick Y reads positive downward in the bindings
                            let value = match axis {
                                GamepadAxis::LeftStickY | GamepadAxis::RightStickY => -value,
                                _ => value,
                            };
                            sink(InputEvent::Axis { id, axis, value });
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn map_button(button: Button) -> Option<GamepadButton> {
        Some(match button {
            Button::South => GamepadButton::A,
            Button::East => GamepadButton::B,
            Button::West => GamepadButton::X,
            Button::North => GamepadButton::Y,
            Button::LeftTrigger => GamepadButton::LeftBumper,
            Button::RightTrigger => GamepadButton::RightBumper,
            Button::LeftTrigger2 => GamepadButton::LeftTrigger,
            Button::RightTrigger2 => GamepadButton::RightTrigger,
            Button::Select => GamepadButton::Back,
            Button::Start => GamepadButton::Start,
            Button::LeftThumb => GamepadButton::LeftStick,
            Button::RightThumb => GamepadButton::RightStick,
            Button::DPadUp => GamepadButton::Up,
            Button::DPadDown => GamepadButton::Down,
            Button::DPadLeft => GamepadButton::Left,
            Button::DPadRight => GamepadButton::Right,
            _ => return None,
        })
    }

    fn map_axis(axis: Axis) -> Option<GamepadAxis> {
        Some(match axis {
            Axis::LeftStickX => GamepadAxis::LeftStickX,
            Axis::LeftStickY => GamepadAxis::LeftStickY,
            Axis::RightStickX => GamepadAxis::RightStickX,
            Axis::RightStickY => GamepadAxis::RightStickY,
            Axis::LeftZ => GamepadAxis::LeftTrigger,
            Axis::RightZ => GamepadAxis::RightTrigger,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_backend_emits_nothing() {
        let mut backend = NullBackend;
        let mut events = Vec::new();
        backend.poll(&mut |e| events.push(e));
        assert!(events.is_empty());
    }

    #[test]
    fn test_button_names_roundtrip_through_json() {
        let json = serde_json::to_string(&GamepadButton::RightBumper).unwrap();
        assert_eq!(json, "\"RightBumper\"");
        let axis: GamepadAxis = serde_json::from_str("\"LeftStickY\"").unwrap();
        assert_eq!(axis, GamepadAxis::LeftStickY);
    }
}

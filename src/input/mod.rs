//! Input handling module
//!
//! Declarative command tables, their merge rules, and the per-tick dispatcher
//! that runs them against buffered keyboard and gamepad state.

pub mod bindings;
mod command;
mod dispatch;
mod events;
mod gamepad;
mod state;

pub use command::{
    CommandDescriptor, CommandMap, CommandTable, PartialCommand, Trigger, Triggers,
    into_descriptors, merge_commands,
};
pub use dispatch::{Dispatcher, Handler, HandlerRegistry};
pub use events::{InputEvent, InputQueue};
#[cfg(feature = "gilrs")]
pub use gamepad::GilrsBackend;
pub use gamepad::{DEFAULT_DEADZONE, GamepadAxis, GamepadBackend, GamepadButton, NullBackend};
pub use state::DeviceState;

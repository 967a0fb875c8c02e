//! Built-in command tables
//!
//! Two layers of defaults exist: the shell's own bindings (VR controls,
//! wireframe, sensor reset) and the pool game's bindings on top. User tables
//! from the config file are merged over both.

use std::f32::consts::FRAC_PI_2;

use winit::keyboard::KeyCode;

use crate::input::command::{CommandMap, PartialCommand, Trigger};
use crate::input::gamepad::{DEFAULT_DEADZONE, GamepadAxis, GamepadButton};

fn table<const N: usize>(entries: [(&str, PartialCommand); N]) -> CommandMap {
    entries
        .into_iter()
        .map(|(name, cmd)| (name.to_string(), cmd))
        .collect()
}

fn key(code: KeyCode) -> PartialCommand {
    PartialCommand::new().trigger(Trigger::key(code))
}

fn button(button: GamepadButton) -> PartialCommand {
    PartialCommand::new().trigger(Trigger::button(button))
}

fn stick(axis: GamepadAxis) -> PartialCommand {
    PartialCommand::new()
        .trigger(Trigger::axis(axis))
        .deadzone(DEFAULT_DEADZONE)
}

fn inverted_stick(axis: GamepadAxis) -> PartialCommand {
    PartialCommand::new()
        .trigger(Trigger::axis(axis).negated())
        .deadzone(DEFAULT_DEADZONE)
}

/// Keyboard bindings every session has
pub fn shell_keyboard() -> CommandMap {
    table([
        (
            "toggleVRControls",
            key(KeyCode::KeyV).on_activate("toggleVRControls").debounce(0.25),
        ),
        (
            "toggleWireframe",
            key(KeyCode::Digit0).on_activate("toggleWireframe").debounce(0.25),
        ),
        (
            "resetVRSensor",
            key(KeyCode::KeyZ).on_activate("resetVRSensor").debounce(0.25),
        ),
    ])
}

/// Gamepad bindings every session has
pub fn shell_gamepad() -> CommandMap {
    table([(
        "resetVRSensor",
        button(GamepadButton::Back).on_activate("resetVRSensor").debounce(0.25),
    )])
}

/// Pool game keyboard bindings
///
/// Movement commands carry no handler; their signed values are read each
/// frame to move the avatar and the cue.
pub fn game_keyboard() -> CommandMap {
    table([
        (
            "turnLeft",
            PartialCommand::new().trigger(Trigger::key(KeyCode::ArrowLeft).negated()),
        ),
        ("turnRight", key(KeyCode::ArrowRight)),
        (
            "driveForward",
            PartialCommand::new().trigger(Trigger::key(KeyCode::KeyW).negated()),
        ),
        ("driveBack", key(KeyCode::KeyS)),
        (
            "strafeLeft",
            PartialCommand::new().trigger(Trigger::key(KeyCode::KeyA).negated()),
        ),
        ("strafeRight", key(KeyCode::KeyD)),
        ("floatUp", key(KeyCode::KeyE)),
        (
            "floatDown",
            PartialCommand::new().trigger(Trigger::key(KeyCode::KeyC).negated()),
        ),
        ("moveToolUp", key(KeyCode::KeyO)),
        ("moveToolDown", key(KeyCode::Period)),
        ("moveToolForwards", key(KeyCode::KeyI)),
        ("moveToolBackwards", key(KeyCode::KeyK)),
        ("moveToolLeft", key(KeyCode::KeyJ)),
        ("moveToolRight", key(KeyCode::KeyL)),
        ("rotateToolCW", key(KeyCode::KeyU)),
        ("rotateToolCCW", key(KeyCode::KeyY)),
        (
            "resetTable",
            key(KeyCode::KeyR).on_activate("resetTable").debounce(0.5),
        ),
        (
            "autoPosition",
            key(KeyCode::KeyP).on_activate("autoPosition").debounce(0.5),
        ),
        (
            "toggleMenu",
            key(KeyCode::Space).on_activate("toggleMenu").debounce(0.25),
        ),
        (
            "nextBall",
            key(KeyCode::NumpadAdd).on_activate("nextBall").debounce(0.5),
        ),
        (
            "prevBall",
            key(KeyCode::NumpadSubtract).on_activate("prevBall").debounce(0.5),
        ),
    ])
}

/// Pool game gamepad bindings
pub fn game_gamepad() -> CommandMap {
    table([
        ("strafe", stick(GamepadAxis::LeftStickX)),
        ("drive", stick(GamepadAxis::LeftStickY)),
        ("float", inverted_stick(GamepadAxis::LeftStickY)),
        ("dheading", inverted_stick(GamepadAxis::LeftStickX)),
        (
            "pitch",
            stick(GamepadAxis::LeftStickY).integrate(-FRAC_PI_2, FRAC_PI_2),
        ),
        (
            "toggleFloatMode",
            button(GamepadButton::LeftStick)
                .on_activate("floatModeOn")
                .on_deactivate("floatModeOff"),
        ),
        ("toolStrafe", stick(GamepadAxis::RightStickX)),
        ("toolDrive", stick(GamepadAxis::RightStickY)),
        ("toolFloat", inverted_stick(GamepadAxis::RightStickY)),
        (
            "toggleToolFloatMode",
            button(GamepadButton::RightStick)
                .on_activate("toolModeOn")
                .on_deactivate("toolModeOff"),
        ),
        (
            "resetVRSensor",
            button(GamepadButton::Back).on_activate("resetVRSensor").debounce(0.25),
        ),
        (
            "nextBall",
            button(GamepadButton::RightBumper).on_activate("nextBall").debounce(0.25),
        ),
        (
            "prevBall",
            button(GamepadButton::LeftBumper).on_activate("prevBall").debounce(0.25),
        ),
        (
            "autoPosition",
            button(GamepadButton::Y).on_activate("autoPosition").debounce(0.25),
        ),
        (
            "toggleMenu",
            button(GamepadButton::Start).on_activate("toggleMenu").debounce(0.25),
        ),
        (
            "saveConfig",
            button(GamepadButton::Right).on_activate("saveConfig").debounce(0.25),
        ),
    ])
}

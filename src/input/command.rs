//! Declarative Command Tables
//!
//! A command binds one or more physical triggers (keys, gamepad buttons,
//! gamepad axes) to named handlers, with timing controls. Tables are written
//! as maps from command name to a [`PartialCommand`] so that a user table can
//! override individual fields of a default table without restating the rest.
//!
//! # Merging
//!
//! - Names present in either map appear in the result.
//! - For a name present in both, each field is taken from the user entry when
//!   set there, otherwise from the default entry.
//!
//! # Example
//!
//! ```ignore
//! let mut defaults = CommandMap::new();
//! defaults.insert(
//!     "nextBall".into(),
//!     PartialCommand::new()
//!         .trigger(Trigger::key(KeyCode::NumpadAdd))
//!         .on_activate("nextBall")
//!         .debounce(0.5),
//! );
//!
//! // Rebind the key only; handler and debounce are kept
//! let mut user = CommandMap::new();
//! user.insert(
//!     "nextBall".into(),
//!     PartialCommand::new().trigger(Trigger::key(KeyCode::KeyN)),
//! );
//!
//! let table = CommandTable::build(&defaults, &user);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use winit::keyboard::KeyCode;

use crate::input::gamepad::{GamepadAxis, GamepadButton};

/// Triggers of a single command; most commands have one or two.
pub type Triggers = SmallVec<[Trigger; 2]>;

/// Name-keyed command table as written in code or in the config file.
///
/// Ordered by name so that materialised tables are deterministic.
pub type CommandMap = BTreeMap<String, PartialCommand>;

// ============================================================================
// Triggers
// ============================================================================

/// A physical input that engages a command.
///
/// `negate` flips the sign the trigger contributes to the command value. For
/// axes it also selects the direction that engages the command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Trigger {
    /// A keyboard key
    Key {
        key: KeyCode,
        #[serde(default, skip_serializing_if = "is_false")]
        negate: bool,
    },
    /// A gamepad button
    Button {
        button: GamepadButton,
        #[serde(default, skip_serializing_if = "is_false")]
        negate: bool,
    },
    /// A gamepad axis
    Axis {
        axis: GamepadAxis,
        #[serde(default, skip_serializing_if = "is_false")]
        negate: bool,
        /// Overrides the command's deadzone for this axis
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deadzone: Option<f32>,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Trigger {
    /// Trigger on a key
    pub const fn key(key: KeyCode) -> Self {
        Self::Key { key, negate: false }
    }

    /// Trigger on a gamepad button
    pub const fn button(button: GamepadButton) -> Self {
        Self::Button {
            button,
            negate: false,
        }
    }

    /// Trigger on a gamepad axis, positive direction
    pub const fn axis(axis: GamepadAxis) -> Self {
        Self::Axis {
            axis,
            negate: false,
            deadzone: None,
        }
    }

    /// Flip the sign of this trigger
    #[must_use]
    pub const fn negated(self) -> Self {
        match self {
            Self::Key { key, negate } => Self::Key {
                key,
                negate: !negate,
            },
            Self::Button { button, negate } => Self::Button {
                button,
                negate: !negate,
            },
            Self::Axis {
                axis,
                negate,
                deadzone,
            } => Self::Axis {
                axis,
                negate: !negate,
                deadzone,
            },
        }
    }

    /// `-1.0` for negated triggers, `1.0` otherwise
    pub const fn sign(&self) -> f32 {
        let negate = match self {
            Self::Key { negate, .. } | Self::Button { negate, .. } | Self::Axis { negate, .. } => {
                *negate
            }
        };
        if negate { -1.0 } else { 1.0 }
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// A command entry whose fields may each be missing.
///
/// This is the shape of both the built-in default tables and the user
/// overrides stored in the config file. Handler fields name entries of a
/// [`HandlerRegistry`](crate::input::HandlerRegistry).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Triggers>,
    #[serde(alias = "commandDown", skip_serializing_if = "Option::is_none")]
    pub on_activate: Option<String>,
    #[serde(alias = "commandUp", skip_serializing_if = "Option::is_none")]
    pub on_deactivate: Option<String>,
    /// Seconds between repeated activations while engaged
    #[serde(alias = "dt", skip_serializing_if = "Option::is_none")]
    pub debounce: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadzone: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
}

impl PartialCommand {
    /// An entry with no fields set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trigger
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.get_or_insert_with(Triggers::new).push(trigger);
        self
    }

    /// Name the handler run on activation
    #[must_use]
    pub fn on_activate(mut self, handler: impl Into<String>) -> Self {
        self.on_activate = Some(handler.into());
        self
    }

    /// Name the handler run on release
    #[must_use]
    pub fn on_deactivate(mut self, handler: impl Into<String>) -> Self {
        self.on_deactivate = Some(handler.into());
        self
    }

    /// Set the repeat interval in seconds
    #[must_use]
    pub fn debounce(mut self, seconds: f32) -> Self {
        self.debounce = Some(seconds);
        self
    }

    /// Set the deadzone applied to axis triggers without their own
    #[must_use]
    pub fn deadzone(mut self, deadzone: f32) -> Self {
        self.deadzone = Some(deadzone);
        self
    }

    /// Accumulate the axis value over time, clamped to `[min, max]`
    #[must_use]
    pub fn integrate(mut self, min: f32, max: f32) -> Self {
        self.integrate = Some(true);
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Field-wise merge: every field set in `overrides` wins.
    #[must_use]
    pub fn merged_with(&self, overrides: &PartialCommand) -> PartialCommand {
        PartialCommand {
            triggers: overrides.triggers.clone().or_else(|| self.triggers.clone()),
            on_activate: overrides
                .on_activate
                .clone()
                .or_else(|| self.on_activate.clone()),
            on_deactivate: overrides
                .on_deactivate
                .clone()
                .or_else(|| self.on_deactivate.clone()),
            debounce: overrides.debounce.or(self.debounce),
            deadzone: overrides.deadzone.or(self.deadzone),
            integrate: overrides.integrate.or(self.integrate),
            min: overrides.min.or(self.min),
            max: overrides.max.or(self.max),
        }
    }
}

/// A complete, named command ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    /// Unique within its table
    pub name: String,
    /// Inputs that engage the command; may be empty
    pub triggers: Triggers,
    /// Handler run on press and on each repeat
    pub on_activate: Option<String>,
    /// Handler run on release
    pub on_deactivate: Option<String>,
    /// Seconds between activations; zero fires every tick while engaged
    pub debounce: f32,
    /// Default deadzone for axis triggers
    pub deadzone: f32,
    /// Accumulate instead of reading the instantaneous value
    pub integrate: bool,
    /// Lower clamp on the command value
    pub min: Option<f32>,
    /// Upper clamp on the command value
    pub max: Option<f32>,
}

impl CommandDescriptor {
    /// Fill missing fields with their neutral values.
    ///
    /// Entries without triggers are accepted; they simply never engage.
    pub fn from_partial(name: impl Into<String>, partial: PartialCommand) -> Self {
        Self {
            name: name.into(),
            triggers: partial.triggers.unwrap_or_default(),
            on_activate: partial.on_activate,
            on_deactivate: partial.on_deactivate,
            debounce: partial.debounce.unwrap_or(0.0).max(0.0),
            deadzone: partial.deadzone.unwrap_or(0.0).abs(),
            integrate: partial.integrate.unwrap_or(false),
            min: partial.min,
            max: partial.max,
        }
    }

    /// Clamp `value` to the configured bounds
    pub fn clamp(&self, mut value: f32) -> f32 {
        if let Some(max) = self.max {
            value = value.min(max);
        }
        if let Some(min) = self.min {
            value = value.max(min);
        }
        value
    }
}

// ============================================================================
// Table building
// ============================================================================

/// Merge a user table over a default table, field by field.
#[must_use]
pub fn merge_commands(defaults: &CommandMap, user: &CommandMap) -> CommandMap {
    let mut merged = defaults.clone();
    for (name, overrides) in user {
        merged
            .entry(name.clone())
            .and_modify(|base| *base = base.merged_with(overrides))
            .or_insert_with(|| overrides.clone());
    }
    merged
}

/// Materialise a map into descriptors, each carrying its key as `name`.
#[must_use]
pub fn into_descriptors(map: CommandMap) -> Vec<CommandDescriptor> {
    map.into_iter()
        .map(|(name, partial)| CommandDescriptor::from_partial(name, partial))
        .collect()
}

/// Ordered, name-unique list of commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandTable {
    commands: Vec<CommandDescriptor>,
}

impl CommandTable {
    /// Merge `user` over `defaults` and materialise the result.
    #[must_use]
    pub fn build(defaults: &CommandMap, user: &CommandMap) -> Self {
        Self::from_map(merge_commands(defaults, user))
    }

    /// Materialise a single map.
    #[must_use]
    pub fn from_map(map: CommandMap) -> Self {
        Self {
            commands: into_descriptors(map),
        }
    }

    /// Look up a command by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Index of a command by name
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.name == name)
    }

    /// Iterate over the commands in table order
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> + '_ {
        self.commands.iter()
    }

    /// All commands in table order
    #[must_use]
    pub fn as_slice(&self) -> &[CommandDescriptor] {
        &self.commands
    }

    /// Number of commands
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the table has no commands
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, PartialCommand)]) -> CommandMap {
        entries
            .iter()
            .map(|(name, cmd)| ((*name).to_string(), cmd.clone()))
            .collect()
    }

    #[test]
    fn test_merge_is_field_wise() {
        let defaults = map(&[(
            "a",
            PartialCommand::new().deadzone(1.0).debounce(2.0),
        )]);
        let user = map(&[("a", PartialCommand::new().debounce(3.0))]);

        let merged = merge_commands(&defaults, &user);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["a"].deadzone, Some(1.0));
        assert_eq!(merged["a"].debounce, Some(3.0));
    }

    #[test]
    fn test_merge_keeps_disjoint_names() {
        let a = PartialCommand::new().trigger(Trigger::key(KeyCode::KeyA));
        let b = PartialCommand::new().trigger(Trigger::key(KeyCode::KeyB));
        let defaults = map(&[("a", a.clone())]);
        let user = map(&[("b", b.clone())]);

        let merged = merge_commands(&defaults, &user);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["a"], a);
        assert_eq!(merged["b"], b);
    }

    #[test]
    fn test_merge_with_empty_user_is_identity() {
        let defaults = map(&[
            ("x", PartialCommand::new().on_activate("x").debounce(0.25)),
            ("y", PartialCommand::new().integrate(-1.0, 1.0)),
        ]);

        let table = CommandTable::build(&defaults, &CommandMap::new());

        assert_eq!(table, CommandTable::from_map(defaults));
    }

    #[test]
    fn test_override_triggers_keep_handler() {
        let defaults = map(&[(
            "nextBall",
            PartialCommand::new()
                .trigger(Trigger::key(KeyCode::NumpadAdd))
                .on_activate("nextBall")
                .debounce(0.5),
        )]);
        let user = map(&[(
            "nextBall",
            PartialCommand::new().trigger(Trigger::key(KeyCode::KeyN)),
        )]);

        let table = CommandTable::build(&defaults, &user);
        let cmd = table.get("nextBall").unwrap();

        assert_eq!(cmd.triggers.as_slice(), &[Trigger::key(KeyCode::KeyN)]);
        assert_eq!(cmd.on_activate.as_deref(), Some("nextBall"));
        assert_eq!(cmd.debounce, 0.5);
    }

    #[test]
    fn test_descriptors_carry_their_names_in_order() {
        let descriptors = into_descriptors(map(&[
            ("foo", PartialCommand::new()),
            ("bar", PartialCommand::new()),
        ]));

        let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["bar", "foo"]);
    }

    #[test]
    fn test_missing_triggers_are_accepted() {
        let table = CommandTable::from_map(map(&[("idle", PartialCommand::new())]));
        let cmd = table.get("idle").unwrap();
        assert!(cmd.triggers.is_empty());
        assert_eq!(cmd.debounce, 0.0);
        assert!(!cmd.integrate);
    }

    #[test]
    fn test_user_table_from_json() {
        let json = r#"{
            "toggleMenu": { "triggers": [{ "key": "KeyM" }], "dt": 0.5 },
            "pitch": { "triggers": [{ "axis": "RightStickY", "negate": true, "deadzone": 0.1 }] },
            "toggleFloatMode": { "commandDown": "floatModeOn", "commandUp": "floatModeOff" }
        }"#;

        let user: CommandMap = serde_json::from_str(json).unwrap();

        assert_eq!(
            user["toggleMenu"].triggers.as_deref(),
            Some(&[Trigger::key(KeyCode::KeyM)][..])
        );
        assert_eq!(user["toggleMenu"].debounce, Some(0.5));
        assert_eq!(
            user["pitch"].triggers.as_deref(),
            Some(
                &[Trigger::Axis {
                    axis: GamepadAxis::RightStickY,
                    negate: true,
                    deadzone: Some(0.1),
                }][..]
            )
        );
        assert_eq!(user["toggleFloatMode"].on_activate.as_deref(), Some("floatModeOn"));
        assert_eq!(user["toggleFloatMode"].on_deactivate.as_deref(), Some("floatModeOff"));
    }

    #[test]
    fn test_trigger_sign() {
        assert_eq!(Trigger::key(KeyCode::KeyW).sign(), 1.0);
        assert_eq!(Trigger::key(KeyCode::KeyW).negated().sign(), -1.0);
        assert_eq!(Trigger::button(GamepadButton::A).negated().negated().sign(), 1.0);
    }

    #[test]
    fn test_clamp_bounds() {
        let cmd = CommandDescriptor::from_partial("p", PartialCommand::new().integrate(-1.0, 1.0));
        assert_eq!(cmd.clamp(2.0), 1.0);
        assert_eq!(cmd.clamp(-2.0), -1.0);
        assert_eq!(cmd.clamp(0.5), 0.5);
    }
}

//! Per-tick command dispatch
//!
//! The dispatcher walks a [`CommandTable`] once per frame, evaluates each
//! command's triggers against a [`DeviceState`] snapshot and runs the bound
//! handlers on the application context.
//!
//! # Timing
//!
//! - Press: `on_activate` runs when a command engages, provided `debounce`
//!   seconds have passed since its last activation. The clock keeps running
//!   while the command is released and starts saturated.
//! - Hold: while engaged, `on_activate` runs again every `debounce` seconds.
//!   A zero debounce runs it every tick.
//! - Release: `on_deactivate` runs immediately, whatever the debounce.
//! - Integrating commands never activate; their value accumulates
//!   `axis * dt` within `[min, max]`.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::input::command::{CommandDescriptor, CommandTable, Trigger};
use crate::input::state::DeviceState;

/// A command handler. The context is passed in explicitly.
pub type Handler<C> = fn(&mut C);

// ============================================================================
// Handler Registry
// ============================================================================

/// Named handlers that command tables refer to.
pub struct HandlerRegistry<C> {
    handlers: FxHashMap<String, Handler<C>>,
}

impl<C> HandlerRegistry<C> {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }

    /// Register a handler, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler<C>) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Look up a handler by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Handler<C>> {
        self.handlers.get(name).copied()
    }

    /// Whether a handler is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<C> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for HandlerRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct CommandState {
    engaged: bool,
    /// Seconds since the last activation
    since_activation: f32,
    value: f32,
}

impl Default for CommandState {
    fn default() -> Self {
        Self {
            engaged: false,
            since_activation: f32::INFINITY,
            value: 0.0,
        }
    }
}

/// Runs a command table against device state, one tick at a time.
pub struct Dispatcher<C> {
    table: CommandTable,
    states: Vec<CommandState>,
    /// Resolved `on_activate` handlers, by table index
    activate: Vec<Option<Handler<C>>>,
    /// Resolved `on_deactivate` handlers, by table index
    deactivate: Vec<Option<Handler<C>>>,
}

impl<C> Dispatcher<C> {
    /// Resolve the table's handler names against `handlers`.
    ///
    /// Names with no registered handler are logged and behave as absent.
    pub fn new(table: CommandTable, handlers: &HandlerRegistry<C>) -> Self {
        let resolve = |cmd: &CommandDescriptor, name: &Option<String>| {
            let name = name.as_deref()?;
            let handler = handlers.get(name);
            if handler.is_none() {
                log::warn!("command '{}' refers to unknown handler '{name}'", cmd.name);
            }
            handler
        };

        let activate = table.iter().map(|c| resolve(c, &c.on_activate)).collect();
        let deactivate = table.iter().map(|c| resolve(c, &c.on_deactivate)).collect();
        let states = vec![CommandState::default(); table.len()];

        Self {
            table,
            states,
            activate,
            deactivate,
        }
    }

    /// Evaluate every command once and run the handlers that fire.
    pub fn tick(&mut self, devices: &DeviceState, dt: f32, ctx: &mut C) {
        for (index, cmd) in self.table.as_slice().iter().enumerate() {
            let (engaged, raw) = evaluate(cmd, devices);
            let state = &mut self.states[index];

            if cmd.integrate {
                state.value = cmd.clamp(state.value + raw * dt);
                state.engaged = engaged;
                continue;
            }

            state.value = cmd.clamp(raw);
            state.since_activation += dt;

            match (state.engaged, engaged) {
                (false, true) => {
                    state.engaged = true;
                    if state.since_activation >= cmd.debounce {
                        state.since_activation = 0.0;
                        log::debug!("command '{}' activated", cmd.name);
                        if let Some(handler) = self.activate[index] {
                            handler(ctx);
                        }
                    }
                }
                (true, true) => {
                    if state.since_activation >= cmd.debounce {
                        state.since_activation = 0.0;
                        if let Some(handler) = self.activate[index] {
                            handler(ctx);
                        }
                    }
                }
                (true, false) => {
                    state.engaged = false;
                    log::debug!("command '{}' released", cmd.name);
                    if let Some(handler) = self.deactivate[index] {
                        handler(ctx);
                    }
                }
                (false, false) => {}
            }
        }
    }

    /// Current value of a command; zero for unknown names.
    ///
    /// For integrating commands this is the accumulated scalar, otherwise the
    /// signed sum of the engaged triggers this tick.
    #[must_use]
    pub fn value(&self, name: &str) -> f32 {
        self.table
            .position(name)
            .map(|i| self.states[i].value)
            .unwrap_or(0.0)
    }

    /// Whether a command's triggers were satisfied on the last tick
    #[must_use]
    pub fn is_engaged(&self, name: &str) -> bool {
        self.table
            .position(name)
            .is_some_and(|i| self.states[i].engaged)
    }

    /// Forget engagement, timers and accumulated values
    pub fn reset(&mut self) {
        self.states.fill(CommandState::default());
    }

    /// The table being dispatched
    #[must_use]
    pub fn table(&self) -> &CommandTable {
        &self.table
    }
}

impl<C> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.table.len())
            .field("states", &self.states)
            .finish()
    }
}

/// Whether any trigger engages the command, and the signed sum of their values.
fn evaluate(cmd: &CommandDescriptor, devices: &DeviceState) -> (bool, f32) {
    let mut engaged = false;
    let mut value = 0.0;

    for trigger in &cmd.triggers {
        match *trigger {
            Trigger::Key { key, .. } => {
                if devices.is_key_pressed(key) {
                    engaged = true;
                    value += trigger.sign();
                }
            }
            Trigger::Button { button, .. } => {
                if devices.is_button_pressed(button) {
                    engaged = true;
                    value += trigger.sign();
                }
            }
            Trigger::Axis { axis, deadzone, .. } => {
                let deadzone = deadzone.map_or(cmd.deadzone, f32::abs);
                let directed = trigger.sign() * devices.axis(axis);
                if directed.abs() > deadzone {
                    value += directed;
                    engaged |= directed > 0.0;
                }
            }
        }
    }

    (engaged, value)
}

// ============================================================================
// Tests
// ============================================================================

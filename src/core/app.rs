//! Session state and the per-frame update
//!
//! Frame order:
//! 1. Buffered device events become the new device snapshot
//! 2. Keyboard commands run, then gamepad commands
//! 3. Continuous command values move the avatar and the cue
//! 4. Physics steps

use glam::Vec3;

use crate::core::actions;
use crate::core::avatar::{Avatar, CameraPose, Motion, ToolPose};
use crate::core::config::{Config, ConfigManager, StartupOverrides};
use crate::input::{
    CommandMap, CommandTable, DeviceState, Dispatcher, HandlerRegistry, InputQueue, bindings,
    merge_commands,
};
use crate::physics::TablePhysics;

/// Distance kept from the selected ball by `autoPosition`
const AUTO_POSITION_DISTANCE: f32 = 0.9;

/// Everything command handlers can touch.
#[derive(Debug)]
pub struct AppContext {
    /// Live configuration, saved by `saveConfig`
    pub config: Config,
    /// Store the configuration is loaded from and saved to
    pub config_manager: ConfigManager,
    /// Player body
    pub avatar: Avatar,
    /// Cue pose relative to the avatar
    pub tool: ToolPose,
    /// Head pose from the VR sensor
    pub camera: CameraPose,
    /// Whether the VR sensor drives the camera; off at startup
    pub vr_controls_enabled: bool,
    /// Times the VR sensor was recentred
    pub vr_sensor_resets: u32,
    /// Wireframe rendering flag
    pub wireframe: bool,
    /// Whether the in-game menu is shown
    pub menu_visible: bool,
    /// Ball targeted by `autoPosition`
    pub selected_ball: usize,
    /// Table and balls
    pub physics: TablePhysics,
}

impl AppContext {
    /// Build the session from an already loaded configuration
    pub fn new(config: Config, config_manager: ConfigManager) -> Self {
        let avatar = Avatar::at(config.vec3_or("initialPosition", Vec3::new(0.0, 1.0, 1.86)));
        let tool = ToolPose {
            offset: config
                .tool_vec3("toolOffset")
                .unwrap_or(Vec3::new(0.0, -0.42, -0.4)),
            rotation: config
                .tool_option("toolRotation")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(0.0) as f32,
        };
        let physics = TablePhysics::from_config(&config);

        Self {
            config,
            config_manager,
            avatar,
            tool,
            camera: CameraPose::default(),
            vr_controls_enabled: false,
            vr_sensor_resets: 0,
            wireframe: false,
            menu_visible: false,
            selected_ball: 0,
            physics,
        }
    }

    /// Move the selection by `step` balls, wrapping around the rack
    pub fn select_ball(&mut self, step: isize) {
        let count = self.physics.ball_count();
        if count == 0 {
            return;
        }
        self.selected_ball = (self.selected_ball as isize + step).rem_euclid(count as isize) as usize;
        log::info!("selected ball {}", self.selected_ball);
    }

    /// Stand behind the selected ball, facing it
    pub fn auto_position(&mut self) {
        let Some(target) = self.physics.ball_position(self.selected_ball) else {
            return;
        };
        let eye_height = self
            .config
            .vec3_or("initialPosition", Vec3::new(0.0, 1.0, 1.86))
            .y;
        self.avatar
            .look_at_from_outside(target, AUTO_POSITION_DISTANCE, eye_height);
        log::info!("auto-positioned at {:?}", self.avatar.position);
    }

    /// Record the cue pose and write the configuration to its store.
    ///
    /// Failures are logged; the session keeps running either way.
    pub fn save_config(&mut self) {
        self.config
            .record_tool_pose(self.tool.offset, self.tool.rotation);
        if let Err(e) = self.config_manager.save(&self.config) {
            log::error!(
                "failed to save configuration '{}': {e}",
                self.config_manager.name()
            );
        }
    }
}

/// Layer the shell table, the game table and the user's overrides
fn layered(shell: CommandMap, game: CommandMap, user: CommandMap) -> CommandTable {
    CommandTable::build(&merge_commands(&shell, &game), &user)
}

/// One running session: context, device state and both dispatchers.
#[derive(Debug)]
pub struct App {
    ctx: AppContext,
    devices: DeviceState,
    queue: InputQueue,
    keyboard: Dispatcher<AppContext>,
    gamepad: Dispatcher<AppContext>,
    started: bool,
}

impl App {
    /// Defaults, then the stored copy, then startup overrides
    pub fn load(manager: ConfigManager, overrides: &StartupOverrides) -> Self {
        let mut config = Config::defaults();
        manager.load_into(&mut config);
        overrides.apply(&mut config);
        Self::new(config, manager)
    }

    /// Build the session around `config`.
    ///
    /// User command tables are read from `keyboardCommands` and
    /// `gamepadCommands`.
    pub fn new(mut config: Config, manager: ConfigManager) -> Self {
        config.normalize();
        let handlers: HandlerRegistry<AppContext> = actions::registry();

        let keyboard = layered(
            bindings::shell_keyboard(),
            bindings::game_keyboard(),
            config.command_overrides("keyboardCommands"),
        );
        let gamepad = layered(
            bindings::shell_gamepad(),
            bindings::game_gamepad(),
            config.command_overrides("gamepadCommands"),
        );
        log::info!(
            "command tables: {} keyboard, {} gamepad",
            keyboard.len(),
            gamepad.len()
        );

        Self {
            keyboard: Dispatcher::new(keyboard, &handlers),
            gamepad: Dispatcher::new(gamepad, &handlers),
            ctx: AppContext::new(config, manager),
            devices: DeviceState::new(),
            queue: InputQueue::with_capacity(64),
            started: false,
        }
    }

    /// Settle the rack before the first frame
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.ctx.physics.settle();
        self.started = true;
        log::info!("session started");
    }

    /// Advance one frame of `dt` seconds
    pub fn frame(&mut self, dt: f32) {
        if !self.started {
            self.start();
        }

        self.queue.swap();
        for event in self.queue.drain() {
            self.devices.apply(event);
        }

        self.keyboard.tick(&self.devices, dt, &mut self.ctx);
        self.gamepad.tick(&self.devices, dt, &mut self.ctx);

        let motion = Motion::read(&self.keyboard, &self.gamepad, &self.ctx.avatar);
        self.ctx.avatar.apply(&motion, dt);
        self.ctx.tool.apply(&motion, dt);

        self.ctx.physics.step(dt);
    }

    /// Where device callbacks push events
    pub fn input_queue(&mut self) -> &mut InputQueue {
        &mut self.queue
    }

    /// Session state
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Session state, mutably
    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    /// Device snapshot from the last frame
    pub fn devices(&self) -> &DeviceState {
        &self.devices
    }

    /// Keyboard command dispatcher
    pub fn keyboard(&self) -> &Dispatcher<AppContext> {
        &self.keyboard
    }

    /// Gamepad command dispatcher
    pub fn gamepad(&self) -> &Dispatcher<AppContext> {
        &self.gamepad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_CONFIG_NAME;
    use crate::core::store::{ConfigStore, FileStore, MemoryStore};
    use crate::input::{GamepadButton, InputEvent};
    use serde_json::json;
    use winit::keyboard::KeyCode;

    fn app() -> App {
        let manager = ConfigManager::new(DEFAULT_CONFIG_NAME, Box::new(MemoryStore::new()));
        let mut app = App::new(Config::defaults(), manager);
        // Skip settling; tests only need the rack in place
        app.started = true;
        app
    }

    fn key(app: &mut App, key: KeyCode, pressed: bool) {
        app.input_queue().push(InputEvent::Key { key, pressed });
    }

    #[test]
    fn test_events_apply_at_next_frame() {
        let mut app = app();
        key(&mut app, KeyCode::Digit0, true);
        assert!(!app.devices().is_key_pressed(KeyCode::Digit0));

        app.frame(0.016);
        assert!(app.devices().is_key_pressed(KeyCode::Digit0));
        assert!(app.context().wireframe);
    }

    #[test]
    fn test_toggle_is_debounced_while_held() {
        let mut app = app();
        key(&mut app, KeyCode::Digit0, true);

        // Five frames of 0.05s: one activation, the next is due at 0.25s
        for _ in 0..5 {
            app.frame(0.05);
        }
        assert!(app.context().wireframe);

        key(&mut app, KeyCode::Digit0, false);
        app.frame(0.05);
        assert!(app.context().wireframe);
        assert!(!app.keyboard().is_engaged("toggleWireframe"));
    }

    #[test]
    fn test_ball_selection_wraps() {
        let mut app = app();
        key(&mut app, KeyCode::NumpadSubtract, true);
        app.frame(0.016);

        assert_eq!(app.context().selected_ball, app.context().physics.ball_count() - 1);
    }

    #[test]
    fn test_gamepad_bumper_selects_next_ball() {
        let mut app = app();
        app.input_queue().push(InputEvent::GamepadConnected {
            id: 3,
            name: "pad".into(),
        });
        app.input_queue().push(InputEvent::Button {
            id: 3,
            button: GamepadButton::RightBumper,
            pressed: true,
        });
        app.frame(0.016);

        assert_eq!(app.context().selected_ball, 1);
    }

    #[test]
    fn test_left_stick_click_holds_float_mode() {
        let mut app = app();
        let click = |pressed| InputEvent::Button {
            id: 0,
            button: GamepadButton::LeftStick,
            pressed,
        };

        app.input_queue().push(click(true));
        app.frame(0.016);
        assert!(app.context().avatar.float_mode);

        app.input_queue().push(click(false));
        app.frame(0.016);
        assert!(!app.context().avatar.float_mode);
    }

    #[test]
    fn test_user_table_rebinds_key() {
        let mut config = Config::defaults();
        config.set(
            "keyboardCommands",
            json!({ "toggleWireframe": { "triggers": [{ "key": "KeyX" }] } }),
        );
        let manager = ConfigManager::new(DEFAULT_CONFIG_NAME, Box::new(MemoryStore::new()));
        let mut app = App::new(config, manager);
        app.started = true;

        key(&mut app, KeyCode::Digit0, true);
        app.frame(0.016);
        assert!(!app.context().wireframe, "old binding replaced");

        key(&mut app, KeyCode::KeyX, true);
        app.frame(0.016);
        assert!(app.context().wireframe);

        let cmd = app.keyboard().table().get("toggleWireframe").unwrap();
        assert_eq!(cmd.on_activate.as_deref(), Some("toggleWireframe"));
        assert_eq!(cmd.debounce, 0.25);
    }

    #[test]
    fn test_driving_moves_avatar() {
        let mut app = app();
        let start = app.context().avatar.position;
        key(&mut app, KeyCode::KeyW, true);
        for _ in 0..10 {
            app.frame(0.05);
        }

        assert!(app.context().avatar.position.z < start.z);
    }

    #[test]
    fn test_load_applies_stored_then_overrides() {
        let mut store = MemoryStore::new();
        store
            .write(DEFAULT_CONFIG_NAME, r#"{"gravity": 1.62, "synthSpeakerVolume": 0.5}"#)
            .unwrap();
        let manager = ConfigManager::new(DEFAULT_CONFIG_NAME, Box::new(store));
        let overrides = StartupOverrides {
            synth_speaker_volume: Some(0.1),
            ..Default::default()
        };

        let app = App::load(manager, &overrides);
        let config = &app.context().config;

        assert_eq!(config.get("gravity"), Some(&json!(1.62)));
        assert_eq!(config.get("synthSpeakerVolume"), Some(&json!(0.1)));
    }

    #[test]
    fn test_save_records_tool_pose() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::new(DEFAULT_CONFIG_NAME, Box::new(FileStore::new(tmp.path())));
        let mut app = App::new(Config::defaults(), manager);
        app.started = true;

        app.context_mut().tool.rotation = 0.5;
        app.context_mut().save_config();

        let reloaded = ConfigManager::new(DEFAULT_CONFIG_NAME, Box::new(FileStore::new(tmp.path())));
        let mut config = Config::defaults();
        assert!(reloaded.load_into(&mut config) > 0);
        assert_eq!(config.tool_option("toolRotation"), Some(&json!(0.5)));
    }

    #[test]
    fn test_auto_position_faces_selected_ball() {
        let mut app = app();
        app.context_mut().auto_position();

        let ctx = app.context();
        let ball = ctx.physics.ball_position(0).unwrap();
        let to_ball = (ball - ctx.avatar.position).with_y(0.0).normalize();
        assert!(ctx.avatar.forward().dot(to_ball) > 0.999);
    }
}

//! Built-in command handlers
//!
//! Command tables name these handlers through `onActivate` and
//! `onDeactivate`; [`registry`] maps the names to functions.

use crate::core::app::AppContext;
use crate::core::avatar::CameraPose;
use crate::input::HandlerRegistry;

/// Every handler the default tables refer to
pub fn registry() -> HandlerRegistry<AppContext> {
    let mut handlers = HandlerRegistry::new();
    handlers
        .register("toggleVRControls", toggle_vr_controls)
        .register("toggleWireframe", toggle_wireframe)
        .register("resetVRSensor", reset_vr_sensor)
        .register("resetTable", reset_table)
        .register("autoPosition", auto_position)
        .register("toggleMenu", toggle_menu)
        .register("nextBall", next_ball)
        .register("prevBall", prev_ball)
        .register("saveConfig", save_config)
        .register("floatModeOn", float_mode_on)
        .register("floatModeOff", float_mode_off)
        .register("toolModeOn", tool_mode_on)
        .register("toolModeOff", tool_mode_off);
    handlers
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn toggle_vr_controls(ctx: &mut AppContext) {
    ctx.vr_controls_enabled = !ctx.vr_controls_enabled;
    if !ctx.vr_controls_enabled {
        ctx.camera = CameraPose::default();
    }
    log::info!("VR controls {}", on_off(ctx.vr_controls_enabled));
}

fn toggle_wireframe(ctx: &mut AppContext) {
    ctx.wireframe = !ctx.wireframe;
    log::info!("wireframe {}", on_off(ctx.wireframe));
}

fn reset_vr_sensor(ctx: &mut AppContext) {
    ctx.camera = CameraPose::default();
    ctx.vr_sensor_resets += 1;
    log::info!("VR sensor reset");
}

fn reset_table(ctx: &mut AppContext) {
    ctx.physics.reset();
}

fn auto_position(ctx: &mut AppContext) {
    ctx.auto_position();
}

fn toggle_menu(ctx: &mut AppContext) {
    ctx.menu_visible = !ctx.menu_visible;
    log::debug!("menu {}", on_off(ctx.menu_visible));
}

fn next_ball(ctx: &mut AppContext) {
    ctx.select_ball(1);
}

fn prev_ball(ctx: &mut AppContext) {
    ctx.select_ball(-1);
}

fn save_config(ctx: &mut AppContext) {
    ctx.save_config();
}

fn float_mode_on(ctx: &mut AppContext) {
    ctx.avatar.float_mode = true;
}

fn float_mode_off(ctx: &mut AppContext) {
    ctx.avatar.float_mode = false;
}

fn tool_mode_on(ctx: &mut AppContext) {
    ctx.avatar.tool_mode = true;
}

fn tool_mode_off(ctx: &mut AppContext) {
    ctx.avatar.tool_mode = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, ConfigManager, DEFAULT_CONFIG_NAME};
    use crate::core::store::MemoryStore;
    use crate::input::{CommandTable, bindings};
    use glam::{Quat, Vec3};

    fn context() -> AppContext {
        let manager = ConfigManager::new(DEFAULT_CONFIG_NAME, Box::new(MemoryStore::new()));
        AppContext::new(Config::defaults(), manager)
    }

    #[test]
    fn test_default_tables_only_name_registered_handlers() {
        let handlers = registry();
        let maps = [
            bindings::shell_keyboard(),
            bindings::shell_gamepad(),
            bindings::game_keyboard(),
            bindings::game_gamepad(),
        ];
        for map in maps {
            for cmd in CommandTable::from_map(map).iter() {
                for name in [&cmd.on_activate, &cmd.on_deactivate].into_iter().flatten() {
                    assert!(handlers.contains(name), "'{}' names '{name}'", cmd.name);
                }
            }
        }
    }

    #[test]
    fn test_vr_controls_start_off_and_toggle() {
        let mut ctx = context();
        assert!(!ctx.vr_controls_enabled);

        toggle_vr_controls(&mut ctx);
        assert!(ctx.vr_controls_enabled, "first press enables");

        ctx.camera.position = Vec3::ONE;
        ctx.camera.orientation = Quat::from_rotation_y(1.0);
        toggle_vr_controls(&mut ctx);

        assert!(!ctx.vr_controls_enabled);
        assert_eq!(ctx.camera, CameraPose::default());
    }

    #[test]
    fn test_toggle_menu_flips_visibility() {
        let mut ctx = context();
        toggle_menu(&mut ctx);
        assert!(ctx.menu_visible);
        toggle_menu(&mut ctx);
        assert!(!ctx.menu_visible);
    }

    #[test]
    fn test_reset_table_restores_moved_ball() {
        let mut ctx = context();
        let start = ctx.physics.ball_position(0).unwrap();
        ctx.physics.gravity = Vec3::new(0.0, -9.81, -5.0);
        for _ in 0..30 {
            ctx.physics.step(1.0 / 60.0);
        }
        assert!(ctx.physics.ball_position(0).unwrap().distance(start) > 0.01);

        reset_table(&mut ctx);

        assert!(ctx.physics.ball_position(0).unwrap().distance(start) < 1e-5);
    }

    #[test]
    fn test_auto_position_stands_behind_selected_ball() {
        let mut ctx = context();
        next_ball(&mut ctx);
        let ball = ctx.physics.ball_position(1).unwrap();

        auto_position(&mut ctx);

        let flat = (ball - ctx.avatar.position).with_y(0.0);
        assert!((flat.length() - 0.9).abs() < 1e-4);
        assert!(ctx.avatar.forward().dot(flat.normalize()) > 0.999);
        assert_eq!(ctx.avatar.position.y, 1.0);
    }

    #[test]
    fn test_reset_vr_sensor_counts() {
        let mut ctx = context();
        reset_vr_sensor(&mut ctx);
        reset_vr_sensor(&mut ctx);
        assert_eq!(ctx.vr_sensor_resets, 2);
    }

    #[test]
    fn test_mode_handlers_pair_up() {
        let mut ctx = context();
        float_mode_on(&mut ctx);
        tool_mode_on(&mut ctx);
        assert!(ctx.avatar.float_mode && ctx.avatar.tool_mode);

        float_mode_off(&mut ctx);
        tool_mode_off(&mut ctx);
        assert!(!ctx.avatar.float_mode && !ctx.avatar.tool_mode);
    }

    #[test]
    fn test_next_and_prev_ball_wrap() {
        let mut ctx = context();
        prev_ball(&mut ctx);
        assert_eq!(ctx.selected_ball, ctx.physics.ball_count() - 1);
        next_ball(&mut ctx);
        assert_eq!(ctx.selected_ball, 0);
    }
}

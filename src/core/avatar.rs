//! Player and cue poses driven by continuous commands

use glam::{Quat, Vec3};

use crate::input::Dispatcher;

/// Metres per second at full input
const MOVE_SPEED: f32 = 1.5;

/// Radians per second at full input
const TURN_SPEED: f32 = 1.2;

/// Cue translation speed in metres per second
const TOOL_SPEED: f32 = 0.3;

/// Cue rotation speed in radians per second
const TOOL_TURN_SPEED: f32 = 1.0;

/// The player's body in the world
#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    pub position: Vec3,
    /// Yaw around +Y; zero faces -Z
    pub heading: f32,
    pub pitch: f32,
    /// Left stick strafes and floats instead of turning and driving
    pub float_mode: bool,
    /// Right stick floats the cue instead of driving it
    pub tool_mode: bool,
}

impl Avatar {
    /// An avatar standing at `position`, facing -Z
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            heading: 0.0,
            pitch: 0.0,
            float_mode: false,
            tool_mode: false,
        }
    }

    /// Body orientation
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.heading) * Quat::from_rotation_x(self.pitch)
    }

    /// Unit vector the avatar faces, ignoring pitch
    pub fn forward(&self) -> Vec3 {
        Quat::from_rotation_y(self.heading) * Vec3::NEG_Z
    }

    /// Integrate one frame of motion
    pub fn apply(&mut self, motion: &Motion, dt: f32) {
        self.heading += motion.yaw * TURN_SPEED * dt;
        let local = Vec3::new(motion.strafe, motion.float, motion.drive);
        self.position += Quat::from_rotation_y(self.heading) * local * MOVE_SPEED * dt;
        if let Some(pitch) = motion.pitch {
            self.pitch = pitch;
        }
    }

    /// Stand `distance` away from `target` on the side away from the table
    /// centre, at eye height `eye_height`, facing the target.
    pub fn look_at_from_outside(&mut self, target: Vec3, distance: f32, eye_height: f32) {
        let outward = Vec3::new(target.x, 0.0, target.z)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        self.position = Vec3::new(
            target.x + outward.x * distance,
            eye_height,
            target.z + outward.z * distance,
        );
        self.heading = outward.x.atan2(outward.z);
    }
}

/// The cue, positioned relative to the avatar
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPose {
    pub offset: Vec3,
    /// Yaw around +Y
    pub rotation: f32,
}

impl ToolPose {
    /// Integrate one frame of motion
    pub fn apply(&mut self, motion: &Motion, dt: f32) {
        self.offset += motion.tool * TOOL_SPEED * dt;
        self.rotation += motion.tool_yaw * TOOL_TURN_SPEED * dt;
    }
}

/// Head pose reported by the VR sensor, relative to the avatar
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

/// One frame of continuous input, already combined across devices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Motion {
    /// Positive turns left
    pub yaw: f32,
    /// Positive moves back
    pub drive: f32,
    /// Positive moves right
    pub strafe: f32,
    /// Positive moves up
    pub float: f32,
    /// Absolute pitch from the integrating gamepad command
    pub pitch: Option<f32>,
    /// Cue translation in avatar space
    pub tool: Vec3,
    /// Positive turns the cue counter-clockwise
    pub tool_yaw: f32,
}

impl Motion {
    /// Combine keyboard and gamepad command values.
    ///
    /// Float mode moves the left stick from turn/drive to strafe/float; tool
    /// mode moves the right stick's Y axis from drive to float.
    pub fn read<C>(
        keyboard: &Dispatcher<C>,
        gamepad: &Dispatcher<C>,
        avatar: &Avatar,
    ) -> Self {
        let kb = |name: &str| keyboard.value(name);
        let gp = |name: &str| gamepad.value(name);

        let (stick_yaw, stick_drive, stick_strafe, stick_float) = if avatar.float_mode {
            (0.0, 0.0, gp("strafe"), gp("float"))
        } else {
            (gp("dheading"), gp("drive"), 0.0, 0.0)
        };

        let (tool_drive, tool_float) = if avatar.tool_mode {
            (0.0, gp("toolFloat"))
        } else {
            (gp("toolDrive"), 0.0)
        };

        Self {
            yaw: -(kb("turnLeft") + kb("turnRight")) + stick_yaw,
            drive: kb("driveForward") + kb("driveBack") + stick_drive,
            strafe: kb("strafeLeft") + kb("strafeRight") + stick_strafe,
            float: kb("floatUp") + kb("floatDown") + stick_float,
            pitch: gamepad.table().get("pitch").map(|_| gp("pitch")),
            tool: Vec3::new(
                kb("moveToolRight") - kb("moveToolLeft") + gp("toolStrafe"),
                kb("moveToolUp") - kb("moveToolDown") + tool_float,
                kb("moveToolBackwards") - kb("moveToolForwards") + tool_drive,
            ),
            tool_yaw: kb("rotateToolCCW") - kb("rotateToolCW"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{
        CommandTable, DeviceState, GamepadAxis, HandlerRegistry, InputEvent, bindings,
    };
    use winit::keyboard::KeyCode;

    fn dispatchers() -> (Dispatcher<()>, Dispatcher<()>) {
        let handlers = HandlerRegistry::new();
        (
            Dispatcher::new(CommandTable::from_map(bindings::game_keyboard()), &handlers),
            Dispatcher::new(CommandTable::from_map(bindings::game_gamepad()), &handlers),
        )
    }

    #[test]
    fn test_forward_key_moves_along_heading() {
        let (mut kb, gp) = dispatchers();
        let mut devices = DeviceState::new();
        devices.apply(InputEvent::Key {
            key: KeyCode::KeyW,
            pressed: true,
        });
        kb.tick(&devices, 0.1, &mut ());

        let mut avatar = Avatar::at(Vec3::ZERO);
        let motion = Motion::read(&kb, &gp, &avatar);
        avatar.apply(&motion, 1.0);

        assert!(avatar.position.z < 0.0, "W drives toward -Z");
        assert!(avatar.position.x.abs() < 1e-6);
    }

    #[test]
    fn test_float_mode_reroutes_left_stick() {
        let (kb, mut gp) = dispatchers();
        let mut devices = DeviceState::new();
        devices.apply(InputEvent::Axis {
            id: 0,
            axis: GamepadAxis::LeftStickY,
            value: -1.0,
        });
        gp.tick(&devices, 0.1, &mut ());

        let mut avatar = Avatar::at(Vec3::ZERO);
        let driving = Motion::read(&kb, &gp, &avatar);
        assert_eq!(driving.drive, -1.0);
        assert_eq!(driving.float, 0.0);

        avatar.float_mode = true;
        let floating = Motion::read(&kb, &gp, &avatar);
        assert_eq!(floating.drive, 0.0);
        assert_eq!(floating.float, 1.0);
    }

    #[test]
    fn test_right_arrow_turns_right() {
        let (mut kb, gp) = dispatchers();
        let mut devices = DeviceState::new();
        devices.apply(InputEvent::Key {
            key: KeyCode::ArrowRight,
            pressed: true,
        });
        kb.tick(&devices, 0.1, &mut ());

        let mut avatar = Avatar::at(Vec3::ZERO);
        avatar.apply(&Motion::read(&kb, &gp, &avatar), 0.5);

        assert!(avatar.heading < 0.0);
        assert!(avatar.forward().x > 0.0, "turning right faces +X");
    }

    #[test]
    fn test_tool_keys_move_cue() {
        let (mut kb, gp) = dispatchers();
        let mut devices = DeviceState::new();
        for key in [KeyCode::KeyO, KeyCode::KeyL, KeyCode::KeyY] {
            devices.apply(InputEvent::Key { key, pressed: true });
        }
        kb.tick(&devices, 0.1, &mut ());

        let avatar = Avatar::at(Vec3::ZERO);
        let mut tool = ToolPose {
            offset: Vec3::ZERO,
            rotation: 0.0,
        };
        tool.apply(&Motion::read(&kb, &gp, &avatar), 1.0);

        assert!(tool.offset.x > 0.0);
        assert!(tool.offset.y > 0.0);
        assert_eq!(tool.offset.z, 0.0);
        assert!(tool.rotation > 0.0);
    }

    #[test]
    fn test_look_at_from_outside_faces_target() {
        let mut avatar = Avatar::at(Vec3::ZERO);
        let target = Vec3::new(0.2, 0.8, -0.6);

        avatar.look_at_from_outside(target, 0.9, 1.0);

        let to_target = (target - avatar.position).with_y(0.0).normalize();
        assert!(avatar.forward().dot(to_target) > 0.999);
        assert_eq!(avatar.position.y, 1.0);
    }
}

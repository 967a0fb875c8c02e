//! A VR pool game shell built in Rust
//!
//! This crate provides:
//! - Declarative keyboard and gamepad command tables with field-wise merging
//! - A per-frame dispatcher with debounce, deadzones and integrating axes
//! - Configuration persistence that only accepts known keys
//! - Pool table physics with rapier3d
//! - A winit host that drives it all

pub mod core;
pub mod input;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use rapier3d;
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{
        App, AppContext, Config, ConfigManager, Engine, EngineConfig, FileStore,
        StartupOverrides,
    };
    pub use crate::input::{
        CommandTable, Dispatcher, GamepadAxis, GamepadButton, HandlerRegistry, InputEvent,
        PartialCommand, Trigger,
    };
    pub use crate::physics::TablePhysics;
    pub use glam::{Quat, Vec3};
    pub use winit::keyboard::KeyCode;
}

//! Core session module
//!
//! Configuration and its storage, the session state that command handlers
//! act on, and the windowed host that drives it.

mod actions;
mod app;
mod avatar;
mod config;
mod engine;
mod store;
mod time;

pub use actions::registry;
pub use app::{App, AppContext};
pub use avatar::{Avatar, CameraPose, Motion, ToolPose};
pub use config::{Config, ConfigManager, DEFAULT_CONFIG_NAME, StartupOverrides, parse_setting};
pub use engine::{Engine, EngineConfig};
pub use store::{ConfigStore, FileStore, MemoryStore, StoreError};
pub use time::Time;

//! poolvr: VR pool game shell

use std::path::PathBuf;

use clap::Parser;
use poolvr::core::{
    App, ConfigManager, DEFAULT_CONFIG_NAME, Engine, EngineConfig, FileStore, StartupOverrides,
};
use poolvr::input::GamepadBackend;

#[derive(Parser, Debug)]
#[command(name = "poolvr", about = "VR pool game shell")]
struct Cli {
    /// Name of the stored configuration to load and save
    #[arg(long, default_value = DEFAULT_CONFIG_NAME)]
    config_name: String,

    /// Directory holding stored configurations
    #[arg(long, default_value = "saves")]
    config_dir: PathBuf,

    /// Cue length in metres
    #[arg(long)]
    tool_length: Option<f64>,

    /// Cue radius in metres
    #[arg(long)]
    tool_radius: Option<f64>,

    /// Cue mass in kilograms
    #[arg(long)]
    tool_mass: Option<f64>,

    /// Cue offset from the avatar, as x,y,z
    #[arg(long, value_delimiter = ',', num_args = 3, allow_negative_numbers = true)]
    tool_offset: Option<Vec<f64>>,

    /// Cue yaw in radians
    #[arg(long, allow_negative_numbers = true)]
    tool_rotation: Option<f64>,

    /// Cue tip shape
    #[arg(long)]
    tip_shape: Option<String>,

    /// Tracking server host
    #[arg(long)]
    host: Option<String>,

    /// Tracking server port
    #[arg(long)]
    port: Option<u16>,

    /// Synth speaker volume
    #[arg(long)]
    synth_speaker_volume: Option<f64>,

    /// Set a top-level configuration key, e.g. `--set useShadowMap=true`
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    settings: Vec<(String, String)>,
}

impl Cli {
    fn overrides(&self) -> StartupOverrides {
        StartupOverrides {
            tool_length: self.tool_length,
            tool_radius: self.tool_radius,
            tool_mass: self.tool_mass,
            tool_offset: self
                .tool_offset
                .as_deref()
                .and_then(|v| <[f64; 3]>::try_from(v).ok()),
            tool_rotation: self.tool_rotation,
            tip_shape: self.tip_shape.clone(),
            host: self.host.clone(),
            port: self.port,
            synth_speaker_volume: self.synth_speaker_volume,
            settings: self.settings.clone(),
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn gamepad_backend() -> Box<dyn GamepadBackend> {
    #[cfg(feature = "gilrs")]
    {
        match poolvr::input::GilrsBackend::new() {
            Ok(backend) => return Box::new(backend),
            Err(e) => log::warn!("gamepad support unavailable: {e}"),
        }
    }
    Box::new(poolvr::input::NullBackend)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let store = FileStore::new(&cli.config_dir);
    let manager = ConfigManager::new(cli.config_name.clone(), Box::new(store));
    let app = App::load(manager, &cli.overrides());

    let config = EngineConfig::default().with_title(format!("poolvr - {}", cli.config_name));
    Engine::new(config, app, gamepad_backend()).run()
}

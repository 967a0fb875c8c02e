//! Session configuration and its persistence
//!
//! The configuration is a JSON object with a fixed set of known keys. Stored
//! copies may only update those keys: anything else in a stored file is
//! skipped, so stale or foreign entries never reach the running session.

use glam::Vec3;
use serde_json::{Map, Value, json};

use crate::core::store::{ConfigStore, StoreError};
use crate::input::CommandMap;

/// Name used when no configuration name is given at startup
pub const DEFAULT_CONFIG_NAME: &str = "default";

const INCH_TO_METER: f64 = 0.0254;

/// In-memory configuration of one session
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Built-in defaults; these also define the set of known keys.
    pub fn defaults() -> Self {
        let values = json!({
            "gravity": 9.81,
            "useBasicMaterials": true,
            "useShadowMap": false,
            "useSpotLight": true,
            "usePointLight": false,
            "useTextGeomLogger": true,
            "L_table": 2.3368,
            "H_table": 0.77,
            "ball_diameter": 2.25 * INCH_TO_METER,
            "soundVolume": 0.0,
            "synthSpeakerVolume": 0.25,
            "initialPosition": [0.0, 1.0, 1.86],
            "toolOptions": {
                "tipShape": "Cylinder",
                "numSegments": 8,
                "toolRadius": 0.009,
                "tipRadius": 0.009,
                "toolLength": 0.37,
                "tipLength": 0.37,
                "toolMass": 0.54,
                "toolOffset": [0.0, -0.42, -0.4],
                "toolRotation": 0.0,
                "interactionPlaneOpacity": 0.22,
                "useImplicitCylinder": true,
                "host": null,
                "port": null
            },
            "keyboardCommands": {},
            "gamepadCommands": {}
        });

        match values {
            Value::Object(values) => Self { values },
            _ => Self { values: Map::new() },
        }
    }

    /// Raw access to the whole object
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Look up a top-level value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether `key` is a known key
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Known keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Replace the value of a known key. Returns `false` for unknown keys.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> bool {
        match self.values.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Numeric value as `f32`
    pub fn f32(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(Value::as_f64).map(|v| v as f32)
    }

    /// Numeric value, or `fallback` when missing or not a number
    pub fn f32_or(&self, key: &str, fallback: f32) -> f32 {
        self.f32(key).unwrap_or(fallback)
    }

    /// Boolean value, or `fallback` when missing or not a boolean
    pub fn bool_or(&self, key: &str, fallback: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(fallback)
    }

    /// Three-number array as a vector, or `fallback`
    pub fn vec3_or(&self, key: &str, fallback: Vec3) -> Vec3 {
        self.get(key).and_then(value_to_vec3).unwrap_or(fallback)
    }

    /// Look up an entry of `toolOptions`
    pub fn tool_option(&self, key: &str) -> Option<&Value> {
        self.get("toolOptions")?.get(key)
    }

    /// Set an entry of `toolOptions`, creating the object if needed.
    pub fn set_tool_option(&mut self, key: &str, value: impl Into<Value>) {
        let options = self
            .values
            .entry("toolOptions")
            .or_insert_with(|| Value::Object(Map::new()));
        if !options.is_object() {
            *options = Value::Object(Map::new());
        }
        if let Value::Object(options) = options {
            options.insert(key.to_string(), value.into());
        }
    }

    /// A `[x, y, z]` entry under `toolOptions`
    pub fn tool_vec3(&self, key: &str) -> Option<Vec3> {
        self.tool_option(key).and_then(value_to_vec3)
    }

    /// Store the cue pose under `toolOptions` so it survives a save.
    pub fn record_tool_pose(&mut self, offset: Vec3, rotation: f32) {
        self.set_tool_option("toolOffset", json!([offset.x, offset.y, offset.z]));
        self.set_tool_option("toolRotation", rotation);
    }

    /// Copy stored values over known keys; unknown keys are skipped.
    ///
    /// Returns the number of keys taken from `stored`.
    pub fn merge_known(&mut self, stored: Map<String, Value>) -> usize {
        let mut accepted = 0;
        for (key, value) in stored {
            match self.values.get_mut(&key) {
                Some(slot) => {
                    *slot = value;
                    accepted += 1;
                }
                None => log::debug!("ignoring unknown configuration key '{key}'"),
            }
        }
        accepted
    }

    /// Resolve options that depend on each other.
    pub fn normalize(&mut self) {
        if self.bool_or("useShadowMap", false) {
            self.set("useBasicMaterials", false);
        }
    }

    /// User command overrides stored under `key` (e.g. `keyboardCommands`).
    ///
    /// A malformed table is logged and treated as empty.
    pub fn command_overrides(&self, key: &str) -> CommandMap {
        let Some(value) = self.get(key) else {
            return CommandMap::new();
        };
        match serde_json::from_value(value.clone()) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("ignoring malformed '{key}' table: {e}");
                CommandMap::new()
            }
        }
    }

    /// Pretty-printed JSON
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.values)
    }
}

fn value_to_vec3(value: &Value) -> Option<Vec3> {
    match value.as_array()?.as_slice() {
        [x, y, z] => Some(Vec3::new(
            x.as_f64()? as f32,
            y.as_f64()? as f32,
            z.as_f64()? as f32,
        )),
        _ => None,
    }
}

// ============================================================================
// Startup overrides
// ============================================================================

/// Values given on the command line; they win over stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupOverrides {
    pub tool_length: Option<f64>,
    pub tool_radius: Option<f64>,
    pub tool_mass: Option<f64>,
    pub tool_offset: Option<[f64; 3]>,
    pub tool_rotation: Option<f64>,
    pub tip_shape: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub synth_speaker_volume: Option<f64>,
    /// Free-form `key=value` assignments to known top-level keys
    pub settings: Vec<(String, String)>,
}

impl StartupOverrides {
    /// Apply every given override to `config`.
    pub fn apply(&self, config: &mut Config) {
        let tool_numbers = [
            ("toolLength", self.tool_length),
            ("toolRadius", self.tool_radius),
            ("toolMass", self.tool_mass),
            ("toolRotation", self.tool_rotation),
        ];
        for (key, value) in tool_numbers {
            if let Some(value) = value {
                config.set_tool_option(key, value);
            }
        }
        if let Some(offset) = self.tool_offset {
            config.set_tool_option("toolOffset", json!(offset));
        }
        if let Some(shape) = &self.tip_shape {
            config.set_tool_option("tipShape", shape.as_str());
        }
        if let Some(host) = &self.host {
            config.set_tool_option("host", host.as_str());
        }
        if let Some(port) = self.port {
            config.set_tool_option("port", port);
        }
        if let Some(volume) = self.synth_speaker_volume {
            config.set("synthSpeakerVolume", volume);
        }

        for (key, raw) in &self.settings {
            if !config.set(key, parse_setting(raw)) {
                log::warn!("ignoring startup setting for unknown key '{key}'");
            }
        }
    }
}

/// `true`/`false` become booleans, numbers become numbers, JSON arrays and
/// objects are parsed, anything else stays a string.
pub fn parse_setting(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(number) = raw.parse::<f64>()
        && let Some(number) = serde_json::Number::from_f64(number)
    {
        return Value::Number(number);
    }
    if raw.starts_with(['[', '{'])
        && let Ok(value) = serde_json::from_str(raw)
    {
        return value;
    }
    Value::String(raw.to_string())
}

// ============================================================================
// Persistence
// ============================================================================

/// Loads and saves the session configuration under one name.
pub struct ConfigManager {
    name: String,
    store: Box<dyn ConfigStore>,
}

impl ConfigManager {
    /// Manage the configuration called `name` inside `store`
    pub fn new(name: impl Into<String>, store: Box<dyn ConfigStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    /// The configuration name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read and parse the stored object, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the contents are not a JSON
    /// object.
    pub fn read(&self) -> Result<Option<Map<String, Value>>, StoreError> {
        let Some(contents) = self.store.read(&self.name)? else {
            return Ok(None);
        };
        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(StoreError::NotAnObject(self.name.clone())),
        }
    }

    /// Merge the stored configuration into `config`.
    ///
    /// Never fails: a missing, unreadable or malformed stored copy leaves
    /// `config` untouched. Returns the number of keys taken from storage.
    pub fn load_into(&self, config: &mut Config) -> usize {
        match self.read() {
            Ok(Some(stored)) => {
                let accepted = config.merge_known(stored);
                log::info!("loaded configuration '{}'", self.name);
                log_pretty(config);
                accepted
            }
            Ok(None) => {
                log::info!("no stored configuration '{}', using defaults", self.name);
                0
            }
            Err(e) => {
                log::warn!(
                    "could not load configuration '{}', using defaults: {e}",
                    self.name
                );
                0
            }
        }
    }

    /// Store the whole configuration, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store fails.
    pub fn save(&mut self, config: &Config) -> Result<(), StoreError> {
        let contents = config.to_pretty_json()?;
        self.store.write(&self.name, &contents)?;
        log::info!("saved configuration '{}'", self.name);
        log::info!("{contents}");
        Ok(())
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn log_pretty(config: &Config) {
    if let Ok(pretty) = config.to_pretty_json() {
        log::info!("{pretty}");
    }
}

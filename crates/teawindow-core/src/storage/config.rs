//! TOML-based user settings.
//!
//! One flat struct enumerating every option with its default; values are
//! clamped to their valid ranges once at load, so the rest of the engine
//! never defensively re-defaults anything.
//!
//! Stored at `~/.config/teawindow/settings.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// User settings.
///
/// Serialized to/from TOML at `~/.config/teawindow/settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Work session length, minutes. Clamped to 1..=90.
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    /// Break length, minutes. Clamped to 1..=30.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    /// Daily target of completed work sessions. Clamped to 1..=12.
    #[serde(default = "default_target_today")]
    pub target_today: u32,
    #[serde(default = "default_true")]
    pub auto_start_break: bool,
    #[serde(default = "default_true")]
    pub auto_start_next_work: bool,
    /// Randomized mid-session wellness prompt.
    #[serde(default)]
    pub wellness_prompts: bool,
    /// Use computed sunrise/sunset rather than the fixed 06:00/20:00.
    #[serde(default = "default_true")]
    pub use_real_sun_times: bool,
    /// Fixed observer latitude. When both coordinates are set the
    /// location provider is never consulted.
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_target_today() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            target_today: default_target_today(),
            auto_start_break: true,
            auto_start_next_work: true,
            wellness_prompts: false,
            use_real_sun_times: true,
            latitude: None,
            longitude: None,
        }
    }
}

impl Settings {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/teawindow"),
            message: e.to_string(),
        })?;
        Ok(dir.join("settings.toml"))
    }

    /// Load from disk, writing the defaults out on first run. Loaded
    /// values are clamped to their valid ranges.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or the
    /// defaults cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let mut settings: Settings =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                settings.validate();
                Ok(settings)
            }
            Err(_) => {
                let settings = Self::default();
                settings.save()?;
                Ok(settings)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Clamp every bounded field into range.
    pub fn validate(&mut self) {
        self.work_minutes = self.work_minutes.clamp(1, 90);
        self.break_minutes = self.break_minutes.clamp(1, 30);
        self.target_today = self.target_today.clamp(1, 12);
    }

    /// Get a settings value as string by field name.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by field name, parsing `value` against the
    /// field's current type. The result is re-validated.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::ParseFailed("settings are not an object".into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let parsed = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>().map_err(
                |_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                },
            )?),
            serde_json::Value::Number(_) | serde_json::Value::Null => {
                if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else if let Ok(f) = value.parse::<f64>() {
                    serde_json::Number::from_f64(f)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: format!("cannot parse '{value}' as number"),
                        })?
                } else if value == "none" {
                    serde_json::Value::Null
                } else {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("cannot parse '{value}' as number"),
                    });
                }
            }
            serde_json::Value::String(_) => serde_json::Value::String(value.to_string()),
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "unsupported field type".into(),
                })
            }
        };
        obj.insert(key.to_string(), parsed);

        let mut next: Settings =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        next.validate();
        *self = next;
        Ok(())
    }
}

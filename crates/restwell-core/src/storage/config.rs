//! TOML-based application configuration.
//!
//! Stores:
//! - Rest calculation bounds and the countdown tick length
//! - Coaching voice preferences (language, speech rate, pitch)
//!
//! Configuration is stored at `~/.config/restwell/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::coaching::{VoiceLanguage, VoiceSettings};
use crate::error::{ConfigError, CoreError, Result, ValidationError};

/// Rest calculation and countdown configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_base_seconds")]
    pub base_seconds: u32,
    #[serde(default = "default_min_seconds")]
    pub min_seconds: u32,
    #[serde(default = "default_max_seconds")]
    pub max_seconds: u32,
    /// Length of one countdown tick in milliseconds.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

/// Coaching voice configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub language: VoiceLanguage,
    #[serde(default = "default_one")]
    pub speech_rate: f32,
    #[serde(default = "default_one")]
    pub pitch: f32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/restwell/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub coaching: CoachingConfig,
}

// Default functions
fn default_base_seconds() -> u32 {
    90
}
fn default_min_seconds() -> u32 {
    30
}
fn default_max_seconds() -> u32 {
    300
}
fn default_tick_millis() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_one() -> f32 {
    1.0
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_seconds: default_base_seconds(),
            min_seconds: default_min_seconds(),
            max_seconds: default_max_seconds(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl RestConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// # Errors
    ///
    /// Returns a validation error for a zero minimum or tick, or a minimum
    /// above the maximum.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_seconds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "rest.min_seconds".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.min_seconds > self.max_seconds {
            return Err(ValidationError::InvalidRange {
                field: "rest".into(),
                min: self.min_seconds,
                max: self.max_seconds,
            });
        }
        if self.tick_millis == 0 {
            return Err(ValidationError::InvalidValue {
                field: "rest.tick_millis".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for CoachingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: VoiceLanguage::default(),
            speech_rate: 1.0,
            pitch: 1.0,
        }
    }
}

impl CoachingConfig {
    /// Voice settings with rate and pitch clamped to the supported range.
    pub fn voice(&self) -> VoiceSettings {
        VoiceSettings::new(self.speech_rate, self.pitch)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rest: RestConfig::default(),
            coaching: CoachingConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the config file inside [`data_dir`].
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the defaults cannot
    /// be written.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config fails validation.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Config::apply`] fails or the config cannot be
    /// saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.rest.validate()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.rest.base_seconds, 90);
        assert_eq!(cfg.rest.min_seconds, 30);
        assert_eq!(cfg.rest.max_seconds, 300);
        assert_eq!(cfg.rest.tick(), Duration::from_secs(1));
        assert!(cfg.coaching.enabled);
        assert_eq!(cfg.coaching.language, VoiceLanguage::En);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str("[rest]\nmax_seconds = 180\n").unwrap();
        assert_eq!(cfg.rest.max_seconds, 180);
        assert_eq!(cfg.rest.min_seconds, 30);
        assert_eq!(cfg.coaching, CoachingConfig::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("rest.min_seconds").as_deref(), Some("30"));
        assert_eq!(cfg.get("coaching.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("coaching.language").as_deref(), Some("en"));
        assert!(cfg.get("rest.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("rest.max_seconds", "240").unwrap();
        cfg.apply("coaching.enabled", "false").unwrap();
        cfg.apply("coaching.language", "de").unwrap();
        cfg.apply("coaching.speech_rate", "1.5").unwrap();
        assert_eq!(cfg.rest.max_seconds, 240);
        assert!(!cfg.coaching.enabled);
        assert_eq!(cfg.coaching.language, VoiceLanguage::De);
        assert_eq!(cfg.coaching.speech_rate, 1.5);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.apply("rest.nonexistent", "1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("coaching.enabled", "not_a_bool").is_err());
        assert!(cfg.apply("rest.min_seconds", "abc").is_err());
        assert!(cfg.apply("coaching.language", "fr").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn apply_rejects_inverted_bounds() {
        let mut cfg = Config::default();
        let err = cfg.apply("rest.min_seconds", "400").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidRange { .. })
        ));
        assert_eq!(cfg.rest.min_seconds, 30);
    }

    #[test]
    fn validate_rejects_zero_tick() {
        let rest = RestConfig {
            tick_millis: 0,
            ..RestConfig::default()
        };
        assert!(rest.validate().is_err());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.apply("rest.tick_millis", "250").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().rest.tick_millis, 250);
    }

    #[test]
    fn load_from_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[rest\nmin_seconds = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::LoadFailed { .. })));
    }
}

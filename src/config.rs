//! Configuration system using Figment.
//!
//! Strongly-typed configuration for the application, loaded from:
//! 1. a TOML file (`config/scope.toml` by default, or an explicit path),
//! 2. environment variables prefixed with `RUST_SCOPE__`.
//!
//! Every section has serde defaults, so an absent file yields a fully
//! working demo setup. After extraction, [`AppConfig::validate`] rejects
//! values that parse but make no sense (unknown log levels, zero-sized
//! windows, duplicate device labels).

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, ScopeError};
use crate::hardware::SimulatedDeviceKind;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Application-wide settings.
    #[serde(default)]
    pub application: ApplicationSettings,
    /// Main-window settings.
    #[serde(default)]
    pub gui: GuiSettings,
    /// Simulated device roster.
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceDefinition>,
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Window and log-line title.
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

/// Main-window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuiSettings {
    /// Initial window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    /// Initial window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: f32,
    /// Whether the log panel starts visible.
    #[serde(default = "default_true")]
    pub show_log_panel: bool,
}

impl Default for GuiSettings {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            show_log_panel: true,
        }
    }
}

/// One device to load into the simulated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDefinition {
    /// Device label, unique within the session.
    pub label: String,
    /// Which simulated device to build.
    pub kind: SimulatedDeviceKind,
    /// Disabled devices stay in the file but are not loaded.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_app_name() -> String {
    "rust_scope".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_window_width() -> f32 {
    1100.0
}

fn default_window_height() -> f32 {
    720.0
}

fn default_true() -> bool {
    true
}

fn default_devices() -> Vec<DeviceDefinition> {
    [
        ("Camera", SimulatedDeviceKind::Camera),
        ("Shutter", SimulatedDeviceKind::Shutter),
        ("Stage", SimulatedDeviceKind::Stage),
    ]
    .into_iter()
    .map(|(label, kind)| DeviceDefinition {
        label: label.to_string(),
        kind,
        enabled: true,
    })
    .collect()
}

impl AppConfig {
    /// Load configuration from the default location plus environment
    /// overrides (`RUST_SCOPE__APPLICATION__LOG_LEVEL=debug` and friends).
    pub fn load() -> AppResult<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults cover everything.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("RUST_SCOPE__").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The default configuration file location: `config/scope.toml` under
    /// the user's config directory, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|base| base.join("rust_scope").join("scope.toml"))
            .unwrap_or_else(|| PathBuf::from("config/scope.toml"))
    }

    /// Reject configurations that parsed but are semantically invalid.
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ScopeError::Configuration(format!(
                "invalid log_level {:?}; must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.gui.window_width < 100.0 || self.gui.window_height < 100.0 {
            return Err(ScopeError::Configuration(format!(
                "window size {}x{} is too small",
                self.gui.window_width, self.gui.window_height
            )));
        }

        for (i, dev) in self.devices.iter().enumerate() {
            if dev.label.trim().is_empty() {
                return Err(ScopeError::Configuration(format!(
                    "device #{i} has an empty label"
                )));
            }
            if self.devices[..i].iter().any(|d| d.label == dev.label) {
                return Err(ScopeError::Configuration(format!(
                    "duplicate device label {:?}",
                    dev.label
                )));
            }
        }
        Ok(())
    }

    /// Devices that should actually be loaded.
    pub fn enabled_devices(&self) -> impl Iterator<Item = &DeviceDefinition> {
        self.devices.iter().filter(|d| d.enabled)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn defaults_stand_alone() {
        let config = AppConfig::load_from("/nonexistent/scope.toml").unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.enabled_devices().count(), 3);
    }

    #[test]
    #[serial]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [application]
            log_level = "debug"

            [[devices]]
            label = "Objective"
            kind = "generic"

            [[devices]]
            label = "Focus"
            kind = "stage"
            enabled = false
            "#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.devices.len(), 2);
        let enabled: Vec<_> = config.enabled_devices().map(|d| d.label.as_str()).collect();
        assert_eq!(enabled, vec!["Objective"]);
        assert_eq!(config.devices[1].kind, SimulatedDeviceKind::Stage);
    }

    #[test]
    #[serial]
    fn environment_overrides_the_file() {
        std::env::set_var("RUST_SCOPE__APPLICATION__LOG_LEVEL", "warn");
        let config = AppConfig::load_from("/nonexistent/scope.toml").unwrap();
        std::env::remove_var("RUST_SCOPE__APPLICATION__LOG_LEVEL");
        assert_eq!(config.application.log_level, "warn");
    }

    #[test]
    fn validation_rejects_nonsense() {
        let mut config = AppConfig::default();
        config.devices = default_devices();
        config.application.log_level = "loud".into();
        assert!(matches!(
            config.validate(),
            Err(ScopeError::Configuration(_))
        ));

        let mut config = AppConfig::default();
        config.devices = default_devices();
        config.devices.push(DeviceDefinition {
            label: "Camera".into(),
            kind: SimulatedDeviceKind::Generic,
            enabled: true,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}

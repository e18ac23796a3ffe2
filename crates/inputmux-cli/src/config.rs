//! CLI configuration loaded from TOML.

use std::path::PathBuf;

use inputmux_core::ContextConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration: the engine settings plus what the CLI itself
/// needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Device nodes opened by `watch` when none are given on the command line.
    #[serde(default)]
    pub devices: Vec<PathBuf>,
    #[serde(flatten)]
    pub context: ContextConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use inputmux_core::AccelProfile;

    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("level = \"info\""));
        assert!(toml_str.contains("initial_queue_capacity = 4"));
    }

    #[test]
    fn default_config_parses_back() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        let config: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.context.detect.len(), 6);
    }

    #[test]
    fn parse_example_config() {
        let toml_str = r#"
devices = ["/dev/sysmouse", "/dev/wskbd"]

[log]
level = "debug"

[seat]
physical = "seat0"
logical = "console"

[pointer]
accel_profile = "flat"
accel_speed = -0.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.devices,
            vec![PathBuf::from("/dev/sysmouse"), PathBuf::from("/dev/wskbd")]
        );
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.context.seat.logical, "console");
        assert_eq!(config.context.pointer.accel_profile, AccelProfile::Flat);
        assert_eq!(config.context.initial_queue_capacity, 4);
    }
}

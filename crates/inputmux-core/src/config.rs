//! Context configuration, loadable from TOML.

use serde::{Deserialize, Serialize};

use crate::decode::WheelFormat;
use crate::detect::{default_rules, DetectRule};
use crate::filter::AccelProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Slots allocated for the event queue before the first growth.
    #[serde(default = "default_queue_capacity")]
    pub initial_queue_capacity: usize,
    #[serde(default)]
    pub seat: SeatConfig,
    #[serde(default)]
    pub pointer: PointerConfig,
    #[serde(default = "default_rules")]
    pub detect: Vec<DetectRule>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            initial_queue_capacity: default_queue_capacity(),
            seat: SeatConfig::default(),
            pointer: PointerConfig::default(),
            detect: default_rules(),
        }
    }
}

/// Names of the seat every device joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatConfig {
    #[serde(default = "default_physical_seat")]
    pub physical: String,
    #[serde(default = "default_logical_seat")]
    pub logical: String,
}

impl Default for SeatConfig {
    fn default() -> Self {
        Self {
            physical: default_physical_seat(),
            logical: default_logical_seat(),
        }
    }
}

/// Settings applied to every pointer device at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerConfig {
    #[serde(default = "default_accel_profile")]
    pub accel_profile: AccelProfile,
    #[serde(default)]
    pub accel_speed: f64,
    #[serde(default)]
    pub wheel_format: WheelFormat,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            accel_profile: default_accel_profile(),
            accel_speed: 0.0,
            wheel_format: WheelFormat::default(),
        }
    }
}

fn default_queue_capacity() -> usize {
    4
}

fn default_physical_seat() -> String {
    "seat0".to_string()
}

fn default_logical_seat() -> String {
    "default".to_string()
}

fn default_accel_profile() -> AccelProfile {
    AccelProfile::Flat
}

#[cfg(test)]
mod tests {
    use inputmux_types::{DeviceKind, DeviceProtocol};

    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = ContextConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("initial_queue_capacity = 4"));
        assert!(toml_str.contains("physical = \"seat0\""));
        assert!(toml_str.contains("wheel_format = \"split\""));
        assert!(toml_str.contains("prefix = \"/dev/sysmouse\""));
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: ContextConfig = toml::from_str("").unwrap();
        assert_eq!(config.initial_queue_capacity, 4);
        assert_eq!(config.seat, SeatConfig::default());
        assert_eq!(config.pointer.accel_profile, AccelProfile::Flat);
        assert_eq!(config.detect, default_rules());
    }

    #[test]
    fn parse_example_config() {
        let toml_str = r#"
initial_queue_capacity = 16

[seat]
logical = "desk"

[pointer]
accel_speed = 0.25
wheel_format = "single-byte"

[[detect]]
prefix = "/dev/ums"
kind = "pointer"
protocol = "mouse-packet"
"#;
        let config: ContextConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.initial_queue_capacity, 16);
        assert_eq!(config.seat.physical, "seat0");
        assert_eq!(config.seat.logical, "desk");
        assert!((config.pointer.accel_speed - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.pointer.wheel_format, WheelFormat::SingleByte);
        assert_eq!(
            config.detect,
            vec![DetectRule::new(
                "/dev/ums",
                DeviceKind::Pointer,
                DeviceProtocol::MousePacket
            )]
        );
    }
}

//! Per-device configuration.
//!
//! Acceleration is backed by the device's motion filter. None of the
//! touchpad-style options exist on these devices: they report themselves
//! absent and only accept their default value.

use bitflags::bitflags;

use super::Device;
use crate::filter::{AccelProfile, AccelProfiles};

/// Outcome of a configuration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    Success,
    Unsupported,
    Invalid,
}

bitflags! {
    /// Ways a device can stop sending events. Empty means "enabled".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SendEventsModes: u32 {
        const DISABLED = 1 << 0;
        const DISABLED_ON_EXTERNAL_MOUSE = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClickMethods: u32 {
        const BUTTON_AREAS = 1 << 0;
        const CLICKFINGER = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScrollMethods: u32 {
        const TWO_FINGER = 1 << 0;
        const EDGE = 1 << 1;
        const ON_BUTTON_DOWN = 1 << 2;
    }
}

fn only_default(is_default: bool) -> ConfigStatus {
    if is_default {
        ConfigStatus::Success
    } else {
        ConfigStatus::Unsupported
    }
}

impl Device {
    pub fn accel_is_available(&self) -> bool {
        self.filter.is_some()
    }

    pub fn accel_set_speed(&mut self, speed: f64) -> ConfigStatus {
        let Some(filter) = self.filter.as_mut() else {
            return ConfigStatus::Unsupported;
        };
        if !(-1.0..=1.0).contains(&speed) {
            return ConfigStatus::Invalid;
        }
        if filter.set_speed(speed) {
            ConfigStatus::Success
        } else {
            ConfigStatus::Invalid
        }
    }

    pub fn accel_speed(&self) -> f64 {
        self.filter.as_ref().map_or(0.0, |filter| filter.speed())
    }

    pub fn accel_default_speed(&self) -> f64 {
        0.0
    }

    pub fn accel_profile(&self) -> AccelProfile {
        self.filter
            .as_ref()
            .map_or(AccelProfile::None, |filter| filter.profile())
    }

    pub(crate) fn profiles_from(&self, available: AccelProfiles) -> AccelProfiles {
        if self.filter.is_some() {
            available
        } else {
            AccelProfiles::empty()
        }
    }

    pub fn tap_finger_count(&self) -> u32 {
        0
    }

    pub fn tap_set_enabled(&mut self, enable: bool) -> ConfigStatus {
        only_default(!enable)
    }

    pub fn tap_enabled(&self) -> bool {
        false
    }

    pub fn calibration_has_matrix(&self) -> bool {
        false
    }

    pub fn calibration_set_matrix(&mut self, matrix: [f32; 6]) -> ConfigStatus {
        only_default(matrix == [1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }

    pub fn send_events_modes(&self) -> SendEventsModes {
        SendEventsModes::empty()
    }

    pub fn send_events_set_mode(&mut self, mode: SendEventsModes) -> ConfigStatus {
        only_default(mode.is_empty())
    }

    pub fn send_events_mode(&self) -> SendEventsModes {
        SendEventsModes::empty()
    }

    pub fn natural_scroll_is_available(&self) -> bool {
        false
    }

    pub fn natural_scroll_set_enabled(&mut self, enable: bool) -> ConfigStatus {
        only_default(!enable)
    }

    pub fn left_handed_is_available(&self) -> bool {
        false
    }

    pub fn left_handed_set(&mut self, left_handed: bool) -> ConfigStatus {
        only_default(!left_handed)
    }

    pub fn click_methods(&self) -> ClickMethods {
        ClickMethods::empty()
    }

    pub fn click_set_method(&mut self, method: ClickMethods) -> ConfigStatus {
        only_default(method.is_empty())
    }

    pub fn middle_emulation_is_available(&self) -> bool {
        false
    }

    pub fn middle_emulation_set_enabled(&mut self, enable: bool) -> ConfigStatus {
        only_default(!enable)
    }

    pub fn scroll_methods(&self) -> ScrollMethods {
        ScrollMethods::empty()
    }

    pub fn scroll_set_method(&mut self, method: ScrollMethods) -> ConfigStatus {
        only_default(method.is_empty())
    }

    pub fn dwt_is_available(&self) -> bool {
        false
    }

    pub fn dwt_set_enabled(&mut self, enable: bool) -> ConfigStatus {
        only_default(!enable)
    }
}

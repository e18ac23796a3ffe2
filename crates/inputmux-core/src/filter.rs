//! Pointer motion filter interface.
//!
//! Acceleration curves are supplied by the embedder through
//! [`MotionFilter`]; the engine only feeds raw deltas in and reports what
//! comes out. [`FlatFilter`] is the one profile shipped here: a constant
//! factor derived from the speed setting.

use bitflags::bitflags;
use inputmux_types::DeviceId;
use serde::{Deserialize, Serialize};

/// A 2D delta in normalized pointer units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Delta {
    pub x: f64,
    pub y: f64,
}

impl Delta {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccelProfile {
    None,
    Flat,
    Adaptive,
}

bitflags! {
    /// Set of acceleration profiles a device offers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccelProfiles: u32 {
        const FLAT = 1 << 0;
        const ADAPTIVE = 1 << 1;
    }
}

/// Transforms raw pointer deltas into accelerated ones.
pub trait MotionFilter {
    fn dispatch(&mut self, delta: Delta, device: DeviceId, time_us: u64) -> Delta;

    fn speed(&self) -> f64;

    /// Set the normalized speed in `[-1, 1]`. Returns `false` if rejected.
    fn set_speed(&mut self, speed: f64) -> bool;

    fn profile(&self) -> AccelProfile;
}

/// Builds a motion filter for a profile, or `None` if the profile is not
/// available.
pub type FilterFactory = Box<dyn Fn(AccelProfile) -> Option<Box<dyn MotionFilter>>>;

/// Constant-factor acceleration: every delta is scaled by `1 + speed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatFilter {
    speed: f64,
}

impl FlatFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn factor(self) -> f64 {
        1.0 + self.speed
    }
}

impl MotionFilter for FlatFilter {
    fn dispatch(&mut self, delta: Delta, _device: DeviceId, _time_us: u64) -> Delta {
        Delta::new(delta.x * self.factor(), delta.y * self.factor())
    }

    fn speed(&self) -> f64 {
        self.speed
    }

    fn set_speed(&mut self, speed: f64) -> bool {
        if !(-1.0..=1.0).contains(&speed) {
            return false;
        }
        self.speed = speed;
        true
    }

    fn profile(&self) -> AccelProfile {
        AccelProfile::Flat
    }
}

/// Factory that only knows the flat profile.
pub fn flat_filter_factory() -> FilterFactory {
    Box::new(|profile| match profile {
        AccelProfile::Flat => Some(Box::new(FlatFilter::new()) as Box<dyn MotionFilter>),
        AccelProfile::None | AccelProfile::Adaptive => None,
    })
}

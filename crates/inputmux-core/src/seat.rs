//! Seats: named groups of devices with shared press counters.

use std::collections::HashMap;

use inputmux_types::{ButtonState, DeviceId};

#[derive(Debug)]
pub struct Seat {
    physical: String,
    logical: String,
    devices: Vec<DeviceId>,
    /// Device records (live or removed but still referenced) in this seat.
    members: usize,
    press_counts: HashMap<u32, u32>,
}

impl Seat {
    pub(crate) fn new(physical: impl Into<String>, logical: impl Into<String>) -> Self {
        Self {
            physical: physical.into(),
            logical: logical.into(),
            devices: Vec::new(),
            members: 0,
            press_counts: HashMap::new(),
        }
    }

    pub fn physical_name(&self) -> &str {
        &self.physical
    }

    pub fn logical_name(&self) -> &str {
        &self.logical
    }

    /// Devices currently attached, in the order they were added.
    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    /// How many devices on this seat hold `code` down.
    pub fn press_count(&self, code: u32) -> u32 {
        self.press_counts.get(&code).copied().unwrap_or(0)
    }

    pub(crate) fn matches(&self, physical: &str, logical: &str) -> bool {
        self.physical == physical && self.logical == logical
    }

    pub(crate) fn attach(&mut self, device: DeviceId) {
        self.devices.push(device);
        self.members += 1;
    }

    pub(crate) fn detach(&mut self, device: DeviceId) {
        self.devices.retain(|&d| d != device);
    }

    /// Drop one device record. Returns `true` when the seat has no records
    /// left.
    pub(crate) fn release_member(&mut self) -> bool {
        self.members = self.members.saturating_sub(1);
        self.members == 0
    }

    /// Apply a press or release of `code` and return the new count. A release
    /// with nothing held leaves the count at zero.
    pub(crate) fn update_count(&mut self, code: u32, state: ButtonState) -> u32 {
        let count = self.press_counts.entry(code).or_insert(0);
        match state {
            ButtonState::Pressed => *count = count.saturating_add(1),
            ButtonState::Released => *count = count.saturating_sub(1),
        }
        *count
    }
}

#[cfg(test)]
mod tests {
    use inputmux_types::code::{BTN_LEFT, KEY_ESC};
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn counts_are_shared_across_devices() {
        let mut seat = Seat::new("seat0", "default");
        assert_eq!(seat.update_count(BTN_LEFT, ButtonState::Pressed), 1);
        assert_eq!(seat.update_count(BTN_LEFT, ButtonState::Pressed), 2);
        assert_eq!(seat.update_count(KEY_ESC, ButtonState::Pressed), 1);
        assert_eq!(seat.update_count(BTN_LEFT, ButtonState::Released), 1);
        assert_eq!(seat.press_count(BTN_LEFT), 1);
        assert_eq!(seat.press_count(KEY_ESC), 1);
    }

    #[test]
    fn release_without_press_stays_at_zero() {
        let mut seat = Seat::new("seat0", "default");
        assert_eq!(seat.update_count(BTN_LEFT, ButtonState::Released), 0);
        assert_eq!(seat.update_count(BTN_LEFT, ButtonState::Pressed), 1);
    }

    #[test]
    fn membership_outlives_detach() {
        let mut seat = Seat::new("seat0", "default");
        let a = DeviceId::new(0, 0);
        let b = DeviceId::new(1, 0);
        seat.attach(a);
        seat.attach(b);
        seat.detach(a);
        assert_eq!(seat.devices(), &[b]);
        assert!(!seat.release_member());
        assert!(seat.release_member());
    }

    proptest! {
        #[test]
        fn counts_track_clamped_balance(presses in prop::collection::vec(any::<bool>(), 0..64)) {
            let mut seat = Seat::new("seat0", "default");
            let mut expected: u32 = 0;
            for pressed in presses {
                let state = if pressed { ButtonState::Pressed } else { ButtonState::Released };
                expected = if pressed { expected + 1 } else { expected.saturating_sub(1) };
                prop_assert_eq!(seat.update_count(BTN_LEFT, state), expected);
            }
        }
    }
}

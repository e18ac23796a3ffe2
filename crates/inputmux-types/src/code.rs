//! Button and key code constants.
//!
//! Values follow the Linux `input-event-codes.h` numbering so clients can
//! share keymaps with evdev-based stacks. Keys and buttons occupy disjoint
//! ranges, which lets a seat keep one press counter table for both.

pub const KEY_RESERVED: u32 = 0;
pub const KEY_ESC: u32 = 1;
pub const KEY_MAX: u32 = 0x2ff;

pub const BTN_MISC: u32 = 0x100;
pub const BTN_MOUSE: u32 = 0x110;
pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;
pub const BTN_MIDDLE: u32 = 0x112;
pub const BTN_SIDE: u32 = 0x113;
pub const BTN_EXTRA: u32 = 0x114;
pub const BTN_FORWARD: u32 = 0x115;
pub const BTN_BACK: u32 = 0x116;
pub const BTN_TASK: u32 = 0x117;
/// First code past the mouse button block.
pub const BTN_JOYSTICK: u32 = 0x120;

/// Human-readable name of a pointer button, if it is one of the standard ones.
#[must_use]
pub fn button_name(code: u32) -> Option<&'static str> {
    match code {
        BTN_LEFT => Some("BTN_LEFT"),
        BTN_RIGHT => Some("BTN_RIGHT"),
        BTN_MIDDLE => Some("BTN_MIDDLE"),
        BTN_SIDE => Some("BTN_SIDE"),
        BTN_EXTRA => Some("BTN_EXTRA"),
        BTN_FORWARD => Some("BTN_FORWARD"),
        BTN_BACK => Some("BTN_BACK"),
        BTN_TASK => Some("BTN_TASK"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_range_is_above_keys_in_common_use() {
        assert!(BTN_LEFT > KEY_ESC);
        assert!(BTN_LEFT <= KEY_MAX);
        assert_eq!(button_name(BTN_MIDDLE), Some("BTN_MIDDLE"));
        assert_eq!(button_name(KEY_ESC), None);
    }
}

//! Fixed-size event records (wscons style).
//!
//! Each record is 24 bytes in native byte order: a `u32` tag, an `i32`
//! value, then a timestamp as `i64` seconds and `i64` nanoseconds.

use inputmux_types::code::{
    BTN_JOYSTICK, BTN_LEFT, BTN_MIDDLE, BTN_MISC, BTN_MOUSE, BTN_RIGHT, KEY_RESERVED,
};
use inputmux_types::ButtonState;
use thiserror::Error;
use tracing::trace;

use super::{Notification, ScrollAxis};
use crate::filter::Delta;

pub const RECORD_SIZE: usize = 24;

/// Records read per dispatch.
pub const RECORDS_PER_READ: usize = 64;

pub const KEY_UP: u32 = 1;
pub const KEY_DOWN: u32 = 2;
pub const ALL_KEYS_UP: u32 = 3;
pub const MOUSE_UP: u32 = 4;
pub const MOUSE_DOWN: u32 = 5;
pub const MOUSE_DELTA_X: u32 = 6;
pub const MOUSE_DELTA_Y: u32 = 7;
pub const MOUSE_DELTA_Z: u32 = 10;
pub const MOUSE_DELTA_W: u32 = 16;
pub const SYNC: u32 = 18;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown event record tag {0}")]
pub struct UnknownTag(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub tag: u32,
    pub value: i32,
    pub sec: i64,
    pub nsec: i64,
}

impl EventRecord {
    pub fn parse(bytes: &[u8; RECORD_SIZE]) -> Self {
        let (tag, rest) = bytes.split_at(4);
        let (value, rest) = rest.split_at(4);
        let (sec, nsec) = rest.split_at(8);
        Self {
            tag: u32::from_ne_bytes(tag.try_into().unwrap_or_default()),
            value: i32::from_ne_bytes(value.try_into().unwrap_or_default()),
            sec: i64::from_ne_bytes(sec.try_into().unwrap_or_default()),
            nsec: i64::from_ne_bytes(nsec.try_into().unwrap_or_default()),
        }
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..4].copy_from_slice(&self.tag.to_ne_bytes());
        out[4..8].copy_from_slice(&self.value.to_ne_bytes());
        out[8..16].copy_from_slice(&self.sec.to_ne_bytes());
        out[16..24].copy_from_slice(&self.nsec.to_ne_bytes());
        out
    }

    /// Record time in microseconds. Negative components count as zero.
    pub fn timestamp_us(&self) -> u64 {
        let sec = u64::try_from(self.sec).unwrap_or(0);
        let nsec = u64::try_from(self.nsec).unwrap_or(0);
        sec.saturating_mul(1_000_000).saturating_add(nsec / 1_000)
    }
}

/// Map a wire button number to a button code. Numbers that fall outside the
/// mouse button block have no code.
pub fn button_code(number: i32) -> Option<u32> {
    let code = match number {
        0 => BTN_LEFT,
        1 => BTN_MIDDLE,
        2 => BTN_RIGHT,
        n => BTN_LEFT.checked_add(u32::try_from(n).ok()?)?,
    };
    (BTN_MOUSE..BTN_JOYSTICK).contains(&code).then_some(code)
}

/// Keyboard codes stop below the button blocks so the seat's shared counters
/// never mix keys with buttons.
pub fn key_code(value: i32) -> Option<u32> {
    u32::try_from(value)
        .ok()
        .filter(|key| (KEY_RESERVED..BTN_MISC).contains(key))
}

/// Translate one record. `Ok(None)` means the record carries nothing to emit.
pub fn decode(record: &EventRecord) -> Result<Option<Notification>, UnknownTag> {
    let value = record.value;
    let notification = match record.tag {
        KEY_UP | KEY_DOWN => Notification::Key {
            key: match key_code(value) {
                Some(key) => key,
                None => {
                    trace!(value, "dropping out-of-range key record");
                    return Ok(None);
                }
            },
            state: if record.tag == KEY_DOWN {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            },
        },
        MOUSE_UP | MOUSE_DOWN => Notification::Button {
            button: match button_code(value) {
                Some(button) => button,
                None => {
                    trace!(value, "dropping out-of-range button record");
                    return Ok(None);
                }
            },
            state: if record.tag == MOUSE_DOWN {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            },
        },
        MOUSE_DELTA_X => Notification::Motion(Delta::new(f64::from(value), 0.0)),
        MOUSE_DELTA_Y => Notification::Motion(Delta::new(0.0, -f64::from(value))),
        MOUSE_DELTA_Z => Notification::Scroll {
            axis: ScrollAxis::Vertical,
            value: f64::from(value),
        },
        MOUSE_DELTA_W => Notification::Scroll {
            axis: ScrollAxis::Horizontal,
            value: f64::from(value),
        },
        ALL_KEYS_UP | SYNC => return Ok(None),
        tag => return Err(UnknownTag(tag)),
    };
    Ok(Some(notification))
}

/// Decode every whole record in `bytes`, tagging each notification with the
/// record's own timestamp. A trailing partial record is ignored.
///
/// Record times come from the producer's clock; live devices restamp them.
pub fn decode_all(
    bytes: &[u8],
    out: &mut Vec<(u64, Notification)>,
) -> Result<(), UnknownTag> {
    for chunk in bytes.chunks_exact(RECORD_SIZE) {
        let Ok(raw) = <&[u8; RECORD_SIZE]>::try_from(chunk) else {
            continue;
        };
        let record = EventRecord::parse(raw);
        if let Some(notification) = decode(&record)? {
            out.push((record.timestamp_us(), notification));
        }
    }
    Ok(())
}

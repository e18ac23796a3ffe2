//! 8-byte relative-mouse packets (sysmouse level 1).
//!
//! ```text
//! byte 0   1 0 0 0 0 L M R     sync bit, inverted button mask
//! byte 1   dx (first half)     signed
//! byte 2   dy (first half)     signed, up is positive
//! byte 3   dx (second half)    signed
//! byte 4   dy (second half)    signed
//! byte 5   dz bits 0..6        7-bit signed
//! byte 6   dz bits 7..13       7-bit signed
//! byte 7   0 x x x x x x x     bit 7 clear
//! ```

use inputmux_types::code::{BTN_LEFT, BTN_MIDDLE, BTN_RIGHT};
use inputmux_types::ButtonState;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Notification, ScrollAxis};
use crate::filter::Delta;

pub const PACKET_SIZE: usize = 8;

/// Largest read issued per dispatch.
pub const READ_SIZE: usize = 128;

/// Wire bit for each button, in emission order.
const BUTTON_BITS: [(u8, u32); 3] = [(0x4, BTN_LEFT), (0x2, BTN_MIDDLE), (0x1, BTN_RIGHT)];

/// How the wheel delta is packed into bytes 5 and 6.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WheelFormat {
    /// Two 7-bit signed halves in bytes 5 and 6, summed.
    #[default]
    Split,
    /// Byte 5 alone as a two's-complement value; `-128` is an overflow marker
    /// and reads as `-127`.
    SingleByte,
}

/// A framed packet, decoded into deltas and the raw button mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MousePacket {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
    /// Inverted mask: a set bit means the button is up.
    pub buttons: u8,
}

impl MousePacket {
    /// Parse a packet, or `None` if the framing bits are wrong.
    pub fn parse(bytes: &[u8; PACKET_SIZE], wheel: WheelFormat) -> Option<Self> {
        if bytes[0] & 0x80 == 0 || bytes[7] & 0x80 != 0 {
            return None;
        }

        let signed = |b: u8| i32::from(b as i8);
        let dx = signed(bytes[1]) + signed(bytes[3]);
        let dy = -(signed(bytes[2]) + signed(bytes[4]));
        let dz = match wheel {
            WheelFormat::Split => {
                (signed(bytes[5] << 1) + signed(bytes[6] << 1)) >> 1
            }
            WheelFormat::SingleByte => match bytes[5] as i8 {
                i8::MIN => -127,
                z => i32::from(z),
            },
        };

        Some(Self {
            dx,
            dy,
            dz,
            buttons: bytes[0] & 0x7,
        })
    }
}

/// Translate one packet into notifications given the previous button mask.
///
/// Returns the notifications and the new mask. Order is scroll, motion,
/// then one button transition per changed bit (left, middle, right).
pub fn notifications(previous_mask: u8, packet: &MousePacket) -> (Vec<Notification>, u8) {
    let mut out = Vec::new();

    if packet.dz != 0 {
        out.push(Notification::Scroll {
            axis: ScrollAxis::Vertical,
            value: f64::from(packet.dz),
        });
    }

    if packet.dx != 0 || packet.dy != 0 {
        out.push(Notification::Motion(Delta::new(
            f64::from(packet.dx),
            f64::from(packet.dy),
        )));
    }

    let changed = packet.buttons ^ previous_mask;
    for (bit, button) in BUTTON_BITS {
        if changed & bit == 0 {
            continue;
        }
        let state = if packet.buttons & bit != 0 {
            ButtonState::Released
        } else {
            ButtonState::Pressed
        };
        out.push(Notification::Button { button, state });
    }

    (out, packet.buttons)
}

/// Per-device decoder state for the packet stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct MousePacketDecoder {
    mask: u8,
    wheel: WheelFormat,
}

impl MousePacketDecoder {
    pub fn new(wheel: WheelFormat) -> Self {
        Self { mask: 0, wheel }
    }

    /// The last button mask seen.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Decode one read's worth of bytes.
    ///
    /// A read whose length is not a whole number of packets is dropped, as is
    /// any packet that fails the framing check.
    pub fn decode(&mut self, bytes: &[u8], out: &mut Vec<Notification>) {
        if bytes.len() % PACKET_SIZE != 0 {
            trace!(len = bytes.len(), "dropping misaligned mouse read");
            return;
        }

        for chunk in bytes.chunks_exact(PACKET_SIZE) {
            let Ok(raw) = <&[u8; PACKET_SIZE]>::try_from(chunk) else {
                continue;
            };
            let Some(packet) = MousePacket::parse(raw, self.wheel) else {
                trace!(?raw, "dropping unframed mouse packet");
                continue;
            };
            let (notifications, mask) = notifications(self.mask, &packet);
            self.mask = mask;
            out.extend(notifications);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(decoder: &mut MousePacketDecoder, bytes: [u8; 8]) -> Vec<Notification> {
        let mut out = Vec::new();
        decoder.decode(&bytes, &mut out);
        out
    }

    #[test]
    fn framing_violation_yields_nothing_and_keeps_mask() {
        let mut decoder = MousePacketDecoder::new(WheelFormat::Split);
        // All buttons up.
        decode_one(&mut decoder, [0x87, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decoder.mask(), 0x7);

        // Sync bit missing in byte 0.
        assert!(decode_one(&mut decoder, [0x03, 5, 5, 0, 0, 0, 0, 0]).is_empty());
        // Bit 7 set in byte 7.
        assert!(decode_one(&mut decoder, [0x83, 5, 5, 0, 0, 0, 0, 0x80]).is_empty());
        assert_eq!(decoder.mask(), 0x7);
    }

    #[test]
    fn set_bits_from_zero_mask_emit_in_left_middle_right_order() {
        let mut decoder = MousePacketDecoder::new(WheelFormat::Split);
        let out = decode_one(&mut decoder, [0x80 + 0x7, 3, 2, 1, 0, 0, 0, 0x00]);

        assert_eq!(
            out,
            vec![
                Notification::Motion(Delta::new(4.0, -2.0)),
                Notification::Button {
                    button: BTN_LEFT,
                    state: ButtonState::Released
                },
                Notification::Button {
                    button: BTN_MIDDLE,
                    state: ButtonState::Released
                },
                Notification::Button {
                    button: BTN_RIGHT,
                    state: ButtonState::Released
                },
            ]
        );
    }

    #[test]
    fn cleared_bit_is_a_press() {
        let mut decoder = MousePacketDecoder::new(WheelFormat::Split);
        decode_one(&mut decoder, [0x87, 0, 0, 0, 0, 0, 0, 0]);

        // Left button goes down.
        let out = decode_one(&mut decoder, [0x83, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            out,
            vec![Notification::Button {
                button: BTN_LEFT,
                state: ButtonState::Pressed
            }]
        );

        // Nothing changes, nothing is emitted.
        assert!(decode_one(&mut decoder, [0x83, 0, 0, 0, 0, 0, 0, 0]).is_empty());
    }

    #[test]
    fn deltas_are_signed_and_y_is_flipped() {
        let packet = MousePacket::parse(&[0x87, 0xff, 0x05, 0xfe, 0x01, 0, 0, 0], WheelFormat::Split)
            .unwrap();
        assert_eq!(packet.dx, -3);
        assert_eq!(packet.dy, -6);
    }

    #[test]
    fn split_wheel_combines_seven_bit_halves() {
        let down = MousePacket::parse(&[0x87, 0, 0, 0, 0, 0x01, 0x00, 0], WheelFormat::Split).unwrap();
        assert_eq!(down.dz, 1);

        let up = MousePacket::parse(&[0x87, 0, 0, 0, 0, 0x7f, 0x00, 0], WheelFormat::Split).unwrap();
        assert_eq!(up.dz, -1);

        let (out, _) = notifications(0x7, &up);
        assert_eq!(
            out,
            vec![Notification::Scroll {
                axis: ScrollAxis::Vertical,
                value: -1.0
            }]
        );
    }

    #[test]
    fn single_byte_wheel_clamps_overflow() {
        let packet =
            MousePacket::parse(&[0x87, 0, 0, 0, 0, 0x80, 0x00, 0], WheelFormat::SingleByte).unwrap();
        assert_eq!(packet.dz, -127);
        let packet =
            MousePacket::parse(&[0x87, 0, 0, 0, 0, 0x02, 0x7f, 0], WheelFormat::SingleByte).unwrap();
        assert_eq!(packet.dz, 2);
    }

    #[test]
    fn misaligned_read_is_dropped_whole() {
        let mut decoder = MousePacketDecoder::new(WheelFormat::Split);
        let mut out = Vec::new();
        decoder.decode(&[0x83, 1, 1, 0, 0, 0, 0, 0, 0x87], &mut out);
        assert!(out.is_empty());
        assert_eq!(decoder.mask(), 0);
    }

    #[test]
    fn several_packets_in_one_read() {
        let mut decoder = MousePacketDecoder::new(WheelFormat::Split);
        let mut out = Vec::new();
        let bytes = [
            0x87, 1, 0, 0, 0, 0, 0, 0, //
            0x87, 0, 1, 0, 0, 0, 0, 0,
        ];
        decoder.decode(&bytes, &mut out);
        // Three releases from the zero initial mask, then two motions.
        let motions: Vec<_> = out
            .iter()
            .filter(|n| matches!(n, Notification::Motion(_)))
            .collect();
        assert_eq!(motions.len(), 2);
        assert_eq!(out.len(), 5);
    }
}

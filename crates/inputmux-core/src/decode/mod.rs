//! Wire decoders.
//!
//! Decoders turn raw device bytes into [`Notification`]s. They know nothing
//! about seats, queues or filters; the device layer applies those.

pub mod event_record;
pub mod mouse_packet;

use inputmux_types::{ButtonState, DeviceProtocol};

pub use event_record::UnknownTag;
pub use mouse_packet::WheelFormat;

use crate::filter::Delta;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

/// One decoded input change, before seat counting and acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    Key { key: u32, state: ButtonState },
    Button { button: u32, state: ButtonState },
    /// Raw relative motion.
    Motion(Delta),
    /// Wheel movement; the value doubles as the discrete step count.
    Scroll { axis: ScrollAxis, value: f64 },
}

/// Per-device decoder, chosen by the device's protocol.
#[derive(Debug, Clone, Copy)]
pub enum Decoder {
    MousePacket(mouse_packet::MousePacketDecoder),
    EventRecord,
}

impl Decoder {
    pub fn for_protocol(protocol: DeviceProtocol, wheel: WheelFormat) -> Self {
        match protocol {
            DeviceProtocol::MousePacket => {
                Self::MousePacket(mouse_packet::MousePacketDecoder::new(wheel))
            }
            DeviceProtocol::EventRecord => Self::EventRecord,
        }
    }

    pub fn protocol(&self) -> DeviceProtocol {
        match self {
            Self::MousePacket(_) => DeviceProtocol::MousePacket,
            Self::EventRecord => DeviceProtocol::EventRecord,
        }
    }

    /// Bytes to request per read.
    pub fn read_size(&self) -> usize {
        match self {
            Self::MousePacket(_) => mouse_packet::READ_SIZE,
            Self::EventRecord => event_record::RECORD_SIZE * event_record::RECORDS_PER_READ,
        }
    }

    /// Decode one read, stamping every notification with `now_us`. Record
    /// times are ignored here since they may come from the wall clock.
    pub fn decode(
        &mut self,
        bytes: &[u8],
        now_us: u64,
        out: &mut Vec<(u64, Notification)>,
    ) -> Result<(), UnknownTag> {
        match self {
            Self::MousePacket(decoder) => {
                let mut notifications = Vec::new();
                decoder.decode(bytes, &mut notifications);
                out.extend(notifications.into_iter().map(|n| (now_us, n)));
                Ok(())
            }
            Self::EventRecord => {
                let start = out.len();
                event_record::decode_all(bytes, out)?;
                for (time, _) in &mut out[start..] {
                    *time = now_us;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_sizes_follow_protocol() {
        let mouse = Decoder::for_protocol(DeviceProtocol::MousePacket, WheelFormat::Split);
        assert_eq!(mouse.read_size(), 128);
        assert_eq!(mouse.protocol(), DeviceProtocol::MousePacket);

        let records = Decoder::for_protocol(DeviceProtocol::EventRecord, WheelFormat::Split);
        assert_eq!(records.read_size(), 24 * 64);
    }

    #[test]
    fn mouse_notifications_take_read_time() {
        let mut decoder = Decoder::for_protocol(DeviceProtocol::MousePacket, WheelFormat::Split);
        let mut out = Vec::new();
        decoder
            .decode(&[0x87, 1, 0, 0, 0, 0, 0, 0], 1234, &mut out)
            .unwrap();
        assert!(out.iter().all(|(time, _)| *time == 1234));
        assert!(out.contains(&(1234, Notification::Motion(Delta::new(1.0, 0.0)))));
    }

    #[test]
    fn records_take_read_time_not_record_time() {
        let record = event_record::EventRecord {
            tag: event_record::KEY_DOWN,
            value: 30,
            sec: 2,
            nsec: 0,
        };
        let mut decoder = Decoder::for_protocol(DeviceProtocol::EventRecord, WheelFormat::Split);
        let mut out = vec![(7, Notification::Motion(Delta::new(0.0, 0.0)))];
        decoder.decode(&record.to_bytes(), 5_000, &mut out).unwrap();
        assert_eq!(out[0].0, 7);
        assert_eq!(
            out[1],
            (
                5_000,
                Notification::Key {
                    key: 30,
                    state: ButtonState::Pressed
                }
            )
        );
    }
}

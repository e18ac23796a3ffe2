//! `inputmux decode`: run a captured device stream through a decoder.

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use inputmux_core::decode::{event_record, Decoder, Notification, WheelFormat};
use inputmux_types::DeviceProtocol;
use tracing::debug;

use crate::output::format_notification;

/// Decode `bytes` in read-sized chunks, the way a live device would be read.
/// Records keep the time written in the capture; packets carry none.
pub fn decode_bytes(
    bytes: &[u8],
    protocol: DeviceProtocol,
    wheel: WheelFormat,
) -> anyhow::Result<Vec<(u64, Notification)>> {
    let mut out = Vec::new();
    if protocol == DeviceProtocol::EventRecord {
        event_record::decode_all(bytes, &mut out)?;
        return Ok(out);
    }
    let mut decoder = Decoder::for_protocol(protocol, wheel);
    for chunk in bytes.chunks(decoder.read_size()) {
        decoder.decode(chunk, 0, &mut out)?;
    }
    Ok(out)
}

pub fn run(path: &Path, protocol: DeviceProtocol, wheel: WheelFormat) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), len = bytes.len(), ?protocol, "decoding capture");

    let notifications = decode_bytes(&bytes, protocol, wheel)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    let mut stdout = std::io::stdout().lock();
    for (time, notification) in &notifications {
        writeln!(stdout, "{}", format_notification(*time, notification))?;
    }
    Ok(())
}

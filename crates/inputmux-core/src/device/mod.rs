//! Device records.
//!
//! A device owns its open descriptor and decoder state. It stays in the
//! context's arena after removal for as long as queued events point at it;
//! `pins` counts those events.

pub mod config;

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use inputmux_types::{DeviceCapability, DeviceKind, DeviceProtocol, SeatId};

use crate::decode::Decoder;
use crate::filter::MotionFilter;
use crate::poll::SourceId;

pub use config::{ClickMethods, ConfigStatus, ScrollMethods, SendEventsModes};

pub struct Device {
    seat: SeatId,
    devnode: PathBuf,
    sysname: String,
    kind: DeviceKind,
    decoder: Decoder,
    pub(crate) file: Option<File>,
    pub(crate) source: Option<SourceId>,
    pub(crate) filter: Option<Box<dyn MotionFilter>>,
    pub(crate) pins: usize,
    pub(crate) removed: bool,
}

impl Device {
    pub(crate) fn new(
        seat: SeatId,
        devnode: &Path,
        kind: DeviceKind,
        decoder: Decoder,
        file: File,
    ) -> Self {
        let sysname = devnode
            .file_name()
            .map_or_else(|| devnode.display().to_string(), |name| name.to_string_lossy().into_owned());
        Self {
            seat,
            devnode: devnode.to_path_buf(),
            sysname,
            kind,
            decoder,
            file: Some(file),
            source: None,
            filter: None,
            pins: 0,
            removed: false,
        }
    }

    pub fn seat(&self) -> SeatId {
        self.seat
    }

    /// Path of the device node this device was opened from.
    pub fn devnode(&self) -> &Path {
        &self.devnode
    }

    /// Last path component of the device node, e.g. `sysmouse`.
    pub fn sysname(&self) -> &str {
        &self.sysname
    }

    /// Human-readable description.
    pub fn name(&self) -> &'static str {
        match (self.kind, self.decoder.protocol()) {
            (DeviceKind::Pointer, DeviceProtocol::MousePacket) => "System mouse",
            (DeviceKind::Pointer, DeviceProtocol::EventRecord) => "Event-record mouse",
            (DeviceKind::Keyboard, _) => "Event-record keyboard",
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn protocol(&self) -> DeviceProtocol {
        self.decoder.protocol()
    }

    pub fn has_capability(&self, capability: DeviceCapability) -> bool {
        self.kind.capabilities().contains(&capability)
    }

    /// Whether the device has been removed and is only kept alive by queued
    /// events.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub(crate) fn decoder_mut(&mut self) -> &mut Decoder {
        &mut self.decoder
    }

    /// Read whatever is available without blocking. `Ok(0)` covers both end
    /// of stream and "nothing to read".
    pub(crate) fn read_available(&self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut file) = self.file.as_ref() else {
            return Ok(0);
        };
        match file.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            other => other,
        }
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("sysname", &self.sysname)
            .field("kind", &self.kind)
            .field("protocol", &self.decoder.protocol())
            .field("seat", &self.seat)
            .field("open", &self.file.is_some())
            .field("pins", &self.pins)
            .field("removed", &self.removed)
            .finish_non_exhaustive()
    }
}

//! Device and seat descriptor types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generation-checked handle to a device owned by a context.
///
/// The index names a slot; the generation distinguishes successive occupants
/// of that slot, so a handle to a destroyed device never aliases a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId {
    index: u32,
    generation: u32,
}

impl DeviceId {
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}.{}", self.index, self.generation)
    }
}

/// Generation-checked handle to a seat owned by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatId {
    index: u32,
    generation: u32,
}

impl SeatId {
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat#{}.{}", self.index, self.generation)
    }
}

/// Broad class of a device, decided when the device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    Keyboard,
    Pointer,
}

impl DeviceKind {
    /// The capabilities a device of this kind reports.
    #[must_use]
    pub fn capabilities(self) -> &'static [DeviceCapability] {
        match self {
            Self::Keyboard => &[DeviceCapability::Keyboard],
            Self::Pointer => &[DeviceCapability::Pointer],
        }
    }
}

/// Wire format spoken by a device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceProtocol {
    /// 8-byte relative-mouse packets (sysmouse level 1).
    MousePacket,
    /// Fixed-size tagged event records (wscons style).
    EventRecord,
}

/// What kind of input a device can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceCapability {
    Keyboard,
    Pointer,
    Touch,
    Gesture,
    TabletTool,
    TabletPad,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_compare_by_generation() {
        let a = DeviceId::new(3, 0);
        let b = DeviceId::new(3, 1);
        assert_ne!(a, b);
        assert_eq!(a.index(), b.index());
        assert_eq!(b.to_string(), "device#3.1");
    }

    #[test]
    fn kind_capabilities() {
        assert_eq!(
            DeviceKind::Keyboard.capabilities(),
            &[DeviceCapability::Keyboard]
        );
        assert!(DeviceKind::Pointer
            .capabilities()
            .contains(&DeviceCapability::Pointer));
    }

    #[test]
    fn protocol_names_are_kebab_case() {
        let json = serde_json::to_string(&DeviceProtocol::MousePacket).unwrap();
        assert_eq!(json, "\"mouse-packet\"");
        let kind: DeviceKind = serde_json::from_str("\"keyboard\"").unwrap();
        assert_eq!(kind, DeviceKind::Keyboard);
    }
}

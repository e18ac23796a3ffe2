//! Device classification by node path.

use std::path::Path;

use inputmux_types::{DeviceKind, DeviceProtocol};
use serde::{Deserialize, Serialize};

/// Maps device nodes whose path starts with `prefix` to a kind and protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectRule {
    pub prefix: String,
    pub kind: DeviceKind,
    pub protocol: DeviceProtocol,
}

impl DetectRule {
    pub fn new(prefix: impl Into<String>, kind: DeviceKind, protocol: DeviceProtocol) -> Self {
        Self {
            prefix: prefix.into(),
            kind,
            protocol,
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.to_str()
            .is_some_and(|path| path.starts_with(self.prefix.as_str()))
    }
}

/// Rules for the BSD mouse and keyboard nodes.
pub fn default_rules() -> Vec<DetectRule> {
    use DeviceKind::{Keyboard, Pointer};
    use DeviceProtocol::{EventRecord, MousePacket};

    vec![
        DetectRule::new("/dev/sysmouse", Pointer, MousePacket),
        DetectRule::new("/dev/psm", Pointer, MousePacket),
        DetectRule::new("/dev/ums", Pointer, MousePacket),
        DetectRule::new("/dev/wsmouse", Pointer, EventRecord),
        DetectRule::new("/dev/wskbd", Keyboard, EventRecord),
        DetectRule::new("/dev/kbd", Keyboard, EventRecord),
    ]
}

/// First matching rule wins.
pub fn detect(rules: &[DetectRule], path: &Path) -> Option<(DeviceKind, DeviceProtocol)> {
    rules
        .iter()
        .find(|rule| rule.matches(path))
        .map(|rule| (rule.kind, rule.protocol))
}

//! Input event types.
//!
//! Every event carries the handle of the device that produced it and a
//! microsecond timestamp. The payload is a closed set of variants; only
//! device notifications, keys and pointer events are produced by the
//! built-in decoders, the remaining variants exist for filters and future
//! device classes.

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;

/// A decoded input event with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Which device produced this event.
    pub device_id: DeviceId,
    /// Microsecond timestamp.
    pub timestamp_us: u64,
    /// The event itself.
    pub kind: EventKind,
}

impl Event {
    /// The discriminant of this event's payload.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}

/// Payload of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    DeviceAdded,
    DeviceRemoved,

    /// Key press or release. `seat_key_count` is the number of devices on
    /// the seat that hold this key down after the transition.
    Key {
        key: u32,
        state: ButtonState,
        seat_key_count: u32,
    },

    /// Relative pointer motion, after and before acceleration.
    PointerMotion {
        dx: f64,
        dy: f64,
        dx_unaccelerated: f64,
        dy_unaccelerated: f64,
    },

    /// Absolute pointer position in device coordinates.
    PointerMotionAbsolute { x: f64, y: f64 },

    /// Pointer button press or release.
    PointerButton {
        button: u32,
        state: ButtonState,
        seat_button_count: u32,
    },

    /// Scroll on one or both axes.
    PointerAxis {
        source: AxisSource,
        vertical: Option<AxisValue>,
        horizontal: Option<AxisValue>,
    },

    TouchDown {
        slot: i32,
        seat_slot: i32,
        x: f64,
        y: f64,
    },
    TouchMotion {
        slot: i32,
        seat_slot: i32,
        x: f64,
        y: f64,
    },
    TouchUp {
        slot: i32,
        seat_slot: i32,
    },
    TouchFrame,

    GestureSwipe {
        phase: GesturePhase,
        finger_count: u32,
        dx: f64,
        dy: f64,
        cancelled: bool,
    },
    GesturePinch {
        phase: GesturePhase,
        finger_count: u32,
        dx: f64,
        dy: f64,
        scale: f64,
        angle_delta: f64,
        cancelled: bool,
    },

    TabletToolAxis {
        x: f64,
        y: f64,
        pressure: f64,
    },
    TabletToolProximity {
        state: ProximityState,
    },
    TabletToolTip {
        state: TipState,
    },
    TabletToolButton {
        button: u32,
        state: ButtonState,
        seat_button_count: u32,
    },

    TabletPadButton {
        button: u32,
        state: ButtonState,
    },
    TabletPadRing {
        number: u32,
        position: f64,
    },
    TabletPadStrip {
        number: u32,
        position: f64,
    },
}

impl EventKind {
    /// The discriminant of this payload.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::DeviceAdded => EventType::DeviceAdded,
            Self::DeviceRemoved => EventType::DeviceRemoved,
            Self::Key { .. } => EventType::KeyboardKey,
            Self::PointerMotion { .. } => EventType::PointerMotion,
            Self::PointerMotionAbsolute { .. } => EventType::PointerMotionAbsolute,
            Self::PointerButton { .. } => EventType::PointerButton,
            Self::PointerAxis { .. } => EventType::PointerAxis,
            Self::TouchDown { .. } => EventType::TouchDown,
            Self::TouchMotion { .. } => EventType::TouchMotion,
            Self::TouchUp { .. } => EventType::TouchUp,
            Self::TouchFrame => EventType::TouchFrame,
            Self::GestureSwipe { phase, .. } => match phase {
                GesturePhase::Begin => EventType::GestureSwipeBegin,
                GesturePhase::Update => EventType::GestureSwipeUpdate,
                GesturePhase::End => EventType::GestureSwipeEnd,
            },
            Self::GesturePinch { phase, .. } => match phase {
                GesturePhase::Begin => EventType::GesturePinchBegin,
                GesturePhase::Update => EventType::GesturePinchUpdate,
                GesturePhase::End => EventType::GesturePinchEnd,
            },
            Self::TabletToolAxis { .. } => EventType::TabletToolAxis,
            Self::TabletToolProximity { .. } => EventType::TabletToolProximity,
            Self::TabletToolTip { .. } => EventType::TabletToolTip,
            Self::TabletToolButton { .. } => EventType::TabletToolButton,
            Self::TabletPadButton { .. } => EventType::TabletPadButton,
            Self::TabletPadRing { .. } => EventType::TabletPadRing,
            Self::TabletPadStrip { .. } => EventType::TabletPadStrip,
        }
    }
}

/// Event discriminant, as reported by a queue peek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    DeviceAdded,
    DeviceRemoved,
    KeyboardKey,
    PointerMotion,
    PointerMotionAbsolute,
    PointerButton,
    PointerAxis,
    TouchDown,
    TouchMotion,
    TouchUp,
    TouchFrame,
    GestureSwipeBegin,
    GestureSwipeUpdate,
    GestureSwipeEnd,
    GesturePinchBegin,
    GesturePinchUpdate,
    GesturePinchEnd,
    TabletToolAxis,
    TabletToolProximity,
    TabletToolTip,
    TabletToolButton,
    TabletPadButton,
    TabletPadRing,
    TabletPadStrip,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DeviceAdded => "DEVICE_ADDED",
            Self::DeviceRemoved => "DEVICE_REMOVED",
            Self::KeyboardKey => "KEYBOARD_KEY",
            Self::PointerMotion => "POINTER_MOTION",
            Self::PointerMotionAbsolute => "POINTER_MOTION_ABSOLUTE",
            Self::PointerButton => "POINTER_BUTTON",
            Self::PointerAxis => "POINTER_AXIS",
            Self::TouchDown => "TOUCH_DOWN",
            Self::TouchMotion => "TOUCH_MOTION",
            Self::TouchUp => "TOUCH_UP",
            Self::TouchFrame => "TOUCH_FRAME",
            Self::GestureSwipeBegin => "GESTURE_SWIPE_BEGIN",
            Self::GestureSwipeUpdate => "GESTURE_SWIPE_UPDATE",
            Self::GestureSwipeEnd => "GESTURE_SWIPE_END",
            Self::GesturePinchBegin => "GESTURE_PINCH_BEGIN",
            Self::GesturePinchUpdate => "GESTURE_PINCH_UPDATE",
            Self::GesturePinchEnd => "GESTURE_PINCH_END",
            Self::TabletToolAxis => "TABLET_TOOL_AXIS",
            Self::TabletToolProximity => "TABLET_TOOL_PROXIMITY",
            Self::TabletToolTip => "TABLET_TOOL_TIP",
            Self::TabletToolButton => "TABLET_TOOL_BUTTON",
            Self::TabletPadButton => "TABLET_PAD_BUTTON",
            Self::TabletPadRing => "TABLET_PAD_RING",
            Self::TabletPadStrip => "TABLET_PAD_STRIP",
        };
        f.write_str(name)
    }
}

/// Button/key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Where a scroll event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisSource {
    Wheel,
    Finger,
    Continuous,
    WheelTilt,
}

/// Scroll amount on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisValue {
    /// Scroll distance in the pointer's normalized units.
    pub value: f64,
    /// Wheel clicks, zero for non-wheel sources.
    pub discrete: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GesturePhase {
    Begin,
    Update,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProximityState {
    Out,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TipState {
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_follows_payload() {
        let event = Event {
            device_id: DeviceId::new(0, 0),
            timestamp_us: 42,
            kind: EventKind::PointerButton {
                button: crate::code::BTN_LEFT,
                state: ButtonState::Pressed,
                seat_button_count: 1,
            },
        };
        assert_eq!(event.event_type(), EventType::PointerButton);
        assert_eq!(event.event_type().to_string(), "POINTER_BUTTON");
    }

    #[test]
    fn gesture_phase_selects_type() {
        let kind = EventKind::GesturePinch {
            phase: GesturePhase::End,
            finger_count: 2,
            dx: 0.0,
            dy: 0.0,
            scale: 1.0,
            angle_delta: 0.0,
            cancelled: true,
        };
        assert_eq!(kind.event_type(), EventType::GesturePinchEnd);
    }

    #[test]
    fn event_serializes_to_json() {
        let event = Event {
            device_id: DeviceId::new(1, 2),
            timestamp_us: 123_456_789,
            kind: EventKind::Key {
                key: 30,
                state: ButtonState::Released,
                seat_key_count: 0,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let decoded: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, decoded);
    }
}

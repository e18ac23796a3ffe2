//! Shared types for inputmux.
//!
//! This crate contains the value types shared across the inputmux workspace:
//! input events, device and seat handles, device kinds and capabilities, and
//! the button/key code constants used by the decoders.

pub mod code;
pub mod device;
pub mod event;

pub use device::{DeviceCapability, DeviceId, DeviceKind, DeviceProtocol, SeatId};
pub use event::{
    AxisSource, AxisValue, ButtonState, Event, EventKind, EventType, GesturePhase,
    ProximityState, TipState,
};

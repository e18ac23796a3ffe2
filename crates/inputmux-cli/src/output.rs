//! Human-readable event lines.

use inputmux_core::decode::{Notification, ScrollAxis};
use inputmux_types::code::button_name;
use inputmux_types::{AxisValue, ButtonState, Event, EventKind};

fn state_str(state: ButtonState) -> &'static str {
    match state {
        ButtonState::Pressed => "pressed",
        ButtonState::Released => "released",
    }
}

fn button_label(code: u32) -> String {
    button_name(code).map_or_else(|| format!("{code:#x}"), str::to_string)
}

fn axis(label: &str, value: Option<AxisValue>) -> Option<String> {
    value.map(|v| format!("{label}={:.2} ({} clicks)", v.value, v.discrete))
}

#[allow(clippy::cast_precision_loss)]
fn seconds(us: u64) -> f64 {
    us as f64 / 1_000_000.0
}

/// One line per event: time, device, type, payload.
pub fn format_event(device: &str, event: &Event) -> String {
    let detail = match &event.kind {
        EventKind::Key {
            key,
            state,
            seat_key_count,
        } => format!("key {key} {} (seat count {seat_key_count})", state_str(*state)),
        EventKind::PointerButton {
            button,
            state,
            seat_button_count,
        } => format!(
            "{} {} (seat count {seat_button_count})",
            button_label(*button),
            state_str(*state)
        ),
        EventKind::PointerMotion {
            dx,
            dy,
            dx_unaccelerated,
            dy_unaccelerated,
        } => format!("{dx:.2}/{dy:.2} (raw {dx_unaccelerated:.0}/{dy_unaccelerated:.0})"),
        EventKind::PointerAxis {
            source,
            vertical,
            horizontal,
        } => {
            let parts: Vec<String> = [axis("vert", *vertical), axis("horiz", *horizontal)]
                .into_iter()
                .flatten()
                .collect();
            format!("{} {source:?}", parts.join(" "))
        }
        EventKind::DeviceAdded | EventKind::DeviceRemoved => String::new(),
        other => format!("{other:?}"),
    };

    format!(
        "{:>12.6}  {device:<12} {:<24} {detail}",
        seconds(event.timestamp_us),
        event.event_type().to_string()
    )
    .trim_end()
    .to_string()
}

/// One line per decoded notification, for offline decoding.
pub fn format_notification(time_us: u64, notification: &Notification) -> String {
    let detail = match notification {
        Notification::Key { key, state } => format!("KEY {key} {}", state_str(*state)),
        Notification::Button { button, state } => {
            format!("BUTTON {} {}", button_label(*button), state_str(*state))
        }
        Notification::Motion(delta) => format!("MOTION {:.0}/{:.0}", delta.x, delta.y),
        Notification::Scroll { axis, value } => {
            let axis = match axis {
                ScrollAxis::Vertical => "vert",
                ScrollAxis::Horizontal => "horiz",
            };
            format!("SCROLL {axis} {value:.0}")
        }
    };
    format!("{:>12.6}  {detail}", seconds(time_us))
}

#[cfg(test)]
mod tests {
    use inputmux_core::filter::Delta;
    use inputmux_types::code::BTN_LEFT;
    use inputmux_types::DeviceId;

    use super::*;

    #[test]
    fn button_line_names_the_button() {
        let event = Event {
            device_id: DeviceId::new(0, 0),
            timestamp_us: 1_500_000,
            kind: EventKind::PointerButton {
                button: BTN_LEFT,
                state: ButtonState::Pressed,
                seat_button_count: 1,
            },
        };
        let line = format_event("sysmouse", &event);
        assert!(line.contains("1.500000"));
        assert!(line.contains("sysmouse"));
        assert!(line.contains("POINTER_BUTTON"));
        assert!(line.contains("pressed (seat count 1)"));
    }

    #[test]
    fn device_added_has_no_trailing_space() {
        let event = Event {
            device_id: DeviceId::new(0, 0),
            timestamp_us: 0,
            kind: EventKind::DeviceAdded,
        };
        let line = format_event("wskbd", &event);
        assert!(line.ends_with("DEVICE_ADDED"));
    }

    #[test]
    fn notification_lines() {
        assert!(
            format_notification(0, &Notification::Motion(Delta::new(3.0, -1.0)))
                .ends_with("MOTION 3/-1")
        );
        assert!(format_notification(
            0,
            &Notification::Scroll {
                axis: ScrollAxis::Horizontal,
                value: 2.0
            }
        )
        .ends_with("SCROLL horiz 2"));
    }
}

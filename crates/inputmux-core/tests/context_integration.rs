//! End-to-end tests driving a context through real descriptors.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use inputmux_core::decode::event_record::{EventRecord, MOUSE_DELTA_W, MOUSE_DOWN, MOUSE_UP};
use inputmux_core::{Context, ContextConfig, DirectIo, InputError, RestrictedIo};
use inputmux_types::code::BTN_LEFT;
use inputmux_types::{
    AxisSource, AxisValue, ButtonState, DeviceKind, DeviceProtocol, Event, EventKind, EventType,
};
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Socket-pair device nodes that remember which paths were closed.
#[derive(Clone, Default)]
struct SocketNodes {
    nodes: Rc<RefCell<HashMap<PathBuf, UnixStream>>>,
    closed: Rc<RefCell<Vec<PathBuf>>>,
    open: Rc<RefCell<Vec<(i32, PathBuf)>>>,
}

impl SocketNodes {
    fn add(&self, path: &str) -> UnixStream {
        let (writer, reader) = UnixStream::pair().unwrap();
        self.nodes.borrow_mut().insert(PathBuf::from(path), reader);
        writer
    }
}

impl RestrictedIo for SocketNodes {
    fn open_restricted(&mut self, path: &Path, _flags: OFlag) -> io::Result<OwnedFd> {
        use std::os::fd::AsRawFd;

        let nodes = self.nodes.borrow();
        let stream = nodes
            .get(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?
            .try_clone()?;
        stream.set_nonblocking(true)?;
        let fd = OwnedFd::from(stream);
        self.open
            .borrow_mut()
            .push((fd.as_raw_fd(), path.to_path_buf()));
        Ok(fd)
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        use std::os::fd::AsRawFd;

        let mut open = self.open.borrow_mut();
        if let Some(pos) = open.iter().position(|(raw, _)| *raw == fd.as_raw_fd()) {
            let (_, path) = open.remove(pos);
            self.closed.borrow_mut().push(path);
        }
    }
}

fn drain(ctx: &mut Context) -> Vec<Event> {
    std::iter::from_fn(|| ctx.get_event()).collect()
}

fn record(tag: u32, value: i32) -> [u8; 24] {
    EventRecord {
        tag,
        value,
        sec: 10,
        nsec: 250_000,
    }
    .to_bytes()
}

#[test]
fn mouse_and_record_devices_share_one_seat() {
    init_tracing();
    let nodes = SocketNodes::default();
    let mut sysmouse = nodes.add("/dev/sysmouse");
    let mut wsmouse = nodes.add("/dev/wsmouse0");

    let mut ctx = Context::builder(nodes.clone()).build().unwrap();
    let a = ctx.add_device("/dev/sysmouse").unwrap();
    let b = ctx.add_device("/dev/wsmouse0").unwrap();
    assert_eq!(ctx.seats().count(), 1);
    assert_eq!(ctx[a].seat(), ctx[b].seat());
    assert_eq!(ctx[b].protocol(), DeviceProtocol::EventRecord);

    let added: Vec<_> = drain(&mut ctx).iter().map(|event| event.device_id).collect();
    assert_eq!(added, vec![a, b]);

    // Left button down on the packet mouse (all other bits up).
    sysmouse.write_all(&[0x83, 0, 0, 0, 0, 0, 0, 0]).unwrap();
    ctx.dispatch().unwrap();
    drain(&mut ctx);

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&record(MOUSE_DOWN, 0));
    bytes.extend_from_slice(&record(MOUSE_DOWN, 4));
    bytes.extend_from_slice(&record(MOUSE_DELTA_W, 2));
    bytes.extend_from_slice(&record(MOUSE_UP, 0));
    wsmouse.write_all(&bytes).unwrap();
    ctx.dispatch().unwrap();

    let kinds: Vec<EventKind> = drain(&mut ctx).into_iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::PointerButton {
                button: BTN_LEFT,
                state: ButtonState::Pressed,
                seat_button_count: 2,
            },
            EventKind::PointerButton {
                button: BTN_LEFT + 4,
                state: ButtonState::Pressed,
                seat_button_count: 1,
            },
            EventKind::PointerAxis {
                source: AxisSource::Wheel,
                vertical: None,
                horizontal: Some(AxisValue {
                    value: 2.0,
                    discrete: 2.0,
                }),
            },
            EventKind::PointerButton {
                button: BTN_LEFT,
                state: ButtonState::Released,
                seat_button_count: 1,
            },
        ]
    );
}

#[test]
fn remove_then_drop_closes_everything_once() {
    init_tracing();
    let nodes = SocketNodes::default();
    let _sysmouse = nodes.add("/dev/sysmouse");
    let _kbd = nodes.add("/dev/wskbd");

    let mut ctx = Context::builder(nodes.clone()).build().unwrap();
    let mouse = ctx.add_device("/dev/sysmouse").unwrap();
    let kbd = ctx.add_device("/dev/wskbd").unwrap();
    assert_eq!(ctx[kbd].kind(), DeviceKind::Keyboard);

    ctx.remove_device(mouse).unwrap();
    assert_eq!(*nodes.closed.borrow(), vec![PathBuf::from("/dev/sysmouse")]);

    // Events for the removed device are still queued at teardown.
    assert_eq!(ctx.peek_event_type(), Some(EventType::DeviceAdded));
    drop(ctx);

    assert_eq!(
        *nodes.closed.borrow(),
        vec![PathBuf::from("/dev/sysmouse"), PathBuf::from("/dev/wskbd")]
    );
    assert!(nodes.open.borrow().is_empty());
}

#[test]
fn custom_seat_names_come_from_config() {
    let nodes = SocketNodes::default();
    let _node = nodes.add("/dev/ums0");

    let config: ContextConfig = toml::from_str(
        r#"
[seat]
physical = "seat1"
logical = "desk"
"#,
    )
    .unwrap();
    let mut ctx = Context::builder(nodes).config(config).build().unwrap();
    let id = ctx.add_device("/dev/ums0").unwrap();
    let seat = &ctx[ctx[id].seat()];
    assert_eq!(seat.physical_name(), "seat1");
    assert_eq!(seat.logical_name(), "desk");
}

#[test]
fn direct_io_reads_a_fifo() {
    init_tracing();
    let path = std::env::temp_dir().join(format!("inputmux-fifo-{}", std::process::id()));
    let _ = std::fs::remove_file(&path);
    nix::unistd::mkfifo(&path, Mode::S_IRUSR | Mode::S_IWUSR).unwrap();

    let mut ctx = Context::builder(DirectIo).build().unwrap();
    let id = ctx
        .add_device_with(&path, DeviceKind::Pointer, DeviceProtocol::MousePacket)
        .unwrap();
    assert_eq!(ctx[id].devnode(), path.as_path());
    drain(&mut ctx);

    let mut writer = OpenOptions::new().write(true).open(&path).unwrap();
    writer.write_all(&[0x87, 0, 0, 0, 0, 0, 0, 0]).unwrap();
    writer.write_all(&[0x87, 5, 0, 0, 0, 0, 0, 0]).unwrap();
    ctx.dispatch().unwrap();

    let motion = drain(&mut ctx)
        .into_iter()
        .find(|event| event.event_type() == EventType::PointerMotion)
        .map(|event| event.kind);
    assert_eq!(
        motion,
        Some(EventKind::PointerMotion {
            dx: 5.0,
            dy: 0.0,
            dx_unaccelerated: 5.0,
            dy_unaccelerated: 0.0,
        })
    );

    ctx.remove_device(id).unwrap();
    drop(ctx);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_node_reports_open_error() {
    let mut ctx = Context::builder(DirectIo).build().unwrap();
    let err = ctx
        .add_device_with(
            "/nonexistent/inputmux/sysmouse",
            DeviceKind::Pointer,
            DeviceProtocol::MousePacket,
        )
        .unwrap_err();
    match err {
        InputError::Open { path, source } => {
            assert_eq!(path, PathBuf::from("/nonexistent/inputmux/sysmouse"));
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
}

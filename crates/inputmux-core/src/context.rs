//! The context: composition root of the engine.
//!
//! A [`Context`] owns the multiplexer, the event queue, and the device and
//! seat arenas. Clients drive it by calling [`Context::dispatch`] whenever
//! the descriptor from [`Context::as_fd`] is readable, then pull events with
//! [`Context::get_event`] until it returns `None`.
//!
//! Every queued event pins the device it came from. A removed device stays
//! resolvable until the last event referring to it has been pulled; the
//! seat goes away with its last device record.

use std::fs::File;
use std::ops::Index;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::Path;

use inputmux_types::{
    AxisSource, AxisValue, DeviceCapability, DeviceId, DeviceKind, DeviceProtocol, Event,
    EventKind, EventType, SeatId,
};
use nix::fcntl::OFlag;
use nix::time::{clock_gettime, ClockId};
use tracing::{debug, error, info, info_span, trace, warn, Span};

use crate::arena::Arena;
use crate::config::ContextConfig;
use crate::decode::{Decoder, Notification, ScrollAxis};
use crate::detect::detect;
use crate::device::{ConfigStatus, Device};
use crate::error::InputError;
use crate::filter::{flat_filter_factory, AccelProfile, AccelProfiles, FilterFactory};
use crate::poll::Multiplexer;
use crate::queue::EventQueue;
use crate::restricted::RestrictedIo;
use crate::seat::Seat;

/// Largest `initial_queue_capacity` a configuration may ask for. The queue
/// still grows past it on demand.
pub const MAX_INITIAL_QUEUE_CAPACITY: usize = 1 << 16;

/// Builder for [`Context`].
pub struct ContextBuilder {
    io: Box<dyn RestrictedIo>,
    config: ContextConfig,
    span: Option<Span>,
    filter_factory: Option<FilterFactory>,
}

impl ContextBuilder {
    #[must_use]
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Span entered by every context operation. Defaults to
    /// `info_span!("inputmux")`.
    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Source of motion filters for pointer devices. The flat filter is used
    /// unless replaced here.
    #[must_use]
    pub fn filter_factory(mut self, factory: FilterFactory) -> Self {
        self.filter_factory = Some(factory);
        self
    }

    /// Leave pointer motion unaccelerated.
    #[must_use]
    pub fn without_acceleration(mut self) -> Self {
        self.filter_factory = None;
        self
    }

    pub fn build(self) -> Result<Context, InputError> {
        let speed = self.config.pointer.accel_speed;
        if !(-1.0..=1.0).contains(&speed) {
            return Err(InputError::Config(format!(
                "pointer.accel_speed {speed} is outside [-1, 1]"
            )));
        }
        let capacity = self.config.initial_queue_capacity;
        if capacity > MAX_INITIAL_QUEUE_CAPACITY {
            return Err(InputError::Config(format!(
                "initial_queue_capacity {capacity} exceeds {MAX_INITIAL_QUEUE_CAPACITY}"
            )));
        }

        let span = self.span.unwrap_or_else(|| info_span!("inputmux"));
        let mux = {
            let _enter = span.enter();
            Multiplexer::new()?
        };

        Ok(Context {
            mux,
            state: State {
                queue: EventQueue::with_capacity(self.config.initial_queue_capacity),
                devices: Arena::new(),
                seats: Arena::new(),
                io: self.io,
                filter_factory: self.filter_factory,
                read_buf: Vec::new(),
                decoded: Vec::new(),
                config: self.config,
            },
            span,
        })
    }
}

pub struct Context {
    span: Span,
    mux: Multiplexer<DeviceId>,
    state: State,
}

/// Everything a device callback may touch during a dispatch.
struct State {
    config: ContextConfig,
    queue: EventQueue<Event>,
    devices: Arena<DeviceId, Device>,
    seats: Arena<SeatId, Seat>,
    io: Box<dyn RestrictedIo>,
    filter_factory: Option<FilterFactory>,
    read_buf: Vec<u8>,
    decoded: Vec<(u64, Notification)>,
}

impl Context {
    pub fn builder(io: impl RestrictedIo + 'static) -> ContextBuilder {
        ContextBuilder {
            io: Box::new(io),
            config: ContextConfig::default(),
            span: None,
            filter_factory: Some(flat_filter_factory()),
        }
    }

    /// Read and decode everything the ready devices have to offer.
    ///
    /// Runs one non-blocking readiness query; decoded events are queued for
    /// [`Context::get_event`]. Returns the number of ready sources.
    pub fn dispatch(&mut self) -> Result<usize, InputError> {
        let span = self.span.clone();
        let _enter = span.enter();

        let state = &mut self.state;
        let ready = self
            .mux
            .poll_once(|_, device| state.dispatch_device(device))?;
        trace!(ready, queued = state.queue.len(), "dispatch complete");
        Ok(ready)
    }

    /// Pull the next queued event.
    pub fn get_event(&mut self) -> Option<Event> {
        let span = self.span.clone();
        let _enter = span.enter();

        let event = self.state.queue.pop()?;
        self.state.release_pin(event.device_id);
        Some(event)
    }

    /// Type of the next queued event, without removing it.
    pub fn peek_event_type(&self) -> Option<EventType> {
        self.state.queue.peek().map(Event::event_type)
    }

    /// Number of events waiting to be pulled.
    pub fn pending_events(&self) -> usize {
        self.state.queue.len()
    }

    /// Open a device node, classifying it by path.
    pub fn add_device(&mut self, path: impl AsRef<Path>) -> Result<DeviceId, InputError> {
        let path = path.as_ref();
        let (kind, protocol) = detect(&self.state.config.detect, path)
            .ok_or_else(|| InputError::UnsupportedDevice(path.to_path_buf()))?;
        self.add_device_with(path, kind, protocol)
    }

    /// Open a device node with an explicit kind and protocol.
    pub fn add_device_with(
        &mut self,
        path: impl AsRef<Path>,
        kind: DeviceKind,
        protocol: DeviceProtocol,
    ) -> Result<DeviceId, InputError> {
        let span = self.span.clone();
        let _enter = span.enter();
        let path = path.as_ref();

        let fd = self
            .state
            .io
            .open_restricted(path, OFlag::O_RDWR | OFlag::O_NONBLOCK | OFlag::O_CLOEXEC)
            .map_err(|source| InputError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let id = self.state.devices.next_key();
        let source = match self.mux.register(fd.as_fd(), id) {
            Ok(source) => source,
            Err(e) => {
                self.state.io.close_restricted(fd);
                return Err(e);
            }
        };

        let state = &mut self.state;
        let seat = state.seat_acquire();
        let decoder = Decoder::for_protocol(protocol, state.config.pointer.wheel_format);
        let mut device = Device::new(seat, path, kind, decoder, File::from(fd));
        device.source = Some(source);
        if kind == DeviceKind::Pointer {
            device.filter = state.build_filter(state.config.pointer.accel_profile);
        }

        let sysname = device.sysname().to_owned();
        let inserted = state.devices.insert(device);
        debug_assert_eq!(inserted, id);
        if let Some(seat) = state.seats.get_mut(seat) {
            seat.attach(id);
        }

        info!(device = %sysname, path = %path.display(), ?kind, ?protocol, "device added");
        state.post(id, now_us(), EventKind::DeviceAdded);
        Ok(id)
    }

    /// Close a device and queue its `DeviceRemoved` event.
    ///
    /// The device record remains resolvable until that event is pulled.
    pub fn remove_device(&mut self, id: DeviceId) -> Result<(), InputError> {
        let span = self.span.clone();
        let _enter = span.enter();

        let state = &mut self.state;
        let device = state
            .devices
            .get_mut(id)
            .filter(|device| !device.removed)
            .ok_or(InputError::DeadDevice(id))?;

        if let Some(source) = device.source.take() {
            self.mux.unregister(source);
        }
        let file = device.file.take();
        device.removed = true;
        let seat = device.seat();
        info!(device = %device.sysname(), "device removed");

        if let Some(file) = file {
            state.io.close_restricted(OwnedFd::from(file));
        }
        if let Some(seat) = state.seats.get_mut(seat) {
            seat.detach(id);
        }

        state.post(id, now_us(), EventKind::DeviceRemoved);
        state.destroy_if_unpinned(id);
        Ok(())
    }

    /// A device record, including removed devices with queued events.
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.state.devices.get(id)
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.state.devices.get_mut(id)
    }

    /// Handles of devices that have not been removed.
    pub fn devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.state
            .devices
            .iter()
            .filter(|(_, device)| !device.removed)
            .map(|(id, _)| id)
    }

    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.state.seats.get(id)
    }

    pub fn seats(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.state.seats.keys()
    }

    /// Moving devices between logical seats is not supported.
    pub fn set_seat_logical_name(&mut self, _device: DeviceId, _name: &str) -> Result<(), InputError> {
        Err(InputError::Unsupported("changing a device's logical seat"))
    }

    /// Profiles the device can switch between.
    pub fn accel_profiles(&self, id: DeviceId) -> AccelProfiles {
        self.device(id)
            .map_or(AccelProfiles::empty(), |device| {
                device.profiles_from(self.state.available_profiles())
            })
    }

    /// Profile a pointer starts out with.
    pub fn accel_default_profile(&self, id: DeviceId) -> AccelProfile {
        match self.device(id) {
            Some(device) if device.accel_is_available() => self.state.config.pointer.accel_profile,
            _ => AccelProfile::None,
        }
    }

    /// Swap the device's motion filter, keeping its speed. The old filter
    /// stays in place if the new one cannot be built.
    pub fn accel_set_profile(
        &mut self,
        id: DeviceId,
        profile: AccelProfile,
    ) -> Result<ConfigStatus, InputError> {
        let span = self.span.clone();
        let _enter = span.enter();

        let state = &mut self.state;
        let device = state
            .devices
            .get(id)
            .filter(|device| !device.removed)
            .ok_or(InputError::DeadDevice(id))?;
        if !device.accel_is_available() {
            return Ok(ConfigStatus::Unsupported);
        }
        if profile == AccelProfile::None {
            return Ok(ConfigStatus::Invalid);
        }
        if device.accel_profile() == profile {
            return Ok(ConfigStatus::Success);
        }

        let speed = device.accel_speed();
        let Some(mut filter) = state.build_filter(profile) else {
            return Ok(ConfigStatus::Unsupported);
        };
        if !filter.set_speed(speed) {
            warn!(speed, ?profile, "new filter rejected the current speed");
        }
        if let Some(device) = state.devices.get_mut(id) {
            device.filter = Some(filter);
            debug!(device = %device.sysname(), ?profile, "acceleration profile changed");
        }
        Ok(ConfigStatus::Success)
    }

    pub fn config(&self) -> &ContextConfig {
        &self.state.config
    }
}

/// The readiness descriptor. Wait for it to become readable, then call
/// [`Context::dispatch`].
impl AsFd for Context {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.mux.as_fd()
    }
}

impl Index<DeviceId> for Context {
    type Output = Device;

    fn index(&self, id: DeviceId) -> &Device {
        self.device(id)
            .unwrap_or_else(|| panic!("dead device handle {id}"))
    }
}

impl Index<SeatId> for Context {
    type Output = Seat;

    fn index(&self, id: SeatId) -> &Seat {
        self.seat(id).unwrap_or_else(|| panic!("dead seat handle {id}"))
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let span = self.span.clone();
        let _enter = span.enter();

        let state = &mut self.state;
        while let Some(event) = state.queue.pop() {
            state.release_pin(event.device_id);
        }

        let remaining: Vec<DeviceId> = state.devices.keys().collect();
        for id in remaining {
            let Some(device) = state.devices.get_mut(id) else {
                continue;
            };
            if let Some(source) = device.source.take() {
                self.mux.unregister(source);
            }
            device.removed = true;
            device.pins = 0;
            state.destroy_if_unpinned(id);
        }

        self.mux.reclaim();
        debug!(seats = state.seats.len(), "context torn down");
    }
}

impl State {
    fn seat_acquire(&mut self) -> SeatId {
        let (physical, logical) = (&self.config.seat.physical, &self.config.seat.logical);
        if let Some((id, _)) = self
            .seats
            .iter()
            .find(|(_, seat)| seat.matches(physical, logical))
        {
            return id;
        }
        let id = self.seats.insert(Seat::new(physical.as_str(), logical.as_str()));
        debug!(%id, physical = %physical, logical = %logical, "seat created");
        id
    }

    fn build_filter(&self, profile: AccelProfile) -> Option<Box<dyn crate::filter::MotionFilter>> {
        let factory = self.filter_factory.as_ref()?;
        let Some(mut filter) = factory(profile) else {
            debug!(?profile, "no motion filter for profile");
            return None;
        };
        if !filter.set_speed(self.config.pointer.accel_speed) {
            warn!(speed = self.config.pointer.accel_speed, "motion filter rejected speed");
        }
        Some(filter)
    }

    fn available_profiles(&self) -> AccelProfiles {
        let Some(factory) = self.filter_factory.as_ref() else {
            return AccelProfiles::empty();
        };
        let mut profiles = AccelProfiles::empty();
        if factory(AccelProfile::Flat).is_some() {
            profiles |= AccelProfiles::FLAT;
        }
        if factory(AccelProfile::Adaptive).is_some() {
            profiles |= AccelProfiles::ADAPTIVE;
        }
        profiles
    }

    fn dispatch_device(&mut self, id: DeviceId) {
        let Some(device) = self.devices.get_mut(id).filter(|device| !device.removed) else {
            return;
        };

        let size = device.decoder_mut().read_size();
        self.read_buf.resize(size, 0);
        let len = match device.read_available(&mut self.read_buf) {
            Ok(0) => return,
            Ok(len) => len,
            Err(e) => {
                warn!(device = %device.sysname(), error = %e, "device read failed");
                return;
            }
        };

        self.decoded.clear();
        let now = now_us();
        if let Err(e) = device
            .decoder_mut()
            .decode(&self.read_buf[..len], now, &mut self.decoded)
        {
            panic!("{}: {e}", device.sysname());
        }

        let decoded = std::mem::take(&mut self.decoded);
        for &(time, notification) in &decoded {
            self.process(id, time, notification);
        }
        self.decoded = decoded;
    }

    fn process(&mut self, id: DeviceId, time_us: u64, notification: Notification) {
        let Some(device) = self.devices.get_mut(id) else {
            return;
        };

        let required = match notification {
            Notification::Key { .. } => DeviceCapability::Keyboard,
            _ => DeviceCapability::Pointer,
        };
        if !device.has_capability(required) {
            error!(
                device = %device.sysname(),
                ?required,
                "BUG: event for a capability the device does not have"
            );
            return;
        }

        let kind = match notification {
            Notification::Key { key, state } => {
                let Some(seat) = self.seats.get_mut(device.seat()) else {
                    return;
                };
                EventKind::Key {
                    key,
                    state,
                    seat_key_count: seat.update_count(key, state),
                }
            }
            Notification::Button { button, state } => {
                let Some(seat) = self.seats.get_mut(device.seat()) else {
                    return;
                };
                EventKind::PointerButton {
                    button,
                    state,
                    seat_button_count: seat.update_count(button, state),
                }
            }
            Notification::Motion(raw) => {
                let accel = match device.filter.as_mut() {
                    Some(filter) => filter.dispatch(raw, id, time_us),
                    None => raw,
                };
                if accel.is_zero() && raw.is_zero() {
                    return;
                }
                EventKind::PointerMotion {
                    dx: accel.x,
                    dy: accel.y,
                    dx_unaccelerated: raw.x,
                    dy_unaccelerated: raw.y,
                }
            }
            Notification::Scroll { axis, value } => {
                let axis_value = Some(AxisValue {
                    value,
                    discrete: value,
                });
                let (vertical, horizontal) = match axis {
                    ScrollAxis::Vertical => (axis_value, None),
                    ScrollAxis::Horizontal => (None, axis_value),
                };
                EventKind::PointerAxis {
                    source: AxisSource::Wheel,
                    vertical,
                    horizontal,
                }
            }
        };

        self.post(id, time_us, kind);
    }

    /// Queue an event and pin its device. If the queue cannot grow the event
    /// is dropped.
    fn post(&mut self, id: DeviceId, timestamp_us: u64, kind: EventKind) {
        let event = Event {
            device_id: id,
            timestamp_us,
            kind,
        };
        match self.queue.push(event) {
            Ok(()) => {
                if let Some(device) = self.devices.get_mut(id) {
                    device.pins += 1;
                }
            }
            Err(event) => {
                error!(
                    %id,
                    event = %event.event_type(),
                    error = %InputError::QueueGrowth,
                    "dropping event"
                );
            }
        }
    }

    fn release_pin(&mut self, id: DeviceId) {
        if let Some(device) = self.devices.get_mut(id) {
            device.pins = device.pins.saturating_sub(1);
        }
        self.destroy_if_unpinned(id);
    }

    /// Free a removed device once nothing in the queue refers to it, and its
    /// seat with it when it was the last member.
    fn destroy_if_unpinned(&mut self, id: DeviceId) {
        match self.devices.get(id) {
            Some(device) if device.removed && device.pins == 0 => {}
            _ => return,
        }
        let Some(mut device) = self.devices.remove(id) else {
            return;
        };
        if let Some(file) = device.file.take() {
            self.io.close_restricted(OwnedFd::from(file));
        }

        let seat_id = device.seat();
        let seat_empty = self.seats.get_mut(seat_id).is_some_and(|seat| {
            seat.detach(id);
            seat.release_member()
        });
        if seat_empty {
            self.seats.remove(seat_id);
            debug!(%seat_id, "seat destroyed");
        }
        trace!(%id, "device record destroyed");
    }
}

fn now_us() -> u64 {
    match clock_gettime(ClockId::CLOCK_MONOTONIC) {
        Ok(ts) => {
            let sec = u64::try_from(ts.tv_sec()).unwrap_or(0);
            let nsec = u64::try_from(ts.tv_nsec()).unwrap_or(0);
            sec.saturating_mul(1_000_000).saturating_add(nsec / 1_000)
        }
        Err(e) => {
            warn!(error = %e, "monotonic clock unavailable");
            0
        }
    }
}

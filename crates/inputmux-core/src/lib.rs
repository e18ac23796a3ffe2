//! Event dispatch and queueing engine for inputmux.
//!
//! Opens character devices through an embedder-supplied [`RestrictedIo`],
//! multiplexes their descriptors through one readiness channel, decodes the
//! raw mouse packets and event records they produce, and queues the
//! resulting [`Event`](inputmux_types::Event)s for the client to pull.
//!
//! Platform backends:
//! - **Linux/Android**: epoll
//! - **FreeBSD, DragonFly, OpenBSD, NetBSD, macOS**: kqueue
//!
//! The `mock` feature provides [`mock::MockIo`], which serves fake device
//! nodes backed by Unix socket pairs.

pub mod arena;
pub mod config;
pub mod context;
pub mod decode;
pub mod detect;
pub mod device;
pub mod error;
pub mod filter;
pub mod poll;
pub mod queue;
pub mod restricted;
pub mod seat;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::ContextConfig;
pub use context::{Context, ContextBuilder};
pub use device::{ConfigStatus, Device};
pub use error::InputError;
pub use filter::{AccelProfile, AccelProfiles, FilterFactory, FlatFilter, MotionFilter};
pub use restricted::{DirectIo, RestrictedIo};
pub use seat::Seat;

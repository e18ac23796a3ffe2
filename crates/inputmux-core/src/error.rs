//! Input engine errors.

use std::io;
use std::path::PathBuf;

use inputmux_types::DeviceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to open device {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported device: {}", .0.display())]
    UnsupportedDevice(PathBuf),

    #[error("failed to create readiness selector: {0}")]
    Selector(#[source] io::Error),

    #[error("failed to register descriptor: {0}")]
    Register(#[source] io::Error),

    #[error("readiness query failed: {0}")]
    Poll(#[source] io::Error),

    #[error("failed to grow the event queue")]
    QueueGrowth,

    #[error("device handle is no longer valid: {0}")]
    DeadDevice(DeviceId),

    #[error("not supported: {0}")]
    Unsupported(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}

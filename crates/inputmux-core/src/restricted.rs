//! Restricted device access.
//!
//! The engine never opens or closes device nodes itself. Embedders inject a
//! [`RestrictedIo`] so that a privileged helper, a seat manager or a sandbox
//! broker can mediate access.

use std::fs::OpenOptions;
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use nix::fcntl::OFlag;
use tracing::debug;

/// Open/close callbacks supplied by the embedder.
pub trait RestrictedIo {
    /// Open `path` with the given flags.
    fn open_restricted(&mut self, path: &Path, flags: OFlag) -> io::Result<OwnedFd>;

    /// Give back a descriptor previously returned by `open_restricted`.
    fn close_restricted(&mut self, fd: OwnedFd);
}

/// Opens device nodes directly with the process's own privileges.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectIo;

impl RestrictedIo for DirectIo {
    fn open_restricted(&mut self, path: &Path, flags: OFlag) -> io::Result<OwnedFd> {
        let accmode = flags & OFlag::O_ACCMODE;
        let file = OpenOptions::new()
            .read(accmode != OFlag::O_WRONLY)
            .write(accmode != OFlag::O_RDONLY)
            .custom_flags(flags.difference(OFlag::O_ACCMODE).bits())
            .open(path)?;
        debug!(path = %path.display(), "opened device node");
        Ok(OwnedFd::from(file))
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        drop(fd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_open_reports_missing_node() {
        let err = DirectIo
            .open_restricted(
                Path::new("/nonexistent/inputmux/node"),
                OFlag::O_RDWR | OFlag::O_NONBLOCK,
            )
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn direct_open_read_only() {
        let fd = DirectIo
            .open_restricted(Path::new("/dev/null"), OFlag::O_RDONLY | OFlag::O_CLOEXEC)
            .unwrap();
        DirectIo.close_restricted(fd);
    }
}

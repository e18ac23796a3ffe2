//! In-memory restricted I/O for tests and demos.
//!
//! Device nodes are Unix socket pairs: the context reads from one end and
//! the test writes raw device bytes into the other.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use nix::fcntl::OFlag;
use tracing::debug;

use crate::restricted::RestrictedIo;

#[derive(Default)]
struct MockState {
    nodes: HashMap<PathBuf, UnixStream>,
    open: HashMap<RawFd, PathBuf>,
    opened: Vec<PathBuf>,
    closed: Vec<PathBuf>,
}

/// A [`RestrictedIo`] that serves fake device nodes.
///
/// Clones share state, so a test can keep one handle while the context owns
/// another.
#[derive(Clone, Default)]
pub struct MockIo {
    state: Rc<RefCell<MockState>>,
}

impl MockIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fake node at `path` and return the end to write device bytes
    /// into.
    pub fn add_node(&self, path: impl Into<PathBuf>) -> io::Result<UnixStream> {
        let (writer, reader) = UnixStream::pair()?;
        self.state.borrow_mut().nodes.insert(path.into(), reader);
        Ok(writer)
    }

    /// Paths opened so far, in order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.state.borrow().opened.clone()
    }

    /// Paths closed so far, in order.
    pub fn closed(&self) -> Vec<PathBuf> {
        self.state.borrow().closed.clone()
    }

    /// Descriptors handed out and not yet given back.
    pub fn open_count(&self) -> usize {
        self.state.borrow().open.len()
    }
}

impl RestrictedIo for MockIo {
    fn open_restricted(&mut self, path: &Path, flags: OFlag) -> io::Result<OwnedFd> {
        let mut state = self.state.borrow_mut();
        let node = state
            .nodes
            .get(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        let stream = node.try_clone()?;
        stream.set_nonblocking(flags.contains(OFlag::O_NONBLOCK))?;
        let fd = OwnedFd::from(stream);

        state.open.insert(fd.as_raw_fd(), path.to_path_buf());
        state.opened.push(path.to_path_buf());
        debug!(path = %path.display(), "mock node opened");
        Ok(fd)
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        let mut state = self.state.borrow_mut();
        if let Some(path) = state.open.remove(&fd.as_raw_fd()) {
            debug!(path = %path.display(), "mock node closed");
            state.closed.push(path);
        }
    }
}

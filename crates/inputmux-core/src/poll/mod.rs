//! Readiness multiplexer.
//!
//! Wraps one OS readiness channel (epoll or kqueue) and maps ready
//! descriptors back to the targets they were registered with. Each source
//! owns a duplicate of the caller's descriptor, so the multiplexer controls
//! when the readiness registration actually goes away.
//!
//! Unregistering a source is deferred: the source stops being reported and
//! is marked dead immediately, but its slot is only reclaimed after the
//! current [`Multiplexer::poll_once`] batch. A dead source that is still in
//! the batch is skipped.

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use tracing::{debug, trace};

use crate::arena::{Arena, ArenaKey};
use crate::error::InputError;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod epoll;
#[cfg(any(target_os = "linux", target_os = "android"))]
use epoll::Selector;

#[cfg(any(
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "macos",
    target_os = "ios"
))]
mod kqueue;
#[cfg(any(
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "macos",
    target_os = "ios"
))]
use kqueue::Selector;

/// Handle to a registered source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId {
    index: u32,
    generation: u32,
}

impl ArenaKey for SourceId {
    fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    fn index(self) -> u32 {
        self.index
    }

    fn generation(self) -> u32 {
        self.generation
    }
}

impl SourceId {
    fn token(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_token(token: u64) -> Self {
        Self {
            index: token as u32,
            generation: (token >> 32) as u32,
        }
    }
}

struct Source<T> {
    fd: OwnedFd,
    target: T,
    live: bool,
}

pub struct Multiplexer<T> {
    selector: Selector,
    sources: Arena<SourceId, Source<T>>,
    pending_free: Vec<SourceId>,
    ready: Vec<u64>,
}

impl<T: Copy> Multiplexer<T> {
    pub fn new() -> Result<Self, InputError> {
        Ok(Self {
            selector: Selector::new().map_err(InputError::Selector)?,
            sources: Arena::new(),
            pending_free: Vec::new(),
            ready: Vec::new(),
        })
    }

    /// Watch `fd` for readability and report it as `target`.
    pub fn register(&mut self, fd: BorrowedFd<'_>, target: T) -> Result<SourceId, InputError> {
        let fd = fd.try_clone_to_owned().map_err(InputError::Register)?;
        let id = self.sources.next_key();
        self.selector
            .add(fd.as_fd(), id.token())
            .map_err(InputError::Register)?;
        self.sources.insert(Source {
            fd,
            target,
            live: true,
        });

        trace!(?id, "source registered");
        Ok(id)
    }

    /// Stop reporting a source. Its slot is reclaimed after the current batch.
    pub fn unregister(&mut self, id: SourceId) {
        let Some(source) = self.sources.get_mut(id) else {
            return;
        };
        if !source.live {
            return;
        }
        source.live = false;
        if let Err(e) = self.selector.delete(source.fd.as_fd()) {
            debug!(?id, error = %e, "failed to remove source from selector");
        }
        self.pending_free.push(id);
        trace!(?id, "source unregistered");
    }

    pub fn is_live(&self, id: SourceId) -> bool {
        self.sources.get(id).is_some_and(|source| source.live)
    }

    /// Number of sources still holding a slot, live or awaiting reclaim.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Run one non-blocking readiness query and invoke `callback` for each
    /// ready, live source in the order the OS reported them.
    ///
    /// The callback receives the multiplexer so it can unregister sources,
    /// including ones later in the same batch. Returns the number of
    /// readiness reports.
    pub fn poll_once(&mut self, mut callback: impl FnMut(&mut Self, T)) -> Result<usize, InputError> {
        let mut ready = std::mem::take(&mut self.ready);
        ready.clear();

        let count = match self.selector.select(&mut ready) {
            Ok(count) => count,
            Err(e) => {
                self.ready = ready;
                return Err(InputError::Poll(e));
            }
        };

        for &token in &ready {
            let id = SourceId::from_token(token);
            let target = match self.sources.get(id) {
                Some(source) if source.live => source.target,
                _ => continue,
            };
            callback(self, target);
        }

        self.ready = ready;
        self.reclaim();
        Ok(count)
    }

    /// Free every source unregistered since the last reclaim.
    pub fn reclaim(&mut self) {
        for id in self.pending_free.drain(..) {
            self.sources.remove(id);
        }
    }

    /// The readiness descriptor itself, for embedders that wait on it.
    pub fn as_fd(&self) -> BorrowedFd<'_> {
        self.selector.as_fd()
    }
}

//! kqueue-backed readiness selector (FreeBSD, DragonFly, OpenBSD, NetBSD, macOS).

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};

use nix::errno::Errno;
use nix::sys::event::{EventFilter, EventFlag, FilterFlag, KEvent, Kqueue};

const MAX_EVENTS: usize = 32;

pub(crate) struct Selector {
    kq: Kqueue,
    events: Vec<KEvent>,
}

#[allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation
)]
fn read_event(fd: BorrowedFd<'_>, flags: EventFlag, token: u64) -> KEvent {
    KEvent::new(
        fd.as_raw_fd() as usize,
        EventFilter::EVFILT_READ,
        flags,
        FilterFlag::empty(),
        0,
        token as isize,
    )
}

impl Selector {
    pub(crate) fn new() -> io::Result<Self> {
        let kq = Kqueue::new()?;
        let blank = KEvent::new(
            0,
            EventFilter::EVFILT_READ,
            EventFlag::empty(),
            FilterFlag::empty(),
            0,
            0,
        );
        Ok(Self {
            kq,
            events: vec![blank; MAX_EVENTS],
        })
    }

    pub(crate) fn add(&self, fd: BorrowedFd<'_>, token: u64) -> io::Result<()> {
        let change = read_event(fd, EventFlag::EV_ADD | EventFlag::EV_ENABLE, token);
        self.kq.kevent(&[change], &mut [], None)?;
        Ok(())
    }

    pub(crate) fn delete(&self, fd: BorrowedFd<'_>) -> io::Result<()> {
        let change = read_event(fd, EventFlag::EV_DELETE, 0);
        self.kq.kevent(&[change], &mut [], None)?;
        Ok(())
    }

    /// Collect the tokens of ready sources without blocking.
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn select(&mut self, tokens: &mut Vec<u64>) -> io::Result<usize> {
        let zero = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        let count = match self.kq.kevent(&[], &mut self.events, Some(zero)) {
            Ok(count) => count,
            Err(Errno::EINTR) => 0,
            Err(e) => return Err(e.into()),
        };
        tokens.extend(
            self.events[..count]
                .iter()
                .filter(|ev| matches!(ev.filter(), Ok(EventFilter::EVFILT_READ)))
                .map(|ev| ev.udata() as u64),
        );
        Ok(count)
    }

    pub(crate) fn as_fd(&self) -> BorrowedFd<'_> {
        self.kq.as_fd()
    }
}

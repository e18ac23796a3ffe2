//! Growable circular event queue.
//!
//! A ring buffer over a contiguous slot vector. When a push finds the ring
//! full, capacity doubles and the occupied runs are repaired so that the
//! read order is unchanged:
//!
//! - the ring was full with `write == 0`: the data is one run
//!   `[read, old_cap)` and writing continues at `old_cap`;
//! - the ring wrapped (`read >= write`): the tail run `[read, old_cap)` moves
//!   to the far end of the enlarged storage, the head run `[0, write)` stays;
//! - otherwise the extra slots simply follow the write position.

use tracing::trace;

#[derive(Debug)]
pub struct EventQueue<T> {
    slots: Vec<Option<T>>,
    write: usize,
    read: usize,
    count: usize,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::with_capacity(4)
    }
}

impl<T> EventQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            write: 0,
            read: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append an item, growing the ring when it is full.
    ///
    /// If the backing storage cannot grow the item is handed back.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.count == self.capacity() && self.grow().is_err() {
            return Err(item);
        }

        self.slots[self.write] = Some(item);
        self.write = (self.write + 1) % self.capacity();
        self.count += 1;
        Ok(())
    }

    /// Remove the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let item = self.slots[self.read].take();
        self.read = (self.read + 1) % self.capacity();
        self.count -= 1;
        item
    }

    /// The oldest item, without removing it.
    pub fn peek(&self) -> Option<&T> {
        if self.count == 0 {
            return None;
        }
        self.slots[self.read].as_ref()
    }

    /// Pop everything, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    fn grow(&mut self) -> Result<(), std::collections::TryReserveError> {
        let old_capacity = self.capacity();
        let new_capacity = (old_capacity * 2).max(1);

        self.slots.try_reserve_exact(new_capacity - old_capacity)?;
        self.slots.resize_with(new_capacity, || None);

        if self.count > 0 && self.write == 0 {
            self.write = old_capacity;
        } else if self.count > 0 && self.read >= self.write {
            let move_len = old_capacity - self.read;
            let new_read = new_capacity - move_len;
            for offset in (0..move_len).rev() {
                self.slots[new_read + offset] = self.slots[self.read + offset].take();
            }
            self.read = new_read;
        }

        trace!(
            old_capacity,
            new_capacity,
            read = self.read,
            write = self.write,
            "event queue grown"
        );
        Ok(())
    }
}

//! Fixed-capacity undo history.

/// A ring of the last `N` snapshots.
///
/// The capacity is a type parameter, so the undo limit cannot be exceeded:
/// pushing onto a full ring overwrites the oldest snapshot. Snapshots are
/// moved in and moved out, never edited in place.
#[derive(Debug, Clone)]
pub struct UndoRing<T, const N: usize> {
    slots: [Option<T>; N],
    /// Slot the next push writes to.
    next: usize,
    len: usize,
}

impl<T, const N: usize> UndoRing<T, N> {
    pub fn new() -> Self {
        const { assert!(N > 0, "undo ring needs at least one slot") };
        Self {
            slots: std::array::from_fn(|_| None),
            next: 0,
            len: 0,
        }
    }

    /// Stores a snapshot, evicting the oldest one if the ring is full.
    pub fn push(&mut self, snapshot: T) {
        self.slots[self.next] = Some(snapshot);
        self.next = (self.next + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    /// Removes and returns the most recent snapshot.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.next = (self.next + N - 1) % N;
        self.len -= 1;
        self.slots[self.next].take()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for UndoRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

//! Static cells for statically reserved device memory.
//!
//! Shared-memory queues must live at a fixed address for as long as the
//! device may touch them, and the subsystem never allocates. [`TakeOnce`]
//! reserves such memory in a `static` and hands out the single `&'static mut`
//! to it.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

/// An `UnsafeCell` wrapper that implements `Send` and `Sync`.
///
/// The caller must ensure all accesses are properly synchronised.
#[repr(transparent)]
pub struct RacyCell<T>(UnsafeCell<T>);

// SAFETY: The user of `RacyCell` is responsible for ensuring proper
// synchronisation. `T: Send` is required because the data may move between
// threads.
unsafe impl<T: Send> Send for RacyCell<T> {}
// SAFETY: As above, the user guarantees no data races.
unsafe impl<T: Send> Sync for RacyCell<T> {}

impl<T> RacyCell<T> {
    /// Creates a new `RacyCell` wrapping `value`.
    #[inline]
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// Returns a raw pointer to the underlying data.
    #[inline]
    pub const fn get(&self) -> *mut T {
        self.0.get()
    }
}

/// A static value whose unique mutable reference can be taken exactly once.
///
/// ```ignore
/// static ARENA: TakeOnce<QueueArena> = TakeOnce::new(QueueArena::new());
///
/// let arena: &'static mut QueueArena = ARENA.take().unwrap();
/// assert!(ARENA.take().is_none());
/// ```
pub struct TakeOnce<T> {
    taken: AtomicBool,
    value: RacyCell<T>,
}

impl<T> TakeOnce<T> {
    /// Creates a new, untaken cell.
    pub const fn new(value: T) -> Self {
        Self {
            taken: AtomicBool::new(false),
            value: RacyCell::new(value),
        }
    }

    /// Takes the unique mutable reference, or `None` if it was already taken.
    pub fn take(&'static self) -> Option<&'static mut T> {
        if self
            .taken
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            // SAFETY: The flag transition above succeeds exactly once, so this
            // is the only mutable reference ever created.
            Some(unsafe { &mut *self.value.get() })
        } else {
            None
        }
    }

    /// Returns `true` if the reference has been handed out.
    pub fn is_taken(&self) -> bool {
        self.taken.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_once_hands_out_single_reference() {
        static SLOT: TakeOnce<[u32; 4]> = TakeOnce::new([0; 4]);

        assert!(!SLOT.is_taken());
        let slot = SLOT.take().expect("first take succeeds");
        slot[2] = 9;
        assert!(SLOT.is_taken());
        assert!(SLOT.take().is_none());
        assert_eq!(slot[2], 9);
    }

    #[test]
    fn racy_cell_get_points_at_value() {
        let cell = RacyCell::new(5u8);
        // SAFETY: Single-threaded test, no other access.
        unsafe { *cell.get() += 1 };
        // SAFETY: As above.
        assert_eq!(unsafe { *cell.get() }, 6);
    }
}

//! Split virtqueue over a statically reserved arena.
//!
//! Every descriptor owns one fixed, device-writable buffer. Descriptors are
//! never chained and never freed: a completed descriptor is handed straight
//! back to the device through the available ring, so the queue stays full.

use core::marker::PhantomData;
use core::mem::size_of;
use core::ptr;

use stylus_core::addr::{PhysAddr, VirtAddr};
use stylus_driver_api::DmaTranslate;
use stylus_mmio::{acquire, release};

use crate::config::QUEUE_SIZE;

// -- Descriptor flags ---------------------------------------------------------

/// Buffer is device-writable (otherwise device-readable).
pub const VIRTQ_DESC_F_WRITE: u16 = 2;

/// A single virtqueue descriptor.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtqDesc {
    /// Physical address of the buffer.
    pub addr: u64,
    /// Length of the buffer in bytes.
    pub len: u32,
    /// Descriptor flags.
    pub flags: u16,
    /// Next descriptor in a chain. Unused here.
    pub next: u16,
}

/// A completion taken from the used ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedElem {
    /// Descriptor index the device filled.
    pub id: u32,
    /// Bytes written by the device.
    pub len: u32,
}

// -- Ring layout --------------------------------------------------------------
// desc table   at 0:         [VirtqDesc; N]
// avail ring   at 16 * N:    flags u16, idx u16, ring [u16; N], used_event u16
// used ring    at 2048:      flags u16, idx u16, ring [UsedElem; N], avail_event u16

const QS: usize = QUEUE_SIZE as usize;
const DESC_SIZE: usize = 16;
const AVAIL_OFFSET: usize = QS * DESC_SIZE;
const USED_OFFSET: usize = 2048;
const RING_AREA: usize = 4096;

const AVAIL_IDX_OFFSET: usize = 2;
const AVAIL_RING_OFFSET: usize = 4;
const USED_IDX_OFFSET: usize = 2;
const USED_RING_OFFSET: usize = 4;
const USED_ELEM_SIZE: usize = 8;

const _: () = assert!(size_of::<VirtqDesc>() == DESC_SIZE);
const _: () = assert!(AVAIL_OFFSET + AVAIL_RING_OFFSET + 2 * QS + 2 <= USED_OFFSET);
const _: () = assert!(USED_OFFSET + USED_RING_OFFSET + USED_ELEM_SIZE * QS + 2 <= RING_AREA);

/// Page-aligned memory backing one queue: rings first, then one buffer per
/// descriptor.
#[repr(C, align(4096))]
pub struct QueueArena<T> {
    rings: [u8; RING_AREA],
    buffers: [T; QS],
}

impl<T: Copy> QueueArena<T> {
    /// Creates an arena with zeroed rings and every buffer set to `fill`.
    #[must_use]
    pub const fn new(fill: T) -> Self {
        Self {
            rings: [0; RING_AREA],
            buffers: [fill; QS],
        }
    }
}

/// A split virtqueue whose descriptors each own one `T` buffer.
pub struct Virtqueue<T: 'static> {
    desc_virt: *mut VirtqDesc,
    avail_virt: *mut u8,
    used_virt: *mut u8,
    buffers: *mut T,
    desc_phys: PhysAddr,
    avail_phys: PhysAddr,
    used_phys: PhysAddr,
    buffers_phys: PhysAddr,
    /// Used ring entries consumed so far (wrapping).
    last_used_idx: u16,
    /// Available ring entries published so far (wrapping).
    avail_idx: u16,
    _arena: PhantomData<&'static mut QueueArena<T>>,
}

// SAFETY: The queue holds the only reference to its arena; the device is the
// sole other party touching it.
unsafe impl<T: Send> Send for Virtqueue<T> {}

impl<T: Copy> Virtqueue<T> {
    /// Binds a queue to `arena` and zeroes its rings.
    ///
    /// Nothing is published to the device until [`prime`](Self::prime).
    pub fn new(arena: &'static mut QueueArena<T>, dma: &impl DmaTranslate) -> Self {
        let rings = arena.rings.as_mut_ptr();
        let buffers = arena.buffers.as_mut_ptr();
        debug_assert!(VirtAddr::from_ptr(rings).is_aligned(4096));

        // SAFETY: `rings` spans RING_AREA bytes owned exclusively by us.
        unsafe { ptr::write_bytes(rings, 0, RING_AREA) };

        // SAFETY: Both offsets lie inside the ring area (checked above).
        let (avail_virt, used_virt) = unsafe { (rings.add(AVAIL_OFFSET), rings.add(USED_OFFSET)) };

        let phys = |p: *const u8| dma.virt_to_phys(VirtAddr::from_ptr(p));
        Self {
            desc_virt: rings.cast::<VirtqDesc>(),
            avail_virt,
            used_virt,
            buffers,
            desc_phys: phys(rings),
            avail_phys: phys(avail_virt),
            used_phys: phys(used_virt),
            buffers_phys: phys(buffers.cast::<u8>()),
            last_used_idx: 0,
            avail_idx: 0,
            _arena: PhantomData,
        }
    }

    /// Returns the physical address of the descriptor table.
    #[must_use]
    pub fn desc_phys(&self) -> PhysAddr {
        self.desc_phys
    }

    /// Returns the physical address of the available ring.
    #[must_use]
    pub fn avail_phys(&self) -> PhysAddr {
        self.avail_phys
    }

    /// Returns the physical address of the used ring.
    #[must_use]
    pub fn used_phys(&self) -> PhysAddr {
        self.used_phys
    }

    /// Points descriptor `i` at buffer `i` and offers every descriptor to
    /// the device.
    pub fn prime(&mut self) {
        let len = size_of::<T>() as u32;
        for i in 0..QUEUE_SIZE {
            let desc = VirtqDesc {
                addr: self.buffers_phys.as_u64() + u64::from(i) * u64::from(len),
                len,
                flags: VIRTQ_DESC_F_WRITE,
                next: 0,
            };
            // SAFETY: i < QUEUE_SIZE and the table has QUEUE_SIZE entries.
            unsafe { ptr::write_volatile(self.desc_virt.add(usize::from(i)), desc) };
            self.write_avail_slot(i, i);
        }

        // SAFETY: The avail flags field lies at offset 0 of the avail ring.
        unsafe { ptr::write_volatile(self.avail_virt.cast::<u16>(), 0) };

        self.avail_idx = QUEUE_SIZE;
        release();
        self.write_avail_idx(self.avail_idx);
    }

    /// Reads the device's used index.
    ///
    /// Followed by an acquire barrier so the entries it covers are visible.
    #[must_use]
    pub fn used_idx(&self) -> u16 {
        // SAFETY: The used idx field lies inside the ring area.
        let idx = unsafe { ptr::read_volatile(self.used_virt.add(USED_IDX_OFFSET).cast::<u16>()) };
        acquire();
        idx
    }

    /// Takes the next used entry if `snapshot` is ahead of what was consumed.
    pub fn pop_used(&mut self, snapshot: u16) -> Option<UsedElem> {
        if self.last_used_idx == snapshot {
            return None;
        }
        debug_assert!(
            snapshot.wrapping_sub(self.last_used_idx) <= QUEUE_SIZE,
            "device advanced the used ring past the queue size"
        );

        let slot = usize::from(self.last_used_idx % QUEUE_SIZE);
        // SAFETY: slot < QUEUE_SIZE, so the element lies inside the used ring.
        let elem = unsafe {
            let elem_ptr = self.used_virt.add(USED_RING_OFFSET + slot * USED_ELEM_SIZE);
            UsedElem {
                id: ptr::read_volatile(elem_ptr.cast::<u32>()),
                len: ptr::read_volatile(elem_ptr.add(4).cast::<u32>()),
            }
        };
        self.last_used_idx = self.last_used_idx.wrapping_add(1);
        Some(elem)
    }

    /// Reads the buffer owned by descriptor `id`, or `None` if `id` is not a
    /// descriptor of this queue.
    #[must_use]
    pub fn buffer(&self, id: u32) -> Option<T> {
        if id >= u32::from(QUEUE_SIZE) {
            return None;
        }
        // SAFETY: id < QUEUE_SIZE and the arena holds QUEUE_SIZE buffers.
        Some(unsafe { ptr::read_volatile(self.buffers.add(id as usize)) })
    }

    /// Hands descriptor `id` back to the device.
    ///
    /// The slot write is released before the index that publishes it.
    pub fn recycle(&mut self, id: u16) {
        debug_assert!(id < QUEUE_SIZE);
        self.write_avail_slot(self.avail_idx % QUEUE_SIZE, id);
        release();
        self.avail_idx = self.avail_idx.wrapping_add(1);
        self.write_avail_idx(self.avail_idx);
    }

    /// Returns the number of used entries consumed so far (wrapping).
    #[must_use]
    pub fn last_used_idx(&self) -> u16 {
        self.last_used_idx
    }

    /// Returns the number of available entries published so far (wrapping).
    #[must_use]
    pub fn avail_idx(&self) -> u16 {
        self.avail_idx
    }

    /// Reads available ring slot `slot`.
    #[must_use]
    pub fn avail_entry(&self, slot: u16) -> u16 {
        let slot = usize::from(slot % QUEUE_SIZE);
        // SAFETY: slot < QUEUE_SIZE.
        unsafe { ptr::read_volatile(self.avail_virt.add(AVAIL_RING_OFFSET + slot * 2).cast::<u16>()) }
    }

    /// Reads descriptor `index`.
    #[must_use]
    pub fn descriptor(&self, index: u16) -> VirtqDesc {
        let index = usize::from(index % QUEUE_SIZE);
        // SAFETY: index < QUEUE_SIZE.
        unsafe { ptr::read_volatile(self.desc_virt.add(index)) }
    }

    fn write_avail_slot(&mut self, slot: u16, id: u16) {
        let slot = usize::from(slot);
        // SAFETY: Callers pass slot < QUEUE_SIZE.
        unsafe {
            ptr::write_volatile(self.avail_virt.add(AVAIL_RING_OFFSET + slot * 2).cast::<u16>(), id);
        }
    }

    fn write_avail_idx(&mut self, idx: u16) {
        // SAFETY: The avail idx field lies inside the ring area.
        unsafe { ptr::write_volatile(self.avail_virt.add(AVAIL_IDX_OFFSET).cast::<u16>(), idx) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylus_driver_api::IdentityDma;

    fn leak_arena() -> &'static mut QueueArena<u64> {
        Box::leak(Box::new(QueueArena::new(0)))
    }

    /// Device side of a completion: writes the used element and bumps idx.
    fn complete(vq: &Virtqueue<u64>, used_slot: u16, id: u32) {
        // SAFETY: Test-only access into the same arena the queue owns.
        unsafe {
            let elem = vq.used_virt.add(USED_RING_OFFSET + usize::from(used_slot % QUEUE_SIZE) * 8);
            ptr::write_volatile(elem.cast::<u32>(), id);
            ptr::write_volatile(elem.add(4).cast::<u32>(), 8);
            let idx = vq.used_virt.add(USED_IDX_OFFSET).cast::<u16>();
            ptr::write_volatile(idx, ptr::read_volatile(idx).wrapping_add(1));
        }
    }

    #[test]
    fn layout_addresses() {
        let vq = Virtqueue::new(leak_arena(), &IdentityDma);
        let base = vq.desc_phys().as_u64();
        assert_eq!(base % 4096, 0);
        assert_eq!(vq.avail_phys().as_u64(), base + 256);
        assert_eq!(vq.used_phys().as_u64(), base + 2048);
    }

    #[test]
    fn prime_offers_every_descriptor() {
        let mut vq = Virtqueue::new(leak_arena(), &IdentityDma);
        vq.prime();

        assert_eq!(vq.avail_idx(), QUEUE_SIZE);
        let base = vq.desc_phys().as_u64() + RING_AREA as u64;
        for i in 0..QUEUE_SIZE {
            let desc = vq.descriptor(i);
            assert_eq!(desc.addr, base + u64::from(i) * 8);
            assert_eq!(desc.len, 8);
            assert_eq!(desc.flags, VIRTQ_DESC_F_WRITE);
            assert_eq!(vq.avail_entry(i), i);
        }
    }

    #[test]
    fn pop_follows_used_index() {
        let mut vq = Virtqueue::new(leak_arena(), &IdentityDma);
        vq.prime();
        assert_eq!(vq.pop_used(vq.used_idx()), None);

        complete(&vq, 0, 3);
        complete(&vq, 1, 7);
        let snapshot = vq.used_idx();
        assert_eq!(snapshot, 2);
        assert_eq!(vq.pop_used(snapshot).map(|e| e.id), Some(3));
        assert_eq!(vq.pop_used(snapshot).map(|e| e.id), Some(7));
        assert_eq!(vq.pop_used(snapshot), None);
        assert_eq!(vq.last_used_idx(), 2);
    }

    #[test]
    fn recycle_appends_in_order() {
        let mut vq = Virtqueue::new(leak_arena(), &IdentityDma);
        vq.prime();
        vq.recycle(5);
        vq.recycle(2);
        assert_eq!(vq.avail_idx(), QUEUE_SIZE + 2);
        assert_eq!(vq.avail_entry(0), 5);
        assert_eq!(vq.avail_entry(1), 2);
    }

    #[test]
    fn buffer_rejects_foreign_ids() {
        let vq = Virtqueue::new(leak_arena(), &IdentityDma);
        assert_eq!(vq.buffer(0), Some(0));
        assert_eq!(vq.buffer(u32::from(QUEUE_SIZE)), None);
    }
}

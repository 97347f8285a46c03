//! Typed virtual and physical address wrappers.
//!
//! [`VirtAddr`] is what the CPU dereferences (MMIO register blocks, the
//! framebuffer, queue memory); [`PhysAddr`] is what gets programmed into a
//! device. Keeping them apart stops a CPU pointer from being handed to a
//! DMA engine by accident.

use core::fmt;
use core::ops::Add;

/// A canonical 64-bit virtual address.
///
/// Sign-extended from bit 47, which covers both x86_64 4-level paging and
/// aarch64 48-bit VA layouts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(u64);

/// A 64-bit physical address (masked to 52 bits).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u64);

/// Physical address space mask: bits 0..51.
const PHYS_ADDR_MASK: u64 = 0x000F_FFFF_FFFF_FFFF;

impl VirtAddr {
    /// Creates a new `VirtAddr`. Panics if the address is not canonical.
    #[inline]
    pub const fn new(addr: u64) -> Self {
        let canonical = Self::new_truncate(addr);
        assert!(
            canonical.0 == addr,
            "VirtAddr::new: address is not canonical"
        );
        canonical
    }

    /// Creates a new `VirtAddr`, sign-extending from bit 47.
    #[inline]
    pub const fn new_truncate(addr: u64) -> Self {
        Self(((addr << 16) as i64 >> 16) as u64)
    }

    /// Returns the address of `ptr`.
    #[inline]
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self::new(ptr as usize as u64)
    }

    /// Returns the raw `u64` value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Converts this address to a raw pointer.
    #[inline]
    pub const fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    /// Converts this address to a raw mutable pointer.
    #[inline]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }

    /// Returns `true` if the address is aligned to `align`.
    ///
    /// `align` must be a power of two.
    #[inline]
    pub const fn is_aligned(self, align: u64) -> bool {
        debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
        self.0 & (align - 1) == 0
    }
}

impl PhysAddr {
    /// Creates a new `PhysAddr`, masking off bits above 51.
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr & PHYS_ADDR_MASK)
    }

    /// Returns the raw `u64` value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the low 32 bits, as written to a `*_LOW` device register.
    #[inline]
    pub const fn low_u32(self) -> u32 {
        self.0 as u32
    }

    /// Returns the high 32 bits, as written to a `*_HIGH` device register.
    #[inline]
    pub const fn high_u32(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl Add<u64> for VirtAddr {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self {
        Self::new_truncate(self.0.wrapping_add(rhs))
    }
}

impl Add<u64> for PhysAddr {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self {
        Self::new(self.0.wrapping_add(rhs))
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#x})", self.0)
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

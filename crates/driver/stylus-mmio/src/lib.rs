//! Typed MMIO register block abstractions.
//!
//! Register blocks are declared with the [`register_block!`] macro and read or
//! written through a [`RegisterIo`] backend. The hardware backend, [`Mmio`],
//! performs a volatile access bracketed by a full system barrier on both
//! sides, so every register access is ordered against queue memory the
//! device reads and writes by DMA.
//!
//! # Example
//!
//! ```ignore
//! use stylus_mmio::{Mmio, register_block};
//!
//! register_block! {
//!     /// virtio-mmio transport registers.
//!     pub VirtioMmioRegs {
//!         /// Magic value ("virt").
//!         [0x000; u32; ro] magic,
//!         /// Device status.
//!         [0x070; u32; rw] status => DeviceStatus,
//!         /// Device-specific configuration bytes.
//!         [0x108; u8; ro; 256] config_data,
//!     }
//! }
//!
//! // SAFETY: 0x0a00_0000 is the identity-mapped virtio-mmio window.
//! let regs = VirtioMmioRegs::new(unsafe { Mmio::new(VirtAddr::new(0x0a00_0000)) });
//! ```

#![cfg_attr(not(test), no_std)]

extern crate self as stylus_mmio;

use core::sync::atomic::{Ordering, fence};

use stylus_core::addr::VirtAddr;

pub use stylus_mmio_macros::register_block;

/// Full system memory barrier.
///
/// `dsb sy` on aarch64, a sequentially consistent fence elsewhere.
#[inline]
pub fn barrier() {
    #[cfg(target_arch = "aarch64")]
    // SAFETY: `dsb sy` only orders memory accesses; it has no other effect.
    unsafe {
        core::arch::asm!("dsb sy", options(nostack, preserves_flags));
    }
    #[cfg(not(target_arch = "aarch64"))]
    fence(Ordering::SeqCst);
}

/// Acquire barrier for reading indices published by a device.
#[inline]
pub fn acquire() {
    fence(Ordering::Acquire);
}

/// Release barrier for publishing indices to a device.
#[inline]
pub fn release() {
    fence(Ordering::Release);
}

/// Byte-offset register access used by generated register blocks.
///
/// Methods take `&self`: device registers are shared state by nature and
/// backends use interior mutability where they need it.
pub trait RegisterIo {
    /// Reads an 8-bit register.
    fn read_u8(&self, offset: usize) -> u8;
    /// Writes an 8-bit register.
    fn write_u8(&self, offset: usize, value: u8);
    /// Reads a 16-bit register.
    fn read_u16(&self, offset: usize) -> u16;
    /// Writes a 16-bit register.
    fn write_u16(&self, offset: usize, value: u16);
    /// Reads a 32-bit register.
    fn read_u32(&self, offset: usize) -> u32;
    /// Writes a 32-bit register.
    fn write_u32(&self, offset: usize, value: u32);
}

impl<T: RegisterIo + ?Sized> RegisterIo for &T {
    fn read_u8(&self, offset: usize) -> u8 {
        (**self).read_u8(offset)
    }
    fn write_u8(&self, offset: usize, value: u8) {
        (**self).write_u8(offset, value);
    }
    fn read_u16(&self, offset: usize) -> u16 {
        (**self).read_u16(offset)
    }
    fn write_u16(&self, offset: usize, value: u16) {
        (**self).write_u16(offset, value);
    }
    fn read_u32(&self, offset: usize) -> u32 {
        (**self).read_u32(offset)
    }
    fn write_u32(&self, offset: usize, value: u32) {
        (**self).write_u32(offset, value);
    }
}

/// Memory-mapped hardware register window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mmio {
    base: VirtAddr,
}

impl Mmio {
    /// Creates a register window at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to a mapped device register region covering every
    /// offset later accessed through this window, with device memory
    /// attributes.
    #[must_use]
    pub const unsafe fn new(base: VirtAddr) -> Self {
        Self { base }
    }

    /// Returns the base virtual address.
    #[must_use]
    pub const fn base(&self) -> VirtAddr {
        self.base
    }

    #[inline]
    fn read<T: Copy>(&self, offset: usize) -> T {
        barrier();
        // SAFETY: The caller of `new` guarantees the window covers `offset`.
        let value = unsafe { core::ptr::read_volatile((self.base + offset as u64).as_ptr::<T>()) };
        barrier();
        value
    }

    #[inline]
    fn write<T: Copy>(&self, offset: usize, value: T) {
        barrier();
        // SAFETY: The caller of `new` guarantees the window covers `offset`.
        unsafe { core::ptr::write_volatile((self.base + offset as u64).as_mut_ptr::<T>(), value) };
        barrier();
    }
}

impl RegisterIo for Mmio {
    fn read_u8(&self, offset: usize) -> u8 {
        self.read(offset)
    }
    fn write_u8(&self, offset: usize, value: u8) {
        self.write(offset, value);
    }
    fn read_u16(&self, offset: usize) -> u16 {
        self.read(offset)
    }
    fn write_u16(&self, offset: usize, value: u16) {
        self.write(offset, value);
    }
    fn read_u32(&self, offset: usize) -> u32 {
        self.read(offset)
    }
    fn write_u32(&self, offset: usize, value: u32) {
        self.write(offset, value);
    }
}

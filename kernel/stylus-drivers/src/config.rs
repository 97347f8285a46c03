//! Platform constants and runtime configuration for pointer bring-up.
//!
//! The constants describe the QEMU `virt` machine. [`PointerConfig`]
//! carries the same values at runtime so other boards (and tests) can
//! supply their own bus layout without recompiling the driver.

use stylus_core::addr::VirtAddr;
use stylus_driver_api::Point;

// -- virtio-mmio bus ----------------------------------------------------------

/// Base address of the first virtio-mmio slot.
pub const VIRTIO_MMIO_BASE: u64 = 0x0a00_0000;
/// Distance between consecutive virtio-mmio slots.
pub const VIRTIO_MMIO_STRIDE: u64 = 0x200;
/// Number of virtio-mmio slots probed.
pub const VIRTIO_MMIO_SLOTS: usize = 32;
/// GIC interrupt number of slot 0. Slot `i` raises `VIRTIO_IRQ_BASE + i`.
pub const VIRTIO_IRQ_BASE: u32 = 48;

// -- Event queue --------------------------------------------------------------

/// Number of descriptors (and event buffers) in the event queue.
pub const QUEUE_SIZE: u16 = 16;

/// Spin iterations allowed for the device to acknowledge a reset.
pub const RESET_SPIN_LIMIT: u32 = 1_000_000;

/// Substring of the device name identifying an absolute pointer.
pub const TABLET_NAME_SIGNATURE: &[u8] = b"Tablet";

// -- Pointer coordinates ------------------------------------------------------

/// Largest raw absolute-axis value reported by the tablet.
pub const RAW_AXIS_MAX: i32 = 0x7fff;
/// Scale denominator mapping raw axis values to pixels.
pub const RAW_AXIS_SPAN: i64 = 0x8000;

/// Screen point the HAL pointer is re-warped to after each delta read.
pub const FALLBACK_ANCHOR: Point = Point::new(400, 300);

/// Runtime pointer bring-up parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerConfig {
    /// Base virtual address of the first virtio-mmio slot.
    pub mmio_base: VirtAddr,
    /// Byte distance between slots.
    pub mmio_stride: u64,
    /// Number of slots to probe.
    pub slot_count: usize,
    /// Interrupt number of slot 0.
    pub irq_base: u32,
    /// Reset acknowledgement spin budget.
    pub reset_spin_limit: u32,
    /// HAL re-warp anchor for relative motion.
    pub fallback_anchor: Point,
}

impl PointerConfig {
    /// QEMU `virt` machine layout.
    pub const QEMU_VIRT: Self = Self {
        mmio_base: VirtAddr::new_truncate(VIRTIO_MMIO_BASE),
        mmio_stride: VIRTIO_MMIO_STRIDE,
        slot_count: VIRTIO_MMIO_SLOTS,
        irq_base: VIRTIO_IRQ_BASE,
        reset_spin_limit: RESET_SPIN_LIMIT,
        fallback_anchor: FALLBACK_ANCHOR,
    };

    /// Returns the interrupt line wired to `slot`.
    #[must_use]
    pub const fn irq_for_slot(&self, slot: usize) -> u32 {
        self.irq_base + slot as u32
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self::QEMU_VIRT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_qemu_virt() {
        let config = PointerConfig::default();
        assert_eq!(config.mmio_base.as_u64(), 0x0a00_0000);
        assert_eq!(config.mmio_stride, 0x200);
        assert_eq!(config.slot_count, 32);
        assert_eq!(config.fallback_anchor, Point::new(400, 300));
    }

    #[test]
    fn irq_follows_slot() {
        let config = PointerConfig::default();
        assert_eq!(config.irq_for_slot(0), 48);
        assert_eq!(config.irq_for_slot(31), 79);
    }
}

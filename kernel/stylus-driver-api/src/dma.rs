//! Address translation for memory shared with devices.

use stylus_core::addr::{PhysAddr, VirtAddr};

/// Translates CPU-visible addresses into device-visible ones.
pub trait DmaTranslate {
    /// Returns the physical address backing `virt`.
    fn virt_to_phys(&self, virt: VirtAddr) -> PhysAddr;
}

/// Translation for identity-mapped kernels (QEMU `virt` boot environment).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityDma;

impl DmaTranslate for IdentityDma {
    fn virt_to_phys(&self, virt: VirtAddr) -> PhysAddr {
        PhysAddr::new(virt.as_u64())
    }
}

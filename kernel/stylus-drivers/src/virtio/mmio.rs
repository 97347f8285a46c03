//! virtio-mmio transport registers and device discovery.

use bitflags::bitflags;
use planck_noalloc::vec::ArrayVec;
use stylus_core::addr::VirtAddr;
use stylus_mmio::{Mmio, RegisterIo, register_block};

use crate::config::PointerConfig;

/// Magic value at offset 0 of every virtio-mmio slot ("virt").
pub const VIRTIO_MMIO_MAGIC: u32 = 0x7472_6976;

/// virtio device id of input devices.
pub const VIRTIO_ID_INPUT: u32 = 18;

/// virtio-input config selector for the device name string.
pub const VIRTIO_INPUT_CFG_ID_NAME: u8 = 0x01;

/// Device name bytes kept for matching and logging.
pub const DEVICE_NAME_CAPACITY: usize = 31;

/// Device name read from the config space (not NUL-terminated).
pub type DeviceName = ArrayVec<u8, DEVICE_NAME_CAPACITY>;

bitflags! {
    /// virtio device status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceStatus: u32 {
        /// Guest found the device.
        const ACKNOWLEDGE = 1;
        /// Guest knows how to drive it.
        const DRIVER = 2;
        /// Driver is ready.
        const DRIVER_OK = 4;
        /// Feature negotiation complete.
        const FEATURES_OK = 8;
        /// Device hit an error and needs a reset.
        const DEVICE_NEEDS_RESET = 0x40;
        /// Guest gave up on the device.
        const FAILED = 0x80;
    }
}

register_block! {
    /// virtio-mmio (version 2) transport registers.
    pub VirtioMmioRegs {
        /// Magic value, [`VIRTIO_MMIO_MAGIC`] on a live slot.
        [0x000; u32; ro] magic,
        /// Transport version.
        [0x004; u32; ro] version,
        /// virtio device id (0 for an empty slot).
        [0x008; u32; ro] device_id,
        /// Subsystem vendor id.
        [0x00c; u32; ro] vendor_id,
        /// Device feature bits of the selected window.
        [0x010; u32; ro] device_features,
        /// Driver feature bits of the selected window.
        [0x020; u32; wo] driver_features,
        /// Queue selector.
        [0x030; u32; wo] queue_sel,
        /// Largest size the selected queue supports.
        [0x034; u32; ro] queue_num_max,
        /// Size of the selected queue.
        [0x038; u32; wo] queue_num,
        /// Selected queue is live.
        [0x044; u32; rw] queue_ready,
        /// Queue notifier.
        [0x050; u32; wo] queue_notify,
        /// Pending interrupt causes.
        [0x060; u32; ro] interrupt_status,
        /// Interrupt acknowledgement.
        [0x064; u32; wo] interrupt_ack,
        /// Device status.
        [0x070; u32; rw] status => DeviceStatus,
        /// Descriptor table address, low half.
        [0x080; u32; wo] queue_desc_low,
        /// Descriptor table address, high half.
        [0x084; u32; wo] queue_desc_high,
        /// Available ring address, low half.
        [0x090; u32; wo] queue_avail_low,
        /// Available ring address, high half.
        [0x094; u32; wo] queue_avail_high,
        /// Used ring address, low half.
        [0x0a0; u32; wo] queue_used_low,
        /// Used ring address, high half.
        [0x0a4; u32; wo] queue_used_high,
        /// virtio-input config selector.
        [0x100; u8; wo] config_select,
        /// virtio-input config sub-selector.
        [0x101; u8; wo] config_subsel,
        /// Size of the selected config payload.
        [0x102; u8; ro] config_size,
        /// Config payload bytes.
        [0x108; u8; ro; 128] config_data,
    }
}

/// A set of identically laid out register windows to probe.
pub trait SlotBus {
    /// Register backend of one slot.
    type Io: RegisterIo;

    /// Returns the number of slots.
    fn slot_count(&self) -> usize;

    /// Returns the register window of slot `index`.
    fn slot(&self, index: usize) -> Self::Io;
}

/// The platform's virtio-mmio window.
#[derive(Debug, Clone, Copy)]
pub struct MmioSlotBus {
    base: VirtAddr,
    stride: u64,
    count: usize,
}

impl MmioSlotBus {
    /// Creates a bus from the configured layout.
    ///
    /// # Safety
    ///
    /// `config.slot_count` windows of `config.mmio_stride` bytes starting at
    /// `config.mmio_base` must be mapped as device memory.
    #[must_use]
    pub const unsafe fn new(config: &PointerConfig) -> Self {
        Self {
            base: config.mmio_base,
            stride: config.mmio_stride,
            count: config.slot_count,
        }
    }
}

impl SlotBus for MmioSlotBus {
    type Io = Mmio;

    fn slot_count(&self) -> usize {
        self.count
    }

    fn slot(&self, index: usize) -> Mmio {
        // SAFETY: The caller of `MmioSlotBus::new` guarantees every slot is
        // mapped.
        unsafe { Mmio::new(self.base + index as u64 * self.stride) }
    }
}

/// A located virtio-input device.
pub struct DeviceHandle<R: RegisterIo> {
    /// Transport registers.
    pub regs: VirtioMmioRegs<R>,
    /// Bus slot the device sits in.
    pub slot: usize,
    /// Name reported by the device.
    pub name: DeviceName,
}

impl<R: RegisterIo> DeviceHandle<R> {
    /// Returns the device name for display.
    #[must_use]
    pub fn name_str(&self) -> &str {
        core::str::from_utf8(self.name.as_slice()).unwrap_or("<non-utf8>")
    }
}

/// Scans `bus` in slot order for the first virtio-input device whose name
/// contains `signature`.
///
/// Keyboards and other virtio-input devices are skipped.
pub fn locate<B: SlotBus>(bus: &B, signature: &[u8]) -> Option<DeviceHandle<B::Io>> {
    (0..bus.slot_count()).find_map(|slot| {
        let regs = VirtioMmioRegs::new(bus.slot(slot));
        if regs.magic() != VIRTIO_MMIO_MAGIC || regs.device_id() != VIRTIO_ID_INPUT {
            return None;
        }
        let name = read_name(&regs);
        contains(name.as_slice(), signature).then_some(DeviceHandle { regs, slot, name })
    })
}

/// Reads the virtio-input name string.
pub fn read_name<R: RegisterIo>(regs: &VirtioMmioRegs<R>) -> DeviceName {
    regs.set_config_select(VIRTIO_INPUT_CFG_ID_NAME);
    regs.set_config_subsel(0);
    let size = usize::from(regs.config_size()).min(DEVICE_NAME_CAPACITY);

    let mut name = DeviceName::new();
    for i in 0..size {
        let byte = regs.config_data(i);
        if byte == 0 {
            break;
        }
        name.push(byte);
    }
    name
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TABLET_NAME_SIGNATURE;
    use crate::testing::{FakeBus, FakeTablet};

    #[test]
    fn finds_tablet_after_keyboard() {
        let empty = FakeTablet::empty();
        let keyboard = FakeTablet::input("QEMU Virtio Keyboard");
        let tablet = FakeTablet::input("QEMU Virtio Tablet");
        let bus = FakeBus::new(vec![&empty, &keyboard, &empty, &tablet]);

        let handle = locate(&bus, TABLET_NAME_SIGNATURE).expect("tablet present");
        assert_eq!(handle.slot, 3);
        assert_eq!(handle.name_str(), "QEMU Virtio Tablet");
    }

    #[test]
    fn empty_bus_finds_nothing() {
        let empty = FakeTablet::empty();
        let keyboard = FakeTablet::input("QEMU Virtio Keyboard");
        let bus = FakeBus::new(vec![&empty, &keyboard]);
        assert!(locate(&bus, TABLET_NAME_SIGNATURE).is_none());
    }

    #[test]
    fn non_input_device_skipped() {
        let mut block = FakeTablet::input("QEMU Virtio Tablet");
        block.device_id = 2;
        let bus = FakeBus::new(vec![&block]);
        assert!(locate(&bus, TABLET_NAME_SIGNATURE).is_none());
    }

    #[test]
    fn substring_match() {
        assert!(contains(b"QEMU Virtio Tablet", b"Tablet"));
        assert!(!contains(b"Tab", b"Tablet"));
        assert!(contains(b"anything", b""));
    }

    #[test]
    fn mmio_bus_spacing() {
        // SAFETY: Only addresses are computed; nothing is accessed.
        let bus = unsafe { MmioSlotBus::new(&PointerConfig::default()) };
        assert_eq!(bus.slot_count(), 32);
        assert_eq!(bus.slot(2).base().as_u64(), 0x0a00_0400);
    }
}

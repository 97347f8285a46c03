//! VirtIO device support.
//!
//! Provides the virtio-mmio transport, split virtqueue management, and the
//! standard device initialization sequence.

pub mod mmio;
pub mod queue;

use stylus_driver_api::PointerError;
use stylus_mmio::RegisterIo;

use self::mmio::{DeviceStatus, VirtioMmioRegs};
use self::queue::Virtqueue;
use crate::config::QUEUE_SIZE;

/// A virtio device driven through the virtio-mmio transport.
///
/// Wraps the register window. Device-specific drivers use it to bring
/// queues up, notify the device, and acknowledge interrupts.
pub struct VirtioDevice<R: RegisterIo> {
    regs: VirtioMmioRegs<R>,
}

impl<R: RegisterIo> VirtioDevice<R> {
    /// Resets the device and negotiates features.
    ///
    /// Reset → ACKNOWLEDGE → DRIVER → accept no features → FEATURES_OK, then
    /// FEATURES_OK is read back. The caller sets queues up and finishes with
    /// [`set_driver_ok`](Self::set_driver_ok).
    pub fn init(regs: VirtioMmioRegs<R>, reset_spin_limit: u32) -> Result<Self, PointerError> {
        // Reset, then wait for the device to report it.
        regs.set_status(DeviceStatus::empty());
        let mut spins = 0u32;
        while !regs.status().is_empty() {
            if spins >= reset_spin_limit {
                stylus_core::kwarn!("virtio: device did not acknowledge reset");
                return Err(PointerError::DeviceTimeout);
            }
            spins += 1;
            core::hint::spin_loop();
        }

        regs.set_status(DeviceStatus::ACKNOWLEDGE);
        regs.set_status(DeviceStatus::ACKNOWLEDGE | DeviceStatus::DRIVER);

        // The input driver needs no optional features.
        regs.set_driver_features(0);

        let status = DeviceStatus::ACKNOWLEDGE | DeviceStatus::DRIVER | DeviceStatus::FEATURES_OK;
        regs.set_status(status);

        let readback = regs.status();
        if !readback.contains(DeviceStatus::FEATURES_OK) {
            stylus_core::kwarn!("virtio: device rejected features");
            regs.set_status(DeviceStatus::FAILED);
            return Err(PointerError::FeaturesRejected {
                status: readback.bits(),
            });
        }

        Ok(Self { regs })
    }

    /// Programs queue `index` with `vq`'s addresses, primes it, and marks it
    /// ready.
    ///
    /// Fails if the device cannot hold [`QUEUE_SIZE`] descriptors.
    pub fn setup_queue<T: Copy>(&self, index: u32, vq: &mut Virtqueue<T>) -> Result<(), PointerError> {
        let r = &self.regs;
        r.set_queue_sel(index);

        let max = r.queue_num_max();
        if max < u32::from(QUEUE_SIZE) {
            r.set_status(DeviceStatus::FAILED);
            return Err(PointerError::QueueTooSmall { max });
        }
        r.set_queue_num(u32::from(QUEUE_SIZE));

        let (desc, avail, used) = (vq.desc_phys(), vq.avail_phys(), vq.used_phys());
        r.set_queue_desc_low(desc.low_u32());
        r.set_queue_desc_high(desc.high_u32());
        r.set_queue_avail_low(avail.low_u32());
        r.set_queue_avail_high(avail.high_u32());
        r.set_queue_used_low(used.low_u32());
        r.set_queue_used_high(used.high_u32());

        vq.prime();
        r.set_queue_ready(1);
        Ok(())
    }

    /// Sets DRIVER_OK, completing initialization.
    pub fn set_driver_ok(&self) {
        let status = self.regs.status();
        self.regs.set_status(status | DeviceStatus::DRIVER_OK);
    }

    /// Fails if the device reports it needs a reset or has failed.
    pub fn check_status(&self) -> Result<(), PointerError> {
        let status = self.regs.status();
        if status.intersects(DeviceStatus::DEVICE_NEEDS_RESET | DeviceStatus::FAILED) {
            return Err(PointerError::DeviceFailure {
                status: status.bits(),
            });
        }
        Ok(())
    }

    /// Tells the device queue `index` has new buffers.
    pub fn notify(&self, index: u32) {
        self.regs.set_queue_notify(index);
    }

    /// Acknowledges every pending interrupt cause.
    pub fn ack_interrupt(&self) {
        let pending = self.regs.interrupt_status();
        self.regs.set_interrupt_ack(pending);
    }
}

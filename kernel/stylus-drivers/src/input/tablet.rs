//! virtio-input absolute pointer (QEMU "virtio-tablet") driver.
//!
//! The event queue is kept full at all times: every completed descriptor
//! is decoded and handed straight back to the device, so the device never
//! runs out of buffers while the pointer moves.

use stylus_core::cell::TakeOnce;
use stylus_driver_api::{
    DmaTranslate, InterruptController, MouseButtons, Point, PointerError, PointerSource,
    ScreenGeometry,
};
use stylus_mmio::RegisterIo;

use super::event::{EventRecord, PointerState};
use crate::config::PointerConfig;
use crate::virtio::VirtioDevice;
use crate::virtio::mmio::DeviceHandle;
use crate::virtio::queue::{QueueArena, Virtqueue};

/// Index of the virtio-input event queue.
const EVENT_QUEUE: u32 = 0;

/// Raw position the pointer rests at after bring-up (centre of the axis).
const RAW_CENTER: Point = Point::new(16384, 16384);

/// Queue memory for the one tablet the kernel drives.
pub static TABLET_QUEUE: TakeOnce<QueueArena<EventRecord>> =
    TakeOnce::new(QueueArena::new(EventRecord::new(0, 0, 0)));

/// How queries find out about new events.
#[derive(Clone, Copy)]
pub enum DrainMode {
    /// Queries drain the queue themselves. Used before an interrupt handler
    /// is installed.
    Polled,
    /// Queries run with the tablet's own IRQ line masked, from the drain
    /// through the read of the state, so they never race the interrupt
    /// handler.
    Masked {
        /// Controller owning the tablet's line.
        controller: &'static dyn InterruptController,
    },
    /// Only [`VirtioTablet::handle_irq`] drains. Queries read cached state.
    IrqOnly,
}

impl core::fmt::Debug for DrainMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Polled => f.write_str("Polled"),
            Self::Masked { .. } => f.debug_struct("Masked").finish_non_exhaustive(),
            Self::IrqOnly => f.write_str("IrqOnly"),
        }
    }
}

/// Keeps an IRQ line masked while alive.
struct IrqMaskGuard {
    irq: u32,
    controller: &'static dyn InterruptController,
}

impl IrqMaskGuard {
    fn new(irq: u32, controller: &'static dyn InterruptController) -> Self {
        controller.mask_irq(irq);
        Self { irq, controller }
    }
}

impl Drop for IrqMaskGuard {
    fn drop(&mut self) {
        self.controller.unmask_irq(self.irq);
    }
}

/// A live virtio tablet.
pub struct VirtioTablet<R: RegisterIo> {
    device: VirtioDevice<R>,
    queue: Virtqueue<EventRecord>,
    state: PointerState,
    geometry: ScreenGeometry,
    slot: usize,
    irq: u32,
    mode: DrainMode,
}

impl<R: RegisterIo> VirtioTablet<R> {
    /// Brings the device in `handle` up with its event queue in `arena`.
    ///
    /// On success the pointer rests at the centre of the screen and queries
    /// drain in [`DrainMode::Polled`].
    pub fn init(
        handle: DeviceHandle<R>,
        arena: &'static mut QueueArena<EventRecord>,
        dma: &impl DmaTranslate,
        geometry: ScreenGeometry,
        config: &PointerConfig,
    ) -> Result<Self, PointerError> {
        let irq = config.irq_for_slot(handle.slot);
        stylus_core::kinfo!(
            "virtio-tablet: {} at slot {} (irq {irq})",
            handle.name_str(),
            handle.slot
        );

        let DeviceHandle { regs, slot, .. } = handle;
        let device = VirtioDevice::init(regs, config.reset_spin_limit)?;

        let mut queue = Virtqueue::new(arena, dma);
        device.setup_queue(EVENT_QUEUE, &mut queue)?;
        device.set_driver_ok();
        device.notify(EVENT_QUEUE);
        device.check_status()?;

        Ok(Self {
            device,
            queue,
            state: PointerState::at(RAW_CENTER),
            geometry,
            slot,
            irq,
            mode: DrainMode::Polled,
        })
    }

    /// Decodes every completed event and recycles its descriptor.
    ///
    /// Returns the number of events decoded. The used index is read once, so
    /// events the device completes meanwhile wait for the next drain.
    pub fn drain_once(&mut self) -> usize {
        let snapshot = self.queue.used_idx();
        let mut decoded = 0;
        while let Some(elem) = self.queue.pop_used(snapshot) {
            let Some(event) = self.queue.buffer(elem.id) else {
                stylus_core::kwarn!("virtio-tablet: device completed unknown descriptor {}", elem.id);
                continue;
            };
            self.state.apply(event);
            self.queue.recycle(elem.id as u16);
            decoded += 1;
        }

        self.device.notify(EVENT_QUEUE);
        self.device.ack_interrupt();
        decoded
    }

    /// Interrupt handler entry point.
    pub fn handle_irq(&mut self) {
        self.drain_once();
    }

    /// Selects how queries drain.
    pub fn set_drain_mode(&mut self, mode: DrainMode) {
        self.mode = mode;
    }

    /// Returns the current drain mode.
    #[must_use]
    pub fn drain_mode(&self) -> DrainMode {
        self.mode
    }

    /// Returns the interrupt line the device raises.
    #[must_use]
    pub fn irq_line(&self) -> u32 {
        self.irq
    }

    /// Returns the bus slot the device sits in.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns the event queue.
    #[must_use]
    pub fn queue(&self) -> &Virtqueue<EventRecord> {
        &self.queue
    }

    /// Drains according to the current mode, then runs `f` on the state.
    ///
    /// In [`DrainMode::Masked`] the line stays masked until `f` returns, so
    /// a read-and-reset in `f` cannot interleave with the handler.
    fn with_drained<T>(&mut self, f: impl FnOnce(&mut PointerState, ScreenGeometry) -> T) -> T {
        let _guard = match self.mode {
            DrainMode::Polled => {
                self.drain_once();
                None
            }
            DrainMode::Masked { controller } => {
                let guard = IrqMaskGuard::new(self.irq, controller);
                self.drain_once();
                Some(guard)
            }
            DrainMode::IrqOnly => None,
        };
        f(&mut self.state, self.geometry)
    }
}

impl<R: RegisterIo> PointerSource for VirtioTablet<R> {
    fn poll(&mut self) {
        self.with_drained(|_, _| ());
    }

    fn raw_position(&mut self) -> Point {
        self.with_drained(|state, _| state.raw())
    }

    fn screen_position(&mut self) -> Point {
        self.with_drained(|state, geometry| state.screen(geometry))
    }

    fn buttons(&mut self) -> MouseButtons {
        self.with_drained(|state, _| state.buttons())
    }

    fn has_pending_event(&mut self) -> bool {
        self.with_drained(|state, _| state.take_pending())
    }

    fn set_position(&mut self, position: Point) {
        self.state.warp(position, self.geometry);
    }

    fn take_delta(&mut self) -> Point {
        self.with_drained(|state, _| state.take_delta())
    }
}

//! Pointer backend selection.
//!
//! Bring-up is tried once. Any failure demotes the subsystem to the HAL
//! pointer for the rest of the boot; consumers only ever see
//! [`PointerSource`].

use stylus_driver_api::{
    DmaTranslate, HalPointer, MouseButtons, Point, PointerError, PointerSource, ScreenGeometry,
};
use stylus_mmio::RegisterIo;

use super::event::EventRecord;
use super::fallback::HalFallback;
use super::tablet::{DrainMode, TABLET_QUEUE, VirtioTablet};
use crate::config::{PointerConfig, TABLET_NAME_SIGNATURE};
use crate::virtio::mmio::{SlotBus, locate};
use crate::virtio::queue::QueueArena;

/// The pointer device the kernel ended up with.
pub enum PointerBackend<R: RegisterIo, H: HalPointer> {
    /// A virtio tablet on the virtio-mmio bus.
    Virtio(VirtioTablet<R>),
    /// The platform HAL pointer.
    Hal(HalFallback<H>),
}

impl<R: RegisterIo, H: HalPointer> PointerBackend<R, H> {
    /// Probes `bus` for a tablet using the static queue arena, falling back
    /// to `hal`.
    pub fn init<B>(
        bus: &B,
        hal: H,
        dma: &impl DmaTranslate,
        geometry: ScreenGeometry,
        config: &PointerConfig,
    ) -> Self
    where
        B: SlotBus<Io = R>,
    {
        Self::init_with(bus, || TABLET_QUEUE.take(), hal, dma, geometry, config)
    }

    /// Like [`init`](Self::init) with caller-supplied queue memory.
    ///
    /// `arena` is only consulted once a tablet has been found.
    pub fn init_with<B, A>(
        bus: &B,
        arena: A,
        hal: H,
        dma: &impl DmaTranslate,
        geometry: ScreenGeometry,
        config: &PointerConfig,
    ) -> Self
    where
        B: SlotBus<Io = R>,
        A: FnOnce() -> Option<&'static mut QueueArena<EventRecord>>,
    {
        match Self::probe(bus, arena, dma, geometry, config) {
            Ok(tablet) => Self::Virtio(tablet),
            Err(err) => {
                stylus_core::kwarn!("pointer: virtio tablet unavailable ({err}), using HAL pointer");
                Self::Hal(HalFallback::new(hal, config.fallback_anchor))
            }
        }
    }

    fn probe<B, A>(
        bus: &B,
        arena: A,
        dma: &impl DmaTranslate,
        geometry: ScreenGeometry,
        config: &PointerConfig,
    ) -> Result<VirtioTablet<R>, PointerError>
    where
        B: SlotBus<Io = R>,
        A: FnOnce() -> Option<&'static mut QueueArena<EventRecord>>,
    {
        let handle = locate(bus, TABLET_NAME_SIGNATURE).ok_or(PointerError::DeviceNotFound)?;
        let arena = arena().ok_or(PointerError::ArenaUnavailable)?;
        VirtioTablet::init(handle, arena, dma, geometry, config)
    }

    /// Returns `true` when a virtio tablet is driving the pointer.
    #[must_use]
    pub fn is_virtio(&self) -> bool {
        matches!(self, Self::Virtio(_))
    }

    /// Returns the interrupt line to route to [`handle_irq`](Self::handle_irq),
    /// if the backend has one.
    #[must_use]
    pub fn irq_line(&self) -> Option<u32> {
        match self {
            Self::Virtio(tablet) => Some(tablet.irq_line()),
            Self::Hal(_) => None,
        }
    }

    /// Interrupt handler entry point. A no-op on the HAL path.
    pub fn handle_irq(&mut self) {
        if let Self::Virtio(tablet) = self {
            tablet.handle_irq();
        }
    }

    /// Selects how queries drain. Ignored on the HAL path.
    pub fn set_drain_mode(&mut self, mode: DrainMode) {
        if let Self::Virtio(tablet) = self {
            tablet.set_drain_mode(mode);
        }
    }
}

impl<R: RegisterIo, H: HalPointer> PointerSource for PointerBackend<R, H> {
    fn poll(&mut self) {
        match self {
            Self::Virtio(tablet) => tablet.poll(),
            Self::Hal(hal) => hal.poll(),
        }
    }

    fn raw_position(&mut self) -> Point {
        match self {
            Self::Virtio(tablet) => tablet.raw_position(),
            Self::Hal(hal) => hal.raw_position(),
        }
    }

    fn screen_position(&mut self) -> Point {
        match self {
            Self::Virtio(tablet) => tablet.screen_position(),
            Self::Hal(hal) => hal.screen_position(),
        }
    }

    fn buttons(&mut self) -> MouseButtons {
        match self {
            Self::Virtio(tablet) => tablet.buttons(),
            Self::Hal(hal) => hal.buttons(),
        }
    }

    fn has_pending_event(&mut self) -> bool {
        match self {
            Self::Virtio(tablet) => tablet.has_pending_event(),
            Self::Hal(hal) => hal.has_pending_event(),
        }
    }

    fn set_position(&mut self, position: Point) {
        match self {
            Self::Virtio(tablet) => tablet.set_position(position),
            Self::Hal(hal) => hal.set_position(position),
        }
    }

    fn take_delta(&mut self) -> Point {
        match self {
            Self::Virtio(tablet) => tablet.take_delta(),
            Self::Hal(hal) => hal.take_delta(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{ABS_X, EV_ABS};
    use crate::testing::{FakeBus, FakeTablet, ScriptedHal};
    use stylus_driver_api::IdentityDma;

    const SCREEN: ScreenGeometry = ScreenGeometry::new(800, 600);

    fn fresh_arena() -> Option<&'static mut QueueArena<EventRecord>> {
        Some(Box::leak(Box::new(QueueArena::new(EventRecord::default()))))
    }

    fn backend<'a>(bus: &FakeBus<'a>) -> PointerBackend<&'a FakeTablet, ScriptedHal> {
        PointerBackend::init_with(
            bus,
            fresh_arena,
            ScriptedHal::at(Point::new(7, 9)),
            &IdentityDma,
            SCREEN,
            &PointerConfig::default(),
        )
    }

    #[test]
    fn prefers_virtio_tablet() {
        let empty = FakeTablet::empty();
        let tablet = FakeTablet::input("QEMU Virtio Tablet");
        let bus = FakeBus::new(vec![&empty, &tablet]);
        let mut pointer = backend(&bus);

        assert!(pointer.is_virtio());
        assert_eq!(pointer.irq_line(), Some(49));
        assert!(tablet.push_event(EventRecord::new(EV_ABS, ABS_X, 16384 + 40)));
        pointer.handle_irq();
        assert_eq!(pointer.take_delta(), Point::new(40, 0));
    }

    #[test]
    fn missing_tablet_falls_back() {
        let empty = FakeTablet::empty();
        let bus = FakeBus::new(vec![&empty, &empty]);
        let mut pointer = backend(&bus);

        assert!(!pointer.is_virtio());
        assert_eq!(pointer.irq_line(), None);
        assert_eq!(pointer.screen_position(), Point::new(7, 9));
        assert_eq!(pointer.take_delta(), Point::new(0, 0));
    }

    #[test]
    fn failed_bring_up_falls_back() {
        let mut small = FakeTablet::input("QEMU Virtio Tablet");
        small.queue_num_max = 4;
        let bus = FakeBus::new(vec![&small]);
        assert!(!backend(&bus).is_virtio());

        let mut stuck = FakeTablet::input("QEMU Virtio Tablet");
        stuck.stuck_reset = true;
        let bus = FakeBus::new(vec![&stuck]);
        assert!(!backend(&bus).is_virtio());
    }

    #[test]
    fn missing_arena_falls_back() {
        let tablet = FakeTablet::input("QEMU Virtio Tablet");
        let bus = FakeBus::new(vec![&tablet]);
        let pointer = PointerBackend::init_with(
            &bus,
            || None,
            ScriptedHal::at(Point::new(0, 0)),
            &IdentityDma,
            SCREEN,
            &PointerConfig::default(),
        );
        assert!(!pointer.is_virtio());
    }
}

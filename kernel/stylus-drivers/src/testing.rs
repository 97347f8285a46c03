//! Host-side stand-ins for the hardware the drivers talk to.

use core::cell::{Cell, RefCell};
use core::ptr;

use stylus_driver_api::{
    Framebuffer, FramebufferInfo, HalPointer, HalPointerState, InterruptController, MouseButtons,
    Point, PointerSource,
};
use stylus_mmio::RegisterIo;

use crate::config::QUEUE_SIZE;
use crate::input::event::EventRecord;
use crate::virtio::mmio::{DeviceStatus, SlotBus, VIRTIO_ID_INPUT, VIRTIO_MMIO_MAGIC};
use crate::virtio::queue::VirtqDesc;

// -- Device model -------------------------------------------------------------

/// A virtio-mmio input device that reads and fills the queues it is given.
///
/// Queue addresses are taken as host pointers (identity DMA).
pub struct FakeTablet {
    pub magic: u32,
    pub device_id: u32,
    pub name: &'static str,
    pub queue_num_max: u32,
    /// Status never reads back zero after a reset.
    pub stuck_reset: bool,
    /// FEATURES_OK is dropped from every status write.
    pub reject_features: bool,
    /// DRIVER_OK raises DEVICE_NEEDS_RESET.
    pub fail_on_driver_ok: bool,

    pub status: Cell<u32>,
    pub queue_num: Cell<u32>,
    pub queue_ready: Cell<u32>,
    pub interrupt_status: Cell<u32>,
    config_select: Cell<u8>,
    config_subsel: Cell<u8>,
    desc: Cell<u64>,
    avail: Cell<u64>,
    used: Cell<u64>,
    next_avail: Cell<u16>,
    used_idx: Cell<u16>,
    writes: RefCell<Vec<(usize, u32)>>,
}

impl FakeTablet {
    /// An unpopulated slot.
    pub fn empty() -> Self {
        Self {
            magic: 0,
            device_id: 0,
            name: "",
            queue_num_max: 0,
            stuck_reset: false,
            reject_features: false,
            fail_on_driver_ok: false,
            status: Cell::new(0),
            queue_num: Cell::new(0),
            queue_ready: Cell::new(0),
            interrupt_status: Cell::new(0),
            config_select: Cell::new(0),
            config_subsel: Cell::new(0),
            desc: Cell::new(0),
            avail: Cell::new(0),
            used: Cell::new(0),
            next_avail: Cell::new(0),
            used_idx: Cell::new(0),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// A virtio-input device reporting `name`.
    pub fn input(name: &'static str) -> Self {
        Self {
            magic: VIRTIO_MMIO_MAGIC,
            device_id: VIRTIO_ID_INPUT,
            name,
            queue_num_max: 64,
            ..Self::empty()
        }
    }

    /// Values written to the status register, in order.
    pub fn status_writes(&self) -> Vec<u32> {
        self.writes_to(0x070)
    }

    /// Values written to the interrupt ack register, in order.
    pub fn acks(&self) -> Vec<u32> {
        self.writes_to(0x064)
    }

    /// Number of queue notifications.
    pub fn notifies(&self) -> usize {
        self.writes_to(0x050).len()
    }

    pub fn desc_addr(&self) -> u64 {
        self.desc.get()
    }

    pub fn avail_addr(&self) -> u64 {
        self.avail.get()
    }

    pub fn used_addr(&self) -> u64 {
        self.used.get()
    }

    /// Fills the next offered buffer with `event` and completes it.
    ///
    /// Returns `false` if the driver has no buffer on offer.
    pub fn push_event(&self, event: EventRecord) -> bool {
        match self.next_offered() {
            Some(id) => {
                self.complete_with(id, event);
                true
            }
            None => false,
        }
    }

    /// Takes every buffer on offer without completing any, returning the
    /// descriptor ids in ring order.
    pub fn take_offered(&self) -> Vec<u16> {
        core::iter::from_fn(|| self.next_offered()).collect()
    }

    /// Fills the buffer of descriptor `id`, already taken from the ring,
    /// with `event` and completes it.
    pub fn complete_with(&self, id: u16, event: EventRecord) {
        let table = self.desc.get() as usize as *const VirtqDesc;
        // SAFETY: The driver programmed the table from a live arena.
        unsafe {
            let desc = ptr::read_volatile(table.add(usize::from(id)));
            ptr::write_volatile(desc.addr as usize as *mut EventRecord, event);
        }
        self.complete_raw(u32::from(id));
    }

    fn next_offered(&self) -> Option<u16> {
        if self.queue_ready.get() == 0 {
            return None;
        }
        let avail = self.avail.get() as usize as *const u8;
        let next = self.next_avail.get();
        // SAFETY: The driver programmed this address from a live arena.
        let id = unsafe {
            if ptr::read_volatile(avail.add(2).cast::<u16>()) == next {
                return None;
            }
            let slot = usize::from(next % QUEUE_SIZE);
            ptr::read_volatile(avail.add(4 + slot * 2).cast::<u16>())
        };
        self.next_avail.set(next.wrapping_add(1));
        Some(id)
    }

    /// Number of ring entries the device has taken so far.
    pub fn consumed(&self) -> u16 {
        self.next_avail.get()
    }

    /// Publishes a used entry for descriptor `id` without touching buffers.
    pub fn complete_raw(&self, id: u32) {
        let used = self.used.get() as usize as *mut u8;
        let idx = self.used_idx.get();
        let slot = usize::from(idx % QUEUE_SIZE);
        // SAFETY: The driver programmed this address from a live arena.
        unsafe {
            let elem = used.add(4 + slot * 8);
            ptr::write_volatile(elem.cast::<u32>(), id);
            ptr::write_volatile(elem.add(4).cast::<u32>(), 8);
            ptr::write_volatile(used.add(2).cast::<u16>(), idx.wrapping_add(1));
        }
        self.used_idx.set(idx.wrapping_add(1));
        self.interrupt_status.set(self.interrupt_status.get() | 1);
    }

    fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.writes
            .borrow()
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|&(_, v)| v)
            .collect()
    }

    fn write_status(&self, value: u32) {
        let mut v = value;
        if v == 0 && self.stuck_reset {
            v = DeviceStatus::ACKNOWLEDGE.bits();
        }
        if self.reject_features {
            v &= !DeviceStatus::FEATURES_OK.bits();
        }
        if self.fail_on_driver_ok && v & DeviceStatus::DRIVER_OK.bits() != 0 {
            v |= DeviceStatus::DEVICE_NEEDS_RESET.bits();
        }
        self.status.set(v);
    }
}

fn set_half(cell: &Cell<u64>, high: bool, value: u32) {
    let old = cell.get();
    cell.set(if high {
        (old & 0xffff_ffff) | (u64::from(value) << 32)
    } else {
        (old & !0xffff_ffff) | u64::from(value)
    });
}

impl RegisterIo for FakeTablet {
    fn read_u8(&self, offset: usize) -> u8 {
        let name_selected = self.config_select.get() == 1 && self.config_subsel.get() == 0;
        match offset {
            0x102 if name_selected => self.name.len() as u8,
            0x108..0x188 if name_selected => {
                self.name.as_bytes().get(offset - 0x108).copied().unwrap_or(0)
            }
            _ => 0,
        }
    }

    fn write_u8(&self, offset: usize, value: u8) {
        self.writes.borrow_mut().push((offset, value.into()));
        match offset {
            0x100 => self.config_select.set(value),
            0x101 => self.config_subsel.set(value),
            _ => {}
        }
    }

    fn read_u16(&self, _offset: usize) -> u16 {
        0
    }

    fn write_u16(&self, offset: usize, value: u16) {
        self.writes.borrow_mut().push((offset, value.into()));
    }

    fn read_u32(&self, offset: usize) -> u32 {
        match offset {
            0x000 => self.magic,
            0x004 => 2,
            0x008 => self.device_id,
            0x00c => 0x554d_4551,
            0x034 => self.queue_num_max,
            0x044 => self.queue_ready.get(),
            0x060 => self.interrupt_status.get(),
            0x070 => self.status.get(),
            _ => 0,
        }
    }

    fn write_u32(&self, offset: usize, value: u32) {
        self.writes.borrow_mut().push((offset, value));
        match offset {
            0x038 => self.queue_num.set(value),
            0x044 => self.queue_ready.set(value),
            0x064 => self.interrupt_status.set(self.interrupt_status.get() & !value),
            0x070 => self.write_status(value),
            0x080 => set_half(&self.desc, false, value),
            0x084 => set_half(&self.desc, true, value),
            0x090 => set_half(&self.avail, false, value),
            0x094 => set_half(&self.avail, true, value),
            0x0a0 => set_half(&self.used, false, value),
            0x0a4 => set_half(&self.used, true, value),
            _ => {}
        }
    }
}

/// A bus whose slots are fake devices.
pub struct FakeBus<'a> {
    slots: Vec<&'a FakeTablet>,
}

impl<'a> FakeBus<'a> {
    pub fn new(slots: Vec<&'a FakeTablet>) -> Self {
        Self { slots }
    }
}

impl<'a> SlotBus for FakeBus<'a> {
    type Io = &'a FakeTablet;

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> &'a FakeTablet {
        self.slots[index]
    }
}

// -- Collaborators ------------------------------------------------------------

/// A framebuffer that counts pixel accesses.
pub struct RecordingFramebuffer {
    pixels: Vec<u32>,
    info: FramebufferInfo,
    reads: Cell<usize>,
    writes: usize,
}

impl RecordingFramebuffer {
    /// A framebuffer where every pixel holds [`pattern`](Self::pattern).
    pub fn patterned(width: u32, height: u32) -> Self {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| Self::pattern(x, y)))
            .collect();
        Self {
            pixels,
            info: FramebufferInfo {
                width,
                height,
                stride: width,
            },
            reads: Cell::new(0),
            writes: 0,
        }
    }

    /// Desktop colour at `(x, y)`. Never equal to the sprite colours.
    pub fn pattern(x: u32, y: u32) -> u32 {
        0x0010_0000 | (y << 10) | x
    }

    pub fn snapshot(&self) -> Vec<u32> {
        self.pixels.clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn reset_counters(&mut self) {
        self.reads.set(0);
        self.writes = 0;
    }
}

impl Framebuffer for RecordingFramebuffer {
    fn info(&self) -> FramebufferInfo {
        self.info
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        self.reads.set(self.reads.get() + 1);
        self.pixels[(y * self.info.stride + x) as usize]
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: u32) {
        self.writes += 1;
        self.pixels[(y * self.info.stride + x) as usize] = color;
    }
}

/// A HAL pointer driven by the test.
pub struct ScriptedHal {
    state: HalPointerState,
    warps: Vec<Point>,
}

impl ScriptedHal {
    pub fn at(position: Point) -> Self {
        Self {
            state: HalPointerState {
                position,
                buttons: MouseButtons::empty(),
            },
            warps: Vec::new(),
        }
    }

    pub fn move_to(&mut self, position: Point) {
        self.state.position = position;
    }

    pub fn press(&mut self, buttons: MouseButtons) {
        self.state.buttons.insert(buttons);
    }

    /// Positions passed to `set_pos`, in order.
    pub fn warps(&self) -> &[Point] {
        &self.warps
    }
}

impl HalPointer for ScriptedHal {
    fn get_state(&mut self) -> HalPointerState {
        self.state
    }

    fn set_pos(&mut self, position: Point) {
        self.state.position = position;
        self.warps.push(position);
    }
}

/// A pointer source parked at one screen position.
pub struct ScriptedSource {
    position: Point,
}

impl ScriptedSource {
    pub fn at(position: Point) -> Self {
        Self { position }
    }
}

impl PointerSource for ScriptedSource {
    fn poll(&mut self) {}

    fn raw_position(&mut self) -> Point {
        self.position
    }

    fn screen_position(&mut self) -> Point {
        self.position
    }

    fn buttons(&mut self) -> MouseButtons {
        MouseButtons::empty()
    }

    fn has_pending_event(&mut self) -> bool {
        false
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn take_delta(&mut self) -> Point {
        Point::new(0, 0)
    }
}

/// Records mask (`true`) and unmask (`false`) calls.
#[derive(Default)]
pub struct RecordingIrq {
    calls: RefCell<Vec<(bool, u32)>>,
}

impl RecordingIrq {
    pub fn log(&self) -> Vec<(bool, u32)> {
        self.calls.borrow().clone()
    }

    /// Whether `irq` is masked right now.
    pub fn is_masked(&self, irq: u32) -> bool {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find(|&&(_, line)| line == irq)
            .is_some_and(|&(masked, _)| masked)
    }
}

impl InterruptController for RecordingIrq {
    fn mask_irq(&self, irq: u32) {
        self.calls.borrow_mut().push((true, irq));
    }

    fn unmask_irq(&self, irq: u32) {
        self.calls.borrow_mut().push((false, irq));
    }
}

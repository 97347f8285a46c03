//! virtio-input event records and the absolute pointer decoder.

use stylus_driver_api::{MouseButtons, Point, ScreenGeometry};

use crate::config::{RAW_AXIS_MAX, RAW_AXIS_SPAN};

// -- Event types and codes ----------------------------------------------------

/// Synchronization marker.
pub const EV_SYN: u16 = 0x00;
/// Key or button transition.
pub const EV_KEY: u16 = 0x01;
/// Relative axis motion.
pub const EV_REL: u16 = 0x02;
/// Absolute axis position.
pub const EV_ABS: u16 = 0x03;

/// Absolute X axis.
pub const ABS_X: u16 = 0x00;
/// Absolute Y axis.
pub const ABS_Y: u16 = 0x01;

/// Left mouse button.
pub const BTN_LEFT: u16 = 0x110;
/// Right mouse button.
pub const BTN_RIGHT: u16 = 0x111;
/// Middle mouse button.
pub const BTN_MIDDLE: u16 = 0x112;

/// One virtio-input event as the device writes it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventRecord {
    /// Event type (`EV_*`).
    pub kind: u16,
    /// Event code within the type.
    pub code: u16,
    /// Event value.
    pub value: u32,
}

const _: () = assert!(core::mem::size_of::<EventRecord>() == 8);

impl EventRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(kind: u16, code: u16, value: u32) -> Self {
        Self { kind, code, value }
    }

    /// Returns the value as the signed quantity the device meant.
    #[must_use]
    pub const fn signed_value(&self) -> i32 {
        self.value as i32
    }
}

/// Absolute pointer state built up from decoded events.
///
/// `delta` is accumulated against `last`, the previously reported raw
/// position, so the sum of deltas between two reads always equals the
/// change in raw position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    raw: Point,
    last: Point,
    delta: Point,
    buttons: MouseButtons,
    pending: bool,
}

impl PointerState {
    /// Creates a state resting at `raw`.
    #[must_use]
    pub const fn at(raw: Point) -> Self {
        Self {
            raw,
            last: raw,
            delta: Point::new(0, 0),
            buttons: MouseButtons::empty(),
            pending: false,
        }
    }

    /// Applies one event.
    ///
    /// Absolute X/Y move the pointer and the three mouse buttons update the
    /// button mask; each latches the pending flag. Everything else (SYN,
    /// REL, other keys and axes) is ignored.
    pub fn apply(&mut self, event: EventRecord) {
        let value = event.signed_value();
        match (event.kind, event.code) {
            (EV_ABS, ABS_X) => {
                self.delta.x = self.delta.x.wrapping_add(value.wrapping_sub(self.last.x));
                self.raw.x = value;
                self.last.x = value;
            }
            (EV_ABS, ABS_Y) => {
                self.delta.y = self.delta.y.wrapping_add(value.wrapping_sub(self.last.y));
                self.raw.y = value;
                self.last.y = value;
            }
            (EV_KEY, code) => {
                let button = match code {
                    BTN_LEFT => MouseButtons::LEFT,
                    BTN_RIGHT => MouseButtons::RIGHT,
                    BTN_MIDDLE => MouseButtons::MIDDLE,
                    _ => return,
                };
                self.buttons.set(button, event.value != 0);
            }
            _ => return,
        }
        self.pending = true;
    }

    /// Returns the raw position in device units.
    #[must_use]
    pub const fn raw(&self) -> Point {
        self.raw
    }

    /// Returns the held buttons.
    #[must_use]
    pub const fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    /// Returns the position scaled onto `geometry`.
    #[must_use]
    pub fn screen(&self, geometry: ScreenGeometry) -> Point {
        raw_to_screen(self.raw, geometry)
    }

    /// Returns and clears the accumulated motion.
    pub fn take_delta(&mut self) -> Point {
        core::mem::take(&mut self.delta)
    }

    /// Returns and clears the pending latch.
    pub fn take_pending(&mut self) -> bool {
        core::mem::take(&mut self.pending)
    }

    /// Moves the pointer to screen position `position` without producing
    /// motion.
    pub fn warp(&mut self, position: Point, geometry: ScreenGeometry) {
        self.raw = screen_to_raw(position, geometry);
        self.last = self.raw;
    }
}

/// Scales a raw position onto the screen: `raw * size / 32768` per axis.
#[must_use]
pub fn raw_to_screen(raw: Point, geometry: ScreenGeometry) -> Point {
    let scale = |v: i32, size: u32| (i64::from(v) * i64::from(size) / RAW_AXIS_SPAN) as i32;
    Point::new(scale(raw.x, geometry.width), scale(raw.y, geometry.height))
}

/// Inverse of [`raw_to_screen`], clamped to the device's axis range.
///
/// A zero-sized axis maps to raw 0.
#[must_use]
pub fn screen_to_raw(position: Point, geometry: ScreenGeometry) -> Point {
    let scale = |v: i32, size: u32| {
        if size == 0 {
            return 0;
        }
        let raw = i64::from(v) * RAW_AXIS_SPAN / i64::from(size);
        raw.clamp(0, i64::from(RAW_AXIS_MAX)) as i32
    };
    Point::new(scale(position.x, geometry.width), scale(position.y, geometry.height))
}

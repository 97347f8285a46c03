//! Pointer input interface traits and value types.

use bitflags::bitflags;

use crate::framebuffer::FramebufferInfo;

bitflags! {
    /// Pointer button state. Level-triggered: a bit stays set while held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        /// Left (primary) button.
        const LEFT = 0x01;
        /// Right (secondary) button.
        const RIGHT = 0x02;
        /// Middle button.
        const MIDDLE = 0x04;
    }
}

/// A pair of signed coordinates (pixels, raw device units, or deltas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Screen dimensions used to scale absolute device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ScreenGeometry {
    /// Creates a geometry.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the pixel at the centre of the screen.
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new((self.width / 2) as i32, (self.height / 2) as i32)
    }
}

impl From<FramebufferInfo> for ScreenGeometry {
    fn from(info: FramebufferInfo) -> Self {
        Self::new(info.width, info.height)
    }
}

/// What every pointer backend answers, whichever device sits behind it.
///
/// Query methods take `&mut self` because answering may drain pending
/// device events first.
pub trait PointerSource {
    /// Processes any pending device events.
    fn poll(&mut self);

    /// Returns the position in device units.
    fn raw_position(&mut self) -> Point;

    /// Returns the position scaled to screen pixels.
    fn screen_position(&mut self) -> Point;

    /// Returns the live button state. Never clears anything.
    fn buttons(&mut self) -> MouseButtons;

    /// Returns `true` once per batch of new events, clearing the latch.
    fn has_pending_event(&mut self) -> bool;

    /// Moves the pointer to a screen position (mouse capture / warp).
    fn set_position(&mut self, position: Point);

    /// Returns the motion accumulated since the previous call and resets it.
    fn take_delta(&mut self) -> Point;
}

/// Snapshot reported by a HAL pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HalPointerState {
    /// Screen position.
    pub position: Point,
    /// Button state.
    pub buttons: MouseButtons,
}

/// Platform pointer used when no virtio tablet is present (e.g. USB HID).
pub trait HalPointer {
    /// Returns the current position and button state.
    fn get_state(&mut self) -> HalPointerState;

    /// Warps the pointer to a screen position.
    fn set_pos(&mut self, position: Point);
}

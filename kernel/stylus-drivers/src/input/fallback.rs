//! HAL pointer fallback used when no virtio tablet is present.

use stylus_driver_api::{HalPointer, HalPointerState, MouseButtons, Point, PointerSource};

/// Adapts a [`HalPointer`] to [`PointerSource`].
///
/// Relative motion is measured against a fixed anchor: each delta read
/// warps the HAL pointer back to the anchor, so motion never saturates at
/// a screen edge. The HAL already reports screen coordinates, so raw and
/// screen positions are the same.
pub struct HalFallback<H: HalPointer> {
    hal: H,
    anchor: Point,
    anchored: bool,
    last_seen: Option<HalPointerState>,
}

impl<H: HalPointer> HalFallback<H> {
    /// Wraps `hal`, using `anchor` for relative motion.
    pub fn new(hal: H, anchor: Point) -> Self {
        Self {
            hal,
            anchor,
            anchored: false,
            last_seen: None,
        }
    }

    /// Returns the wrapped HAL pointer.
    #[must_use]
    pub fn hal(&self) -> &H {
        &self.hal
    }
}

impl<H: HalPointer> PointerSource for HalFallback<H> {
    fn poll(&mut self) {}

    fn raw_position(&mut self) -> Point {
        self.hal.get_state().position
    }

    fn screen_position(&mut self) -> Point {
        self.hal.get_state().position
    }

    fn buttons(&mut self) -> MouseButtons {
        self.hal.get_state().buttons
    }

    fn has_pending_event(&mut self) -> bool {
        let state = self.hal.get_state();
        let changed = self.last_seen != Some(state);
        self.last_seen = Some(state);
        changed
    }

    fn set_position(&mut self, position: Point) {
        self.hal.set_pos(position);
    }

    fn take_delta(&mut self) -> Point {
        if !self.anchored {
            self.hal.set_pos(self.anchor);
            self.anchored = true;
            return Point::new(0, 0);
        }

        let position = self.hal.get_state().position;
        let delta = Point::new(
            position.x.wrapping_sub(self.anchor.x),
            position.y.wrapping_sub(self.anchor.y),
        );
        self.hal.set_pos(self.anchor);
        delta
    }
}

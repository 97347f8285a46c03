//! Software cursor overlay.
//!
//! Draws a 12×19 arrow onto a [`Framebuffer`] and keeps the pixels it
//! covers, so hiding or moving the cursor leaves the desktop untouched.
//! The saved background is valid exactly while the cursor is visible.

use stylus_driver_api::{Framebuffer, FramebufferInfo, Point, PointerSource, ScreenGeometry};

/// Sprite width in pixels.
pub const CURSOR_WIDTH: usize = 12;
/// Sprite height in pixels.
pub const CURSOR_HEIGHT: usize = 19;

/// Outline colour.
pub const INK: u32 = 0x0000_0000;
/// Fill colour.
pub const PAPER: u32 = 0x00FF_FFFF;

/// 0 = transparent, 1 = ink, 2 = paper.
#[rustfmt::skip]
const SPRITE: [[u8; CURSOR_WIDTH]; CURSOR_HEIGHT] = [
    [1,0,0,0,0,0,0,0,0,0,0,0],
    [1,1,0,0,0,0,0,0,0,0,0,0],
    [1,2,1,0,0,0,0,0,0,0,0,0],
    [1,2,2,1,0,0,0,0,0,0,0,0],
    [1,2,2,2,1,0,0,0,0,0,0,0],
    [1,2,2,2,2,1,0,0,0,0,0,0],
    [1,2,2,2,2,2,1,0,0,0,0,0],
    [1,2,2,2,2,2,2,1,0,0,0,0],
    [1,2,2,2,2,2,2,2,1,0,0,0],
    [1,2,2,2,2,2,2,2,2,1,0,0],
    [1,2,2,2,2,2,2,2,2,2,1,0],
    [1,2,2,2,2,2,2,1,1,1,1,1],
    [1,2,2,2,1,2,2,1,0,0,0,0],
    [1,2,2,1,0,1,2,2,1,0,0,0],
    [1,2,1,0,0,1,2,2,1,0,0,0],
    [1,1,0,0,0,0,1,2,2,1,0,0],
    [1,0,0,0,0,0,1,2,2,1,0,0],
    [0,0,0,0,0,0,0,1,2,1,0,0],
    [0,0,0,0,0,0,0,1,1,0,0,0],
];

/// Cursor position, visibility and the background under the sprite.
#[derive(Debug, Clone)]
pub struct Cursor {
    position: Point,
    visible: bool,
    saved: [[u32; CURSOR_WIDTH]; CURSOR_HEIGHT],
    /// Where `saved` was captured. `None` while nothing is saved.
    saved_at: Option<Point>,
}

impl Cursor {
    /// Creates a hidden cursor at the centre of `geometry`.
    #[must_use]
    pub fn new(geometry: ScreenGeometry) -> Self {
        Self {
            position: geometry.center(),
            visible: false,
            saved: [[0; CURSOR_WIDTH]; CURSOR_HEIGHT],
            saved_at: None,
        }
    }

    /// Re-centres the cursor on `geometry` and hides it without touching the
    /// framebuffer.
    pub fn init(&mut self, geometry: ScreenGeometry) {
        *self = Self::new(geometry);
    }

    /// Returns the hotspot position in screen pixels.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Returns `true` while the sprite is on screen.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Captures the background and paints the sprite. No-op when visible.
    pub fn show(&mut self, fb: &mut impl Framebuffer) {
        if self.visible {
            return;
        }
        self.save_background(&*fb);
        paint(fb, self.position);
        self.visible = true;
    }

    /// Puts the saved background back. No-op when hidden.
    pub fn hide(&mut self, fb: &mut impl Framebuffer) {
        if !self.visible {
            return;
        }
        self.restore_background(fb);
        self.visible = false;
    }

    /// Follows `source` to its current screen position.
    ///
    /// The old background is restored before the cursor moves. An unchanged
    /// position touches no pixels.
    pub fn update(&mut self, fb: &mut impl Framebuffer, source: &mut impl PointerSource) {
        let position = source.screen_position();
        if position == self.position {
            return;
        }

        if self.visible {
            self.restore_background(fb);
            self.position = position;
            self.save_background(&*fb);
            paint(fb, position);
        } else {
            self.position = position;
        }
    }

    /// Moves the cursor to `position` and repaints it, visible or not.
    pub fn draw_at(&mut self, fb: &mut impl Framebuffer, position: Point) {
        self.restore_background(fb);
        self.position = position;
        self.save_background(&*fb);
        paint(fb, position);
        self.visible = true;
    }

    fn save_background(&mut self, fb: &impl Framebuffer) {
        let origin = self.position;
        for_each_cell(fb, origin, |row, col, x, y| {
            self.saved[row][col] = fb.pixel(x, y);
        });
        self.saved_at = Some(origin);
    }

    fn restore_background(&mut self, fb: &mut impl Framebuffer) {
        let Some(origin) = self.saved_at.take() else {
            return;
        };
        let info = fb.info();
        for (row, line) in self.saved.iter().enumerate() {
            for (col, &color) in line.iter().enumerate() {
                if let Some((x, y)) = clip(info, origin, row, col) {
                    fb.put_pixel(x, y, color);
                }
            }
        }
    }
}

/// Paints the opaque sprite cells with `position` as the hotspot.
fn paint(fb: &mut impl Framebuffer, position: Point) {
    let info = fb.info();
    for (row, line) in SPRITE.iter().enumerate() {
        for (col, &cell) in line.iter().enumerate() {
            let color = match cell {
                1 => INK,
                2 => PAPER,
                _ => continue,
            };
            if let Some((x, y)) = clip(info, position, row, col) {
                fb.put_pixel(x, y, color);
            }
        }
    }
}

/// Calls `f(row, col, x, y)` for every sprite cell that lands on screen.
fn for_each_cell(fb: &impl Framebuffer, origin: Point, mut f: impl FnMut(usize, usize, u32, u32)) {
    let info = fb.info();
    for row in 0..CURSOR_HEIGHT {
        for col in 0..CURSOR_WIDTH {
            if let Some((x, y)) = clip(info, origin, row, col) {
                f(row, col, x, y);
            }
        }
    }
}

/// Maps sprite cell `(row, col)` at `origin` to a framebuffer pixel, if
/// it is on screen.
fn clip(info: FramebufferInfo, origin: Point, row: usize, col: usize) -> Option<(u32, u32)> {
    let x = origin.x.checked_add(col as i32)?;
    let y = origin.y.checked_add(row as i32)?;
    info.contains(x, y).then_some((x as u32, y as u32))
}

//! Framebuffer interface trait and associated types.

/// Metadata describing a 32-bit linear framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixels per scanline (may be larger than `width` due to alignment).
    pub stride: u32,
}

impl FramebufferInfo {
    /// Returns `true` if `(x, y)` lies on the visible surface.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }
}

/// Interface trait for pixel-addressable framebuffers.
///
/// Pixels are `0x00RRGGBB`. Callers only pass coordinates inside
/// [`FramebufferInfo::width`] × [`FramebufferInfo::height`].
pub trait Framebuffer {
    /// Returns metadata about this framebuffer.
    fn info(&self) -> FramebufferInfo;

    /// Reads the pixel at the given coordinates.
    fn pixel(&self, x: u32, y: u32) -> u32;

    /// Writes a pixel at the given coordinates.
    fn put_pixel(&mut self, x: u32, y: u32, color: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_clips_all_edges() {
        let info = FramebufferInfo {
            width: 800,
            height: 600,
            stride: 800,
        };
        assert!(info.contains(0, 0));
        assert!(info.contains(799, 599));
        assert!(!info.contains(800, 10));
        assert!(!info.contains(10, 600));
        assert!(!info.contains(-1, 10));
        assert!(!info.contains(10, -1));
    }
}

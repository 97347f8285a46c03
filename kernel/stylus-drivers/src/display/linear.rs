//! 32-bit linear framebuffer.

use stylus_core::addr::VirtAddr;
use stylus_driver_api::{Framebuffer, FramebufferInfo};

/// A framebuffer laid out as `stride`-pixel scanlines of `0x00RRGGBB`.
pub struct LinearFramebuffer<'a> {
    pixels: &'a mut [u32],
    info: FramebufferInfo,
}

impl<'a> LinearFramebuffer<'a> {
    /// Wraps `pixels`, which must hold `stride * height` entries.
    ///
    /// # Panics
    ///
    /// Panics if `pixels` is too short for `info`.
    #[must_use]
    pub fn new(pixels: &'a mut [u32], info: FramebufferInfo) -> Self {
        assert!(
            pixels.len() >= info.stride as usize * info.height as usize,
            "framebuffer slice shorter than stride * height"
        );
        Self { pixels, info }
    }

    /// Wraps the framebuffer mapped at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to `stride * height` mapped, writable pixels that
    /// nothing else accesses for `'a`.
    #[must_use]
    pub unsafe fn from_raw(base: VirtAddr, info: FramebufferInfo) -> Self {
        let len = info.stride as usize * info.height as usize;
        // SAFETY: Guaranteed by the caller.
        let pixels = unsafe { core::slice::from_raw_parts_mut(base.as_mut_ptr::<u32>(), len) };
        Self { pixels, info }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.info.stride as usize + x as usize
    }
}

impl Framebuffer for LinearFramebuffer<'_> {
    fn info(&self) -> FramebufferInfo {
        self.info
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.index(x, y)]
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: u32) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }
}

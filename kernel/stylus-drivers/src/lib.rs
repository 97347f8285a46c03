//! Pointer drivers for Stylus.
//!
//! Finds a virtio-input tablet on the virtio-mmio bus, keeps its event queue
//! recycling, decodes absolute pointer events, falls back to a HAL pointer
//! when no tablet exists, and composites the cursor sprite onto a linear
//! framebuffer.

#![cfg_attr(not(test), no_std)]

// ── Subsystem modules ───────────────────────────────────────────────────

pub mod config;
pub mod display;
pub mod input;
pub mod virtio;

#[cfg(test)]
mod testing;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use self::config::PointerConfig;
pub use self::display::cursor::Cursor;
pub use self::display::linear::LinearFramebuffer;
pub use self::input::backend::PointerBackend;
pub use self::input::event::{EventRecord, PointerState};
pub use self::input::fallback::HalFallback;
pub use self::input::tablet::{DrainMode, TABLET_QUEUE, VirtioTablet};

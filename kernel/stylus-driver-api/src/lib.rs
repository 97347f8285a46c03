//! Driver-facing traits and types for the Stylus pointer subsystem.
//!
//! - **Errors** -- [`DriverError`] for the generic driver model and
//!   [`PointerError`] for pointer bring-up failures.
//! - **Interfaces** -- [`PointerSource`] (what a pointer backend answers),
//!   [`Framebuffer`] (where the cursor is drawn).
//! - **Collaborators** -- [`HalPointer`], [`InterruptController`] and
//!   [`DmaTranslate`] are implemented by the embedding kernel.

#![cfg_attr(not(test), no_std)]

pub mod dma;
pub mod error;
pub mod framebuffer;
pub mod hw;
pub mod input;

pub use dma::{DmaTranslate, IdentityDma};
pub use error::{DriverError, PointerError};
pub use framebuffer::{Framebuffer, FramebufferInfo};
pub use hw::InterruptController;
pub use input::{HalPointer, HalPointerState, MouseButtons, Point, PointerSource, ScreenGeometry};

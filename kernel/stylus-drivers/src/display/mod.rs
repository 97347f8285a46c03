//! Display-side drivers: the linear framebuffer and the cursor overlay.

pub mod cursor;
pub mod linear;

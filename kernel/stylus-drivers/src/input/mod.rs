//! Pointer input drivers.
//!
//! [`tablet`] drives a virtio-input absolute pointer, [`fallback`] adapts the
//! platform HAL pointer, and [`backend`] picks between them at boot.

pub mod backend;
pub mod event;
pub mod fallback;
pub mod tablet;

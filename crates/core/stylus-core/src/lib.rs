//! Core types shared by the Stylus pointer subsystem crates.
//!
//! Holds the pieces every other crate leans on: typed addresses for MMIO and
//! DMA programming, the leveled kernel log, and the take-once static cell
//! used to hand out statically reserved device memory.

#![cfg_attr(not(test), no_std)]

pub mod addr;
pub mod cell;
pub mod log;

//! fastarm: alignment-adaptive memory copy for ARM-class cores.
//!
//! The engine keeps destination stores word aligned wherever it can and
//! reconstructs misaligned source data in registers, falling back to
//! sub-word moves only at the edges of a transfer. Every element move is
//! byte exact on any target; alignment only changes speed.
#![allow(unsafe_op_in_unsafe_fn)]

pub mod blit;
pub mod chunk;
pub mod engine;
pub mod harness;
pub mod mem;
pub mod plan;
pub mod preload;
pub mod tail;
pub mod word;
pub mod word_align;

pub use blit::{blit, blit_with};
pub use engine::{copy, copy_aligned32, copy_with};
pub use preload::{NoPreload, Pld, Preload};

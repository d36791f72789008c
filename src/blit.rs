//! Rectangle copy built on the copy engine.
//!
//! When every source row sits at the same chunk offset as its destination
//! row, the partition into word-align, head, chunk and tail steps is the
//! same for all rows and is computed once. Otherwise each row goes
//! through [`crate::engine::copy`].
//!
//! Rows are copied top to bottom and each row front to back. Overlapping
//! rectangles are only safe when that order never reads a byte that an
//! earlier store has already replaced (for instance scrolling up).
#![allow(unsafe_code)]

use crate::chunk::CHUNK_SIZE;
use crate::engine::{copy_with, run_plan};
use crate::plan::{AlignmentClass, CopyPlan, Strategy};
use crate::preload::{Pld, Preload};

/// How a blit walks its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitMode {
    /// Equal rotations kept by both strides: one plan replayed per row.
    /// The plan's word-align step is empty when the rows are word aligned.
    Replay,
    /// Rotations differ or change between rows: one full copy per row.
    PerRow,
}

impl BlitMode {
    pub const fn select(class: AlignmentClass, src_stride: isize, dest_stride: isize) -> Self {
        let strides_keep_rotation =
            src_stride % CHUNK_SIZE as isize == 0 && dest_stride % CHUNK_SIZE as isize == 0;
        if class.src != class.dest || !strides_keep_rotation {
            return BlitMode::PerRow;
        }
        BlitMode::Replay
    }
}

/// Copy `height` rows of `width` bytes.
///
/// Row `r` is read from `src + r * src_stride` and written to
/// `dest + r * dest_stride`. A non-positive `width` or `height` copies
/// nothing.
///
/// # Safety
///
/// - every source row must be valid for reads and every destination row for writes
/// - regions must not overlap, except where top-to-bottom, left-to-right
///   order is acceptable
#[inline]
pub unsafe fn blit(
    src: *const u8,
    dest: *mut u8,
    src_stride: isize,
    dest_stride: isize,
    width: isize,
    height: isize,
) {
    blit_with::<Pld>(src, dest, src_stride, dest_stride, width, height);
}

/// [`blit`] with an explicit preload policy.
///
/// # Safety
///
/// Same contract as [`blit`].
pub unsafe fn blit_with<P: Preload>(
    mut src: *const u8,
    mut dest: *mut u8,
    src_stride: isize,
    dest_stride: isize,
    width: isize,
    height: isize,
) {
    if width <= 0 || height <= 0 {
        return;
    }
    P::preload(src);
    let class = AlignmentClass::of(dest, src);
    let mode = BlitMode::select(class, src_stride, dest_stride);

    // Only consulted when replaying; equal rotations never reconstruct.
    let plan = CopyPlan::new(class.src, width as usize);

    for row in 0..height {
        if row != 0 {
            src = src.offset(src_stride);
            dest = dest.offset(dest_stride);
            P::preload(src);
        }
        match mode {
            BlitMode::Replay => {
                run_plan::<P>(Strategy::EqualRotation, plan, src, dest);
            }
            BlitMode::PerRow => {
                copy_with::<P>(dest, src, width);
            }
        }
    }
}

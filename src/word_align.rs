//! Copy the 1 to 3 bytes that bring the source to word alignment.
//!
//! The caller picks the entry as `(4 - (src & 3)) & 3`, so on entry the
//! source is at a known sub-word offset: 3 for one byte, 2 for two, 1 for
//! three. The two- and three-byte entries choose their store grouping
//! from the destination's halfword alignment; both groupings write the
//! same bytes.
#![allow(unsafe_code)]

use crate::word::{load_le16, move_u8, move_u16, store_le16};

pub type WordAlignFn = unsafe fn(src: *const u8, dest: *mut u8);

unsafe fn word_align_0(_src: *const u8, _dest: *mut u8) {}

unsafe fn word_align_1(src: *const u8, dest: *mut u8) {
    // SAFETY: Caller guarantees one readable and writable byte.
    move_u8(src, dest, 0);
}

unsafe fn word_align_2(src: *const u8, dest: *mut u8) {
    // SAFETY: Caller guarantees two readable and writable bytes; halfword
    // accesses go through unaligned loads/stores.
    if (dest as usize) & 1 != 0 {
        // Halfword read from the aligned source, split into two byte stores.
        let v = load_le16(src);
        *dest = v as u8;
        *dest.add(1) = (v >> 8) as u8;
        return;
    }
    move_u16(src, dest, 0);
}

unsafe fn word_align_3(src: *const u8, dest: *mut u8) {
    // SAFETY: Caller guarantees three readable and writable bytes; halfword
    // accesses go through unaligned loads/stores.
    if (dest as usize) & 1 != 0 {
        // Destination is odd like the source: byte, then an aligned halfword.
        move_u8(src, dest, 0);
        move_u16(src, dest, 1);
        return;
    }
    // Destination is halfword aligned but the source is not.
    let v0 = u32::from(*src);
    let v1 = u32::from(load_le16(src.add(1)));
    store_le16(dest, (v0 | (v1 << 8)) as u16);
    *dest.add(2) = (v1 >> 8) as u8;
}

/// Word aligners indexed by byte count; entry 0 copies nothing.
pub static WORD_ALIGN: [WordAlignFn; 4] = [word_align_0, word_align_1, word_align_2, word_align_3];

/// Number of bytes to copy so that `src` becomes word aligned.
#[inline(always)]
pub const fn word_align_size(src_rotation: usize) -> usize {
    (4 - (src_rotation & 3)) & 3
}

/// Copy `size` (0..=3) bytes from `src` to `dest`.
///
/// # Safety
///
/// - `src` must be valid for reads and `dest` for writes of `size` bytes
/// - `size <= 3`
#[inline(always)]
pub unsafe fn word_align(src: *const u8, dest: *mut u8, size: usize) {
    debug_assert!(size <= 3);
    WORD_ALIGN[size](src, dest);
}

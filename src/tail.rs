//! Straight-line copies of 0 to 31 bytes.
//!
//! [`TAIL_COPY`] is indexed by the exact byte count. Each entry is a
//! loop-free run of word moves for the largest multiple of four below the
//! count, followed by halfword/byte moves selected by `n & 2` and `n & 1`.
//! Accesses are unaligned-tolerant; these routines are used where the
//! number of bytes is too small for alignment work to pay off.
#![allow(unsafe_code)]

use crate::word::{move_u8, move_u16, move_u32};

/// Copies exactly `n` bytes; `n` must be a count served by the entry.
pub type TailFn = unsafe fn(src: *const u8, dest: *mut u8, n: usize);

/// Largest count handled by [`TAIL_COPY`].
pub const MAX_TAIL: usize = 31;

/// Copy the last 1 to 3 bytes of a run whose word part ends at `off`.
#[inline(always)]
unsafe fn copy_sub_word(src: *const u8, dest: *mut u8, off: usize, n: usize) {
    // SAFETY: `off + (n & 3)` bytes are in bounds for both pointers.
    if n & 2 != 0 {
        move_u16(src, dest, off);
        if n & 1 != 0 {
            move_u8(src, dest, off + 2);
        }
        return;
    }
    move_u8(src, dest, off);
}

unsafe fn tail_0(_src: *const u8, _dest: *mut u8, _n: usize) {}

unsafe fn tail_1_2_3(src: *const u8, dest: *mut u8, n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    copy_sub_word(src, dest, 0, n);
}

unsafe fn tail_4(src: *const u8, dest: *mut u8, _n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
}

unsafe fn tail_5_6_7(src: *const u8, dest: *mut u8, n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    copy_sub_word(src, dest, 4, n);
}

unsafe fn tail_8(src: *const u8, dest: *mut u8, _n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    move_u32(src, dest, 4);
}

unsafe fn tail_9_10_11(src: *const u8, dest: *mut u8, n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    move_u32(src, dest, 4);
    copy_sub_word(src, dest, 8, n);
}

unsafe fn tail_12_to_15(src: *const u8, dest: *mut u8, n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    move_u32(src, dest, 4);
    move_u32(src, dest, 8);
    if n == 12 {
        return;
    }
    copy_sub_word(src, dest, 12, n);
}

unsafe fn tail_16(src: *const u8, dest: *mut u8, _n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    move_u32(src, dest, 4);
    move_u32(src, dest, 8);
    move_u32(src, dest, 12);
}

unsafe fn tail_17_18_19(src: *const u8, dest: *mut u8, n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    move_u32(src, dest, 4);
    move_u32(src, dest, 8);
    move_u32(src, dest, 12);
    copy_sub_word(src, dest, 16, n);
}

unsafe fn tail_20_to_23(src: *const u8, dest: *mut u8, n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    move_u32(src, dest, 4);
    move_u32(src, dest, 8);
    move_u32(src, dest, 12);
    move_u32(src, dest, 16);
    if n == 20 {
        return;
    }
    copy_sub_word(src, dest, 20, n);
}

unsafe fn tail_24_to_27(src: *const u8, dest: *mut u8, n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    move_u32(src, dest, 4);
    move_u32(src, dest, 8);
    move_u32(src, dest, 12);
    move_u32(src, dest, 16);
    move_u32(src, dest, 20);
    if n == 24 {
        return;
    }
    copy_sub_word(src, dest, 24, n);
}

unsafe fn tail_28_to_31(src: *const u8, dest: *mut u8, n: usize) {
    // SAFETY: Unaligned moves; caller guarantees `n` bytes on both sides and
    // this entry touches no byte past `n`.
    move_u32(src, dest, 0);
    move_u32(src, dest, 4);
    move_u32(src, dest, 8);
    move_u32(src, dest, 12);
    move_u32(src, dest, 16);
    move_u32(src, dest, 20);
    move_u32(src, dest, 24);
    if n == 28 {
        return;
    }
    copy_sub_word(src, dest, 28, n);
}

/// Tail copiers indexed by byte count.
pub static TAIL_COPY: [TailFn; MAX_TAIL + 1] = [
    tail_0,
    tail_1_2_3,
    tail_1_2_3,
    tail_1_2_3,
    tail_4,
    tail_5_6_7,
    tail_5_6_7,
    tail_5_6_7,
    tail_8,
    tail_9_10_11,
    tail_9_10_11,
    tail_9_10_11,
    tail_12_to_15,
    tail_12_to_15,
    tail_12_to_15,
    tail_12_to_15,
    tail_16,
    tail_17_18_19,
    tail_17_18_19,
    tail_17_18_19,
    tail_20_to_23,
    tail_20_to_23,
    tail_20_to_23,
    tail_20_to_23,
    tail_24_to_27,
    tail_24_to_27,
    tail_24_to_27,
    tail_24_to_27,
    tail_28_to_31,
    tail_28_to_31,
    tail_28_to_31,
    tail_28_to_31,
];

/// Copy `n` (at most [`MAX_TAIL`]) bytes without looping.
///
/// # Safety
///
/// - `src` must be valid for reads and `dest` for writes of `n` bytes
/// - `n <= MAX_TAIL`
#[inline(always)]
pub unsafe fn copy_tail(src: *const u8, dest: *mut u8, n: usize) {
    debug_assert!(n <= MAX_TAIL);
    TAIL_COPY[n](src, dest, n);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tail_size_at_every_offset() {
        let src: Vec<u8> = (0..64usize).map(|i| (i % 251) as u8 + 1).collect();
        for n in 0..=MAX_TAIL {
            for src_off in 0..4 {
                for dst_off in 0..4 {
                    let mut dst = [0u8; 64];
                    unsafe {
                        copy_tail(src.as_ptr().add(src_off), dst.as_mut_ptr().add(dst_off), n);
                    }
                    assert_eq!(
                        &dst[dst_off..dst_off + n],
                        &src[src_off..src_off + n],
                        "n={n} src_off={src_off} dst_off={dst_off}"
                    );
                    assert!(dst[..dst_off].iter().all(|&b| b == 0), "wrote before dest, n={n}");
                    assert!(
                        dst[dst_off + n..].iter().all(|&b| b == 0),
                        "wrote past end, n={n} dst_off={dst_off}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_zero_tail_touches_nothing() {
        let src = [7u8; 4];
        let mut dst = [0u8; 4];
        unsafe { copy_tail(src.as_ptr(), dst.as_mut_ptr(), 0) };
        assert_eq!(dst, [0u8; 4]);
    }
}

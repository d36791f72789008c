//! Alignment-adaptive memcpy.
//!
//! [`copy`] classifies the source and destination by their offsets within
//! a 32-byte chunk, splits the transfer into word-align, head, chunk and
//! tail steps, and runs each step through the matching kernel table. The
//! goal is to keep the bulk of the destination stores word aligned on
//! cores where unaligned stores are slow, while tolerating unaligned
//! reads.
#![allow(unsafe_code)]

use crate::chunk::{CHUNK_SIZE, ChunkKernels};
use crate::plan::{AlignmentClass, CopyPlan, SMALL_COPY_MAX, Strategy};
use crate::preload::{Pld, Preload};
use crate::tail::copy_tail;
use crate::word_align::word_align;

/// Copy `n` bytes from `src` to `dest` and return `dest`.
///
/// A negative `n` copies nothing.
///
/// # Safety
///
/// - `dest` and `src` must be valid for writes/reads of `n` bytes
/// - The memory regions must not overlap
#[inline]
pub unsafe fn copy(dest: *mut u8, src: *const u8, n: isize) -> *mut u8 {
    copy_with::<Pld>(dest, src, n)
}

/// [`copy`] with an explicit preload policy.
///
/// # Safety
///
/// Same contract as [`copy`].
pub unsafe fn copy_with<P: Preload>(dest: *mut u8, src: *const u8, n: isize) -> *mut u8 {
    if n < 0 {
        return dest;
    }
    let n = n as usize;
    if n <= SMALL_COPY_MAX {
        copy_tail(src, dest, n);
        return dest;
    }

    P::preload(src);
    let class = AlignmentClass::of(dest, src);
    let strategy = Strategy::classify(class, n);
    run_plan::<P>(strategy, CopyPlan::new(class.src, n), src, dest);
    dest
}

/// Copy when both pointers are known to sit on a 32-byte boundary.
///
/// `n <= 0` copies nothing.
///
/// # Safety
///
/// As [`copy`]. The alignment precondition is not checked; breaking it
/// only costs speed.
#[inline]
pub unsafe fn copy_aligned32(dest: *mut u8, src: *const u8, n: isize) -> *mut u8 {
    copy_aligned32_with::<Pld>(dest, src, n)
}

/// [`copy_aligned32`] with an explicit preload policy.
///
/// # Safety
///
/// Same contract as [`copy_aligned32`].
pub unsafe fn copy_aligned32_with<P: Preload>(dest: *mut u8, src: *const u8, n: isize) -> *mut u8 {
    if n <= 0 {
        return dest;
    }
    let n = n as usize;
    let chunks = n / CHUNK_SIZE;
    ChunkKernels::<P>::ALIGNED(src, dest, chunks);
    let done = chunks * CHUNK_SIZE;
    copy_tail(src.add(done), dest.add(done), n - done);
    dest
}

/// Execute the steps of `plan` in order.
///
/// # Safety
///
/// `src`/`dest` valid for `plan.len()` bytes, non-overlapping.
pub(crate) unsafe fn run_plan<P: Preload>(
    strategy: Strategy,
    plan: CopyPlan,
    mut src: *const u8,
    mut dest: *mut u8,
) {
    if plan.word_align_size != 0 {
        word_align(src, dest, plan.word_align_size);
        src = src.add(plan.word_align_size);
        dest = dest.add(plan.word_align_size);
    }

    if plan.head_size != 0 {
        if plan.chunk_count != 0 || plan.tail_size != 0 {
            P::preload_ahead(src, CHUNK_SIZE);
        }
        copy_tail(src, dest, plan.head_size);
        src = src.add(plan.head_size);
        dest = dest.add(plan.head_size);
    }

    if plan.chunk_count != 0 {
        let kernel = if strategy.reconstructs() {
            ChunkKernels::<P>::for_destination(dest)
        } else {
            ChunkKernels::<P>::ALIGNED
        };
        kernel(src, dest, plan.chunk_count);
        src = src.add(plan.chunk_count * CHUNK_SIZE);
        dest = dest.add(plan.chunk_count * CHUNK_SIZE);
    }

    if plan.tail_size != 0 {
        copy_tail(src, dest, plan.tail_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preload::NoPreload;
    use proptest::prelude::*;

    const GUARD: u8 = 0xA5;

    /// Source pattern whose chunk-aligned base makes offsets equal rotations.
    struct Fixture {
        buf: Vec<u8>,
        base: usize,
    }

    impl Fixture {
        fn new(len: usize) -> Self {
            let mut buf = vec![0u8; len + 32];
            for (i, b) in buf.iter_mut().enumerate() {
                *b = (i % 251) as u8;
            }
            let base = buf.as_ptr().align_offset(32);
            Self { buf, base }
        }

        fn src(&self, off: usize, n: usize) -> &[u8] {
            &self.buf[self.base + off..self.base + off + n]
        }

        fn check<P: Preload>(&self, src_off: usize, dst_off: usize, n: usize) {
            let len = dst_off + n + 64;
            let mut got = vec![GUARD; len + 32];
            let got_base = got.as_ptr().align_offset(32);
            let mut expected = got.clone();
            expected[got_base + dst_off..got_base + dst_off + n]
                .copy_from_slice(self.src(src_off, n));

            let src = self.src(src_off, n).as_ptr();
            let dest = unsafe { got.as_mut_ptr().add(got_base + dst_off) };
            assert_eq!(dest as usize % 32, dst_off % 32);
            let ret = unsafe { copy_with::<P>(dest, src, n as isize) };
            assert_eq!(ret, dest, "returned pointer differs from dest");
            assert!(
                got == expected,
                "mismatch src_off={src_off} dst_off={dst_off} n={n}"
            );
        }
    }

    fn check_copy<P: Preload>(src_off: usize, dst_off: usize, n: usize) {
        Fixture::new(src_off + n).check::<P>(src_off, dst_off, n);
    }

    #[test]
    fn test_full_alignment_sweep() {
        let fixture = Fixture::new(32768 + 32);
        for src_off in 0..32 {
            for dst_off in 0..32 {
                for n in [0usize, 1, 3, 4, 7, 8, 17, 31, 32, 33, 1024, 32768] {
                    fixture.check::<Pld>(src_off, dst_off, n);
                }
            }
        }
    }

    #[test]
    fn test_sweep_without_preload_matches() {
        let fixture = Fixture::new(512);
        for src_off in 0..32 {
            for dst_off in 0..32 {
                for n in [13usize, 45, 100, 257] {
                    fixture.check::<NoPreload>(src_off, dst_off, n);
                }
            }
        }
    }

    #[test]
    fn test_partition_edges() {
        let fixture = Fixture::new(128);
        for (src_off, dst_off) in [(0, 0), (1, 2), (3, 3), (4, 20), (8, 13), (5, 9), (30, 1)] {
            for n in [11usize, 12, 13, 31, 32, 33, 63, 64, 65] {
                fixture.check::<Pld>(src_off, dst_off, n);
            }
        }
    }

    #[test]
    fn test_zero_length_leaves_sentinels() {
        let src = [1u8; 16];
        let mut dst = [GUARD; 16];
        let ret = unsafe { copy(dst.as_mut_ptr().add(8), src.as_ptr(), 0) };
        assert_eq!(ret, unsafe { dst.as_mut_ptr().add(8) });
        assert_eq!(dst, [GUARD; 16]);
    }

    #[test]
    fn test_negative_length_is_noop() {
        let src = [1u8; 64];
        let mut dst = [GUARD; 64];
        let ret = unsafe { copy(dst.as_mut_ptr(), src.as_ptr(), -1) };
        assert_eq!(ret, dst.as_mut_ptr());
        assert_eq!(dst, [GUARD; 64]);
        unsafe { copy(dst.as_mut_ptr(), src.as_ptr(), isize::MIN) };
        assert_eq!(dst, [GUARD; 64]);
    }

    #[test]
    fn test_source_chunk_aligned_destination_rotation_3() {
        check_copy::<Pld>(0, 3, 137);
    }

    #[test]
    fn test_equal_rotation_1000_bytes() {
        check_copy::<Pld>(5, 5, 1000);
    }

    #[test]
    fn test_rotation_1_reconstruction_three_chunks() {
        check_copy::<Pld>(0, 9, 96);
        check_copy::<Pld>(0, 9, 96 + 7);
    }

    #[test]
    fn test_copy_aligned32() {
        let fixture = Fixture::new(512);
        for n in [-5isize, 0, 1, 31, 32, 33, 100, 480] {
            let mut dst = vec![GUARD; 512 + 32];
            let base = dst.as_ptr().align_offset(32);
            let dest = unsafe { dst.as_mut_ptr().add(base) };
            let src = fixture.src(0, 480).as_ptr();
            let ret = unsafe { copy_aligned32(dest, src, n) };
            assert_eq!(ret, dest);
            let n = n.max(0) as usize;
            assert_eq!(&dst[base..base + n], fixture.src(0, n), "n={n}");
            assert!(dst[base + n..].iter().all(|&b| b == GUARD), "n={n}");
            assert!(dst[..base].iter().all(|&b| b == GUARD), "n={n}");
        }
    }

    proptest! {
        #[test]
        fn prop_copy_matches_reference(
            src_off in 0usize..64,
            dst_off in 0usize..64,
            n in 0usize..2048,
        ) {
            let mut src = vec![0u8; 2048 + 64];
            for (i, b) in src.iter_mut().enumerate() {
                *b = (i * 7 % 256) as u8;
            }
            let mut dst = vec![GUARD; 2048 + 64];
            let mut expected = dst.clone();
            expected[dst_off..dst_off + n].copy_from_slice(&src[src_off..src_off + n]);
            unsafe {
                copy(dst.as_mut_ptr().add(dst_off), src.as_ptr().add(src_off), n as isize);
            }
            prop_assert_eq!(dst, expected);
        }
    }
}

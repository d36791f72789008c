//! 32-byte chunk kernels.
//!
//! Four kernels, indexed by the destination's byte offset within a word
//! at the start of the chunk run:
//!
//! - 0: burst copy, eight words in and eight words out per chunk.
//! - 1, 2, 3: reconstruction. Source words are read whole and every
//!   destination word is rebuilt from the top of one source word and the
//!   bottom of the next, so the destination sees word-aligned stores for
//!   all but the first and last few bytes of each chunk.
//!
//! Reads tolerate any alignment. The reconstruction kernels require the
//! destination rotation they are named for; the dispatcher derives the
//! table index from the destination pointer itself.
#![allow(unsafe_code)]

use core::marker::PhantomData;

use crate::preload::{Pld, Preload};
use crate::word::{combine, load_le32, store_le16, store_le32_aligned};

/// Bytes per chunk.
pub const CHUNK_SIZE: usize = 32;

/// Copies `chunks` whole chunks.
pub type ChunkFn = unsafe fn(src: *const u8, dest: *mut u8, chunks: usize);

/// Distance ahead of the read cursor preloaded by the burst kernel.
const BURST_PRELOAD_DISTANCE: usize = 128;

type Burst = [u32; 4];

/// Burst copy of whole chunks.
///
/// Each chunk is moved as two 16-byte bursts. The preload for the chunk
/// four ahead is issued between the two stores.
///
/// # Safety
///
/// `src` must be valid for reads and `dest` for writes of `chunks * 32` bytes.
pub unsafe fn copy_chunks_aligned<P: Preload>(mut src: *const u8, mut dest: *mut u8, chunks: usize) {
    for _ in 0..chunks {
        // SAFETY: Unaligned burst loads/stores are valid for any alignment;
        // caller guarantees `chunks * 32` readable and writable bytes.
        let lo = core::ptr::read_unaligned(src as *const Burst);
        let hi = core::ptr::read_unaligned(src.add(16) as *const Burst);
        src = src.add(CHUNK_SIZE);
        core::ptr::write_unaligned(dest as *mut Burst, lo);
        P::preload_ahead(src, BURST_PRELOAD_DISTANCE);
        core::ptr::write_unaligned(dest.add(16) as *mut Burst, hi);
        dest = dest.add(CHUNK_SIZE);
    }
}

/// Destination one byte past a word boundary.
///
/// Per chunk: byte, halfword, seven rebuilt words, byte.
///
/// # Safety
///
/// As [`copy_chunks_aligned`], and `dest as usize & 3 == 1`.
pub unsafe fn copy_chunks_rotated_1<P: Preload>(
    mut src: *const u8,
    mut dest: *mut u8,
    chunks: usize,
) {
    P::preload_ahead(src, 32);
    for _ in 0..chunks {
        // SAFETY: Unaligned word loads are valid for any alignment; every
        // load stays inside the current 32-byte source chunk.
        let v0 = load_le32(src);
        let v1 = load_le32(src.add(4));
        // SAFETY: `dest & 3 == 1`, so the leading sub-word stores reach a
        // word boundary and every rebuilt word store below is aligned.
        *dest = v0 as u8;
        store_le16(dest.add(1), (v0 >> 8) as u16);
        store_le32_aligned(dest.add(3), combine(v0, v1, 1));
        let v2 = load_le32(src.add(8));
        let v3 = load_le32(src.add(12));
        store_le32_aligned(dest.add(7), combine(v1, v2, 1));
        store_le32_aligned(dest.add(11), combine(v2, v3, 1));
        let v4 = load_le32(src.add(16));
        let v5 = load_le32(src.add(20));
        store_le32_aligned(dest.add(15), combine(v3, v4, 1));
        P::preload_ahead(src, 64);
        store_le32_aligned(dest.add(19), combine(v4, v5, 1));
        let v6 = load_le32(src.add(24));
        let v7 = load_le32(src.add(28));
        store_le32_aligned(dest.add(23), combine(v5, v6, 1));
        store_le32_aligned(dest.add(27), combine(v6, v7, 1));
        *dest.add(31) = (v7 >> 24) as u8;
        src = src.add(CHUNK_SIZE);
        dest = dest.add(CHUNK_SIZE);
    }
}

/// Destination two bytes past a word boundary.
///
/// Per chunk: halfword, seven rebuilt words, halfword.
///
/// # Safety
///
/// As [`copy_chunks_aligned`], and `dest as usize & 3 == 2`.
pub unsafe fn copy_chunks_rotated_2<P: Preload>(
    mut src: *const u8,
    mut dest: *mut u8,
    chunks: usize,
) {
    P::preload_ahead(src, 32);
    for _ in 0..chunks {
        // SAFETY: Unaligned word loads are valid for any alignment; every
        // load stays inside the current 32-byte source chunk.
        let v0 = load_le32(src);
        let v1 = load_le32(src.add(4));
        // SAFETY: `dest & 3 == 2`, so the leading sub-word stores reach a
        // word boundary and every rebuilt word store below is aligned.
        store_le16(dest, v0 as u16);
        store_le32_aligned(dest.add(2), combine(v0, v1, 2));
        let v2 = load_le32(src.add(8));
        let v3 = load_le32(src.add(12));
        store_le32_aligned(dest.add(6), combine(v1, v2, 2));
        store_le32_aligned(dest.add(10), combine(v2, v3, 2));
        let v4 = load_le32(src.add(16));
        let v5 = load_le32(src.add(20));
        store_le32_aligned(dest.add(14), combine(v3, v4, 2));
        P::preload_ahead(src, 64);
        store_le32_aligned(dest.add(18), combine(v4, v5, 2));
        let v6 = load_le32(src.add(24));
        let v7 = load_le32(src.add(28));
        store_le32_aligned(dest.add(22), combine(v5, v6, 2));
        store_le32_aligned(dest.add(26), combine(v6, v7, 2));
        store_le16(dest.add(30), (v7 >> 16) as u16);
        src = src.add(CHUNK_SIZE);
        dest = dest.add(CHUNK_SIZE);
    }
}

/// Destination three bytes past a word boundary.
///
/// Per chunk: byte, seven rebuilt words, halfword, byte.
///
/// # Safety
///
/// As [`copy_chunks_aligned`], and `dest as usize & 3 == 3`.
pub unsafe fn copy_chunks_rotated_3<P: Preload>(
    mut src: *const u8,
    mut dest: *mut u8,
    chunks: usize,
) {
    P::preload_ahead(src, 32);
    for _ in 0..chunks {
        // SAFETY: Unaligned word loads are valid for any alignment; every
        // load stays inside the current 32-byte source chunk.
        let v0 = load_le32(src);
        let v1 = load_le32(src.add(4));
        let v2 = load_le32(src.add(8));
        // SAFETY: `dest & 3 == 3`, so the leading sub-word stores reach a
        // word boundary and every rebuilt word store below is aligned.
        *dest = v0 as u8;
        store_le32_aligned(dest.add(1), combine(v0, v1, 3));
        store_le32_aligned(dest.add(5), combine(v1, v2, 3));
        let v3 = load_le32(src.add(12));
        let v4 = load_le32(src.add(16));
        store_le32_aligned(dest.add(9), combine(v2, v3, 3));
        store_le32_aligned(dest.add(13), combine(v3, v4, 3));
        let v5 = load_le32(src.add(20));
        let v6 = load_le32(src.add(24));
        store_le32_aligned(dest.add(17), combine(v4, v5, 3));
        P::preload_ahead(src, 64);
        store_le32_aligned(dest.add(21), combine(v5, v6, 3));
        let v7 = load_le32(src.add(28));
        store_le32_aligned(dest.add(25), combine(v6, v7, 3));
        store_le16(dest.add(29), (v7 >> 8) as u16);
        *dest.add(31) = (v7 >> 24) as u8;
        src = src.add(CHUNK_SIZE);
        dest = dest.add(CHUNK_SIZE);
    }
}

/// Kernel table for one preload policy.
pub struct ChunkKernels<P = Pld>(PhantomData<P>);

impl<P: Preload> ChunkKernels<P> {
    /// Indexed by `dest as usize & 3`.
    pub const TABLE: [ChunkFn; 4] = [
        copy_chunks_aligned::<P>,
        copy_chunks_rotated_1::<P>,
        copy_chunks_rotated_2::<P>,
        copy_chunks_rotated_3::<P>,
    ];

    /// The burst kernel regardless of destination alignment.
    pub const ALIGNED: ChunkFn = copy_chunks_aligned::<P>;

    /// Kernel that keeps destination stores word aligned for `dest`.
    #[inline(always)]
    pub fn for_destination(dest: *const u8) -> ChunkFn {
        Self::TABLE[dest as usize & 3]
    }
}

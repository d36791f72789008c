//! Byte, halfword and word moves used by every kernel.
//!
//! Plain moves go through `read_unaligned`/`write_unaligned` so they are
//! valid at any address. Values that are shifted and recombined are read
//! and written in little-endian order, so the first byte in memory is
//! always the low byte of the register. That keeps the reconstruction
//! kernels byte-exact on big-endian targets too.
#![allow(unsafe_code)]

/// Move one byte from `src + off` to `dest + off`.
#[inline(always)]
pub(crate) unsafe fn move_u8(src: *const u8, dest: *mut u8, off: usize) {
    *dest.add(off) = *src.add(off);
}

/// Move two bytes from `src + off` to `dest + off`.
#[inline(always)]
pub(crate) unsafe fn move_u16(src: *const u8, dest: *mut u8, off: usize) {
    let v = core::ptr::read_unaligned(src.add(off) as *const u16);
    core::ptr::write_unaligned(dest.add(off) as *mut u16, v);
}

/// Move four bytes from `src + off` to `dest + off`.
#[inline(always)]
pub(crate) unsafe fn move_u32(src: *const u8, dest: *mut u8, off: usize) {
    let v = core::ptr::read_unaligned(src.add(off) as *const u32);
    core::ptr::write_unaligned(dest.add(off) as *mut u32, v);
}

#[inline(always)]
pub(crate) unsafe fn load_le16(p: *const u8) -> u16 {
    u16::from_le(core::ptr::read_unaligned(p as *const u16))
}

#[inline(always)]
pub(crate) unsafe fn load_le32(p: *const u8) -> u32 {
    u32::from_le(core::ptr::read_unaligned(p as *const u32))
}

#[inline(always)]
pub(crate) unsafe fn store_le16(p: *mut u8, v: u16) {
    core::ptr::write_unaligned(p as *mut u16, v.to_le());
}

/// Word store to an address the caller has already word aligned.
#[inline(always)]
pub(crate) unsafe fn store_le32_aligned(p: *mut u8, v: u32) {
    debug_assert_eq!(p as usize & 3, 0, "misaligned word store");
    // SAFETY: Aligned store; callers only pass word-aligned destinations
    // valid for four bytes.
    core::ptr::write(p as *mut u32, v.to_le());
}

/// Join the high part of `lo` with the low part of `hi`.
///
/// `lo_bytes` is the number of bytes taken from the top of `lo` (1..=3);
/// the remaining `4 - lo_bytes` come from the bottom of `hi`. Both words
/// are in little-endian byte order, as returned by [`load_le32`].
#[inline(always)]
pub(crate) const fn combine(lo: u32, hi: u32, lo_bytes: u32) -> u32 {
    (lo >> (8 * (4 - lo_bytes))) | (hi << (8 * lo_bytes))
}

//! Cache-line preload hints.
//!
//! A preload never affects the bytes a copy produces. Kernels are generic
//! over [`Preload`] so the hint can be swapped for [`NoPreload`] at compile
//! time (tests run both and expect identical output).
#![allow(unsafe_code)]

/// Advisory request to bring the cache line holding `addr` closer to the core.
pub trait Preload {
    fn preload(addr: *const u8);

    /// Preload `offset` bytes past `base`.
    ///
    /// The address is formed with wrapping arithmetic: hinting past the end
    /// of an allocation is allowed and harmless.
    #[inline(always)]
    fn preload_ahead(base: *const u8, offset: usize) {
        Self::preload(base.wrapping_add(offset));
    }
}

/// The architecture's data preload instruction, or nothing where there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pld;

impl Preload for Pld {
    #[inline(always)]
    fn preload(addr: *const u8) {
        #[cfg(target_arch = "arm")]
        {
            // SAFETY: pld is a hint; invalid addresses do not fault.
            unsafe {
                core::arch::asm!(
                    "pld [{addr}]",
                    addr = in(reg) addr,
                    options(readonly, nostack, preserves_flags),
                );
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            // SAFETY: prfm is a hint; invalid addresses do not fault.
            unsafe {
                core::arch::asm!(
                    "prfm pldl1keep, [{addr}]",
                    addr = in(reg) addr,
                    options(readonly, nostack, preserves_flags),
                );
            }
        }

        #[cfg(target_arch = "x86_64")]
        {
            // SAFETY: prefetcht0 is a hint; invalid addresses are ignored.
            unsafe {
                core::arch::x86_64::_mm_prefetch(
                    addr as *const i8,
                    core::arch::x86_64::_MM_HINT_T0,
                );
            }
        }

        #[cfg(not(any(target_arch = "arm", target_arch = "aarch64", target_arch = "x86_64")))]
        {
            let _ = addr;
        }
    }
}

/// Never issues a hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreload;

impl Preload for NoPreload {
    #[inline(always)]
    fn preload(_addr: *const u8) {}
}

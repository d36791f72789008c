//! Differential validation against a byte-by-byte reference.
//!
//! Each case copies a randomly sized block between randomly placed
//! offsets inside guarded buffers. The whole destination buffer, guards
//! included, must match what the reference loop produces. A failing case
//! is recorded and the run carries on.
#![allow(unsafe_code)]

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

use super::{HarnessError, Variant};
use crate::chunk::CHUNK_SIZE;

/// Mismatching bytes kept per failing case.
pub const MAX_REPORTED_MISMATCHES: usize = 10;

/// How source and destination offsets are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentMode {
    /// Independent offsets in `0..32`.
    #[default]
    Random,
    /// One offset in `0..32` shared by source and destination.
    MutuallyAligned,
    /// Both offsets zero.
    ChunkAligned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    pub cases: usize,
    pub max_size: usize,
    pub seed: u64,
    pub alignment: AlignmentMode,
    /// Guard bytes on each side of the copy region.
    pub guard: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            cases: 10_000,
            max_size: 4096,
            seed: 0,
            alignment: AlignmentMode::Random,
            guard: 32,
        }
    }
}

impl ValidationConfig {
    pub fn with_cases(mut self, cases: usize) -> Self {
        self.cases = cases;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentMode) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_guard(mut self, guard: usize) -> Self {
        self.guard = guard;
        self
    }

    fn check(&self) -> Result<(), HarnessError> {
        if self.cases == 0 {
            return Err(HarnessError::InvalidConfig("validation needs at least one case"));
        }
        if self.max_size == 0 {
            return Err(HarnessError::InvalidConfig("maximum copy size must be positive"));
        }
        if self.max_size > isize::MAX as usize / 2 {
            return Err(HarnessError::InvalidConfig("maximum copy size is too large"));
        }
        Ok(())
    }
}

/// One copy to check: offsets are relative to a 32-byte aligned base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyCase {
    pub src_offset: usize,
    pub dest_offset: usize,
    pub len: usize,
}

/// A byte that differs from the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Position relative to the destination start; negative or
    /// `>= len` means a guard byte was overwritten.
    pub offset: isize,
    pub expected: u8,
    pub actual: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFailure {
    pub case: CopyCase,
    /// The variant returned something other than `dest`.
    pub wrong_return: bool,
    /// First [`MAX_REPORTED_MISMATCHES`] differing bytes.
    pub mismatches: Vec<Mismatch>,
    pub total_mismatches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub variant: &'static str,
    pub cases: usize,
    pub failures: Vec<CaseFailure>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deterministic stream of cases for a configuration.
///
/// Sizes follow a power law, `(max_size + 1)^u - 1` for uniform `u`, so
/// small copies dominate while every size up to `max_size` stays reachable.
#[derive(Debug)]
pub struct CaseGenerator {
    rng: SmallRng,
    max_size: usize,
    alignment: AlignmentMode,
}

impl CaseGenerator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(config.seed),
            max_size: config.max_size,
            alignment: config.alignment,
        }
    }

    fn next_len(&mut self) -> usize {
        let u: f64 = self.rng.r#gen();
        let len = ((self.max_size as f64 + 1.0).powf(u) - 1.0).floor() as usize;
        len.min(self.max_size)
    }

    fn fill(&mut self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf);
    }
}

impl Iterator for CaseGenerator {
    type Item = CopyCase;

    fn next(&mut self) -> Option<CopyCase> {
        let len = self.next_len();
        let (src_offset, dest_offset) = match self.alignment {
            AlignmentMode::Random => (
                self.rng.gen_range(0..CHUNK_SIZE),
                self.rng.gen_range(0..CHUNK_SIZE),
            ),
            AlignmentMode::MutuallyAligned => {
                let off = self.rng.gen_range(0..CHUNK_SIZE);
                (off, off)
            }
            AlignmentMode::ChunkAligned => (0, 0),
        };
        Some(CopyCase {
            src_offset,
            dest_offset,
            len,
        })
    }
}

/// Guarded buffer with a chunk-aligned base after the leading guard.
struct Arena {
    buf: Vec<u8>,
    base: usize,
}

impl Arena {
    fn new(config: &ValidationConfig) -> Self {
        let len = config.guard + CHUNK_SIZE + CHUNK_SIZE + config.max_size + config.guard;
        let buf = vec![0u8; len];
        let base = config.guard + buf[config.guard..].as_ptr().align_offset(CHUNK_SIZE);
        Self { buf, base }
    }
}

/// Run `config.cases` randomized cases through `variant`.
pub fn validate(
    variant: &Variant,
    config: &ValidationConfig,
) -> Result<ValidationReport, HarnessError> {
    config.check()?;
    debug!(
        "validating `{}`: {} cases up to {} bytes, {:?} alignment, seed {}",
        variant.name, config.cases, config.max_size, config.alignment, config.seed
    );

    let mut cases = CaseGenerator::new(config);
    let mut src = Arena::new(config);
    let mut dest = Arena::new(config);
    cases.fill(&mut src.buf);
    let mut expected = vec![0u8; dest.buf.len()];
    let mut failures = Vec::new();

    for (index, case) in cases.by_ref().take(config.cases).enumerate() {
        let background = (index as u8).wrapping_mul(0x3B) ^ 0xA5;
        dest.buf.fill(background);
        expected.fill(background);

        let s = src.base + case.src_offset;
        let d = dest.base + case.dest_offset;
        for i in 0..case.len {
            expected[d + i] = src.buf[s + i];
        }

        // SAFETY: Arena sizing keeps `base + 31 + max_size` inside both
        // buffers, and the buffers are distinct allocations.
        let dest_ptr = unsafe { dest.buf.as_mut_ptr().add(d) };
        let ret = unsafe { (variant.func)(dest_ptr, src.buf.as_ptr().add(s), case.len as isize) };

        let wrong_return = ret != dest_ptr;
        let mut mismatches = Vec::new();
        let mut total_mismatches = 0;
        for (i, (&actual, &want)) in dest.buf.iter().zip(expected.iter()).enumerate() {
            if actual != want {
                total_mismatches += 1;
                if mismatches.len() < MAX_REPORTED_MISMATCHES {
                    mismatches.push(Mismatch {
                        offset: i as isize - d as isize,
                        expected: want,
                        actual,
                    });
                }
            }
        }

        if wrong_return || total_mismatches != 0 {
            warn!(
                "`{}` failed case {index} ({case:?}): {total_mismatches} bad bytes{}",
                variant.name,
                if wrong_return { ", wrong return value" } else { "" }
            );
            failures.push(CaseFailure {
                case,
                wrong_return,
                mismatches,
                total_mismatches,
            });
        }
    }

    info!(
        "`{}`: {} of {} cases passed",
        variant.name,
        config.cases - failures.len(),
        config.cases
    );
    Ok(ValidationReport {
        variant: variant.name,
        cases: config.cases,
        failures,
    })
}

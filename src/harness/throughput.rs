//! Sustained-throughput measurement.
//!
//! Every workload runs over a page-aligned [`WorkBuffer`] with a fixed
//! table of random offsets, so two variants measured with the same seed
//! see exactly the same sequence of copies.
#![allow(unsafe_code)]

use std::hint::black_box;
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{HarnessError, Variant};

pub const PAGE_SIZE: usize = 4096;

/// Entries in the offset table.
const OFFSET_COUNT: usize = 256;
/// Offsets are drawn from `0..OFFSET_RANGE`.
const OFFSET_RANGE: usize = 1023;
/// Distance of the chunk-aligned base from the page start.
const CHUNK_BASE: usize = 17 * 32;
const DRAM_ROW: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThroughputConfig {
    /// Minimum wall-clock time of the timed loop.
    pub duration: Duration,
    /// Minimum number of timed passes.
    pub min_iterations: usize,
    /// Nominal bytes moved per pass; sets the copies per pass.
    pub bytes_per_pass: usize,
    pub seed: u64,
}

impl Default for ThroughputConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(2),
            min_iterations: 1,
            bytes_per_pass: 256 * 1024 * 1024,
            seed: 0,
        }
    }
}

impl ThroughputConfig {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_min_iterations(mut self, min_iterations: usize) -> Self {
        self.min_iterations = min_iterations;
        self
    }

    pub fn with_bytes_per_pass(mut self, bytes_per_pass: usize) -> Self {
        self.bytes_per_pass = bytes_per_pass;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn check(&self) -> Result<(), HarnessError> {
        if self.duration.is_zero() {
            return Err(HarnessError::InvalidConfig("measurement duration must be positive"));
        }
        if self.min_iterations == 0 {
            return Err(HarnessError::InvalidConfig("at least one timed pass is required"));
        }
        if self.bytes_per_pass == 0 {
            return Err(HarnessError::InvalidConfig("bytes per pass must be positive"));
        }
        Ok(())
    }
}

/// Page-aligned scratch memory plus the random offset table.
pub struct WorkBuffer {
    buf: Vec<u8>,
    base: usize,
    len: usize,
    offsets: [usize; OFFSET_COUNT],
}

impl WorkBuffer {
    pub fn new(len: usize, seed: u64) -> Self {
        let buf: Vec<u8> = (0..len + PAGE_SIZE).map(|i| (i % 251) as u8).collect();
        let base = buf.as_ptr().align_offset(PAGE_SIZE);
        let mut rng = SmallRng::seed_from_u64(seed);
        let offsets = core::array::from_fn(|_| rng.gen_range(0..OFFSET_RANGE));
        Self {
            buf,
            base,
            len,
            offsets,
        }
    }

    /// Usable bytes after the page-aligned base.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset table entry `i`, wrapping around the table.
    pub fn offset(&self, i: usize) -> usize {
        self.offsets[i % OFFSET_COUNT]
    }

    /// Read the whole working set so every measurement starts from the
    /// same cache state.
    pub fn prime(&self) {
        let sum = self.buf[self.base..self.base + self.len]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_add(b));
        black_box(sum);
    }

    fn base_ptr(&mut self) -> *mut u8 {
        self.buf.as_mut_ptr().wrapping_add(self.base)
    }
}

/// One benchmark case: where copy `i` reads, writes, and how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// `size` bytes between independently random offsets.
    UnalignedRandom { size: usize },
    /// `size` bytes, source and destination share the random offset.
    MutuallyAlignedRandom { size: usize },
    /// `size` bytes between two chunk-aligned addresses.
    ChunkAligned { size: usize },
    /// `size` bytes between two page-aligned addresses.
    PageAligned { size: usize },
    /// `1..=max_size` bytes at random offsets within one page.
    RandomMixed { max_size: usize },
    /// As [`Workload::RandomMixed`] but spread over megabytes of memory.
    RandomMixedDram { max_size: usize },
}

/// A single copy, as offsets from the buffer base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    dest: usize,
    src: usize,
    len: usize,
}

impl Workload {
    /// The full benchmark suite, small random copies first.
    pub fn standard_suite() -> Vec<Workload> {
        use Workload::*;
        vec![
            UnalignedRandom { size: 64 },
            UnalignedRandom { size: 1024 },
            UnalignedRandom { size: 32768 },
            UnalignedRandom { size: 1 << 20 },
            MutuallyAlignedRandom { size: 1024 },
            MutuallyAlignedRandom { size: 32768 },
            MutuallyAlignedRandom { size: 1 << 20 },
            RandomMixed { max_size: 1024 },
            RandomMixed { max_size: 64 },
            RandomMixedDram { max_size: 1024 },
            RandomMixedDram { max_size: 64 },
            ChunkAligned { size: 1024 },
            ChunkAligned { size: 4096 },
            ChunkAligned { size: 32768 },
            PageAligned { size: 1024 },
            PageAligned { size: 4096 },
            PageAligned { size: 32768 },
            PageAligned { size: 256 << 10 },
            PageAligned { size: 1 << 20 },
            PageAligned { size: 8 << 20 },
        ]
    }

    pub fn name(&self) -> String {
        match *self {
            Workload::UnalignedRandom { size } => format!("{size} bytes randomly aligned"),
            Workload::MutuallyAlignedRandom { size } => {
                format!("{size} bytes randomly aligned, source aligned with dest")
            }
            Workload::ChunkAligned { size } => format!("{size} bytes aligned"),
            Workload::PageAligned { size } => format!("{size} bytes page aligned"),
            Workload::RandomMixed { max_size } => format!("up to {max_size} bytes randomly aligned"),
            Workload::RandomMixedDram { max_size } => {
                format!("up to {max_size} bytes randomly aligned (DRAM)")
            }
        }
    }

    /// Average bytes per copy, used to size a pass.
    pub fn bytes_per_iteration(&self) -> usize {
        match *self {
            Workload::UnalignedRandom { size }
            | Workload::MutuallyAlignedRandom { size }
            | Workload::ChunkAligned { size }
            | Workload::PageAligned { size } => size,
            Workload::RandomMixed { max_size } | Workload::RandomMixedDram { max_size } => {
                (max_size / 2).max(1)
            }
        }
    }

    /// Copies per pass; small copies are capped as if they moved 64 bytes.
    pub fn iterations_per_pass(&self, bytes_per_pass: usize) -> usize {
        (bytes_per_pass / self.bytes_per_iteration().max(64)).max(1)
    }

    fn random_gap(size: usize) -> usize {
        PAGE_SIZE.max(2 * size)
    }

    fn dram_span(max_size: usize) -> usize {
        DRAM_ROW * OFFSET_RANGE + 16 * 256 + OFFSET_RANGE + max_size
    }

    /// Bytes of [`WorkBuffer`] the workload touches.
    pub fn buffer_len(&self) -> usize {
        match *self {
            Workload::UnalignedRandom { size } | Workload::MutuallyAlignedRandom { size } => {
                Self::random_gap(size) + OFFSET_RANGE + size
            }
            Workload::ChunkAligned { size } => CHUNK_BASE + 2 * size,
            Workload::PageAligned { size } => size.max(PAGE_SIZE) + size,
            Workload::RandomMixed { max_size } => Self::random_gap(max_size) + OFFSET_RANGE + max_size,
            Workload::RandomMixedDram { max_size } => 2 * Self::dram_span(max_size),
        }
    }

    fn placement(&self, buf: &WorkBuffer, i: usize) -> Placement {
        match *self {
            Workload::UnalignedRandom { size } => Placement {
                dest: buf.offset(i * 2),
                src: Self::random_gap(size) + buf.offset(i * 2 + 1),
                len: size,
            },
            Workload::MutuallyAlignedRandom { size } => {
                let off = buf.offset(i);
                Placement {
                    dest: off,
                    src: Self::random_gap(size) + off,
                    len: size,
                }
            }
            Workload::ChunkAligned { size } => Placement {
                dest: CHUNK_BASE,
                src: CHUNK_BASE + size,
                len: size,
            },
            Workload::PageAligned { size } => Placement {
                dest: 0,
                src: size.max(PAGE_SIZE),
                len: size,
            },
            Workload::RandomMixed { max_size } => Placement {
                dest: buf.offset(i * 4),
                src: Self::random_gap(max_size) + buf.offset(i * 4 + 1),
                len: 1 + buf.offset(i * 4 + 2) % max_size,
            },
            Workload::RandomMixedDram { max_size } => {
                // Row picks the 8K block, the band walks 256-byte steps
                // every quarter table, the offset adds byte granularity.
                let band = ((i / (OFFSET_COUNT / 4)) & 15) * 256;
                Placement {
                    dest: DRAM_ROW * buf.offset(i * 2) + band + buf.offset(i * 4),
                    src: Self::dram_span(max_size)
                        + DRAM_ROW * buf.offset(i * 2 + 1)
                        + band
                        + buf.offset(i * 4 + 1),
                    len: 1 + buf.offset(i * 4 + 2) % max_size,
                }
            }
        }
    }

    fn check(&self) -> Result<(), HarnessError> {
        let size = match *self {
            Workload::UnalignedRandom { size }
            | Workload::MutuallyAlignedRandom { size }
            | Workload::ChunkAligned { size }
            | Workload::PageAligned { size } => size,
            Workload::RandomMixed { max_size } | Workload::RandomMixedDram { max_size } => max_size,
        };
        if size == 0 {
            return Err(HarnessError::InvalidConfig("workload copy size must be positive"));
        }
        if size > isize::MAX as usize / 4 {
            return Err(HarnessError::InvalidConfig("workload copy size is too large"));
        }
        Ok(())
    }

    /// Perform copy `i` with `variant` and return the bytes moved.
    pub fn run(&self, variant: &Variant, buf: &mut WorkBuffer, i: usize) -> Result<usize, HarnessError> {
        let needed = self.buffer_len();
        if buf.len() < needed {
            return Err(HarnessError::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }
        let p = self.placement(buf, i);
        let base = buf.base_ptr();
        // SAFETY: `buffer_len` bounds every placement, which never
        // overlaps source and destination, and the buffer holds at least
        // that many bytes past `base`.
        unsafe {
            (variant.func)(base.add(p.dest), base.add(p.src), p.len as isize);
        }
        Ok(p.len)
    }
}

/// Result of one [`measure`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Throughput {
    pub variant: &'static str,
    pub workload: String,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl Throughput {
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes as f64 / secs
    }

    /// Throughput in MB/s, where one MB is 2^20 bytes.
    pub fn megabytes_per_second(&self) -> f64 {
        self.bytes_per_second() / (1024.0 * 1024.0)
    }
}

fn run_pass(
    workload: &Workload,
    variant: &Variant,
    buf: &mut WorkBuffer,
    iterations: usize,
) -> Result<u64, HarnessError> {
    let mut bytes = 0u64;
    for i in 0..iterations {
        bytes += workload.run(variant, buf, i)? as u64;
    }
    Ok(bytes)
}

/// Measure `variant` on `workload`.
///
/// One untimed warm-up pass and a cache priming read come first; timed
/// passes then repeat until both `duration` and `min_iterations` are met.
pub fn measure(
    variant: &Variant,
    workload: &Workload,
    config: &ThroughputConfig,
) -> Result<Throughput, HarnessError> {
    config.check()?;
    workload.check()?;

    let mut buf = WorkBuffer::new(workload.buffer_len(), config.seed);
    let iterations = workload.iterations_per_pass(config.bytes_per_pass);
    debug!(
        "measuring `{}` on `{}`: {} copies per pass, {} byte buffer",
        variant.name,
        workload.name(),
        iterations,
        buf.len()
    );

    run_pass(workload, variant, &mut buf, iterations)?;
    buf.prime();

    let mut bytes = 0u64;
    let mut passes = 0usize;
    let start = Instant::now();
    let elapsed = loop {
        bytes += run_pass(workload, variant, &mut buf, iterations)?;
        passes += 1;
        let elapsed = start.elapsed();
        if passes >= config.min_iterations && elapsed >= config.duration {
            break elapsed;
        }
    };

    let result = Throughput {
        variant: variant.name,
        workload: workload.name(),
        bytes,
        elapsed,
    };
    info!(
        "{}: {}: {:.2} MB/s ({} passes)",
        result.variant,
        result.workload,
        result.megabytes_per_second(),
        passes
    );
    Ok(result)
}

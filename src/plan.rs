//! Alignment classification and transfer partitioning.
//!
//! Everything here is pure arithmetic on addresses and lengths; nothing
//! touches memory. The dispatcher in [`crate::engine`] and the blitter in
//! [`crate::blit`] turn the result into kernel calls.

use crate::chunk::CHUNK_SIZE;
use crate::word_align::word_align_size;

/// Copies of at most this many bytes skip classification and go straight
/// to the tail copier.
pub const SMALL_COPY_MAX: usize = 12;

const CHUNK_MASK: usize = CHUNK_SIZE - 1;

/// Position of the source and destination within a 32-byte chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlignmentClass {
    /// `src mod 32`.
    pub src: usize,
    /// `dest mod 32`.
    pub dest: usize,
}

impl AlignmentClass {
    pub const fn new(src_rotation: usize, dest_rotation: usize) -> Self {
        Self {
            src: src_rotation & CHUNK_MASK,
            dest: dest_rotation & CHUNK_MASK,
        }
    }

    /// Classify a pair of addresses.
    #[inline(always)]
    pub fn of(dest: *const u8, src: *const u8) -> Self {
        Self::new(src as usize, dest as usize)
    }

    /// `src mod 4`.
    #[inline(always)]
    pub const fn src_word_rotation(self) -> usize {
        self.src & 3
    }

    /// `dest mod 4`.
    #[inline(always)]
    pub const fn dest_word_rotation(self) -> usize {
        self.dest & 3
    }
}

/// Which combination of word-align, head, chunk and tail steps a copy uses.
///
/// Variants are listed in the order the classifier tests them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// `n <= 12`: one tail copy, alignment ignored.
    Small,
    /// Both pointers on a chunk boundary: burst chunks, then tail.
    ChunkAligned,
    /// Source on a chunk boundary, destination not: chunks through the
    /// kernel matching the destination's word rotation.
    SourceChunkAligned,
    /// Same offset within a chunk: word-align and head bring both pointers
    /// to a chunk boundary, then burst chunks.
    EqualRotation,
    /// Both word aligned at different chunk offsets: head, then burst
    /// chunks with word-aligned destination stores.
    BothWordAligned,
    /// Source word aligned, destination not: head, then reconstruction.
    SourceWordAligned,
    /// Same offset within a word: word-align makes both word aligned,
    /// head, then burst chunks.
    EqualWordRotation,
    /// Source unaligned, destination at an unrelated word offset:
    /// word-align, head, then reconstruction.
    General,
}

impl Strategy {
    pub const fn classify(class: AlignmentClass, n: usize) -> Self {
        if n <= SMALL_COPY_MAX {
            return Strategy::Small;
        }
        if class.src == 0 {
            if class.dest == 0 {
                return Strategy::ChunkAligned;
            }
            return Strategy::SourceChunkAligned;
        }
        if class.src == class.dest {
            return Strategy::EqualRotation;
        }
        if class.src_word_rotation() == 0 {
            if class.dest_word_rotation() == 0 {
                return Strategy::BothWordAligned;
            }
            return Strategy::SourceWordAligned;
        }
        if class.src_word_rotation() == class.dest_word_rotation() {
            return Strategy::EqualWordRotation;
        }
        Strategy::General
    }

    /// Whether the chunk step picks its kernel from the destination's word
    /// rotation instead of always using the burst kernel.
    ///
    /// With the `unaligned-dest-writes` feature only the chunk-aligned
    /// source case reconstructs; the other two leave unaligned stores to
    /// the processor.
    pub const fn reconstructs(self) -> bool {
        match self {
            Strategy::SourceChunkAligned => true,
            Strategy::SourceWordAligned | Strategy::General => {
                !cfg!(feature = "unaligned-dest-writes")
            }
            _ => false,
        }
    }
}

/// Partition of one transfer into word-align, head, chunk and tail steps.
///
/// After the word-align and head steps the source sits on a chunk
/// boundary (and so does the destination when both share a rotation).
/// Sizes always add up to the requested length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyPlan {
    pub word_align_size: usize,
    pub head_size: usize,
    pub chunk_count: usize,
    pub tail_size: usize,
}

impl CopyPlan {
    /// Plan a copy of `n` bytes from a source at `src_rotation` within its chunk.
    pub const fn new(src_rotation: usize, n: usize) -> Self {
        let src_rotation = src_rotation & CHUNK_MASK;
        let mut head_size = (CHUNK_SIZE - src_rotation) & CHUNK_MASK;
        let mut word_align_size = word_align_size(src_rotation);
        if word_align_size > n {
            word_align_size = n;
        }
        let rest = n - word_align_size;
        head_size -= word_align_size;

        if rest <= head_size {
            return Self {
                word_align_size,
                head_size: rest,
                chunk_count: 0,
                tail_size: 0,
            };
        }

        let body = rest - head_size;
        Self {
            word_align_size,
            head_size,
            chunk_count: body / CHUNK_SIZE,
            tail_size: body & CHUNK_MASK,
        }
    }

    /// Total bytes covered by the plan.
    pub const fn len(&self) -> usize {
        self.word_align_size + self.head_size + self.chunk_count * CHUNK_SIZE + self.tail_size
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_branch_order() {
        let c = AlignmentClass::new;
        assert_eq!(Strategy::classify(c(3, 7), 12), Strategy::Small);
        assert_eq!(Strategy::classify(c(0, 0), 13), Strategy::ChunkAligned);
        assert_eq!(Strategy::classify(c(0, 3), 137), Strategy::SourceChunkAligned);
        assert_eq!(Strategy::classify(c(0, 9), 96), Strategy::SourceChunkAligned);
        assert_eq!(Strategy::classify(c(5, 5), 1000), Strategy::EqualRotation);
        assert_eq!(Strategy::classify(c(8, 8), 100), Strategy::EqualRotation);
        assert_eq!(Strategy::classify(c(4, 12), 100), Strategy::BothWordAligned);
        assert_eq!(Strategy::classify(c(4, 0), 100), Strategy::BothWordAligned);
        assert_eq!(Strategy::classify(c(8, 13), 100), Strategy::SourceWordAligned);
        assert_eq!(Strategy::classify(c(5, 9), 100), Strategy::EqualWordRotation);
        assert_eq!(Strategy::classify(c(5, 6), 100), Strategy::General);
        assert_eq!(Strategy::classify(c(31, 0), 100), Strategy::General);
    }

    #[test]
    fn test_alignment_class_masks_addresses() {
        let class = AlignmentClass::new(0x1003, 0x2029);
        assert_eq!(class, AlignmentClass { src: 3, dest: 9 });
        assert_eq!(class.src_word_rotation(), 3);
        assert_eq!(class.dest_word_rotation(), 1);
    }

    #[test]
    fn test_plan_sizes_add_up() {
        for rotation in 0..CHUNK_SIZE {
            for n in 0..300 {
                let plan = CopyPlan::new(rotation, n);
                assert_eq!(plan.len(), n, "rotation={rotation} n={n} plan={plan:?}");
                assert!(plan.word_align_size <= 3);
                assert!(plan.head_size < CHUNK_SIZE);
                assert!(plan.tail_size < CHUNK_SIZE);
            }
        }
    }

    #[test]
    fn test_plan_reaches_chunk_boundary_before_chunks() {
        for rotation in 0..CHUNK_SIZE {
            for n in 13..300 {
                let plan = CopyPlan::new(rotation, n);
                if plan.chunk_count > 0 || plan.tail_size > 0 {
                    let consumed = rotation + plan.word_align_size + plan.head_size;
                    assert_eq!(consumed % CHUNK_SIZE, 0, "rotation={rotation} n={n}");
                }
                if plan.head_size > 0 && plan.word_align_size > 0 {
                    assert_eq!((rotation + plan.word_align_size) % 4, 0);
                }
            }
        }
    }

    #[test]
    fn test_plan_examples() {
        assert_eq!(
            CopyPlan::new(5, 1000),
            CopyPlan {
                word_align_size: 3,
                head_size: 24,
                chunk_count: 30,
                tail_size: 13,
            }
        );
        assert_eq!(
            CopyPlan::new(0, 96),
            CopyPlan {
                word_align_size: 0,
                head_size: 0,
                chunk_count: 3,
                tail_size: 0,
            }
        );
        assert_eq!(
            CopyPlan::new(30, 2),
            CopyPlan {
                word_align_size: 2,
                head_size: 0,
                chunk_count: 0,
                tail_size: 0,
            }
        );
        assert_eq!(
            CopyPlan::new(29, 2),
            CopyPlan {
                word_align_size: 2,
                head_size: 0,
                chunk_count: 0,
                tail_size: 0,
            }
        );
    }

    #[test]
    fn test_reconstructing_strategies() {
        assert!(Strategy::SourceChunkAligned.reconstructs());
        assert!(!Strategy::ChunkAligned.reconstructs());
        assert!(!Strategy::EqualRotation.reconstructs());
        assert!(!Strategy::BothWordAligned.reconstructs());
        assert!(!Strategy::EqualWordRotation.reconstructs());
        assert!(!Strategy::Small.reconstructs());
        let expected = !cfg!(feature = "unaligned-dest-writes");
        assert_eq!(Strategy::SourceWordAligned.reconstructs(), expected);
        assert_eq!(Strategy::General.reconstructs(), expected);
    }
}

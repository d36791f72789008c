//! Safe slice front end
//!
//! Bounds-checked wrappers over the raw engine. Slices cannot alias, so
//! the overlap rules of the raw API never come into play here.
#![allow(unsafe_code)]

use thiserror::Error;

/// Rectangle layout for [`blit_slice`], in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlitGeometry {
    pub src_stride: usize,
    pub dest_stride: usize,
    pub width: usize,
    pub height: usize,
}

impl BlitGeometry {
    pub const fn new(src_stride: usize, dest_stride: usize, width: usize, height: usize) -> Self {
        Self {
            src_stride,
            dest_stride,
            width,
            height,
        }
    }

    /// Bytes spanned from the first row start to the last row end, or
    /// `None` on overflow. Zero when the rectangle is empty.
    pub fn span(stride: usize, width: usize, height: usize) -> Option<usize> {
        if width == 0 || height == 0 {
            return Some(0);
        }
        stride.checked_mul(height - 1)?.checked_add(width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlitError {
    #[error("source rectangle spans {needed} bytes but the slice holds {available}")]
    SourceTooSmall { needed: usize, available: usize },
    #[error("destination rectangle spans {needed} bytes but the slice holds {available}")]
    DestinationTooSmall { needed: usize, available: usize },
    #[error("rectangle dimension {0} does not fit in isize")]
    DimensionOverflow(usize),
}

/// Copy bytes from `src` to `dest`.
///
/// Copies `min(dest.len(), src.len())` bytes and returns that count.
///
/// # Examples
/// ```
/// use fastarm::mem::copy_slice;
/// let mut dest = [0u8; 5];
/// assert_eq!(copy_slice(&mut dest, b"hello world"), 5);
/// assert_eq!(&dest, b"hello");
/// ```
pub fn copy_slice(dest: &mut [u8], src: &[u8]) -> usize {
    let n = dest.len().min(src.len());
    // SAFETY: Both pointers come from valid, non-aliasing slices of at
    // least `n` bytes, and slice lengths never exceed isize::MAX.
    unsafe {
        crate::engine::copy(dest.as_mut_ptr(), src.as_ptr(), n as isize);
    }
    n
}

/// Copy a rectangle between two byte slices.
///
/// Row `r` is `src[r * src_stride..][..width]`, written to
/// `dest[r * dest_stride..][..width]`.
///
/// # Examples
/// ```
/// use fastarm::mem::{blit_slice, BlitGeometry};
/// let src = *b"abcdEFGHijkl";
/// let mut dest = [b'.'; 6];
/// blit_slice(&src, &mut dest, BlitGeometry::new(4, 2, 2, 3)).unwrap();
/// assert_eq!(&dest, b"abEFij");
/// ```
pub fn blit_slice(src: &[u8], dest: &mut [u8], geometry: BlitGeometry) -> Result<(), BlitError> {
    let BlitGeometry {
        src_stride,
        dest_stride,
        width,
        height,
    } = geometry;

    for dim in [src_stride, dest_stride, width, height] {
        if isize::try_from(dim).is_err() {
            return Err(BlitError::DimensionOverflow(dim));
        }
    }

    let src_span = BlitGeometry::span(src_stride, width, height)
        .ok_or(BlitError::DimensionOverflow(src_stride))?;
    if src_span > src.len() {
        return Err(BlitError::SourceTooSmall {
            needed: src_span,
            available: src.len(),
        });
    }
    let dest_span = BlitGeometry::span(dest_stride, width, height)
        .ok_or(BlitError::DimensionOverflow(dest_stride))?;
    if dest_span > dest.len() {
        return Err(BlitError::DestinationTooSmall {
            needed: dest_span,
            available: dest.len(),
        });
    }

    // SAFETY: Every row lies inside its slice (checked above), the slices
    // cannot overlap, and all dimensions fit in isize.
    unsafe {
        crate::blit::blit(
            src.as_ptr(),
            dest.as_mut_ptr(),
            src_stride as isize,
            dest_stride as isize,
            width as isize,
            height as isize,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_slice_lengths() {
        let src: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        let mut dest = vec![0u8; 200];
        assert_eq!(copy_slice(&mut dest, &src), 200);
        assert_eq!(&dest[..], &src[..200]);

        let mut big = vec![0u8; 400];
        assert_eq!(copy_slice(&mut big, &src), 300);
        assert_eq!(&big[..300], &src[..]);
        assert!(big[300..].iter().all(|&b| b == 0));

        assert_eq!(copy_slice(&mut [], &src), 0);
    }

    #[test]
    fn test_copy_slice_unaligned_subslices() {
        let src: Vec<u8> = (0..1024u32).map(|i| (i * 13 % 256) as u8).collect();
        for s in 0..8 {
            for d in 0..8 {
                let mut dest = vec![0u8; 1024];
                let n = copy_slice(&mut dest[d..d + 700], &src[s..]);
                assert_eq!(n, 700);
                assert_eq!(&dest[d..d + 700], &src[s..s + 700]);
            }
        }
    }

    #[test]
    fn test_blit_slice_rows() {
        let src: Vec<u8> = (0..64u8).collect();
        let mut dest = [0u8; 40];
        blit_slice(&src, &mut dest, BlitGeometry::new(16, 10, 6, 4)).unwrap();
        for row in 0..4 {
            assert_eq!(&dest[row * 10..row * 10 + 6], &src[row * 16..row * 16 + 6]);
            assert!(dest[row * 10 + 6..row * 10 + 10].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_blit_slice_rejects_short_slices() {
        let src = [0u8; 50];
        let mut dest = [0u8; 50];
        assert_eq!(
            blit_slice(&src, &mut dest, BlitGeometry::new(16, 8, 8, 4)),
            Err(BlitError::SourceTooSmall {
                needed: 56,
                available: 50
            })
        );
        assert_eq!(
            blit_slice(&src, &mut dest, BlitGeometry::new(8, 16, 8, 4)),
            Err(BlitError::DestinationTooSmall {
                needed: 56,
                available: 50
            })
        );
        assert_eq!(
            blit_slice(&src, &mut dest, BlitGeometry::new(usize::MAX, 8, 8, 2)),
            Err(BlitError::DimensionOverflow(usize::MAX))
        );
    }

    #[test]
    fn test_blit_slice_empty_rectangle() {
        let mut dest = [7u8; 4];
        assert_eq!(blit_slice(&[], &mut dest, BlitGeometry::new(100, 100, 0, 9)), Ok(()));
        assert_eq!(blit_slice(&[], &mut dest, BlitGeometry::new(100, 100, 9, 0)), Ok(()));
        assert_eq!(dest, [7u8; 4]);
    }

    #[test]
    fn test_error_messages() {
        let err = BlitError::SourceTooSmall {
            needed: 10,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "source rectangle spans 10 bytes but the slice holds 4"
        );
    }
}

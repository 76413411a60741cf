//! Gaussian pyramid resampling.
//!
//! Both directions use the 5-tap binomial kernel `[1 4 6 4 1] / 16` in each
//! axis.
//!
//! - [`down`] blurs and keeps every other row and column: `(w/2, h/2)`.
//! - [`up`] inserts zero rows and columns, then blurs with the kernel scaled
//!   by four: `(2w, 2h)`.
//!
//! Downsampling reflects borders (reflect-101). Upsampling reflects the
//! leading edge and replicates the trailing one, so the last output row and
//! column hold the last input sample.

use mpyr_core::{CoreError, ImageAdapter, ResizableImage};
use tracing::trace;

use crate::{Plane, VisionError, VisionResult, reflect101};

const TAPS: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];

/// Halves a plane in both axes.
pub fn down(src: &Plane) -> Plane {
    let (sw, sh) = (src.width(), src.height());
    let (w, h) = (sw / 2, sh / 2);
    if w == 0 || h == 0 {
        return Plane::new(w, h);
    }

    let horizontal = Plane::from_rows(w, sh, |y, out| {
        let row = src.row(y);
        for (x, o) in out.iter_mut().enumerate() {
            let cx = 2 * x as isize;
            *o = TAPS
                .iter()
                .enumerate()
                .map(|(k, t)| t * row[reflect101(cx + k as isize - 2, sw)])
                .sum();
        }
    });

    Plane::from_rows(w, h, |y, out| {
        let cy = 2 * y as isize;
        let rows: [&[f32]; 5] =
            std::array::from_fn(|k| horizontal.row(reflect101(cy + k as isize - 2, sh)));
        for (x, o) in out.iter_mut().enumerate() {
            let acc: f32 = TAPS.iter().zip(&rows).map(|(t, r)| t * r[x]).sum();
            *o = acc / 256.0;
        }
    })
}

/// Leading edge reflect-101, trailing edge replicate.
#[inline]
fn up_index(i: isize, n: usize) -> usize {
    i.unsigned_abs().min(n - 1)
}

/// Doubles a plane in both axes.
pub fn up(src: &Plane) -> Plane {
    let (sw, sh) = (src.width(), src.height());
    let (w, h) = (sw * 2, sh * 2);
    if sw == 0 || sh == 0 {
        return Plane::new(w, h);
    }

    // Even outputs see taps 1 6 1, odd outputs see 4 4.
    let horizontal = Plane::from_rows(w, sh, |y, out| {
        let row = src.row(y);
        for (x, pair) in out.chunks_exact_mut(2).enumerate() {
            let prev = row[up_index(x as isize - 1, sw)];
            let next = row[up_index(x as isize + 1, sw)];
            pair[0] = prev + 6.0 * row[x] + next;
            pair[1] = 4.0 * (row[x] + next);
        }
    });

    Plane::from_rows(w, h, |y, out| {
        let sy = y / 2;
        let mid = horizontal.row(sy);
        let next = horizontal.row(up_index(sy as isize + 1, sh));
        if y % 2 == 0 {
            let prev = horizontal.row(up_index(sy as isize - 1, sh));
            for (x, o) in out.iter_mut().enumerate() {
                *o = (prev[x] + 6.0 * mid[x] + next[x]) / 64.0;
            }
        } else {
            for (x, o) in out.iter_mut().enumerate() {
                *o = 4.0 * (mid[x] + next[x]) / 64.0;
            }
        }
    })
}

/// Validates both images, sizes `dst` and writes `kernel(src)` into it.
fn resample(
    op: &'static str,
    src: &dyn ImageAdapter,
    dst: &mut dyn ResizableImage,
    size: fn(usize, usize) -> Option<(usize, usize)>,
    kernel: fn(&Plane) -> Plane,
) -> VisionResult<()> {
    let image = src.resolve()?;
    let dst_type = dst.resolve()?.element_type();
    if image.element_type() != dst_type {
        return Err(CoreError::TypeMismatch {
            src: image.element_type(),
            dst: dst_type,
        }
        .into());
    }
    let (w, h) = size(image.width(), image.height()).ok_or_else(|| {
        VisionError::invalid_parameter(format!(
            "{op}: {}x{} source overflows the destination size",
            image.width(),
            image.height()
        ))
    })?;
    trace!(op, src_w = image.width(), src_h = image.height(), w, h, "resample");

    let out = kernel(&Plane::load(image));
    dst.set_size(w, h)?;
    out.store(dst.resolve_mut()?)?;
    Ok(())
}

/// Blurs `src` and downsamples it into `dst`, which is resized to
/// `(width / 2, height / 2)`.
///
/// # Errors
///
/// - [`CoreError::InvalidImageType`] if either image is neither U16 nor F32
/// - [`CoreError::TypeMismatch`] if the element types differ
///
/// `dst` is left untouched when an error is returned.
pub fn pyr_down(src: &dyn ImageAdapter, dst: &mut dyn ResizableImage) -> VisionResult<()> {
    resample("pyr_down", src, dst, |w, h| Some((w / 2, h / 2)), down)
}

/// Upsamples `src` into `dst`, which is resized to `(2 * width, 2 * height)`.
///
/// Same errors as [`pyr_down`].
pub fn pyr_up(src: &dyn ImageAdapter, dst: &mut dyn ResizableImage) -> VisionResult<()> {
    resample(
        "pyr_up",
        src,
        dst,
        |w, h| Some((w.checked_mul(2)?, h.checked_mul(2)?)),
        up,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mpyr_core::{HostImage, HostImageType};

    fn ramp(w: usize, h: usize) -> Plane {
        let data = (0..w * h).map(|i| ((i % w) * 3 + (i / w) * 5) as f32).collect();
        Plane::from_vec(w, h, data).unwrap()
    }

    #[test]
    fn test_down_constant() {
        let out = down(&Plane::from_vec(6, 5, vec![7.5; 30]).unwrap());
        assert_eq!((out.width(), out.height()), (3, 2));
        for &v in out.data() {
            assert_relative_eq!(v, 7.5, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_up_constant() {
        let out = up(&Plane::from_vec(3, 2, vec![100.0; 6]).unwrap());
        assert_eq!((out.width(), out.height()), (6, 4));
        for &v in out.data() {
            assert_relative_eq!(v, 100.0, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_down_linear_interior() {
        // A linear ramp is reproduced exactly away from the borders.
        let out = down(&ramp(16, 16));
        let v = out.get(3, 4).unwrap();
        assert_relative_eq!(v, (6 * 3 + 8 * 5) as f32, max_relative = 1e-6);
    }

    #[test]
    fn test_up_edges() {
        let src = Plane::from_vec(3, 1, vec![0.0, 8.0, 16.0]).unwrap();
        let out = up(&src);
        let row = out.row(0);
        assert_relative_eq!(row[0], 2.0);
        assert_relative_eq!(row[1], 4.0);
        assert_relative_eq!(row[2], 8.0);
        assert_relative_eq!(row[3], 12.0);
        assert_relative_eq!(row[4], 15.0);
        assert_relative_eq!(row[5], 16.0);
    }

    #[test]
    fn test_tiny_sources() {
        assert_eq!(down(&Plane::new(1, 7)).width(), 0);
        let out = up(&Plane::from_vec(1, 1, vec![3.0]).unwrap());
        assert_eq!(out.data(), &[3.0; 4]);
    }

    #[test]
    fn test_pyr_down_resizes_destination() {
        let src = HostImage::from_u16(5, 4, vec![1000; 20]).unwrap();
        let mut dst = HostImage::u16(1, 1);
        pyr_down(&src, &mut dst).unwrap();
        assert_eq!((dst.width(), dst.height()), (2, 2));
        assert_eq!(dst.to_u16_vec().unwrap(), vec![1000; 4]);
    }

    #[test]
    fn test_type_checks() {
        let src = HostImage::f32(4, 4);
        let mut dst = HostImage::u16(3, 3);
        assert!(matches!(
            pyr_up(&src, &mut dst),
            Err(VisionError::Core(CoreError::TypeMismatch { .. }))
        ));
        assert_eq!((dst.width(), dst.height()), (3, 3));

        let bad = HostImage::unsupported(HostImageType::Rgb, 4, 4);
        assert!(matches!(
            pyr_down(&bad, &mut dst),
            Err(VisionError::Core(CoreError::InvalidImageType { .. }))
        ));
    }
}

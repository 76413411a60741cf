//! Contiguous f32 working planes.
//!
//! Every vision operation loads its strided source into a [`Plane`], computes
//! into new planes, and stores the result into the destination view with
//! rounding and saturation for U16. Row loops run on rayon when the
//! `parallel` feature is on.

use mpyr_core::{CoreError, CoreResult, ImageMut, ImageRef, ImageView, ImageViewMut, Sample};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Reflect-101 border index: `... 2 1 | 0 1 2 ... n-1 | n-2 n-3 ...`.
///
/// Any `i` maps into `[0, n)`; `n <= 1` always maps to `0`.
#[inline]
pub fn reflect101(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let i = i.rem_euclid(period);
    (if i >= n { period - i } else { i }) as usize
}

/// Runs `f(row_index, row)` over each `width`-long chunk of `data`.
pub(crate) fn for_each_row<T, F>(data: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if width == 0 {
        return;
    }
    #[cfg(feature = "parallel")]
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
    #[cfg(not(feature = "parallel"))]
    data.chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// A dense single-channel f32 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    /// Zero-filled plane.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Wraps row-major samples.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> CoreResult<Self> {
        if data.len() != width * height {
            return Err(CoreError::InvalidGeometry {
                width,
                height,
                stride: width,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a plane by filling each row with `fill(y, row)`.
    pub(crate) fn from_rows<F>(width: usize, height: usize, fill: F) -> Self
    where
        F: Fn(usize, &mut [f32]) + Send + Sync,
    {
        let mut plane = Self::new(width, height);
        for_each_row(&mut plane.data, width, fill);
        plane
    }

    /// Widens a strided view.
    pub fn from_view<T: Sample>(view: &ImageView<'_, T>) -> Self {
        let data = view
            .rows()
            .flat_map(|row| row.iter().map(|v| v.to_f32()))
            .collect();
        Self {
            width: view.width(),
            height: view.height(),
            data,
        }
    }

    /// Widens whichever element type the host image holds.
    pub fn load(image: ImageRef<'_>) -> Self {
        match image {
            ImageRef::F32(v) => Self::from_view(&v),
            ImageRef::U16(v) => Self::from_view(&v),
        }
    }

    /// Narrows into a strided view of the same size.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] if the sizes differ.
    pub fn store_view<T: Sample>(&self, dst: &mut ImageViewMut<'_, T>) -> CoreResult<()> {
        if (dst.width(), dst.height()) != (self.width, self.height) {
            return Err(CoreError::invalid_parameter(format!(
                "plane {}x{} does not fit destination {}x{}",
                self.width,
                self.height,
                dst.width(),
                dst.height()
            )));
        }
        for (out, row) in dst.rows_mut().zip(self.data.chunks_exact(self.width.max(1))) {
            for (o, &v) in out.iter_mut().zip(row) {
                *o = T::from_f32(v);
            }
        }
        Ok(())
    }

    /// Narrows into whichever element type the destination holds.
    pub fn store(&self, image: ImageMut<'_>) -> CoreResult<()> {
        match image {
            ImageMut::F32(mut v) => self.store_view(&mut v),
            ImageMut::U16(mut v) => self.store_view(&mut v),
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major samples.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Sample at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Element-wise combination of two planes of the same size.
    pub(crate) fn zip_map(&self, other: &Plane, f: impl Fn(f32, f32) -> f32) -> Plane {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        Plane {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Separable 3x3 filter `taps x taps` with reflect-101 borders.
    pub fn convolve3(&self, taps: [f32; 3]) -> Plane {
        if self.width == 0 || self.height == 0 {
            return self.clone();
        }
        let [a, b, c] = taps;
        let w = self.width;
        let horizontal = Plane::from_rows(w, self.height, |y, out| {
            let src = self.row(y);
            for (x, o) in out.iter_mut().enumerate() {
                let l = src[reflect101(x as isize - 1, w)];
                let r = src[reflect101(x as isize + 1, w)];
                *o = a * l + b * src[x] + c * r;
            }
        });
        Plane::from_rows(w, self.height, |y, out| {
            let up = horizontal.row(reflect101(y as isize - 1, self.height));
            let mid = horizontal.row(y);
            let down = horizontal.row(reflect101(y as isize + 1, self.height));
            for (x, o) in out.iter_mut().enumerate() {
                *o = a * up[x] + b * mid[x] + c * down[x];
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mpyr_core::HostImage;

    #[test]
    fn test_reflect101() {
        let mapped: Vec<usize> = (-3..7).map(|i| reflect101(i, 4)).collect();
        assert_eq!(mapped, vec![3, 2, 1, 0, 1, 2, 3, 2, 1, 0]);
        assert_eq!(reflect101(-5, 1), 0);
        assert_eq!(reflect101(9, 2), 1);
    }

    #[test]
    fn test_load_store_strided() {
        let mut host = HostImage::u16_with_padding(3, 2, 2);
        let plane = Plane::from_vec(3, 2, vec![1.0, 2.4, 2.5, 70000.0, -1.0, 6.6]).unwrap();
        plane.store(host.view_mut().unwrap()).unwrap();
        assert_eq!(host.to_u16_vec().unwrap(), vec![1, 2, 2, u16::MAX, 0, 7]);

        let back = Plane::load(host.view().unwrap());
        assert_eq!(back.data(), &[1.0, 2.0, 2.0, 65535.0, 0.0, 7.0]);
    }

    #[test]
    fn test_store_size_mismatch() {
        let mut host = HostImage::f32(2, 2);
        let plane = Plane::new(3, 2);
        assert!(plane.store(host.view_mut().unwrap()).is_err());
    }

    #[test]
    fn test_convolve3_preserves_constant() {
        let plane = Plane::from_vec(4, 3, vec![5.0; 12]).unwrap();
        let out = plane.convolve3([0.25, 0.5, 0.25]);
        for &v in out.data() {
            assert_relative_eq!(v, 5.0, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_convolve3_impulse() {
        let mut data = vec![0.0; 25];
        data[12] = 16.0;
        let out = Plane::from_vec(5, 5, data).unwrap().convolve3([0.25, 0.5, 0.25]);
        assert_relative_eq!(out.get(2, 2).unwrap(), 4.0);
        assert_relative_eq!(out.get(1, 2).unwrap(), 2.0);
        assert_relative_eq!(out.get(1, 1).unwrap(), 1.0);
        assert_eq!(out.get(0, 0).unwrap(), 0.0);
    }
}

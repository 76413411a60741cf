//! Contrast-limited adaptive histogram equalization for U16 images.
//!
//! # Algorithm
//!
//! 1. The image is split into a `tile_width x tile_height` grid of tiles. When
//!    the grid does not divide the image evenly, the image is extended to the
//!    right and bottom with reflect-101 borders so that it does; the extension
//!    only feeds the histograms.
//! 2. Each tile gets a 65536-bin histogram. Bins above the clip limit are
//!    clipped, the excess is spread evenly over all bins, and the remainder
//!    is added one count at a time at a fixed step from bin 0.
//! 3. The cumulative histogram scaled to `[0, 65535]` is the tile's lookup
//!    table.
//! 4. Every output pixel blends the lookup tables of the four nearest tile
//!    centres bilinearly.

use mpyr_core::{CoreError, ElementType, ImageAdapter, ImageView, ResizableImage, Sample};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{VisionError, VisionResult, for_each_row, reflect101};

/// Histogram bins for 16-bit samples.
const BINS: usize = 1 << 16;

/// Clip limit used when zero is passed.
pub const DEFAULT_CLIP_LIMIT: f64 = 40.0;

/// Tile grid columns and rows used when zero is passed.
pub const DEFAULT_TILES: u32 = 8;

/// Upper bound on `tile_width * tile_height`; each tile holds a 128 KiB table.
pub const MAX_TILES: usize = 1024;

/// CLAHE parameters.
///
/// Zero fields select the defaults. [`clahe`] writes the values it actually
/// used back into the caller's copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheParams {
    /// Contrast limit relative to a uniform histogram. Negative disables
    /// clipping.
    pub clip_limit: f64,
    /// Number of tile columns.
    pub tile_width: u32,
    /// Number of tile rows.
    pub tile_height: u32,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            clip_limit: DEFAULT_CLIP_LIMIT,
            tile_width: DEFAULT_TILES,
            tile_height: DEFAULT_TILES,
        }
    }
}

impl ClaheParams {
    /// Creates parameters; zeros are resolved later.
    pub fn new(clip_limit: f64, tile_width: u32, tile_height: u32) -> Self {
        Self {
            clip_limit,
            tile_width,
            tile_height,
        }
    }

    /// Replaces zero fields with their defaults.
    pub fn resolved(self) -> Self {
        Self {
            clip_limit: if self.clip_limit == 0.0 {
                DEFAULT_CLIP_LIMIT
            } else {
                self.clip_limit
            },
            tile_width: if self.tile_width == 0 {
                DEFAULT_TILES
            } else {
                self.tile_width
            },
            tile_height: if self.tile_height == 0 {
                DEFAULT_TILES
            } else {
                self.tile_height
            },
        }
    }

    /// Checks resolved parameters.
    ///
    /// # Errors
    ///
    /// [`VisionError::InvalidParameter`] for a non-finite clip limit, a zero
    /// tile count, or more than [`MAX_TILES`] tiles.
    pub fn validate(&self) -> VisionResult<()> {
        if !self.clip_limit.is_finite() {
            return Err(VisionError::invalid_parameter(format!(
                "clip limit {} is not finite",
                self.clip_limit
            )));
        }
        let tiles = self.tile_width as usize * self.tile_height as usize;
        if tiles == 0 || tiles > MAX_TILES {
            return Err(VisionError::invalid_parameter(format!(
                "tile grid {}x{} outside 1..={MAX_TILES} tiles",
                self.tile_width, self.tile_height
            )));
        }
        Ok(())
    }
}

/// Clips `hist` at `limit` and redistributes the excess.
fn clip_histogram(hist: &mut [u32], limit: u32) {
    let mut clipped = 0usize;
    for h in hist.iter_mut() {
        if *h > limit {
            clipped += (*h - limit) as usize;
            *h = limit;
        }
    }

    let batch = (clipped / BINS) as u32;
    let mut residual = clipped % BINS;
    for h in hist.iter_mut() {
        *h += batch;
    }
    if residual != 0 {
        let step = (BINS / residual).max(1);
        for h in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *h += 1;
            residual -= 1;
        }
    }
}

/// Interpolation position of `i` along one axis: the two tile indices and
/// the weight of the second.
#[inline]
fn tile_position(i: usize, inv_tile: f32, tiles: usize) -> (usize, usize, f32) {
    let f = i as f32 * inv_tile - 0.5;
    let lo = f.floor();
    let weight = f - lo;
    let lo = lo as isize;
    let first = lo.max(0) as usize;
    let second = ((lo + 1).max(0) as usize).min(tiles - 1);
    (first, second, weight)
}

/// Equalizes `src`, returning row-major output without padding.
///
/// `params` must be resolved and valid.
pub fn equalize(src: &ImageView<'_, u16>, params: &ClaheParams) -> Vec<u16> {
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let (tiles_x, tiles_y) = (params.tile_width as usize, params.tile_height as usize);

    // Histogram source, extended when the grid does not divide the image.
    let (ext_w, ext_h) = if w % tiles_x == 0 && h % tiles_y == 0 {
        (w, h)
    } else {
        (w + tiles_x - w % tiles_x, h + tiles_y - h % tiles_y)
    };
    let ext: Vec<u16> = (0..ext_h)
        .flat_map(|y| {
            let row = src.row(reflect101(y as isize, h));
            (0..ext_w).map(move |x| row[reflect101(x as isize, w)])
        })
        .collect();

    let (tile_w, tile_h) = (ext_w / tiles_x, ext_h / tiles_y);
    let area = tile_w * tile_h;
    let clip = if params.clip_limit > 0.0 {
        Some(((params.clip_limit * area as f64 / BINS as f64) as u32).max(1))
    } else {
        None
    };
    let lut_scale = (BINS - 1) as f32 / area as f32;
    debug!(w, h, tiles_x, tiles_y, tile_w, tile_h, ?clip, "clahe");

    let mut luts = vec![0u16; tiles_x * tiles_y * BINS];
    for_each_row(&mut luts, BINS, |tile, lut| {
        let (tx, ty) = (tile % tiles_x, tile / tiles_x);
        let mut hist = vec![0u32; BINS];
        for y in ty * tile_h..(ty + 1) * tile_h {
            let row = &ext[y * ext_w + tx * tile_w..y * ext_w + (tx + 1) * tile_w];
            for &v in row {
                hist[v as usize] += 1;
            }
        }
        if let Some(limit) = clip {
            clip_histogram(&mut hist, limit);
        }
        let mut sum = 0u64;
        for (l, &count) in lut.iter_mut().zip(&hist) {
            sum += u64::from(count);
            *l = u16::from_f32(sum as f32 * lut_scale);
        }
    });
    trace!(tiles = tiles_x * tiles_y, "clahe lookup tables built");

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;
    let columns: Vec<(usize, usize, f32)> =
        (0..w).map(|x| tile_position(x, inv_tw, tiles_x)).collect();
    let lut = |ty: usize, tx: usize| {
        let start = (ty * tiles_x + tx) * BINS;
        &luts[start..start + BINS]
    };

    let mut out = vec![0u16; w * h];
    for_each_row(&mut out, w, |y, row| {
        let (ty1, ty2, ya) = tile_position(y, inv_th, tiles_y);
        let input = src.row(y);
        for ((o, &v), &(tx1, tx2, xa)) in row.iter_mut().zip(input).zip(&columns) {
            let v = v as usize;
            let top = f32::from(lut(ty1, tx1)[v]) * (1.0 - xa) + f32::from(lut(ty1, tx2)[v]) * xa;
            let bottom =
                f32::from(lut(ty2, tx1)[v]) * (1.0 - xa) + f32::from(lut(ty2, tx2)[v]) * xa;
            *o = u16::from_f32(top * (1.0 - ya) + bottom * ya);
        }
    });
    out
}

/// Equalizes U16 `src` into `dst`, which is resized to the source size.
///
/// Zero fields of `params` are replaced by their defaults and the effective
/// values are written back before any pixel is processed.
///
/// # Errors
///
/// - [`CoreError::InvalidImageType`] if either image is not U16
/// - [`VisionError::InvalidParameter`] for parameters rejected by
///   [`ClaheParams::validate`]
///
/// `dst` is left untouched when an error is returned.
pub fn clahe(
    src: &dyn ImageAdapter,
    dst: &mut dyn ResizableImage,
    params: &mut ClaheParams,
) -> VisionResult<()> {
    let view = src.resolve()?.into_u16("clahe")?;
    let dst_type = dst.resolve()?.element_type();
    if dst_type != ElementType::U16 {
        return Err(CoreError::invalid_type("clahe", dst_type).into());
    }

    *params = params.resolved();
    params.validate()?;

    let out = equalize(&view, params);
    dst.set_size(view.width(), view.height())?;
    let mut dst = dst.resolve_mut()?.into_u16("clahe")?;
    for (row, chunk) in dst.rows_mut().zip(out.chunks_exact(view.width().max(1))) {
        row.copy_from_slice(chunk);
    }
    Ok(())
}

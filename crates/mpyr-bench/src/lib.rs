//! Benchmark support for mpyr. The benchmarks live in `benches/`.

use mpyr_core::HostImage;

/// Float ramp image with values in `[-half, half)` where `half = width * height / 2`.
pub fn ramp_f32(width: usize, height: usize) -> HostImage {
    let n = width * height;
    let data = (0..n).map(|i| i as f32 - (n / 2) as f32).collect();
    HostImage::from_f32(width, height, data).unwrap_or_else(|_| HostImage::f32(width, height))
}

/// U16 image with a diagonal gradient plus texture.
pub fn textured_u16(width: usize, height: usize) -> HostImage {
    let data = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            ((x * 97 + y * 131) % 4096 + (x ^ y) % 64) as u16 * 8
        })
        .collect();
    HostImage::from_u16(width, height, data).unwrap_or_else(|_| HostImage::u16(width, height))
}

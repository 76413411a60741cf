//! CLI command implementations

pub mod accuracy;
pub mod bench;
pub mod gain;
pub mod info;

use anyhow::{Context, Result, ensure};
use mpyr_core::{HostImage, HostPixels};
use mpyr_gain::TransformParameters;
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;

use crate::TransformArgs;

impl TransformArgs {
    /// Parameters for the kernel.
    pub fn parameters(&self) -> TransformParameters {
        TransformParameters::new(self.divider, self.power, self.multiplier)
    }
}

/// Prints `report` as pretty JSON or through its `Display` impl.
pub fn print_report<T: Serialize + Display>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

/// Loads `height` rows of `stride` little-endian f32 samples.
pub fn read_raw_f32(path: &Path, width: usize, height: usize, stride: usize) -> Result<HostImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to load: {}", path.display()))?;
    let expected = stride * height * 4;
    ensure!(
        bytes.len() == expected,
        "{}: expected {expected} bytes for {width}x{height} stride {stride}, found {}",
        path.display(),
        bytes.len()
    );
    let data = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    HostImage::from_f32_strided(width, height, stride, data)
        .with_context(|| format!("Invalid geometry for {}", path.display()))
}

/// Stores every row of a float image, padding included, as little-endian f32.
pub fn write_raw_f32(path: &Path, image: &HostImage) -> Result<()> {
    let HostPixels::F32(data) = image.pixels() else {
        anyhow::bail!("{} is not a float image", image.image_type());
    };
    let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, bytes).with_context(|| format!("Failed to save: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip_keeps_padding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.raw");
        let img = HostImage::from_f32_strided(2, 2, 3, vec![1.0, -2.0, 7.0, 3.5, 4.0, 7.0]).unwrap();
        write_raw_f32(&path, &img).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 24);

        let back = read_raw_f32(&path, 2, 2, 3).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_raw_size_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.raw");
        std::fs::write(&path, [0u8; 10]).unwrap();
        let err = read_raw_f32(&path, 2, 2, 2).unwrap_err();
        assert!(err.to_string().contains("expected 16 bytes"));
        assert!(read_raw_f32(&dir.path().join("missing.raw"), 1, 1, 1).is_err());
    }
}

//! Integration tests for host images, views and row splitting.

use approx::assert_relative_eq;
use mpyr_core::prelude::*;
use mpyr_core::{CODE_INVALID_IMAGE_TYPE, HostPixels};

#[test]
fn test_bands_write_through_to_host_buffer() {
    let mut img = HostImage::f32_with_padding(5, 9, 3);
    {
        let view = img.resolve_mut().unwrap().into_f32("test").unwrap();
        let ranges = partition_rows(view.height(), 4).unwrap();
        for (i, mut band) in view.split_rows(&ranges).unwrap().into_iter().enumerate() {
            band.view.fill(i as f32);
        }
    }

    let samples = img.to_f32_vec().unwrap();
    let ranges = partition_rows(9, 4).unwrap();
    for (y, row) in samples.chunks(5).enumerate() {
        let band = ranges.iter().position(|r| r.contains(y)).unwrap();
        assert!(row.iter().all(|&v| v == band as f32), "row {y}: {row:?}");
    }

    // padding untouched
    if let HostPixels::F32(raw) = img.pixels() {
        for y in 0..9 {
            assert_eq!(&raw[y * 8 + 5..y * 8 + 8], &[0.0, 0.0, 0.0]);
        }
    }
}

#[test]
fn test_rejection_reported_through_cluster() {
    let mut img = HostImage::unsupported(HostImageType::Complex, 2, 2);
    let mut cluster = ErrorCluster::new();
    let out = cluster.run("apply_gain_transform", || {
        resolve_handle(Some(&mut img))?.into_f32("apply_gain_transform")
    });
    assert!(out.is_none());
    assert_eq!(cluster.code, CODE_INVALID_IMAGE_TYPE);
    assert!(cluster.source.contains("Complex"));
}

#[test]
fn test_sample_conversions() {
    let mut img = HostImage::from_u16(3, 1, vec![0, 1000, 65535]).unwrap();
    let view = img.resolve_mut().unwrap().into_u16("test").unwrap();
    let widened: Vec<f32> = view.as_view().row(0).iter().map(|s| s.to_f32()).collect();
    assert_relative_eq!(widened[1], 1000.0);
    assert_relative_eq!(widened[2], 65535.0);
    assert_eq!(u16::from_f32(widened[1] + 0.4), 1000);
}

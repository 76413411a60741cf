//! Behavioural tests for the gain transform entry points.

use approx::assert_abs_diff_eq;
use mpyr_core::{CoreError, HostImage, HostImageType, ScanlineRange};
use mpyr_gain::{
    GainError, GainKernel, GainSession, MagnitudeMode, TransformParameters, ZeroCheckPolicy,
    apply_gain_transform, apply_gain_transform_parallel, apply_gain_transform_rows,
};

/// Deterministic mix of negative, zero, tiny and large samples.
fn mixed(len: usize) -> Vec<f32> {
    let mut state = 0x2545_F491u32;
    (0..len)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            match i % 11 {
                0 => 0.0,
                1 => -0.0,
                2 => 1e-30,
                _ => (state as f32 / u32::MAX as f32 - 0.5) * 2000.0,
            }
        })
        .collect()
}

fn bits(v: &[f32]) -> Vec<u32> {
    v.iter().map(|x| x.to_bits()).collect()
}

#[test]
fn test_uniform_buffer_maps_to_one() {
    let mut img = HostImage::from_f32(4, 4, vec![2.0; 16]).unwrap();
    apply_gain_transform(&mut img, &GainKernel::from_parts(2.0, 2.0, 1.0)).unwrap();
    for v in img.to_f32_vec().unwrap() {
        assert_abs_diff_eq!(v, 1.0, epsilon = 0.06);
    }
}

#[test]
fn test_signed_row() {
    let mut img = HostImage::from_f32(3, 1, vec![-4.0, 0.0, 4.0]).unwrap();
    apply_gain_transform(&mut img, &GainKernel::from_parts(2.0, 2.0, 1.0)).unwrap();
    let out = img.to_f32_vec().unwrap();
    assert_abs_diff_eq!(out[0], -1.0, epsilon = 0.06);
    assert_eq!(out[1], 0.0);
    assert_abs_diff_eq!(out[2], 1.0, epsilon = 0.06);
}

#[test]
fn test_sign_preserved() {
    let input = mixed(4096);
    let mut img = HostImage::from_f32(64, 64, input.clone()).unwrap();
    apply_gain_transform(&mut img, &GainKernel::from_parts(3.5, 0.8, 2.0)).unwrap();
    for (i, (&before, after)) in input.iter().zip(img.to_f32_vec().unwrap()).enumerate() {
        if before == 0.0 {
            assert_eq!(after, 0.0, "sample {i}");
        } else {
            assert_eq!(before < 0.0, after < 0.0, "sample {i}: {before} -> {after}");
        }
    }
}

#[test]
fn test_identity_is_idempotent() {
    let input: Vec<f32> = (1..=1000).map(|i| i as f32 * 0.731).collect();
    let mut img = HostImage::from_f32(100, 10, input.clone()).unwrap();
    let kernel = GainKernel::new(TransformParameters::IDENTITY);

    apply_gain_transform(&mut img, &kernel).unwrap();
    let once = img.to_f32_vec().unwrap();
    for (a, b) in input.iter().zip(&once) {
        assert!(((a - b) / a).abs() < 1e-6, "{a} -> {b}");
    }

    apply_gain_transform(&mut img, &kernel).unwrap();
    assert_eq!(bits(&once), bits(&img.to_f32_vec().unwrap()));
}

#[test]
fn test_parallel_matches_sequential() {
    let kernel = GainKernel::from_parts(7.0, 2.2, 0.9);
    for &(w, h, pad) in &[(64, 7, 0), (33, 48, 5), (1, 1, 0), (17, 0, 3)] {
        let mut seq = HostImage::f32_with_padding(w, h, pad);
        let mut shared = seq.clone();
        let mut prepared = seq.clone();
        let input = mixed(w * h);
        for img in [&mut seq, &mut shared, &mut prepared] {
            let mut view = img.view_mut().unwrap().into_f32("fill").unwrap();
            for (y, row) in view.rows_mut().enumerate() {
                row.copy_from_slice(&input[y * w..(y + 1) * w]);
            }
        }

        apply_gain_transform(&mut seq, &kernel).unwrap();
        apply_gain_transform_parallel(&mut shared, &kernel).unwrap();

        let mut session = GainSession::default();
        session.prepare_pool(2).unwrap();
        session
            .apply_gain_transform_parallel(&mut prepared, &kernel)
            .unwrap();

        let expected = bits(&seq.to_f32_vec().unwrap());
        assert_eq!(expected, bits(&shared.to_f32_vec().unwrap()), "{w}x{h}");
        assert_eq!(expected, bits(&prepared.to_f32_vec().unwrap()), "{w}x{h}");
    }
}

#[test]
fn test_rows_only_touch_range() {
    let mut img = HostImage::from_f32(2, 4, vec![4.0; 8]).unwrap();
    let kernel = GainKernel::from_parts(1.0, 1.0, 0.5);
    apply_gain_transform_rows(&mut img, ScanlineRange::new(1, 3), &kernel).unwrap();
    assert_eq!(
        img.to_f32_vec().unwrap(),
        vec![4.0, 4.0, 2.0, 2.0, 2.0, 2.0, 4.0, 4.0]
    );

    let err = apply_gain_transform_rows(&mut img, ScanlineRange::new(2, 5), &kernel).unwrap_err();
    assert!(matches!(err, GainError::Core(CoreError::InvalidRange { .. })));
}

#[test]
fn test_invalid_type_not_modified() {
    let mut img = HostImage::from_u16(2, 2, vec![1, 2, 3, 4]).unwrap();
    let kernel = GainKernel::from_parts(2.0, 2.0, 1.0);
    for result in [
        apply_gain_transform(&mut img, &kernel),
        apply_gain_transform_parallel(&mut img, &kernel),
    ] {
        assert!(matches!(
            result,
            Err(GainError::Core(CoreError::InvalidImageType {
                found: HostImageType::U16,
                ..
            }))
        ));
    }
    assert_eq!(img.to_u16_vec().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_float_policies_diverge_only_on_underflow() {
    let params = TransformParameters::new(1e300, 2.0, 1.0);
    let mut raw = HostImage::from_f32(2, 1, vec![1e-30, 0.0]).unwrap();
    let mut mag = raw.clone();

    apply_gain_transform(
        &mut raw,
        &GainKernel::new(params).with_policy(ZeroCheckPolicy::CheckRawValue),
    )
    .unwrap();
    apply_gain_transform(&mut mag, &GainKernel::new(params)).unwrap();

    let raw = raw.to_f32_vec().unwrap();
    let mag = mag.to_f32_vec().unwrap();
    assert_ne!(raw[0], 0.0);
    assert_eq!(mag[0], 0.0);
    assert_eq!(raw[1], 0.0);
    assert_eq!(mag[1], 0.0);
}

#[test]
fn test_truncated_magnitude_policies_diverge_below_one() {
    let params = TransformParameters::new(1.0, 2.0, 1.0);
    let derived = GainKernel::new(params).with_magnitude(MagnitudeMode::TruncatedInteger);
    let raw_check = derived.with_policy(ZeroCheckPolicy::CheckRawValue);
    let input = vec![0.5, -0.25, 0.0, 3.0];

    let mut derived_img = HostImage::from_f32(4, 1, input.clone()).unwrap();
    let mut raw_img = HostImage::from_f32(4, 1, input).unwrap();
    apply_gain_transform(&mut derived_img, &derived).unwrap();
    apply_gain_transform(&mut raw_img, &raw_check).unwrap();

    let zero_base = mpyr_gain::fast_pow(0.0, 2.0) as f32;
    let derived_out = derived_img.to_f32_vec().unwrap();
    let raw_out = raw_img.to_f32_vec().unwrap();
    assert_eq!(&derived_out[..3], &[0.0, 0.0, 0.0]);
    assert!(derived_out[1].is_sign_negative());
    assert_eq!(&raw_out[..3], &[zero_base, -zero_base, 0.0]);
    assert_eq!(derived_out[3].to_bits(), raw_out[3].to_bits());
}

#[test]
fn test_truncated_magnitude_parallel_matches_sequential() {
    let kernel = GainKernel::from_parts(7.0, 1.0 / 2.2, 100.0)
        .with_policy(ZeroCheckPolicy::CheckRawValue)
        .with_magnitude(MagnitudeMode::TruncatedInteger);
    let mut seq = HostImage::from_f32(31, 9, mixed(31 * 9)).unwrap();
    let mut par = seq.clone();

    apply_gain_transform(&mut seq, &kernel).unwrap();
    let mut session = GainSession::default();
    session.prepare_pool(3).unwrap();
    session.apply_gain_transform_parallel(&mut par, &kernel).unwrap();
    session.unprepare_pool();

    assert_eq!(bits(&seq.to_f32_vec().unwrap()), bits(&par.to_f32_vec().unwrap()));
}

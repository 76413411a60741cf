//! F32 to U16 row casting.
//!
//! Copies rows `[start, end)` of an F32 image into a U16 image of the same
//! size. Source and destination strides are independent.

use mpyr_core::{CoreError, ImageAdapter, ScanlineRange};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::GainResult;

/// How a float sample becomes a u16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CastMode {
    /// Numeric conversion, truncating toward zero and saturating to
    /// `[0, 65535]`; NaN becomes 0.
    #[default]
    Value,
    /// Low 16 bits of the IEEE-754 bit pattern.
    LowBits,
}

impl CastMode {
    /// Converts one sample.
    #[inline]
    pub fn convert(self, v: f32) -> u16 {
        match self {
            Self::Value => v as u16,
            Self::LowBits => v.to_bits() as u16,
        }
    }
}

/// Casts rows `range` of `src` into `dst`.
///
/// # Errors
///
/// - [`CoreError::InvalidImageType`] unless `src` is F32 and `dst` is U16
/// - [`CoreError::InvalidParameter`] if the two images differ in size
/// - [`CoreError::InvalidRange`] if `range` leaves `[0, height]`
///
/// Nothing is written when an error is returned.
pub fn cast_to_u16<S, D>(src: &S, dst: &mut D, range: ScanlineRange, mode: CastMode) -> GainResult<()>
where
    S: ImageAdapter + ?Sized,
    D: ImageAdapter + ?Sized,
{
    let src = src.resolve()?.into_f32("cast_to_u16")?;
    let mut dst = dst.resolve_mut()?.into_u16("cast_to_u16")?;
    if (src.width(), src.height()) != (dst.width(), dst.height()) {
        return Err(CoreError::invalid_parameter(format!(
            "size mismatch: source {}x{}, destination {}x{}",
            src.width(),
            src.height(),
            dst.width(),
            dst.height()
        ))
        .into());
    }
    range.validate(src.height())?;
    trace!(start = range.start, end = range.end, ?mode, "cast rows");

    for (y, out) in range.rows().zip(dst.rows_in_mut(range)?) {
        for (o, &v) in out.iter_mut().zip(src.row(y)) {
            *o = mode.convert(v);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpyr_core::HostImage;

    #[test]
    fn test_value_mode() {
        assert_eq!(CastMode::Value.convert(12.9), 12);
        assert_eq!(CastMode::Value.convert(-5.0), 0);
        assert_eq!(CastMode::Value.convert(1e9), u16::MAX);
        assert_eq!(CastMode::Value.convert(f32::NAN), 0);
    }

    #[test]
    fn test_low_bits_mode() {
        // 1.0f32 = 0x3F80_0000
        assert_eq!(CastMode::LowBits.convert(1.0), 0);
        assert_eq!(CastMode::LowBits.convert(f32::from_bits(0x4000_1234)), 0x1234);
    }

    #[test]
    fn test_rows_and_strides() {
        let src = HostImage::from_f32(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut dst = HostImage::u16_with_padding(2, 3, 2);
        cast_to_u16(&src, &mut dst, ScanlineRange::new(1, 3), CastMode::Value).unwrap();
        assert_eq!(dst.to_u16_vec().unwrap(), vec![0, 0, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rejections_leave_destination() {
        let src = HostImage::from_f32(2, 2, vec![9.0; 4]).unwrap();

        let mut wrong_type = HostImage::f32(2, 2);
        assert!(cast_to_u16(&src, &mut wrong_type, ScanlineRange::full(2), CastMode::Value).is_err());

        let mut wrong_size = HostImage::u16(3, 2);
        assert!(cast_to_u16(&src, &mut wrong_size, ScanlineRange::full(2), CastMode::Value).is_err());
        assert!(wrong_size.to_u16_vec().unwrap().iter().all(|&v| v == 0));

        let mut dst = HostImage::u16(2, 2);
        assert!(cast_to_u16(&src, &mut dst, ScanlineRange::new(0, 3), CastMode::Value).is_err());
        assert!(dst.to_u16_vec().unwrap().iter().all(|&v| v == 0));
    }
}

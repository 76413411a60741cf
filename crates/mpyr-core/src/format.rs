//! Element type descriptors.
//!
//! The host can hand over images of many pixel types; mpyr only processes
//! single-channel 32-bit float ([`ElementType::F32`]) and 16-bit unsigned
//! ([`ElementType::U16`]) buffers. [`HostImageType`] describes whatever the host
//! reported so that rejections carry the offending type, and [`Sample`] ties a
//! Rust scalar to its [`ElementType`].
//!
//! # Host type codes
//!
//! | Code | Type |
//! |------|------|
//! | 0 | U8 |
//! | 1 | I16 |
//! | 2 | SGL (f32) |
//! | 3 | Complex |
//! | 4 | RGB |
//! | 5 | HSL |
//! | 6 | RGB U64 |
//! | 7 | U16 |

use std::fmt;

/// Supported element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    /// Single-precision float (host "SGL").
    F32,
    /// 16-bit unsigned integer.
    U16,
}

impl ElementType {
    /// Size of one sample in bytes.
    #[inline]
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::U16 => 2,
        }
    }

    /// Short name used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "F32",
            Self::U16 => "U16",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel type as reported by the host image descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostImageType {
    /// 8-bit unsigned.
    U8,
    /// 16-bit signed.
    I16,
    /// Single-precision float.
    Sgl,
    /// Complex float pairs.
    Complex,
    /// 32-bit packed RGB.
    Rgb,
    /// 32-bit packed HSL.
    Hsl,
    /// 64-bit packed RGB.
    RgbU64,
    /// 16-bit unsigned.
    U16,
    /// Unrecognized code.
    Unknown(i32),
}

impl HostImageType {
    /// Decodes a host type code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::U8,
            1 => Self::I16,
            2 => Self::Sgl,
            3 => Self::Complex,
            4 => Self::Rgb,
            5 => Self::Hsl,
            6 => Self::RgbU64,
            7 => Self::U16,
            other => Self::Unknown(other),
        }
    }

    /// Host type code.
    pub fn code(self) -> i32 {
        match self {
            Self::U8 => 0,
            Self::I16 => 1,
            Self::Sgl => 2,
            Self::Complex => 3,
            Self::Rgb => 4,
            Self::Hsl => 5,
            Self::RgbU64 => 6,
            Self::U16 => 7,
            Self::Unknown(code) => code,
        }
    }

    /// The supported element type this host type maps to, if any.
    pub fn element_type(self) -> Option<ElementType> {
        match self {
            Self::Sgl => Some(ElementType::F32),
            Self::U16 => Some(ElementType::U16),
            _ => None,
        }
    }
}

impl From<ElementType> for HostImageType {
    fn from(ty: ElementType) -> Self {
        match ty {
            ElementType::F32 => Self::Sgl,
            ElementType::U16 => Self::U16,
        }
    }
}

impl fmt::Display for HostImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => f.write_str("U8"),
            Self::I16 => f.write_str("I16"),
            Self::Sgl => f.write_str("F32"),
            Self::Complex => f.write_str("Complex"),
            Self::Rgb => f.write_str("RGB"),
            Self::Hsl => f.write_str("HSL"),
            Self::RgbU64 => f.write_str("RGB U64"),
            Self::U16 => f.write_str("U16"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

/// Scalar sample stored in a supported image buffer.
pub trait Sample: Copy + Default + PartialEq + Send + Sync + fmt::Debug + 'static {
    /// Element type tag for this scalar.
    const ELEMENT: ElementType;

    /// Widens the sample to `f32`.
    fn to_f32(self) -> f32;

    /// Narrows an `f32` into this sample type, rounding half to even and
    /// saturating.
    fn from_f32(v: f32) -> Self;
}

impl Sample for f32 {
    const ELEMENT: ElementType = ElementType::F32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}

impl Sample for u16 {
    const ELEMENT: ElementType = ElementType::U16;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        // `as` saturates and maps NaN to 0
        v.round_ties_even() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_code_roundtrip() {
        for code in 0..8 {
            assert_eq!(HostImageType::from_code(code).code(), code);
        }
        assert_eq!(HostImageType::from_code(42), HostImageType::Unknown(42));
    }

    #[test]
    fn test_element_mapping() {
        assert_eq!(HostImageType::Sgl.element_type(), Some(ElementType::F32));
        assert_eq!(HostImageType::U16.element_type(), Some(ElementType::U16));
        assert_eq!(HostImageType::U8.element_type(), None);
        assert_eq!(HostImageType::from(ElementType::U16), HostImageType::U16);
    }

    #[test]
    fn test_u16_from_f32_saturates() {
        assert_eq!(u16::from_f32(-3.0), 0);
        assert_eq!(u16::from_f32(70000.0), u16::MAX);
        assert_eq!(u16::from_f32(f32::NAN), 0);
        assert_eq!(u16::from_f32(1.5), 2);
        assert_eq!(u16::from_f32(2.5), 2);
    }
}

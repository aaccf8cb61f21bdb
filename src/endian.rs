//! The byte order used to encode and decode a fixed-width integer.
//!
//! Unlike a format where endianness is a parser-wide configuration, every
//! [`IntSpec`](crate::intcodec::IntSpec) in a `bytespec` grammar carries its
//! own [`Endian`], since a single record can freely mix big- and
//! little-endian fields (this is common in, e.g., network protocols that
//! put a big-endian length in front of a little-endian payload).

/// Byte order for a fixed-width integer field.
///
/// Width 1 fields ignore `Endian` entirely; it only affects how the
/// remaining bytes of a 2/3/4/8-byte field are ordered.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Endian {
    /// Least-significant byte first.
    Little,

    /// Most-significant byte first.
    Big,
}

impl Endian {
    /// Read a `u16` out of `bytes` using this byte order.
    #[inline]
    pub(crate) fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Read a `u32` out of `bytes` using this byte order.
    #[inline]
    pub(crate) fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Read a `u64` out of `bytes` using this byte order.
    #[inline]
    pub(crate) fn read_u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Self::Little => u64::from_le_bytes(bytes),
            Self::Big => u64::from_be_bytes(bytes),
        }
    }

    /// Write a `u16` to bytes using this byte order.
    #[inline]
    pub(crate) fn write_u16(self, value: u16) -> [u8; 2] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Write a `u32` to bytes using this byte order.
    #[inline]
    pub(crate) fn write_u32(self, value: u32) -> [u8; 4] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Write a `u64` to bytes using this byte order.
    #[inline]
    pub(crate) fn write_u64(self, value: u64) -> [u8; 8] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }
}

#[cfg(feature = "arbitrary")]
mod fuzzing {
    use super::*;
    use arbitrary::{Arbitrary, Result, Unstructured};

    impl<'a> Arbitrary<'a> for Endian {
        fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
            Ok(if bool::arbitrary(u)? {
                Self::Little
            } else {
                Self::Big
            })
        }
    }
}

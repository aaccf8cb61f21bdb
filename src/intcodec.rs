//! Fixed-width unsigned integer encoding and decoding.
//!
//! This is the leaf component the rest of the crate builds on: a
//! [`Width`]/[`Endian`](crate::endian::Endian) pair describes exactly how
//! many bytes a field occupies on the wire and in which order, while the
//! decoded/encoded value is always a plain `u64` in memory.

use crate::endian::Endian;

/// The width, in bytes, of a fixed-width integer field.
///
/// Only 1, 2, 3, and 4, and 8 byte widths are supported; there is no
/// generic "N-byte" integer because the spec-string grammar only has
/// tokens for these five widths (`B`, `H`, `T`, `I`, `Q`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Width {
    /// 1 byte (`B` in the spec-string grammar).
    One,
    /// 2 bytes (`H`).
    Two,
    /// 3 bytes (`T`).
    Three,
    /// 4 bytes (`I`).
    Four,
    /// 8 bytes (`Q`).
    Eight,
}

impl Width {
    /// The number of bytes this width occupies on the wire.
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

/// A `(width, endian)` pair describing how to encode or decode a fixed-width
/// unsigned integer.
///
/// Width 1 is endian-irrelevant but still carries an `Endian` value for
/// uniformity; the spec-string compiler always fills one in (defaulting to
/// [`Endian::Little`]) since the grammar doesn't require `<`/`>` before a
/// lone `B`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct IntSpec {
    pub width: Width,
    pub endian: Endian,
}

impl IntSpec {
    /// Create a new `IntSpec`.
    pub const fn new(width: Width, endian: Endian) -> Self {
        Self { width, endian }
    }

    /// Decode a value from the first [`width`](Width::bytes) bytes of
    /// `bytes`, zero-extending to 64 bits.
    ///
    /// `bytes` must contain at least `self.width.bytes()` valid bytes;
    /// anything past that is ignored.
    pub fn decode(self, bytes: &[u8]) -> u64 {
        match self.width {
            Width::One => bytes[0] as u64,
            Width::Two => {
                let arr = [bytes[0], bytes[1]];
                self.endian.read_u16(arr) as u64
            }
            Width::Three => decode_u24(self.endian, [bytes[0], bytes[1], bytes[2]]) as u64,
            Width::Four => {
                let arr = [bytes[0], bytes[1], bytes[2], bytes[3]];
                self.endian.read_u32(arr) as u64
            }
            Width::Eight => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes[..8]);
                self.endian.read_u64(arr)
            }
        }
    }

    /// Encode `value` as exactly [`width`](Width::bytes) bytes.
    ///
    /// Width 3 takes the low 24 bits of `value`; wider values are truncated
    /// by plain bitwise reinterpretation, never an overflow error.
    pub fn encode(self, value: u64) -> Vec<u8> {
        match self.width {
            Width::One => vec![value as u8],
            Width::Two => self.endian.write_u16(value as u16).to_vec(),
            Width::Three => encode_u24(self.endian, value as u32 & 0x00FF_FFFF).to_vec(),
            Width::Four => self.endian.write_u32(value as u32).to_vec(),
            Width::Eight => self.endian.write_u64(value).to_vec(),
        }
    }
}

fn decode_u24(endian: Endian, bytes: [u8; 3]) -> u32 {
    match endian {
        Endian::Little => u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16,
        Endian::Big => u32::from(bytes[2]) | u32::from(bytes[1]) << 8 | u32::from(bytes[0]) << 16,
    }
}

fn encode_u24(endian: Endian, value: u32) -> [u8; 3] {
    let le = [value as u8, (value >> 8) as u8, (value >> 16) as u8];
    match endian {
        Endian::Little => le,
        Endian::Big => [le[2], le[1], le[0]],
    }
}

#[cfg(feature = "arbitrary")]
mod fuzzing {
    use super::*;
    use arbitrary::{Arbitrary, Result, Unstructured};

    impl<'a> Arbitrary<'a> for Width {
        fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
            Ok(match u8::arbitrary(u)? % 5 {
                0 => Self::One,
                1 => Self::Two,
                2 => Self::Three,
                3 => Self::Four,
                _ => Self::Eight,
            })
        }
    }

    impl<'a> Arbitrary<'a> for IntSpec {
        fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
            Ok(Self::new(Width::arbitrary(u)?, Endian::arbitrary(u)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_one_ignores_endian() {
        let le = IntSpec::new(Width::One, Endian::Little);
        let be = IntSpec::new(Width::One, Endian::Big);

        assert_eq!(le.decode(&[0x42]), 0x42);
        assert_eq!(be.decode(&[0x42]), 0x42);
        assert_eq!(le.encode(0x42), be.encode(0x42));
    }

    #[test]
    fn round_trip_all_widths() {
        for width in [
            Width::One,
            Width::Two,
            Width::Three,
            Width::Four,
            Width::Eight,
        ] {
            for endian in [Endian::Little, Endian::Big] {
                let spec = IntSpec::new(width, endian);
                let max = match width {
                    Width::One => u8::MAX as u64,
                    Width::Two => u16::MAX as u64,
                    Width::Three => 0x00FF_FFFF,
                    Width::Four => u32::MAX as u64,
                    Width::Eight => u64::MAX,
                };

                for value in [0, 1, max / 2, max] {
                    let bytes = spec.encode(value);
                    assert_eq!(bytes.len(), width.bytes());
                    assert_eq!(spec.decode(&bytes), value);
                }
            }
        }
    }

    #[test]
    fn endian_invariant_palindrome() {
        let value = 0x00FF00FF00FF00FFu64;
        let le = IntSpec::new(Width::Eight, Endian::Little);
        let be = IntSpec::new(Width::Eight, Endian::Big);

        assert_eq!(le.decode(&le.encode(value)), value);
        assert_eq!(be.decode(&be.encode(value)), value);
    }

    #[test]
    fn width_three_takes_low_24_bits() {
        let spec = IntSpec::new(Width::Three, Endian::Big);
        let bytes = spec.encode(0xAABBCCDD);

        assert_eq!(bytes, vec![0xBB, 0xCC, 0xDD]);
        assert_eq!(spec.decode(&bytes), 0x00BBCCDD);
    }

    #[test]
    fn big_endian_tower() {
        let data: &[u8] = &[
            0x12, 0x12, 0x34, 0x12, 0x34, 0x56, 0x78, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE,
            0xF0,
        ];

        let b = IntSpec::new(Width::One, Endian::Big);
        let h = IntSpec::new(Width::Two, Endian::Big);
        let i = IntSpec::new(Width::Four, Endian::Big);
        let q = IntSpec::new(Width::Eight, Endian::Big);

        assert_eq!(b.decode(&data[0..1]), 0x12);
        assert_eq!(h.decode(&data[1..3]), 0x1234);
        assert_eq!(i.decode(&data[3..7]), 0x12345678);
        assert_eq!(q.decode(&data[7..15]), 0x123456789ABCDEF0);
    }
}

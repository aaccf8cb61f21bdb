//! The `Data` tree: the output of [`Parser`](crate::parser::Parser) and the
//! input to [`Encoder`](crate::encoder::Encoder).

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::bytequeue::ByteView;
use crate::spec::Spec;

/// A parsed value tree conforming to some `Spec`.
///
/// `Stop` is never nested inside a `Seq`: if any sub-parse reduces to
/// `Stop`, the enclosing top-level structure's result *is* that `Stop`
/// value. A `Data` tree otherwise mirrors the shape of the `Spec` it was
/// parsed against.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Data {
    /// The result of a `Skip`: carries no information.
    Empty,

    /// Parsing reduced to `Stop` while working through the enclosed `Spec`,
    /// with the selector value active at the point of failure (0 when there
    /// is none, e.g. a bare top-level `Stop`).
    Stop(Spec, u64),

    /// A decoded fixed-width integer, always a plain 64-bit value: width
    /// and endianness are purely encoding concerns, gone once the value is
    /// in memory.
    Integer(u64),

    /// A raw byte payload.
    Bytes(ByteView),

    /// An ordered sequence of children.
    Seq(Vec<Data>),
}

impl Data {
    /// Shorthand for `Data::Bytes` from any byte source.
    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self::Bytes(ByteView::from(bytes.into()))
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Stop(spec, value) => write!(f, "Stop({spec}, {value})"),
            Self::Integer(v) => write!(f, "Integer({v})"),
            Self::Bytes(view) => {
                write!(f, "Bytes({:?})", crate::util::fmt::ByteStr(&view.to_bytes()))
            }
            Self::Seq(items) => {
                f.write_str("Seq[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Self::Integer(value as u64)
    }
}

macro_rules! impl_from_unsigned {
    ($( $t:ty ),+) => {
        $(
            impl From<$t> for Data {
                fn from(value: $t) -> Self {
                    Self::Integer(value as u64)
                }
            }
        )+
    };
}

macro_rules! impl_from_signed {
    ($( $t:ty ),+) => {
        $(
            impl From<$t> for Data {
                fn from(value: $t) -> Self {
                    // Two's-complement bit reinterpretation, not a
                    // sign-extending cast: -1i8 becomes 0xFF, not u64::MAX.
                    Self::Integer(value as u64 & (u64::MAX >> (64 - <$t>::BITS)))
                }
            }
        )+
    };
}

impl_from_unsigned!(u8, u16, u32, u64);
impl_from_signed!(i8, i16, i32, i64);

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Self::bytes(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Self::bytes(Bytes::from(value.into_bytes()))
    }
}

impl From<&[u8]> for Data {
    fn from(value: &[u8]) -> Self {
        Self::bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Self::bytes(Bytes::from(value))
    }
}

impl From<Vec<Data>> for Data {
    fn from(value: Vec<Data>) -> Self {
        Self::Seq(value)
    }
}

/// The variable environment: a mapping from variable name to the decoded
/// `u64` recorded under it.
///
/// An `Environment` is scoped per top-level parse and inherited by `Until`'s
/// sub-parsers; it is cleared by [`Parser::reset`](crate::parser::Parser::reset)
/// except for whatever was seeded through
/// [`Parser::with_initial_vars`](crate::parser::Parser::with_initial_vars).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Environment {
    vars: HashMap<String, u64>,
}

impl Environment {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `name`, overwriting any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: u64) {
        self.vars.insert(name.into(), value);
    }

    /// Look up the value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.vars.get(name).copied()
    }

    /// Look up the value recorded under `name`, panicking if it was never
    /// written.
    ///
    /// Referencing a `Variable` name that was not written earlier in parse
    /// order is a programmer error, not a recoverable condition.
    pub(crate) fn require(&self, name: &str) -> u64 {
        self.get(name)
            .unwrap_or_else(|| panic!("reference to undeclared variable {name:?}"))
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_conversion_is_bitwise() {
        let data: Data = (-1i8).into();
        assert_eq!(data, Data::Integer(0xFF));

        let data: Data = (-1i32).into();
        assert_eq!(data, Data::Integer(0xFFFF_FFFF));
    }

    #[test]
    fn string_conversion_is_utf8_bytes() {
        let data: Data = "hi".into();
        assert_eq!(data, Data::bytes(Bytes::from_static(b"hi")));
    }

    #[test]
    fn environment_round_trips() {
        let mut env = Environment::new();
        env.set("len", 42);
        assert_eq!(env.get("len"), Some(42));
        assert_eq!(env.get("missing"), None);
    }
}

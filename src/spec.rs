//! The `Spec` abstract syntax tree: a declarative description of a binary
//! wire format.
//!
//! A `Spec` is built either programmatically, through the constructors on
//! this type, or by [`compile`](crate::compiler::compile)-ing a spec-string.
//! Both paths produce the same tree; [`Parser`](crate::parser::Parser) and
//! [`Encoder`](crate::encoder::Encoder) only ever see a `Spec`, never a
//! spec-string.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::intcodec::IntSpec;

/// A node in a `bytespec` grammar tree.
///
/// `Spec` is a recursive sum type; recursive arms box their children so the
/// enum itself stays a fixed size. Equality is structural: two `Spec` trees
/// built by different means (builder vs. compiler) compare equal if they
/// describe the same format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Spec {
    /// Consume `n` bytes and discard them. Encodes as `n` zero bytes.
    Skip(u64),

    /// A parse-time sentinel: the enclosing top-level structure is
    /// unparseable from here.
    Stop,

    /// A fixed-width integer field.
    Integer(IntSpec),

    /// Like [`Integer`](Self::Integer), but the decoded value (adjusted by
    /// `offset`) is also recorded in the parse environment under `name` for
    /// later siblings/descendants to read.
    Variable(IntSpec, String, i64),

    /// A raw byte payload. `None` means "all remaining bytes in the current
    /// budget"; `Some(name)` means "`vars[name]` bytes".
    Bytes(Option<String>),

    /// Ordered composition of child specs.
    Seq(Vec<Spec>),

    /// Budget-bounded repetition: read `vars[name]` bytes (or all
    /// remaining) and parse `inner` as many whole times as fit, discarding
    /// any residue.
    Until(Option<String>, Box<Spec>),

    /// Count-bounded repetition: parse `inner` exactly `vars[name]` times.
    Repeat(String, Box<Spec>),

    /// Dispatch on `vars[selector]`: pick the case matching the decoded
    /// value, or `default` if none match.
    Switch(String, BTreeMap<u64, Spec>, Box<Spec>),
}

impl Spec {
    /// `Skip(n)`.
    pub fn skip(n: u64) -> Self {
        Self::Skip(n)
    }

    /// `Stop`.
    pub fn stop() -> Self {
        Self::Stop
    }

    /// `Integer(spec)`.
    pub fn integer(spec: IntSpec) -> Self {
        Self::Integer(spec)
    }

    /// `Variable(spec, name, offset)`.
    pub fn variable(spec: IntSpec, name: impl Into<String>, offset: i64) -> Self {
        Self::Variable(spec, name.into(), offset)
    }

    /// `Bytes(Some(name))`.
    pub fn bytes(name: impl Into<String>) -> Self {
        Self::Bytes(Some(name.into()))
    }

    /// `Bytes(None)` — consumes all remaining bytes in the current budget.
    pub fn bytes_unbounded() -> Self {
        Self::Bytes(None)
    }

    /// `Seq(specs)`, applying the usual combining rule: an empty list
    /// becomes `Skip(0)`, a single-element list is unwrapped, otherwise the
    /// list is kept as-is.
    pub fn seq(specs: impl IntoIterator<Item = Spec>) -> Self {
        let mut specs: Vec<Spec> = specs.into_iter().collect();
        match specs.len() {
            0 => Self::Skip(0),
            1 => specs.pop().unwrap(),
            _ => Self::Seq(specs),
        }
    }

    /// `Until(Some(name), inner)`.
    pub fn until(name: impl Into<String>, inner: Spec) -> Self {
        Self::Until(Some(name.into()), Box::new(inner))
    }

    /// `Until(None, inner)` — bounded by the enclosing budget, or by all
    /// currently-supplied bytes at the outermost level.
    pub fn until_unbounded(inner: Spec) -> Self {
        Self::Until(None, Box::new(inner))
    }

    /// `Repeat(name, inner)`.
    pub fn repeat(name: impl Into<String>, inner: Spec) -> Self {
        Self::Repeat(name.into(), Box::new(inner))
    }

    /// `Switch(selector, cases, default)`.
    pub fn switch(
        selector: impl Into<String>,
        cases: impl IntoIterator<Item = (u64, Spec)>,
        default: Spec,
    ) -> Self {
        Self::Switch(selector.into(), cases.into_iter().collect(), Box::new(default))
    }
}

impl Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip(n) => write!(f, "Skip({n})"),
            Self::Stop => write!(f, "Stop"),
            Self::Integer(spec) => write!(f, "Integer({spec:?})"),
            Self::Variable(spec, name, offset) => {
                write!(f, "Variable({spec:?}, {name:?}, {offset})")
            }
            Self::Bytes(None) => write!(f, "Bytes(*)"),
            Self::Bytes(Some(name)) => write!(f, "Bytes({name:?})"),
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
            Self::Until(name, inner) => match name {
                Some(name) => write!(f, "Until({name:?}, {inner})"),
                None => write!(f, "Until(*, {inner})"),
            },
            Self::Repeat(name, inner) => write!(f, "Repeat({name:?}, {inner})"),
            Self::Switch(name, cases, default) => {
                write!(f, "Switch({name:?}, {{")?;
                for (i, (tag, spec)) in cases.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{tag}={spec}")?;
                }
                write!(f, ", *={default}}})")
            }
        }
    }
}

#[cfg(feature = "arbitrary")]
mod fuzzing {
    use super::*;
    use arbitrary::{Arbitrary, Result, Unstructured};

    /// Recursive arms are depth-bounded so `arbitrary` can't build an
    /// unbounded tree out of a small byte budget.
    const MAX_DEPTH: u32 = 6;

    impl<'a> Arbitrary<'a> for Spec {
        fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
            arbitrary_depth(u, 0)
        }
    }

    fn arbitrary_depth<'a>(u: &mut Unstructured<'a>, depth: u32) -> Result<Spec> {
        if depth >= MAX_DEPTH {
            return Ok(match u8::arbitrary(u)? % 3 {
                0 => Spec::Skip(u16::arbitrary(u)? as u64),
                1 => Spec::Integer(IntSpec::arbitrary(u)?),
                _ => Spec::Bytes(None),
            });
        }

        Ok(match u8::arbitrary(u)? % 9 {
            0 => Spec::Skip(u16::arbitrary(u)? as u64),
            1 => Spec::Stop,
            2 => Spec::Integer(IntSpec::arbitrary(u)?),
            3 => Spec::Variable(IntSpec::arbitrary(u)?, arbitrary_name(u)?, i8::arbitrary(u)? as i64),
            4 => Spec::Bytes(arbitrary_opt_name(u)?),
            5 => {
                let len = u.int_in_range(0..=4)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(arbitrary_depth(u, depth + 1)?);
                }
                Spec::Seq(items)
            }
            6 => Spec::Until(arbitrary_opt_name(u)?, Box::new(arbitrary_depth(u, depth + 1)?)),
            7 => Spec::Repeat(arbitrary_name(u)?, Box::new(arbitrary_depth(u, depth + 1)?)),
            _ => {
                let count = u.int_in_range(0..=3)?;
                let mut cases = BTreeMap::new();
                for _ in 0..count {
                    cases.insert(u8::arbitrary(u)? as u64, arbitrary_depth(u, depth + 1)?);
                }
                Spec::Switch(
                    arbitrary_name(u)?,
                    cases,
                    Box::new(arbitrary_depth(u, depth + 1)?),
                )
            }
        })
    }

    fn arbitrary_name<'a>(u: &mut Unstructured<'a>) -> Result<String> {
        Ok((u8::arbitrary(u)? % 8).to_string())
    }

    fn arbitrary_opt_name<'a>(u: &mut Unstructured<'a>) -> Result<Option<String>> {
        Ok(if bool::arbitrary(u)? {
            Some(arbitrary_name(u)?)
        } else {
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::Endian;
    use crate::intcodec::Width;

    #[test]
    fn seq_combining_rule() {
        assert_eq!(Spec::seq(vec![]), Spec::Skip(0));
        assert_eq!(Spec::seq(vec![Spec::Skip(1)]), Spec::Skip(1));

        let two = Spec::seq(vec![Spec::Skip(1), Spec::Skip(2)]);
        assert_eq!(two, Spec::Seq(vec![Spec::Skip(1), Spec::Skip(2)]));
    }

    #[test]
    fn structural_equality_ignores_construction_path() {
        let a = Spec::seq(vec![
            Spec::integer(IntSpec::new(Width::Four, Endian::Big)),
            Spec::bytes("len"),
        ]);
        let b = Spec::Seq(vec![
            Spec::Integer(IntSpec::new(Width::Four, Endian::Big)),
            Spec::Bytes(Some("len".to_string())),
        ]);

        assert_eq!(a, b);
    }

    #[test]
    fn display_matches_shape() {
        let spec = Spec::switch(
            "tag",
            vec![(0, Spec::integer(IntSpec::new(Width::One, Endian::Little)))],
            Spec::stop(),
        );

        assert_eq!(
            spec.to_string(),
            "Switch(\"tag\", {0=Integer(IntSpec { width: One, endian: Little }), *=Stop})"
        );
    }
}

//! Serializes a [`Data`] tree back to bytes against the [`Spec`] that
//! produced it, back-patching any length/count field the caller marked
//! [`AUTO`].

use std::collections::HashMap;

use crate::data::Data;
use crate::error::EncodeError;
use crate::intcodec::IntSpec;
use crate::spec::Spec;

/// A sentinel `Integer` value telling the encoder to compute and back-patch
/// the real value of a `Variable` field once it is known (e.g. once the
/// `Bytes`/`Until`/`Repeat` that consumes it has been encoded).
///
/// Chosen high enough that it is unlikely to collide with a legitimate
/// length or count, while leaving headroom below it for arithmetic on
/// offsets.
pub const AUTO: u64 = !0x3fff_ffffu64;

#[derive(Clone, Copy, Debug)]
struct VariableInfo {
    location: usize,
    spec: IntSpec,
    offset: i64,
    value: u64,
}

/// Encodes `(Spec, Data)` pairs into bytes.
///
/// Stateless from the caller's perspective: all mutable state (the output
/// buffer and the back-patch table) lives within a single [`encode`](Self::encode)
/// call.
#[derive(Clone, Copy, Debug, Default)]
pub struct Encoder;

impl Encoder {
    /// Encode `data` against `spec`, producing the complete output buffer.
    ///
    /// # Panics
    /// Panics if `data` does not conform to the shape `spec` describes:
    /// mismatched node kinds, wrong `Seq` lengths, a fixed-length `Bytes`
    /// whose actual length disagrees with its declared length, or a
    /// reference to a variable that was never written. These are all
    /// programmer errors, not recoverable conditions.
    pub fn encode(spec: &Spec, data: &Data) -> Vec<u8> {
        let mut state = EncodeState {
            buf: Vec::new(),
            vars: HashMap::new(),
        };
        state.encode_node(spec, data);
        state.buf
    }
}

struct EncodeState {
    buf: Vec<u8>,
    vars: HashMap<String, VariableInfo>,
}

impl EncodeState {
    fn encode_node(&mut self, spec: &Spec, data: &Data) {
        match (spec, data) {
            (Spec::Skip(n), Data::Empty) => {
                self.buf.extend(std::iter::repeat(0u8).take(*n as usize));
            }

            (Spec::Stop, Data::Stop(_, _)) => {}

            (Spec::Integer(int_spec), Data::Integer(v)) => {
                self.buf.extend(int_spec.encode(*v));
            }

            (Spec::Variable(int_spec, name, offset), Data::Integer(v)) => {
                let location = self.buf.len();
                let adjusted = v.wrapping_sub(*offset as u64);
                self.buf.extend(int_spec.encode(adjusted));
                self.vars.insert(
                    name.clone(),
                    VariableInfo {
                        location,
                        spec: *int_spec,
                        offset: *offset,
                        value: *v,
                    },
                );
            }

            (Spec::Bytes(name), Data::Bytes(view)) => {
                let buf = view.to_bytes();
                if let Some(name) = name {
                    self.resolve_length(name, buf.len() as u64);
                }
                self.buf.extend_from_slice(&buf);
            }

            (Spec::Seq(specs), Data::Seq(items)) => {
                if specs.len() != items.len() {
                    fail(EncodeError::SeqLengthMismatch {
                        expected: specs.len(),
                        found: items.len(),
                    });
                }
                for (s, d) in specs.iter().zip(items) {
                    self.encode_node(s, d);
                }
            }

            (Spec::Until(name, inner), Data::Seq(items)) => {
                let mut sub = EncodeState {
                    buf: Vec::new(),
                    vars: self.vars.clone(),
                };
                for item in items {
                    sub.encode_node(inner, item);
                }

                match name {
                    Some(name) => {
                        let info = self.require_var(name);
                        if info.value == AUTO {
                            self.set_and_patch(name, sub.buf.len() as u64);
                            self.buf.extend_from_slice(&sub.buf);
                        } else {
                            let fixed = info.value as usize;
                            sub.buf.resize(fixed, 0);
                            self.buf.extend_from_slice(&sub.buf);
                        }
                    }
                    None => self.buf.extend_from_slice(&sub.buf),
                }
            }

            (Spec::Repeat(name, inner), Data::Seq(items)) => {
                self.resolve_length(name, items.len() as u64);
                for item in items {
                    self.encode_node(inner, item);
                }
            }

            (Spec::Switch(name, cases, default), data) => {
                let tag = self.require_var(name).value;
                let chosen = cases.get(&tag).unwrap_or(default);
                self.encode_node(chosen, data);
            }

            (spec, data) => fail(EncodeError::ShapeMismatch {
                expected: spec_kind(spec),
                found: data_kind(data),
            }),
        }
    }

    /// Shared `Bytes`/`Repeat` logic: either resolve an `AUTO` length/count
    /// by back-patching, or assert the caller-supplied fixed value matches.
    fn resolve_length(&mut self, name: &str, actual: u64) {
        let info = self.require_var(name);
        if info.value == AUTO {
            self.set_and_patch(name, actual);
        } else if info.value != actual {
            fail(EncodeError::LengthMismatch {
                expected: info.value,
                found: actual,
            });
        }
    }

    fn require_var(&self, name: &str) -> VariableInfo {
        *self.vars.get(name).unwrap_or_else(|| {
            fail(EncodeError::UndeclaredVariable {
                name: name.to_string(),
            })
        })
    }

    fn set_and_patch(&mut self, name: &str, value: u64) {
        let info = self.vars.get_mut(name).expect("checked by require_var");
        info.value = value;
        let adjusted = value.wrapping_sub(info.offset as u64);
        let encoded = info.spec.encode(adjusted);
        self.buf[info.location..info.location + encoded.len()].copy_from_slice(&encoded);
    }
}

fn fail(err: EncodeError) -> ! {
    panic!("{err}")
}

fn spec_kind(spec: &Spec) -> &'static str {
    match spec {
        Spec::Skip(_) => "Skip",
        Spec::Stop => "Stop",
        Spec::Integer(_) => "Integer",
        Spec::Variable(..) => "Variable",
        Spec::Bytes(_) => "Bytes",
        Spec::Seq(_) => "Seq",
        Spec::Until(..) => "Until",
        Spec::Repeat(..) => "Repeat",
        Spec::Switch(..) => "Switch",
    }
}

fn data_kind(data: &Data) -> &'static str {
    match data {
        Data::Empty => "Empty",
        Data::Stop(..) => "Stop",
        Data::Integer(_) => "Integer",
        Data::Bytes(_) => "Bytes",
        Data::Seq(_) => "Seq",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::Endian;
    use crate::intcodec::Width;
    use crate::parser::Parser;

    fn le(width: Width) -> IntSpec {
        IntSpec::new(width, Endian::Little)
    }

    #[test]
    fn big_endian_tower_round_trips() {
        let spec = Spec::seq(vec![
            Spec::integer(IntSpec::new(Width::One, Endian::Big)),
            Spec::integer(IntSpec::new(Width::Two, Endian::Big)),
        ]);
        let data = Data::Seq(vec![Data::Integer(0x12), Data::Integer(0x1234)]);

        let bytes = Encoder::encode(&spec, &data);
        assert_eq!(bytes, vec![0x12, 0x12, 0x34]);

        let mut parser = Parser::new(spec);
        parser.supply(bytes);
        assert_eq!(parser.next().unwrap(), data);
    }

    #[test]
    fn auto_sized_length_prefix_round_trips() {
        let spec = Spec::seq(vec![
            Spec::variable(le(Width::Four), "len", 0),
            Spec::bytes("len"),
        ]);
        let data = Data::Seq(vec![Data::Integer(AUTO), Data::bytes(&b"ABCD"[..])]);

        let bytes = Encoder::encode(&spec, &data);
        assert_eq!(&bytes[0..4], &[4, 0, 0, 0]);
        assert_eq!(&bytes[4..], b"ABCD");
    }

    #[test]
    fn negative_offset_length_prefix() {
        // `%-6I`: the encoded value is logical_len - (-6) = logical_len + 6.
        let spec = Spec::variable(le(Width::Four), "len", -6);
        let data = Data::Integer(11);

        let bytes = Encoder::encode(&spec, &data);
        assert_eq!(bytes, 17u32.to_le_bytes());
    }

    #[test]
    fn repeat_count_back_patches() {
        let spec = Spec::seq(vec![
            Spec::variable(le(Width::One), "n", 0),
            Spec::repeat("n", Spec::integer(le(Width::One))),
        ]);
        let data = Data::Seq(vec![
            Data::Integer(AUTO),
            Data::Seq(vec![Data::Integer(1), Data::Integer(2), Data::Integer(3)]),
        ]);

        let bytes = Encoder::encode(&spec, &data);
        assert_eq!(bytes, vec![3, 1, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn seq_length_mismatch_panics() {
        let spec = Spec::Seq(vec![Spec::integer(le(Width::One))]);
        let data = Data::Seq(vec![]);
        Encoder::encode(&spec, &data);
    }
}

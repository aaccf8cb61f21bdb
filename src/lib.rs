//! A declarative grammar for binary wire formats, with an incremental
//! parser and a back-patching encoder.
//!
//! # Important types
//! - [`Spec`] describes the shape of a format: fixed-width integers,
//!   length-prefixed byte blobs, tag-dispatched variants, and
//!   budget-bounded or count-bounded repetition. Build one directly with
//!   [`Spec`]'s constructors, or compile it from the terse textual grammar
//!   with [`compile`].
//! - [`Parser`] consumes bytes against a `Spec` and produces a [`Data`]
//!   tree. It is incremental: feed it however many bytes you have with
//!   [`Parser::supply`], and [`Parser::next`] either returns a complete
//!   [`Data`] or tells you how many more bytes it needs.
//! - [`Encoder`] goes the other way, turning a `Spec` and a `Data` tree
//!   back into bytes, resolving any length or count field the caller
//!   marked with [`AUTO`] along the way.
//!
//! # Example
//! Parsing and re-encoding a length-prefixed record: a one-byte tag
//! selecting either a 4-byte integer or a length-prefixed string.
//! ```
//! use bytespec::{compile, Data, Encoder, Parser};
//!
//! let spec = compile("<%B{0=I,1=%Is}").unwrap();
//!
//! let data: &[u8] = &[0x01, 0x05, 0x00, 0x00, 0x00, b'h', b'e', b'l', b'l', b'o'];
//! let mut parser = Parser::new(spec.clone());
//! parser.supply(data);
//! let parsed = parser.next().unwrap();
//! assert_eq!(parsed, Data::Seq(vec![Data::Integer(1), Data::Seq(vec![
//!     Data::Integer(5),
//!     Data::from("hello"),
//! ])]));
//!
//! let encoded = Encoder::encode(&spec, &parsed);
//! assert_eq!(encoded, data);
//! ```
//!
//! # Crate organization
//! - [`spec`] holds the `Spec` AST itself; [`compile`] turns a spec-string
//!   into one.
//! - [`data`] holds `Data`, the parsed value tree, and [`Environment`], the
//!   variable table threaded through a parse or encode.
//! - [`parser`] and [`Encoder`] are the two directions of travel between
//!   bytes and `Data`.
//! - [`bytequeue`] and [`intcodec`] are the substrate both of those build
//!   on: a zero-copy byte queue and a fixed-width integer codec.
//! - [`error`] has the three failure types: [`Incomplete`] (recoverable,
//!   "not enough bytes yet"), [`CompileError`] (a malformed spec-string),
//!   and [`EncodeError`] (a `Data` tree that didn't match its `Spec`).

#![warn(missing_docs)]

pub mod bytequeue;
mod compiler;
pub mod data;
pub mod endian;
pub mod error;
pub mod intcodec;
pub mod parser;
mod encoder;
pub mod spec;
mod util;

pub use crate::bytequeue::{ByteQueue, ByteView};
pub use crate::compiler::{compile, compile_with_prefix};
pub use crate::data::{Data, Environment};
pub use crate::encoder::{Encoder, AUTO};
pub use crate::endian::Endian;
pub use crate::error::{CompileError, CompileErrorKind, EncodeError, Incomplete};
pub use crate::intcodec::{IntSpec, Width};
pub use crate::parser::Parser;
pub use crate::spec::Spec;

/// Common data used in doctests.
///
/// This way it doesn't need to be repeated multiple times unless we want to
/// show it as part of the doc test.
///
/// It is also used to verify that the examples within the README work.
#[doc(hidden)]
pub mod doctest {
    #[doc = include_str!("../README.md")]
    pub mod readme {}
}

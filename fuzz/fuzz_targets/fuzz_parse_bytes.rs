#![no_main]

use bytespec::{Parser, Spec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Spec, Vec<u8>)| {
    let (spec, bytes) = input;
    let mut parser = Parser::new(spec);
    parser.supply(bytes);
    let _ = parser.parse_all();
});

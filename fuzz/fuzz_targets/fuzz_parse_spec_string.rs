#![no_main]

use bytespec::{compile, Parser};
use libfuzzer_sys::fuzz_target;

// Generates both a spec-string and an input buffer, compiles the former, and
// if it compiles, drives a Parser over the latter one byte at a time. Checks
// two things: the parser never panics on attacker-controlled bytes, and
// Incomplete's reported deficit is honest — supplying fewer bytes than it
// last asked for must never produce a spurious success.
fuzz_target!(|input: (&str, Vec<u8>)| {
    let (spec_string, bytes) = input;
    let Ok(spec) = compile(spec_string) else {
        return;
    };

    let mut parser = Parser::new(spec);
    let mut supplied_since_incomplete: usize = 0;
    let mut last_needed: Option<usize> = None;

    for byte in bytes {
        parser.supply(vec![byte]);
        supplied_since_incomplete += 1;

        match parser.next() {
            Ok(_) => {
                if let Some(prev) = last_needed {
                    assert!(
                        supplied_since_incomplete >= prev,
                        "parser succeeded after being supplied fewer bytes than \
                         the Incomplete deficit it had just reported"
                    );
                }
                last_needed = None;
                supplied_since_incomplete = 0;
                parser.reset();
            }
            Err(incomplete) => {
                let needed = incomplete.needed();
                assert!(needed >= 1, "Incomplete must ask for at least one byte");
                last_needed = Some(needed);
                supplied_since_incomplete = 0;
            }
        }
    }
});

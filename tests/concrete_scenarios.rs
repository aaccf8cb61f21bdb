//! Integration tests mirroring worked examples: build a `Spec`, run it
//! through the `Parser` and/or `Encoder`, and check the exact byte/`Data`
//! shapes that result.

use bytespec::{Data, Encoder, Endian, IntSpec, Parser, Spec, Width, AUTO};

fn le(width: Width) -> IntSpec {
    IntSpec::new(width, Endian::Little)
}

#[test]
fn auto_sized_encode_with_offsets() {
    // Two auto-sized length-bearing variables, each with a nonzero offset:
    // a byte count feeding a `Bytes` field, and a byte budget feeding an
    // `Until`.
    let spec = Spec::seq(vec![
        Spec::variable(le(Width::Four), "len", -6),
        Spec::variable(le(Width::Four), "budget", 10),
        Spec::bytes("len"),
        Spec::until("budget", Spec::integer(le(Width::Two))),
    ]);

    let data = Data::Seq(vec![
        Data::Integer(AUTO),
        Data::Integer(AUTO),
        Data::from(&b"DEFGH"[..]),
        Data::Seq((1u64..=6).map(Data::Integer).collect()),
    ]);

    let encoded = Encoder::encode(&spec, &data);

    let mut expected = Vec::new();
    expected.extend_from_slice(&11u32.to_le_bytes()); // 5 - (-6)
    expected.extend_from_slice(&2u32.to_le_bytes()); // 12 - 10
    expected.extend_from_slice(b"DEFGH");
    for n in 1u16..=6 {
        expected.extend_from_slice(&n.to_le_bytes());
    }
    assert_eq!(encoded, expected);

    // Round-tripping through the parser replaces each AUTO with the value
    // that was actually computed.
    let mut parser = Parser::new(spec);
    parser.supply(encoded);
    let parsed = parser.next().unwrap();

    assert_eq!(
        parsed,
        Data::Seq(vec![
            Data::Integer(5),
            Data::Integer(12),
            Data::from(&b"DEFGH"[..]),
            Data::Seq((1u64..=6).map(Data::Integer).collect()),
        ])
    );
}

#[test]
fn nested_unbounded_until() {
    // The inner `*(B)` is bounded by whatever's left of the outer budget,
    // not by the whole remaining input.
    let spec = Spec::seq(vec![
        Spec::variable(le(Width::One), "0", 0),
        Spec::until(
            "0",
            Spec::seq(vec![
                Spec::integer(le(Width::Four)),
                Spec::until_unbounded(Spec::integer(le(Width::One))),
            ]),
        ),
    ]);

    let input: &[u8] = &[
        0x09, 0x11, 0x22, 0x33, 0x44, 0x90, 0x91, 0x92, 0x93, 0x94, 0x55, 0x66, 0x77, 0x88,
    ];

    let mut parser = Parser::new(spec);
    parser.supply(input);
    let result = parser.next().unwrap();

    assert_eq!(
        result,
        Data::Seq(vec![
            Data::Integer(9),
            Data::Seq(vec![Data::Seq(vec![
                Data::Integer(0x44332211),
                Data::Seq(vec![
                    Data::Integer(0x90),
                    Data::Integer(0x91),
                    Data::Integer(0x92),
                    Data::Integer(0x93),
                    Data::Integer(0x94),
                ]),
            ])]),
        ])
    );

    assert_eq!(
        parser.remaining(),
        bytes::Bytes::from_static(&[0x55, 0x66, 0x77, 0x88])
    );
}

#[test]
fn switch_with_default_widths() {
    // Spec `<%B{0=B,1=H,2=I,3=Q,*=H}`: a tag selects the width of the
    // value that follows it.
    let le_u = |w| Spec::integer(le(w));
    let spec = Spec::seq(vec![
        Spec::variable(le(Width::One), "tag", 0),
        Spec::switch(
            "tag",
            vec![
                (0, le_u(Width::One)),
                (1, le_u(Width::Two)),
                (2, le_u(Width::Four)),
                (3, le_u(Width::Eight)),
            ],
            le_u(Width::Two),
        ),
    ]);

    let mut parser = Parser::new(spec);
    parser.supply(&b"\x01\x34\x56"[..]);
    let result = parser.next().unwrap();

    assert_eq!(
        result,
        Data::Seq(vec![Data::Integer(1), Data::Integer(0x5634)])
    );
}

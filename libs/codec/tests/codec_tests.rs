//! # Codec Integration Tests
//!
//! Property tests over the public API:
//! - decode(encode(m)) == m for every well-formed message and bundle
//! - padded fields are 4-byte multiples and always NUL terminated
//! - arbitrary bytes never panic the decoder

use codec::{
    decode, decode_packet, encode, encode_packet, encoded_len, padded_str_len, Arg, Bundle,
    CodecError, Message, MessageBuilder, Packet, TimeTag,
};
use proptest::prelude::*;

fn arb_address() -> impl Strategy<Value = String> {
    "(/[a-zA-Z0-9_]{1,10}){1,4}"
}

fn arb_arg() -> impl Strategy<Value = Arg> {
    prop_oneof![
        any::<i32>().prop_map(Arg::Int),
        any::<f32>().prop_map(Arg::Float),
        "[a-zA-Z0-9 ._~-]{0,24}".prop_map(Arg::Str),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (arb_address(), prop::collection::vec(arb_arg(), 0..10))
        .prop_map(|(address, args)| Message { address, args })
}

fn arb_packet() -> impl Strategy<Value = Packet> {
    let leaf = arb_message().prop_map(Packet::Message);
    leaf.prop_recursive(3, 16, 4, |inner| {
        (any::<u64>(), prop::collection::vec(inner, 0..4)).prop_map(|(tag, content)| {
            Packet::Bundle(Bundle {
                time_tag: TimeTag::from_u64(tag),
                content,
            })
        })
    })
}

proptest! {
    #[test]
    fn prop_message_round_trip(msg in arb_message()) {
        let bytes = encode(&msg);
        prop_assert_eq!(bytes.len(), encoded_len(&msg));
        prop_assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn prop_packet_round_trip(packet in arb_packet()) {
        let bytes = encode_packet(&packet);
        prop_assert_eq!(decode_packet(&bytes).unwrap(), packet);
    }

    #[test]
    fn prop_padded_fields(msg in arb_message()) {
        let bytes = encode(&msg);
        prop_assert_eq!(bytes.len() % 4, 0);

        let addr_field = padded_str_len(msg.address.len());
        prop_assert_eq!(addr_field % 4, 0);
        prop_assert!(bytes[msg.address.len()..addr_field].iter().all(|&b| b == 0));
        prop_assert!(addr_field > msg.address.len());

        let tags_field = padded_str_len(1 + msg.args.len());
        let tags = &bytes[addr_field..addr_field + tags_field];
        prop_assert_eq!(tags[0], b',');
        prop_assert_eq!(tags[1 + msg.args.len()], 0);
    }

    #[test]
    fn prop_decoder_never_panics(data in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_packet(&data);
    }

    #[test]
    fn prop_truncation_never_yields_partial_args(msg in arb_message(), cut in 1usize..16) {
        let bytes = encode(&msg);
        prop_assume!(cut < bytes.len());
        let short = &bytes[..bytes.len() - cut];
        // Either rejected outright or, if the cut landed on a word boundary of a
        // field that can legally end there, it must not silently drop arguments
        if let Ok(decoded) = decode(short) {
            prop_assert_eq!(decoded.args.len(), msg.args.len());
        }
    }
}

#[test]
fn test_unknown_tag_rejected_then_next_packet_decodes() {
    let mut bad = b"/editor/highlights\0\0".to_vec();
    bad.extend_from_slice(b",iiiiih\0");
    for v in [1i32, 1, 5, 1, 10] {
        bad.extend_from_slice(&v.to_be_bytes());
    }
    bad.extend_from_slice(&500u64.to_be_bytes());

    assert_eq!(
        decode(&bad).unwrap_err(),
        CodecError::UnsupportedType { tag: 'h', index: 5 }
    );

    let good = MessageBuilder::new("/editor/highlights")
        .int(2)
        .int(2)
        .int(0)
        .int(2)
        .int(15)
        .int(750)
        .encode()
        .unwrap();
    let msg = decode(&good).unwrap();
    assert_eq!(msg.args.len(), 6);
    assert_eq!(msg.args[5], Arg::Int(750));
}

#[test]
fn test_tidal_seven_argument_message() {
    let bytes = MessageBuilder::new("/editor/highlights")
        .string("bd")
        .float(0.5625)
        .float(1.0)
        .int(0)
        .float(0.5)
        .int(5)
        .int(15)
        .encode()
        .unwrap();

    let msg = decode(&bytes).unwrap();
    assert_eq!(msg.type_tags(), "sffifii");
    assert_eq!(msg.args[0].as_str(), Some("bd"));
    assert_eq!(msg.args[1].as_float(), Some(0.5625));
    assert_eq!(msg.args[6].as_int(), Some(15));
}

#[test]
fn test_empty_and_tiny_inputs() {
    assert!(matches!(decode(&[]), Err(CodecError::Truncated { .. })));
    assert!(matches!(decode(b"/"), Err(CodecError::MisalignedLength { len: 1 })));
    assert!(matches!(
        decode(b"/ab\0"),
        Err(CodecError::MissingTypeTags { offset: 4 })
    ));
}

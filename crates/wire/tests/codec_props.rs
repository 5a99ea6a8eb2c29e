//! Property tests for the RESP2 codec

use bytes::BytesMut;
use proptest::prelude::*;
use sugar_core::Reply;
use sugar_wire::{encode_request, parse_reply, Parsed};

proptest! {
    #[test]
    fn encoded_requests_parse_as_bulk_arrays(
        args in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..8)
    ) {
        let mut buf = BytesMut::new();
        encode_request(&args, &mut buf);
        let expected = Reply::Array(args.iter().cloned().map(Reply::Bulk).collect());
        prop_assert_eq!(parse_reply(&buf), Parsed::Complete(expected, buf.len()));
    }

    #[test]
    fn truncated_input_is_incomplete(
        args in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 1..4),
        cut in any::<prop::sample::Index>()
    ) {
        let mut buf = BytesMut::new();
        encode_request(&args, &mut buf);
        let cut = cut.index(buf.len());
        prop_assert_eq!(parse_reply(&buf[..cut]), Parsed::Incomplete);
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_reply(&data);
    }
}

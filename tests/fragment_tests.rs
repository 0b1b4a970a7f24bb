//! Fragment builder integration tests
//!
//! Worked examples and properties of `build_fragments` /
//! `build_overlapping_pair` through the public API.

use frag_probe::{
    build_fragments, build_overlapping_pair, reassemble, FragmentBuilder, FragmentError,
    FragmentSizePolicy, InvalidArgument, OverlapPolicy,
};
use proptest::prelude::*;

const HTTP_REQUEST: &[u8] = b"GET /EVIL_PAYLOAD HTTP/1.1\r\nHost: target\r\n\r\n";

// === Worked examples ===

#[test]
fn test_http_request_eight_byte_fragments() {
    assert_eq!(HTTP_REQUEST.len(), 44);

    let fragments = build_fragments(HTTP_REQUEST, 8, 1234).expect("Failed to fragment");

    let offsets: Vec<u16> = fragments.iter().map(|f| f.fragment_offset()).collect();
    let mf: Vec<bool> = fragments.iter().map(|f| f.more_fragments()).collect();
    assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(mf, vec![true, true, true, true, true, false]);
    assert_eq!(fragments.last().unwrap().payload().len(), 4);
    assert!(fragments.iter().all(|f| f.header().identification == 1234));
}

#[test]
fn test_fifty_six_bytes_gives_seven_fragments() {
    let payload: Vec<u8> = (0..56).collect();
    let fragments = build_fragments(&payload, 8, 1234).expect("Failed to fragment");

    let offsets: Vec<u16> = fragments.iter().map(|f| f.fragment_offset()).collect();
    assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5, 6]);
    assert!(fragments.iter().all(|f| f.payload().len() == 8));
    assert!(!fragments[6].more_fragments());
}

#[test]
fn test_overlapping_pair_literal() {
    let (a, b) = build_overlapping_pair(b"AAAA", b"GET /evil HTTP/1.1", 1234);

    assert_eq!(a.fragment_offset(), 0);
    assert!(a.more_fragments());
    assert_eq!(a.payload().as_ref(), b"AAAA");

    assert_eq!(b.fragment_offset(), 1);
    assert_eq!(b.header().byte_offset(), 8);
    assert_eq!(b.payload().as_ref(), b"GET /evil HTTP/1.1");

    assert_eq!(a.header().identification, b.header().identification);
}

#[test]
fn test_overlapping_pair_never_rejects() {
    // 任意长度、包括空负载，都必须能表示
    let (a, b) = build_overlapping_pair(b"", b"", 0);
    assert!(a.payload().is_empty());
    assert!(b.payload().is_empty());

    let (a, b) = build_overlapping_pair(&[0x41; 4096], b"x", u16::MAX);
    assert!(a.overlaps(&b));
}

#[test]
fn test_whole_payload_in_one_fragment() {
    let payload = [7u8; 24];
    let fragments = build_fragments(&payload, payload.len(), 1).expect("Failed to fragment");

    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].fragment_offset(), 0);
    assert!(!fragments[0].more_fragments());
}

#[test]
fn test_fragment_size_larger_than_payload() {
    let fragments = build_fragments(b"short", 1480, 1).expect("Failed to fragment");
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].payload().as_ref(), b"short");
}

// === Invalid arguments ===

#[test]
fn test_empty_payload_rejected() {
    assert_eq!(
        build_fragments(b"", 8, 1),
        Err(FragmentError::InvalidArgument(InvalidArgument::EmptyPayload))
    );
}

#[test]
fn test_zero_fragment_size_rejected() {
    for policy in [FragmentSizePolicy::Strict, FragmentSizePolicy::Lenient] {
        let result = FragmentBuilder::default()
            .policy(policy)
            .build_fragments(HTTP_REQUEST, 0, 1);
        assert_eq!(
            result,
            Err(FragmentError::InvalidArgument(InvalidArgument::ZeroFragmentSize))
        );
    }
}

#[test]
fn test_unaligned_size_strict_vs_lenient() {
    let strict = build_fragments(HTTP_REQUEST, 10, 1);
    assert_eq!(
        strict,
        Err(FragmentError::InvalidArgument(
            InvalidArgument::UnalignedFragmentSize { size: 10 }
        ))
    );

    let lenient = FragmentBuilder::default()
        .policy(FragmentSizePolicy::Lenient)
        .build_fragments(HTTP_REQUEST, 10, 1)
        .expect("Lenient policy should round down");
    assert_eq!(lenient.len(), 6);
    assert!(lenient[..5].iter().all(|f| f.payload().len() == 8));
}

#[test]
fn test_error_message() {
    let err = build_fragments(b"", 8, 1).unwrap_err();
    assert_eq!(err.to_string(), "Invalid argument: payload is empty");
}

// === Properties ===

fn payload_and_size() -> impl Strategy<Value = (Vec<u8>, usize)> {
    (
        proptest::collection::vec(any::<u8>(), 1..2048),
        (1usize..=128).prop_map(|units| units * 8),
    )
}

proptest! {
    #[test]
    fn prop_concatenation_restores_payload((payload, size) in payload_and_size(), id in any::<u16>()) {
        let fragments = build_fragments(&payload, size, id).unwrap();

        let joined: Vec<u8> = fragments.iter().flat_map(|f| f.payload().iter().copied()).collect();
        prop_assert_eq!(joined, payload.clone());
        prop_assert_eq!(fragments.len(), payload.len().div_ceil(size));
    }

    #[test]
    fn prop_only_last_fragment_clears_mf((payload, size) in payload_and_size()) {
        let fragments = build_fragments(&payload, size, 1).unwrap();

        let last_flags: Vec<usize> = fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.more_fragments())
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(last_flags, vec![fragments.len() - 1]);
    }

    #[test]
    fn prop_offsets_follow_lengths((payload, size) in payload_and_size()) {
        let fragments = build_fragments(&payload, size, 1).unwrap();

        let mut consumed = 0usize;
        for fragment in &fragments {
            prop_assert_eq!(fragment.fragment_offset() as usize, consumed / 8);
            prop_assert_eq!(consumed % 8, 0);
            consumed += fragment.payload().len();
        }
    }

    #[test]
    fn prop_build_is_deterministic((payload, size) in payload_and_size(), id in any::<u16>()) {
        let first = build_fragments(&payload, size, id).unwrap();
        let second = build_fragments(&payload, size, id).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_reassembly_policies_agree_without_overlap((payload, size) in payload_and_size()) {
        let fragments = build_fragments(&payload, size, 1).unwrap();

        let first = reassemble(&fragments, OverlapPolicy::First).unwrap();
        let last = reassemble(&fragments, OverlapPolicy::Last).unwrap();
        prop_assert_eq!(first.as_ref(), payload.as_slice());
        prop_assert_eq!(last.as_ref(), payload.as_slice());
    }

    #[test]
    fn prop_lenient_size_is_aligned(size in 1usize..4096) {
        let effective = FragmentSizePolicy::Lenient.effective_size(size).unwrap();
        prop_assert_eq!(effective % 8, 0);
        prop_assert!(effective >= 8);
        prop_assert!(effective <= size.max(8));
    }
}

//! 分割投入のプロパティテスト
//!
//! どの位置で分割して投入しても、一括投入と同じメッセージになる。

use pbt::{request, response, split_at_points};
use proptest::prelude::*;
use shiguredo_http11_decoder::{HttpMessage, RequestDecoder, ResponseDecoder};

proptest! {
    #[test]
    fn request_split_matches_whole(
        raw in request(),
        points in proptest::collection::vec(any::<usize>(), 0..8)
    ) {
        let data = raw.to_bytes();

        let mut decoder = RequestDecoder::new();
        let whole = decoder.feed(&data).unwrap();
        prop_assert_eq!(whole.len(), 1);
        prop_assert_eq!(whole[0].body(), raw.body.as_slice());
        prop_assert_eq!(whole[0].method().as_str(), raw.method);

        let mut decoder = RequestDecoder::new();
        let mut split = Vec::new();
        for part in split_at_points(&data, &points) {
            split.extend(decoder.feed(part).unwrap());
        }
        prop_assert_eq!(split, whole);
        prop_assert!(decoder.is_idle());
    }

    #[test]
    fn response_split_matches_whole(
        raw in response(),
        points in proptest::collection::vec(any::<usize>(), 0..8)
    ) {
        let data = raw.to_bytes();

        let mut decoder = ResponseDecoder::new();
        let whole = decoder.feed(&data).unwrap();
        prop_assert_eq!(whole.len(), 1);
        prop_assert_eq!(whole[0].status_code(), raw.status_code);
        prop_assert_eq!(whole[0].body(), raw.body.as_slice());

        let mut decoder = ResponseDecoder::new();
        let mut split = Vec::new();
        for part in split_at_points(&data, &points) {
            split.extend(decoder.feed(part).unwrap());
        }
        prop_assert_eq!(split, whole);
    }

    #[test]
    fn request_byte_by_byte(raw in request()) {
        let data = raw.to_bytes();

        let mut decoder = RequestDecoder::new();
        let whole = decoder.feed(&data).unwrap();

        let mut decoder = RequestDecoder::new();
        let mut split = Vec::new();
        for b in &data {
            split.extend(decoder.feed(std::slice::from_ref(b)).unwrap());
        }
        prop_assert_eq!(split, whole);
    }

    #[test]
    fn pipelined_requests(
        raws in proptest::collection::vec(request(), 1..4),
        points in proptest::collection::vec(any::<usize>(), 0..8)
    ) {
        let data: Vec<u8> = raws.iter().flat_map(|raw| raw.to_bytes()).collect();

        let mut decoder = RequestDecoder::new();
        let mut requests = Vec::new();
        for part in split_at_points(&data, &points) {
            requests.extend(decoder.feed(part).unwrap());
        }
        prop_assert_eq!(requests.len(), raws.len());
        for (request, raw) in requests.iter().zip(&raws) {
            prop_assert_eq!(request.path(), raw.path.as_str());
            prop_assert_eq!(request.body(), raw.body.as_slice());
        }
    }

    #[test]
    fn truncated_request_is_never_emitted(raw in request(), cut in any::<usize>()) {
        let data = raw.to_bytes();
        let cut = cut % data.len();

        let mut decoder = RequestDecoder::new();
        prop_assert!(decoder.feed(&data[..cut]).unwrap().is_empty());
        let outcome = decoder.mark_eof();
        if cut == 0 {
            prop_assert_eq!(outcome, shiguredo_http11_decoder::EofOutcome::Clean);
        } else {
            prop_assert_eq!(outcome, shiguredo_http11_decoder::EofOutcome::Abandoned);
        }
    }
}

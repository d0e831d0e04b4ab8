#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http11_decoder::{DecodeState, DecoderLimits, EofOutcome, RequestDecoder};

fuzz_target!(|data: &[u8]| {
    // バッファ上限は投入の仕方で結果が変わるので外す
    let limits = DecoderLimits {
        max_buffer_size: usize::MAX,
        ..DecoderLimits::default()
    };

    // データを一度に feed
    let mut decoder = RequestDecoder::with_limits(limits);
    let whole = decoder.feed(data).unwrap_or_default();
    let whole_failed = decoder.state() == DecodeState::Failed;
    assert!(!matches!(decoder.mark_eof(), EofOutcome::Complete(_)));

    // データを分割して feed しても結果は変わらない
    let mut split = Vec::new();
    for chunk in data.chunks(17) {
        match decoder.feed(chunk) {
            Ok(requests) => split.extend(requests),
            Err(_) => break,
        }
    }
    let split_failed = decoder.state() == DecodeState::Failed;

    assert_eq!(whole_failed, split_failed);
    assert_eq!(whole, split);
});

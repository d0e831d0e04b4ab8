#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_decoder::{
    CloseDelimitedOverflow, DecoderLimits, RequestDecoder, ResponseDecoder,
};

#[derive(Arbitrary, Debug)]
struct FuzzLimits {
    max_buffer_size: u16,
    max_start_line_size: u16,
    max_headers_count: u16,
    max_header_line_size: u16,
    max_body_size: u32,
    max_chunk_line_size: u8,
    max_close_delimited_body_size: u16,
    reject_overflow: bool,
    data: Vec<u8>,
}

fn build_limits(input: &FuzzLimits) -> DecoderLimits {
    DecoderLimits {
        max_buffer_size: input.max_buffer_size as usize,
        max_start_line_size: input.max_start_line_size as usize,
        max_headers_count: input.max_headers_count as usize,
        max_header_line_size: input.max_header_line_size as usize,
        max_body_size: input.max_body_size as usize,
        max_chunk_line_size: input.max_chunk_line_size as usize,
        max_close_delimited_body_size: input.max_close_delimited_body_size as usize,
        close_delimited_overflow: if input.reject_overflow {
            CloseDelimitedOverflow::Reject
        } else {
            CloseDelimitedOverflow::Truncate
        },
    }
}

fuzz_target!(|input: FuzzLimits| {
    let limits = build_limits(&input);

    let mut request_decoder = RequestDecoder::with_limits(limits.clone());
    if let Ok(requests) = request_decoder.feed(&input.data) {
        for request in requests {
            assert!(request.into_body().len() <= limits.max_body_size);
        }
        assert!(request_decoder.remaining().len() <= limits.max_buffer_size);
    }
    let _ = request_decoder.mark_eof();

    let mut response_decoder = ResponseDecoder::with_limits(limits);
    let _ = response_decoder.feed(&input.data);
    let _ = response_decoder.mark_eof();
});

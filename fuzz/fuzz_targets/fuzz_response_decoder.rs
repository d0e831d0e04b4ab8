#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_decoder::{EofOutcome, HttpMessage, ResponseDecoder};

#[derive(Arbitrary, Debug)]
struct FuzzResponse {
    expect_no_body: bool,
    parse_cookies: bool,
    split_size: u8,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzResponse| {
    let split_size = (input.split_size as usize).max(1);

    let mut decoder = ResponseDecoder::new();
    decoder.set_expect_no_body(input.expect_no_body);
    decoder.set_parse_cookies(input.parse_cookies);

    for part in input.data.chunks(split_size) {
        match decoder.feed(part) {
            Ok(responses) => {
                for response in responses {
                    let _ = response.is_keep_alive();
                    let _ = response.content_length();
                }
            }
            Err(e) => {
                let _ = e.suggested_status();
                break;
            }
        }
    }

    let close_delimited = decoder.is_close_delimited();
    match decoder.mark_eof() {
        EofOutcome::Complete(response) => {
            assert!(close_delimited);
            assert!(response.body().len() <= decoder.limits().max_close_delimited_body_size);
        }
        EofOutcome::Clean | EofOutcome::Abandoned | EofOutcome::Failed(_) => {}
    }
    assert!(decoder.is_idle());
});

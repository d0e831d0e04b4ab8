#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_decoder::{HttpMessage, RequestDecoder, ResponseDecoder};

#[derive(Arbitrary, Debug)]
struct FuzzChunked {
    chunks: Vec<Vec<u8>>,
    uppercase: bool,
    extension: bool,
    split_hint: u8,
}

fn normalize_chunks(mut chunks: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    chunks.retain(|chunk| !chunk.is_empty());
    if chunks.len() > 64 {
        chunks.truncate(64);
    }
    chunks
}

fn encode_chunked(input: &FuzzChunked, chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in chunks {
        let size = if input.uppercase {
            format!("{:X}", chunk.len())
        } else {
            format!("{:x}", chunk.len())
        };
        out.extend_from_slice(size.as_bytes());
        if input.extension {
            out.extend_from_slice(b";ext=1");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

fuzz_target!(|input: FuzzChunked| {
    let chunks = normalize_chunks(input.chunks.clone());
    let expected = chunks.concat();
    let split_size = (input.split_hint as usize).max(1);
    let body = encode_chunked(&input, &chunks);

    let mut request = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    request.extend_from_slice(&body);
    let mut decoder = RequestDecoder::new();
    let mut requests = Vec::new();
    for part in request.chunks(split_size) {
        requests.extend(decoder.feed(part).expect("valid chunked request"));
    }
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body(), expected.as_slice());

    let mut response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    response.extend_from_slice(&body);
    let mut decoder = ResponseDecoder::new();
    let mut responses = Vec::new();
    for part in response.chunks(split_size) {
        responses.extend(decoder.feed(part).expect("valid chunked response"));
    }
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].body(), expected.as_slice());
});

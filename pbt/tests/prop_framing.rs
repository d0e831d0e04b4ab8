//! ボディ長決定のプロパティテスト

use pbt::{body, encode_chunk};
use proptest::prelude::*;
use shiguredo_http11_decoder::{HttpMessage, RequestDecoder, ResponseDecoder};

proptest! {
    /// chunked と Content-Length が両方あれば chunked が優先される
    #[test]
    fn chunked_wins_over_content_length(
        body in body(),
        declared in 0usize..1024,
        content_length_first in any::<bool>()
    ) {
        let content_length = format!("Content-Length: {}\r\n", declared);
        let transfer_encoding = "Transfer-Encoding: chunked\r\n".to_string();
        let (a, b) = if content_length_first {
            (content_length, transfer_encoding)
        } else {
            (transfer_encoding, content_length)
        };

        let mut data = format!("POST / HTTP/1.1\r\n{}{}\r\n", a, b).into_bytes();
        if !body.is_empty() {
            encode_chunk(&mut data, &body);
        }
        data.extend_from_slice(b"0\r\n\r\n");

        let mut decoder = RequestDecoder::new();
        let requests = decoder.feed(&data).unwrap();
        prop_assert_eq!(requests.len(), 1);
        prop_assert_eq!(requests[0].body(), body.as_slice());
        prop_assert!(decoder.remaining().is_empty());
    }

    /// ボディを持たないステータスコードは Content-Length を無視する
    #[test]
    fn status_without_body(
        code in prop_oneof![100u16..200, Just(204u16), Just(304u16)],
        declared in 1usize..1024
    ) {
        let data = format!("HTTP/1.1 {} Status\r\nContent-Length: {}\r\n\r\n", code, declared);
        let mut decoder = ResponseDecoder::new();
        let responses = decoder.feed(data.as_bytes()).unwrap();
        prop_assert_eq!(responses.len(), 1);
        prop_assert!(responses[0].body().is_empty());
    }

    /// 一致する Content-Length の繰り返しは受け付け、異なれば 400
    #[test]
    fn repeated_content_length(a in 0usize..64, b in 0usize..64) {
        let data = format!(
            "POST / HTTP/1.1\r\nContent-Length: {}\r\nContent-Length: {}\r\n\r\n{}",
            a,
            b,
            "x".repeat(a)
        );
        let mut decoder = RequestDecoder::new();
        let result = decoder.feed(data.as_bytes());
        if a == b {
            let requests = result.unwrap();
            prop_assert_eq!(requests[0].body().len(), a);
        } else {
            prop_assert_eq!(result.unwrap_err().suggested_status(), 400);
        }
    }

    /// HTTP/1.0 は Transfer-Encoding を参照しない
    #[test]
    fn http10_ignores_transfer_encoding(coding in "[a-z]{1,10}", body in body()) {
        let mut data = format!(
            "POST / HTTP/1.0\r\nTransfer-Encoding: {}\r\nContent-Length: {}\r\n\r\n",
            coding,
            body.len()
        )
        .into_bytes();
        data.extend_from_slice(&body);

        let mut decoder = RequestDecoder::new();
        let requests = decoder.feed(&data).unwrap();
        prop_assert_eq!(requests[0].body(), body.as_slice());
    }
}

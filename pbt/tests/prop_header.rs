//! ヘッダーブロックのプロパティテスト

use pbt::{header_name, header_value};
use proptest::prelude::*;
use shiguredo_http11_decoder::{HttpMessage, RequestDecoder};

fn linear_whitespace() -> impl Strategy<Value = String> {
    "[ \t]{1,4}".prop_map(|s| s)
}

proptest! {
    /// 継続行は 1 つの空白で連結される
    #[test]
    fn folded_value_is_joined_with_single_space(
        name in header_name(),
        first in header_value(),
        continuation in header_value(),
        fold in linear_whitespace()
    ) {
        let data = format!(
            "GET / HTTP/1.1\r\n{}: {}\r\n{}{}\r\n\r\n",
            name, first, fold, continuation
        );
        let mut decoder = RequestDecoder::new();
        let requests = decoder.feed(data.as_bytes()).unwrap();
        let expected = format!("{} {}", first, continuation);
        prop_assert_eq!(requests[0].get_header(&name), Some(expected.as_str()));
    }

    #[test]
    fn header_lookup_is_case_insensitive(name in header_name(), value in header_value()) {
        let data = format!("GET / HTTP/1.1\r\n{}: {}\r\n\r\n", name, value);
        let mut decoder = RequestDecoder::new();
        let requests = decoder.feed(data.as_bytes()).unwrap();
        prop_assert_eq!(requests[0].get_header(&name.to_ascii_lowercase()), Some(value.as_str()));
        prop_assert_eq!(requests[0].get_header(&name.to_ascii_uppercase()), Some(value.as_str()));
    }

    #[test]
    fn optional_whitespace_is_trimmed(
        name in header_name(),
        value in header_value(),
        before in "[ \t]{0,4}",
        after in "[ \t]{0,4}"
    ) {
        let data = format!("GET / HTTP/1.1\r\n{}:{}{}{}\r\n\r\n", name, before, value, after);
        let mut decoder = RequestDecoder::new();
        let requests = decoder.feed(data.as_bytes()).unwrap();
        prop_assert_eq!(requests[0].get_header(&name), Some(value.as_str()));
    }

    #[test]
    fn control_character_in_value_is_rejected(
        name in header_name(),
        ctl in (0u8..0x20).prop_filter("HTAB / CR / LF", |b| !matches!(b, b'\t' | b'\r' | b'\n'))
    ) {
        let mut data = format!("GET / HTTP/1.1\r\n{}: a", name).into_bytes();
        data.push(ctl);
        data.extend_from_slice(b"b\r\n\r\n");
        let mut decoder = RequestDecoder::new();
        prop_assert_eq!(decoder.feed(&data).unwrap_err().suggested_status(), 400);
    }
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http11_decoder::QueryParams;
use shiguredo_http11_decoder::uri::{Uri, decode_form_component, is_valid_request_target};

fuzz_target!(|data: &[u8]| {
    let _ = is_valid_request_target(data);

    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(uri) = Uri::parse(input) {
        assert_eq!(uri.as_str(), input);
        let _ = uri.host();
        let _ = uri.port();
        if let Some(query) = uri.query() {
            let _ = QueryParams::parse(query);
        }
    }
    let _ = Uri::parse_authority_form(input);
    let _ = decode_form_component(input);
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http11_decoder::CookieSet;
use shiguredo_http11_decoder::cookie::{is_valid_cookie_name, parse_cookie_header, parse_set_cookie};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let cookies = parse_cookie_header(input);
    for cookie in &cookies {
        assert!(is_valid_cookie_name(cookie.name()));
    }
    let set: CookieSet = cookies.into_iter().collect();
    let _ = set.len();

    if let Some(cookie) = parse_set_cookie(input) {
        assert!(is_valid_cookie_name(cookie.name()));
    }
});

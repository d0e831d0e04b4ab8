//! デコーダーが提案するステータスコード

/// 400 Bad Request
pub const BAD_REQUEST: u16 = 400;
/// 413 Content Too Large
pub const CONTENT_TOO_LARGE: u16 = 413;
/// 414 URI Too Long
pub const URI_TOO_LONG: u16 = 414;
/// 431 Request Header Fields Too Large
pub const REQUEST_HEADER_FIELDS_TOO_LARGE: u16 = 431;
/// 501 Not Implemented
pub const NOT_IMPLEMENTED: u16 = 501;
/// 505 HTTP Version Not Supported
pub const HTTP_VERSION_NOT_SUPPORTED: u16 = 505;

/// ステータスコードに対応する標準の reason-phrase
///
/// エラーレスポンス生成用。未知のコードは空文字列を返す。
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        BAD_REQUEST => "Bad Request",
        CONTENT_TOO_LARGE => "Content Too Large",
        URI_TOO_LONG => "URI Too Long",
        REQUEST_HEADER_FIELDS_TOO_LARGE => "Request Header Fields Too Large",
        NOT_IMPLEMENTED => "Not Implemented",
        HTTP_VERSION_NOT_SUPPORTED => "HTTP Version Not Supported",
        _ => "",
    }
}

/// ステータスコードが 100-599 の範囲にあるか
pub fn is_valid(code: u16) -> bool {
    (100..=599).contains(&code)
}

/// ステータスコードがボディを持ち得るか (RFC 9112 Section 6.3)
///
/// 1xx, 204, 304 はボディなし
pub(crate) fn allows_body(code: u16) -> bool {
    !((100..200).contains(&code) || code == 204 || code == 304)
}

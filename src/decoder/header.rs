//! ヘッダーブロックのデコード

use crate::classify::{is_field_value_byte, is_linear_whitespace, is_token_char};
use crate::error::Error;
use crate::header::HeaderMap;

use super::cursor::{Cursor, Step, ready};
use super::line::trim_linear_whitespace;
use super::primitive::{CrlfCheck, Limit, SkipWhile, UntilByte, UntilCrlf};

#[derive(Debug, Clone)]
enum HeaderState {
    /// 行頭。CRLF ならブロック終了
    LineStart(CrlfCheck),
    Name(UntilByte),
    BeforeValue(SkipWhile),
    Value(UntilCrlf),
    /// 次の行が継続行 (obs-fold) かを判定する
    Continuation,
    FoldWhitespace(SkipWhile),
    FoldValue(UntilCrlf),
}

/// ヘッダーブロックを空行まで読む
///
/// 継続行は 1 つの空白で連結する。
/// 行長の制限は名前と連結後の値を合わせた長さに適用する。
#[derive(Debug, Clone)]
pub(crate) struct HeaderBlockDecoder {
    state: HeaderState,
    headers: HeaderMap,
    name: String,
    value: String,
    count: usize,
    line_limit: Limit,
    max_count: usize,
}

impl HeaderBlockDecoder {
    pub fn new(line_limit: Limit, max_count: usize) -> Self {
        Self {
            state: HeaderState::LineStart(CrlfCheck),
            headers: HeaderMap::new(),
            name: String::new(),
            value: String::new(),
            count: 0,
            line_limit,
            max_count,
        }
    }

    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<HeaderMap>, Error> {
        loop {
            match &mut self.state {
                HeaderState::LineStart(check) => {
                    if ready!(check.advance(cur)?) {
                        return Ok(Step::Done(std::mem::take(&mut self.headers)));
                    }
                    self.count += 1;
                    if self.count > self.max_count {
                        return Err(Error::TooManyHeaders {
                            count: self.count,
                            limit: self.max_count,
                        });
                    }
                    self.state = HeaderState::Name(UntilByte::new(b':', self.line_limit));
                }
                HeaderState::Name(name) => {
                    let name = ready!(name.advance(cur)?);
                    if name.is_empty() || !name.iter().all(|&b| is_token_char(b)) {
                        return Err(Error::bad_request(format!(
                            "invalid header name: {:?}",
                            String::from_utf8_lossy(name)
                        )));
                    }
                    // トークン文字は ASCII のみ
                    self.name = String::from_utf8_lossy(name).into_owned();
                    self.state = HeaderState::BeforeValue(
                        SkipWhile::linear_whitespace().limited(self.used(1)),
                    );
                }
                HeaderState::BeforeValue(skip) => {
                    let skipped = ready!(skip.advance(cur)?);
                    self.state = HeaderState::Value(UntilCrlf::new(self.used(1 + skipped)));
                }
                HeaderState::Value(value) => {
                    let value = ready!(value.advance(cur)?);
                    self.value = field_value(value)?;
                    self.state = HeaderState::Continuation;
                }
                HeaderState::Continuation => {
                    let Some(b) = cur.peek() else {
                        return Ok(Step::Pending);
                    };
                    if is_linear_whitespace(b) {
                        self.state = HeaderState::FoldWhitespace(
                            SkipWhile::linear_whitespace().limited(self.used(1)),
                        );
                    } else {
                        self.commit();
                        self.state = HeaderState::LineStart(CrlfCheck);
                    }
                }
                HeaderState::FoldWhitespace(skip) => {
                    let skipped = ready!(skip.advance(cur)?);
                    self.state = HeaderState::FoldValue(UntilCrlf::new(self.used(1 + skipped)));
                }
                HeaderState::FoldValue(part) => {
                    let part = field_value(ready!(part.advance(cur)?))?;
                    if !part.is_empty() {
                        if !self.value.is_empty() {
                            self.value.push(' ');
                        }
                        self.value.push_str(&part);
                    }
                    self.state = HeaderState::Continuation;
                }
            }
        }
    }

    /// 名前と現在の値に `extra` を加えた長さを消費済みとした制限
    fn used(&self, extra: usize) -> Limit {
        self.line_limit
            .after(self.name.len() + self.value.len() + extra)
    }

    fn commit(&mut self) {
        let name = std::mem::take(&mut self.name);
        let value = std::mem::take(&mut self.value);
        self.headers.append_unchecked(name, value);
    }
}

/// フィールド値を検証し、前後の空白を除去する
fn field_value(bytes: &[u8]) -> Result<String, Error> {
    if let Some(&b) = bytes.iter().find(|&&b| !is_field_value_byte(b)) {
        return Err(Error::bad_request(format!(
            "invalid byte in header value: 0x{:02X}",
            b
        )));
    }
    Ok(String::from_utf8_lossy(trim_linear_whitespace(bytes)).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::primitive::LimitKind;

    fn decoder() -> HeaderBlockDecoder {
        HeaderBlockDecoder::new(Limit::new(64, LimitKind::HeaderLine), 10)
    }

    fn decode(input: &[u8]) -> Result<Step<HeaderMap>, Error> {
        decoder().advance(&mut Cursor::new(input))
    }

    fn done(input: &[u8]) -> HeaderMap {
        match decode(input).unwrap() {
            Step::Done(headers) => headers,
            Step::Pending => panic!("expected complete header block"),
        }
    }

    #[test]
    fn test_headers() {
        let headers = done(b"Host: example.com\r\nX-A:1\r\nx-a:  2 \r\n\r\n");
        assert_eq!(headers.get("host"), Some("example.com"));
        assert_eq!(headers.get_all("X-A"), &["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_empty_block() {
        assert!(done(b"\r\n").is_empty());
    }

    #[test]
    fn test_empty_value() {
        let headers = done(b"X-Empty:\r\n\r\n");
        assert_eq!(headers.get("X-Empty"), Some(""));
    }

    #[test]
    fn test_folding() {
        let headers = done(b"X-Long: first\r\n   second\r\n\tthird\r\nNext: n\r\n\r\n");
        assert_eq!(headers.get("X-Long"), Some("first second third"));
        assert_eq!(headers.get("Next"), Some("n"));
    }

    #[test]
    fn test_folding_blank_continuation() {
        let headers = done(b"X: a\r\n \r\n\r\n");
        assert_eq!(headers.get("X"), Some("a"));
    }

    #[test]
    fn test_pending_until_next_line_is_known() {
        // 継続行かどうかは次の行の先頭バイトが来るまで確定しない
        assert_eq!(decode(b"Host: x\r\n").unwrap(), Step::Pending);
    }

    #[test]
    fn test_split_feeding() {
        let input = b"A: 1\r\nB: two\r\n words\r\n\r\n";
        let mut dec = decoder();
        let mut buf = Vec::new();
        let mut result = None;
        for &b in input {
            buf.push(b);
            let mut cur = Cursor::new(&buf);
            let step = dec.advance(&mut cur).unwrap();
            let consumed = cur.position();
            buf.drain(..consumed);
            if let Step::Done(headers) = step {
                result = Some(headers);
            }
        }
        let headers = result.unwrap();
        assert_eq!(headers.get("A"), Some("1"));
        assert_eq!(headers.get("B"), Some("two words"));
    }

    #[test]
    fn test_invalid_name() {
        for input in [
            &b"Bad Name: x\r\n\r\n"[..],
            b"Name : x\r\n\r\n",
            b": x\r\n\r\n",
            b" leading: x\r\n\r\n",
            b"NoColon\r\n\r\n",
        ] {
            let err = decode(input).unwrap_err();
            assert_eq!(err.suggested_status(), 400, "{:?}", input);
        }
    }

    #[test]
    fn test_invalid_value() {
        let err = decode(b"X: a\x01b\r\n\r\n").unwrap_err();
        assert_eq!(err.suggested_status(), 400);
        let err = decode(b"X: a\rb\r\n\r\n").unwrap_err();
        assert_eq!(err.suggested_status(), 400);
    }

    #[test]
    fn test_too_many_headers() {
        let mut input = Vec::new();
        for i in 0..11 {
            input.extend_from_slice(format!("H{i}: v\r\n").as_bytes());
        }
        input.extend_from_slice(b"\r\n");
        assert_eq!(
            decode(&input).unwrap_err(),
            Error::TooManyHeaders {
                count: 11,
                limit: 10
            }
        );
    }

    #[test]
    fn test_line_limit_includes_name() {
        let mut dec = HeaderBlockDecoder::new(Limit::new(10, LimitKind::HeaderLine), 10);
        let err = dec
            .advance(&mut Cursor::new(b"Name: 1234567\r\n\r\n"))
            .unwrap_err();
        assert!(matches!(err, Error::HeaderLineTooLong { limit: 10, .. }));
        assert_eq!(err.suggested_status(), 431);
    }

    #[test]
    fn test_line_limit_applies_to_folded_value() {
        let mut dec = HeaderBlockDecoder::new(Limit::new(12, LimitKind::HeaderLine), 10);
        let err = dec
            .advance(&mut Cursor::new(b"N: 12345\r\n 678901\r\n\r\n"))
            .unwrap_err();
        assert!(matches!(err, Error::HeaderLineTooLong { .. }));
    }

    #[test]
    fn test_line_limit_applies_to_fold_whitespace() {
        let mut dec = HeaderBlockDecoder::new(Limit::new(16, LimitKind::HeaderLine), 10);
        let mut input = b"X: a\r\n".to_vec();
        input.extend(std::iter::repeat_n(b' ', 1024));
        let err = dec.advance(&mut Cursor::new(&input)).unwrap_err();
        assert!(matches!(err, Error::HeaderLineTooLong { limit: 16, .. }));
    }
}

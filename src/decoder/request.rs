//! HTTP リクエストデコーダー

use crate::cookie::parse_cookie_header;
use crate::error::Error;
use crate::header::HttpMessage;
use crate::limits::DecoderLimits;
use crate::log::debug;
use crate::request::Request;

use super::body::{BodyDecoder, request_body_kind};
use super::cursor::{Cursor, Step, ready};
use super::header::HeaderBlockDecoder;
use super::line::RequestLineDecoder;
use super::primitive::{CrlfCheck, Limit, LimitKind};
use super::stream::{DecodeState, EofOutcome, MessageMachine, StreamDecoder};

#[derive(Debug, Clone)]
enum Phase {
    Init,
    SkipEmptyLines(CrlfCheck),
    RequestLine(RequestLineDecoder),
    Headers(HeaderBlockDecoder),
    Body(BodyDecoder),
    Emitted,
}

/// リクエストのトップレベル状態機械
///
/// 組み立て中のリクエストは `message` が排他的に所有する
#[derive(Debug)]
pub(crate) struct RequestMachine {
    phase: Phase,
    message: Option<Request>,
    limits: DecoderLimits,
    parse_cookies: bool,
}

impl RequestMachine {
    fn new(limits: DecoderLimits) -> Self {
        Self {
            phase: Phase::Init,
            message: None,
            limits,
            parse_cookies: true,
        }
    }

    fn emit(&mut self) -> Result<Step<Request>, Error> {
        self.phase = Phase::Emitted;
        self.message
            .take()
            .map(Step::Done)
            .ok_or_else(|| Error::bad_request("missing request line"))
    }
}

impl MessageMachine for RequestMachine {
    type Message = Request;

    fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<Request>, Error> {
        loop {
            match &mut self.phase {
                Phase::Init => {
                    self.message = None;
                    self.phase = Phase::SkipEmptyLines(CrlfCheck);
                }
                Phase::SkipEmptyLines(check) => {
                    if !ready!(check.advance(cur)?) {
                        let limit = Limit::new(self.limits.max_start_line_size, LimitKind::StartLine);
                        self.phase = Phase::RequestLine(RequestLineDecoder::new(limit));
                    }
                }
                Phase::RequestLine(line) => {
                    let line = ready!(line.advance(cur)?);
                    let mut request = Request::new(line.method, line.target);
                    request.set_version(line.version);
                    self.message = Some(request);

                    let limit =
                        Limit::new(self.limits.max_header_line_size, LimitKind::HeaderLine);
                    self.phase = Phase::Headers(HeaderBlockDecoder::new(
                        limit,
                        self.limits.max_headers_count,
                    ));
                }
                Phase::Headers(block) => {
                    let mut headers = ready!(block.advance(cur)?);
                    let request = self
                        .message
                        .as_mut()
                        .ok_or_else(|| Error::bad_request("missing request line"))?;

                    if self.parse_cookies {
                        let values = headers.remove("Cookie");
                        if let Some((first, rest)) = values.split_first() {
                            // 2 つ目以降の Cookie ヘッダーは捨てる
                            if !rest.is_empty() {
                                debug!("dropped {} extra Cookie headers", rest.len());
                            }
                            request.set_cookies(parse_cookie_header(first).into_iter().collect());
                        }
                    }

                    let kind = request_body_kind(request.version(), &headers, &self.limits)?;
                    request.set_headers(headers);
                    match BodyDecoder::new(kind, &self.limits) {
                        Some(body) => self.phase = Phase::Body(body),
                        None => return self.emit(),
                    }
                }
                Phase::Body(body) => {
                    let data = ready!(body.advance(cur)?);
                    if let Some(request) = self.message.as_mut() {
                        request.set_body(data);
                    }
                    return self.emit();
                }
                Phase::Emitted => return Ok(Step::Pending),
            }
        }
    }

    fn state(&self) -> DecodeState {
        match &self.phase {
            Phase::Init => DecodeState::Init,
            Phase::SkipEmptyLines(_) => DecodeState::SkipEmptyLines,
            Phase::RequestLine(_) => DecodeState::StartLine,
            Phase::Headers(_) => DecodeState::Headers,
            Phase::Body(body) => DecodeState::Body(body.kind()),
            Phase::Emitted => DecodeState::Emitted,
        }
    }

    fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    fn init(&mut self) {
        self.phase = Phase::Init;
        self.message = None;
    }

    fn reset(&mut self) {
        self.init();
    }

    fn finish(&mut self) -> Option<Request> {
        // リクエストは接続終了で完了しない
        None
    }
}

/// HTTP リクエストデコーダー (Sans I/O)
///
/// サーバー側でクライアントからのリクエストをパースする際に使用する。
/// 1 つのインスタンスを接続ごとに使い回す。
///
/// ```rust
/// use shiguredo_http11_decoder::{HttpMessage, Method, RequestDecoder};
///
/// let mut decoder = RequestDecoder::new();
/// let requests = decoder
///     .feed(b"POST /submit?id=7 HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
///     .unwrap();
/// assert_eq!(requests.len(), 1);
/// assert_eq!(requests[0].method(), Method::Post);
/// assert_eq!(requests[0].path(), "/submit");
/// assert_eq!(requests[0].query_param("id"), Some("7"));
/// assert_eq!(requests[0].body(), b"hello");
/// ```
#[derive(Debug)]
pub struct RequestDecoder {
    inner: StreamDecoder<RequestMachine>,
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDecoder {
    /// デフォルトの制限でデコーダーを作成
    pub fn new() -> Self {
        Self::with_limits(DecoderLimits::default())
    }

    /// 制限付きでデコーダーを作成
    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            inner: StreamDecoder::new(RequestMachine::new(limits)),
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &DecoderLimits {
        &self.inner.machine().limits
    }

    /// Cookie ヘッダーを Cookie としてパースするか (デフォルト: true)
    ///
    /// 有効な場合、Cookie ヘッダーはヘッダーから取り除かれる。
    /// 複数ある場合は最初の 1 つだけをパースし、残りは捨てる。
    pub fn set_parse_cookies(&mut self, parse_cookies: bool) {
        self.inner.machine_mut().parse_cookies = parse_cookies;
    }

    pub fn parse_cookies(&self) -> bool {
        self.inner.machine().parse_cookies
    }

    /// データを投入し、完成したリクエストをすべて返す
    ///
    /// 不完全なリクエストのバイト列は次の呼び出しまで保持する。
    /// 1 度エラーを返したデコーダーは `reset()` まで同じエラーを返し続ける。
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Request>, Error> {
        self.inner.feed(data)
    }

    /// バッファ済みのデータから最大 1 つのリクエストをデコード
    pub fn decode(&mut self) -> Result<Option<Request>, Error> {
        self.inner.decode()
    }

    /// 接続終了を通知する
    ///
    /// デコード途中のリクエストがあれば `EofOutcome::Abandoned`、
    /// エラーで停止していれば `EofOutcome::Failed`
    pub fn mark_eof(&mut self) -> EofOutcome<Request> {
        self.inner.mark_eof()
    }

    /// 新しい接続のために初期化する (制限と設定は保持する)
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// 未消費のバイト列
    pub fn remaining(&self) -> &[u8] {
        self.inner.remaining()
    }

    /// デコード途中のリクエストがないか
    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    pub fn state(&self) -> DecodeState {
        self.inner.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::BodyKind;
    use crate::method::Method;
    use crate::version::Version;

    #[test]
    fn test_decode_simple_get() {
        let mut decoder = RequestDecoder::new();
        let requests = decoder
            .feed(b"GET /foo?a=1 HTTP/1.1\r\nHost: x\r\n\r\n")
            .unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.path(), "/foo");
        assert_eq!(request.query_param("a"), Some("1"));
        assert_eq!(request.version(), Version::Http11);
        assert_eq!(request.get_header("host"), Some("x"));
        assert!(request.body().is_empty());
        assert_eq!(decoder.state(), DecodeState::Emitted);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_state_transitions() {
        let mut decoder = RequestDecoder::new();
        assert_eq!(decoder.state(), DecodeState::Init);

        decoder.feed(b"\r\n").unwrap();
        assert_eq!(decoder.state(), DecodeState::SkipEmptyLines);

        decoder.feed(b"PUT / HT").unwrap();
        assert_eq!(decoder.state(), DecodeState::StartLine);

        decoder.feed(b"TP/1.1\r\nContent-Length: 3\r\n").unwrap();
        assert_eq!(decoder.state(), DecodeState::Headers);

        decoder.feed(b"\r\nab").unwrap();
        assert_eq!(
            decoder.state(),
            DecodeState::Body(BodyKind::ContentLength(3))
        );
        assert!(!decoder.is_idle());

        let requests = decoder.feed(b"c").unwrap();
        assert_eq!(requests[0].body(), b"abc");
        assert_eq!(decoder.state(), DecodeState::Emitted);
    }

    #[test]
    fn test_pipelined_requests() {
        let mut decoder = RequestDecoder::new();
        let requests = decoder
            .feed(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\nGET /c")
            .unwrap();
        let paths: Vec<_> = requests.iter().map(Request::path).collect();
        assert_eq!(paths, vec!["/a", "/b"]);
        assert_eq!(decoder.remaining(), b"GET /c");

        let requests = decoder.feed(b" HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(requests[0].path(), "/c");
    }

    #[test]
    fn test_decode_one_at_a_time() {
        let mut decoder = RequestDecoder::new();
        decoder.feed(b"").unwrap();
        assert!(decoder.decode().unwrap().is_none());
    }

    #[test]
    fn test_stray_empty_lines_are_skipped() {
        let mut decoder = RequestDecoder::new();
        let requests = decoder
            .feed(b"\r\n\r\nGET / HTTP/1.1\r\n\r\n\r\nGET /2 HTTP/1.1\r\n\r\n")
            .unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn test_cookie_header_is_parsed_and_removed() {
        let mut decoder = RequestDecoder::new();
        let requests = decoder
            .feed(b"GET / HTTP/1.1\r\nCookie: a=1; b=2\r\nCookie: c=3\r\n\r\n")
            .unwrap();
        let request = &requests[0];
        assert!(!request.has_header("Cookie"));
        assert_eq!(request.cookies().len(), 2);
        assert_eq!(request.cookies().get("a").map(|c| c.value()), Some("1"));
        assert!(request.cookies().get("c").is_none());
    }

    #[test]
    fn test_cookie_parsing_disabled() {
        let mut decoder = RequestDecoder::new();
        decoder.set_parse_cookies(false);
        assert!(!decoder.parse_cookies());
        let requests = decoder
            .feed(b"GET / HTTP/1.1\r\nCookie: a=1\r\n\r\n")
            .unwrap();
        assert!(requests[0].cookies().is_empty());
        assert_eq!(requests[0].get_header("Cookie"), Some("a=1"));
    }

    #[test]
    fn test_http10_ignores_transfer_encoding() {
        let mut decoder = RequestDecoder::new();
        let requests = decoder
            .feed(b"POST / HTTP/1.0\r\nTransfer-Encoding: gzip\r\nContent-Length: 2\r\n\r\nok")
            .unwrap();
        assert_eq!(requests[0].body(), b"ok");
        assert!(!requests[0].is_keep_alive());
    }

    #[test]
    fn test_error_is_sticky_until_reset() {
        let mut decoder = RequestDecoder::new();
        let err = decoder.feed(b"BREW / HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(err.suggested_status(), 501);
        assert_eq!(decoder.state(), DecodeState::Failed);
        assert_eq!(decoder.feed(b"GET / HTTP/1.1\r\n\r\n").unwrap_err(), err);
        assert_eq!(decoder.decode().unwrap_err(), err);

        decoder.reset();
        assert_eq!(decoder.state(), DecodeState::Init);
        assert_eq!(decoder.feed(b"GET / HTTP/1.1\r\n\r\n").unwrap().len(), 1);
    }

    #[test]
    fn test_error_after_complete_request_is_deferred() {
        let mut decoder = RequestDecoder::new();
        let requests = decoder
            .feed(b"GET / HTTP/1.1\r\n\r\nGET / HTTP/9.9\r\n\r\n")
            .unwrap();
        assert_eq!(requests.len(), 1);
        let err = decoder.feed(b"").unwrap_err();
        assert_eq!(err.suggested_status(), 505);
    }

    #[test]
    fn test_buffer_overflow() {
        let limits = DecoderLimits {
            max_buffer_size: 16,
            ..DecoderLimits::default()
        };
        let mut decoder = RequestDecoder::with_limits(limits);
        assert_eq!(decoder.limits().max_buffer_size, 16);
        let err = decoder.feed(b"GET /0123456789abcdefghij").unwrap_err();
        assert!(matches!(err, Error::BufferOverflow { limit: 16, .. }));
    }

    #[test]
    fn test_mark_eof() {
        let mut decoder = RequestDecoder::new();
        assert_eq!(decoder.mark_eof(), EofOutcome::Clean);

        decoder.feed(b"GET / HTTP/1.1").unwrap();
        assert_eq!(decoder.mark_eof(), EofOutcome::Abandoned);
        assert_eq!(decoder.state(), DecodeState::Init);
        assert!(decoder.remaining().is_empty());

        decoder.feed(b"GET / HTTP/1.1\r\n\r\n\r\n").unwrap();
        assert_eq!(decoder.mark_eof(), EofOutcome::Clean);

        let err = decoder.feed(b"BAD / HTTP/1.1\r\n").unwrap_err();
        assert_eq!(decoder.mark_eof(), EofOutcome::Failed(err));
        assert_eq!(decoder.state(), DecodeState::Init);
    }

    #[test]
    fn test_mark_eof_returns_deferred_error() {
        let mut decoder = RequestDecoder::new();
        let requests = decoder
            .feed(b"GET / HTTP/1.1\r\n\r\nBREW / HTTP/1.1\r\n\r\n")
            .unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(decoder.state(), DecodeState::Failed);

        let EofOutcome::Failed(err) = decoder.mark_eof() else {
            panic!("expected failure");
        };
        assert_eq!(err.suggested_status(), 501);
        assert_eq!(decoder.state(), DecodeState::Init);
    }

    #[test]
    fn test_buffer_overflow_after_message_discards_buffer() {
        let limits = DecoderLimits {
            max_buffer_size: 0,
            ..DecoderLimits::default()
        };
        let mut decoder = RequestDecoder::with_limits(limits);
        let requests = decoder.feed(b"GET / HTTP/1.1\r\n\r\nGET").unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(decoder.state(), DecodeState::Failed);
        assert!(decoder.remaining().is_empty());
        assert!(matches!(
            decoder.feed(b""),
            Err(Error::BufferOverflow { size: 3, limit: 0 })
        ));
    }

    #[test]
    fn test_failure_discards_buffer() {
        let mut decoder = RequestDecoder::new();
        decoder.feed(b"GET / HTTP/1.1\r\nBad Name: x\r\n\r\nGET").unwrap_err();
        assert!(decoder.remaining().is_empty());
    }

    #[test]
    fn test_chunked_request() {
        let mut decoder = RequestDecoder::new();
        let requests = decoder
            .feed(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nContent-Length: 99\r\n\r\n3\r\nabc\r\n0\r\n\r\n")
            .unwrap();
        assert_eq!(requests[0].body(), b"abc");
    }
}

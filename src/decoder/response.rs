//! HTTP レスポンスデコーダー

use crate::cookie::parse_set_cookie;
use crate::error::Error;
use crate::header::HttpMessage;
use crate::limits::DecoderLimits;
use crate::response::Response;

use super::body::{BodyDecoder, BodyKind, response_body_kind};
use super::cursor::{Cursor, Step, ready};
use super::header::HeaderBlockDecoder;
use super::line::StatusLineDecoder;
use super::primitive::{CrlfCheck, Limit, LimitKind};
use super::stream::{DecodeState, EofOutcome, MessageMachine, StreamDecoder};

#[derive(Debug, Clone)]
enum Phase {
    Init,
    SkipEmptyLines(CrlfCheck),
    StatusLine(StatusLineDecoder),
    Headers(HeaderBlockDecoder),
    Body(BodyDecoder),
    Emitted,
    /// 打ち切った close-delimited ボディの残り
    Discarding,
}

/// レスポンスのトップレベル状態機械
#[derive(Debug)]
pub(crate) struct ResponseMachine {
    phase: Phase,
    message: Option<Response>,
    limits: DecoderLimits,
    parse_cookies: bool,
    /// HEAD リクエストへのレスポンスかどうか
    expect_no_body: bool,
}

impl ResponseMachine {
    fn new(limits: DecoderLimits) -> Self {
        Self {
            phase: Phase::Init,
            message: None,
            limits,
            parse_cookies: true,
            expect_no_body: false,
        }
    }

    fn emit(&mut self) -> Result<Step<Response>, Error> {
        self.phase = Phase::Emitted;
        self.message
            .take()
            .map(Step::Done)
            .ok_or_else(|| Error::bad_request("missing status line"))
    }
}

impl MessageMachine for ResponseMachine {
    type Message = Response;

    fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<Response>, Error> {
        loop {
            match &mut self.phase {
                Phase::Init => {
                    self.message = None;
                    self.phase = Phase::SkipEmptyLines(CrlfCheck);
                }
                Phase::SkipEmptyLines(check) => {
                    if !ready!(check.advance(cur)?) {
                        let limit = Limit::new(self.limits.max_start_line_size, LimitKind::StartLine);
                        self.phase = Phase::StatusLine(StatusLineDecoder::new(limit));
                    }
                }
                Phase::StatusLine(line) => {
                    let line = ready!(line.advance(cur)?);
                    self.message = Some(Response::with_status(
                        line.version,
                        line.status_code,
                        &line.reason_phrase,
                    ));

                    let limit =
                        Limit::new(self.limits.max_header_line_size, LimitKind::HeaderLine);
                    self.phase = Phase::Headers(HeaderBlockDecoder::new(
                        limit,
                        self.limits.max_headers_count,
                    ));
                }
                Phase::Headers(block) => {
                    let headers = ready!(block.advance(cur)?);
                    let response = self
                        .message
                        .as_mut()
                        .ok_or_else(|| Error::bad_request("missing status line"))?;

                    if self.parse_cookies {
                        // Set-Cookie ヘッダーはそのまま残す
                        for value in headers.get_all("Set-Cookie") {
                            if let Some(cookie) = parse_set_cookie(value) {
                                response.add_cookie(cookie);
                            }
                        }
                    }

                    let kind = response_body_kind(
                        response.version(),
                        response.status_code(),
                        self.expect_no_body,
                        &headers,
                        &self.limits,
                    )?;
                    // 1xx の後には同じリクエストへの最終レスポンスが続く
                    if !response.is_informational() {
                        self.expect_no_body = false;
                    }
                    response.set_headers(headers);
                    match BodyDecoder::new(kind, &self.limits) {
                        Some(body) => self.phase = Phase::Body(body),
                        None => return self.emit(),
                    }
                }
                Phase::Body(body) => {
                    let kind = body.kind();
                    let data = ready!(body.advance(cur)?);
                    if let Some(response) = self.message.as_mut() {
                        response.set_body(data);
                    }
                    let step = self.emit()?;
                    // 上限で打ち切った close-delimited ボディ
                    if kind == BodyKind::CloseDelimited {
                        self.phase = Phase::Discarding;
                    }
                    return Ok(step);
                }
                Phase::Emitted => return Ok(Step::Pending),
                Phase::Discarding => {
                    cur.advance(cur.remaining().len());
                    return Ok(Step::Pending);
                }
            }
        }
    }

    fn state(&self) -> DecodeState {
        match &self.phase {
            Phase::Init => DecodeState::Init,
            Phase::SkipEmptyLines(_) => DecodeState::SkipEmptyLines,
            Phase::StatusLine(_) => DecodeState::StartLine,
            Phase::Headers(_) => DecodeState::Headers,
            Phase::Body(body) => DecodeState::Body(body.kind()),
            Phase::Emitted => DecodeState::Emitted,
            Phase::Discarding => DecodeState::Discarding,
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
        self.expect_no_body = false;
    }

    fn finish(&mut self) -> Option<Response> {
        let Phase::Body(body) = std::mem::replace(&mut self.phase, Phase::Init) else {
            return None;
        };
        let data = body.finish()?;
        let mut response = self.message.take()?;
        response.set_body(data);
        Some(response)
    }
}

/// HTTP レスポンスデコーダー (Sans I/O)
///
/// クライアント側でサーバーからのレスポンスをパースする際に使用する。
///
/// ```rust
/// use shiguredo_http11_decoder::{EofOutcome, HttpMessage, ResponseDecoder};
///
/// let mut decoder = ResponseDecoder::new();
/// let responses = decoder
///     .feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n")
///     .unwrap();
/// assert_eq!(responses[0].status_code(), 200);
/// assert_eq!(responses[0].body(), b"Wikipedia");
///
/// // 長さの指定がないレスポンスは接続終了で完了する
/// decoder.feed(b"HTTP/1.0 200 OK\r\n\r\nuntil close").unwrap();
/// assert!(decoder.is_close_delimited());
/// match decoder.mark_eof() {
///     EofOutcome::Complete(response) => assert_eq!(response.body(), b"until close"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug)]
pub struct ResponseDecoder {
    inner: StreamDecoder<ResponseMachine>,
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseDecoder {
    /// デフォルトの制限でデコーダーを作成
    pub fn new() -> Self {
        Self::with_limits(DecoderLimits::default())
    }

    /// 制限付きでデコーダーを作成
    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            inner: StreamDecoder::new(ResponseMachine::new(limits)),
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &DecoderLimits {
        &self.inner.machine().limits
    }

    /// Set-Cookie ヘッダーを Cookie としてパースするか (デフォルト: true)
    pub fn set_parse_cookies(&mut self, parse_cookies: bool) {
        self.inner.machine_mut().parse_cookies = parse_cookies;
    }

    pub fn parse_cookies(&self) -> bool {
        self.inner.machine().parse_cookies
    }

    /// HEAD リクエストへのレスポンスを期待するか設定
    ///
    /// true の場合、次の最終レスポンス (1xx 以外) はヘッダーに関わらずボディなし。
    /// 最終レスポンスのヘッダーを読んだ時点で false に戻る。
    pub fn set_expect_no_body(&mut self, expect_no_body: bool) {
        self.inner.machine_mut().expect_no_body = expect_no_body;
    }

    /// 接続終了までがボディのレスポンスを読んでいるか
    pub fn is_close_delimited(&self) -> bool {
        self.state() == DecodeState::Body(BodyKind::CloseDelimited)
    }

    /// データを投入し、完成したレスポンスをすべて返す
    ///
    /// 1 度エラーを返したデコーダーは `reset()` まで同じエラーを返し続ける。
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Response>, Error> {
        self.inner.feed(data)
    }

    /// バッファ済みのデータから最大 1 つのレスポンスをデコード
    pub fn decode(&mut self) -> Result<Option<Response>, Error> {
        self.inner.decode()
    }

    /// 接続終了を通知する
    ///
    /// close-delimited ボディを読んでいれば `EofOutcome::Complete`
    pub fn mark_eof(&mut self) -> EofOutcome<Response> {
        self.inner.mark_eof()
    }

    /// 新しい接続のために初期化する (制限と Cookie 設定は保持する)
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// 未消費のバイト列
    pub fn remaining(&self) -> &[u8] {
        self.inner.remaining()
    }

    /// デコード途中のレスポンスがないか
    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    pub fn state(&self) -> DecodeState {
        self.inner.state()
    }
}

//! スタートライン (request-line / status-line) のデコード

use crate::classify::{is_field_value_byte, is_linear_whitespace, is_token_char};
use crate::error::Error;
use crate::method::Method;
use crate::uri::{Uri, is_valid_request_target};
use crate::version::Version;

use super::cursor::{Cursor, Step, ready};
use super::primitive::{CrlfCheck, Limit, SkipWhile, UntilCrlf, UntilDelimiter};
use super::version::VersionDecoder;

/// request-line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestLine {
    pub method: Method,
    pub target: Uri,
    pub version: Version,
}

#[derive(Debug, Clone)]
enum RequestLineState {
    Method(UntilDelimiter),
    AfterMethod(SkipWhile),
    Target(UntilDelimiter),
    AfterTarget(SkipWhile),
    Version(VersionDecoder),
    AfterVersion(SkipWhile),
    End(CrlfCheck),
}

/// `Method SP Request-URI SP HTTP-Version CRLF` を読む
///
/// トークン間の空白は SP / HTAB の並びを許容する。
#[derive(Debug, Clone)]
pub(crate) struct RequestLineDecoder {
    state: RequestLineState,
    limit: Limit,
    method: Option<Method>,
    target: Option<Uri>,
    version: Option<Version>,
}

impl RequestLineDecoder {
    pub fn new(limit: Limit) -> Self {
        Self {
            state: RequestLineState::Method(UntilDelimiter::linear_whitespace(limit)),
            limit,
            method: None,
            target: None,
            version: None,
        }
    }

    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<RequestLine>, Error> {
        loop {
            match &mut self.state {
                RequestLineState::Method(token) => {
                    let (token, _) = ready!(token.advance(cur)?);
                    self.method = Some(parse_method(token)?);
                    self.state = RequestLineState::AfterMethod(self.skip());
                }
                RequestLineState::AfterMethod(skip) => {
                    ready!(skip.advance(cur)?);
                    self.state =
                        RequestLineState::Target(UntilDelimiter::linear_whitespace(self.limit));
                }
                RequestLineState::Target(token) => {
                    let (token, _) = ready!(token.advance(cur)?);
                    self.target = Some(parse_target(self.method, token)?);
                    self.state = RequestLineState::AfterTarget(self.skip());
                }
                RequestLineState::AfterTarget(skip) => {
                    ready!(skip.advance(cur)?);
                    self.state = RequestLineState::Version(VersionDecoder::new(self.limit));
                }
                RequestLineState::Version(version) => {
                    self.version = Some(ready!(version.advance(cur)?));
                    self.state = RequestLineState::AfterVersion(self.skip());
                }
                RequestLineState::AfterVersion(skip) => {
                    ready!(skip.advance(cur)?);
                    self.state = RequestLineState::End(CrlfCheck);
                }
                RequestLineState::End(check) => {
                    if !ready!(check.advance(cur)?) {
                        return Err(Error::bad_request("expected CRLF after HTTP version"));
                    }
                    let (Some(method), Some(target), Some(version)) =
                        (self.method, self.target.take(), self.version)
                    else {
                        return Err(Error::bad_request("incomplete request line"));
                    };
                    return Ok(Step::Done(RequestLine {
                        method,
                        target,
                        version,
                    }));
                }
            }
        }
    }

    fn skip(&self) -> SkipWhile {
        SkipWhile::linear_whitespace().limited(self.limit)
    }
}

fn parse_method(token: &[u8]) -> Result<Method, Error> {
    if token.is_empty() || !token.iter().all(|&b| is_token_char(b)) {
        return Err(Error::bad_request("invalid method token"));
    }
    Method::from_bytes(token).ok_or_else(|| {
        Error::not_implemented(format!(
            "unsupported method: {}",
            String::from_utf8_lossy(token)
        ))
    })
}

/// request-target を検証して URI としてパースする
///
/// CONNECT は authority-form として扱う
fn parse_target(method: Option<Method>, token: &[u8]) -> Result<Uri, Error> {
    if !is_valid_request_target(token) {
        return Err(Error::bad_request("invalid request-target"));
    }
    let target = std::str::from_utf8(token)
        .map_err(|_| Error::bad_request("request-target is not valid UTF-8"))?;
    let parsed = if method == Some(Method::Connect) {
        Uri::parse_authority_form(target)
    } else {
        Uri::parse(target)
    };
    parsed.map_err(|e| Error::bad_request(format!("invalid request-target: {e}")))
}

/// status-line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusLine {
    pub version: Version,
    pub status_code: u16,
    pub reason_phrase: String,
}

#[derive(Debug, Clone)]
enum StatusLineState {
    Version(VersionDecoder),
    AfterVersion(SkipWhile),
    StatusCode(UntilDelimiter),
    AfterStatusCode(SkipWhile),
    Reason(UntilCrlf),
}

/// `HTTP-Version SP Status-Code SP Reason-Phrase CRLF` を読む
///
/// reason-phrase は省略可能で、前後の空白を除去する。
#[derive(Debug, Clone)]
pub(crate) struct StatusLineDecoder {
    state: StatusLineState,
    limit: Limit,
    version: Option<Version>,
    status_code: Option<u16>,
}

impl StatusLineDecoder {
    pub fn new(limit: Limit) -> Self {
        Self {
            state: StatusLineState::Version(VersionDecoder::new(limit)),
            limit,
            version: None,
            status_code: None,
        }
    }

    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<StatusLine>, Error> {
        loop {
            match &mut self.state {
                StatusLineState::Version(version) => {
                    self.version = Some(ready!(version.advance(cur)?));
                    self.state = StatusLineState::AfterVersion(self.skip());
                }
                StatusLineState::AfterVersion(skip) => {
                    ready!(skip.advance(cur)?);
                    self.state = StatusLineState::StatusCode(UntilDelimiter::whitespace(self.limit));
                }
                StatusLineState::StatusCode(token) => {
                    let (token, _) = ready!(token.advance(cur)?);
                    self.status_code = Some(parse_status_code(token)?);
                    self.state = StatusLineState::AfterStatusCode(self.skip());
                }
                StatusLineState::AfterStatusCode(skip) => {
                    ready!(skip.advance(cur)?);
                    self.state = StatusLineState::Reason(UntilCrlf::new(self.limit));
                }
                StatusLineState::Reason(reason) => {
                    let reason = trim_linear_whitespace(ready!(reason.advance(cur)?));
                    if !reason.iter().all(|&b| is_field_value_byte(b)) {
                        return Err(Error::bad_request("invalid reason phrase"));
                    }
                    let (Some(version), Some(status_code)) = (self.version, self.status_code)
                    else {
                        return Err(Error::bad_request("incomplete status line"));
                    };
                    return Ok(Step::Done(StatusLine {
                        version,
                        status_code,
                        reason_phrase: String::from_utf8_lossy(reason).into_owned(),
                    }));
                }
            }
        }
    }

    fn skip(&self) -> SkipWhile {
        SkipWhile::linear_whitespace().limited(self.limit)
    }
}

/// 3 桁の 10 進数で 100-599 の範囲
fn parse_status_code(token: &[u8]) -> Result<u16, Error> {
    let bad = || {
        Error::bad_request(format!(
            "Bad status code: {:?}",
            String::from_utf8_lossy(token)
        ))
    };
    if token.len() != 3 || !token.iter().all(u8::is_ascii_digit) {
        return Err(bad());
    }
    let code = token
        .iter()
        .fold(0u16, |acc, &b| acc * 10 + u16::from(b - b'0'));
    if !crate::status::is_valid(code) {
        return Err(bad());
    }
    Ok(code)
}

/// 前後の SP / HTAB を除去
pub(crate) fn trim_linear_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !is_linear_whitespace(b))
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|&b| !is_linear_whitespace(b))
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}

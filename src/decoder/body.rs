//! ボディ種別の決定とボディデコーダー

use crate::error::Error;
use crate::header::HeaderMap;
use crate::limits::{CloseDelimitedOverflow, DecoderLimits};
use crate::log::warning;
use crate::status;
use crate::version::Version;

use super::chunked::ChunkedDecoder;
use super::cursor::{Cursor, Step, ready};
use super::primitive::{FixedLength, UntilDisconnect};

/// ボディの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Content-Length で指定された固定長
    ContentLength(usize),
    /// Transfer-Encoding: chunked
    Chunked,
    /// 接続が閉じるまでがボディ (close-delimited)
    ///
    /// レスポンスで Transfer-Encoding も Content-Length もない場合、
    /// 接続が閉じられるまでをボディとして扱う
    CloseDelimited,
    /// ボディなし
    None,
}

/// ボディデコーダー
///
/// RequestDecoder と ResponseDecoder で共有する
#[derive(Debug, Clone)]
pub(crate) enum BodyDecoder {
    Fixed {
        length: usize,
        data: FixedLength,
    },
    Chunked(ChunkedDecoder),
    UntilDisconnect {
        data: UntilDisconnect,
        limit: usize,
        overflow: CloseDelimitedOverflow,
    },
}

impl BodyDecoder {
    /// ボディを読む必要がなければ `None`
    pub fn new(kind: BodyKind, limits: &DecoderLimits) -> Option<Self> {
        match kind {
            BodyKind::None | BodyKind::ContentLength(0) => None,
            BodyKind::ContentLength(length) => Some(BodyDecoder::Fixed {
                length,
                data: FixedLength::new(length),
            }),
            BodyKind::Chunked => Some(BodyDecoder::Chunked(ChunkedDecoder::new(limits))),
            BodyKind::CloseDelimited => {
                let limit = limits.max_close_delimited_body_size;
                let overflow = limits.close_delimited_overflow;
                // Reject は上限を 1 バイト超えた時点で検出する
                let cap = match overflow {
                    CloseDelimitedOverflow::Truncate => limit,
                    CloseDelimitedOverflow::Reject => limit.saturating_add(1),
                };
                Some(BodyDecoder::UntilDisconnect {
                    data: UntilDisconnect::new(cap),
                    limit,
                    overflow,
                })
            }
        }
    }

    pub fn kind(&self) -> BodyKind {
        match self {
            BodyDecoder::Fixed { length, .. } => BodyKind::ContentLength(*length),
            BodyDecoder::Chunked(_) => BodyKind::Chunked,
            BodyDecoder::UntilDisconnect { .. } => BodyKind::CloseDelimited,
        }
    }

    /// close-delimited ボディは上限に達したときだけ完了する
    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<Vec<u8>>, Error> {
        match self {
            BodyDecoder::Fixed { data, .. } => Ok(data.advance(cur)),
            BodyDecoder::Chunked(chunked) => chunked.advance(cur),
            BodyDecoder::UntilDisconnect {
                data,
                limit,
                overflow,
            } => {
                let body = ready!(data.advance(cur));
                match overflow {
                    CloseDelimitedOverflow::Truncate => {
                        warning!("close-delimited body truncated at {} bytes", limit);
                        Ok(Step::Done(body))
                    }
                    CloseDelimitedOverflow::Reject => Err(Error::ResourceExhausted {
                        size: body.len(),
                        limit: *limit,
                    }),
                }
            }
        }
    }

    /// 接続終了で close-delimited ボディを確定する
    pub fn finish(self) -> Option<Vec<u8>> {
        match self {
            BodyDecoder::UntilDisconnect { data, .. } => Some(data.finish()),
            BodyDecoder::Fixed { .. } | BodyDecoder::Chunked(_) => None,
        }
    }
}

/// リクエストのボディ種別を決定
///
/// 長さの指定がなければボディなし
pub(crate) fn request_body_kind(
    version: Version,
    headers: &HeaderMap,
    limits: &DecoderLimits,
) -> Result<BodyKind, Error> {
    Ok(framing(version, headers, limits)?.unwrap_or(BodyKind::None))
}

/// レスポンスのボディ種別を決定
///
/// 1xx / 204 / 304 と HEAD へのレスポンスはボディなし。
/// 長さの指定がなければ close-delimited
pub(crate) fn response_body_kind(
    version: Version,
    status_code: u16,
    expect_no_body: bool,
    headers: &HeaderMap,
    limits: &DecoderLimits,
) -> Result<BodyKind, Error> {
    if expect_no_body || !status::allows_body(status_code) {
        return Ok(BodyKind::None);
    }
    Ok(framing(version, headers, limits)?.unwrap_or(BodyKind::CloseDelimited))
}

/// Transfer-Encoding と Content-Length からボディ種別を決定
///
/// Transfer-Encoding は HTTP/1.1 のときだけ参照し、Content-Length より優先する
fn framing(
    version: Version,
    headers: &HeaderMap,
    limits: &DecoderLimits,
) -> Result<Option<BodyKind>, Error> {
    if version == Version::Http11 {
        let codings = headers.get_all("Transfer-Encoding");
        if !codings.is_empty() {
            let value = codings.join(", ");
            let coding = value.split(';').next().unwrap_or(&value).trim();
            if coding.eq_ignore_ascii_case("chunked") {
                return Ok(Some(BodyKind::Chunked));
            }
            return Err(Error::not_implemented(format!(
                "Unknown transfer coding {}",
                value
            )));
        }
    }

    match parse_content_length(headers, limits.max_body_size)? {
        Some(0) => Ok(Some(BodyKind::None)),
        Some(length) => Ok(Some(BodyKind::ContentLength(length))),
        None => Ok(None),
    }
}

/// Content-Length ヘッダーを解析
///
/// 複数の値 (複数ヘッダー / カンマ区切り) はすべて一致しなければならない
fn parse_content_length(headers: &HeaderMap, max_body_size: usize) -> Result<Option<usize>, Error> {
    let mut value: Option<usize> = None;
    for raw in headers.get_all("Content-Length") {
        for item in raw.split(',') {
            let parsed = parse_content_length_value(item, max_body_size)?;
            if value.is_some_and(|prev| prev != parsed) {
                return Err(Error::bad_request(
                    "invalid Content-Length: mismatched values",
                ));
            }
            value = Some(parsed);
        }
    }
    Ok(value)
}

fn parse_content_length_value(input: &str, max_body_size: usize) -> Result<usize, Error> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::bad_request(format!(
            "invalid Content-Length: {:?}",
            input
        )));
    }
    let too_large = |size| Error::BodyTooLarge {
        size,
        limit: max_body_size,
    };
    let length = input.parse::<usize>().map_err(|_| too_large(usize::MAX))?;
    if length > max_body_size {
        return Err(too_large(length));
    }
    Ok(length)
}

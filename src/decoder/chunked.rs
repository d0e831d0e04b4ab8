//! chunked ボディのデコード (RFC 9112 Section 7.1)
//!
//! トレーラーは読み飛ばし、メッセージには反映しない。

use crate::classify::{hex_value, is_hex_digit};
use crate::error::Error;
use crate::limits::DecoderLimits;

use super::cursor::{Cursor, Step, ready};
use super::primitive::{
    CrlfCheck, FixedLength, Limit, LimitKind, Scan, SkipWhile, UntilCrlf, UntilDelimiter,
};

/// 受け付けるチャンクサイズの上限 (63 bit)
const MAX_CHUNK_SIZE: u64 = i64::MAX as u64;

#[derive(Debug, Clone)]
enum ChunkedState {
    ReadChunkLength(UntilDelimiter),
    SkipChunkExtension(SkipWhile),
    AfterExtension(CrlfCheck),
    ChunkData(FixedLength),
    AfterChunkData(CrlfCheck),
    FindEndOfTrailer(CrlfCheck),
    SkipEntityHeader(UntilCrlf),
}

/// chunked ボディを終端チャンクとトレーラーの後の空行まで読む
///
/// 完了時に全チャンクを到着順に連結したボディを返す。
#[derive(Debug, Clone)]
pub(crate) struct ChunkedDecoder {
    state: ChunkedState,
    chunks: Vec<Vec<u8>>,
    total: usize,
    last_chunk_length: u64,
    has_extension: bool,
    trailer_count: usize,
    chunk_line_limit: Limit,
    trailer_line_limit: Limit,
    max_trailers: usize,
    max_body_size: usize,
}

impl ChunkedDecoder {
    pub fn new(limits: &DecoderLimits) -> Self {
        let chunk_line_limit = Limit::new(limits.max_chunk_line_size, LimitKind::ChunkLine);
        Self {
            state: read_chunk_length(chunk_line_limit),
            chunks: Vec::new(),
            total: 0,
            last_chunk_length: 0,
            has_extension: false,
            trailer_count: 0,
            chunk_line_limit,
            trailer_line_limit: Limit::new(limits.max_header_line_size, LimitKind::HeaderLine),
            max_trailers: limits.max_headers_count,
            max_body_size: limits.max_body_size,
        }
    }

    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<Vec<u8>>, Error> {
        loop {
            match &mut self.state {
                ChunkedState::ReadChunkLength(token) => {
                    let (token, terminator) = ready!(token.advance(cur)?);
                    self.last_chunk_length = parse_chunk_size(token)?;
                    self.has_extension = terminator == b';';
                    if self.has_extension {
                        cur.advance(1);
                        let skip = SkipWhile::new(|b| b != b'\r' && b != b'\n')
                            .limited(self.chunk_line_limit.after(token.len() + 1));
                        self.state = ChunkedState::SkipChunkExtension(skip);
                    } else {
                        self.state = ChunkedState::AfterExtension(CrlfCheck);
                    }
                }
                ChunkedState::SkipChunkExtension(skip) => {
                    ready!(skip.advance(cur)?);
                    self.state = ChunkedState::AfterExtension(CrlfCheck);
                }
                ChunkedState::AfterExtension(check) => {
                    if !ready!(check.advance(cur)?) {
                        return Err(Error::bad_request("expected CRLF after chunk size"));
                    }
                    if self.last_chunk_length == 0 {
                        self.state = ChunkedState::FindEndOfTrailer(CrlfCheck);
                        continue;
                    }
                    let size = self.reserve(self.last_chunk_length)?;
                    self.last_chunk_length = 0;
                    self.state = ChunkedState::ChunkData(FixedLength::new(size));
                }
                ChunkedState::ChunkData(data) => {
                    let chunk = ready!(data.advance(cur));
                    self.chunks.push(chunk);
                    self.state = ChunkedState::AfterChunkData(CrlfCheck);
                }
                ChunkedState::AfterChunkData(check) => {
                    if !ready!(check.advance(cur)?) {
                        return Err(Error::bad_request("Expected CRLF after chunk data"));
                    }
                    self.has_extension = false;
                    self.state = read_chunk_length(self.chunk_line_limit);
                }
                ChunkedState::FindEndOfTrailer(check) => {
                    if ready!(check.advance(cur)?) {
                        return Ok(Step::Done(self.take_body()));
                    }
                    self.trailer_count += 1;
                    if self.trailer_count > self.max_trailers {
                        return Err(Error::TooManyHeaders {
                            count: self.trailer_count,
                            limit: self.max_trailers,
                        });
                    }
                    self.state =
                        ChunkedState::SkipEntityHeader(UntilCrlf::new(self.trailer_line_limit));
                }
                ChunkedState::SkipEntityHeader(line) => {
                    ready!(line.advance(cur)?);
                    self.state = ChunkedState::FindEndOfTrailer(CrlfCheck);
                }
            }
        }
    }

    /// 累計サイズを検査して、チャンクサイズを返す
    fn reserve(&mut self, size: u64) -> Result<usize, Error> {
        let too_large = |size| Error::BodyTooLarge {
            size,
            limit: self.max_body_size,
        };
        let size = usize::try_from(size).map_err(|_| too_large(usize::MAX))?;
        let total = self
            .total
            .checked_add(size)
            .ok_or_else(|| too_large(usize::MAX))?;
        if total > self.max_body_size {
            return Err(too_large(total));
        }
        self.total = total;
        Ok(size)
    }

    /// チャンクが 1 つならコピーせずに返す
    fn take_body(&mut self) -> Vec<u8> {
        let mut chunks = std::mem::take(&mut self.chunks);
        if chunks.len() == 1 {
            return chunks.pop().unwrap_or_default();
        }
        chunks.concat()
    }
}

fn read_chunk_length(limit: Limit) -> ChunkedState {
    ChunkedState::ReadChunkLength(UntilDelimiter::new(
        scan_chunk_size,
        "invalid byte in chunk size",
        limit,
    ))
}

fn scan_chunk_size(b: u8) -> Scan {
    match b {
        b'\r' | b';' => Scan::Stop,
        _ if is_hex_digit(b) => Scan::Continue,
        _ => Scan::Reject,
    }
}

fn parse_chunk_size(token: &[u8]) -> Result<u64, Error> {
    if token.is_empty() {
        return Err(Error::bad_request("missing chunk size"));
    }
    let mut size: u64 = 0;
    for &b in token {
        let digit = hex_value(b).ok_or_else(|| Error::bad_request("invalid chunk size"))?;
        size = size
            .checked_mul(16)
            .and_then(|s| s.checked_add(u64::from(digit)))
            .filter(|&s| s <= MAX_CHUNK_SIZE)
            .ok_or_else(|| Error::bad_request("chunk size too large"))?;
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Result<Step<Vec<u8>>, Error> {
        ChunkedDecoder::new(&DecoderLimits::default()).advance(&mut Cursor::new(input))
    }

    #[test]
    fn test_chunked() {
        assert_eq!(
            decode(b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n").unwrap(),
            Step::Done(b"Wikipedia".to_vec())
        );
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(decode(b"0\r\n\r\n").unwrap(), Step::Done(Vec::new()));
        assert_eq!(decode(b"000\r\n\r\n").unwrap(), Step::Done(Vec::new()));
    }

    #[test]
    fn test_uppercase_hex() {
        let mut input = b"A\r\n".to_vec();
        input.extend_from_slice(&[b'x'; 10]);
        input.extend_from_slice(b"\r\n0\r\n\r\n");
        assert_eq!(decode(&input).unwrap(), Step::Done(vec![b'x'; 10]));
    }

    #[test]
    fn test_extension_is_skipped() {
        assert_eq!(
            decode(b"3;name=value\r\nabc\r\n0;last\r\n\r\n").unwrap(),
            Step::Done(b"abc".to_vec())
        );
    }

    #[test]
    fn test_trailers_are_skipped() {
        assert_eq!(
            decode(b"1\r\nx\r\n0\r\nExpires: never\r\nX-Sum: 1\r\n\r\n").unwrap(),
            Step::Done(b"x".to_vec())
        );
    }

    #[test]
    fn test_pending_until_final_crlf() {
        assert_eq!(decode(b"1\r\nx\r\n0\r\n").unwrap(), Step::Pending);
    }

    #[test]
    fn test_invalid_chunk_size() {
        for input in [
            &b"zz\r\n"[..],
            b"\r\n",
            b"4 \r\nWiki\r\n",
            b"-1\r\n",
            b"4\nWiki",
        ] {
            let err = decode(input).unwrap_err();
            assert_eq!(err.suggested_status(), 400, "{:?}", input);
        }
    }

    #[test]
    fn test_missing_crlf_after_data() {
        assert_eq!(
            decode(b"4\r\nWikiX\r\n").unwrap_err(),
            Error::bad_request("Expected CRLF after chunk data")
        );
    }

    #[test]
    fn test_chunk_size_overflow() {
        let err = decode(b"8000000000000000\r\n").unwrap_err();
        assert_eq!(err, Error::bad_request("chunk size too large"));
        let err = decode(b"fffffffffffffffffff\r\n").unwrap_err();
        assert!(matches!(err, Error::ChunkLineTooLong { .. } | Error::Protocol { .. }));
    }

    #[test]
    fn test_body_too_large() {
        let limits = DecoderLimits {
            max_body_size: 5,
            ..DecoderLimits::default()
        };
        let mut dec = ChunkedDecoder::new(&limits);
        let err = dec
            .advance(&mut Cursor::new(b"3\r\nabc\r\n3\r\n"))
            .unwrap_err();
        assert_eq!(err, Error::BodyTooLarge { size: 6, limit: 5 });
    }

    #[test]
    fn test_chunk_line_too_long() {
        let limits = DecoderLimits {
            max_chunk_line_size: 8,
            ..DecoderLimits::default()
        };
        let err = ChunkedDecoder::new(&limits)
            .advance(&mut Cursor::new(b"1;a-long-extension\r\n"))
            .unwrap_err();
        assert!(matches!(err, Error::ChunkLineTooLong { limit: 8, .. }));
    }

    #[test]
    fn test_too_many_trailers() {
        let limits = DecoderLimits {
            max_headers_count: 1,
            ..DecoderLimits::default()
        };
        let err = ChunkedDecoder::new(&limits)
            .advance(&mut Cursor::new(b"0\r\nA: 1\r\nB: 2\r\n\r\n"))
            .unwrap_err();
        assert_eq!(err, Error::TooManyHeaders { count: 2, limit: 1 });
    }

    #[test]
    fn test_byte_by_byte() {
        let input = b"4;x\r\nWiki\r\n5\r\npedia\r\n0\r\nT: 1\r\n\r\n";
        let mut dec = ChunkedDecoder::new(&DecoderLimits::default());
        let mut buf = Vec::new();
        let mut body = None;
        for &b in input {
            assert!(body.is_none());
            buf.push(b);
            let mut cur = Cursor::new(&buf);
            let step = dec.advance(&mut cur).unwrap();
            let consumed = cur.position();
            buf.drain(..consumed);
            if let Step::Done(data) = step {
                body = Some(data);
            }
        }
        assert_eq!(body, Some(b"Wikipedia".to_vec()));
    }
}

//! request-target の検証とパース
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http11_decoder::uri::Uri;
//!
//! let uri = Uri::parse("https://example.com:8080/path?query=value").unwrap();
//! assert_eq!(uri.scheme(), Some("https"));
//! assert_eq!(uri.host(), Some("example.com"));
//! assert_eq!(uri.port(), Some(8080));
//! assert_eq!(uri.path(), "/path");
//! assert_eq!(uri.query(), Some("query=value"));
//! ```

use core::fmt;
use core::ops::Range;

use crate::classify::{hex_value, is_hex_digit};

/// URI パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// 空の URI
    Empty,
    /// 不正なポート番号
    InvalidPort,
    /// 不正なスキーム
    InvalidScheme,
    /// 不正なホスト
    InvalidHost,
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriError::Empty => write!(f, "empty URI"),
            UriError::InvalidPort => write!(f, "invalid port"),
            UriError::InvalidScheme => write!(f, "invalid scheme"),
            UriError::InvalidHost => write!(f, "invalid host"),
        }
    }
}

impl std::error::Error for UriError {}

/// フォーム形式 (`application/x-www-form-urlencoded`) の成分をデコード
///
/// `+` は空白になる。不正なエスケープはそのまま残し、
/// 不正な UTF-8 は U+FFFD に置き換える。
pub fn decode_form_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let escaped = bytes
                    .get(i + 1)
                    .and_then(|&h| hex_value(h))
                    .zip(bytes.get(i + 2).and_then(|&l| hex_value(l)));
                if let Some((high, low)) = escaped {
                    out.push((high << 4) | low);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// request-target に現れてはならない ASCII 文字
///
/// RFC 3986 が除外する文字に、フラグメント区切りの `#` を加えたもの
const EXCLUDED: &[u8] = b"\"#<>\\^`{|}";

/// リクエストターゲットが有効か確認
///
/// 次のいずれかを含む場合は無効:
///
/// - 制御文字と空白 (0x00-0x20, 0x7F)
/// - `" # < > \ ^ ` { | }`
/// - 16 進数字 2 桁が続かない `%` と、NUL を表す `%00`
///
/// 0x80 以上のバイトは、全体が UTF-8 として正しい場合だけ許可する
pub fn is_valid_request_target(target: &[u8]) -> bool {
    if target.is_empty() || std::str::from_utf8(target).is_err() {
        return false;
    }

    let mut bytes = target.iter().copied();
    while let Some(b) = bytes.next() {
        match b {
            b'%' => {
                let (Some(high), Some(low)) = (bytes.next(), bytes.next()) else {
                    return false;
                };
                if !is_hex_digit(high) || !is_hex_digit(low) || (high, low) == (b'0', b'0') {
                    return false;
                }
            }
            _ if b <= b' ' || b == 0x7F || EXCLUDED.contains(&b) => return false,
            _ => {}
        }
    }
    true
}

/// authority 成分の位置とポート番号
#[derive(Debug, Clone, PartialEq, Eq)]
struct Authority {
    range: Range<usize>,
    host: Range<usize>,
    port: Option<u16>,
}

impl Authority {
    /// `source[range]` を `[userinfo@]host[:port]` として読む
    fn parse(source: &str, range: Range<usize>) -> Result<Self, UriError> {
        let text = &source[range.clone()];
        let host_start = text.rfind('@').map_or(0, |at| at + 1);
        let (host_len, port) = split_port(&text[host_start..])?;
        let host = range.start + host_start..range.start + host_start + host_len;
        Ok(Self { range, host, port })
    }
}

/// `host[:port]` のホスト部分の長さとポート番号
///
/// IPv6 リテラル (`[...]`) の中の `:` は区切りとして扱わない
fn split_port(host_port: &str) -> Result<(usize, Option<u16>), UriError> {
    let host_len = if host_port.starts_with('[') {
        host_port.find(']').ok_or(UriError::InvalidHost)? + 1
    } else {
        host_port.rfind(':').unwrap_or(host_port.len())
    };

    let rest = &host_port[host_len..];
    if rest.is_empty() {
        return Ok((host_len, None));
    }
    let port = rest.strip_prefix(':').ok_or(UriError::InvalidHost)?;
    if port.is_empty() {
        return Ok((host_len, None));
    }
    let port = port.parse().map_err(|_| UriError::InvalidPort)?;
    Ok((host_len, Some(port)))
}

/// スキームの長さ
///
/// `:` の前がスキームの文字だけで構成されていなければ `None`
fn scheme_len(input: &str) -> Result<Option<usize>, UriError> {
    let Some(colon) = input.find(':') else {
        return Ok(None);
    };
    let name = &input[..colon];
    let is_scheme_char = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.');
    if name.is_empty() || !name.bytes().all(is_scheme_char) {
        return Ok(None);
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(UriError::InvalidScheme);
    }
    Ok(Some(colon))
}

/// パース済みの request-target
///
/// 元の文字列と各成分の位置だけを保持する。
/// `#` 以降はどの成分にも含めない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    source: String,
    scheme: Option<usize>,
    authority: Option<Authority>,
    path: Range<usize>,
    query: Option<Range<usize>>,
}

impl Uri {
    /// origin-form / absolute-form / asterisk-form をパース
    ///
    /// ```rust
    /// use shiguredo_http11_decoder::uri::Uri;
    ///
    /// let uri = Uri::parse("/search?q=rust").unwrap();
    /// assert_eq!(uri.path(), "/search");
    /// assert_eq!(uri.query(), Some("q=rust"));
    /// assert!(!uri.is_absolute());
    /// ```
    pub fn parse(input: &str) -> Result<Self, UriError> {
        if input.is_empty() {
            return Err(UriError::Empty);
        }

        let scheme = scheme_len(input)?;
        let mut pos = scheme.map_or(0, |len| len + 1);

        let authority = match input[pos..].strip_prefix("//") {
            Some(after) => {
                let start = pos + 2;
                let end = start + after.find(['/', '?', '#']).unwrap_or(after.len());
                pos = end;
                Some(Authority::parse(input, start..end)?)
            }
            None => None,
        };

        let end = input[pos..].find('#').map_or(input.len(), |p| pos + p);
        let (path, query) = match input[pos..end].find('?') {
            Some(p) => (pos..pos + p, Some(pos + p + 1..end)),
            None => (pos..end, None),
        };

        Ok(Uri {
            source: input.to_string(),
            scheme,
            authority,
            path,
            query,
        })
    }

    /// authority-form (`host:port`) をパース
    ///
    /// CONNECT の request-target に使う。ポートは必須
    pub fn parse_authority_form(input: &str) -> Result<Self, UriError> {
        if input.is_empty() {
            return Err(UriError::Empty);
        }
        if input.contains(['/', '?', '#', '@']) {
            return Err(UriError::InvalidHost);
        }
        let authority = Authority::parse(input, 0..input.len())?;
        if authority.host.is_empty() || authority.port.is_none() {
            return Err(UriError::InvalidHost);
        }
        let len = input.len();
        Ok(Uri {
            source: input.to_string(),
            scheme: None,
            authority: Some(authority),
            path: len..len,
            query: None,
        })
    }

    fn slice(&self, range: &Range<usize>) -> &str {
        &self.source[range.clone()]
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.map(|len| &self.source[..len])
    }

    /// authority 全体 (userinfo を含む)
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_ref().map(|a| self.slice(&a.range))
    }

    /// ホスト (userinfo とポートは含まない)
    pub fn host(&self) -> Option<&str> {
        self.authority.as_ref().map(|a| self.slice(&a.host))
    }

    pub fn port(&self) -> Option<u16> {
        self.authority.as_ref().and_then(|a| a.port)
    }

    pub fn path(&self) -> &str {
        self.slice(&self.path)
    }

    /// クエリ (`?` を含まない)
    pub fn query(&self) -> Option<&str> {
        self.query.as_ref().map(|q| self.slice(q))
    }

    /// 元の文字列
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// absolute-form かどうか
    pub fn is_absolute(&self) -> bool {
        self.scheme.is_some()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

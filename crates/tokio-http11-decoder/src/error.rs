//! tokio-http11-decoder エラー型

use std::fmt;

use shiguredo_http11_decoder::status;

/// tokio-http11-decoder エラー
#[derive(Debug)]
pub enum Error {
    /// I/O エラー
    Io(std::io::Error),
    /// HTTP デコードエラー
    Http(shiguredo_http11_decoder::Error),
    /// 読み取りタイムアウト
    Timeout,
    /// メッセージの途中で接続が閉じられた
    ConnectionClosed,
}

impl Error {
    /// 相手に返すべきエラーレスポンスのステータスコード
    ///
    /// デコードエラー以外は応答を返さないので `None`
    pub fn suggested_status(&self) -> Option<u16> {
        match self {
            Error::Http(e) => Some(e.suggested_status()),
            Error::Io(_) | Error::Timeout | Error::ConnectionClosed => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Timeout => write!(f, "read timeout"),
            Error::ConnectionClosed => write!(f, "connection closed in the middle of a message"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<shiguredo_http11_decoder::Error> for Error {
    fn from(e: shiguredo_http11_decoder::Error) -> Self {
        Error::Http(e)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// デコードエラーに対するエラーレスポンスを生成する
///
/// 接続を閉じる前に書き込む最小限のレスポンス。
///
/// ```rust
/// use shiguredo_http11_decoder::RequestDecoder;
/// use tokio_http11_decoder::error_response;
///
/// let mut decoder = RequestDecoder::new();
/// let err = decoder.feed(b"GET / HTTP/3.0\r\n\r\n").unwrap_err();
/// assert_eq!(
///     error_response(&err),
///     b"HTTP/1.1 505 HTTP Version Not Supported\r\nConnection: close\r\nContent-Length: 0\r\n\r\n"
/// );
/// ```
pub fn error_response(err: &shiguredo_http11_decoder::Error) -> Vec<u8> {
    let code = err.suggested_status();
    format!(
        "HTTP/1.1 {} {}\r\nConnection: close\r\nContent-Length: 0\r\n\r\n",
        code,
        status::reason_phrase(code)
    )
    .into_bytes()
}

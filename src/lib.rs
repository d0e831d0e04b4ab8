//! # shiguredo_http11_decoder
//!
//! インクリメンタルな HTTP/1.x メッセージデコーダー (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: 受信したバイト列を渡すだけで、I/O は呼び出し側が行う
//! - **インクリメンタル**: どの位置で分割されたバイト列でも同じ結果になる
//! - **依存なし**: 標準ライブラリのみ使用 (`log` feature を除く)
//!
//! ## 使い方
//!
//! ### サーバー (リクエスト受信)
//!
//! ```rust
//! use shiguredo_http11_decoder::{HttpMessage, Method, RequestDecoder};
//!
//! let mut decoder = RequestDecoder::new();
//! let requests = decoder
//!     .feed(b"GET /foo?a=1 HTTP/1.1\r\nHost: x\r\nCookie: sid=abc\r\n\r\n")
//!     .unwrap();
//!
//! let request = &requests[0];
//! assert_eq!(request.method(), Method::Get);
//! assert_eq!(request.path(), "/foo");
//! assert_eq!(request.query_param("a"), Some("1"));
//! assert_eq!(request.get_header("Host"), Some("x"));
//! assert_eq!(request.cookies().get("sid").map(|c| c.value()), Some("abc"));
//! ```
//!
//! ### クライアント (レスポンス受信)
//!
//! ```rust
//! use shiguredo_http11_decoder::{HttpMessage, ResponseDecoder};
//!
//! let mut decoder = ResponseDecoder::new();
//! let responses = decoder
//!     .feed(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
//!     .unwrap();
//! assert_eq!(responses[0].status_code(), 200);
//! assert_eq!(responses[0].body(), b"hello");
//! ```
//!
//! ### エラー
//!
//! プロトコル違反はエラーレスポンスに使うステータスコードを持つ。
//!
//! ```rust
//! use shiguredo_http11_decoder::RequestDecoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let err = decoder.feed(b"GET / HTTP/2.0\r\n\r\n").unwrap_err();
//! assert_eq!(err.suggested_status(), 505);
//! ```

mod log;

mod classify;
pub mod cookie;
mod decoder;
mod error;
mod header;
mod limits;
mod method;
mod query;
mod request;
mod response;
pub mod status;
pub mod uri;
mod version;

pub use cookie::{Cookie, CookieSet};
pub use decoder::{BodyKind, DecodeState, EofOutcome, RequestDecoder, ResponseDecoder};
pub use error::{ConfigError, Error, ErrorKind};
pub use header::{HeaderMap, HttpMessage, is_valid_header_name, is_valid_header_value};
pub use limits::{CloseDelimitedOverflow, DecoderLimits};
pub use method::Method;
pub use query::QueryParams;
pub use request::Request;
pub use response::Response;
pub use uri::Uri;
pub use version::Version;

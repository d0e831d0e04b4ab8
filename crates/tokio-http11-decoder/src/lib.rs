//! tokio_http11_decoder - Tokio integration for shiguredo_http11_decoder
//!
//! Sans I/O デコーダーを tokio の `AsyncRead` から駆動する薄いアダプター。
//!
//! ## 特徴
//!
//! - **切断の区別**: メッセージ境界での切断、close-delimited ボディの完了、途中での切断を区別する
//! - **タイムアウト**: 1 回の読み取りごとのタイムアウト
//! - **エラーレスポンス**: デコードエラーから接続を閉じる前に返すレスポンスを生成する
//!
//! ## サーバー
//!
//! ```rust
//! use tokio::io::AsyncWriteExt;
//! use tokio_http11_decoder::{Error, RequestReader, error_response};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> std::io::Result<()> {
//! let input: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n\r\nGET /\x01 HTTP/1.1\r\n\r\n";
//! let mut output = Vec::new();
//!
//! let mut reader = RequestReader::new(input);
//! loop {
//!     match reader.next_message().await {
//!         Ok(Some(_request)) => {
//!             output.write_all(b"HTTP/1.1 204 No Content\r\n\r\n").await?;
//!         }
//!         Ok(None) => break,
//!         Err(Error::Http(e)) => {
//!             output.write_all(&error_response(&e)).await?;
//!             break;
//!         }
//!         Err(_) => break,
//!     }
//! }
//! assert!(output.ends_with(b"Connection: close\r\nContent-Length: 0\r\n\r\n"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod reader;

pub use error::{Error, Result, error_response};
pub use reader::{Decode, MessageReader, RequestReader, ResponseReader};

// shiguredo_http11_decoder の型を re-export
pub use shiguredo_http11_decoder::{Request, Response};

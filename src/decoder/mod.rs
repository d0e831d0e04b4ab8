//! HTTP/1.x デコーダーモジュール
//!
//! Sans I/O 設計に基づくインクリメンタルデコーダーを提供する。
//!
//! 状態機械は 3 層で構成される。
//!
//! - プリミティブ状態 (`primitive`): 区切り文字まで読む、固定長を読む、CRLF を確認する
//! - 複合状態 (`line`, `header`, `chunked`): プリミティブを順に駆動して 1 つの構文要素を読む
//! - トップレベル (`request`, `response`): 空行の読み飛ばし、スタートライン、ヘッダー、ボディ
//!
//! どの状態も入力が足りなければ `Pending` を返し、消費していないバイトはバッファに残る。
//! 同じメッセージをどの位置で分割して投入しても、結果は一括投入と同じになる。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http11_decoder::{EofOutcome, RequestDecoder};
//!
//! let mut decoder = RequestDecoder::new();
//! assert!(decoder.feed(b"GET / HT").unwrap().is_empty());
//! let requests = decoder.feed(b"TP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! assert_eq!(requests[0].path(), "/");
//!
//! // 途中で切断された場合はエラーではなく破棄になる
//! decoder.feed(b"GET / HTTP/1.1").unwrap();
//! assert_eq!(decoder.mark_eof(), EofOutcome::Abandoned);
//! ```

mod body;
mod chunked;
pub(crate) mod cursor;
mod header;
mod line;
mod primitive;
mod request;
mod response;
mod stream;
mod version;

pub use body::BodyKind;
pub use request::RequestDecoder;
pub use response::ResponseDecoder;
pub use stream::{DecodeState, EofOutcome};

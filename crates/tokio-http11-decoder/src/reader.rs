//! AsyncRead からメッセージを読み出す
//!
//! ## 使い方
//!
//! ```rust
//! use tokio_http11_decoder::RequestReader;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tokio_http11_decoder::Result<()> {
//! let input: &[u8] = b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
//! let mut reader = RequestReader::new(input);
//! while let Some(request) = reader.next_message().await? {
//!     println!("{}", request.path());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use shiguredo_http11_decoder::Error as DecodeError;
use shiguredo_http11_decoder::{
    DecodeState, EofOutcome, Request, RequestDecoder, Response, ResponseDecoder,
};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};

/// ストリームデコーダーの共通操作
pub trait Decode {
    type Message;

    fn feed(&mut self, data: &[u8]) -> std::result::Result<Vec<Self::Message>, DecodeError>;

    fn mark_eof(&mut self) -> EofOutcome<Self::Message>;

    fn state(&self) -> DecodeState;
}

impl Decode for RequestDecoder {
    type Message = Request;

    fn feed(&mut self, data: &[u8]) -> std::result::Result<Vec<Request>, DecodeError> {
        RequestDecoder::feed(self, data)
    }

    fn mark_eof(&mut self) -> EofOutcome<Request> {
        RequestDecoder::mark_eof(self)
    }

    fn state(&self) -> DecodeState {
        RequestDecoder::state(self)
    }
}

impl Decode for ResponseDecoder {
    type Message = Response;

    fn feed(&mut self, data: &[u8]) -> std::result::Result<Vec<Response>, DecodeError> {
        ResponseDecoder::feed(self, data)
    }

    fn mark_eof(&mut self) -> EofOutcome<Response> {
        ResponseDecoder::mark_eof(self)
    }

    fn state(&self) -> DecodeState {
        ResponseDecoder::state(self)
    }
}

/// リクエストを読み出す (サーバー側)
pub type RequestReader<R> = MessageReader<R, RequestDecoder>;

/// レスポンスを読み出す (クライアント側)
pub type ResponseReader<R> = MessageReader<R, ResponseDecoder>;

/// AsyncRead からデコーダーを駆動してメッセージを読み出す
///
/// 切断の扱い:
/// - メッセージの区切りでの切断は `Ok(None)`
/// - close-delimited レスポンスは切断で完了する
/// - メッセージの途中での切断は `Error::ConnectionClosed`
pub struct MessageReader<R, D: Decode> {
    reader: R,
    decoder: D,
    buf: Vec<u8>,
    pending: VecDeque<D::Message>,
    read_timeout: Option<Duration>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> MessageReader<R, RequestDecoder> {
    /// デフォルトのデコーダーで作成
    pub fn new(reader: R) -> Self {
        Self::with_decoder(reader, RequestDecoder::new())
    }
}

impl<R: AsyncRead + Unpin> MessageReader<R, ResponseDecoder> {
    /// デフォルトのデコーダーで作成
    pub fn new(reader: R) -> Self {
        Self::with_decoder(reader, ResponseDecoder::new())
    }
}

impl<R: AsyncRead + Unpin, D: Decode> MessageReader<R, D> {
    /// 設定済みのデコーダーで作成
    pub fn with_decoder(reader: R, decoder: D) -> Self {
        Self {
            reader,
            decoder,
            buf: vec![0u8; 8192],
            pending: VecDeque::new(),
            read_timeout: None,
            eof: false,
        }
    }

    /// 1 回の読み取りのタイムアウトを設定
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// 読み取りバッファサイズを設定
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.buf = vec![0u8; size.max(1)];
        self
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// デコーダーを取得 (`set_expect_no_body()` など)
    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// 次のメッセージを読み出す
    ///
    /// 接続がメッセージの区切りで閉じられた場合は `Ok(None)`
    pub async fn next_message(&mut self) -> Result<Option<D::Message>> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(Some(message));
            }
            // 完成済みのメッセージの後で失敗していればここで返す
            if self.decoder.state() == DecodeState::Failed {
                self.decoder.feed(&[])?;
            }
            if self.eof {
                return Ok(None);
            }

            let n = self.read().await?;
            if n == 0 {
                self.eof = true;
                return match self.decoder.mark_eof() {
                    EofOutcome::Clean => Ok(None),
                    EofOutcome::Complete(message) => Ok(Some(message)),
                    EofOutcome::Abandoned => Err(Error::ConnectionClosed),
                    EofOutcome::Failed(err) => Err(err.into()),
                };
            }
            let messages = self.decoder.feed(&self.buf[..n])?;
            self.pending.extend(messages);
        }
    }

    async fn read(&mut self) -> Result<usize> {
        let read = self.reader.read(&mut self.buf);
        match self.read_timeout {
            Some(timeout) => Ok(tokio::time::timeout(timeout, read).await??),
            None => Ok(read.await?),
        }
    }
}

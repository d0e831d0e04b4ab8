use std::fmt;

use crate::status;

/// デコードエラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 不正なバイト列 (文法違反)
    ProtocolViolation,
    /// 制限値の超過
    ResourceExhaustion,
}

/// HTTP デコードエラー
///
/// どのバリアントも現在デコード中のメッセージに対して致命的だが、
/// 接続をどうするかは呼び出し側 (トランスポート層) が決める。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// プロトコル違反
    ///
    /// `status` はエラーレスポンスとして返すべきステータスコード
    Protocol { message: String, status: u16 },
    /// バッファサイズ超過
    BufferOverflow { size: usize, limit: usize },
    /// スタートラインのトークンが長すぎる
    StartLineTooLong { size: usize, limit: usize },
    /// ヘッダー数超過
    TooManyHeaders { count: usize, limit: usize },
    /// ヘッダー行が長すぎる
    HeaderLineTooLong { size: usize, limit: usize },
    /// ボディサイズ超過
    BodyTooLarge { size: usize, limit: usize },
    /// チャンクサイズ行が長すぎる
    ChunkLineTooLong { size: usize, limit: usize },
    /// close-delimited ボディが上限に達した (Reject ポリシー時のみ)
    ResourceExhausted { size: usize, limit: usize },
}

impl Error {
    /// 400 Bad Request のプロトコル違反
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Error::Protocol {
            message: message.into(),
            status: status::BAD_REQUEST,
        }
    }

    /// 501 Not Implemented のプロトコル違反
    pub(crate) fn not_implemented(message: impl Into<String>) -> Self {
        Error::Protocol {
            message: message.into(),
            status: status::NOT_IMPLEMENTED,
        }
    }

    /// 505 HTTP Version Not Supported のプロトコル違反
    pub(crate) fn version_not_supported(message: impl Into<String>) -> Self {
        Error::Protocol {
            message: message.into(),
            status: status::HTTP_VERSION_NOT_SUPPORTED,
        }
    }

    /// エラーの分類を取得
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Protocol { .. } => ErrorKind::ProtocolViolation,
            Error::BufferOverflow { .. }
            | Error::StartLineTooLong { .. }
            | Error::TooManyHeaders { .. }
            | Error::HeaderLineTooLong { .. }
            | Error::BodyTooLarge { .. }
            | Error::ChunkLineTooLong { .. }
            | Error::ResourceExhausted { .. } => ErrorKind::ResourceExhaustion,
        }
    }

    /// プロトコル違反かどうか
    pub fn is_protocol_violation(&self) -> bool {
        self.kind() == ErrorKind::ProtocolViolation
    }

    /// エラーレスポンスに使うステータスコード
    pub fn suggested_status(&self) -> u16 {
        match self {
            Error::Protocol { status, .. } => *status,
            Error::StartLineTooLong { .. } => status::URI_TOO_LONG,
            Error::TooManyHeaders { .. } | Error::HeaderLineTooLong { .. } => {
                status::REQUEST_HEADER_FIELDS_TOO_LARGE
            }
            Error::BufferOverflow { .. }
            | Error::BodyTooLarge { .. }
            | Error::ResourceExhausted { .. } => status::CONTENT_TOO_LARGE,
            Error::ChunkLineTooLong { .. } => status::BAD_REQUEST,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Protocol { message, status } => {
                write!(f, "protocol violation ({}): {}", status, message)
            }
            Error::BufferOverflow { size, limit } => {
                write!(f, "buffer overflow: {} > {}", size, limit)
            }
            Error::StartLineTooLong { size, limit } => {
                write!(f, "start line too long: {} > {}", size, limit)
            }
            Error::TooManyHeaders { count, limit } => {
                write!(f, "too many headers: {} > {}", count, limit)
            }
            Error::HeaderLineTooLong { size, limit } => {
                write!(f, "header line too long: {} > {}", size, limit)
            }
            Error::BodyTooLarge { size, limit } => {
                write!(f, "body too large: {} > {}", size, limit)
            }
            Error::ChunkLineTooLong { size, limit } => {
                write!(f, "chunk line too long: {} > {}", size, limit)
            }
            Error::ResourceExhausted { size, limit } => {
                write!(f, "close-delimited body exhausted: {} > {}", size, limit)
            }
        }
    }
}

impl std::error::Error for Error {}

/// メッセージ構築時の誤用
///
/// 受信データではなく呼び出し側のコードの不具合を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 不正なヘッダー名 (制御文字・区切り文字・非 ASCII を含む)
    InvalidHeaderName(String),
    /// 不正なヘッダー値 (HTAB 以外の制御文字を含む)
    InvalidHeaderValue(String),
    /// 不正な Cookie 名
    InvalidCookieName(String),
    /// 不正なステータスコード
    InvalidStatusCode(u16),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHeaderName(name) => write!(f, "invalid header name: {:?}", name),
            ConfigError::InvalidHeaderValue(value) => {
                write!(f, "invalid header value: {:?}", value)
            }
            ConfigError::InvalidCookieName(name) => write!(f, "invalid cookie name: {:?}", name),
            ConfigError::InvalidStatusCode(code) => write!(f, "invalid status code: {}", code),
        }
    }
}

impl std::error::Error for ConfigError {}

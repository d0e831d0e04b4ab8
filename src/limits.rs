/// close-delimited ボディが上限に達したときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseDelimitedOverflow {
    /// 上限でボディを打ち切ってレスポンスを確定し、以降の受信データは破棄する
    #[default]
    Truncate,
    /// `Error::ResourceExhausted` を返す
    Reject,
}

/// デコーダーの制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderLimits {
    /// 最大バッファサイズ (デフォルト: 64KB)
    ///
    /// 未消費のまま保持されるバイト数の上限。
    pub max_buffer_size: usize,
    /// スタートラインのトークン最大長 (デフォルト: 8KB)
    pub max_start_line_size: usize,
    /// 最大ヘッダー数 (デフォルト: 100)
    ///
    /// chunked のトレーラー行数にも適用される。
    pub max_headers_count: usize,
    /// 最大ヘッダー行長 (デフォルト: 8KB)
    ///
    /// 折り返し (obs-fold) を連結した後の値にも適用される。
    pub max_header_line_size: usize,
    /// 最大ボディサイズ (デフォルト: 10MB)
    pub max_body_size: usize,
    /// 最大チャンクサイズ行長 (デフォルト: 64バイト)
    ///
    /// チャンクサイズとチャンク拡張の合計長。
    pub max_chunk_line_size: usize,
    /// close-delimited ボディの最大サイズ (デフォルト: 1MB)
    pub max_close_delimited_body_size: usize,
    /// close-delimited ボディが上限に達したときの扱い (デフォルト: Truncate)
    pub close_delimited_overflow: CloseDelimitedOverflow,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: 64 * 1024, // 64KB
            max_start_line_size: 8 * 1024,
            max_headers_count: 100,
            max_header_line_size: 8 * 1024,  // 8KB
            max_body_size: 10 * 1024 * 1024, // 10MB
            max_chunk_line_size: 64,         // 64 bytes
            max_close_delimited_body_size: 1024 * 1024,
            close_delimited_overflow: CloseDelimitedOverflow::Truncate,
        }
    }
}

impl DecoderLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_buffer_size: usize::MAX,
            max_start_line_size: usize::MAX,
            max_headers_count: usize::MAX,
            max_header_line_size: usize::MAX,
            max_body_size: usize::MAX,
            max_chunk_line_size: usize::MAX,
            max_close_delimited_body_size: usize::MAX,
            close_delimited_overflow: CloseDelimitedOverflow::Truncate,
        }
    }
}
